//! Item generation: chunks × difficulty buckets → parsed question records.
//!
//! ## Serial (concurrency = 1)
//!
//! For each bucket in easy → medium → hard order, the bucket's quota is
//! walked across the chunks: `per_chunk = max(1, count / chunks)`, each chunk
//! asks for `min(per_chunk, remaining)` and the last chunk asks for whatever
//! is still missing. `remaining` shrinks by what each response actually
//! delivered, so a chunk that under-delivers is made up by later chunks.
//!
//! ## Concurrent (concurrency > 1)
//!
//! Requests are independent, so they can be in flight together, but then no
//! request can see what earlier ones delivered. The plan is fixed up front
//! with [`static_plan`] and dispatched through `buffered`, which yields
//! results in plan order. Bucket contents therefore still follow chunk order
//! and the final truncation is deterministic.
//!
//! In both modes a failed request only under-fills its chunk; it never
//! aborts the run.

use crate::config::{ComplexityDistribution, GenerationConfig};
use crate::error::RequestError;
use crate::output::{Complexity, QuestionRecord};
use crate::pipeline::chunk::split_into_chunks;
use crate::pipeline::llm::{complete_with_retry, CompletionError, CompletionRequest, CompletionService};
use crate::pipeline::parse::parse_response;
use crate::pipeline::quota::{static_plan, Quota};
use crate::prompts::build_question_prompt;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

/// Everything one generation run produced.
#[derive(Debug, Clone, Default)]
pub struct GenerationRun {
    /// Easy, then medium, then hard; at most the requested total.
    pub questions: Vec<QuestionRecord>,
    pub quota: Quota,
    pub chunks: usize,
    /// Completion requests issued (retries not counted).
    pub requests: usize,
    pub request_errors: Vec<RequestError>,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Result of one (bucket, chunk) request.
struct ChunkOutcome {
    result: Result<Vec<QuestionRecord>, RequestError>,
    input_tokens: u64,
    output_tokens: u64,
}

/// Generate `total` questions from `text`.
///
/// `distribution` defaults to 40/40/20 when `None`. Blank text produces an
/// empty run without calling the service.
pub async fn generate_items(
    service: &dyn CompletionService,
    text: &str,
    total: usize,
    distribution: Option<&ComplexityDistribution>,
    config: &GenerationConfig,
) -> GenerationRun {
    let distribution = distribution.copied().unwrap_or_default();
    let quota = Quota::compute(total, &distribution);
    let chunks = split_into_chunks(text, config.chunk_words);

    let mut run = GenerationRun {
        quota,
        chunks: chunks.len(),
        ..Default::default()
    };
    if chunks.is_empty() || total == 0 {
        debug!("Nothing to generate from");
        return run;
    }

    info!(
        "Generating {} questions (easy {}, medium {}, hard {}) from {} chunk(s) via {}",
        total,
        quota.easy,
        quota.medium,
        quota.hard,
        chunks.len(),
        service.name()
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_generation_start(total, chunks.len());
    }

    if config.concurrency > 1 {
        generate_concurrent(service, &chunks, config, &mut run).await;
    } else {
        generate_serial(service, &chunks, config, &mut run).await;
    }

    run.questions.truncate(total);
    info!(
        "Generated {}/{} questions in {} request(s), {} failed",
        run.questions.len(),
        total,
        run.requests,
        run.request_errors.len()
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_generation_complete(total, run.questions.len());
    }
    run
}

async fn generate_serial(
    service: &dyn CompletionService,
    chunks: &[String],
    config: &GenerationConfig,
    run: &mut GenerationRun,
) {
    let n = chunks.len();
    for complexity in Complexity::ALL {
        let count = run.quota.get(complexity);
        if count == 0 {
            continue;
        }
        let per_chunk = (count / n).max(1);
        let mut remaining = count;

        for (i, chunk) in chunks.iter().enumerate() {
            if remaining == 0 {
                break;
            }
            let k = if i == n - 1 {
                remaining
            } else {
                per_chunk.min(remaining)
            };
            let outcome = request_chunk(service, config, complexity, i + 1, n, chunk, k).await;
            if let Ok(ref qs) = outcome.result {
                remaining -= qs.len();
            }
            record(run, outcome);
        }
    }
}

async fn generate_concurrent(
    service: &dyn CompletionService,
    chunks: &[String],
    config: &GenerationConfig,
    run: &mut GenerationRun,
) {
    let n = chunks.len();
    let plan: Vec<(Complexity, usize, usize)> = Complexity::ALL
        .iter()
        .flat_map(|&c| {
            static_plan(run.quota.get(c), n)
                .into_iter()
                .enumerate()
                .filter(|(_, k)| *k > 0)
                .map(move |(i, k)| (c, i, k))
        })
        .collect();
    debug!(
        "Dispatching {} requests with concurrency {}",
        plan.len(),
        config.concurrency
    );

    let outcomes: Vec<ChunkOutcome> = stream::iter(plan.into_iter().map(|(c, i, k)| {
        request_chunk(service, config, c, i + 1, n, &chunks[i], k)
    }))
    .buffered(config.concurrency)
    .collect()
    .await;

    for outcome in outcomes {
        record(run, outcome);
    }
}

fn record(run: &mut GenerationRun, outcome: ChunkOutcome) {
    run.requests += 1;
    run.input_tokens += outcome.input_tokens;
    run.output_tokens += outcome.output_tokens;
    match outcome.result {
        Ok(qs) => run.questions.extend(qs),
        Err(e) => run.request_errors.push(e),
    }
}

/// Ask for `k` questions of `complexity` from one chunk, parse and truncate.
async fn request_chunk(
    service: &dyn CompletionService,
    config: &GenerationConfig,
    complexity: Complexity,
    chunk_no: usize,
    chunks: usize,
    chunk: &str,
    k: usize,
) -> ChunkOutcome {
    let label = format!("{complexity} chunk {chunk_no}");
    debug!("{}: requesting {} question(s)", label, k);
    if let Some(ref cb) = config.progress_callback {
        cb.on_request_start(complexity, chunk_no, chunks, k);
    }

    let request = CompletionRequest {
        prompt: build_question_prompt(k, complexity, chunk),
        temperature: config.temperature,
        max_output_tokens: config.max_tokens,
    };

    let outcome = match complete_with_retry(
        service,
        &request,
        config.max_retries,
        config.retry_backoff_ms,
        &label,
    )
    .await
    {
        Ok(response) => {
            let mut questions = parse_response(&response.text, complexity);
            let parsed = questions.len();
            questions.truncate(k);
            debug!("{}: parsed {}, kept {}", label, parsed, questions.len());
            let result = if questions.is_empty() {
                Err(RequestError::EmptyParse {
                    complexity,
                    chunk: chunk_no,
                })
            } else {
                Ok(questions)
            };
            ChunkOutcome {
                result,
                input_tokens: response.input_tokens as u64,
                output_tokens: response.output_tokens as u64,
            }
        }
        Err((CompletionError::Timeout(secs), _)) => ChunkOutcome {
            result: Err(RequestError::Timeout {
                complexity,
                chunk: chunk_no,
                secs,
            }),
            input_tokens: 0,
            output_tokens: 0,
        },
        Err((CompletionError::Request(detail), retries)) => ChunkOutcome {
            result: Err(RequestError::RequestFailed {
                complexity,
                chunk: chunk_no,
                retries,
                detail,
            }),
            input_tokens: 0,
            output_tokens: 0,
        },
    };

    if let Some(ref cb) = config.progress_callback {
        match &outcome.result {
            Ok(qs) => cb.on_request_complete(complexity, chunk_no, chunks, qs.len()),
            Err(e) => cb.on_request_error(complexity, chunk_no, chunks, &e.to_string()),
        }
    }
    if let Err(ref e) = outcome.result {
        warn!("{}", e);
    }
    outcome
}
