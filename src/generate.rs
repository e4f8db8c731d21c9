//! Top-level entry points: document in, question set (or artifacts) out.
//!
//! Every entry point runs inside a [`Session`]: the extractor writes images
//! into the session's private folder, and the whole workspace disappears
//! when the session is dropped, on success and on failure alike. Callers who
//! need the images beyond that (the renderer does) must use
//! [`generate_to_dir`], or keep the session alive themselves and call
//! [`generate_question_set`].

use crate::config::{GenerationConfig, SessionRequest};
use crate::error::Pdf2McqError;
use crate::output::{ExtractionResult, GenerationStats, QuestionSet, SessionReport};
use crate::pipeline::llm::{CompletionService, LlmCompletionService};
use crate::pipeline::{assign, extract, generator, input};
use crate::render::{write_artifacts, DocumentRenderer};
use crate::session::Session;
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// Generate a question set from a PDF path or URL.
///
/// The returned records reference image files inside `session`'s workspace;
/// they stay valid for as long as `session` lives.
///
/// # Errors
/// Fatal conditions only:
/// - the input cannot be resolved or is not a PDF
/// - no LLM provider could be resolved
/// - the first `request.pages` pages hold no extractable text
/// - not a single question survived generation and parsing
///
/// Failed requests, rejected images and malformed blocks only reduce the
/// output; see [`QuestionSet::request_errors`].
pub async fn generate_question_set(
    input_str: impl AsRef<str>,
    request: &SessionRequest,
    config: &GenerationConfig,
    session: &Session,
) -> Result<QuestionSet, Pdf2McqError> {
    let resolved = input::resolve_input(input_str.as_ref(), config.download_timeout_secs).await?;
    run_pipeline(resolved.path(), request, config, session).await
}

/// [`generate_question_set`] for a PDF held in memory.
pub async fn generate_from_bytes(
    bytes: &[u8],
    request: &SessionRequest,
    config: &GenerationConfig,
    session: &Session,
) -> Result<QuestionSet, Pdf2McqError> {
    // `resolved` owns the temp copy; it is deleted when this returns.
    let resolved = input::resolve_bytes(bytes)?;
    run_pipeline(resolved.path(), request, config, session).await
}

/// Generate and render in one go, inside a fresh session.
///
/// Writes `mcqs_{id}.{ext}` and `answers_{id}.{ext}` (and `mcqs_{id}.json`
/// when `json` is set) into `out_dir`. The session workspace, extracted
/// images included, is gone by the time this returns.
pub async fn generate_to_dir(
    input_str: impl AsRef<str>,
    request: &SessionRequest,
    config: &GenerationConfig,
    renderer: &dyn DocumentRenderer,
    out_dir: impl AsRef<Path>,
    json: bool,
) -> Result<SessionReport, Pdf2McqError> {
    let session = Session::new()?;
    info!("Session {}", session.id());
    let set = generate_question_set(input_str, request, config, &session).await?;
    let report = write_artifacts(renderer, &set, &session, out_dir.as_ref(), json)?;
    info!("{}", report.stats.summary());
    Ok(report)
}

/// Synchronous wrapper around [`generate_to_dir`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_sync(
    input_str: impl AsRef<str>,
    request: &SessionRequest,
    config: &GenerationConfig,
    renderer: &dyn DocumentRenderer,
    out_dir: impl AsRef<Path>,
    json: bool,
) -> Result<SessionReport, Pdf2McqError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2McqError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(generate_to_dir(input_str, request, config, renderer, out_dir, json))
}

/// Run only the extractor, writing images into `output_folder`.
///
/// Does not require an LLM provider or API key. Unlike the generation entry
/// points, a document that cannot be opened at all is reported as
/// [`Pdf2McqError::CorruptPdf`] rather than silently yielding nothing.
pub async fn extract_only(
    input_str: impl AsRef<str>,
    max_pages: usize,
    output_folder: impl AsRef<Path>,
    config: &GenerationConfig,
) -> Result<ExtractionResult, Pdf2McqError> {
    let resolved = input::resolve_input(input_str.as_ref(), config.download_timeout_secs).await?;
    let path = resolved.path().to_path_buf();
    let result = extract::extract_async(
        path.clone(),
        max_pages,
        output_folder.as_ref().to_path_buf(),
        config.extraction.clone(),
    )
    .await;
    if result.page_count == 0 {
        return Err(Pdf2McqError::CorruptPdf {
            path,
            detail: "document could not be opened or has no pages".into(),
        });
    }
    Ok(result)
}

async fn run_pipeline(
    pdf_path: &Path,
    request: &SessionRequest,
    config: &GenerationConfig,
    session: &Session,
) -> Result<QuestionSet, Pdf2McqError> {
    let total_start = Instant::now();
    info!(
        "Starting generation: {} ({} pages, {} questions)",
        pdf_path.display(),
        request.pages,
        request.questions
    );

    // ── Step 1: Resolve completion service ───────────────────────────────
    // Before extraction, so a missing API key fails fast.
    let service = resolve_service(config)?;

    // ── Step 2: Extract text and images ──────────────────────────────────
    let extract_start = Instant::now();
    let extraction = extract::extract_async(
        pdf_path.to_path_buf(),
        request.pages,
        session.image_folder(),
        config.extraction.clone(),
    )
    .await;
    let extraction_duration_ms = extract_start.elapsed().as_millis() as u64;

    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_complete(
            extraction.pages_extracted,
            extraction.text.chars().count(),
            extraction.images.len(),
        );
    }

    if !extraction.has_text() {
        return Err(Pdf2McqError::NoExtractableText {
            path: pdf_path.to_path_buf(),
            pages: request.pages,
        });
    }

    // ── Step 3: Generate questions ───────────────────────────────────────
    let gen_start = Instant::now();
    let run = generator::generate_items(
        service.as_ref(),
        &extraction.text,
        request.questions,
        Some(&request.distribution),
        config,
    )
    .await;
    let generation_duration_ms = gen_start.elapsed().as_millis() as u64;

    if run.questions.is_empty() {
        return Err(Pdf2McqError::GenerationFailed {
            requested: request.questions,
            requests: run.requests,
            first_error: run.request_errors.first().map(|e| e.to_string()),
        });
    }
    if run.questions.len() < request.questions {
        warn!(
            "Only {} of {} questions could be generated",
            run.questions.len(),
            request.questions
        );
    }

    // ── Step 4: Attach images ────────────────────────────────────────────
    let mut questions = run.questions;
    let attached = assign::assign_images(&mut questions, &extraction.images);
    debug!(
        "Attached {} of {} images",
        attached,
        extraction.images.len()
    );

    // ── Step 5: Stats ────────────────────────────────────────────────────
    let mut stats = GenerationStats {
        requested_questions: request.questions,
        images_extracted: extraction.images.len(),
        page_count: extraction.page_count,
        pages_extracted: extraction.pages_extracted,
        text_chars: extraction.text.chars().count(),
        chunks: run.chunks,
        requests: run.requests,
        failed_requests: run.request_errors.len(),
        total_input_tokens: run.input_tokens,
        total_output_tokens: run.output_tokens,
        extraction_duration_ms,
        generation_duration_ms,
        ..Default::default()
    };
    stats.tally(&questions);
    stats.total_duration_ms = total_start.elapsed().as_millis() as u64;

    info!("{} in {}ms", stats.summary(), stats.total_duration_ms);

    Ok(QuestionSet {
        session_id: session.id().to_string(),
        questions,
        images: extraction.images,
        request_errors: run.request_errors,
        stats,
    })
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, Pdf2McqError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        Pdf2McqError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the completion service, from most-specific to least-specific.
///
/// 1. **Service** (`config.service`): used as-is. This is how tests and
///    callers with their own backend plug in.
/// 2. **Pre-built provider** (`config.provider`).
/// 3. **Named provider + model** (`config.provider_name`), reading the
///    provider's API key from the environment.
/// 4. **Environment pair** `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`.
/// 5. **OpenAI** when `OPENAI_API_KEY` is set.
/// 6. **Auto-detection** via [`ProviderFactory::from_env`].
///
/// Every provider is wrapped in an [`LlmCompletionService`] carrying the
/// per-request timeout.
pub fn resolve_service(config: &GenerationConfig) -> Result<Arc<dyn CompletionService>, Pdf2McqError> {
    if let Some(ref service) = config.service {
        return Ok(Arc::clone(service));
    }

    let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
    let (provider, label) = resolve_provider(config, model)?;
    debug!("Using provider {}", label);
    Ok(Arc::new(
        LlmCompletionService::new(provider, config.api_timeout_secs).with_label(label),
    ))
}

fn resolve_provider(
    config: &GenerationConfig,
    model: &str,
) -> Result<(Arc<dyn LLMProvider>, String), Pdf2McqError> {
    if let Some(ref provider) = config.provider {
        return Ok((Arc::clone(provider), "custom provider".to_string()));
    }

    if let Some(ref name) = config.provider_name {
        return Ok((create_provider(name, model)?, format!("{name}/{model}")));
    }

    if let (Ok(prov), Ok(env_model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !env_model.is_empty() {
            let label = format!("{prov}/{env_model}");
            return Ok((create_provider(&prov, &env_model)?, label));
        }
    }

    // Prefer OpenAI when its key is present, even if other keys are too.
    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            return Ok((create_provider("openai", model)?, format!("openai/{model}")));
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| Pdf2McqError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok((llm_provider, "auto-detected".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::llm::{CompletionError, CompletionRequest, CompletionResponse};
    use async_trait::async_trait;

    struct Fixed;

    #[async_trait]
    impl CompletionService for Fixed {
        async fn complete(
            &self,
            _request: &CompletionRequest,
        ) -> Result<CompletionResponse, CompletionError> {
            Ok(CompletionResponse::text(""))
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    #[test]
    fn explicit_service_wins() {
        let config = GenerationConfig::builder()
            .service(Arc::new(Fixed))
            .provider_name("definitely-not-a-provider")
            .build()
            .unwrap();
        let service = resolve_service(&config).unwrap();
        assert_eq!(service.name(), "fixed");
    }

    #[tokio::test]
    async fn missing_file_fails_before_any_work() {
        let session = Session::new().unwrap();
        let config = GenerationConfig::builder()
            .service(Arc::new(Fixed))
            .build()
            .unwrap();
        let err = generate_question_set(
            "/definitely/not/here.pdf",
            &SessionRequest::default(),
            &config,
            &session,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Pdf2McqError::FileNotFound { .. }), "got: {err}");
    }

    #[test]
    fn bytes_without_magic_are_rejected() {
        let session = Session::new().unwrap();
        let err = tokio_test::block_on(generate_from_bytes(
            b"hello",
            &SessionRequest::default(),
            &GenerationConfig::default(),
            &session,
        ))
        .unwrap_err();
        assert!(matches!(err, Pdf2McqError::NotAPdf { .. }), "got: {err}");
    }
}
