//! CLI binary for edgequake-pdf2mcq.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `GenerationConfig` / `SessionRequest` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdf2mcq::session::new_session_id;
use edgequake_pdf2mcq::{
    extract_only, generate_to_dir, Complexity, ComplexityDistribution, GenerationConfig,
    GenerationProgressCallback, MarkdownRenderer, ProgressCallback, SessionRequest,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner while extracting, then a bar counting accepted questions.
struct CliProgressCallback {
    bar: ProgressBar,
    failed_requests: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Extracting");
        bar.set_message("Reading PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            failed_requests: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} questions  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Generating");
        self.bar.set_message("");
    }
}

impl GenerationProgressCallback for CliProgressCallback {
    fn on_extraction_complete(&self, pages: usize, text_chars: usize, images: usize) {
        self.bar.println(format!(
            "{} {}  {}",
            cyan("◆"),
            bold(&format!("Extracted {pages} page(s)")),
            dim(&format!("{text_chars} chars, {images} image(s)")),
        ));
    }

    fn on_generation_start(&self, requested: usize, chunks: usize) {
        self.activate_bar(requested);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Generating {requested} questions from {chunks} chunk(s)…"))
        ));
    }

    fn on_request_start(&self, complexity: Complexity, chunk: usize, chunks: usize, count: usize) {
        self.bar
            .set_message(format!("{complexity} {chunk}/{chunks} (asking {count})"));
    }

    fn on_request_complete(
        &self,
        complexity: Complexity,
        chunk: usize,
        chunks: usize,
        accepted: usize,
    ) {
        self.bar.println(format!(
            "  {} {:<6} chunk {:>2}/{:<2}  {}",
            green("✓"),
            complexity,
            chunk,
            chunks,
            dim(&format!("{accepted} accepted")),
        ));
        self.bar.inc(accepted as u64);
    }

    fn on_request_error(&self, complexity: Complexity, chunk: usize, chunks: usize, error: &str) {
        self.failed_requests.fetch_add(1, Ordering::SeqCst);
        let msg: String = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} {:<6} chunk {:>2}/{:<2}  {}",
            red("✗"),
            complexity,
            chunk,
            chunks,
            red(&msg),
        ));
    }

    fn on_generation_complete(&self, requested: usize, produced: usize) {
        self.bar.finish_and_clear();
        let failed = self.failed_requests.load(Ordering::SeqCst);
        if produced == requested {
            eprintln!("{} {} questions generated", green("✔"), bold(&produced.to_string()));
        } else {
            eprintln!(
                "{} {}/{} questions generated  ({} failed request(s))",
                if produced == 0 { red("✘") } else { cyan("⚠") },
                bold(&produced.to_string()),
                requested,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # 10 questions from the first 2 pages (defaults)
  pdf2mcq lecture.pdf

  # 30 questions from 8 pages, mostly hard
  pdf2mcq --pages 8 --questions 30 --low 10 --medium 30 --hard 60 lecture.pdf

  # Write into a specific folder, with a JSON dump alongside
  pdf2mcq lecture.pdf -o quiz/ --json

  # From a URL, with a specific model
  pdf2mcq --provider openai --model gpt-4.1-mini https://arxiv.org/pdf/1706.03762

  # Only extract text and images (no API key needed)
  pdf2mcq --extract-only --pages 5 lecture.pdf

DIFFICULTY SLIDERS:
  --low, --medium and --hard are each clamped to 0–100 and then rescaled to
  sum to 100. All three at 0 yields 33/33/33.

OUTPUT:
  mcqs_{session}.md      question booklet (figures embedded)
  answers_{session}.md   answer key with explanations
  mcqs_{session}.json    full question set (with --json)

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  RUST_LOG                Override log filter (e.g. edgequake_pdf2mcq=debug)
"#;

/// Generate multiple-choice questions from PDF files and URLs.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2mcq",
    version,
    about = "Generate multiple-choice questions and an answer key from a PDF",
    long_about = "Read the first pages of a PDF (local file or URL), ask an LLM for \
difficulty-balanced multiple-choice questions, attach figures from the document to \
questions that refer to them, and write a question booklet plus an answer key.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Pages to read from the start of the document (1–50).
    #[arg(long, env = "PDF2MCQ_PAGES", default_value_t = 2,
          value_parser = clap::value_parser!(u32).range(1..=50))]
    pages: u32,

    /// Number of questions to generate (5–50).
    #[arg(short = 'n', long, env = "PDF2MCQ_QUESTIONS", default_value_t = 10,
          value_parser = clap::value_parser!(u32).range(5..=50))]
    questions: u32,

    /// Weight of easy questions (0–100).
    #[arg(long, env = "PDF2MCQ_LOW", default_value_t = 40)]
    low: u32,

    /// Weight of medium questions (0–100).
    #[arg(long, env = "PDF2MCQ_MEDIUM", default_value_t = 40)]
    medium: u32,

    /// Weight of hard questions (0–100).
    #[arg(long, env = "PDF2MCQ_HARD", default_value_t = 20)]
    hard: u32,

    /// Directory for the booklet and answer key.
    #[arg(short, long, env = "PDF2MCQ_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// LLM model ID (e.g. gpt-4.1-nano, gpt-4.1-mini, claude-sonnet-4-20250514).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(
        long,
        env = "EDGEQUAKE_PROVIDER",
        long_help = "LLM provider. Auto-detected from API key env vars if not set.\n\
          Supported: openai, anthropic, gemini, azure, ollama, or any OpenAI-compatible URL."
    )]
    provider: Option<String>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "PDF2MCQ_TEMPERATURE", default_value_t = 0.7)]
    temperature: f32,

    /// Max LLM output tokens per request.
    #[arg(long, env = "PDF2MCQ_MAX_TOKENS", default_value_t = 2500)]
    max_tokens: usize,

    /// Retries per request on LLM failure.
    #[arg(long, env = "PDF2MCQ_MAX_RETRIES", default_value_t = 2)]
    max_retries: u32,

    /// Concurrent LLM requests. 1 keeps strict order and adaptive quotas.
    #[arg(short, long, env = "PDF2MCQ_CONCURRENCY", default_value_t = 1)]
    concurrency: usize,

    /// Words per chunk sent to the LLM.
    #[arg(long, env = "PDF2MCQ_CHUNK_WORDS", default_value_t = 600)]
    chunk_words: usize,

    /// Also write the full question set as JSON.
    #[arg(long, env = "PDF2MCQ_JSON")]
    json: bool,

    /// Extract text and images only; print a summary (JSON with --json).
    #[arg(long)]
    extract_only: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2MCQ_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2MCQ_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2MCQ_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDF2MCQ_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Per-request LLM timeout in seconds.
    #[arg(long, env = "PDF2MCQ_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level library logs.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.extract_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn GenerationProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Extract-only mode ────────────────────────────────────────────────
    if cli.extract_only {
        // A fresh subfolder: the extractor clears its output folder first.
        let folder = cli.output_dir.join(format!("images_{}", new_session_id()));
        let result = extract_only(&cli.input, cli.pages as usize, &folder, &config)
            .await
            .context("Extraction failed")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&result).context("Failed to serialise extraction")?
            );
        } else {
            println!("File:         {}", cli.input);
            println!("Pages:        {} of {}", result.pages_extracted, result.page_count);
            println!("Text:         {} chars", result.text.chars().count());
            println!("Images:       {}", result.images.len());
            for img in &result.images {
                println!(
                    "  {}  {}x{}  {}",
                    img.filename,
                    img.width,
                    img.height,
                    dim(&img.caption())
                );
            }
            println!("Image folder: {}", result.image_folder.display());
        }
        return Ok(());
    }

    // ── Run generation ───────────────────────────────────────────────────
    let request = SessionRequest::new(
        cli.pages as usize,
        cli.questions as usize,
        ComplexityDistribution::from_sliders(cli.low, cli.medium, cli.hard),
    );
    let report = generate_to_dir(
        &cli.input,
        &request,
        &config,
        &MarkdownRenderer::default(),
        &cli.output_dir,
        cli.json,
    )
    .await
    .context("Generation failed")?;

    if !cli.quiet {
        let stats = &report.stats;
        eprintln!(
            "{}  {}  {}ms",
            if stats.failed_requests == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            stats.summary(),
            stats.total_duration_ms,
        );
        for path in report.artifacts() {
            eprintln!("   →  {}", bold(&path.display().to_string()));
        }
        eprintln!(
            "   {} tokens in  /  {} tokens out",
            dim(&stats.total_input_tokens.to_string()),
            dim(&stats.total_output_tokens.to_string()),
        );
    }

    Ok(())
}

/// Map CLI args to `GenerationConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<GenerationConfig> {
    let mut builder = GenerationConfig::builder()
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .max_retries(cli.max_retries)
        .concurrency(cli.concurrency)
        .chunk_words(cli.chunk_words)
        .download_timeout_secs(cli.download_timeout)
        .api_timeout_secs(cli.api_timeout);

    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
