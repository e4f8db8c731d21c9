//! # edgequake-pdf2mcq
//!
//! Turn the first pages of a PDF into a difficulty-balanced set of
//! multiple-choice questions, with figures from the document attached where
//! a question refers to one.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input     resolve local file or download from URL, check %PDF magic
//!  ├─ 2. Extract   page-marked text + filtered images (lopdf, spawn_blocking)
//!  ├─ 3. Chunk     600-word windows
//!  ├─ 4. Generate  per-difficulty quotas, one LLM request per chunk, parse
//!  ├─ 5. Assign    attach figures to questions that mention a visual
//!  └─ 6. Render    question booklet + answer key (Markdown by default)
//! ```
//!
//! Stage-local failures (an undecodable image, a failed request, a malformed
//! question block) only shrink the output. The run aborts only when no text
//! could be extracted, when no question survived, or when the artifacts
//! cannot be written.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdf2mcq::{
//!     generate_to_dir, ComplexityDistribution, GenerationConfig, MarkdownRenderer,
//!     SessionRequest,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let config = GenerationConfig::default();
//!     let request = SessionRequest::new(5, 20, ComplexityDistribution::from_sliders(50, 30, 20));
//!     let report = generate_to_dir(
//!         "lecture.pdf",
//!         &request,
//!         &config,
//!         &MarkdownRenderer::default(),
//!         "out",
//!         false,
//!     )
//!     .await?;
//!     println!("{}", report.stats.summary());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2mcq` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-pdf2mcq = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod render;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ComplexityDistribution, ExtractionConfig, GenerationConfig, GenerationConfigBuilder,
    SessionRequest,
};
pub use error::{Pdf2McqError, RequestError};
pub use generate::{
    extract_only, generate_from_bytes, generate_question_set, generate_sync, generate_to_dir,
    resolve_service,
};
pub use output::{
    AnswerKey, Complexity, ExtractionResult, GenerationStats, ImageRecord, QuestionRecord,
    QuestionSet, SessionReport,
};
pub use pipeline::llm::{CompletionError, CompletionRequest, CompletionResponse, CompletionService};
pub use progress::{GenerationProgressCallback, NoopProgressCallback, ProgressCallback};
pub use render::{write_artifacts, DocumentRenderer, MarkdownRenderer};
pub use session::Session;
