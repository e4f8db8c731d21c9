//! Error types for the edgequake-pdf2mcq library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Pdf2McqError`] is **fatal**: the run cannot produce a question set
//!   (bad input file, no extractable text, provider not configured, zero
//!   questions generated, artifacts could not be written). Returned as
//!   `Err(Pdf2McqError)` from the top-level `generate*` functions.
//!
//! * [`RequestError`] is **non-fatal**: one completion request for one
//!   (difficulty, chunk) pair failed or yielded nothing usable. Collected in
//!   [`crate::output::QuestionSet::request_errors`]; that chunk's quota is
//!   simply under-fulfilled and generation carries on.
//!
//! Per-image and per-block failures are even more local: they are logged and
//! the image or block is skipped without surfacing anywhere.

use crate::output::Complexity;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-pdf2mcq library.
#[derive(Debug, Error)]
pub enum Pdf2McqError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is neither a file path nor an HTTP(S) URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but the download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── Document errors ───────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// Nothing but whitespace was extracted from the requested page range.
    #[error("No extractable text found in the first {pages} page(s) of '{path}'")]
    NoExtractableText { path: PathBuf, pages: usize },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Every completion request failed or parsed to nothing.
    #[error("MCQ generation failed: 0 of {requested} questions produced after {requests} request(s).{}",
        first_error_suffix(.first_error))]
    GenerationFailed {
        requested: usize,
        requests: usize,
        first_error: Option<String>,
    },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write an output artifact.
    #[error("Failed to write output file '{path}': {source}")]
    ArtifactWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document renderer could not produce an artifact.
    #[error("Failed to render {artifact}: {detail}")]
    RenderFailed { artifact: String, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn first_error_suffix(first_error: &Option<String>) -> String {
    first_error
        .as_deref()
        .map(|e| format!("\nFirst error: {e}"))
        .unwrap_or_default()
}

/// A non-fatal failure of one completion request.
///
/// `chunk` is 1-indexed, matching the log output.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum RequestError {
    /// The completion service kept failing after all retries.
    #[error("{complexity} chunk {chunk}: request failed after {retries} retries: {detail}")]
    RequestFailed {
        complexity: Complexity,
        chunk: usize,
        retries: u32,
        detail: String,
    },

    /// The completion service did not answer in time.
    #[error("{complexity} chunk {chunk}: request timed out after {secs}s")]
    Timeout {
        complexity: Complexity,
        chunk: usize,
        secs: u64,
    },

    /// The response contained no block that passed validation.
    #[error("{complexity} chunk {chunk}: response contained no well-formed question")]
    EmptyParse { complexity: Complexity, chunk: usize },
}

impl RequestError {
    /// The difficulty bucket the failed request belonged to.
    pub fn complexity(&self) -> Complexity {
        match self {
            RequestError::RequestFailed { complexity, .. }
            | RequestError::Timeout { complexity, .. }
            | RequestError::EmptyParse { complexity, .. } => *complexity,
        }
    }
}
