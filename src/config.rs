//! Configuration types for question generation.
//!
//! Generation behaviour is controlled through [`GenerationConfig`], built via
//! its [`GenerationConfigBuilder`]. The per-request knobs that the upload
//! boundary validates (page count, question count, difficulty sliders) live in
//! [`SessionRequest`], and the extractor's quality filters in
//! [`ExtractionConfig`].

use crate::error::Pdf2McqError;
use crate::pipeline::llm::CompletionService;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Page bound accepted at the upload boundary.
pub const PAGE_LIMITS: (usize, usize) = (1, 50);
/// Question-count bound accepted at the upload boundary.
pub const QUESTION_LIMITS: (usize, usize) = (5, 50);
/// Default words per chunk sent to the completion service.
pub const DEFAULT_CHUNK_WORDS: usize = 600;

/// Configuration for a question-generation run.
///
/// # Example
/// ```rust
/// use edgequake_pdf2mcq::GenerationConfig;
///
/// let config = GenerationConfig::builder()
///     .model("gpt-4.1-mini")
///     .temperature(0.5)
///     .max_retries(1)
///     .build()
///     .unwrap();
/// assert_eq!(config.chunk_words, 600);
/// ```
#[derive(Clone)]
pub struct GenerationConfig {
    /// LLM model identifier. If None, `gpt-4.1-nano` is used for named providers.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Pre-constructed completion service. Takes precedence over everything else.
    pub service: Option<Arc<dyn CompletionService>>,

    /// Sampling temperature. Default: 0.7.
    ///
    /// Question writing benefits from some variety in distractors; 0.7 keeps
    /// the template intact while avoiding near-duplicate options.
    pub temperature: f32,

    /// Maximum tokens per completion. Default: 2500.
    pub max_tokens: usize,

    /// Words per chunk. Default: 600.
    pub chunk_words: usize,

    /// Retries on a failed completion request. Default: 2.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled per attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// Completion requests in flight at once. Default: 1.
    ///
    /// With 1, chunks are requested strictly in order and later chunks absorb
    /// whatever earlier chunks failed to deliver. Above 1 the request plan is
    /// fixed up front and dispatched concurrently; results are still consumed
    /// in chunk order.
    pub concurrency: usize,

    /// Per-request timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Quality filters applied by the extractor.
    pub extraction: ExtractionConfig,

    /// Progress events. None means no callbacks.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            service: None,
            temperature: 0.7,
            max_tokens: 2500,
            chunk_words: DEFAULT_CHUNK_WORDS,
            max_retries: 2,
            retry_backoff_ms: 500,
            concurrency: 1,
            api_timeout_secs: 60,
            download_timeout_secs: 120,
            extraction: ExtractionConfig::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("service", &self.service.as_ref().map(|_| "<dyn CompletionService>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("chunk_words", &self.chunk_words)
            .field("max_retries", &self.max_retries)
            .field("concurrency", &self.concurrency)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("extraction", &self.extraction)
            .finish()
    }
}

impl GenerationConfig {
    /// Create a new builder for `GenerationConfig`.
    pub fn builder() -> GenerationConfigBuilder {
        GenerationConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`GenerationConfig`].
pub struct GenerationConfigBuilder {
    config: GenerationConfig,
}

impl GenerationConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn service(mut self, service: Arc<dyn CompletionService>) -> Self {
        self.config.service = Some(service);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn chunk_words(mut self, n: usize) -> Self {
        self.config.chunk_words = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn extraction(mut self, extraction: ExtractionConfig) -> Self {
        self.config.extraction = extraction;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GenerationConfig, Pdf2McqError> {
        let c = &self.config;
        if c.chunk_words == 0 {
            return Err(Pdf2McqError::InvalidConfig(
                "Chunk size must be ≥ 1 word".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(Pdf2McqError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(Pdf2McqError::InvalidConfig(
                "API timeout must be ≥ 1s".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Extraction ───────────────────────────────────────────────────────────

/// Heuristic quality filters for extracted images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Images narrower or shorter than this are dropped. Default: 100.
    pub min_dimension: u32,
    /// Images wider *and* taller than this are treated as page backgrounds. Default: 2000.
    pub background_dimension: u32,
    /// Opaque images whose sampled brightness is below this are dropped. Default: 5.0.
    pub min_brightness: f64,
    /// Pixels sampled for the brightness check. Default: 20.
    pub brightness_samples: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_dimension: 100,
            background_dimension: 2000,
            min_brightness: 5.0,
            brightness_samples: 20,
        }
    }
}

// ── Difficulty distribution ──────────────────────────────────────────────

/// Percentages of easy ("low"), medium and hard questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexityDistribution {
    pub low: u32,
    pub medium: u32,
    pub hard: u32,
}

impl Default for ComplexityDistribution {
    fn default() -> Self {
        Self {
            low: 40,
            medium: 40,
            hard: 20,
        }
    }
}

impl ComplexityDistribution {
    pub fn new(low: u32, medium: u32, hard: u32) -> Self {
        Self { low, medium, hard }
    }

    /// Clamp raw slider positions to 0–100 each, then [`normalize`](Self::normalize).
    pub fn from_sliders(low: u32, medium: u32, hard: u32) -> Self {
        Self::new(low.min(100), medium.min(100), hard.min(100)).normalize()
    }

    /// Rescale so the three values sum to 100.
    ///
    /// `low' = ⌊low·100/sum⌋`, `medium' = ⌊medium·100/sum⌋`,
    /// `hard' = 100 − low' − medium'`. An all-zero triple becomes 33/33/33,
    /// which sums to 99; every other input sums to exactly 100 and is a fixed
    /// point of this function.
    pub fn normalize(self) -> Self {
        let sum = self.low as u64 + self.medium as u64 + self.hard as u64;
        if sum == 0 {
            return Self::new(33, 33, 33);
        }
        let low = (self.low as u64 * 100 / sum) as u32;
        let medium = (self.medium as u64 * 100 / sum) as u32;
        Self::new(low, medium, 100 - low - medium)
    }

    pub fn total(&self) -> u32 {
        self.low + self.medium + self.hard
    }
}

// ── Session request ──────────────────────────────────────────────────────

/// Per-upload parameters, clamped the way the upload boundary accepts them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRequest {
    /// Pages to read from the start of the document (1–50).
    pub pages: usize,
    /// Questions to generate (5–50).
    pub questions: usize,
    pub distribution: ComplexityDistribution,
}

impl Default for SessionRequest {
    fn default() -> Self {
        Self {
            pages: 2,
            questions: 10,
            distribution: ComplexityDistribution::default(),
        }
    }
}

impl SessionRequest {
    /// Clamp `pages` and `questions` into their accepted ranges.
    pub fn new(pages: usize, questions: usize, distribution: ComplexityDistribution) -> Self {
        Self {
            pages: pages.clamp(PAGE_LIMITS.0, PAGE_LIMITS.1),
            questions: questions.clamp(QUESTION_LIMITS.0, QUESTION_LIMITS.1),
            distribution,
        }
    }
}
