//! Text-completion boundary and its edgequake-llm adapter.
//!
//! The generator only sees [`CompletionService`]: a prompt, a temperature
//! and an output-token cap go in; text (plus token counts when known) comes
//! out. [`LlmCompletionService`] implements it over any
//! [`edgequake_llm::LLMProvider`], enforcing the per-request timeout.
//! Tests script the trait directly.
//!
//! ## Retry Strategy
//!
//! Provider errors (HTTP 429/503, dropped connections) are usually transient.
//! [`complete_with_retry`] retries with exponential backoff
//! (`retry_backoff_ms * 2^(attempt-1)`): with 500 ms base and 2 retries the
//! waits are 500 ms then 1 s. A response that parses to nothing is *not* a
//! transport failure and is never retried here.

use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, warn};

/// One completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub temperature: f32,
    pub max_output_tokens: usize,
}

/// One completion response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionResponse {
    pub text: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
}

impl CompletionResponse {
    /// A response carrying only text, for services that report no usage.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// Failure at the service boundary.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CompletionError {
    #[error("{0}")]
    Request(String),

    #[error("request timed out after {0}s")]
    Timeout(u64),
}

/// Anything that can turn a prompt into text.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError>;

    /// Short name for logs.
    fn name(&self) -> &str {
        "custom"
    }
}

/// [`CompletionService`] over an edgequake-llm provider.
pub struct LlmCompletionService {
    provider: Arc<dyn LLMProvider>,
    timeout: Duration,
    label: String,
}

impl LlmCompletionService {
    pub fn new(provider: Arc<dyn LLMProvider>, timeout_secs: u64) -> Self {
        Self {
            provider,
            timeout: Duration::from_secs(timeout_secs),
            label: "edgequake-llm".to_string(),
        }
    }

    /// Name reported in logs, e.g. `openai/gpt-4.1-nano`.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

#[async_trait]
impl CompletionService for LlmCompletionService {
    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        let messages = vec![ChatMessage::user(&request.prompt)];
        let options = build_options(request);

        let call = self.provider.chat(&messages, Some(&options));
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(response)) => Ok(CompletionResponse {
                text: response.content,
                input_tokens: response.prompt_tokens as usize,
                output_tokens: response.completion_tokens as usize,
            }),
            Ok(Err(e)) => Err(CompletionError::Request(e.to_string())),
            Err(_) => Err(CompletionError::Timeout(self.timeout.as_secs())),
        }
    }

    fn name(&self) -> &str {
        &self.label
    }
}

fn build_options(request: &CompletionRequest) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(request.temperature),
        max_tokens: Some(request.max_output_tokens),
        ..Default::default()
    }
}

/// Outcome of a request after retries: the response, or the last error and
/// how many retries were spent.
pub async fn complete_with_retry(
    service: &dyn CompletionService,
    request: &CompletionRequest,
    max_retries: u32,
    retry_backoff_ms: u64,
    label: &str,
) -> Result<CompletionResponse, (CompletionError, u32)> {
    let mut last_err = CompletionError::Request("no attempt made".into());

    for attempt in 0..=max_retries {
        if attempt > 0 {
            let backoff = retry_backoff_ms.saturating_mul(2u64.saturating_pow(attempt - 1));
            warn!(
                "{}: retry {}/{} after {}ms",
                label, attempt, max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        match service.complete(request).await {
            Ok(response) => {
                debug!(
                    "{}: {} input tokens, {} output tokens",
                    label, response.input_tokens, response.output_tokens
                );
                return Ok(response);
            }
            Err(e) => {
                warn!("{}: attempt {} failed: {}", label, attempt + 1, e);
                last_err = e;
            }
        }
    }

    Err((last_err, max_retries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Flaky {
        failures: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CompletionService for Flaky {
        async fn complete(
            &self,
            _request: &CompletionRequest,
        ) -> Result<CompletionResponse, CompletionError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(CompletionError::Request(format!("503 on call {n}")))
            } else {
                Ok(CompletionResponse::text("ok"))
            }
        }
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            prompt: "p".into(),
            temperature: 0.7,
            max_output_tokens: 2500,
        }
    }

    #[test]
    fn build_options_copies_request() {
        let opts = build_options(&request());
        assert_eq!(opts.temperature, Some(0.7));
        assert_eq!(opts.max_tokens, Some(2500));
    }

    #[tokio::test]
    async fn retries_until_success() {
        let svc = Flaky {
            failures: 2,
            calls: AtomicUsize::new(0),
        };
        let out = complete_with_retry(&svc, &request(), 2, 1, "easy chunk 1").await;
        assert_eq!(out.unwrap().text, "ok");
        assert_eq!(svc.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let svc = Flaky {
            failures: 10,
            calls: AtomicUsize::new(0),
        };
        let (err, retries) = complete_with_retry(&svc, &request(), 1, 1, "hard chunk 2")
            .await
            .unwrap_err();
        assert_eq!(retries, 1);
        assert!(err.to_string().contains("503 on call 1"), "got: {err}");
        assert_eq!(svc.calls.load(Ordering::SeqCst), 2);
    }
}
