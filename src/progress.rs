//! Progress-callback trait for extraction and generation events.
//!
//! Inject an [`Arc<dyn GenerationProgressCallback>`] via
//! [`crate::config::GenerationConfigBuilder::progress_callback`] to observe
//! the pipeline at its checkpoints without the library printing anything.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdf2mcq::{Complexity, GenerationConfig, GenerationProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     accepted: AtomicUsize,
//! }
//!
//! impl GenerationProgressCallback for CountingCallback {
//!     fn on_request_complete(&self, _c: Complexity, _chunk: usize, _chunks: usize, accepted: usize) {
//!         self.accepted.fetch_add(accepted, Ordering::SeqCst);
//!     }
//! }
//!
//! let cb = Arc::new(CountingCallback { accepted: AtomicUsize::new(0) });
//! let config = GenerationConfig::builder()
//!     .progress_callback(cb as Arc<dyn GenerationProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::output::Complexity;
use std::sync::Arc;

/// Called by the pipeline at each checkpoint.
///
/// All methods default to no-ops. With `concurrency > 1` the request events
/// may arrive from several tasks at once, so implementations must be
/// `Send + Sync` and synchronise their own state.
///
/// `chunk` arguments are 1-indexed.
pub trait GenerationProgressCallback: Send + Sync {
    /// Extraction finished; `images` survived the quality filters.
    fn on_extraction_complete(&self, pages: usize, text_chars: usize, images: usize) {
        let _ = (pages, text_chars, images);
    }

    /// Generation is about to start for `requested` questions over `chunks` chunks.
    fn on_generation_start(&self, requested: usize, chunks: usize) {
        let _ = (requested, chunks);
    }

    /// A completion request for `count` questions is about to be sent.
    fn on_request_start(&self, complexity: Complexity, chunk: usize, chunks: usize, count: usize) {
        let _ = (complexity, chunk, chunks, count);
    }

    /// A request returned and `accepted` questions survived parsing and truncation.
    fn on_request_complete(
        &self,
        complexity: Complexity,
        chunk: usize,
        chunks: usize,
        accepted: usize,
    ) {
        let _ = (complexity, chunk, chunks, accepted);
    }

    /// A request failed after retries, or parsed to nothing.
    fn on_request_error(&self, complexity: Complexity, chunk: usize, chunks: usize, error: &str) {
        let _ = (complexity, chunk, chunks, error);
    }

    /// Every bucket has been attempted.
    fn on_generation_complete(&self, requested: usize, produced: usize) {
        let _ = (requested, produced);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl GenerationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::GenerationConfig`].
pub type ProgressCallback = Arc<dyn GenerationProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        accepted: AtomicUsize,
        errors: AtomicUsize,
        produced: AtomicUsize,
    }

    impl GenerationProgressCallback for TrackingCallback {
        fn on_request_start(&self, _c: Complexity, _chunk: usize, _chunks: usize, _count: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_request_complete(&self, _c: Complexity, _chunk: usize, _chunks: usize, accepted: usize) {
            self.accepted.fetch_add(accepted, Ordering::SeqCst);
        }

        fn on_request_error(&self, _c: Complexity, _chunk: usize, _chunks: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_generation_complete(&self, _requested: usize, produced: usize) {
            self.produced.store(produced, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_extraction_complete(2, 1200, 1);
        cb.on_generation_start(10, 2);
        cb.on_request_start(Complexity::Easy, 1, 2, 2);
        cb.on_request_complete(Complexity::Easy, 1, 2, 2);
        cb.on_request_error(Complexity::Hard, 2, 2, "timeout");
        cb.on_generation_complete(10, 8);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_request_start(Complexity::Easy, 1, 2, 2);
        tracker.on_request_complete(Complexity::Easy, 1, 2, 2);
        tracker.on_request_start(Complexity::Easy, 2, 2, 3);
        tracker.on_request_error(Complexity::Easy, 2, 2, "empty parse");
        tracker.on_generation_complete(5, 2);

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.accepted.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.produced.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_generation_start(5, 1);
    }
}
