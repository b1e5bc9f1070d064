//! Progress-callback trait for generation events.
//!
//! Inject an [`Arc<dyn GenerationProgress>`] via
//! [`crate::config::KiriConfigBuilder::progress_callback`] to be told when
//! extraction starts and ends, when each model request goes out, and when
//! the action finishes. A GUI forwards these to its status bar; the CLI
//! drives an `indicatif` spinner with them.
//!
//! # Example
//!
//! ```rust
//! use kiri::{GenerationProgress, KiriConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingRequests {
//!     sent: AtomicUsize,
//! }
//!
//! impl GenerationProgress for CountingRequests {
//!     fn on_request_start(&self, chunk: usize, total: usize) {
//!         self.sent.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("request {chunk}/{total}");
//!     }
//! }
//!
//! let config = KiriConfig::builder()
//!     .progress_callback(Arc::new(CountingRequests { sent: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::path::Path;
use std::sync::Arc;

/// Called by the controller as an action moves through the pipeline.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Implementations must be `Send + Sync` because the
/// controller may run on a background worker thread.
pub trait GenerationProgress: Send + Sync {
    /// Text extraction is about to start.
    fn on_extract_start(&self, path: &Path) {
        let _ = path;
    }

    /// Text extraction finished.
    ///
    /// # Arguments
    /// * `chars` — number of characters extracted
    fn on_extract_complete(&self, path: &Path, chars: usize) {
        let _ = (path, chars);
    }

    /// A request is about to be sent to the model.
    ///
    /// # Arguments
    /// * `chunk` — 1-indexed chunk number
    /// * `total` — number of requests this action will make
    fn on_request_start(&self, chunk: usize, total: usize) {
        let _ = (chunk, total);
    }

    /// The model answered one request.
    fn on_request_complete(&self, chunk: usize, total: usize, completion_len: usize) {
        let _ = (chunk, total, completion_len);
    }

    /// The whole action succeeded.
    fn on_generation_complete(&self, body_len: usize, duration_ms: u64) {
        let _ = (body_len, duration_ms);
    }

    /// The action failed; `error` is the displayable message.
    fn on_generation_error(&self, error: &str) {
        let _ = error;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgress;

impl GenerationProgress for NoopProgress {}

/// Convenience alias matching the type stored in [`crate::config::KiriConfig`].
pub type ProgressCallback = Arc<dyn GenerationProgress>;
