//! Progress-callback trait for per-document batch events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::ProcessConfigBuilder::progress_callback`] to receive
//! events as the batch processes each document — the CLI uses this for its
//! progress bar, but anything implementing the trait works (log forwarder,
//! job-queue status updates, a GUI).
//!
//! The trait is `Send + Sync`: today's batch loop is strictly sequential,
//! but documents are independent of each other and a future implementation
//! may fan them out across threads.

use std::sync::Arc;

/// Called by the batch loop as it processes each document.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once before any document is processed.
    fn on_batch_start(&self, total_documents: usize) {
        let _ = total_documents;
    }

    /// Called just before a document is processed.
    fn on_document_start(&self, name: &str, index: usize, total: usize) {
        let _ = (name, index, total);
    }

    /// Called when a document finishes, with the number of RAG chunks it
    /// produced.
    fn on_document_complete(&self, name: &str, index: usize, total: usize, chunks: usize) {
        let _ = (name, index, total, chunks);
    }

    /// Called when a document fails; the batch continues.
    fn on_document_error(&self, name: &str, index: usize, total: usize, error: &str) {
        let _ = (name, index, total, error);
    }

    /// Called once after every document has been attempted.
    fn on_batch_complete(&self, total: usize, succeeded: usize) {
        let _ = (total, succeeded);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ProcessConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;
