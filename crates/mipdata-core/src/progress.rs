//! Progress notifications for long-running catalog operations.

use std::sync::Arc;

/// Progress callback for fetch and download updates.
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// What a catalog operation is doing right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// A remote transfer started.
    Started { label: String, url: String },
    /// The transfer finished and its result is in place.
    Finished { label: String, bytes: u64 },
    /// Something the user should know that did not fail the operation.
    Notice { message: String },
}
