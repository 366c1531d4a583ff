//! Error types for the retry layer.

/// Errors that can occur while arming a retry timer.
#[derive(Debug, thiserror::Error)]
pub enum RetryError {
    /// There is no Tokio runtime to run the timer on.
    /// Happens when a scheduler is driven from outside a runtime context.
    #[error("no async runtime available to arm {0}")]
    NoRuntime(confgate_protocol::RetryHandle),
}
