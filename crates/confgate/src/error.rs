//! Unified error type for Confgate.

use confgate_dialog::DialogError;
use confgate_retry::RetryError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum ConfgateError {
    /// A dialog could not be finished (sink gone, no runtime).
    #[error(transparent)]
    Dialog(#[from] DialogError),

    /// A retry timer could not be armed.
    #[error(transparent)]
    Retry(#[from] RetryError),

    /// The auth service task has stopped; events can no longer be
    /// delivered.
    #[error("auth service stopped")]
    ServiceStopped,
}

#[cfg(test)]
mod tests {
    use confgate_protocol::{DialogKind, RetryHandle};

    use super::*;

    #[test]
    fn test_from_dialog_error() {
        let err: ConfgateError =
            DialogError::SinkClosed(DialogKind::LoginPrompt).into();
        assert!(matches!(err, ConfgateError::Dialog(_)));
        assert!(err.to_string().contains("LoginPrompt"));
    }

    #[test]
    fn test_from_retry_error() {
        let err: ConfgateError = RetryError::NoRuntime(RetryHandle(3)).into();
        assert!(matches!(err, ConfgateError::Retry(_)));
        assert!(err.to_string().contains("retry-3"));
    }
}
