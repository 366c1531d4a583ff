//! Error types for the dialog layer.

use confgate_protocol::DialogKind;

/// Errors that can occur while finishing a dialog.
#[derive(Debug, thiserror::Error)]
pub enum DialogError {
    /// The sink that clears dialogs is gone (the service shut down).
    #[error("cannot dismiss {0}: dialog sink closed")]
    SinkClosed(DialogKind),

    /// A deferred submission needs a Tokio runtime to await on.
    #[error("no async runtime available to await {0} submission")]
    NoRuntime(DialogKind),
}
