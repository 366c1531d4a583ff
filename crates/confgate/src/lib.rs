//! # Confgate
//!
//! Authentication-recovery orchestration for real-time conferencing
//! clients.
//!
//! Confgate listens to connection and conference lifecycle events and
//! decides whether the user has to log in, whether the client should keep
//! retrying while the room waits for its owner, and which single prompt is
//! on screen.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use confgate::prelude::*;
//!
//! # async fn run() -> Result<(), ConfgateError> {
//! let (auth, _task) = AuthService::builder(|| { /* back to the lobby */ }).spawn();
//!
//! // Wire the session layer's callbacks to the handle:
//! auth.conference_failed(ConferenceError::AuthenticationRequired)?;
//!
//! // Render whatever the service wants on screen:
//! let mut dialogs = auth.dialogs();
//! dialogs.changed().await.ok();
//! # Ok(())
//! # }
//! ```

mod dispatch;
mod error;
mod navigation;
mod prompts;
mod service;

pub use dispatch::Dispatcher;
pub use error::ConfgateError;
pub use navigation::Navigator;
pub use prompts::{
    Credentials, LoginPromptBehavior, RoleUpgrader, WaitForOwnerPromptBehavior,
};
pub use service::{AuthHandle, AuthService, AuthServiceBuilder};

pub mod prelude {
    pub use crate::{
        AuthHandle, AuthService, AuthServiceBuilder, ConfgateError,
        Credentials, Dispatcher, LoginPromptBehavior, Navigator,
        RoleUpgrader, WaitForOwnerPromptBehavior,
    };
    pub use confgate_auth::{
        AuthConfig, AuthPhase, AuthStateMachine, AuthenticationState, Command,
    };
    pub use confgate_dialog::{
        DialogBehavior, DialogConfig, DialogController, DialogError,
        DialogSink, DialogStore, SubmitOutcome, SubmitProgress,
    };
    pub use confgate_protocol::{
        AuthEvent, ConferenceError, ConnectionError, DialogDescriptor,
        DialogKind, DialogProps, RetryHandle, RetryHandler, UpgradeId,
        UpgradeTask, WaitForOwner,
    };
    pub use confgate_retry::{
        RetryConfig, RetryError, RetryScheduler, TokioRetryScheduler,
    };
}
