//! Authentication-recovery state machine for Confgate.
//!
//! Reacts to session lifecycle events by deciding whether to prompt for
//! credentials, whether to keep retrying while the room waits for its
//! owner, and which single prompt is visible.
//!
//! # Key types
//!
//! - [`AuthStateMachine`]: the transition function
//! - [`AuthenticationState`]: what the machine remembers between events
//! - [`AuthPhase`]: the derived phase (never stored)
//! - [`Command`]: what the machine wants done; applied by its owner
//! - [`AuthConfig`]: intervals

mod command;
mod config;
mod machine;
mod state;

pub use command::Command;
pub use config::AuthConfig;
pub use machine::AuthStateMachine;
pub use state::{AuthPhase, AuthenticationState, PendingRetry};
