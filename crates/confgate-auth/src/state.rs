//! What the state machine remembers between events.

use std::fmt;
use std::time::Duration;

use confgate_protocol::{DialogKind, RetryHandle, RetryHandler, UpgradeTask};

/// The one outstanding wait-for-owner timer.
#[derive(Debug, Clone)]
pub struct PendingRetry {
    pub handle: RetryHandle,
    pub handler: RetryHandler,
    pub timeout: Duration,
    /// Set once the timer fired. The entry stays until the handler
    /// re-arms (or someone stops the loop), so the session still counts
    /// as waiting in between.
    pub fired: bool,
}

/// Session-scoped authentication state.
///
/// Created with the machine, dropped with it. Only the machine writes it.
#[derive(Debug, Default)]
pub struct AuthenticationState {
    pub(crate) retry: Option<PendingRetry>,
    pub(crate) upgrade: Option<UpgradeTask>,
    pub(crate) last_upgrade_error: Option<String>,
}

impl AuthenticationState {
    /// Whether the wait-for-owner loop is running.
    pub fn is_waiting_for_owner(&self) -> bool {
        self.retry.is_some()
    }

    /// The handle of the outstanding timer, if any.
    pub fn retry_handle(&self) -> Option<RetryHandle> {
        self.retry.as_ref().map(|r| r.handle)
    }

    pub fn retry(&self) -> Option<&PendingRetry> {
        self.retry.as_ref()
    }

    /// The role upgrade in progress, if any.
    pub fn upgrade(&self) -> Option<&UpgradeTask> {
        self.upgrade.as_ref()
    }

    pub fn last_upgrade_error(&self) -> Option<&str> {
        self.last_upgrade_error.as_deref()
    }
}

/// The phase the session is in, derived from state plus the dialog on
/// screen:
///
/// ```text
///            auth required                password required
///   Idle ─────────────────→ WaitingForOwner ─────────────────→ AwaitingCredentials
///    ↑                           │    ↑                               │
///    └──── joined / left / stop ─┘    └──── cancel login (retry live) ┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    Idle,
    WaitingForOwner,
    AwaitingCredentials,
}

impl AuthPhase {
    /// `LoginPrompt` on screen wins over a live retry loop underneath.
    pub fn derive(
        state: &AuthenticationState,
        shown: Option<DialogKind>,
    ) -> Self {
        if shown == Some(DialogKind::LoginPrompt) {
            Self::AwaitingCredentials
        } else if state.is_waiting_for_owner() {
            Self::WaitingForOwner
        } else {
            Self::Idle
        }
    }
}

impl fmt::Display for AuthPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::WaitingForOwner => write!(f, "WaitingForOwner"),
            Self::AwaitingCredentials => write!(f, "AwaitingCredentials"),
        }
    }
}
