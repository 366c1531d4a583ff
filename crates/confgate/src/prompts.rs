//! Stock behaviors for the two prompts the auth service shows.
//!
//! Neither prompt closes itself on cancel. They tell the state machine
//! what the user did and let it decide what is revealed next, since a
//! login prompt may be covering a wait-for-owner prompt that has to come
//! back.

use std::future::Future;
use std::sync::Arc;

use confgate_dialog::{DialogBehavior, SubmitOutcome};
use confgate_protocol::{AuthEvent, UpgradeTask};
use tracing::{debug, warn};

use crate::AuthHandle;

/// What the login prompt submits.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Upgrades the current anonymous session to an authenticated one.
///
/// Confgate doesn't know how credentials travel; the session layer
/// implements this. The returned error string is shown to the user on the
/// login prompt.
pub trait RoleUpgrader: Send + Sync + 'static {
    /// Performs the upgrade. `task` is cancelled if the user gives up;
    /// implementations may check it to stop early.
    fn upgrade(
        &self,
        credentials: Credentials,
        task: UpgradeTask,
    ) -> impl Future<Output = Result<(), String>> + Send;
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

/// Behavior of the login prompt.
pub struct LoginPromptBehavior<U: RoleUpgrader> {
    auth: AuthHandle,
    upgrader: Arc<U>,
}

impl<U: RoleUpgrader> LoginPromptBehavior<U> {
    pub fn new(auth: AuthHandle, upgrader: Arc<U>) -> Self {
        Self { auth, upgrader }
    }
}

impl<U: RoleUpgrader> DialogBehavior for LoginPromptBehavior<U> {
    type Value = Credentials;

    fn on_cancel(&mut self) -> bool {
        if let Err(e) = self.auth.cancel_login() {
            warn!(error = %e, "could not report login cancel");
        }
        false
    }

    fn on_submit(&mut self, credentials: Credentials) -> SubmitOutcome {
        let task = UpgradeTask::new();
        if let Err(e) = self.auth.emit(AuthEvent::UpgradeStarted(task.clone())) {
            warn!(error = %e, "could not start role upgrade");
            return SubmitOutcome::Immediate(false);
        }

        let auth = self.auth.clone();
        let upgrader = Arc::clone(&self.upgrader);
        SubmitOutcome::deferred(async move {
            let result = upgrader.upgrade(credentials, task.clone()).await;

            // Cancelled while in flight: the state machine already
            // forgot this task, so the result has nowhere to go.
            if task.is_cancelled() {
                debug!(task = %task.id(), "role upgrade finished after cancel");
                return false;
            }

            let ok = result.is_ok();
            let finished = AuthEvent::UpgradeFinished {
                task: task.id(),
                error: result.err(),
            };
            if let Err(e) = auth.emit(finished) {
                warn!(error = %e, "could not report role upgrade result");
            }
            ok
        })
    }
}

// ---------------------------------------------------------------------------
// Wait for owner
// ---------------------------------------------------------------------------

/// Behavior of the wait-for-owner prompt.
///
/// Submit is "I am the host": it asks for the login prompt, which
/// replaces this one while the retry loop keeps running underneath.
pub struct WaitForOwnerPromptBehavior {
    auth: AuthHandle,
}

impl WaitForOwnerPromptBehavior {
    pub fn new(auth: AuthHandle) -> Self {
        Self { auth }
    }
}

impl DialogBehavior for WaitForOwnerPromptBehavior {
    type Value = ();

    fn on_cancel(&mut self) -> bool {
        if let Err(e) = self.auth.cancel_wait_for_owner() {
            warn!(error = %e, "could not report wait-for-owner cancel");
        }
        false
    }

    fn on_submit(&mut self, _: ()) -> SubmitOutcome {
        if let Err(e) = self.auth.request_login() {
            warn!(error = %e, "could not request login prompt");
        }
        SubmitOutcome::Immediate(false)
    }
}
