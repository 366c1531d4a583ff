//! Everything that can be delivered to the authentication state machine.
//!
//! Events come from three places:
//! - the session layer (connection and conference lifecycle),
//! - the UI (cancel / retry / login buttons, dialog dismissal),
//! - the machine's own machinery (retry timer fires, upgrade progress).

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use crate::{ConferenceError, ConnectionError, DialogKind, RetryHandle};

/// Counter for generating unique upgrade IDs.
static NEXT_UPGRADE_ID: AtomicU64 = AtomicU64::new(1);

// ---------------------------------------------------------------------------
// AuthEvent
// ---------------------------------------------------------------------------

/// An event on the authentication bus.
#[derive(Debug, Clone)]
pub enum AuthEvent {
    // -- Session layer --
    /// The signalling connection is up.
    ConnectionEstablished,
    /// The signalling connection failed.
    ConnectionFailed(ConnectionError),
    /// Joining the conference failed.
    ConferenceFailed(ConferenceError),
    /// The local participant is in the conference.
    ConferenceJoined,
    /// The local participant left the conference.
    ConferenceLeft,

    // -- UI control --
    /// The user dismissed the login prompt.
    CancelLoginRequested,
    /// The user gave up waiting for the owner.
    CancelWaitForOwnerRequested,
    /// Stop the wait-for-owner loop without navigating away.
    StopWaitForOwnerRequested,
    /// (Re)arm the wait-for-owner timer.
    WaitForOwnerRequested(WaitForOwner),
    /// The user wants to log in ("I am the host").
    LoginRequested,
    /// A dialog finished (submitted or cancelled) and asks to be cleared.
    DialogDismissed(DialogKind),

    // -- Internal --
    /// The timer identified by the handle elapsed.
    RetryTimerFired(RetryHandle),
    /// A role upgrade (anonymous → authenticated) has started.
    UpgradeStarted(UpgradeTask),
    /// A role upgrade finished. `error` is `None` on success.
    UpgradeFinished {
        task: UpgradeId,
        error: Option<String>,
    },
}

impl AuthEvent {
    /// A short, stable name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ConnectionEstablished => "ConnectionEstablished",
            Self::ConnectionFailed(_) => "ConnectionFailed",
            Self::ConferenceFailed(_) => "ConferenceFailed",
            Self::ConferenceJoined => "ConferenceJoined",
            Self::ConferenceLeft => "ConferenceLeft",
            Self::CancelLoginRequested => "CancelLoginRequested",
            Self::CancelWaitForOwnerRequested => "CancelWaitForOwnerRequested",
            Self::StopWaitForOwnerRequested => "StopWaitForOwnerRequested",
            Self::WaitForOwnerRequested(_) => "WaitForOwnerRequested",
            Self::LoginRequested => "LoginRequested",
            Self::DialogDismissed(_) => "DialogDismissed",
            Self::RetryTimerFired(_) => "RetryTimerFired",
            Self::UpgradeStarted(_) => "UpgradeStarted",
            Self::UpgradeFinished { .. } => "UpgradeFinished",
        }
    }
}

// ---------------------------------------------------------------------------
// Wait-for-owner
// ---------------------------------------------------------------------------

/// Payload of [`AuthEvent::WaitForOwnerRequested`].
#[derive(Debug, Clone)]
pub struct WaitForOwner {
    /// What to do when the timer elapses.
    pub handler: RetryHandler,
    /// How long to wait before firing.
    pub timeout: Duration,
}

impl WaitForOwner {
    pub fn new(handler: RetryHandler, timeout: Duration) -> Self {
        Self { handler, timeout }
    }
}

type RetryAction = dyn Fn() -> Vec<AuthEvent> + Send + Sync;

/// The action run each time the wait-for-owner timer elapses.
///
/// The action returns the events it wants on the bus (typically a rejoin
/// attempt for the session layer). A *rearming* handler also appends a
/// fresh [`AuthEvent::WaitForOwnerRequested`] carrying itself, which is
/// what makes the retry loop cyclic.
///
/// Cloning is cheap: the action is behind an `Arc`.
#[derive(Clone)]
pub struct RetryHandler {
    action: Arc<RetryAction>,
    rearm: bool,
}

impl RetryHandler {
    /// A handler that runs `action` and then re-arms itself.
    pub fn rearming<F>(action: F) -> Self
    where
        F: Fn() -> Vec<AuthEvent> + Send + Sync + 'static,
    {
        Self {
            action: Arc::new(action),
            rearm: true,
        }
    }

    /// A handler that runs `action` once and leaves re-arming to the
    /// caller.
    pub fn once<F>(action: F) -> Self
    where
        F: Fn() -> Vec<AuthEvent> + Send + Sync + 'static,
    {
        Self {
            action: Arc::new(action),
            rearm: false,
        }
    }

    /// Whether firing this handler re-issues the wait-for-owner request.
    pub fn is_rearming(&self) -> bool {
        self.rearm
    }

    /// Runs the action and returns the events to put on the bus.
    ///
    /// `timeout` is the interval the handler was armed with; a rearming
    /// handler re-arms with the same interval.
    pub fn fire(&self, timeout: Duration) -> Vec<AuthEvent> {
        let mut events = (self.action)();
        if self.rearm {
            events.push(AuthEvent::WaitForOwnerRequested(WaitForOwner {
                handler: self.clone(),
                timeout,
            }));
        }
        events
    }
}

impl fmt::Debug for RetryHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryHandler")
            .field("rearm", &self.rearm)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Role upgrade
// ---------------------------------------------------------------------------

/// Identifies one role-upgrade attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UpgradeId(pub u64);

impl fmt::Display for UpgradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "upgrade-{}", self.0)
    }
}

/// A cancelable "upgrade anonymous session to authenticated" operation.
///
/// Cancellation is advisory: [`cancel`](Self::cancel) only flips a flag
/// shared by every clone. The code driving the upgrade must check
/// [`is_cancelled`](Self::is_cancelled) before it applies its result.
#[derive(Debug, Clone)]
pub struct UpgradeTask {
    id: UpgradeId,
    cancelled: Arc<AtomicBool>,
}

impl UpgradeTask {
    /// Starts tracking a new upgrade attempt with a fresh ID.
    pub fn new() -> Self {
        Self {
            id: UpgradeId(NEXT_UPGRADE_ID.fetch_add(1, Ordering::Relaxed)),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> UpgradeId {
        self.id
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for UpgradeTask {
    fn default() -> Self {
        Self::new()
    }
}
