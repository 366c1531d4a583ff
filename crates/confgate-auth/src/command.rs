//! Commands produced by the state machine.
//!
//! A transition never performs side effects itself. It returns these, and
//! the owner of the machine applies them in order once the transition is
//! complete. [`Command::Emit`] is how a transition raises a follow-up
//! event: it is queued behind everything already pending, never
//! dispatched recursively.

use std::time::Duration;

use confgate_protocol::{
    AuthEvent, DialogKind, DialogProps, RetryHandle, UpgradeTask,
};

#[derive(Debug, Clone)]
pub enum Command {
    /// Arm the retry timer `handle` to fire after `delay`.
    ScheduleRetry { handle: RetryHandle, delay: Duration },
    /// Disarm the retry timer `handle`.
    CancelRetry(RetryHandle),
    /// Show `kind`, replacing whatever is on screen.
    ShowDialog { kind: DialogKind, props: DialogProps },
    /// Hide `kind` if it is the dialog on screen.
    HideDialog(DialogKind),
    /// Ask the role upgrade to stop.
    CancelUpgrade(UpgradeTask),
    /// Return the user to the pre-conference entry screen.
    NavigateToEntryPoint,
    /// Put an event on the bus after this transition.
    Emit(AuthEvent),
}
