//! The dialog lifecycle controller: what happens on submit and cancel.
//!
//! Every prompt follows the same contract. A concrete prompt only decides
//! *what* its cancel and submit do ([`DialogBehavior`]); the controller
//! decides *when* the dialog closes and keeps the `submitting` flag honest.
//!
//! ```text
//! submit(value) ──→ submitting = true ──→ on_submit(value)
//!                                             │
//!           ┌─────────────── Immediate(ok) ───┤
//!           │                                 │ Deferred(future)
//!           │                                 ▼
//!           │                        spawned continuation awaits
//!           ▼                                 │
//!   ok:  submitting = false (if mounted), dismiss dialog
//!   err: submitting = false (if mounted), dialog stays up
//! ```

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use confgate_protocol::DialogKind;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::DialogError;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Per-dialog switches for the two affordances.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogConfig {
    /// When `true`, [`DialogController::cancel`] does nothing.
    pub cancel_disabled: bool,
    /// When `true`, [`DialogController::submit`] does nothing.
    pub ok_disabled: bool,
}

// ---------------------------------------------------------------------------
// Behavior seam
// ---------------------------------------------------------------------------

/// The result of a submit handler.
pub enum SubmitOutcome {
    /// The submission already finished. `true` means success.
    Immediate(bool),
    /// The submission finishes when the future resolves. `true` means
    /// success, `false` means it was rejected.
    Deferred(BoxFuture<'static, bool>),
}

impl SubmitOutcome {
    /// Wraps a future as a deferred outcome.
    pub fn deferred<F>(future: F) -> Self
    where
        F: Future<Output = bool> + Send + 'static,
    {
        Self::Deferred(future.boxed())
    }
}

impl std::fmt::Debug for SubmitOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Immediate(ok) => f.debug_tuple("Immediate").field(ok).finish(),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// What a concrete prompt does when the user acts on it.
///
/// Both hooks have defaults: a dialog without a cancel hook always closes
/// on cancel, and a dialog without a submit handler always succeeds.
pub trait DialogBehavior: Send + 'static {
    /// What the user submits (typed text, credentials, nothing).
    type Value: Send + 'static;

    /// Called on cancel. Return `false` to keep the dialog up, typically
    /// because the hook asked someone else to decide what to show next.
    fn on_cancel(&mut self) -> bool {
        true
    }

    /// Called on submit.
    fn on_submit(&mut self, value: Self::Value) -> SubmitOutcome {
        let _ = value;
        SubmitOutcome::Immediate(true)
    }
}

/// Where a finished dialog asks to be cleared.
pub trait DialogSink: Send + Sync + 'static {
    /// Requests that `kind` be hidden if it is the dialog on screen.
    fn dismiss(&self, kind: DialogKind) -> Result<(), DialogError>;
}

/// What [`DialogController::submit`] did.
#[derive(Debug)]
pub enum SubmitProgress {
    /// Submission is disabled; nothing happened.
    Ignored,
    /// The handler answered synchronously with this result.
    Completed(bool),
    /// The handler deferred; the task resolves to the eventual result.
    Pending(JoinHandle<bool>),
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Drives one mounted dialog instance.
///
/// Mount safety uses an epoch counter shared with every spawned
/// continuation. The epoch and the `submitting` flag live in one atomic
/// word (flag in bit 0, epoch above it), so a continuation clears the flag
/// only if the epoch it was started in is still current, in a single
/// step. [`unmount`] advances the epoch, so completions that arrive after
/// teardown leave the instance alone. Dismissing the dialog is not
/// instance state and still happens.
///
/// [`unmount`]: Self::unmount
pub struct DialogController<B: DialogBehavior, S: DialogSink> {
    kind: DialogKind,
    config: DialogConfig,
    behavior: B,
    sink: Arc<S>,
    /// Mount epoch and `submitting` flag, packed as `epoch << 1 | flag`.
    lifecycle: Arc<AtomicU64>,
    mounted: bool,
}

impl<B: DialogBehavior, S: DialogSink> DialogController<B, S> {
    /// Mounts a controller for a dialog of `kind`.
    pub fn new(
        kind: DialogKind,
        config: DialogConfig,
        behavior: B,
        sink: Arc<S>,
    ) -> Self {
        Self {
            kind,
            config,
            behavior,
            sink,
            lifecycle: Arc::new(AtomicU64::new(0)),
            mounted: true,
        }
    }

    pub fn kind(&self) -> DialogKind {
        self.kind
    }

    pub fn config(&self) -> &DialogConfig {
        &self.config
    }

    pub fn behavior(&self) -> &B {
        &self.behavior
    }

    pub fn behavior_mut(&mut self) -> &mut B {
        &mut self.behavior
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn is_submitting(&self) -> bool {
        self.lifecycle.load(Ordering::Acquire) & SUBMITTING != 0
    }

    /// Whether the submit affordance should be enabled right now.
    ///
    /// The controller does not refuse a second submit on its own; the
    /// renderer is expected to disable the button using this.
    pub fn can_submit(&self) -> bool {
        !self.config.ok_disabled && !self.is_submitting()
    }

    /// Cancels the dialog.
    ///
    /// Returns `Ok(true)` if a dismiss was requested, `Ok(false)` if
    /// cancel is disabled or the behavior vetoed it.
    pub fn cancel(&mut self) -> Result<bool, DialogError> {
        if self.config.cancel_disabled {
            return Ok(false);
        }
        if !self.behavior.on_cancel() {
            tracing::debug!(kind = %self.kind, "cancel handled by dialog hook");
            return Ok(false);
        }
        self.sink.dismiss(self.kind)?;
        Ok(true)
    }

    /// Submits the dialog with `value`.
    pub fn submit(
        &mut self,
        value: B::Value,
    ) -> Result<SubmitProgress, DialogError> {
        if self.config.ok_disabled {
            return Ok(SubmitProgress::Ignored);
        }
        if self.is_submitting() {
            tracing::debug!(kind = %self.kind, "submit while already submitting");
        }

        self.lifecycle.fetch_or(SUBMITTING, Ordering::AcqRel);

        match self.behavior.on_submit(value) {
            SubmitOutcome::Immediate(ok) => {
                self.lifecycle.fetch_and(!SUBMITTING, Ordering::AcqRel);
                if ok {
                    self.sink.dismiss(self.kind)?;
                }
                Ok(SubmitProgress::Completed(ok))
            }
            SubmitOutcome::Deferred(future) => {
                let runtime = match tokio::runtime::Handle::try_current() {
                    Ok(runtime) => runtime,
                    Err(_) => {
                        self.lifecycle.fetch_and(!SUBMITTING, Ordering::AcqRel);
                        return Err(DialogError::NoRuntime(self.kind));
                    }
                };
                let task = runtime.spawn(settle(
                    future,
                    self.kind,
                    self.epoch(),
                    Arc::clone(&self.lifecycle),
                    Arc::clone(&self.sink),
                ));
                Ok(SubmitProgress::Pending(task))
            }
        }
    }

    /// Tears the instance down. Only the first call has an effect.
    pub fn unmount(&mut self) {
        if self.mounted {
            self.mounted = false;
            self.lifecycle.fetch_add(EPOCH_STEP, Ordering::AcqRel);
        }
    }

    fn epoch(&self) -> u64 {
        self.lifecycle.load(Ordering::Acquire) >> 1
    }
}

impl<B: DialogBehavior, S: DialogSink> Drop for DialogController<B, S> {
    fn drop(&mut self) {
        self.unmount();
    }
}

/// Bit 0 of the lifecycle word: a submission is in flight.
const SUBMITTING: u64 = 1;
/// Adding this advances the epoch stored above the flag bit.
const EPOCH_STEP: u64 = 2;

/// Clears the `submitting` flag if the instance is still in epoch
/// `started_in`. Returns `false` (touching nothing) after an unmount.
fn finish_submitting(lifecycle: &AtomicU64, started_in: u64) -> bool {
    lifecycle
        .fetch_update(Ordering::AcqRel, Ordering::Acquire, |word| {
            (word >> 1 == started_in).then_some(word & !SUBMITTING)
        })
        .is_ok()
}

/// Awaits a deferred submission and applies its result.
async fn settle<S: DialogSink>(
    future: BoxFuture<'static, bool>,
    kind: DialogKind,
    started_in: u64,
    lifecycle: Arc<AtomicU64>,
    sink: Arc<S>,
) -> bool {
    let ok = future.await;

    if !finish_submitting(&lifecycle, started_in) {
        tracing::trace!(%kind, "submission settled after unmount");
    }

    if ok {
        if let Err(e) = sink.dismiss(kind) {
            tracing::warn!(%kind, error = %e, "dismiss after submit failed");
        }
    } else {
        tracing::debug!(%kind, "submission rejected, dialog stays up");
    }
    ok
}

#[cfg(test)]
mod tests {
    //! Unit tests for `DialogController`.
    //!
    //! Naming: `test_{operation}_{scenario}_{expected}`. Deferred
    //! submissions are driven by a `oneshot` channel so each test decides
    //! exactly when (and whether) the "network" answers.

    use std::sync::Mutex;

    use tokio::sync::oneshot;

    use super::*;

    // -- Helpers ----------------------------------------------------------

    /// Records every dismiss request.
    #[derive(Default)]
    struct RecordingSink {
        dismissed: Mutex<Vec<DialogKind>>,
    }

    impl RecordingSink {
        fn dismissed(&self) -> Vec<DialogKind> {
            self.dismissed.lock().unwrap().clone()
        }
    }

    impl DialogSink for RecordingSink {
        fn dismiss(&self, kind: DialogKind) -> Result<(), DialogError> {
            self.dismissed.lock().unwrap().push(kind);
            Ok(())
        }
    }

    /// A sink whose receiver is gone.
    struct ClosedSink;

    impl DialogSink for ClosedSink {
        fn dismiss(&self, kind: DialogKind) -> Result<(), DialogError> {
            Err(DialogError::SinkClosed(kind))
        }
    }

    /// Dialog with default hooks.
    struct Plain;

    impl DialogBehavior for Plain {
        type Value = ();
    }

    /// Dialog whose hooks are scripted by the test.
    struct Scripted {
        allow_cancel: bool,
        next: Option<SubmitOutcome>,
        submitted: Vec<String>,
    }

    impl Scripted {
        fn answering(outcome: SubmitOutcome) -> Self {
            Self {
                allow_cancel: true,
                next: Some(outcome),
                submitted: Vec::new(),
            }
        }
    }

    impl DialogBehavior for Scripted {
        type Value = String;

        fn on_cancel(&mut self) -> bool {
            self.allow_cancel
        }

        fn on_submit(&mut self, value: String) -> SubmitOutcome {
            self.submitted.push(value);
            self.next.take().unwrap_or(SubmitOutcome::Immediate(true))
        }
    }

    fn controller<B: DialogBehavior>(
        behavior: B,
        config: DialogConfig,
    ) -> (DialogController<B, RecordingSink>, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let ctrl = DialogController::new(
            DialogKind::LoginPrompt,
            config,
            behavior,
            Arc::clone(&sink),
        );
        (ctrl, sink)
    }

    // =====================================================================
    // cancel()
    // =====================================================================

    #[test]
    fn test_cancel_default_hook_dismisses() {
        let (mut ctrl, sink) = controller(Plain, DialogConfig::default());

        assert!(ctrl.cancel().unwrap());

        assert_eq!(sink.dismissed(), vec![DialogKind::LoginPrompt]);
    }

    #[test]
    fn test_cancel_disabled_is_noop() {
        let config = DialogConfig {
            cancel_disabled: true,
            ..DialogConfig::default()
        };
        let (mut ctrl, sink) = controller(Plain, config);

        assert!(!ctrl.cancel().unwrap());

        assert!(sink.dismissed().is_empty());
    }

    #[test]
    fn test_cancel_hook_veto_keeps_dialog() {
        let mut behavior = Scripted::answering(SubmitOutcome::Immediate(true));
        behavior.allow_cancel = false;
        let (mut ctrl, sink) = controller(behavior, DialogConfig::default());

        assert!(!ctrl.cancel().unwrap());

        assert!(sink.dismissed().is_empty());
    }

    #[test]
    fn test_cancel_closed_sink_returns_error() {
        let mut ctrl = DialogController::new(
            DialogKind::WaitForOwnerPrompt,
            DialogConfig::default(),
            Plain,
            Arc::new(ClosedSink),
        );

        let result = ctrl.cancel();

        assert!(matches!(
            result,
            Err(DialogError::SinkClosed(DialogKind::WaitForOwnerPrompt))
        ));
    }

    // =====================================================================
    // submit(): immediate outcomes
    // =====================================================================

    #[test]
    fn test_submit_without_handler_succeeds_and_dismisses() {
        let (mut ctrl, sink) = controller(Plain, DialogConfig::default());

        let progress = ctrl.submit(()).unwrap();

        assert!(matches!(progress, SubmitProgress::Completed(true)));
        assert!(!ctrl.is_submitting());
        assert_eq!(sink.dismissed(), vec![DialogKind::LoginPrompt]);
    }

    #[test]
    fn test_submit_immediate_failure_keeps_dialog() {
        let (mut ctrl, sink) = controller(
            Scripted::answering(SubmitOutcome::Immediate(false)),
            DialogConfig::default(),
        );

        let progress = ctrl.submit("hunter2".into()).unwrap();

        assert!(matches!(progress, SubmitProgress::Completed(false)));
        assert!(!ctrl.is_submitting());
        assert!(sink.dismissed().is_empty());
        assert_eq!(ctrl.behavior().submitted, vec!["hunter2".to_string()]);
    }

    #[test]
    fn test_submit_disabled_is_noop() {
        let config = DialogConfig {
            ok_disabled: true,
            ..DialogConfig::default()
        };
        let (mut ctrl, sink) = controller(
            Scripted::answering(SubmitOutcome::Immediate(true)),
            config,
        );

        let progress = ctrl.submit("x".into()).unwrap();

        assert!(matches!(progress, SubmitProgress::Ignored));
        assert!(ctrl.behavior().submitted.is_empty());
        assert!(sink.dismissed().is_empty());
        assert!(!ctrl.can_submit());
    }

    #[test]
    fn test_submit_deferred_without_runtime_returns_error() {
        let (mut ctrl, _sink) = controller(
            Scripted::answering(SubmitOutcome::deferred(async { true })),
            DialogConfig::default(),
        );

        let result = ctrl.submit("x".into());

        assert!(matches!(result, Err(DialogError::NoRuntime(_))));
        assert!(!ctrl.is_submitting());
    }

    // =====================================================================
    // submit(): deferred outcomes
    // =====================================================================

    #[tokio::test]
    async fn test_submit_deferred_marks_submitting_until_resolved() {
        let (tx, rx) = oneshot::channel::<bool>();
        let (mut ctrl, sink) = controller(
            Scripted::answering(SubmitOutcome::deferred(async move {
                rx.await.unwrap_or(false)
            })),
            DialogConfig::default(),
        );

        let SubmitProgress::Pending(task) = ctrl.submit("x".into()).unwrap()
        else {
            panic!("expected a pending submission");
        };
        assert!(ctrl.is_submitting());
        assert!(!ctrl.can_submit());

        tx.send(true).unwrap();
        assert!(task.await.unwrap());

        assert!(!ctrl.is_submitting());
        assert_eq!(sink.dismissed(), vec![DialogKind::LoginPrompt]);
    }

    #[tokio::test]
    async fn test_submit_deferred_rejection_keeps_dialog() {
        let (tx, rx) = oneshot::channel::<bool>();
        let (mut ctrl, sink) = controller(
            Scripted::answering(SubmitOutcome::deferred(async move {
                rx.await.unwrap_or(false)
            })),
            DialogConfig::default(),
        );

        let SubmitProgress::Pending(task) = ctrl.submit("x".into()).unwrap()
        else {
            panic!("expected a pending submission");
        };
        drop(tx);

        assert!(!task.await.unwrap());
        assert!(!ctrl.is_submitting());
        assert!(sink.dismissed().is_empty());
    }

    #[tokio::test]
    async fn test_submit_resolved_after_unmount_skips_state_but_dismisses() {
        let (tx, rx) = oneshot::channel::<bool>();
        let (mut ctrl, sink) = controller(
            Scripted::answering(SubmitOutcome::deferred(async move {
                rx.await.unwrap_or(false)
            })),
            DialogConfig::default(),
        );

        let SubmitProgress::Pending(task) = ctrl.submit("x".into()).unwrap()
        else {
            panic!("expected a pending submission");
        };
        ctrl.unmount();
        assert!(!ctrl.is_mounted());

        tx.send(true).unwrap();
        assert!(task.await.unwrap());

        // The destroyed instance was not touched...
        assert!(ctrl.is_submitting());
        // ...but the global presentation state was still cleared.
        assert_eq!(sink.dismissed(), vec![DialogKind::LoginPrompt]);
    }

    #[tokio::test]
    async fn test_submit_rejected_after_unmount_changes_nothing() {
        let (tx, rx) = oneshot::channel::<bool>();
        let (mut ctrl, sink) = controller(
            Scripted::answering(SubmitOutcome::deferred(async move {
                rx.await.unwrap_or(false)
            })),
            DialogConfig::default(),
        );

        let SubmitProgress::Pending(task) = ctrl.submit("x".into()).unwrap()
        else {
            panic!("expected a pending submission");
        };
        ctrl.unmount();
        tx.send(false).unwrap();

        assert!(!task.await.unwrap());
        assert!(ctrl.is_submitting());
        assert!(sink.dismissed().is_empty());
    }

    #[test]
    fn test_unmount_only_first_call_counts() {
        let (mut ctrl, _sink) = controller(Plain, DialogConfig::default());

        ctrl.unmount();
        ctrl.unmount();

        assert!(!ctrl.is_mounted());
        assert_eq!(ctrl.epoch(), 1);
    }

    #[test]
    fn test_finish_submitting_after_epoch_change_leaves_flag() {
        let lifecycle = AtomicU64::new(SUBMITTING);

        lifecycle.fetch_add(EPOCH_STEP, Ordering::AcqRel);

        assert!(!finish_submitting(&lifecycle, 0));
        assert_eq!(lifecycle.load(Ordering::Acquire), EPOCH_STEP | SUBMITTING);
    }

    #[test]
    fn test_finish_submitting_same_epoch_clears_flag_only() {
        let lifecycle = AtomicU64::new(3 * EPOCH_STEP | SUBMITTING);

        assert!(finish_submitting(&lifecycle, 3));

        assert_eq!(lifecycle.load(Ordering::Acquire), 3 * EPOCH_STEP);
    }

    #[test]
    fn test_unmount_keeps_submitting_flag() {
        let (mut ctrl, _sink) = controller(Plain, DialogConfig::default());
        ctrl.lifecycle.fetch_or(SUBMITTING, Ordering::AcqRel);

        ctrl.unmount();

        assert!(ctrl.is_submitting());
        assert_eq!(ctrl.epoch(), 1);
    }
}
