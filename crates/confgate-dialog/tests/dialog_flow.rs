//! Integration tests: a controller finishing a dialog that lives in a store.

use std::sync::{Arc, Mutex};

use confgate_dialog::{
    DialogBehavior, DialogConfig, DialogController, DialogError, DialogSink,
    DialogStore, SubmitOutcome, SubmitProgress,
};
use confgate_protocol::{DialogKind, DialogProps};

// =========================================================================
// Helpers
// =========================================================================

/// A sink that writes straight into a shared store.
struct StoreSink(Arc<Mutex<DialogStore>>);

impl DialogSink for StoreSink {
    fn dismiss(&self, kind: DialogKind) -> Result<(), DialogError> {
        self.0.lock().unwrap().hide(kind);
        Ok(())
    }
}

/// A room-password style prompt: accepts only one value.
struct Passphrase {
    expected: &'static str,
}

impl DialogBehavior for Passphrase {
    type Value = String;

    fn on_submit(&mut self, value: String) -> SubmitOutcome {
        let expected = self.expected;
        SubmitOutcome::deferred(async move {
            tokio::task::yield_now().await;
            value == expected
        })
    }
}

fn shown_store(kind: DialogKind) -> Arc<Mutex<DialogStore>> {
    let mut store = DialogStore::new();
    store.show(kind, DialogProps::new());
    Arc::new(Mutex::new(store))
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_successful_submit_hides_dialog_in_store() {
    let store = shown_store(DialogKind::LoginPrompt);
    let mut ctrl = DialogController::new(
        DialogKind::LoginPrompt,
        DialogConfig::default(),
        Passphrase { expected: "open sesame" },
        Arc::new(StoreSink(Arc::clone(&store))),
    );

    let SubmitProgress::Pending(task) =
        ctrl.submit("open sesame".into()).unwrap()
    else {
        panic!("expected a pending submission");
    };
    assert!(task.await.unwrap());

    assert_eq!(store.lock().unwrap().current(), None);
}

#[tokio::test]
async fn test_wrong_value_leaves_dialog_for_retry() {
    let store = shown_store(DialogKind::LoginPrompt);
    let mut ctrl = DialogController::new(
        DialogKind::LoginPrompt,
        DialogConfig::default(),
        Passphrase { expected: "open sesame" },
        Arc::new(StoreSink(Arc::clone(&store))),
    );

    let SubmitProgress::Pending(task) = ctrl.submit("guess".into()).unwrap()
    else {
        panic!("expected a pending submission");
    };
    assert!(!task.await.unwrap());

    assert!(store.lock().unwrap().is_shown(DialogKind::LoginPrompt));
    assert!(ctrl.can_submit(), "user may try again");
}

#[tokio::test]
async fn test_dismiss_does_not_hide_other_kind() {
    // The login prompt replaced the wait prompt while the wait prompt's
    // controller was still finishing; its dismiss must not clear login.
    let store = shown_store(DialogKind::LoginPrompt);
    let mut ctrl = DialogController::new(
        DialogKind::WaitForOwnerPrompt,
        DialogConfig::default(),
        Passphrase { expected: "x" },
        Arc::new(StoreSink(Arc::clone(&store))),
    );

    let SubmitProgress::Pending(task) = ctrl.submit("x".into()).unwrap()
    else {
        panic!("expected a pending submission");
    };
    assert!(task.await.unwrap());

    assert!(store.lock().unwrap().is_shown(DialogKind::LoginPrompt));
}
