//! The single-slot dialog presentation store.
//!
//! The platform can show one prompt at a time, so the store holds zero or
//! one [`DialogDescriptor`]. Showing a descriptor replaces whatever was
//! there; there is no stack. The authentication state machine is what
//! remembers that a wait-for-owner prompt is logically pending underneath
//! a login prompt.

use confgate_protocol::{DialogDescriptor, DialogKind, DialogProps};
use tokio::sync::watch;

/// Holds the currently displayed dialog, if any.
///
/// Backed by a `watch` channel so the UI layer can [`subscribe`] and
/// re-render on change. Subscribers are only notified when the descriptor
/// actually changes: showing the prompt that is already up with the same
/// props is silent.
///
/// [`subscribe`]: Self::subscribe
pub struct DialogStore {
    current: watch::Sender<Option<DialogDescriptor>>,
}

impl DialogStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        let (current, _) = watch::channel(None);
        Self { current }
    }

    /// Shows `kind` with `props`, replacing any dialog on screen.
    ///
    /// Returns `true` if the visible descriptor changed.
    pub fn show(&mut self, kind: DialogKind, props: DialogProps) -> bool {
        let next = DialogDescriptor { kind, props };
        let changed = self.current.send_if_modified(|slot| {
            if slot.as_ref() == Some(&next) {
                return false;
            }
            *slot = Some(next);
            true
        });
        if changed {
            tracing::debug!(%kind, "dialog shown");
        }
        changed
    }

    /// Hides the dialog if, and only if, `kind` is the one on screen.
    ///
    /// Returns `true` if something was hidden.
    pub fn hide(&mut self, kind: DialogKind) -> bool {
        let hidden = self.current.send_if_modified(|slot| {
            if slot.as_ref().is_some_and(|d| d.kind == kind) {
                *slot = None;
                true
            } else {
                false
            }
        });
        if hidden {
            tracing::debug!(%kind, "dialog hidden");
        }
        hidden
    }

    /// Returns `true` if `kind` is the dialog on screen.
    pub fn is_shown(&self, kind: DialogKind) -> bool {
        self.shown_kind() == Some(kind)
    }

    /// The kind of the dialog on screen, if any.
    pub fn shown_kind(&self) -> Option<DialogKind> {
        self.current.borrow().as_ref().map(|d| d.kind)
    }

    /// A copy of the descriptor on screen, if any.
    pub fn current(&self) -> Option<DialogDescriptor> {
        self.current.borrow().clone()
    }

    /// Subscribes to descriptor changes.
    pub fn subscribe(&self) -> watch::Receiver<Option<DialogDescriptor>> {
        self.current.subscribe()
    }
}

impl Default for DialogStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(error: &str) -> DialogProps {
        let mut p = DialogProps::new();
        p.insert("error".into(), error.into());
        p
    }

    #[test]
    fn test_new_store_is_empty() {
        let store = DialogStore::new();
        assert_eq!(store.current(), None);
        assert_eq!(store.shown_kind(), None);
    }

    #[test]
    fn test_show_replaces_previous_dialog() {
        let mut store = DialogStore::new();
        store.show(DialogKind::WaitForOwnerPrompt, DialogProps::new());

        store.show(DialogKind::LoginPrompt, DialogProps::new());

        assert!(store.is_shown(DialogKind::LoginPrompt));
        assert!(!store.is_shown(DialogKind::WaitForOwnerPrompt));
    }

    #[test]
    fn test_show_same_descriptor_reports_unchanged() {
        let mut store = DialogStore::new();
        assert!(store.show(DialogKind::LoginPrompt, DialogProps::new()));

        assert!(!store.show(DialogKind::LoginPrompt, DialogProps::new()));
    }

    #[test]
    fn test_show_same_kind_new_props_reports_changed() {
        let mut store = DialogStore::new();
        store.show(DialogKind::LoginPrompt, DialogProps::new());

        assert!(store.show(DialogKind::LoginPrompt, props("denied")));
        assert_eq!(store.current().unwrap().props["error"], "denied");
    }

    #[test]
    fn test_hide_mismatched_kind_is_noop() {
        let mut store = DialogStore::new();
        store.show(DialogKind::LoginPrompt, DialogProps::new());

        assert!(!store.hide(DialogKind::WaitForOwnerPrompt));
        assert!(store.is_shown(DialogKind::LoginPrompt));
    }

    #[test]
    fn test_hide_matching_kind_clears_slot() {
        let mut store = DialogStore::new();
        store.show(DialogKind::LoginPrompt, DialogProps::new());

        assert!(store.hide(DialogKind::LoginPrompt));
        assert_eq!(store.current(), None);
    }

    #[test]
    fn test_subscriber_not_notified_for_idempotent_show() {
        let mut store = DialogStore::new();
        let mut rx = store.subscribe();

        store.show(DialogKind::LoginPrompt, DialogProps::new());
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();

        store.show(DialogKind::LoginPrompt, DialogProps::new());
        assert!(!rx.has_changed().unwrap());
    }
}
