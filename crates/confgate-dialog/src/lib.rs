//! Dialog presentation for Confgate.
//!
//! This crate handles the two halves of "a prompt is on screen":
//!
//! 1. **Presentation**: which single prompt is visible ([`DialogStore`])
//! 2. **Lifecycle**: what happens when the user submits or cancels it
//!    ([`DialogController`] driven by a [`DialogBehavior`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Auth state machine (above)  ← sole writer of the store
//!     ↕
//! Dialog layer (this crate)   ← what is shown, how prompts finish
//!     ↕
//! Protocol layer (below)      ← DialogKind, DialogDescriptor
//! ```
//!
//! Controllers never write to the store directly. They ask a
//! [`DialogSink`] to dismiss their dialog, and the sink routes that request
//! back to the store's owner.

mod controller;
mod error;
mod store;

pub use controller::{
    DialogBehavior, DialogConfig, DialogController, DialogSink,
    SubmitOutcome, SubmitProgress,
};
pub use error::DialogError;
pub use store::DialogStore;
