//! Shared vocabulary for Confgate.
//!
//! This crate defines the "language" the other layers speak:
//!
//! - **Types** ([`ConnectionError`], [`ConferenceError`], [`DialogKind`],
//!   [`DialogDescriptor`], [`RetryHandle`]): plain data describing what
//!   went wrong and what is on screen.
//! - **Events** ([`AuthEvent`], [`WaitForOwner`], [`RetryHandler`],
//!   [`UpgradeTask`]): everything that can be delivered to the
//!   authentication state machine.
//!
//! # Architecture
//!
//! The protocol layer sits underneath everything else. It knows nothing
//! about timers, dialogs on screen, or the state machine. It only names
//! things.
//!
//! ```text
//! Session layer (events) → Protocol (AuthEvent) → Auth state machine
//! ```

mod events;
mod types;

pub use events::{
    AuthEvent, RetryHandler, UpgradeId, UpgradeTask, WaitForOwner,
};
pub use types::{
    ConferenceError, ConnectionError, DialogDescriptor, DialogKind,
    DialogProps, RetryHandle,
};
