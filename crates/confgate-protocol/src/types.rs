//! Core protocol types: failure reasons, dialog descriptors, timer handles.
//!
//! The failure reasons mirror the string codes the conferencing library
//! reports (`"connection.passwordRequired"`,
//! `"conference.authenticationRequired"`, ...). Only two of them mean
//! something to the authentication layer; every other reason is treated as
//! terminal.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Identifies one scheduled wait-for-owner timer.
///
/// Handles are allocated by the state machine, never reused within a
/// session, and handed to the scheduler when a timer is armed. Comparing
/// the handle carried by a fired timer with the one currently recorded is
/// how a stale fire is told apart from a live one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RetryHandle(pub u64);

impl fmt::Display for RetryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "retry-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Failure reasons
// ---------------------------------------------------------------------------

/// Why the signalling connection failed.
///
/// Unknown codes deserialize to [`ConnectionError::Unknown`] so a newer
/// library version can't break event decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionError {
    /// The server wants credentials before it lets this client in.
    #[serde(rename = "connection.passwordRequired")]
    PasswordRequired,

    #[serde(rename = "connection.droppedError")]
    ConnectionDropped,

    #[serde(rename = "connection.serverError")]
    ServerError,

    #[serde(rename = "connection.otherError")]
    OtherError,

    #[serde(rename = "connection.unknown", other)]
    Unknown,
}

impl ConnectionError {
    /// The wire code of this reason.
    pub fn code(&self) -> &'static str {
        match self {
            Self::PasswordRequired => "connection.passwordRequired",
            Self::ConnectionDropped => "connection.droppedError",
            Self::ServerError => "connection.serverError",
            Self::OtherError => "connection.otherError",
            Self::Unknown => "connection.unknown",
        }
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Why joining (or staying in) a conference failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConferenceError {
    /// The room is locked until an authenticated owner joins it.
    /// This is the only reason that starts the wait-for-owner loop.
    #[serde(rename = "conference.authenticationRequired")]
    AuthenticationRequired,

    /// The room itself is password protected (room password, not
    /// account credentials).
    #[serde(rename = "conference.passwordRequired")]
    PasswordRequired,

    #[serde(rename = "conference.destroyed")]
    ConferenceDestroyed,

    #[serde(rename = "conference.connectionError")]
    ConnectionError,

    #[serde(rename = "conference.focusDisconnected")]
    FocusDisconnected,

    #[serde(rename = "conference.connectionError.membersOnly")]
    MembersOnly,

    #[serde(rename = "conference.unknown", other)]
    Unknown,
}

impl ConferenceError {
    /// The wire code of this reason.
    pub fn code(&self) -> &'static str {
        match self {
            Self::AuthenticationRequired => "conference.authenticationRequired",
            Self::PasswordRequired => "conference.passwordRequired",
            Self::ConferenceDestroyed => "conference.destroyed",
            Self::ConnectionError => "conference.connectionError",
            Self::FocusDisconnected => "conference.focusDisconnected",
            Self::MembersOnly => "conference.connectionError.membersOnly",
            Self::Unknown => "conference.unknown",
        }
    }
}

impl fmt::Display for ConferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ---------------------------------------------------------------------------
// Dialogs
// ---------------------------------------------------------------------------

/// The prompts the authentication layer knows how to ask for.
///
/// "No dialog" is not a variant: the store models it as
/// `Option<DialogDescriptor>::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DialogKind {
    /// Asks the user for account credentials.
    LoginPrompt,
    /// Tells the user the room is waiting for its owner, offers
    /// "I am the host" (login) and cancel.
    WaitForOwnerPrompt,
}

impl fmt::Display for DialogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoginPrompt => write!(f, "LoginPrompt"),
            Self::WaitForOwnerPrompt => write!(f, "WaitForOwnerPrompt"),
        }
    }
}

/// Kind-specific parameters for a dialog (error reason, retry interval).
///
/// Opaque to this layer; the renderer interprets them.
pub type DialogProps = serde_json::Map<String, serde_json::Value>;

/// The record of which prompt is currently presented, and with what.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogDescriptor {
    pub kind: DialogKind,
    #[serde(default)]
    pub props: DialogProps,
}

impl DialogDescriptor {
    /// A descriptor with no props.
    pub fn new(kind: DialogKind) -> Self {
        Self {
            kind,
            props: DialogProps::new(),
        }
    }

    /// Adds (or replaces) a single prop.
    pub fn with_prop(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }
}
