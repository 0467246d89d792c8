//! Protocol and key-store errors.
//!
//! Protocol errors are per-message: a malformed or tampered frame is dropped
//! or reported, and the session survives. Only `SessionClosed` is terminal,
//! and it is reached exclusively through an authenticated kill sentinel or an
//! explicit local terminate.

use std::fmt;

/// Errors raised by the frame codec and the session state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// Frame shorter than the 64-byte minimum. Dropped by receive drivers,
    /// never fatal for the session.
    MalformedFrame,

    /// AEAD tag verification failed: bit tamper, wrong key, or wrong nonce.
    /// Reported per message; the session stays in its current state.
    AuthenticationFailed,

    /// Authenticated plaintext is not valid UTF-8.
    InvalidUtf8,

    /// Operation attempted on a terminated session.
    SessionClosed,

    /// Internal error (should never happen).
    InternalError,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Deliberately terse. Do not leak details.
        match self {
            Self::MalformedFrame => write!(f, "malformed frame"),
            Self::AuthenticationFailed => write!(f, "authentication failed"),
            Self::InvalidUtf8 => write!(f, "invalid utf-8"),
            Self::SessionClosed => write!(f, "session closed"),
            Self::InternalError => write!(f, "internal error"),
        }
    }
}

impl std::error::Error for ProtocolError {}

/// Errors raised by the file-backed key store.
#[derive(Debug)]
pub enum KeyStoreError {
    /// No key record exists for the session id.
    NotFound,

    /// A record exists but does not decode to a 16-byte hex key.
    Corrupt,

    /// Underlying filesystem failure.
    Io(std::io::Error),
}

impl fmt::Display for KeyStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found for session"),
            Self::Corrupt => write!(f, "key record is corrupt"),
            Self::Io(e) => write!(f, "key store i/o error: {}", e),
        }
    }
}

impl std::error::Error for KeyStoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for KeyStoreError {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound
        } else {
            Self::Io(e)
        }
    }
}
