//! Transport errors.

use std::fmt;

use wardwire_core::ProtocolError;

/// Errors that can occur while driving a channel over the bus.
#[derive(Debug)]
pub enum TransportError {
    /// Protocol-level error from wardwire-core.
    Protocol(ProtocolError),

    /// Bus publish or subscribe failure.
    Bus(String),

    /// The subscription feeding this channel has gone away.
    ChannelClosed,

    /// Operation on a terminated session.
    SessionClosed,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Protocol(e) => write!(f, "protocol error: {}", e),
            Self::Bus(msg) => write!(f, "bus error: {}", msg),
            Self::ChannelClosed => write!(f, "channel closed"),
            Self::SessionClosed => write!(f, "session closed"),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<ProtocolError> for TransportError {
    fn from(e: ProtocolError) -> Self {
        match e {
            ProtocolError::SessionClosed => Self::SessionClosed,
            other => Self::Protocol(other),
        }
    }
}
