//! Wire framing and bounds checking.
//!
//! Wire format (one bus message = one frame):
//! ```text
//! +------------------+-------------+------------------------------+
//! | SESSION ID (36B) | NONCE (12B) | CIPHERTEXT + GCM TAG (>=16B) |
//! +------------------+-------------+------------------------------+
//! ```
//!
//! No length prefix is transmitted: the ciphertext length is "remainder of
//! frame". The session id is 36 bytes of ASCII (a hyphenated UUID for frames
//! we produce), but parsing never inspects its content — a frame addressed to
//! another session carries whatever that session put there, and identity
//! validation is the session layer's job.

use crate::error::ProtocolError;

/// Session id field width: one hyphenated UUID.
pub const SESSION_ID_LEN: usize = 36;

/// AES-GCM nonce width.
pub const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag width (embedded at the end of the ciphertext).
pub const TAG_LEN: usize = 16;

/// Minimum total frame length: id + nonce + tag-only ciphertext.
pub const MIN_FRAME_LEN: usize = SESSION_ID_LEN + NONCE_LEN + TAG_LEN;

/// A parsed wire frame.
///
/// Frames are immutable after construction. Bounds validation happens at
/// parse time; cryptographic validation happens in [`crate::seal::open`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    session_id: [u8; SESSION_ID_LEN],
    nonce: [u8; NONCE_LEN],
    ciphertext: Vec<u8>,
}

impl Frame {
    /// Assemble a frame from its fields.
    ///
    /// # Errors
    ///
    /// Returns `MalformedFrame` if the ciphertext is too short to even hold
    /// an authentication tag.
    pub fn from_parts(
        session_id: [u8; SESSION_ID_LEN],
        nonce: [u8; NONCE_LEN],
        ciphertext: Vec<u8>,
    ) -> Result<Self, ProtocolError> {
        if ciphertext.len() < TAG_LEN {
            return Err(ProtocolError::MalformedFrame);
        }
        Ok(Self {
            session_id,
            nonce,
            ciphertext,
        })
    }

    /// Parse a frame from raw bus bytes.
    ///
    /// Anything shorter than [`MIN_FRAME_LEN`] is rejected before any field
    /// extraction is attempted. Session id content is NOT validated here.
    ///
    /// # Errors
    ///
    /// Returns `MalformedFrame` for undersized input.
    pub fn parse(bytes: &[u8]) -> Result<Self, ProtocolError> {
        if bytes.len() < MIN_FRAME_LEN {
            return Err(ProtocolError::MalformedFrame);
        }

        let mut session_id = [0u8; SESSION_ID_LEN];
        session_id.copy_from_slice(&bytes[..SESSION_ID_LEN]);

        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&bytes[SESSION_ID_LEN..SESSION_ID_LEN + NONCE_LEN]);

        let ciphertext = bytes[SESSION_ID_LEN + NONCE_LEN..].to_vec();

        Ok(Self {
            session_id,
            nonce,
            ciphertext,
        })
    }

    /// Serialize to wire format: `session_id || nonce || ciphertext`.
    pub fn to_wire(&self) -> Vec<u8> {
        let mut wire = Vec::with_capacity(MIN_FRAME_LEN + self.ciphertext.len() - TAG_LEN);
        wire.extend_from_slice(&self.session_id);
        wire.extend_from_slice(&self.nonce);
        wire.extend_from_slice(&self.ciphertext);
        wire
    }

    /// Raw session id bytes (36 bytes of ASCII for frames we produce).
    pub fn session_id(&self) -> &[u8; SESSION_ID_LEN] {
        &self.session_id
    }

    /// Per-message nonce.
    pub fn nonce(&self) -> &[u8; NONCE_LEN] {
        &self.nonce
    }

    /// Ciphertext including the trailing 16-byte tag.
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// Total wire length of this frame.
    pub fn wire_len(&self) -> usize {
        SESSION_ID_LEN + NONCE_LEN + self.ciphertext.len()
    }
}
