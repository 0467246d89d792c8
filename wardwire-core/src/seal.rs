//! AES-128-GCM seal/open for wire frames.
//!
//! Each sealed message gets a fresh 12-byte nonce from OS randomness; the
//! 16-byte GCM tag rides embedded at the end of the ciphertext. No associated
//! data is used. Opening verifies the tag and nothing else — session identity
//! is checked by the caller before the key is ever applied.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes128Gcm, Nonce,
};
use rand::{rngs::OsRng, RngCore};
use zeroize::Zeroizing;

use crate::error::ProtocolError;
use crate::frame::{Frame, NONCE_LEN};
use crate::keystore::SessionKey;
use crate::session::SessionId;

/// Seal plaintext into a wire frame under the session key.
///
/// Generates a fresh random nonce per call. Nonce reuse under one key breaks
/// confidentiality; the only supported way to produce frames is through this
/// function.
///
/// # Errors
///
/// Returns `InternalError` if the cipher rejects the key or the plaintext
/// (neither occurs for well-formed 16-byte keys).
pub fn seal(id: &SessionId, key: &SessionKey, plaintext: &[u8]) -> Result<Frame, ProtocolError> {
    let cipher =
        Aes128Gcm::new_from_slice(key.as_bytes()).map_err(|_| ProtocolError::InternalError)?;

    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| ProtocolError::InternalError)?;

    Frame::from_parts(id.to_wire(), nonce, ciphertext)
}

/// Open a parsed frame under the session key.
///
/// # Errors
///
/// Returns `AuthenticationFailed` on any tag mismatch: a flipped bit anywhere
/// in the ciphertext or nonce, or a key that does not match the frame.
pub fn open(frame: &Frame, key: &SessionKey) -> Result<Zeroizing<Vec<u8>>, ProtocolError> {
    let cipher =
        Aes128Gcm::new_from_slice(key.as_bytes()).map_err(|_| ProtocolError::InternalError)?;

    cipher
        .decrypt(Nonce::from_slice(frame.nonce()), frame.ciphertext())
        .map(Zeroizing::new)
        .map_err(|_| ProtocolError::AuthenticationFailed)
}

/// Parse raw bus bytes and open them in one step.
///
/// # Errors
///
/// Returns `MalformedFrame` for undersized input (no field extraction is
/// attempted) and `AuthenticationFailed` for a failed tag check.
pub fn decode(bytes: &[u8], key: &SessionKey) -> Result<Zeroizing<Vec<u8>>, ProtocolError> {
    let frame = Frame::parse(bytes)?;
    open(&frame, key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::MIN_FRAME_LEN;

    fn key_and_id() -> (SessionKey, SessionId) {
        (SessionKey::generate(), SessionId::generate())
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let (key, id) = key_and_id();
        for plaintext in [&b""[..], b"AUTH_REQUEST", b"a longer message with spaces"] {
            let frame = seal(&id, &key, plaintext).unwrap();
            let opened = open(&frame, &key).unwrap();
            assert_eq!(&opened[..], plaintext);
        }
    }

    #[test]
    fn test_decode_roundtrip_via_wire() {
        let (key, id) = key_and_id();
        let frame = seal(&id, &key, b"payload").unwrap();
        let opened = decode(&frame.to_wire(), &key).unwrap();
        assert_eq!(&opened[..], b"payload");
    }

    #[test]
    fn test_fresh_nonce_per_message() {
        let (key, id) = key_and_id();
        let a = seal(&id, &key, b"same").unwrap();
        let b = seal(&id, &key, b"same").unwrap();
        assert_ne!(a.nonce(), b.nonce());
        assert_ne!(a.ciphertext(), b.ciphertext());
    }

    #[test]
    fn test_every_ciphertext_bit_is_authenticated() {
        let (key, id) = key_and_id();
        let frame = seal(&id, &key, b"tamper target").unwrap();
        let wire = frame.to_wire();

        // Flip each bit of the ciphertext region in turn; none may decode.
        for byte in MIN_FRAME_LEN - 16..wire.len() {
            for bit in 0..8 {
                let mut tampered = wire.clone();
                tampered[byte] ^= 1 << bit;
                assert_eq!(
                    decode(&tampered, &key).unwrap_err(),
                    ProtocolError::AuthenticationFailed,
                    "bit {} of byte {} survived tampering",
                    bit,
                    byte
                );
            }
        }
    }

    #[test]
    fn test_nonce_tamper_fails() {
        let (key, id) = key_and_id();
        let frame = seal(&id, &key, b"nonce check").unwrap();
        let mut wire = frame.to_wire();
        wire[36] ^= 0x01; // first nonce byte
        assert_eq!(
            decode(&wire, &key).unwrap_err(),
            ProtocolError::AuthenticationFailed
        );
    }

    #[test]
    fn test_wrong_key_fails() {
        let (key, id) = key_and_id();
        let other = SessionKey::generate();
        let frame = seal(&id, &key, b"secret").unwrap();
        assert_eq!(
            open(&frame, &other).unwrap_err(),
            ProtocolError::AuthenticationFailed
        );
    }

    #[test]
    fn test_short_input_rejected_before_decrypt() {
        let key = SessionKey::generate();
        assert_eq!(
            decode(&[0u8; 63], &key).unwrap_err(),
            ProtocolError::MalformedFrame
        );
    }

    #[test]
    fn test_session_id_is_not_authenticated() {
        // The id field is addressing metadata, outside the AEAD envelope.
        // Identity validation is the session layer's job.
        let (key, id) = key_and_id();
        let frame = seal(&id, &key, b"hello").unwrap();
        let mut wire = frame.to_wire();
        wire[0] ^= 0x20;
        let opened = decode(&wire, &key).unwrap();
        assert_eq!(&opened[..], b"hello");
    }
}
