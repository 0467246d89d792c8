//! File-backed ephemeral key store.
//!
//! One record per session id: `<dir>/<id>.key` holding the 16-byte key as
//! lowercase hex text. Records are written whole in a single call, so
//! concurrent readers and writers of distinct ids never observe each other.
//! Overwriting an existing id is last-write-wins; callers should treat that
//! as a logical error and allocate a fresh id instead.

use std::fs;
use std::path::{Path, PathBuf};

use rand::{rngs::OsRng, RngCore};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::KeyStoreError;
use crate::session::SessionId;

/// Width of a session key in bytes (AES-128).
pub const KEY_LEN: usize = 16;

/// Filename suffix for persisted key records.
const KEY_SUFFIX: &str = ".key";

/// A 16-byte symmetric session key.
///
/// Generated once per session, never mutated, zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SessionKey([u8; KEY_LEN]);

impl SessionKey {
    /// Generate a fresh key from OS randomness.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Wrap existing key bytes.
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// Lowercase hex rendering, as persisted at rest.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse the at-rest hex form.
    ///
    /// # Errors
    ///
    /// Returns `Corrupt` for non-hex input or any length other than 16 bytes.
    pub fn from_hex(text: &str) -> Result<Self, KeyStoreError> {
        let decoded = hex::decode(text.trim()).map_err(|_| KeyStoreError::Corrupt)?;
        let bytes: [u8; KEY_LEN] = decoded.try_into().map_err(|_| KeyStoreError::Corrupt)?;
        Ok(Self(bytes))
    }
}

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material.
        f.write_str("SessionKey(..)")
    }
}

/// Directory of per-session key records.
#[derive(Debug, Clone)]
pub struct KeyStore {
    dir: PathBuf,
}

impl KeyStore {
    /// Open a store rooted at `dir`, creating the directory if missing.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, KeyStoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(KeyStoreError::Io)?;
        Ok(Self { dir })
    }

    /// Generate a fresh session key. Pure convenience over
    /// [`SessionKey::generate`]; no store state is touched.
    pub fn create_key() -> SessionKey {
        SessionKey::generate()
    }

    /// Persist a key under a session id. Last write wins.
    ///
    /// # Errors
    ///
    /// Returns `Io` on filesystem failure.
    pub fn save(&self, id: &SessionId, key: &SessionKey) -> Result<(), KeyStoreError> {
        fs::write(self.path_for(id), key.to_hex()).map_err(KeyStoreError::Io)
    }

    /// Load the key for a session id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no record exists, `Corrupt` if the record does
    /// not decode, `Io` otherwise.
    pub fn load(&self, id: &SessionId) -> Result<SessionKey, KeyStoreError> {
        let text = fs::read_to_string(self.path_for(id))?;
        SessionKey::from_hex(&text)
    }

    /// Session ids with a persisted key record.
    ///
    /// Files that are not `<uuid>.key` are ignored.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the directory cannot be read.
    pub fn list(&self) -> Result<Vec<SessionId>, KeyStoreError> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(KeyStoreError::Io)? {
            let entry = entry.map_err(KeyStoreError::Io)?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let Some(stem) = name.strip_suffix(KEY_SUFFIX) else {
                continue;
            };
            if let Some(id) = SessionId::parse(stem) {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    /// Path of the record for a session id.
    pub fn path_for(&self, id: &SessionId) -> PathBuf {
        self.dir.join(format!("{}{}", id, KEY_SUFFIX))
    }

    /// Store root directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
