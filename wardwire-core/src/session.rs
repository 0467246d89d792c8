//! Session identity, binding, and the protocol state machine.
//!
//! States: `Idle -> Active -> Terminated`.
//!
//! A session moves to `Active` on its first successful send or receive and
//! to `Terminated` only through an authenticated `KILL_SERVER` plaintext or
//! an explicit local terminate. Authentication failures are per-message
//! events: they are reported and the session keeps running, because a single
//! tampered frame on a shared bus says nothing about the session itself.

use std::fmt;
use std::time::SystemTime;

use uuid::Uuid;
use zeroize::Zeroize;

use crate::error::{KeyStoreError, ProtocolError};
use crate::frame::{Frame, SESSION_ID_LEN};
use crate::keystore::{KeyStore, SessionKey};
use crate::seal;

/// Reserved plaintext that terminates the receiving session.
///
/// The sentinel must arrive through a frame that passes AEAD verification;
/// a forged kill is an ordinary authentication failure.
pub const KILL_SENTINEL: &str = "KILL_SERVER";

/// Prefix for acknowledgement replies: `ACK:` + original plaintext.
pub const ACK_PREFIX: &str = "ACK:";

/// 128-bit session identifier, rendered as the 36-character hyphenated form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Allocate a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse the textual form. Returns `None` for anything that is not a
    /// well-formed UUID.
    pub fn parse(text: &str) -> Option<Self> {
        Uuid::parse_str(text).ok().map(Self)
    }

    /// Recover an id from the 36-byte wire field, if it holds one of ours.
    ///
    /// Foreign frames may carry arbitrary bytes here; those yield `None`.
    pub fn from_wire(bytes: &[u8; SESSION_ID_LEN]) -> Option<Self> {
        let text = std::str::from_utf8(bytes).ok()?;
        Self::parse(text)
    }

    /// The 36 ASCII bytes that go on the wire.
    pub fn to_wire(&self) -> [u8; SESSION_ID_LEN] {
        let mut buf = [0u8; SESSION_ID_LEN];
        self.0.hyphenated().encode_lower(&mut buf);
        buf
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Which side of the exchange this session drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Sends requests, consumes replies.
    Initiator,
    /// Decrypts requests and answers with `ACK:` replies.
    Responder,
}

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created, no traffic yet.
    Idle,
    /// At least one successful send or receive.
    Active,
    /// Killed or destroyed. Final state.
    Terminated,
}

/// Result of processing a received frame.
#[derive(Debug)]
pub enum ReceiveOutcome {
    /// Frame belongs to another session. Dropped silently, no state change.
    Foreign,
    /// Decrypted reply text (initiator side).
    Message(String),
    /// Decrypted request plus the pre-sealed `ACK:` reply (responder side).
    Acknowledge {
        /// The request plaintext.
        message: String,
        /// Reply frame ready to publish.
        reply: Frame,
    },
    /// Authenticated kill sentinel received; the session is now terminated.
    Killed,
}

/// A bound session: identity, key, role, and lifecycle state.
///
/// This type does not implement `Clone`: one session, one key binding.
pub struct Session {
    id: SessionId,
    key: SessionKey,
    role: Role,
    created_at: SystemTime,
    state: SessionState,
}

impl Session {
    /// Bind an id and key into a fresh `Idle` session.
    pub fn new(id: SessionId, key: SessionKey, role: Role) -> Self {
        Self {
            id,
            key,
            role,
            created_at: SystemTime::now(),
            state: SessionState::Idle,
        }
    }

    /// Session id.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Session role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Creation timestamp.
    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    /// Key material. Exposed for display and persistence, never mutated.
    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    /// True once the session is terminated.
    pub fn is_terminated(&self) -> bool {
        self.state == SessionState::Terminated
    }

    /// Does a wire id belong to this session?
    pub fn matches(&self, incoming: &[u8; SESSION_ID_LEN]) -> bool {
        incoming == &self.id.to_wire()
    }

    /// Seal outbound plaintext under the session key.
    ///
    /// Permitted in `Idle` and `Active`; a successful seal moves the session
    /// to `Active`.
    ///
    /// # Errors
    ///
    /// Returns `SessionClosed` once terminated.
    pub fn seal_message(&mut self, text: &str) -> Result<Frame, ProtocolError> {
        if self.is_terminated() {
            return Err(ProtocolError::SessionClosed);
        }
        let frame = seal::seal(&self.id, &self.key, text.as_bytes())?;
        self.state = SessionState::Active;
        Ok(frame)
    }

    /// Seal the acknowledgement for a request: `ACK:` + original plaintext.
    ///
    /// # Errors
    ///
    /// Returns `SessionClosed` once terminated.
    pub fn acknowledge(&mut self, original: &str) -> Result<Frame, ProtocolError> {
        self.seal_message(&format!("{ACK_PREFIX}{original}"))
    }

    /// Process raw inbound bus bytes.
    ///
    /// # Errors
    ///
    /// - `SessionClosed` — the session is terminated; nothing is accepted.
    /// - `MalformedFrame` — undersized input; callers log and drop.
    /// - `AuthenticationFailed` / `InvalidUtf8` — per-message failure; the
    ///   session state is unchanged and later frames are still accepted.
    pub fn on_frame(&mut self, bytes: &[u8]) -> Result<ReceiveOutcome, ProtocolError> {
        let frame = Frame::parse(bytes)?;
        self.receive(frame)
    }

    /// Process an already-parsed frame. See [`Session::on_frame`].
    ///
    /// # Errors
    ///
    /// As for [`Session::on_frame`], minus `MalformedFrame`.
    pub fn receive(&mut self, frame: Frame) -> Result<ReceiveOutcome, ProtocolError> {
        if self.is_terminated() {
            return Err(ProtocolError::SessionClosed);
        }

        // Cross-traffic from other sessions on a shared topic is expected.
        if !self.matches(frame.session_id()) {
            return Ok(ReceiveOutcome::Foreign);
        }

        let plaintext = seal::open(&frame, &self.key)?;
        let text = std::str::from_utf8(&plaintext)
            .map_err(|_| ProtocolError::InvalidUtf8)?
            .to_string();

        self.state = SessionState::Active;

        if text == KILL_SENTINEL {
            self.terminate();
            return Ok(ReceiveOutcome::Killed);
        }

        match self.role {
            Role::Responder => {
                let reply = self.acknowledge(&text)?;
                Ok(ReceiveOutcome::Acknowledge {
                    message: text,
                    reply,
                })
            }
            Role::Initiator => Ok(ReceiveOutcome::Message(text)),
        }
    }

    /// Terminate immediately: zero the key and enter the final state.
    ///
    /// Persisted key files are left on disk for audit; only the in-memory
    /// copy is released.
    pub fn terminate(&mut self) {
        self.key.zeroize();
        self.state = SessionState::Terminated;
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.is_terminated() {
            self.terminate();
        }
    }
}

/// Creates, looks up, and destroys sessions against a key store.
#[derive(Debug)]
pub struct SessionManager {
    store: KeyStore,
}

impl SessionManager {
    /// Build a manager over an open key store.
    pub fn new(store: KeyStore) -> Self {
        Self { store }
    }

    /// Allocate a new initiator session: fresh id, fresh key, persisted
    /// before the session is handed out.
    ///
    /// # Errors
    ///
    /// Returns the key store error if persistence fails.
    pub fn create(&self) -> Result<Session, KeyStoreError> {
        let id = SessionId::generate();
        let key = KeyStore::create_key();
        self.store.save(&id, &key)?;
        Ok(Session::new(id, key, Role::Initiator))
    }

    /// Bind a responder session for an id whose key is already persisted.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no key record exists for the id.
    pub fn lookup(&self, id: &SessionId) -> Result<Session, KeyStoreError> {
        let key = self.store.load(id)?;
        Ok(Session::new(*id, key, Role::Responder))
    }

    /// True iff the incoming wire id equals the local session's id.
    ///
    /// A mismatch means the frame belongs to a different session and must be
    /// dropped silently — not an error.
    pub fn bind_and_validate(incoming: &[u8; SESSION_ID_LEN], local: &Session) -> bool {
        local.matches(incoming)
    }

    /// Destroy a session: terminate and release key material from active
    /// use. The persisted record remains for audit.
    pub fn destroy(&self, session: &mut Session) {
        session.terminate();
    }

    /// The backing key store.
    pub fn store(&self) -> &KeyStore {
        &self.store
    }
}
