//! WardWire Protocol Core
//!
//! Per-session authenticated encrypted channels for peers that talk only
//! through an intermediary publish/subscribe bus.
//!
//! This crate provides:
//! - Wire framing with a strict minimum-length floor
//! - AES-128-GCM seal/open for frame payloads
//! - File-backed ephemeral key store (one record per session id)
//! - Session identity, binding, and the request/acknowledge/kill state machine
//!
//! # Security Invariants
//!
//! - A nonce is fresh OS randomness per sealed message and never reused per key
//! - Authentication failure is a per-message event; only an authenticated
//!   kill sentinel terminates a session
//! - Key material is zeroized when a session leaves active use
//! - Direct use of `unsafe` is forbidden (#![forbid(unsafe_code)])

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::panic))]

pub mod error;
pub mod frame;
pub mod keystore;
pub mod seal;
pub mod session;

pub use error::{KeyStoreError, ProtocolError};
pub use frame::Frame;
pub use keystore::{KeyStore, SessionKey};
pub use session::{ReceiveOutcome, Role, Session, SessionId, SessionManager, SessionState};
