//! WardWire Transport
//!
//! Async plumbing between the pure protocol core and a publish/subscribe
//! message bus. The bus itself is an external collaborator — this crate
//! depends only on its contract ([`MessageBus`]) and ships an in-process
//! implementation for tests and demos.
//!
//! # Concurrency Model
//!
//! One foreground control flow per channel plus one background receive task
//! per subscription. The receive task never touches foreground state: it
//! posts raw payloads into a single-slot [`Mailbox`] with last-write-wins
//! overwrite semantics. At most one message is ever pending; overwriting an
//! undrained slot is the documented data-loss policy of this design, not a
//! bug.
//!
//! # Error Recovery
//!
//! Malformed frames are logged and dropped. Foreign frames are dropped
//! silently. Authentication failures surface as a per-message
//! [`ChannelEvent::AuthFailure`] and the session keeps running. Only an
//! authenticated kill sentinel (or a local close) ends a channel.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::panic))]

pub mod bus;
pub mod channel;
pub mod config;
pub mod error;
pub mod mailbox;

pub use bus::{MemoryBus, MessageBus, Subscription};
pub use channel::{ChannelEvent, SecureChannel, AUTH_FAILURE_MARKER};
pub use config::TopicPair;
pub use error::TransportError;
pub use mailbox::Mailbox;
