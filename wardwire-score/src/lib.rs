//! WardWire Anomaly Scoring
//!
//! Statistical layer on top of the cryptographic channel: a per-session
//! challenge secret is corrupted with substitution noise, handed to an
//! external Reconstruction Oracle, and the `{secret, noisy, reconstructed}`
//! triple is scored for entropy, drift, and pattern-deviation anomaly to
//! classify the session as normal, suspicious, or tampered — a signal the
//! binary AEAD pass/fail cannot give.
//!
//! Everything here is pure: noise injection takes an explicit random source,
//! the oracle is a trait boundary, and records are immutable once scored.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::panic))]

pub mod alphabet;
pub mod history;
pub mod noise;
pub mod oracle;
pub mod record;
pub mod score;

pub use alphabet::{generate_secret, ALPHABET, ALPHABET_LEN, SECRET_LEN};
pub use history::{HistorySummary, SessionHistory};
pub use noise::{corrupt, NORMAL_RETENTION, TAMPER_RETENTION};
pub use oracle::{IdentityOracle, RecallOracle, ReconstructionOracle};
pub use record::ChallengeRecord;
pub use score::{anomaly, drift, entropy, ScoreError, ScorerConfig, ThreatLabel};
