//! In-memory ledger of scored challenge exchanges.
//!
//! Append-only: records are immutable, entries are never rewritten. This is
//! the data behind "trend over sessions" style reporting; export and
//! plotting live outside the core.

use crate::record::ChallengeRecord;
use crate::score::ThreatLabel;

/// One ledger entry: which session produced which record.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    /// Textual session id the exchange belonged to.
    pub session_id: String,
    /// The scored exchange.
    pub record: ChallengeRecord,
}

/// Append-only log of scored exchanges across sessions.
#[derive(Debug, Default)]
pub struct SessionHistory {
    entries: Vec<HistoryEntry>,
}

/// Aggregates over a [`SessionHistory`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistorySummary {
    /// Number of recorded exchanges.
    pub sessions: usize,
    /// Exchanges whose reconstruction matched the secret exactly.
    pub auth_successes: usize,
    /// Exchanges classified suspicious.
    pub suspicious: usize,
    /// Exchanges classified tampered.
    pub tampered: usize,
    /// Mean entropy of the noisy observations.
    pub mean_entropy: f64,
    /// Mean reconstruction drift.
    pub mean_drift: f64,
    /// Mean anomaly score.
    pub mean_anomaly: f64,
}

impl SessionHistory {
    /// Empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a scored exchange.
    pub fn push(&mut self, session_id: impl Into<String>, record: ChallengeRecord) {
        self.entries.push(HistoryEntry {
            session_id: session_id.into(),
            record,
        });
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recent entry.
    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    /// All entries, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Aggregate statistics. Means are 0.0 for an empty history.
    pub fn summary(&self) -> HistorySummary {
        let sessions = self.entries.len();
        let mut summary = HistorySummary {
            sessions,
            auth_successes: 0,
            suspicious: 0,
            tampered: 0,
            mean_entropy: 0.0,
            mean_drift: 0.0,
            mean_anomaly: 0.0,
        };
        if sessions == 0 {
            return summary;
        }

        for entry in &self.entries {
            let r = &entry.record;
            if r.auth_success() {
                summary.auth_successes += 1;
            }
            match r.threat() {
                ThreatLabel::Suspicious => summary.suspicious += 1,
                ThreatLabel::Tampered => summary.tampered += 1,
                ThreatLabel::None => {}
            }
            summary.mean_entropy += r.entropy();
            summary.mean_drift += r.drift();
            summary.mean_anomaly += r.anomaly();
        }
        let n = sessions as f64;
        summary.mean_entropy /= n;
        summary.mean_drift /= n;
        summary.mean_anomaly /= n;
        summary
    }
}
