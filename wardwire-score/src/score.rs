//! Entropy, drift, and anomaly metrics with threat classification.

use std::collections::HashMap;
use std::fmt;

use crate::alphabet::{symbol_index, ALPHABET_LEN};

/// Additive epsilon inside the entropy logarithm, guarding log2(0).
pub const ENTROPY_EPSILON: f64 = 1e-12;

/// Scoring errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreError {
    /// Metrics over a pair of strings are defined only for equal lengths.
    LengthMismatch,
    /// A symbol outside the 62-symbol alphabet was encountered.
    UnknownSymbol,
}

impl fmt::Display for ScoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LengthMismatch => write!(f, "sequence lengths differ"),
            Self::UnknownSymbol => write!(f, "symbol outside challenge alphabet"),
        }
    }
}

impl std::error::Error for ScoreError {}

/// Session threat classification derived from the anomaly score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreatLabel {
    /// Differences look like ordinary channel noise.
    None,
    /// Pattern deviation above the suspicion threshold.
    Suspicious,
    /// Pattern deviation above the tamper threshold.
    Tampered,
}

impl fmt::Display for ThreatLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Suspicious => write!(f, "Suspicious"),
            Self::Tampered => write!(f, "Tampered"),
        }
    }
}

/// Tunable knobs of the anomaly heuristic.
///
/// The "patterned difference" test — noisy symbol equals the secret symbol
/// shifted by `pattern_shift` mod the alphabet size — encodes an assumption
/// about what tampering looks like. It is a heuristic, not a law, so both
/// the shift and the expected pattern ratio are configuration.
#[derive(Debug, Clone, Copy)]
pub struct ScorerConfig {
    /// Expected fraction of patterned differences among all differences.
    pub pattern_ratio: f64,
    /// Symbol-index shift that counts as "patterned".
    pub pattern_shift: usize,
    /// Scores above this are at least suspicious.
    pub suspicious_threshold: f64,
    /// Scores above this are tampered.
    pub tampered_threshold: f64,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            pattern_ratio: 0.5,
            pattern_shift: 1,
            suspicious_threshold: 0.3,
            tampered_threshold: 0.6,
        }
    }
}

impl ScorerConfig {
    /// Classify an anomaly score against the configured thresholds.
    pub fn classify(&self, anomaly: f64) -> ThreatLabel {
        if anomaly > self.tampered_threshold {
            ThreatLabel::Tampered
        } else if anomaly > self.suspicious_threshold {
            ThreatLabel::Suspicious
        } else {
            ThreatLabel::None
        }
    }
}

/// Shannon entropy in bits of the symbol-frequency distribution of `s`.
///
/// `-Σ p·log2(p + ε)`, clamped at zero so a single repeated symbol scores
/// exactly 0 rather than a negative epsilon artifact.
pub fn entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }
    let mut counts: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *counts.entry(c).or_insert(0) += 1;
    }
    let len = s.chars().count() as f64;
    let sum: f64 = counts
        .values()
        .map(|&n| {
            let p = n as f64 / len;
            p * (p + ENTROPY_EPSILON).log2()
        })
        .sum();
    (-sum).max(0.0)
}

/// Fraction of positions where `secret` and `reconstructed` disagree.
///
/// # Errors
///
/// Returns `LengthMismatch` when the strings differ in length.
pub fn drift(secret: &str, reconstructed: &str) -> Result<f64, ScoreError> {
    let a: Vec<char> = secret.chars().collect();
    let b: Vec<char> = reconstructed.chars().collect();
    if a.len() != b.len() {
        return Err(ScoreError::LengthMismatch);
    }
    if a.is_empty() {
        return Ok(0.0);
    }
    let mismatches = a.iter().zip(&b).filter(|(x, y)| x != y).count();
    Ok(mismatches as f64 / a.len() as f64)
}

/// Pattern-deviation anomaly score in [0, 1], rounded to 3 decimals.
///
/// Among positions where `noisy` differs from `secret`, differences where
/// the noisy symbol index equals the secret symbol index shifted by
/// `pattern_shift` (mod 62) are "patterned". The score is
/// `|expected − patterned| / total_diffs` with
/// `expected = trunc(total_diffs × pattern_ratio)`, and exactly 0.0 when
/// nothing differs.
///
/// # Errors
///
/// Returns `LengthMismatch` for unequal lengths, `UnknownSymbol` for input
/// outside the alphabet.
pub fn anomaly(secret: &str, noisy: &str, config: &ScorerConfig) -> Result<f64, ScoreError> {
    let a = indices(secret)?;
    let b = indices(noisy)?;
    if a.len() != b.len() {
        return Err(ScoreError::LengthMismatch);
    }

    let mut total_diffs = 0usize;
    let mut patterned = 0usize;
    for (&s, &n) in a.iter().zip(&b) {
        if s != n {
            total_diffs += 1;
            if n == (s + config.pattern_shift) % ALPHABET_LEN {
                patterned += 1;
            }
        }
    }

    if total_diffs == 0 {
        return Ok(0.0);
    }

    let expected = (total_diffs as f64 * config.pattern_ratio) as i64;
    let deviation = (expected - patterned as i64).abs() as f64 / total_diffs as f64;
    Ok(((deviation * 1000.0).round() / 1000.0).clamp(0.0, 1.0))
}

fn indices(s: &str) -> Result<Vec<usize>, ScoreError> {
    s.chars()
        .map(|c| symbol_index(c).ok_or(ScoreError::UnknownSymbol))
        .collect()
}
