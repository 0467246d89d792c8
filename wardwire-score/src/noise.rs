//! Substitution-noise injection for challenge secrets.
//!
//! The random source is an explicit parameter so scoring pipelines stay
//! reproducible under test: same seed, same corruption.

use rand::Rng;

use crate::alphabet::{symbol_at, ALPHABET_LEN};
use crate::score::ScoreError;

/// Retention rate of a normally-behaving client: each symbol survives with
/// probability 0.3.
pub const NORMAL_RETENTION: f64 = 0.3;

/// Retention rate of the tamper simulation: almost everything survives, so
/// the few differences that do appear carry the pattern signal.
pub const TAMPER_RETENTION: f64 = 0.9;

/// Corrupt a secret with independent per-symbol substitution noise.
///
/// Each position is kept with probability `retention`; otherwise it is
/// replaced by a uniformly random alphabet symbol, which may coincidentally
/// equal the original.
///
/// # Errors
///
/// Returns `UnknownSymbol` if `secret` strays outside the alphabet.
pub fn corrupt(secret: &str, retention: f64, rng: &mut impl Rng) -> Result<String, ScoreError> {
    let retention = retention.clamp(0.0, 1.0);
    let mut out = String::with_capacity(secret.len());
    for c in secret.chars() {
        if crate::alphabet::symbol_index(c).is_none() {
            return Err(ScoreError::UnknownSymbol);
        }
        if rng.gen_bool(retention) {
            out.push(c);
        } else {
            out.push(symbol_at(rng.gen_range(0..ALPHABET_LEN)));
        }
    }
    Ok(out)
}
