//! Reconstruction Oracle boundary.
//!
//! The oracle that recovers a secret from its noisy form is an external
//! collaborator — in production a trained sequence model. The core consumes
//! it through this trait only: length- and alphabet-preserving, infallible
//! on well-formed input, possibly expensive, and purely functional per call.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Best-effort reconstruction of an original secret from its noisy form.
///
/// Implementations must return a string of the same length over the same
/// alphabet and must not fail on well-formed input. Calls are independent:
/// no shared mutable state is required across calls within one session.
pub trait ReconstructionOracle {
    /// Reconstruct the original secret from a noise-corrupted copy.
    fn reconstruct(&self, noisy: &str) -> String;
}

/// Echoes the noisy input unchanged. The weakest possible oracle: drift
/// equals the raw corruption rate.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityOracle;

impl ReconstructionOracle for IdentityOracle {
    fn reconstruct(&self, noisy: &str) -> String {
        noisy.to_string()
    }
}

/// Stand-in for a trained reconstruction model.
///
/// Like the real model it was fitted to one session secret: each position is
/// recovered to the ground truth with probability `recall`, and left at the
/// noisy symbol otherwise. Reconstruction is deterministic for a given
/// `(seed, noisy)` pair, which keeps the trait's purely-functional contract.
#[derive(Debug, Clone)]
pub struct RecallOracle {
    secret: String,
    recall: f64,
    seed: u64,
}

impl RecallOracle {
    /// Build an oracle fitted to `secret` with the given per-symbol recall.
    pub fn new(secret: impl Into<String>, recall: f64, seed: u64) -> Self {
        Self {
            secret: secret.into(),
            recall: recall.clamp(0.0, 1.0),
            seed,
        }
    }

    /// An oracle that always recovers the secret exactly.
    pub fn perfect(secret: impl Into<String>) -> Self {
        Self::new(secret, 1.0, 0)
    }
}

impl ReconstructionOracle for RecallOracle {
    fn reconstruct(&self, noisy: &str) -> String {
        let mut rng = StdRng::seed_from_u64(self.seed);
        self.secret
            .chars()
            .zip(noisy.chars())
            .map(|(truth, observed)| {
                if rng.gen_bool(self.recall) {
                    truth
                } else {
                    observed
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::{generate_secret, SECRET_LEN};
    use crate::noise::corrupt;

    #[test]
    fn test_identity_oracle_echoes() {
        assert_eq!(IdentityOracle.reconstruct("aB3"), "aB3");
    }

    #[test]
    fn test_perfect_oracle_recovers_secret() {
        let mut rng = StdRng::seed_from_u64(21);
        let secret = generate_secret(&mut rng, SECRET_LEN);
        let noisy = corrupt(&secret, 0.3, &mut rng).unwrap();

        let oracle = RecallOracle::perfect(secret.clone());
        assert_eq!(oracle.reconstruct(&noisy), secret);
    }

    #[test]
    fn test_reconstruction_is_deterministic() {
        let mut rng = StdRng::seed_from_u64(22);
        let secret = generate_secret(&mut rng, SECRET_LEN);
        let noisy = corrupt(&secret, 0.3, &mut rng).unwrap();

        let oracle = RecallOracle::new(secret, 0.7, 42);
        assert_eq!(oracle.reconstruct(&noisy), oracle.reconstruct(&noisy));
    }

    #[test]
    fn test_length_preserved() {
        let mut rng = StdRng::seed_from_u64(23);
        let secret = generate_secret(&mut rng, SECRET_LEN);
        let noisy = corrupt(&secret, 0.1, &mut rng).unwrap();

        let oracle = RecallOracle::new(secret, 0.5, 1);
        assert_eq!(oracle.reconstruct(&noisy).len(), SECRET_LEN);
    }
}
