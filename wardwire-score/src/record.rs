//! The scored result of one challenge exchange.

use crate::oracle::ReconstructionOracle;
use crate::score::{anomaly, drift, entropy, ScoreError, ScorerConfig, ThreatLabel};

/// One challenge exchange, scored and classified. Immutable once built.
///
/// `auth_success` is strict byte-for-byte equality between the secret and
/// the oracle's reconstruction — an all-or-nothing policy, not a similarity
/// threshold. A single-symbol miss from a probabilistic oracle flips the
/// outcome to failure.
#[derive(Debug, Clone)]
pub struct ChallengeRecord {
    secret: String,
    noisy: String,
    reconstructed: String,
    entropy: f64,
    drift: f64,
    anomaly: f64,
    auth_success: bool,
    threat: ThreatLabel,
}

impl ChallengeRecord {
    /// Run the oracle over the noisy secret and score the resulting triple.
    ///
    /// Entropy is measured on the noisy observation, drift between secret
    /// and reconstruction, anomaly between secret and noisy input.
    ///
    /// # Errors
    ///
    /// Returns `LengthMismatch` or `UnknownSymbol` when the inputs (or a
    /// misbehaving oracle) violate the alphabet contract.
    pub fn evaluate(
        secret: &str,
        noisy: &str,
        oracle: &dyn ReconstructionOracle,
        config: &ScorerConfig,
    ) -> Result<Self, ScoreError> {
        let reconstructed = oracle.reconstruct(noisy);

        let entropy = entropy(noisy);
        let drift = drift(secret, &reconstructed)?;
        let anomaly = anomaly(secret, noisy, config)?;
        let auth_success = secret == reconstructed;
        let threat = config.classify(anomaly);

        Ok(Self {
            secret: secret.to_string(),
            noisy: noisy.to_string(),
            reconstructed,
            entropy,
            drift,
            anomaly,
            auth_success,
            threat,
        })
    }

    /// Ground-truth challenge secret.
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// The noise-corrupted observation.
    pub fn noisy(&self) -> &str {
        &self.noisy
    }

    /// The oracle's reconstruction.
    pub fn reconstructed(&self) -> &str {
        &self.reconstructed
    }

    /// Shannon entropy of the noisy observation, in bits.
    pub fn entropy(&self) -> f64 {
        self.entropy
    }

    /// Fraction of positions the reconstruction got wrong.
    pub fn drift(&self) -> f64 {
        self.drift
    }

    /// Pattern-deviation anomaly score in [0, 1].
    pub fn anomaly(&self) -> f64 {
        self.anomaly
    }

    /// Strict-equality authentication outcome.
    pub fn auth_success(&self) -> bool {
        self.auth_success
    }

    /// Threat classification of this exchange.
    pub fn threat(&self) -> ThreatLabel {
        self.threat
    }
}
