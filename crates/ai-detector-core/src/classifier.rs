//! Classifier capability trait.
//!
//! A [`Classifier`] maps one sentence to an AI-likelihood probability.
//! Implementations are built once at startup and shared read-only across
//! concurrent requests, so they must be `Send + Sync` and must not rely
//! on interior mutation for correctness.
//!
//! Concrete implementations (the TF-IDF logistic model) live in the
//! `ai-detector` app crate.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Per-sentence scoring failure. Never fatal to a request.
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("classifier failed: {0}")]
    Failed(String),
    #[error("classifier returned {0}, expected a probability in [0, 1]")]
    InvalidScore(f64),
    #[error("classifier timed out after {0:?}")]
    Timeout(Duration),
    #[error("classifier call aborted: {0}")]
    Aborted(String),
}

/// Scores a sentence; values `>= 0.5` mean AI-likely.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Returns the model identifier (e.g. `"tfidf-logreg"`).
    fn name(&self) -> &str;

    /// Score one trimmed sentence.
    async fn score(&self, text: &str) -> Result<f64, ClassifierError>;
}

/// Reject non-finite or out-of-range classifier output.
pub fn validate_probability(value: f64) -> Result<f64, ClassifierError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ClassifierError::InvalidScore(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_bounds() {
        assert_eq!(validate_probability(0.0).unwrap(), 0.0);
        assert_eq!(validate_probability(1.0).unwrap(), 1.0);
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(matches!(
            validate_probability(1.01),
            Err(ClassifierError::InvalidScore(_))
        ));
        assert!(validate_probability(-0.2).is_err());
        assert!(validate_probability(f64::NAN).is_err());
        assert!(validate_probability(f64::INFINITY).is_err());
    }
}
