//! Core types for PhishGuard

use serde::{Deserialize, Serialize};
use std::fmt;

/// Probability above which an input is labelled phishing
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Number of decimal digits kept in response probabilities
const PROBABILITY_DECIMALS: i32 = 4;

/// Classification label derived from the phishing probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Phishing,
    Legitimate,
}

impl Label {
    /// Decide the label for a probability.
    ///
    /// The comparison is strict: a probability equal to the threshold is
    /// legitimate.
    pub fn decide(probability: f64, threshold: f64) -> Self {
        if probability > threshold {
            Self::Phishing
        } else {
            Self::Legitimate
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Phishing => "phishing",
            Self::Legitimate => "legitimate",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single prediction
#[derive(Debug, Clone, PartialEq)]
pub enum PredictionOutcome {
    /// Probability mass assigned to the phishing class, in [0, 1]
    Success { probability: f64 },

    /// Tokenization or inference failed; `reason` is for operators only
    Failure { reason: String },
}

impl PredictionOutcome {
    /// Create a successful outcome
    pub fn success(probability: f64) -> Self {
        Self::Success { probability }
    }

    /// Create a failed outcome
    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure {
            reason: reason.into(),
        }
    }

    /// Probability if the prediction succeeded
    pub fn probability(&self) -> Option<f64> {
        match self {
            Self::Success { probability } => Some(*probability),
            Self::Failure { .. } => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

impl From<crate::Result<f64>> for PredictionOutcome {
    fn from(result: crate::Result<f64>) -> Self {
        match result {
            Ok(probability) => Self::success(probability),
            Err(e) => Self::failure(e.to_string()),
        }
    }
}

/// Round a probability to four decimal digits for presentation
pub fn round_probability(probability: f64) -> f64 {
    let scale = 10f64.powi(PROBABILITY_DECIMALS);
    (probability * scale).round() / scale
}
