//! Classifier trait shared by the model loader and test doubles

use crate::device::DeviceHandle;
use phishguard_core::PredictionOutcome;

/// A phishing classifier over free text
///
/// `predict` is synchronous and CPU/GPU bound. It never panics on bad input;
/// failures come back as [`PredictionOutcome::Failure`].
pub trait PhishingClassifier: Send + Sync {
    /// Probability that `text` is a phishing link
    fn predict(&self, text: &str) -> PredictionOutcome;

    /// Model name or identifier
    fn name(&self) -> &str;

    /// Device the model runs on
    fn device(&self) -> DeviceHandle;

    /// Class labels in logit order, when the model declares them
    fn labels(&self) -> &[String] {
        &[]
    }

    /// Threshold used to turn a probability into a label
    fn threshold(&self) -> f64 {
        phishguard_core::DEFAULT_THRESHOLD
    }
}
