//! Inference configuration for the phishing classifier

use phishguard_core::{Error, Result, DEFAULT_THRESHOLD};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Room for the [CLS] and [SEP] tokens
const MIN_MAX_LENGTH: usize = 2;

/// Configuration for loading and running the classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Directory holding config.json, model.safetensors and the tokenizer
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    /// Where to run inference
    #[serde(default)]
    pub device: DevicePreference,

    /// Maximum sequence length in tokens, special tokens included
    #[serde(default = "default_max_length")]
    pub max_length: usize,

    /// Padding applied to tokenized inputs
    #[serde(default)]
    pub padding: PaddingPolicy,

    /// Probability above which an input is labelled phishing
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Logit index of the phishing class
    #[serde(default = "default_phishing_class_index")]
    pub phishing_class_index: usize,
}

/// Device selection policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePreference {
    /// GPU if one is available, CPU otherwise
    #[default]
    Auto,
    /// Always CPU
    Cpu,
    /// Require a GPU; loading fails without one
    Gpu,
}

/// Padding policy for tokenized inputs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaddingPolicy {
    /// Pad to the longest sequence in the batch
    #[default]
    Longest,
    /// Pad every sequence to `max_length`
    Fixed,
}

fn default_model_path() -> PathBuf {
    PathBuf::from("./")
}

fn default_max_length() -> usize {
    64
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

fn default_phishing_class_index() -> usize {
    1
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            device: DevicePreference::default(),
            max_length: default_max_length(),
            padding: PaddingPolicy::default(),
            threshold: default_threshold(),
            phishing_class_index: default_phishing_class_index(),
        }
    }
}

impl InferenceConfig {
    /// Create a configuration for a local artifact directory
    pub fn from_local(path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: path.into(),
            ..Default::default()
        }
    }

    /// Set device preference
    pub fn with_device(mut self, device: DevicePreference) -> Self {
        self.device = device;
        self
    }

    /// Set maximum sequence length
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    /// Set padding policy
    pub fn with_padding(mut self, padding: PaddingPolicy) -> Self {
        self.padding = padding;
        self
    }

    /// Set classification threshold
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Reject values the classifier cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.max_length < MIN_MAX_LENGTH {
            return Err(Error::config(format!(
                "max_length must be at least {} to fit [CLS] and [SEP], got {}",
                MIN_MAX_LENGTH, self.max_length
            )));
        }

        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(Error::config(format!(
                "threshold must be within [0, 1], got {}",
                self.threshold
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = InferenceConfig::default();
        assert_eq!(config.model_path, PathBuf::from("./"));
        assert_eq!(config.device, DevicePreference::Auto);
        assert_eq!(config.max_length, 64);
        assert_eq!(config.padding, PaddingPolicy::Longest);
        assert_eq!(config.threshold, 0.5);
        assert_eq!(config.phishing_class_index, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_yaml() {
        let yaml = r#"
model_path: "./models/urlbert"
device: cpu
padding: fixed
"#;

        let config: InferenceConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.model_path, PathBuf::from("./models/urlbert"));
        assert_eq!(config.device, DevicePreference::Cpu);
        assert_eq!(config.padding, PaddingPolicy::Fixed);
        assert_eq!(config.max_length, 64);
        assert_eq!(config.threshold, 0.5);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = InferenceConfig::default().with_max_length(0);
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = InferenceConfig::default().with_threshold(1.5);
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_unknown_device_is_rejected() {
        let yaml = "device: tpu\n";
        assert!(serde_yaml::from_str::<InferenceConfig>(yaml).is_err());
    }
}
