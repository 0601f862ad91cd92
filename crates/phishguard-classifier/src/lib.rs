//! PhishGuard Classifier
//!
//! Candle-based BERT sequence classifier that scores a URL (or any text) with
//! the probability of being a phishing link.
//!
//! The [`ModelLoader`] is built once at startup from an [`InferenceConfig`],
//! then shared read-only. Each call to [`PhishingClassifier::predict`]
//! tokenizes one input (truncated to `max_length` tokens), runs a single
//! forward pass on the selected device, and returns the softmax probability of
//! the phishing class.

pub mod classifier;
pub mod config;
pub mod device;
pub mod download;
pub mod model_loader;

pub use classifier::PhishingClassifier;
pub use config::{DevicePreference, InferenceConfig, PaddingPolicy};
pub use device::{select_device, DeviceHandle};
pub use download::{download_artifacts, DEFAULT_REPO};
pub use model_loader::ModelLoader;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::classifier::PhishingClassifier;
    pub use crate::config::InferenceConfig;
    pub use crate::device::DeviceHandle;
    pub use crate::model_loader::ModelLoader;
    pub use phishguard_core::{Label, PredictionOutcome};
}
