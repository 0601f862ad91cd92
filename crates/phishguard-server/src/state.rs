//! Shared application state

use metrics_exporter_prometheus::PrometheusHandle;
use phishguard_classifier::PhishingClassifier;
use std::sync::Arc;

/// State injected into every request handler
///
/// The classifier is loaded once at startup and only read afterwards, so
/// handlers share it without locking.
#[derive(Clone)]
pub struct AppState {
    /// Loaded phishing classifier
    pub classifier: Arc<dyn PhishingClassifier>,

    /// Prometheus exporter handle, when a recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(classifier: Arc<dyn PhishingClassifier>) -> Self {
        Self {
            classifier,
            metrics: None,
        }
    }

    /// Attach the handle used to render `/metrics`
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
