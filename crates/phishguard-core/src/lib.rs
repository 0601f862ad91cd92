//! PhishGuard Core
//!
//! Core types shared across PhishGuard components.
//!
//! This crate provides:
//! - Error types and result handling, split into fatal (startup) and
//!   per-request failures
//! - The tagged outcome of a single phishing prediction
//! - The probability-to-label decision and response rounding

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{round_probability, Label, PredictionOutcome, DEFAULT_THRESHOLD};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::{Label, PredictionOutcome};
}
