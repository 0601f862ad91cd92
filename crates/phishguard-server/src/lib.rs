//! PhishGuard Server
//!
//! HTTP boundary for the phishing classifier. A single `POST /predict`
//! endpoint validates the request body, runs one prediction on the shared
//! model, and answers with either a prediction envelope or an error envelope.
//! Every outcome is returned with status 200; the payload shape tells them
//! apart.

pub mod cli;
pub mod config;
pub mod routes;
pub mod state;

pub use cli::{Cli, Commands, DownloadArgs, ServeArgs};
pub use config::{ConfigError, CorsConfig, ServerConfig, DEFAULT_CONFIG_PATH};
pub use routes::{create_router, PredictRequest, PredictResponse, PredictionEntry};
pub use state::AppState;
