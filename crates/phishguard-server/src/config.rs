//! Server configuration

use crate::cli::ServeArgs;
use phishguard_classifier::InferenceConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Configuration file read when `--config` is not given
pub const DEFAULT_CONFIG_PATH: &str = "phishguard.yaml";

/// Configuration errors surfaced before the server starts
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration file {} does not exist", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("invalid listen address {0}")]
    InvalidAddress(String),

    #[error("invalid model configuration: {0}")]
    Model(#[from] phishguard_core::Error),
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Cross-origin policy
    #[serde(default)]
    pub cors: CorsConfig,

    /// Classifier settings
    #[serde(default)]
    pub model: InferenceConfig,
}

impl ServerConfig {
    /// Load configuration from file.
    ///
    /// A missing default file yields the defaults; a missing file named
    /// explicitly is an error.
    pub fn load(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            if config_path != Path::new(DEFAULT_CONFIG_PATH) {
                return Err(ConfigError::NotFound {
                    path: config_path.to_path_buf(),
                });
            }
            tracing::debug!(
                "No configuration at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
            path: config_path.to_path_buf(),
            source,
        })?;

        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: config_path.to_path_buf(),
            source,
        })
    }

    /// Apply CLI overrides on top of the file configuration
    pub fn apply_overrides(&mut self, args: &ServeArgs) {
        if let Some(listen) = &args.listen {
            self.listen = listen.clone();
        }

        if let Some(port) = args.port {
            self.port = port;
        }

        if let Some(model_path) = &args.model_path {
            self.model.model_path = model_path.clone();
        }

        if let Some(device) = args.device {
            self.model.device = device;
        }
    }

    /// Check the parts that can be checked without loading the model
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;
        self.model.validate()?;
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.listen, self.port);
        addr.parse().map_err(|_| ConfigError::InvalidAddress(addr))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            port: default_port(),
            cors: CorsConfig::default(),
            model: InferenceConfig::default(),
        }
    }
}

/// Cross-origin configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Origins allowed to call the API with credentials
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use phishguard_classifier::{DevicePreference, PaddingPolicy};

    fn serve_args() -> ServeArgs {
        ServeArgs {
            config: PathBuf::from(DEFAULT_CONFIG_PATH),
            listen: None,
            port: None,
            model_path: None,
            device: None,
            verbose: false,
        }
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = ServerConfig::load(Path::new(DEFAULT_CONFIG_PATH)).unwrap();
        assert_eq!(config.listen, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.cors.allowed_origins.len(), 2);
        assert_eq!(config.model.max_length, 64);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let err = ServerConfig::load(Path::new("/nonexistent/custom.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
        assert!(err.to_string().contains("custom.yaml"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("phishguard.yaml");
        std::fs::write(
            &path,
            r#"
port: 9090
cors:
  allowed_origins: ["https://phishguard.example"]
model:
  model_path: ./models/urlbert
  device: cpu
  padding: fixed
"#,
        )
        .unwrap();

        let config = ServerConfig::load(&path).unwrap();
        assert_eq!(config.listen, "0.0.0.0");
        assert_eq!(config.port, 9090);
        assert_eq!(config.cors.allowed_origins, vec!["https://phishguard.example"]);
        assert_eq!(config.model.model_path, PathBuf::from("./models/urlbert"));
        assert_eq!(config.model.device, DevicePreference::Cpu);
        assert_eq!(config.model.padding, PaddingPolicy::Fixed);
        assert_eq!(config.model.threshold, 0.5);
    }

    #[test]
    fn test_parse_error_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.yaml");
        std::fs::write(&path, "port: [not a port]").unwrap();

        let err = ServerConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("broken.yaml"));
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = ServerConfig::default();
        let args = ServeArgs {
            listen: Some("127.0.0.1".to_string()),
            port: Some(3001),
            model_path: Some(PathBuf::from("/srv/model")),
            device: Some(DevicePreference::Cpu),
            ..serve_args()
        };

        config.apply_overrides(&args);
        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:3001");
        assert_eq!(config.model.model_path, PathBuf::from("/srv/model"));
        assert_eq!(config.model.device, DevicePreference::Cpu);
    }

    #[test]
    fn test_invalid_listen_address() {
        let mut config = ServerConfig::default();
        config.listen = "not an address".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidAddress(_))
        ));
    }
}
