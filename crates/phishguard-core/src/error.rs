//! Error types for PhishGuard

/// Result type alias using PhishGuard's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for PhishGuard operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Model or tokenizer artifact could not be loaded
    #[error("artifact error: {0}")]
    Artifact(String),

    /// Input could not be turned into model inputs
    #[error("tokenization error: {0}")]
    Tokenization(String),

    /// Forward pass or post-processing failed
    #[error("inference error: {0}")]
    Inference(String),

    /// Artifact download errors
    #[error("download error: {0}")]
    Download(String),

    /// Filesystem errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

}

impl Error {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new artifact error
    pub fn artifact(msg: impl Into<String>) -> Self {
        Self::Artifact(msg.into())
    }

    /// Create a new tokenization error
    pub fn tokenization(msg: impl Into<String>) -> Self {
        Self::Tokenization(msg.into())
    }

    /// Create a new inference error
    pub fn inference(msg: impl Into<String>) -> Self {
        Self::Inference(msg.into())
    }

    /// Create a new download error
    pub fn download(msg: impl Into<String>) -> Self {
        Self::Download(msg.into())
    }

    /// Whether this error prevents the process from serving at all.
    ///
    /// Startup errors are fatal. Tokenization and inference errors only
    /// affect the request that raised them.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Config(_) | Self::Artifact(_) | Self::Download(_) | Self::Io(_) => true,
            Self::Tokenization(_) | Self::Inference(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(Error::artifact("missing model.safetensors").is_fatal());
        assert!(Error::config("threshold out of range").is_fatal());
        assert!(!Error::tokenization("bad input").is_fatal());
        assert!(!Error::inference("shape mismatch").is_fatal());

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "vocab.txt");
        assert!(Error::from(io).is_fatal());
    }

    #[test]
    fn test_display() {
        let err = Error::inference("softmax failed");
        assert_eq!(err.to_string(), "inference error: softmax failed");
    }
}
