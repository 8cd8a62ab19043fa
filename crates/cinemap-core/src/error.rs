use thiserror::Error;

/// Top-level error type for the cinemap workspace.
///
/// Subsystem crates define their own error types and implement
/// `From<SubsystemError> for CinemapError` so that `?` works across crate
/// boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CinemapError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Vector error: {0}")]
    Vector(String),

    #[error("Analytics error: {0}")]
    Analytics(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for CinemapError {
    fn from(err: toml::de::Error) -> Self {
        CinemapError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for CinemapError {
    fn from(err: toml::ser::Error) -> Self {
        CinemapError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for CinemapError {
    fn from(err: serde_json::Error) -> Self {
        CinemapError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for cinemap operations.
pub type Result<T> = std::result::Result<T, CinemapError>;
