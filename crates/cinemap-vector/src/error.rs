use thiserror::Error;

use cinemap_core::error::CinemapError;
use cinemap_core::types::MovieId;

/// Errors raised by similarity search and vector validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VectorError {
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("vector component {index} is not finite")]
    NonFinite { index: usize },
    #[error("vector width must be at least 1")]
    InvalidDimension,
    #[error("result limit must be at least 1, got {0}")]
    InvalidLimit(usize),
    #[error("no embedding available for movie {0}")]
    MissingEmbedding(MovieId),
    #[error("embedding failed: {0}")]
    Embedding(String),
}

impl From<VectorError> for CinemapError {
    fn from(err: VectorError) -> Self {
        match err {
            VectorError::Embedding(msg) => CinemapError::Embedding(msg),
            other => CinemapError::Vector(other.to_string()),
        }
    }
}
