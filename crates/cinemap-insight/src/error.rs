use thiserror::Error;

use cinemap_core::error::CinemapError;

/// Errors that can occur in the analytics pipeline.
#[derive(Error, Debug)]
pub enum InsightError {
    #[error("insufficient data: need at least 2 vectors of width 2 or more, got {samples} of width {dimensions}")]
    InsufficientData { samples: usize, dimensions: usize },
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("eigendecomposition did not converge within {max_iterations} iterations")]
    Decomposition { max_iterations: usize },
    #[error("export error: {0}")]
    Export(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<InsightError> for CinemapError {
    fn from(err: InsightError) -> Self {
        match err {
            InsightError::Export(msg) => CinemapError::Export(msg),
            InsightError::Io(e) => CinemapError::Io(e),
            InsightError::Serialization(e) => CinemapError::Serialization(e.to_string()),
            other => CinemapError::Analytics(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_insufficient_data() {
        let e = InsightError::InsufficientData {
            samples: 1,
            dimensions: 384,
        };
        assert_eq!(
            e.to_string(),
            "insufficient data: need at least 2 vectors of width 2 or more, got 1 of width 384"
        );
    }

    #[test]
    fn test_error_display_dimension_mismatch() {
        let e = InsightError::DimensionMismatch {
            expected: 4,
            actual: 3,
        };
        assert_eq!(e.to_string(), "dimension mismatch: expected 4, got 3");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file gone");
        let e: InsightError = io_err.into();
        assert!(e.to_string().contains("file gone"));
        assert!(matches!(e, InsightError::Io(_)));
    }

    #[test]
    fn test_into_cinemap_error() {
        let e: CinemapError = InsightError::InsufficientData {
            samples: 0,
            dimensions: 0,
        }
        .into();
        assert!(matches!(e, CinemapError::Analytics(_)));

        let e: CinemapError = InsightError::Decomposition {
            max_iterations: 10,
        }
        .into();
        assert!(matches!(e, CinemapError::Analytics(ref msg) if msg.contains("10 iterations")));

        let e: CinemapError = InsightError::Export("disk full".into()).into();
        assert!(matches!(e, CinemapError::Export(_)));
    }
}
