use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{CinemapError, Result};

/// Top-level configuration for cinemap.
///
/// Loaded from `~/.cinemap/config.toml` by default. Every section falls back
/// to its defaults when absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CinemapConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

impl CinemapConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: CinemapConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Reject values the engines cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.search.embedding_dim == 0 {
            return Err(CinemapError::Config(
                "search.embedding_dim must be at least 1".to_string(),
            ));
        }
        if self.search.default_limit == 0 || self.search.max_limit == 0 {
            return Err(CinemapError::Config(
                "search limits must be at least 1".to_string(),
            ));
        }
        if self.search.default_limit > self.search.max_limit {
            return Err(CinemapError::Config(format!(
                "search.default_limit ({}) exceeds search.max_limit ({})",
                self.search.default_limit, self.search.max_limit
            )));
        }
        if self.analytics.max_iterations == 0 {
            return Err(CinemapError::Config(
                "analytics.max_iterations must be at least 1".to_string(),
            ));
        }
        if self.analytics.tolerance.is_nan() || self.analytics.tolerance <= 0.0 {
            return Err(CinemapError::Config(
                "analytics.tolerance must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// SQLite database holding the movie catalog.
    pub database_path: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "~/.cinemap/movies.db".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Similarity search configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Embedding model name.
    pub embedding_model: String,
    /// Embedding width every stored and queried vector must have.
    pub embedding_dim: usize,
    /// Default number of similar movies.
    pub default_limit: usize,
    /// Upper bound on requested results.
    pub max_limit: usize,
    /// Number of results for free-text search.
    pub text_search_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            embedding_model: "all-MiniLM-L6-v2".to_string(),
            embedding_dim: 384,
            default_limit: 10,
            max_limit: 100,
            text_search_limit: 5,
        }
    }
}

/// Projection and quadrant summary configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Genres listed per quadrant.
    pub top_genres: usize,
    /// Top-rated movies listed per quadrant.
    pub top_rated: usize,
    /// Movies nearest the quadrant centroid listed per quadrant.
    pub closest_to_centroid: usize,
    /// Cap on QR sweeps of the PCA eigen solver.
    pub max_iterations: usize,
    /// Off-diagonal convergence threshold of the PCA eigen solver.
    pub tolerance: f64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            top_genres: 5,
            top_rated: 3,
            closest_to_centroid: 3,
            max_iterations: 10_000,
            tolerance: 1e-12,
        }
    }
}

/// Quadrant export configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Destination for `cinemap export`.
    pub output_path: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_path: "quadrant_data.json".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = CinemapConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.search.embedding_dim, 384);
        assert_eq!(config.search.default_limit, 10);
        assert_eq!(config.search.text_search_limit, 5);
        assert_eq!(config.analytics.top_genres, 5);
        assert_eq!(config.analytics.top_rated, 3);
        assert_eq!(config.analytics.closest_to_centroid, 3);
        assert_eq!(config.export.output_path, "quadrant_data.json");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
[general]
database_path = "/srv/movies.db"
log_level = "debug"

[search]
embedding_model = "custom-model"
embedding_dim = 3
default_limit = 5
max_limit = 50
text_search_limit = 8

[analytics]
top_genres = 3
top_rated = 2
closest_to_centroid = 4
max_iterations = 100
tolerance = 1e-6

[export]
output_path = "/tmp/quadrants.json"
"#;
        let file = create_temp_config(content);
        let config = CinemapConfig::load(file.path()).unwrap();
        assert_eq!(config.general.database_path, "/srv/movies.db");
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.search.embedding_model, "custom-model");
        assert_eq!(config.search.embedding_dim, 3);
        assert_eq!(config.search.max_limit, 50);
        assert_eq!(config.search.text_search_limit, 8);
        assert_eq!(config.analytics.top_genres, 3);
        assert_eq!(config.analytics.closest_to_centroid, 4);
        assert_eq!(config.analytics.max_iterations, 100);
        assert_eq!(config.export.output_path, "/tmp/quadrants.json");
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let content = r#"
[general]
log_level = "warn"
"#;
        let file = create_temp_config(content);
        let config = CinemapConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "warn");
        assert_eq!(config.search.embedding_dim, 384);
        assert_eq!(config.analytics.top_genres, 5);
    }

    #[test]
    fn test_load_rejects_zero_dimension() {
        let content = r#"
[search]
embedding_dim = 0
"#;
        let file = create_temp_config(content);
        let err = CinemapConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, CinemapError::Config(_)));
        assert!(err.to_string().contains("embedding_dim"));
    }

    #[test]
    fn test_validate_rejects_default_limit_above_max() {
        let mut config = CinemapConfig::default();
        config.search.default_limit = 200;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_positive_tolerance() {
        let mut config = CinemapConfig::default();
        config.analytics.tolerance = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = CinemapConfig::load_or_default(Path::new("/nonexistent/config.toml"));
        assert_eq!(config.general.database_path, "~/.cinemap/movies.db");
    }

    #[test]
    fn test_load_invalid_toml_is_config_error() {
        let file = create_temp_config("[search\nembedding_dim = ");
        let err = CinemapConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, CinemapError::Config(_)));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = CinemapConfig::default();
        config.search.embedding_dim = 16;
        config.save(&path).unwrap();

        let reloaded = CinemapConfig::load(&path).unwrap();
        assert_eq!(reloaded.search.embedding_dim, 16);
        assert_eq!(reloaded.general.log_level, config.general.log_level);
    }
}
