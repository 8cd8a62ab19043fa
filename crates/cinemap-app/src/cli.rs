//! CLI argument definitions for the cinemap application.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use cinemap_core::config::CinemapConfig;
use cinemap_insight::Quadrant;

/// cinemap - similar-movie search and quadrant maps over movie embeddings.
#[derive(Parser, Debug)]
#[command(name = "cinemap", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database holding the movie catalog.
    #[arg(short = 'd', long = "database", global = true)]
    pub database: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Movies most similar to a catalog movie.
    Similar {
        /// Catalog id of the movie.
        #[arg(long)]
        id: i64,
        /// Number of results.
        #[arg(short = 'k', long)]
        limit: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Movies most similar to a free-text description.
    Search {
        text: String,
        #[arg(short = 'k', long)]
        limit: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Project the catalog and summarize each quadrant.
    Analyze {
        /// Only report this quadrant (Q1-Q4).
        #[arg(short = 'q', long, value_parser = parse_quadrant)]
        quadrant: Option<Quadrant>,
        #[arg(long)]
        json: bool,
    },
    /// Write projected movies to a JSON file.
    Export {
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },
    /// Browse the catalog, newest release first.
    List {
        /// Only movies released in this year.
        #[arg(long)]
        year: Option<i32>,
        /// Only movies rated at least this.
        #[arg(long)]
        min_rating: Option<f64>,
        #[arg(short = 'n', long, default_value_t = 50, value_parser = clap::value_parser!(u32).range(1..=100))]
        limit: u32,
        #[arg(long, default_value_t = 0)]
        offset: u32,
        #[arg(long)]
        json: bool,
    },
    /// A random selection from the catalog.
    Random {
        /// Only movies released in or after this year.
        #[arg(long)]
        year_start: Option<i32>,
        /// Only movies rated at least this.
        #[arg(long)]
        min_rating: Option<f64>,
        #[arg(short = 'n', long, default_value_t = 20, value_parser = clap::value_parser!(u32).range(1..=50))]
        limit: u32,
        #[arg(long)]
        json: bool,
    },
    /// Details of one catalog movie.
    Show {
        /// Catalog id of the movie.
        id: i64,
        #[arg(long)]
        json: bool,
    },
    /// Generate embeddings for movies that have none.
    Embed,
    /// List genres, or a quadrant's genre breakdown.
    Genres {
        #[arg(short = 'q', long, value_parser = parse_quadrant)]
        quadrant: Option<Quadrant>,
        #[arg(long)]
        json: bool,
    },
}

fn parse_quadrant(s: &str) -> Result<Quadrant, String> {
    Quadrant::parse(s).ok_or_else(|| format!("expected one of Q1, Q2, Q3, Q4, got '{}'", s))
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > CINEMAP_CONFIG env var > ~/.cinemap/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("CINEMAP_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the database path.
    ///
    /// Priority: --database flag > config file value (with `~` expanded).
    pub fn resolve_database_path(&self, config: &CinemapConfig) -> PathBuf {
        match self.database {
            Some(ref p) => p.clone(),
            None => expand_home(&config.general.database_path),
        }
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config: &CinemapConfig) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config.general.log_level.clone())
    }
}

fn home_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    let home = std::env::var("USERPROFILE");
    #[cfg(not(target_os = "windows"))]
    let home = std::env::var("HOME");
    home.ok().map(PathBuf::from)
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        if let Some(home) = home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    match home_dir() {
        Some(home) => home.join(".cinemap").join("config.toml"),
        None => PathBuf::from("config.toml"),
    }
}
