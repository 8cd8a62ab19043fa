//! Cinemap Insight crate - projection, quadrant clustering, summaries, and export.
//!
//! Provides the batch analytics pipeline:
//! - Two-component PCA of the full embedding set
//! - Median split of the projection into quadrants
//! - Per-quadrant genre, rating, and centroid summaries
//! - JSON export of the projected catalog

pub mod analysis;
pub mod error;
pub mod export;
pub mod projector;
pub mod quadrant;
pub mod summarizer;
pub mod types;

pub use analysis::{AnalyticsEngine, QuadrantAnalysis};
pub use error::InsightError;
pub use export::QuadrantExporter;
pub use projector::{Projection, Projector};
pub use quadrant::{median, Classification, QuadrantClassifier};
pub use summarizer::QuadrantSummarizer;
pub use types::{
    Bounds, CentralMovie, Coordinate, GenreShare, Medians, MoviePoint, Quadrant, QuadrantMember,
    QuadrantReport, QuadrantStats, RatedMovie, Rect,
};
