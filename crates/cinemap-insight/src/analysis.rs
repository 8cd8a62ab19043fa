//! Quadrant analytics over one catalog snapshot.
//!
//! Projection, classification and summarization run back to back against a
//! single `CatalogSnapshot`, so every coordinate, median and report in a
//! [`QuadrantAnalysis`] comes from the same batch. The result records the
//! snapshot version it was computed from.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use cinemap_core::config::AnalyticsConfig;
use cinemap_core::error::CinemapError;
use cinemap_core::types::MovieId;
use cinemap_vector::{Catalog, CatalogSnapshot, StoreDiagnostics};

use crate::error::InsightError;
use crate::projector::Projector;
use crate::quadrant::QuadrantClassifier;
use crate::summarizer::QuadrantSummarizer;
use crate::types::{Bounds, Medians, MoviePoint, Quadrant, QuadrantMember, QuadrantReport};

/// Everything the analytics views need, computed from one snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuadrantAnalysis {
    pub snapshot_version: u64,
    pub generated_at: DateTime<Utc>,
    /// Projected movies in ascending id order.
    pub points: Vec<MoviePoint>,
    pub medians: Medians,
    pub bounds: Bounds,
    pub explained_variance: [f64; 2],
    /// One report per quadrant, Q1 through Q4.
    pub reports: Vec<QuadrantReport>,
    /// Movies left out of the projection for lack of a usable embedding.
    pub diagnostics: StoreDiagnostics,
}

impl QuadrantAnalysis {
    /// All genres present in the batch, sorted and deduplicated.
    pub fn unique_genres(&self) -> Vec<String> {
        let genres: BTreeSet<&str> = self
            .points
            .iter()
            .flat_map(|p| p.genres.iter().map(String::as_str))
            .collect();
        genres.into_iter().map(str::to_string).collect()
    }

    pub fn points_in(&self, quadrant: Quadrant) -> impl Iterator<Item = &MoviePoint> + '_ {
        self.points.iter().filter(move |p| p.quadrant == quadrant)
    }

    pub fn points_with_genre<'a>(
        &'a self,
        genre: &'a str,
    ) -> impl Iterator<Item = &'a MoviePoint> + 'a {
        self.points.iter().filter(move |p| p.has_genre(genre))
    }

    pub fn members(&self, quadrant: Quadrant) -> Vec<QuadrantMember<'_>> {
        self.points_in(quadrant).map(QuadrantMember::from).collect()
    }

    pub fn report(&self, quadrant: Quadrant) -> Option<&QuadrantReport> {
        self.reports.iter().find(|r| r.quadrant == quadrant)
    }

    pub fn point(&self, id: MovieId) -> Option<&MoviePoint> {
        self.points
            .binary_search_by_key(&id, |p| p.id)
            .ok()
            .map(|i| &self.points[i])
    }
}

/// Runs project → classify → summarize.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyticsEngine {
    projector: Projector,
    classifier: QuadrantClassifier,
    summarizer: QuadrantSummarizer,
}

impl AnalyticsEngine {
    pub fn new(projector: Projector, summarizer: QuadrantSummarizer) -> Self {
        Self {
            projector,
            classifier: QuadrantClassifier::new(),
            summarizer,
        }
    }

    pub fn from_config(config: &AnalyticsConfig) -> Self {
        Self::new(
            Projector::from_config(config),
            QuadrantSummarizer::from_config(config),
        )
    }

    pub fn summarizer(&self) -> &QuadrantSummarizer {
        &self.summarizer
    }

    /// Analyze a snapshot. Fails with `InsufficientData` when fewer than two
    /// movies have usable embeddings.
    pub fn analyze(&self, snapshot: &CatalogSnapshot) -> Result<QuadrantAnalysis, InsightError> {
        let store = snapshot.store();
        let entries: Vec<(MovieId, &[f32])> = store.all().collect();
        let vectors: Vec<&[f32]> = entries.iter().map(|(_, v)| *v).collect();

        let projection = self.projector.project(&vectors)?;
        let classification = self.classifier.classify(&projection.coordinates);
        let insufficient = || InsightError::InsufficientData {
            samples: entries.len(),
            dimensions: store.dimension(),
        };
        let medians = classification.medians.ok_or_else(insufficient)?;
        let bounds = Bounds::from_coordinates(&projection.coordinates).ok_or_else(insufficient)?;

        let points: Vec<MoviePoint> = entries
            .iter()
            .zip(&projection.coordinates)
            .zip(&classification.labels)
            .map(|(((id, _), coordinate), quadrant)| {
                let movie = snapshot.movie(*id);
                MoviePoint {
                    id: *id,
                    title: movie.map(|m| m.title.clone()).unwrap_or_default(),
                    genres: movie.map(|m| m.genres.clone()).unwrap_or_default(),
                    rating: movie.and_then(|m| m.rating),
                    release_year: movie.and_then(|m| m.release_year),
                    pc1: coordinate.pc1,
                    pc2: coordinate.pc2,
                    quadrant: *quadrant,
                }
            })
            .collect();

        let reports = Quadrant::ALL
            .iter()
            .map(|&q| {
                let members: Vec<QuadrantMember<'_>> = points
                    .iter()
                    .filter(|p| p.quadrant == q)
                    .map(QuadrantMember::from)
                    .collect();
                self.summarizer.summarize(&members, q)
            })
            .collect();

        let counts = classification.counts();
        let diagnostics = store.diagnostics();
        info!(
            version = snapshot.version(),
            points = points.len(),
            excluded = diagnostics.excluded(),
            q1 = counts[0],
            q2 = counts[1],
            q3 = counts[2],
            q4 = counts[3],
            "Quadrant analysis complete"
        );

        Ok(QuadrantAnalysis {
            snapshot_version: snapshot.version(),
            generated_at: Utc::now(),
            points,
            medians,
            bounds,
            explained_variance: projection.explained_variance,
            reports,
            diagnostics,
        })
    }

    /// Analyze whatever snapshot is current in `catalog`.
    pub fn analyze_current(&self, catalog: &Catalog) -> Result<QuadrantAnalysis, CinemapError> {
        let snapshot = catalog.snapshot()?;
        Ok(self.analyze(&snapshot)?)
    }
}
