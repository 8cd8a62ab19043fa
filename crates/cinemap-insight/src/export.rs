//! JSON export of projected movies for external plotting.

use std::path::Path;

use serde::Serialize;
use tracing::info;

use cinemap_core::types::MovieId;

use crate::analysis::QuadrantAnalysis;
use crate::error::InsightError;
use crate::types::{MoviePoint, Quadrant};

/// One exported row. Key names match what plotting notebooks expect.
#[derive(Debug, Serialize)]
struct ExportRecord<'a> {
    id: MovieId,
    title: &'a str,
    #[serde(rename = "PC1")]
    pc1: f64,
    #[serde(rename = "PC2")]
    pc2: f64,
    quadrant: Quadrant,
    genres: &'a [String],
    rating: Option<f64>,
    release_year: Option<i32>,
}

impl<'a> From<&'a MoviePoint> for ExportRecord<'a> {
    fn from(point: &'a MoviePoint) -> Self {
        Self {
            id: point.id,
            title: &point.title,
            pc1: point.pc1,
            pc2: point.pc2,
            quadrant: point.quadrant,
            genres: &point.genres,
            rating: point.rating,
            release_year: point.release_year,
        }
    }
}

/// Writes quadrant analyses as a pretty-printed JSON array.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuadrantExporter;

impl QuadrantExporter {
    pub fn new() -> Self {
        Self
    }

    pub fn to_json(&self, analysis: &QuadrantAnalysis) -> Result<String, InsightError> {
        let records: Vec<ExportRecord<'_>> = analysis.points.iter().map(ExportRecord::from).collect();
        Ok(serde_json::to_string_pretty(&records)?)
    }

    /// Write the export to `path`, creating parent directories. Returns the
    /// number of rows written.
    pub fn write(&self, analysis: &QuadrantAnalysis, path: &Path) -> Result<usize, InsightError> {
        let json = self.to_json(analysis)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, json).map_err(|e| {
            InsightError::Export(format!("Failed to write {}: {}", path.display(), e))
        })?;

        info!(
            rows = analysis.points.len(),
            version = analysis.snapshot_version,
            "Exported quadrant data to {}",
            path.display()
        );
        Ok(analysis.points.len())
    }
}
