//! Embedding backfill pipeline.
//!
//! The EmbeddingPipeline turns catalog movies into stored embeddings:
//! build the embedding text, embed it, validate the width, encode, and write
//! the bytes back through the repository.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use cinemap_core::error::CinemapError;
use cinemap_core::types::{Movie, MovieId};
use cinemap_storage::MovieRepository;

use crate::codec::encode_embedding;
use crate::embedding::EmbeddingService;
use crate::error::VectorError;

/// Result of embedding a single movie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EmbedOutcome {
    /// The movie was embedded; `bytes` is the encoded vector.
    Embedded { id: MovieId, bytes: Vec<u8> },
    /// The movie was skipped (e.g., nothing to embed).
    Skipped { id: MovieId, reason: String },
}

/// Totals from a backfill run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackfillReport {
    pub embedded: usize,
    pub skipped: usize,
}

/// Generates embeddings for movies that lack one.
pub struct EmbeddingPipeline<E: EmbeddingService> {
    embedder: E,
    dimension: usize,
}

impl<E: EmbeddingService> EmbeddingPipeline<E> {
    /// Create a pipeline producing vectors of width `dimension`.
    pub fn new(embedder: E, dimension: usize) -> Result<Self, VectorError> {
        if dimension == 0 {
            return Err(VectorError::InvalidDimension);
        }
        Ok(Self {
            embedder,
            dimension,
        })
    }

    /// Embed one movie without persisting anything.
    pub async fn embed_movie(&self, movie: &Movie) -> Result<EmbedOutcome, VectorError> {
        let text = movie.embedding_text();
        if text.trim().is_empty() {
            debug!(movie_id = %movie.id, "Skipping movie with no embeddable text");
            return Ok(EmbedOutcome::Skipped {
                id: movie.id,
                reason: "No title, description, or genres".to_string(),
            });
        }

        let vector = self.embedder.embed(&text).await?;
        if vector.len() != self.dimension {
            return Err(VectorError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }

        Ok(EmbedOutcome::Embedded {
            id: movie.id,
            bytes: encode_embedding(&vector),
        })
    }

    /// Embed every movie whose stored embedding is NULL.
    ///
    /// A movie whose embedding call fails is logged and counted as skipped;
    /// storage failures abort the run.
    pub async fn backfill(&self, repo: &MovieRepository) -> Result<BackfillReport, CinemapError> {
        let pending = repo.find_missing_embeddings()?;
        info!(pending = pending.len(), "Starting embedding backfill");

        let mut report = BackfillReport::default();
        for movie in &pending {
            match self.embed_movie(movie).await {
                Ok(EmbedOutcome::Embedded { id, bytes }) => {
                    repo.set_embedding(id, &bytes)?;
                    report.embedded += 1;
                }
                Ok(EmbedOutcome::Skipped { .. }) => report.skipped += 1,
                Err(e) => {
                    warn!(movie_id = %movie.id, error = %e, "Failed to embed movie");
                    report.skipped += 1;
                }
            }
        }

        info!(
            embedded = report.embedded,
            skipped = report.skipped,
            "Embedding backfill complete"
        );
        Ok(report)
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }
}
