//! Search engine combining similarity ranking with query embedding.
//!
//! SearchEngine answers two questions against a catalog snapshot: "which
//! movies are like this one" and "which movies match this text". Both rank
//! with [`SimilarityRanker`] and attach movie metadata to the hits.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use cinemap_core::types::{Movie, MovieId};

use crate::catalog::CatalogSnapshot;
use crate::embedding::{DynEmbeddingService, EmbeddingService};
use crate::error::VectorError;
use crate::ranker::{ScoredMovie, SimilarityRanker};

/// A single search hit with its score and display metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarMovie {
    pub id: MovieId,
    pub title: String,
    pub genres: Vec<String>,
    pub rating: Option<f64>,
    pub release_year: Option<i32>,
    /// Cosine similarity to the query, in [-1, 1].
    pub score: f64,
}

impl SimilarMovie {
    fn from_scored(scored: ScoredMovie, movie: Option<&Movie>) -> Self {
        match movie {
            Some(m) => Self {
                id: scored.id,
                title: m.title.clone(),
                genres: m.genres.clone(),
                rating: m.rating,
                release_year: m.release_year,
                score: scored.score,
            },
            None => Self {
                id: scored.id,
                title: String::new(),
                genres: Vec::new(),
                rating: None,
                release_year: None,
                score: scored.score,
            },
        }
    }
}

/// Similarity search over catalog snapshots.
///
/// Uses dynamic dispatch (`Box<dyn DynEmbeddingService>`) so that the query
/// embedder can be swapped without changing the engine's type.
pub struct SearchEngine {
    embedder: Box<dyn DynEmbeddingService>,
    max_limit: usize,
}

impl SearchEngine {
    /// Create a search engine. Requested limits above `max_limit` are clamped.
    pub fn new(embedder: impl EmbeddingService + 'static, max_limit: usize) -> Self {
        Self {
            embedder: Box::new(embedder),
            max_limit,
        }
    }

    /// Create a search engine from a pre-boxed dynamic embedding service.
    pub fn new_dyn(embedder: Box<dyn DynEmbeddingService>, max_limit: usize) -> Self {
        Self {
            embedder,
            max_limit,
        }
    }

    /// The `k` nearest neighbours of a catalog movie, excluding the movie
    /// itself.
    pub fn similar_to(
        &self,
        snapshot: &CatalogSnapshot,
        id: MovieId,
        k: usize,
    ) -> Result<Vec<SimilarMovie>, VectorError> {
        let k = self.clamp(k)?;
        let store = snapshot.store();
        let query = store.get(id).ok_or(VectorError::MissingEmbedding(id))?;

        let exclude = HashSet::from([id]);
        let ranked = SimilarityRanker::new(store).rank(query, &exclude, k)?;
        debug!(
            movie_id = %id,
            k,
            hits = ranked.len(),
            version = snapshot.version(),
            "Similar movies ranked"
        );
        Ok(attach_metadata(snapshot, ranked))
    }

    /// The `k` movies closest to a free-text query.
    ///
    /// A blank query returns no results.
    pub async fn search_text(
        &self,
        snapshot: &CatalogSnapshot,
        text: &str,
        k: usize,
    ) -> Result<Vec<SimilarMovie>, VectorError> {
        let k = self.clamp(k)?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let store = snapshot.store();
        if self.embedder.dimensions() != store.dimension() {
            return Err(VectorError::DimensionMismatch {
                expected: store.dimension(),
                actual: self.embedder.dimensions(),
            });
        }

        let query = self.embedder.embed_boxed(text).await?;
        let ranked = SimilarityRanker::new(store).rank(&query, &HashSet::new(), k)?;
        debug!(k, hits = ranked.len(), version = snapshot.version(), "Text query ranked");
        Ok(attach_metadata(snapshot, ranked))
    }

    pub fn max_limit(&self) -> usize {
        self.max_limit
    }

    fn clamp(&self, k: usize) -> Result<usize, VectorError> {
        if k == 0 {
            return Err(VectorError::InvalidLimit(k));
        }
        Ok(k.min(self.max_limit.max(1)))
    }
}

fn attach_metadata(snapshot: &CatalogSnapshot, ranked: Vec<ScoredMovie>) -> Vec<SimilarMovie> {
    ranked
        .into_iter()
        .map(|scored| SimilarMovie::from_scored(scored, snapshot.movie(scored.id)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_embedding;
    use crate::embedding::MockEmbedding;
    use cinemap_core::types::StoredMovie;

    fn snapshot_of(vectors: &[(i64, &str, Option<Vec<f32>>)]) -> CatalogSnapshot {
        let dim = vectors
            .iter()
            .find_map(|(_, _, v)| v.as_ref().map(Vec::len))
            .unwrap_or(3);
        let records: Vec<StoredMovie> = vectors
            .iter()
            .map(|(id, title, v)| {
                StoredMovie::new(
                    Movie::new(*id, *title).with_genres(["Drama"]),
                    v.as_deref().map(encode_embedding),
                )
            })
            .collect();
        CatalogSnapshot::from_records(1, dim, &records).unwrap()
    }

    #[test]
    fn test_similar_to_excludes_self_and_attaches_metadata() {
        let snapshot = snapshot_of(&[
            (1, "Alien", Some(vec![1.0, 0.0, 0.0])),
            (2, "Babe", Some(vec![0.0, 1.0, 0.0])),
            (3, "Aliens", Some(vec![0.9, 0.1, 0.0])),
        ]);
        let engine = SearchEngine::new(MockEmbedding::with_dimensions(3), 100);

        let results = engine.similar_to(&snapshot, MovieId(1), 1).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, MovieId(3));
        assert_eq!(results[0].title, "Aliens");
        assert_eq!(results[0].genres, vec!["Drama".to_string()]);

        let all = engine.similar_to(&snapshot, MovieId(1), 10).unwrap();
        assert!(all.iter().all(|m| m.id != MovieId(1)));
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_similar_to_without_embedding() {
        let snapshot = snapshot_of(&[
            (1, "Alien", Some(vec![1.0, 0.0])),
            (2, "Unembedded", None),
        ]);
        let engine = SearchEngine::new(MockEmbedding::with_dimensions(2), 100);

        assert_eq!(
            engine.similar_to(&snapshot, MovieId(2), 5).unwrap_err(),
            VectorError::MissingEmbedding(MovieId(2))
        );
        assert_eq!(
            engine.similar_to(&snapshot, MovieId(42), 5).unwrap_err(),
            VectorError::MissingEmbedding(MovieId(42))
        );
    }

    #[test]
    fn test_limit_clamped_to_max() {
        let vectors: Vec<(i64, &str, Option<Vec<f32>>)> = (1..=6)
            .map(|i| (i, "Movie", Some(vec![i as f32, 1.0])))
            .collect();
        let snapshot = snapshot_of(&vectors);
        let engine = SearchEngine::new(MockEmbedding::with_dimensions(2), 2);

        let results = engine.similar_to(&snapshot, MovieId(1), 50).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_zero_limit_rejected() {
        let snapshot = snapshot_of(&[(1, "Alien", Some(vec![1.0]))]);
        let engine = SearchEngine::new(MockEmbedding::with_dimensions(1), 10);
        assert_eq!(
            engine.similar_to(&snapshot, MovieId(1), 0).unwrap_err(),
            VectorError::InvalidLimit(0)
        );
    }

    #[tokio::test]
    async fn test_search_text_finds_identical_text_first() {
        let embedder = MockEmbedding::with_dimensions(16);
        let heist = embedder.embed("a heist in a casino").await.unwrap();
        let space = embedder.embed("a voyage through space").await.unwrap();
        let snapshot = snapshot_of(&[
            (1, "Heist", Some(heist)),
            (2, "Voyage", Some(space)),
        ]);

        let engine = SearchEngine::new(embedder, 100);
        let results = engine
            .search_text(&snapshot, "a heist in a casino", 5)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, MovieId(1));
        assert!((results[0].score - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_search_text_blank_query_is_empty() {
        let snapshot = snapshot_of(&[(1, "Alien", Some(vec![1.0, 0.0]))]);
        let engine = SearchEngine::new(MockEmbedding::with_dimensions(2), 10);
        let results = engine.search_text(&snapshot, "   ", 5).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_search_text_embedder_width_mismatch() {
        let snapshot = snapshot_of(&[(1, "Alien", Some(vec![1.0, 0.0, 0.0]))]);
        let engine = SearchEngine::new(MockEmbedding::with_dimensions(8), 10);
        let err = engine
            .search_text(&snapshot, "space horror", 5)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            VectorError::DimensionMismatch {
                expected: 3,
                actual: 8
            }
        );
    }
}
