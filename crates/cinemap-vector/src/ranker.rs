//! Exact nearest-neighbour ranking by cosine similarity.
//!
//! Every call is a full linear scan over the store. Ranking is read-only, so
//! any number of rankers may share one store concurrently.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use cinemap_core::types::MovieId;

use crate::error::VectorError;
use crate::similarity::cosine_similarity;
use crate::store::{first_non_finite, VectorStore};

/// A ranked movie with its cosine similarity to the query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredMovie {
    pub id: MovieId,
    pub score: f64,
}

/// Ranks stored vectors against a query vector.
#[derive(Debug, Clone, Copy)]
pub struct SimilarityRanker<'a> {
    store: &'a VectorStore,
}

impl<'a> SimilarityRanker<'a> {
    pub fn new(store: &'a VectorStore) -> Self {
        Self { store }
    }

    /// Return the top `k` movies by similarity to `query`.
    ///
    /// Ordered by descending score, ties broken by ascending id. Ids in
    /// `exclude` are skipped; the caller must include the query movie's own
    /// id when ranking neighbours of a catalog movie. Fewer than `k` eligible
    /// movies yields a shorter (possibly empty) result.
    pub fn rank(
        &self,
        query: &[f32],
        exclude: &HashSet<MovieId>,
        k: usize,
    ) -> Result<Vec<ScoredMovie>, VectorError> {
        if k == 0 {
            return Err(VectorError::InvalidLimit(k));
        }
        if query.len() != self.store.dimension() {
            return Err(VectorError::DimensionMismatch {
                expected: self.store.dimension(),
                actual: query.len(),
            });
        }
        if let Some(index) = first_non_finite(query) {
            return Err(VectorError::NonFinite { index });
        }

        let mut scored = Vec::with_capacity(self.store.len());
        for (id, vector) in self.store.all() {
            if exclude.contains(&id) {
                continue;
            }
            let score = cosine_similarity(query, vector)?;
            scored.push(ScoredMovie { id, score });
        }

        scored.sort_by(compare_ranked);
        scored.truncate(k);
        Ok(scored)
    }
}

/// Descending score, then ascending id.
fn compare_ranked(a: &ScoredMovie, b: &ScoredMovie) -> Ordering {
    b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id))
}
