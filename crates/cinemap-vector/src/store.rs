//! In-memory vector store keyed by movie id.
//!
//! Every accepted vector has the store's configured width L and only finite
//! components. Any other entry is kept out of the store and recorded as a
//! rejection so callers can report it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use cinemap_core::types::{MovieId, StoredMovie};

use crate::codec::{decode_embedding, DecodeError};
use crate::error::VectorError;

/// Why a movie has no usable vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    /// No embedding was recorded.
    Missing,
    /// The stored bytes could not be decoded.
    Decode(DecodeError),
    /// The decoded vector has the wrong width.
    WrongLength { actual: usize },
    /// A component is NaN or infinite.
    NonFinite { index: usize },
}

/// A movie excluded from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rejection {
    pub id: MovieId,
    pub reason: RejectionReason,
}

/// Counts of accepted and excluded entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreDiagnostics {
    pub loaded: usize,
    pub missing: usize,
    pub decode_failures: usize,
    pub wrong_length: usize,
    pub non_finite: usize,
}

impl StoreDiagnostics {
    /// Entries that were offered but not loaded.
    pub fn excluded(&self) -> usize {
        self.missing + self.decode_failures + self.wrong_length + self.non_finite
    }
}

/// Mapping from movie id to an embedding of fixed width.
///
/// Iteration is in ascending id order, so every scan over the store is
/// deterministic.
#[derive(Debug, Clone)]
pub struct VectorStore {
    dimension: usize,
    vectors: BTreeMap<MovieId, Vec<f32>>,
    rejections: BTreeMap<MovieId, RejectionReason>,
}

impl VectorStore {
    /// Create an empty store for vectors of width `dimension`.
    pub fn new(dimension: usize) -> Result<Self, VectorError> {
        if dimension == 0 {
            return Err(VectorError::InvalidDimension);
        }
        Ok(Self {
            dimension,
            vectors: BTreeMap::new(),
            rejections: BTreeMap::new(),
        })
    }

    /// Build a store from persisted catalog rows.
    ///
    /// Bad rows never fail the load; they are recorded as rejections.
    pub fn from_records(dimension: usize, records: &[StoredMovie]) -> Result<Self, VectorError> {
        let mut store = Self::new(dimension)?;
        for record in records {
            store.insert_raw(record.movie.id, record.embedding.as_deref());
        }
        let diagnostics = store.diagnostics();
        info!(
            dimension,
            loaded = diagnostics.loaded,
            missing = diagnostics.missing,
            decode_failures = diagnostics.decode_failures,
            wrong_length = diagnostics.wrong_length,
            non_finite = diagnostics.non_finite,
            "Vector store populated"
        );
        Ok(store)
    }

    /// Insert an already decoded vector, replacing any previous entry.
    ///
    /// Vectors of the wrong width are refused, never truncated or padded.
    /// A vector with a NaN or infinite component is refused and recorded as
    /// a rejection for `id`.
    pub fn insert(&mut self, id: MovieId, vector: Vec<f32>) -> Result<(), VectorError> {
        if vector.len() != self.dimension {
            return Err(VectorError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        if let Some(index) = first_non_finite(&vector) {
            self.vectors.remove(&id);
            self.rejections.insert(id, RejectionReason::NonFinite { index });
            return Err(VectorError::NonFinite { index });
        }
        self.rejections.remove(&id);
        self.vectors.insert(id, vector);
        Ok(())
    }

    /// Insert a raw stored embedding. Returns whether a vector was accepted.
    pub fn insert_raw(&mut self, id: MovieId, raw: Option<&[u8]>) -> bool {
        let reason = match raw.map(decode_embedding) {
            None => {
                debug!(movie_id = %id, "No embedding recorded");
                RejectionReason::Missing
            }
            Some(Err(e)) => {
                warn!(movie_id = %id, error = %e, "Undecodable embedding, treating as absent");
                RejectionReason::Decode(e)
            }
            Some(Ok(vector)) if vector.len() != self.dimension => {
                warn!(
                    movie_id = %id,
                    expected = self.dimension,
                    actual = vector.len(),
                    "Embedding has wrong width, treating as absent"
                );
                RejectionReason::WrongLength {
                    actual: vector.len(),
                }
            }
            Some(Ok(vector)) => match first_non_finite(&vector) {
                Some(index) => {
                    warn!(
                        movie_id = %id,
                        index,
                        "Embedding has a non-finite component, treating as absent"
                    );
                    RejectionReason::NonFinite { index }
                }
                None => {
                    self.rejections.remove(&id);
                    self.vectors.insert(id, vector);
                    return true;
                }
            },
        };
        self.vectors.remove(&id);
        self.rejections.insert(id, reason);
        false
    }

    /// Look up a movie's vector. Unknown ids and excluded entries are `None`.
    pub fn get(&self, id: MovieId) -> Option<&[f32]> {
        self.vectors.get(&id).map(Vec::as_slice)
    }

    /// Every valid entry, in ascending id order.
    pub fn all(&self) -> impl ExactSizeIterator<Item = (MovieId, &[f32])> + '_ {
        self.vectors.iter().map(|(id, v)| (*id, v.as_slice()))
    }

    /// Entries excluded from `all()`, in ascending id order.
    pub fn rejections(&self) -> impl Iterator<Item = Rejection> + '_ {
        self.rejections.iter().map(|(id, reason)| Rejection {
            id: *id,
            reason: *reason,
        })
    }

    pub fn diagnostics(&self) -> StoreDiagnostics {
        let mut diagnostics = StoreDiagnostics {
            loaded: self.vectors.len(),
            ..Default::default()
        };
        for reason in self.rejections.values() {
            match reason {
                RejectionReason::Missing => diagnostics.missing += 1,
                RejectionReason::Decode(_) => diagnostics.decode_failures += 1,
                RejectionReason::WrongLength { .. } => diagnostics.wrong_length += 1,
                RejectionReason::NonFinite { .. } => diagnostics.non_finite += 1,
            }
        }
        diagnostics
    }

    /// The common vector width L.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn contains(&self, id: MovieId) -> bool {
        self.vectors.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

/// Index of the first NaN or infinite component.
pub(crate) fn first_non_finite(vector: &[f32]) -> Option<usize> {
    vector.iter().position(|c| !c.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_embedding;
    use cinemap_core::types::Movie;

    fn record(id: i64, embedding: Option<Vec<u8>>) -> StoredMovie {
        StoredMovie::new(Movie::new(id, format!("Movie {}", id)), embedding)
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert_eq!(VectorStore::new(0).unwrap_err(), VectorError::InvalidDimension);
    }

    #[test]
    fn test_insert_and_get() {
        let mut store = VectorStore::new(3).unwrap();
        store.insert(MovieId(1), vec![1.0, 0.0, 0.0]).unwrap();

        assert_eq!(store.get(MovieId(1)), Some(&[1.0f32, 0.0, 0.0][..]));
        assert_eq!(store.get(MovieId(2)), None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_insert_wrong_width_refused() {
        let mut store = VectorStore::new(3).unwrap();
        let err = store.insert(MovieId(1), vec![1.0, 0.0]).unwrap_err();
        assert_eq!(
            err,
            VectorError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_seven_byte_buffer_excluded_and_counted() {
        let records = vec![
            record(1, Some(encode_embedding(&[1.0, 0.0]))),
            record(2, Some(vec![0u8; 7])),
        ];
        let store = VectorStore::from_records(2, &records).unwrap();

        let ids: Vec<MovieId> = store.all().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![MovieId(1)]);
        assert_eq!(store.get(MovieId(2)), None);

        let rejections: Vec<Rejection> = store.rejections().collect();
        assert_eq!(
            rejections,
            vec![Rejection {
                id: MovieId(2),
                reason: RejectionReason::Decode(DecodeError::Misaligned { len: 7 }),
            }]
        );
        assert_eq!(store.diagnostics().decode_failures, 1);
    }

    #[test]
    fn test_missing_is_distinct_from_zero_vector() {
        let records = vec![
            record(1, None),
            record(2, Some(encode_embedding(&[0.0, 0.0]))),
        ];
        let store = VectorStore::from_records(2, &records).unwrap();

        assert_eq!(store.get(MovieId(1)), None);
        assert_eq!(store.get(MovieId(2)), Some(&[0.0f32, 0.0][..]));
        let diagnostics = store.diagnostics();
        assert_eq!(diagnostics.missing, 1);
        assert_eq!(diagnostics.loaded, 1);
    }

    #[test]
    fn test_wrong_width_bytes_excluded() {
        let records = vec![record(4, Some(encode_embedding(&[1.0, 2.0, 3.0])))];
        let store = VectorStore::from_records(2, &records).unwrap();

        assert!(store.is_empty());
        assert_eq!(
            store.rejections().next().map(|r| r.reason),
            Some(RejectionReason::WrongLength { actual: 3 })
        );
    }

    #[test]
    fn test_all_is_in_ascending_id_order() {
        let mut store = VectorStore::new(1).unwrap();
        for id in [5, 1, 3] {
            store.insert(MovieId(id), vec![id as f32]).unwrap();
        }
        let ids: Vec<i64> = store.all().map(|(id, _)| id.0).collect();
        assert_eq!(ids, vec![1, 3, 5]);
        assert_eq!(store.all().len(), 3);
    }

    #[test]
    fn test_valid_reinsert_clears_rejection() {
        let mut store = VectorStore::new(1).unwrap();
        assert!(!store.insert_raw(MovieId(1), None));
        assert!(store.insert_raw(MovieId(1), Some(&encode_embedding(&[2.0]))));

        assert!(store.contains(MovieId(1)));
        assert_eq!(store.rejections().count(), 0);
    }

    #[test]
    fn test_diagnostics_excluded_total() {
        let records = vec![
            record(1, None),
            record(2, Some(vec![])),
            record(3, Some(vec![1, 2, 3])),
            record(4, Some(encode_embedding(&[1.0]))),
            record(5, Some(encode_embedding(&[1.0, 1.0]))),
        ];
        let store = VectorStore::from_records(2, &records).unwrap();
        let diagnostics = store.diagnostics();
        assert_eq!(
            diagnostics,
            StoreDiagnostics {
                loaded: 1,
                missing: 1,
                decode_failures: 2,
                wrong_length: 1,
                non_finite: 0,
            }
        );
        assert_eq!(diagnostics.excluded(), 4);
    }

    #[test]
    fn test_non_finite_bytes_excluded_and_counted() {
        let records = vec![
            record(1, Some(encode_embedding(&[1.0, 0.0]))),
            record(2, Some(encode_embedding(&[f32::NAN, 0.0]))),
            record(3, Some(encode_embedding(&[0.0, f32::INFINITY]))),
            record(4, Some(encode_embedding(&[f32::NEG_INFINITY, 1.0]))),
        ];
        let store = VectorStore::from_records(2, &records).unwrap();

        let ids: Vec<MovieId> = store.all().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![MovieId(1)]);
        assert_eq!(
            store.rejections().map(|r| r.reason).collect::<Vec<_>>(),
            vec![
                RejectionReason::NonFinite { index: 0 },
                RejectionReason::NonFinite { index: 1 },
                RejectionReason::NonFinite { index: 0 },
            ]
        );
        let diagnostics = store.diagnostics();
        assert_eq!(diagnostics.loaded, 1);
        assert_eq!(diagnostics.non_finite, 3);
        assert_eq!(diagnostics.decode_failures, 0);
        assert_eq!(diagnostics.excluded(), 3);
    }

    #[test]
    fn test_insert_non_finite_refused() {
        let mut store = VectorStore::new(2).unwrap();
        store.insert(MovieId(1), vec![1.0, 1.0]).unwrap();

        let err = store.insert(MovieId(1), vec![1.0, f32::NAN]).unwrap_err();
        assert_eq!(err, VectorError::NonFinite { index: 1 });
        assert_eq!(store.get(MovieId(1)), None);
        assert_eq!(store.diagnostics().non_finite, 1);
    }
}
