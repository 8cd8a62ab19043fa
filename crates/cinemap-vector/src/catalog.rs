//! Versioned, immutable catalog snapshots.
//!
//! A snapshot pairs the movie metadata with the vector store built from the
//! same rows. Readers hold an `Arc<CatalogSnapshot>` for the whole of an
//! operation, so a reload never changes the data underneath a running
//! projection or ranking.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tracing::info;

use cinemap_core::error::CinemapError;
use cinemap_core::types::{Movie, MovieId, StoredMovie};

use crate::error::VectorError;
use crate::store::VectorStore;

/// One consistent view of the catalog.
#[derive(Debug)]
pub struct CatalogSnapshot {
    version: u64,
    movies: Vec<Movie>,
    positions: HashMap<MovieId, usize>,
    store: VectorStore,
}

impl CatalogSnapshot {
    /// Build a snapshot from persisted rows. Movies are kept in ascending id
    /// order; a duplicated id keeps its last row.
    pub fn from_records(
        version: u64,
        dimension: usize,
        records: &[StoredMovie],
    ) -> Result<Self, VectorError> {
        let store = VectorStore::from_records(dimension, records)?;

        let mut by_id: HashMap<MovieId, &Movie> = HashMap::with_capacity(records.len());
        for record in records {
            by_id.insert(record.movie.id, &record.movie);
        }
        let mut movies: Vec<Movie> = by_id.into_values().cloned().collect();
        movies.sort_by_key(|m| m.id);

        let positions = movies
            .iter()
            .enumerate()
            .map(|(i, m)| (m.id, i))
            .collect();

        Ok(Self {
            version,
            movies,
            positions,
            store,
        })
    }

    /// An empty snapshot at version 0.
    pub fn empty(dimension: usize) -> Result<Self, VectorError> {
        Self::from_records(0, dimension, &[])
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// All movies, in ascending id order, with or without embeddings.
    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    pub fn movie(&self, id: MovieId) -> Option<&Movie> {
        self.positions.get(&id).map(|&i| &self.movies[i])
    }

    pub fn store(&self) -> &VectorStore {
        &self.store
    }
}

/// Holder of the current catalog snapshot.
///
/// Cloning shares the same underlying catalog.
#[derive(Debug, Clone)]
pub struct Catalog {
    current: Arc<RwLock<Arc<CatalogSnapshot>>>,
    next_version: Arc<AtomicU64>,
    dimension: usize,
}

impl Catalog {
    /// Create an empty catalog for vectors of width `dimension`.
    pub fn new(dimension: usize) -> Result<Self, VectorError> {
        let empty = CatalogSnapshot::empty(dimension)?;
        Ok(Self {
            current: Arc::new(RwLock::new(Arc::new(empty))),
            next_version: Arc::new(AtomicU64::new(1)),
            dimension,
        })
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Result<Arc<CatalogSnapshot>, CinemapError> {
        let current = self
            .current
            .read()
            .map_err(|e| CinemapError::Storage(format!("Catalog lock poisoned: {}", e)))?;
        Ok(Arc::clone(&current))
    }

    /// Replace the catalog contents, returning the new snapshot.
    ///
    /// The snapshot is built before the swap, so readers see either the old
    /// or the new version, never a mix.
    pub fn reload(&self, records: &[StoredMovie]) -> Result<Arc<CatalogSnapshot>, CinemapError> {
        let version = self.next_version.fetch_add(1, Ordering::SeqCst);
        let snapshot = Arc::new(CatalogSnapshot::from_records(
            version,
            self.dimension,
            records,
        )?);

        let mut current = self
            .current
            .write()
            .map_err(|e| CinemapError::Storage(format!("Catalog lock poisoned: {}", e)))?;
        *current = Arc::clone(&snapshot);

        info!(
            version,
            movies = snapshot.movies().len(),
            vectors = snapshot.store().len(),
            "Catalog reloaded"
        );
        Ok(snapshot)
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }
}
