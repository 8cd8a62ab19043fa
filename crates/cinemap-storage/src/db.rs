//! SQLite handle for the movie catalog.
//!
//! A single connection sits behind a mutex. File databases run in WAL mode
//! with a busy timeout, so an embedding backfill in one process and catalog
//! reads in another do not fail on each other's locks.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use rusqlite::Connection;
use tracing::info;

use cinemap_core::error::CinemapError;

use crate::migrations;

/// How long a statement waits on another connection's write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// The catalog database, migrated to the latest schema on open.
pub struct Database {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
    schema_version: u32,
}

impl Database {
    /// Open (or create) the catalog at `path`, creating missing parent
    /// directories.
    pub fn new(path: &Path) -> Result<Self, CinemapError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path).map_err(|e| {
            CinemapError::Storage(format!("Failed to open {}: {}", path.display(), e))
        })?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(|e| CinemapError::Storage(format!("Failed to set pragmas: {}", e)))?;

        Self::initialize(conn, Some(path.to_path_buf()))
    }

    /// A private catalog that lives only as long as the handle.
    pub fn in_memory() -> Result<Self, CinemapError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| CinemapError::Storage(format!("Failed to open in-memory db: {}", e)))?;
        Self::initialize(conn, None)
    }

    fn initialize(conn: Connection, path: Option<PathBuf>) -> Result<Self, CinemapError> {
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| CinemapError::Storage(format!("Failed to set busy timeout: {}", e)))?;
        let schema_version = migrations::run_migrations(&conn)?;

        match path {
            Some(ref p) => info!(path = %p.display(), schema_version, "Catalog database ready"),
            None => info!(schema_version, "In-memory catalog database ready"),
        }

        Ok(Self {
            conn: Mutex::new(conn),
            path,
            schema_version,
        })
    }

    /// File backing the catalog; `None` for an in-memory database.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Schema version after migrations ran.
    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    /// Run `f` with the connection locked for its whole duration.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, CinemapError>
    where
        F: FnOnce(&Connection) -> Result<T, CinemapError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| CinemapError::Storage(format!("Database lock poisoned: {}", e)))?;
        f(&conn)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.path)
            .field("schema_version", &self.schema_version)
            .finish()
    }
}
