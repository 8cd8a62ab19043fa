//! Database schema migrations.
//!
//! Applies the movie catalog schema and records it in schema_migrations.

use rusqlite::Connection;
use tracing::info;

use cinemap_core::error::CinemapError;

/// Schema version written by the newest migration.
pub const LATEST_VERSION: u32 = 1;

/// Run all pending database migrations and return the schema version.
pub fn run_migrations(conn: &Connection) -> Result<u32, CinemapError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| CinemapError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| CinemapError::Storage(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: movie_catalog");
    }

    Ok(LATEST_VERSION.max(current_version as u32))
}

/// Version 1: movie catalog.
///
/// `genres` is a JSON array of strings. `embedding` holds little-endian f32
/// values and is NULL until the embedding backfill has run.
fn apply_v1(conn: &Connection) -> Result<(), CinemapError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS movies (
            id              INTEGER PRIMARY KEY NOT NULL,
            title           TEXT NOT NULL,
            description     TEXT,
            release_year    INTEGER,
            genres          TEXT NOT NULL DEFAULT '[]',
            rating          REAL,
            embedding       BLOB,
            updated_at      INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_movies_missing_embedding
            ON movies (id)
            WHERE embedding IS NULL;

        INSERT INTO schema_migrations (version, name) VALUES (1, 'movie_catalog');
        ",
    )
    .map_err(|e| CinemapError::Storage(format!("Migration v1 failed: {}", e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(run_migrations(&conn).unwrap(), LATEST_VERSION);
        assert_eq!(run_migrations(&conn).unwrap(), LATEST_VERSION);

        let versions: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(versions, 1);
    }

    #[test]
    fn test_movies_table_accepts_null_embedding() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        conn.execute(
            "INSERT INTO movies (id, title) VALUES (1, 'Metropolis')",
            [],
        )
        .unwrap();
        let embedding: Option<Vec<u8>> = conn
            .query_row("SELECT embedding FROM movies WHERE id = 1", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert!(embedding.is_none());
    }
}
