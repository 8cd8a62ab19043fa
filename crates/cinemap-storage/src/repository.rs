//! Repository for the movie catalog.
//!
//! The repository is the persistence collaborator of the vector layer: it
//! hands out `(metadata, raw embedding bytes or NULL)` rows and writes back
//! freshly generated embeddings. It never decodes embedding bytes itself.

use std::sync::Arc;

use rusqlite::types::ToSql;
use rusqlite::{OptionalExtension, Row};
use tracing::{debug, warn};

use cinemap_core::error::CinemapError;
use cinemap_core::types::{Movie, MovieId, StoredMovie};

use crate::db::Database;

const MOVIE_COLUMNS: &str = "id, title, description, release_year, genres, rating";

/// Optional filters for browsing the catalog. Unset fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MovieFilter {
    /// Exact release year.
    pub year: Option<i32>,
    /// Earliest release year, inclusive.
    pub year_start: Option<i32>,
    /// Minimum rating, inclusive. Unrated movies never match.
    pub min_rating: Option<f64>,
}

impl MovieFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_year_start(mut self, year: i32) -> Self {
        self.year_start = Some(year);
        self
    }

    pub fn with_min_rating(mut self, rating: f64) -> Self {
        self.min_rating = Some(rating);
        self
    }

    /// SQL `WHERE` clause (empty when unfiltered) and its numbered parameters.
    fn where_clause(&self) -> (String, Vec<Box<dyn ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();
        if let Some(year) = self.year {
            params.push(Box::new(year));
            conditions.push(format!("release_year = ?{}", params.len()));
        }
        if let Some(year) = self.year_start {
            params.push(Box::new(year));
            conditions.push(format!("release_year >= ?{}", params.len()));
        }
        if let Some(rating) = self.min_rating {
            params.push(Box::new(rating));
            conditions.push(format!("rating >= ?{}", params.len()));
        }
        if conditions.is_empty() {
            (String::new(), params)
        } else {
            (format!(" WHERE {}", conditions.join(" AND ")), params)
        }
    }
}

/// Repository for catalog movies and their stored embeddings.
pub struct MovieRepository {
    db: Arc<Database>,
}

impl MovieRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert or replace a movie's metadata. An existing embedding is kept.
    pub fn save(&self, movie: &Movie) -> Result<(), CinemapError> {
        let genres = serde_json::to_string(&movie.genres)?;
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO movies (id, title, description, release_year, genres, rating)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(id) DO UPDATE SET
                    title = excluded.title,
                    description = excluded.description,
                    release_year = excluded.release_year,
                    genres = excluded.genres,
                    rating = excluded.rating,
                    updated_at = strftime('%s', 'now')",
                rusqlite::params![
                    movie.id.0,
                    movie.title,
                    movie.description,
                    movie.release_year,
                    genres,
                    movie.rating,
                ],
            )
            .map_err(|e| CinemapError::Storage(format!("Failed to save movie: {}", e)))?;
            Ok(())
        })
    }

    /// Find a movie by ID.
    pub fn find_by_id(&self, id: MovieId) -> Result<Option<Movie>, CinemapError> {
        self.db.with_conn(|conn| {
            let sql = format!("SELECT {} FROM movies WHERE id = ?1", MOVIE_COLUMNS);
            conn.query_row(&sql, rusqlite::params![id.0], row_to_movie)
                .optional()
                .map_err(|e| CinemapError::Storage(e.to_string()))
        })
    }

    /// Load every movie with its raw embedding bytes, ordered by id.
    ///
    /// Rows with a NULL embedding are returned with `embedding: None`; the
    /// bytes are passed through untouched for the vector layer to validate.
    pub fn load_catalog(&self) -> Result<Vec<StoredMovie>, CinemapError> {
        self.db.with_conn(|conn| {
            let sql = format!("SELECT {}, embedding FROM movies ORDER BY id", MOVIE_COLUMNS);
            let mut stmt = conn
                .prepare(&sql)
                .map_err(|e| CinemapError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map([], |row| {
                    let movie = row_to_movie(row)?;
                    let embedding: Option<Vec<u8>> = row.get(6)?;
                    Ok(StoredMovie::new(movie, embedding))
                })
                .map_err(|e| CinemapError::Storage(e.to_string()))?;

            let mut catalog = Vec::new();
            for row in rows {
                catalog.push(row.map_err(|e| CinemapError::Storage(e.to_string()))?);
            }
            debug!(count = catalog.len(), "Catalog loaded");
            Ok(catalog)
        })
    }

    /// Movies that have no embedding recorded yet, ordered by id.
    pub fn find_missing_embeddings(&self) -> Result<Vec<Movie>, CinemapError> {
        let sql = format!(
            "SELECT {} FROM movies WHERE embedding IS NULL ORDER BY id",
            MOVIE_COLUMNS
        );
        self.query_movies(&sql, Vec::new())
    }

    /// A page of movies matching `filter`, newest release first.
    ///
    /// Movies without a release year come last; ties are ordered by id.
    pub fn list(
        &self,
        filter: &MovieFilter,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Movie>, CinemapError> {
        let (clause, mut params) = filter.where_clause();
        let sql = format!(
            "SELECT {} FROM movies{} ORDER BY release_year DESC, id LIMIT ?{} OFFSET ?{}",
            MOVIE_COLUMNS,
            clause,
            params.len() + 1,
            params.len() + 2
        );
        params.push(Box::new(limit as i64));
        params.push(Box::new(offset as i64));
        self.query_movies(&sql, params)
    }

    /// Up to `limit` movies matching `filter`, in random order.
    pub fn random(&self, filter: &MovieFilter, limit: u32) -> Result<Vec<Movie>, CinemapError> {
        let (clause, mut params) = filter.where_clause();
        let sql = format!(
            "SELECT {} FROM movies{} ORDER BY RANDOM() LIMIT ?{}",
            MOVIE_COLUMNS,
            clause,
            params.len() + 1
        );
        params.push(Box::new(limit as i64));
        self.query_movies(&sql, params)
    }

    /// Store the encoded embedding for a movie.
    ///
    /// Returns an error if the movie does not exist.
    pub fn set_embedding(&self, id: MovieId, embedding: &[u8]) -> Result<(), CinemapError> {
        self.db.with_conn(|conn| {
            let updated = conn
                .execute(
                    "UPDATE movies SET embedding = ?1, updated_at = strftime('%s', 'now')
                     WHERE id = ?2",
                    rusqlite::params![embedding, id.0],
                )
                .map_err(|e| CinemapError::Storage(format!("Failed to store embedding: {}", e)))?;
            if updated == 0 {
                return Err(CinemapError::Storage(format!("Movie {} not found", id)));
            }
            Ok(())
        })
    }

    /// Count catalog movies.
    pub fn count(&self) -> Result<u64, CinemapError> {
        self.db.with_conn(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM movies", [], |row| row.get(0))
                .map_err(|e| CinemapError::Storage(e.to_string()))?;
            Ok(count as u64)
        })
    }

    fn query_movies(
        &self,
        sql: &str,
        params: Vec<Box<dyn ToSql>>,
    ) -> Result<Vec<Movie>, CinemapError> {
        self.db.with_conn(|conn| {
            let params_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
            let mut stmt = conn
                .prepare(sql)
                .map_err(|e| CinemapError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map(params_refs.as_slice(), row_to_movie)
                .map_err(|e| CinemapError::Storage(e.to_string()))?;

            let mut movies = Vec::new();
            for row in rows {
                movies.push(row.map_err(|e| CinemapError::Storage(e.to_string()))?);
            }
            debug!(count = movies.len(), "Movie query returned");
            Ok(movies)
        })
    }
}

fn row_to_movie(row: &Row<'_>) -> rusqlite::Result<Movie> {
    let id: i64 = row.get(0)?;
    let genres_json: Option<String> = row.get(4)?;
    Ok(Movie {
        id: MovieId(id),
        title: row.get(1)?,
        description: row.get(2)?,
        release_year: row.get(3)?,
        genres: parse_genres(id, genres_json.as_deref()),
        rating: row.get(5)?,
    })
}

/// Parse the stored genre list. Anything other than a JSON string array
/// yields an empty list.
fn parse_genres(id: i64, raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(genres) => genres,
        Err(e) => {
            warn!(movie_id = id, error = %e, "Unparseable genres, treating as empty");
            Vec::new()
        }
    }
}
