use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// Identifiers
// =============================================================================

/// Opaque catalog identifier of a movie.
///
/// Ordered so that ranking ties can be broken deterministically by id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovieId(pub i64);

impl fmt::Display for MovieId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for MovieId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

// =============================================================================
// Catalog records
// =============================================================================

/// Descriptive metadata for a catalog movie.
///
/// Read-only input to the similarity and analytics code.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Genres in the order the catalog lists them.
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub release_year: Option<i32>,
}

impl Movie {
    /// Create a movie with only an id and title.
    pub fn new(id: impl Into<MovieId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            genres: Vec::new(),
            rating: None,
            release_year: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genres = genres.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn with_release_year(mut self, year: i32) -> Self {
        self.release_year = Some(year);
        self
    }

    /// Text handed to the embedding model: title, description, then genres,
    /// space separated. Blank parts are skipped.
    pub fn embedding_text(&self) -> String {
        let mut parts: Vec<&str> = Vec::with_capacity(2 + self.genres.len());
        parts.push(self.title.trim());
        if let Some(ref description) = self.description {
            parts.push(description.trim());
        }
        parts.extend(self.genres.iter().map(|g| g.trim()));
        parts.retain(|p| !p.is_empty());
        parts.join(" ")
    }

    /// Exact, case-sensitive genre membership.
    pub fn has_genre(&self, genre: &str) -> bool {
        self.genres.iter().any(|g| g == genre)
    }
}

/// A movie as handed over by the persistence layer: metadata plus the raw
/// little-endian f32 embedding bytes, if any were recorded.
#[derive(Clone, Debug, PartialEq)]
pub struct StoredMovie {
    pub movie: Movie,
    pub embedding: Option<Vec<u8>>,
}

impl StoredMovie {
    pub fn new(movie: Movie, embedding: Option<Vec<u8>>) -> Self {
        Self { movie, embedding }
    }
}
