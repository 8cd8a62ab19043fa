use std::fmt;

use serde::{Deserialize, Serialize};

use cinemap_core::types::{Movie, MovieId};

/// A point in the 2D projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub pc1: f64,
    pub pc2: f64,
}

impl Coordinate {
    pub fn new(pc1: f64, pc2: f64) -> Self {
        Self { pc1, pc2 }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Coordinate) -> f64 {
        ((self.pc1 - other.pc1).powi(2) + (self.pc2 - other.pc2).powi(2)).sqrt()
    }
}

/// One of the four regions of the projection split at the medians.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Quadrant {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [Quadrant::Q1, Quadrant::Q2, Quadrant::Q3, Quadrant::Q4];

    /// Quadrant of a point. A value equal to the median counts as being on
    /// the upper/right side of that axis.
    pub fn locate(coordinate: Coordinate, medians: Medians) -> Self {
        let right = coordinate.pc1 >= medians.pc1;
        let top = coordinate.pc2 >= medians.pc2;
        match (right, top) {
            (true, true) => Self::Q1,
            (false, true) => Self::Q2,
            (false, false) => Self::Q3,
            (true, false) => Self::Q4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Q1 => "Q1",
            Self::Q2 => "Q2",
            Self::Q3 => "Q3",
            Self::Q4 => "Q4",
        }
    }

    /// Case-insensitive parse of `Q1`..`Q4`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "Q1" => Some(Self::Q1),
            "Q2" => Some(Self::Q2),
            "Q3" => Some(Self::Q3),
            "Q4" => Some(Self::Q4),
            _ => None,
        }
    }

    /// Position of the quadrant in the plot.
    pub fn position(&self) -> &'static str {
        match self {
            Self::Q1 => "top-right",
            Self::Q2 => "top-left",
            Self::Q3 => "bottom-left",
            Self::Q4 => "bottom-right",
        }
    }
}

impl fmt::Display for Quadrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-axis medians of a projection batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Medians {
    pub pc1: f64,
    pub pc2: f64,
}

/// Axis-aligned rectangle in projection space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x0: f64,
    pub x1: f64,
    pub y0: f64,
    pub y1: f64,
}

/// Extent of a projection batch on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub pc1_min: f64,
    pub pc1_max: f64,
    pub pc2_min: f64,
    pub pc2_max: f64,
}

impl Bounds {
    /// `None` for an empty batch.
    pub fn from_coordinates(coordinates: &[Coordinate]) -> Option<Self> {
        let first = coordinates.first()?;
        let mut bounds = Self {
            pc1_min: first.pc1,
            pc1_max: first.pc1,
            pc2_min: first.pc2,
            pc2_max: first.pc2,
        };
        for c in &coordinates[1..] {
            bounds.pc1_min = bounds.pc1_min.min(c.pc1);
            bounds.pc1_max = bounds.pc1_max.max(c.pc1);
            bounds.pc2_min = bounds.pc2_min.min(c.pc2);
            bounds.pc2_max = bounds.pc2_max.max(c.pc2);
        }
        Some(bounds)
    }

    /// The rectangle a quadrant occupies, for shading it on a plot.
    pub fn quadrant_rect(&self, quadrant: Quadrant, medians: Medians) -> Rect {
        let (x0, x1) = match quadrant {
            Quadrant::Q1 | Quadrant::Q4 => (medians.pc1, self.pc1_max),
            Quadrant::Q2 | Quadrant::Q3 => (self.pc1_min, medians.pc1),
        };
        let (y0, y1) = match quadrant {
            Quadrant::Q1 | Quadrant::Q2 => (medians.pc2, self.pc2_max),
            Quadrant::Q3 | Quadrant::Q4 => (self.pc2_min, medians.pc2),
        };
        Rect { x0, x1, y0, y1 }
    }
}

/// A genre's share of a quadrant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreShare {
    pub genre: String,
    pub count: usize,
    /// Percentage of quadrant members, rounded to one decimal.
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatedMovie {
    pub id: MovieId,
    pub title: String,
    pub rating: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CentralMovie {
    pub id: MovieId,
    pub title: String,
    /// Euclidean distance to the quadrant centroid.
    pub distance: f64,
}

/// Statistics of a non-empty quadrant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuadrantStats {
    pub centroid: Coordinate,
    pub top_genres: Vec<GenreShare>,
    pub top_rated: Vec<RatedMovie>,
    pub closest_to_centroid: Vec<CentralMovie>,
}

/// Descriptive report for one quadrant.
///
/// An empty quadrant has `member_count == 0` and no statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuadrantReport {
    pub quadrant: Quadrant,
    pub member_count: usize,
    pub stats: Option<QuadrantStats>,
}

impl QuadrantReport {
    pub fn empty(quadrant: Quadrant) -> Self {
        Self {
            quadrant,
            member_count: 0,
            stats: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.member_count == 0
    }
}

/// A projected catalog movie with its quadrant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoviePoint {
    pub id: MovieId,
    pub title: String,
    pub genres: Vec<String>,
    pub rating: Option<f64>,
    pub release_year: Option<i32>,
    pub pc1: f64,
    pub pc2: f64,
    pub quadrant: Quadrant,
}

impl MoviePoint {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.pc1, self.pc2)
    }

    pub fn has_genre(&self, genre: &str) -> bool {
        self.genres.iter().any(|g| g == genre)
    }
}

/// Borrowed view of a quadrant member, as the summarizer consumes it.
#[derive(Debug, Clone, Copy)]
pub struct QuadrantMember<'a> {
    pub id: MovieId,
    pub title: &'a str,
    pub genres: &'a [String],
    pub rating: Option<f64>,
    pub coordinate: Coordinate,
}

impl<'a> QuadrantMember<'a> {
    pub fn new(movie: &'a Movie, coordinate: Coordinate) -> Self {
        Self {
            id: movie.id,
            title: &movie.title,
            genres: &movie.genres,
            rating: movie.rating,
            coordinate,
        }
    }
}

impl<'a> From<&'a MoviePoint> for QuadrantMember<'a> {
    fn from(point: &'a MoviePoint) -> Self {
        Self {
            id: point.id,
            title: &point.title,
            genres: &point.genres,
            rating: point.rating,
            coordinate: point.coordinate(),
        }
    }
}
