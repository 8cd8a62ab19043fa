//! Per-quadrant descriptive statistics.

use std::collections::HashMap;

use cinemap_core::config::AnalyticsConfig;

use crate::types::{
    CentralMovie, Coordinate, GenreShare, Quadrant, QuadrantMember, QuadrantReport, QuadrantStats,
    RatedMovie,
};

/// Builds [`QuadrantReport`]s from quadrant members.
///
/// Members are expected in a stable order (the analytics engine passes them
/// in ascending id order); ties in rating or centroid distance keep it.
#[derive(Debug, Clone, Copy)]
pub struct QuadrantSummarizer {
    top_genres: usize,
    top_rated: usize,
    closest_to_centroid: usize,
}

impl QuadrantSummarizer {
    pub fn new(top_genres: usize, top_rated: usize, closest_to_centroid: usize) -> Self {
        Self {
            top_genres,
            top_rated,
            closest_to_centroid,
        }
    }

    pub fn from_config(config: &AnalyticsConfig) -> Self {
        Self::new(
            config.top_genres,
            config.top_rated,
            config.closest_to_centroid,
        )
    }

    /// Summarize one quadrant. An empty member list yields an empty report.
    pub fn summarize(&self, members: &[QuadrantMember<'_>], quadrant: Quadrant) -> QuadrantReport {
        if members.is_empty() {
            return QuadrantReport::empty(quadrant);
        }

        let mut top_genres = self.genre_composition(members);
        top_genres.truncate(self.top_genres);

        let centroid = centroid(members);

        QuadrantReport {
            quadrant,
            member_count: members.len(),
            stats: Some(QuadrantStats {
                centroid,
                top_genres,
                top_rated: self.top_rated(members),
                closest_to_centroid: self.closest_to(members, centroid),
            }),
        }
    }

    /// Every genre in the quadrant with its count, most frequent first.
    /// Equal counts keep the order in which the genres were first seen.
    pub fn genre_composition(&self, members: &[QuadrantMember<'_>]) -> Vec<GenreShare> {
        let mut order: Vec<(&str, usize)> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();
        for member in members {
            for genre in member.genres {
                match index.get(genre.as_str()) {
                    Some(&i) => order[i].1 += 1,
                    None => {
                        index.insert(genre.as_str(), order.len());
                        order.push((genre.as_str(), 1));
                    }
                }
            }
        }
        order.sort_by(|a, b| b.1.cmp(&a.1));

        let total = members.len();
        order
            .into_iter()
            .map(|(genre, count)| GenreShare {
                genre: genre.to_string(),
                count,
                percent: percent_of(count, total),
            })
            .collect()
    }

    fn top_rated(&self, members: &[QuadrantMember<'_>]) -> Vec<RatedMovie> {
        let mut ranked: Vec<&QuadrantMember<'_>> = members.iter().collect();
        ranked.sort_by(|a, b| rating_key(b).total_cmp(&rating_key(a)));
        ranked
            .into_iter()
            .take(self.top_rated)
            .map(|m| RatedMovie {
                id: m.id,
                title: m.title.to_string(),
                rating: m.rating,
            })
            .collect()
    }

    fn closest_to(&self, members: &[QuadrantMember<'_>], centroid: Coordinate) -> Vec<CentralMovie> {
        let mut ranked: Vec<CentralMovie> = members
            .iter()
            .map(|m| CentralMovie {
                id: m.id,
                title: m.title.to_string(),
                distance: m.coordinate.distance(&centroid),
            })
            .collect();
        ranked.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        ranked.truncate(self.closest_to_centroid);
        ranked
    }

    /// Human-readable summary of a report.
    pub fn describe(&self, report: &QuadrantReport) -> String {
        let stats = match &report.stats {
            Some(stats) if report.member_count > 0 => stats,
            _ => return format!("{}: No movies in this quadrant.", report.quadrant),
        };

        let names: Vec<&str> = stats.top_genres.iter().map(|g| g.genre.as_str()).collect();
        let mix = match names.as_slice() {
            [] => "movies with no listed genres".to_string(),
            [a] => format!("mostly {} movies", a),
            [a, b] => format!("mostly {} and {} movies", a, b),
            [a, b, c, ..] => format!("mostly {}, {}, and {} movies", a, b, c),
        };

        let mut text = format!(
            "{} ({} movies): This quadrant contains {}.",
            report.quadrant, report.member_count, mix
        );
        if !stats.top_genres.is_empty() {
            let details: Vec<String> = stats
                .top_genres
                .iter()
                .map(|g| format!("{} ({:.1}%)", g.genre, g.percent))
                .collect();
            text.push_str(&format!(" Top genres: {}.", details.join(", ")));
        }
        if !stats.top_rated.is_empty() {
            let rated: Vec<String> = stats
                .top_rated
                .iter()
                .map(|m| match m.rating {
                    Some(r) => format!("{} ({})", m.title, r),
                    None => format!("{} (unrated)", m.title),
                })
                .collect();
            text.push_str(&format!(" Top rated: {}.", rated.join(", ")));
        }
        if !stats.closest_to_centroid.is_empty() {
            let central: Vec<String> = stats
                .closest_to_centroid
                .iter()
                .map(|m| format!("{} (dist: {:.2})", m.title, m.distance))
                .collect();
            text.push_str(&format!(" Closest to quadrant center: {}.", central.join(", ")));
        }
        text
    }
}

impl Default for QuadrantSummarizer {
    fn default() -> Self {
        Self::from_config(&AnalyticsConfig::default())
    }
}

/// Unrated movies order as 0.
fn rating_key(member: &QuadrantMember<'_>) -> f64 {
    member.rating.unwrap_or(0.0)
}

fn centroid(members: &[QuadrantMember<'_>]) -> Coordinate {
    let n = members.len() as f64;
    let (sum1, sum2) = members.iter().fold((0.0, 0.0), |(a, b), m| {
        (a + m.coordinate.pc1, b + m.coordinate.pc2)
    });
    Coordinate::new(sum1 / n, sum2 / n)
}

/// Percentage rounded to one decimal.
fn percent_of(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (1000.0 * count as f64 / total as f64).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinemap_core::types::MovieId;

    struct Fixture {
        id: i64,
        title: &'static str,
        genres: Vec<String>,
        rating: Option<f64>,
        at: (f64, f64),
    }

    fn fixture(
        id: i64,
        title: &'static str,
        genres: &[&str],
        rating: Option<f64>,
        at: (f64, f64),
    ) -> Fixture {
        Fixture {
            id,
            title,
            genres: genres.iter().map(|g| g.to_string()).collect(),
            rating,
            at,
        }
    }

    fn members(fixtures: &[Fixture]) -> Vec<QuadrantMember<'_>> {
        fixtures
            .iter()
            .map(|f| QuadrantMember {
                id: MovieId(f.id),
                title: f.title,
                genres: &f.genres,
                rating: f.rating,
                coordinate: Coordinate::new(f.at.0, f.at.1),
            })
            .collect()
    }

    fn sample() -> Vec<Fixture> {
        vec![
            fixture(1, "Alien", &["Horror", "Sci-Fi"], Some(8.5), (1.0, 1.0)),
            fixture(2, "Aliens", &["Action", "Sci-Fi"], Some(8.4), (2.0, 1.0)),
            fixture(3, "Babe", &["Family"], None, (3.0, 4.0)),
            fixture(4, "Heat", &["Action", "Crime"], Some(8.3), (2.0, 2.0)),
        ]
    }

    #[test]
    fn test_empty_quadrant_has_no_stats() {
        let report = QuadrantSummarizer::default().summarize(&[], Quadrant::Q3);
        assert_eq!(report.quadrant, Quadrant::Q3);
        assert_eq!(report.member_count, 0);
        assert!(report.stats.is_none());
        assert!(report.is_empty());
    }

    #[test]
    fn test_genre_counts_with_first_seen_ties() {
        let fixtures = sample();
        let composition = QuadrantSummarizer::default().genre_composition(&members(&fixtures));

        let names: Vec<&str> = composition.iter().map(|g| g.genre.as_str()).collect();
        // Sci-Fi and Action both appear twice; Sci-Fi was seen first.
        assert_eq!(names, vec!["Sci-Fi", "Action", "Horror", "Family", "Crime"]);
        assert_eq!(composition[0].count, 2);
        assert_eq!(composition[0].percent, 50.0);
        assert_eq!(composition[2].percent, 25.0);
    }

    #[test]
    fn test_percent_rounded_to_one_decimal() {
        assert_eq!(percent_of(1, 3), 33.3);
        assert_eq!(percent_of(2, 3), 66.7);
        assert_eq!(percent_of(3, 3), 100.0);
    }

    #[test]
    fn test_top_genres_truncated() {
        let fixtures = vec![fixture(
            1,
            "Everything",
            &["A", "B", "C", "D", "E", "F", "G"],
            None,
            (0.0, 0.0),
        )];
        let report = QuadrantSummarizer::default().summarize(&members(&fixtures), Quadrant::Q1);
        assert_eq!(report.stats.unwrap().top_genres.len(), 5);
    }

    #[test]
    fn test_top_rated_treats_missing_as_zero() {
        let fixtures = vec![
            fixture(1, "Unrated", &[], None, (0.0, 0.0)),
            fixture(2, "Panned", &[], Some(-1.0), (0.0, 0.0)),
            fixture(3, "Fine", &[], Some(6.0), (0.0, 0.0)),
        ];
        let report = QuadrantSummarizer::new(5, 3, 3).summarize(&members(&fixtures), Quadrant::Q2);
        let ids: Vec<i64> = report
            .stats
            .unwrap()
            .top_rated
            .iter()
            .map(|m| m.id.0)
            .collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_closest_to_centroid() {
        let fixtures = sample();
        let report = QuadrantSummarizer::default().summarize(&members(&fixtures), Quadrant::Q1);
        let stats = report.stats.unwrap();

        assert_eq!(stats.centroid, Coordinate::new(2.0, 2.0));
        let closest: Vec<i64> = stats.closest_to_centroid.iter().map(|m| m.id.0).collect();
        assert_eq!(closest, vec![4, 2, 1]);
        assert_eq!(stats.closest_to_centroid[0].distance, 0.0);
        for pair in stats.closest_to_centroid.windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
        }
    }

    #[test]
    fn test_describe_full_report() {
        let fixtures = sample();
        let summarizer = QuadrantSummarizer::default();
        let report = summarizer.summarize(&members(&fixtures), Quadrant::Q1);

        let text = summarizer.describe(&report);
        assert!(text.starts_with(
            "Q1 (4 movies): This quadrant contains mostly Sci-Fi, Action, and Horror movies."
        ));
        assert!(text.contains("Top genres: Sci-Fi (50.0%), Action (50.0%), Horror (25.0%)"));
        assert!(text.contains("Top rated: Alien (8.5), Aliens (8.4), Heat (8.3)."));
        assert!(text.contains("Closest to quadrant center: Heat (dist: 0.00)"));
    }

    #[test]
    fn test_describe_empty_and_single_genre() {
        let summarizer = QuadrantSummarizer::default();
        assert_eq!(
            summarizer.describe(&QuadrantReport::empty(Quadrant::Q4)),
            "Q4: No movies in this quadrant."
        );

        let fixtures = vec![fixture(1, "Up", &["Family"], None, (0.0, 0.0))];
        let report = summarizer.summarize(&members(&fixtures), Quadrant::Q2);
        let text = summarizer.describe(&report);
        assert!(text.starts_with("Q2 (1 movies): This quadrant contains mostly Family movies."));
        assert!(text.contains("Up (unrated)"));
    }
}
