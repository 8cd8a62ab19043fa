//! Median split of a projection into four quadrants.

use serde::{Deserialize, Serialize};

use crate::types::{Coordinate, Medians, Quadrant};

/// Quadrant labels for a batch, aligned with the input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// `None` for an empty batch.
    pub medians: Option<Medians>,
    pub labels: Vec<Quadrant>,
}

impl Classification {
    /// Member count per quadrant, indexed Q1..Q4.
    pub fn counts(&self) -> [usize; 4] {
        let mut counts = [0; 4];
        for label in &self.labels {
            counts[*label as usize] += 1;
        }
        counts
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct QuadrantClassifier;

impl QuadrantClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Split the batch at the PC1 and PC2 medians.
    ///
    /// Points on a median land on the upper/right side of it.
    pub fn classify(&self, coordinates: &[Coordinate]) -> Classification {
        let pc1: Vec<f64> = coordinates.iter().map(|c| c.pc1).collect();
        let pc2: Vec<f64> = coordinates.iter().map(|c| c.pc2).collect();

        let medians = match (median(&pc1), median(&pc2)) {
            (Some(m1), Some(m2)) => Medians { pc1: m1, pc2: m2 },
            _ => {
                return Classification {
                    medians: None,
                    labels: Vec::new(),
                }
            }
        };

        let labels = coordinates
            .iter()
            .map(|c| Quadrant::locate(*c, medians))
            .collect();
        Classification {
            medians: Some(medians),
            labels,
        }
    }
}

/// Standard median: the middle value, or the mean of the two middle values
/// for an even count. `None` for an empty slice.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}
