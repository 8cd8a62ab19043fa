//! Principal-component projection of the embedding batch to two dimensions.
//!
//! The top two principal axes are the leading eigenvectors of the sample
//! covariance `XᵀX / (n - 1)` of the centered batch, found with a symmetric
//! eigendecomposition. When the batch has fewer samples than dimensions the
//! smaller Gram matrix `XXᵀ / (n - 1)` is decomposed instead; it shares the
//! nonzero eigenvalues, and each axis is recovered as `Xᵀu` normalized.
//!
//! # Sign convention
//!
//! An eigenvector is only defined up to sign. Each axis is flipped so that
//! its largest-magnitude component is positive (the lowest index wins ties),
//! so identical input always yields identical coordinates.

use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::debug;

use cinemap_core::config::AnalyticsConfig;

use crate::error::InsightError;
use crate::types::Coordinate;

/// Variance below this fraction of the total is treated as zero.
const ZERO_VARIANCE_RATIO: f64 = 1e-12;

/// Result of projecting a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    /// One coordinate per input vector, in input order.
    pub coordinates: Vec<Coordinate>,
    /// Unit principal axes in input space; an all-zero axis carries no variance.
    pub axes: [Vec<f64>; 2],
    /// Fraction of the total variance captured by each axis.
    pub explained_variance: [f64; 2],
}

/// Two-component PCA.
#[derive(Debug, Clone, Copy)]
pub struct Projector {
    max_iterations: usize,
    tolerance: f64,
}

struct PrincipalAxis {
    direction: Array1<f64>,
    variance: f64,
}

impl PrincipalAxis {
    fn zero(dimensions: usize) -> Self {
        Self {
            direction: Array1::zeros(dimensions),
            variance: 0.0,
        }
    }
}

impl Projector {
    /// `max_iterations` caps the eigen solver's QR sweeps and `tolerance` is
    /// its off-diagonal convergence threshold.
    pub fn new(max_iterations: usize, tolerance: f64) -> Self {
        Self {
            max_iterations: max_iterations.max(1),
            tolerance,
        }
    }

    pub fn from_config(config: &AnalyticsConfig) -> Self {
        Self::new(config.max_iterations, config.tolerance)
    }

    /// Project every vector onto the batch's top two principal axes.
    ///
    /// Needs at least two vectors of a common width of at least two.
    pub fn project<V: AsRef<[f32]>>(&self, vectors: &[V]) -> Result<Projection, InsightError> {
        let samples = vectors.len();
        let dimensions = vectors.first().map(|v| v.as_ref().len()).unwrap_or(0);
        if samples < 2 || dimensions < 2 {
            return Err(InsightError::InsufficientData {
                samples,
                dimensions,
            });
        }
        if let Some(bad) = vectors.iter().find(|v| v.as_ref().len() != dimensions) {
            return Err(InsightError::DimensionMismatch {
                expected: dimensions,
                actual: bad.as_ref().len(),
            });
        }

        let mut x = Array2::from_shape_fn((samples, dimensions), |(i, j)| {
            vectors[i].as_ref()[j] as f64
        });
        let mean = x
            .mean_axis(Axis(0))
            .ok_or(InsightError::InsufficientData {
                samples,
                dimensions,
            })?;
        x -= &mean;

        let denom = (samples - 1) as f64;
        let total_variance = x.iter().map(|v| v * v).sum::<f64>() / denom;

        let [first, second] = self.principal_axes(&x, denom, total_variance)?;

        let pc1 = x.dot(&first.direction);
        let pc2 = x.dot(&second.direction);
        let coordinates = pc1
            .iter()
            .zip(pc2.iter())
            .map(|(&a, &b)| Coordinate::new(a, b))
            .collect();

        let explained_variance = if total_variance > 0.0 {
            [
                first.variance / total_variance,
                second.variance / total_variance,
            ]
        } else {
            [0.0, 0.0]
        };
        debug!(
            samples,
            dimensions,
            pc1_variance = explained_variance[0],
            pc2_variance = explained_variance[1],
            "Projection computed"
        );

        Ok(Projection {
            coordinates,
            axes: [first.direction.to_vec(), second.direction.to_vec()],
            explained_variance,
        })
    }

    /// The two leading eigenvectors of the covariance of the centered batch.
    fn principal_axes(
        &self,
        x: &Array2<f64>,
        denom: f64,
        total_variance: f64,
    ) -> Result<[PrincipalAxis; 2], InsightError> {
        let (samples, dimensions) = x.dim();
        let use_gram = samples < dimensions;
        let product = if use_gram {
            x.dot(&x.t())
        } else {
            x.t().dot(x)
        };
        let size = product.nrows();
        let matrix = DMatrix::from_fn(size, size, |i, j| product[[i, j]] / denom);

        let eigen = SymmetricEigen::try_new(matrix, self.tolerance, self.max_iterations).ok_or(
            InsightError::Decomposition {
                max_iterations: self.max_iterations,
            },
        )?;

        // Descending eigenvalue; a stable sort keeps the lower index on ties.
        let mut order: Vec<usize> = (0..size).collect();
        order.sort_by(|&a, &b| eigen.eigenvalues[b].total_cmp(&eigen.eigenvalues[a]));

        let floor = total_variance * ZERO_VARIANCE_RATIO;
        let axis = |rank: usize| -> PrincipalAxis {
            let Some(&column) = order.get(rank) else {
                return PrincipalAxis::zero(dimensions);
            };
            let variance = eigen.eigenvalues[column];
            if variance <= floor {
                return PrincipalAxis::zero(dimensions);
            }
            let eigenvector = Array1::from_iter(eigen.eigenvectors.column(column).iter().copied());
            let direction = if use_gram {
                x.t().dot(&eigenvector)
            } else {
                eigenvector
            };
            match normalized(direction) {
                Some(mut direction) => {
                    fix_sign(&mut direction);
                    PrincipalAxis {
                        direction,
                        variance,
                    }
                }
                None => PrincipalAxis::zero(dimensions),
            }
        };

        Ok([axis(0), axis(1)])
    }
}

impl Default for Projector {
    fn default() -> Self {
        Self::from_config(&AnalyticsConfig::default())
    }
}

fn normalized(mut v: Array1<f64>) -> Option<Array1<f64>> {
    let norm = v.dot(&v).sqrt();
    if norm == 0.0 || !norm.is_finite() {
        return None;
    }
    v /= norm;
    Some(v)
}

/// Make the largest-magnitude component positive; the first index wins ties.
fn fix_sign(v: &mut Array1<f64>) {
    let mut pivot = 0.0f64;
    for &c in v.iter() {
        if c.abs() > pivot.abs() {
            pivot = c;
        }
    }
    if pivot < 0.0 {
        v.mapv_inplace(|c| -c);
    }
}
