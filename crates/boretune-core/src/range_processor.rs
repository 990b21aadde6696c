use crate::objective::ObjectiveError;
use boretune_ports::optimizer::Bounds;
use serde::{Deserialize, Serialize};

/// Seeds multi-start runs on a grid over selected dimensions.
///
/// The first varying dimension takes evenly spaced cell centres; further
/// dimensions take van der Corput values in bases 2, 3, 5, ... so the starts
/// spread out instead of lining up on a diagonal. Dimensions not listed keep
/// the base point's value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridRangeProcessor {
    dimensions: Vec<usize>,
    points: usize,
}

const PRIMES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

impl GridRangeProcessor {
    pub fn new(dimensions: Vec<usize>, points: usize) -> Self {
        Self { dimensions, points }
    }

    pub fn dimensions(&self) -> &[usize] {
        &self.dimensions
    }

    pub fn points(&self) -> usize {
        self.points
    }

    pub fn validate(&self, nr_dimensions: usize) -> Result<(), ObjectiveError> {
        for &index in &self.dimensions {
            if index >= nr_dimensions {
                return Err(ObjectiveError::InvalidRangeProcessor {
                    index,
                    dimensions: nr_dimensions,
                });
            }
        }
        Ok(())
    }

    /// `points` starting vectors inside `bounds`, based on `base`.
    pub fn starts(&self, bounds: &Bounds, base: &[f64]) -> Vec<Vec<f64>> {
        let base = bounds.clamped(base);
        let n = self.points.max(1);
        (0..n)
            .map(|j| {
                let mut x = base.clone();
                for (m, &dim) in self.dimensions.iter().enumerate() {
                    if dim >= x.len() {
                        continue;
                    }
                    let fraction = if m == 0 {
                        (j as f64 + 0.5) / n as f64
                    } else {
                        van_der_corput(j as u64 + 1, PRIMES[(m - 1) % PRIMES.len()])
                    };
                    x[dim] = bounds.lower()[dim] + fraction * bounds.width(dim);
                }
                x
            })
            .collect()
    }
}

/// Radical inverse of `index` in `base`, in [0, 1).
pub fn van_der_corput(mut index: u64, base: u64) -> f64 {
    let mut value = 0.0;
    let mut scale = 1.0 / base as f64;
    while index > 0 {
        value += (index % base) as f64 * scale;
        index /= base;
        scale /= base as f64;
    }
    value
}
