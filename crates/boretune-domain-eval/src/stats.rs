use boretune_domain_instrument::Fingering;
use serde::{Deserialize, Serialize};

/// Summary of an error vector over the fingerings that have a target.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorStatistics {
    pub count: usize,
    pub mean: f64,
    pub rms: f64,
    pub max_abs: f64,
    /// Index into the fingering list of the largest absolute error.
    pub worst: Option<usize>,
}

impl ErrorStatistics {
    pub fn from_errors(fingerings: &[Fingering], errors: &[f64]) -> Self {
        let mut stats = Self::default();
        let mut sum = 0.0;
        let mut sum_sq = 0.0;
        for (index, (fingering, &error)) in fingerings.iter().zip(errors).enumerate() {
            if fingering.target_frequency().is_none() {
                continue;
            }
            stats.count += 1;
            sum += error;
            sum_sq += error * error;
            if stats.worst.is_none() || error.abs() > stats.max_abs {
                stats.max_abs = error.abs();
                stats.worst = Some(index);
            }
        }
        if stats.count > 0 {
            let n = stats.count as f64;
            stats.mean = sum / n;
            stats.rms = (sum_sq / n).sqrt();
        }
        stats
    }
}
