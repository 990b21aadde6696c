use crate::cents::cents;
use crate::tuner::{InstrumentTuner, SimpleInstrumentTuner};
use boretune_domain_acoustics::{InstrumentCalculator, PlayingRange, PlayingRangeConfig, PlayingRangeError};
use boretune_domain_instrument::{Fingering, GeometryError, Note, Tuning};
use log::debug;
use std::sync::Arc;

/// Per-fingering tuning error.
///
/// The returned vector is as long as `fingerings`; fingerings without a
/// target frequency contribute exactly 0.0.
pub trait Evaluator: Send + Sync {
    fn calculate_error_vector(
        &self,
        calc: &InstrumentCalculator,
        fingerings: &[Fingering],
    ) -> Result<Vec<f64>, GeometryError>;
}

fn check_all(calc: &InstrumentCalculator, fingerings: &[Fingering]) -> Result<(), GeometryError> {
    fingerings
        .iter()
        .try_for_each(|f| f.check_hole_count(calc.hole_count()))
}

/// Cents between predicted and target nominal frequency.
pub struct CentDeviationEvaluator {
    tuner: Arc<dyn InstrumentTuner>,
    range_penalty_factor: Option<f64>,
}

impl CentDeviationEvaluator {
    /// Deviation reported for a fingering that does not play.
    pub const UNPLAYABLE_DEVIATION: f64 = 1200.0;

    pub fn new(tuner: Arc<dyn InstrumentTuner>) -> Self {
        Self {
            tuner,
            range_penalty_factor: None,
        }
    }

    pub fn simple() -> Self {
        Self::new(Arc::new(SimpleInstrumentTuner::default()))
    }

    /// Amplifies the error by `factor` for the part of it that lies outside
    /// the predicted playing range.
    pub fn with_range_penalty(mut self, factor: f64) -> Self {
        self.range_penalty_factor = Some(factor);
        self
    }

    pub fn tuner(&self) -> &dyn InstrumentTuner {
        self.tuner.as_ref()
    }

    /// Signed cents of `predicted` against `target`, with the range penalty
    /// applied when configured.
    pub fn deviation(&self, target: f64, predicted: &Note) -> f64 {
        let Some(nominal) = predicted.frequency else {
            return Self::UNPLAYABLE_DEVIATION;
        };
        let d = cents(nominal, target);
        match self.range_penalty_factor {
            Some(factor) => d + (factor - 1.0) * outside_range(target, predicted),
            None => d,
        }
    }
}

/// Signed cents by which the predicted range misses `target`, with the sign
/// of (predicted - target). Zero inside the range.
fn outside_range(target: f64, predicted: &Note) -> f64 {
    if let Some(fmax) = predicted.frequency_max {
        if target > fmax {
            return cents(fmax, target);
        }
    }
    if let Some(fmin) = predicted.frequency_min {
        if target < fmin {
            return cents(fmin, target);
        }
    }
    0.0
}

impl Evaluator for CentDeviationEvaluator {
    fn calculate_error_vector(
        &self,
        calc: &InstrumentCalculator,
        fingerings: &[Fingering],
    ) -> Result<Vec<f64>, GeometryError> {
        check_all(calc, fingerings)?;
        let target = Tuning::new("target", calc.hole_count(), fingerings.to_vec());
        let predicted = self.tuner.predicted_tuning(calc, &target)?;
        Ok(fingerings
            .iter()
            .zip(predicted.fingerings.iter())
            .map(|(target, predicted)| {
                let Some(f) = target.target_frequency() else {
                    return 0.0;
                };
                match &predicted.note {
                    Some(note) => self.deviation(f, note),
                    None => Self::UNPLAYABLE_DEVIATION,
                }
            })
            .collect())
    }
}

/// Deviation reported by the playing-range evaluators when a fingering has
/// no playing range.
pub const RANGE_FAILURE_DEVIATION: f64 = 400.0;

fn range_errors<F>(
    calc: &InstrumentCalculator,
    fingerings: &[Fingering],
    config: &PlayingRangeConfig,
    target_of: fn(&Note) -> Option<f64>,
    predict: F,
) -> Result<Vec<f64>, GeometryError>
where
    F: Fn(&PlayingRange<'_>, &Note, f64) -> Result<f64, PlayingRangeError>,
{
    check_all(calc, fingerings)?;
    let mut errors = Vec::with_capacity(fingerings.len());
    for fingering in fingerings {
        let Some(note) = fingering.note.as_ref() else {
            errors.push(0.0);
            continue;
        };
        let Some(target) = target_of(note) else {
            errors.push(0.0);
            continue;
        };
        let range = PlayingRange::new(calc, fingering)?.with_config(*config);
        let error = match predict(&range, note, target) {
            Ok(f) => cents(f, target),
            Err(err) => {
                debug!("{}: {err}", fingering.display_name());
                RANGE_FAILURE_DEVIATION
            }
        };
        errors.push(error);
    }
    Ok(errors)
}

/// Cents between the upper playing limit and the note's maximum frequency.
#[derive(Clone, Debug, Default)]
pub struct FmaxEvaluator {
    config: PlayingRangeConfig,
}

impl FmaxEvaluator {
    pub fn new(config: PlayingRangeConfig) -> Self {
        Self { config }
    }
}

impl Evaluator for FmaxEvaluator {
    fn calculate_error_vector(
        &self,
        calc: &InstrumentCalculator,
        fingerings: &[Fingering],
    ) -> Result<Vec<f64>, GeometryError> {
        range_errors(
            calc,
            fingerings,
            &self.config,
            |note| note.frequency_max.or_else(|| note.target_frequency()),
            |range, _note, target| range.find_x_zero(target),
        )
    }
}

/// Cents between the lower playing limit and the note's minimum frequency.
#[derive(Clone, Debug, Default)]
pub struct FminEvaluator {
    config: PlayingRangeConfig,
}

impl FminEvaluator {
    pub fn new(config: PlayingRangeConfig) -> Self {
        Self { config }
    }
}

impl Evaluator for FminEvaluator {
    fn calculate_error_vector(
        &self,
        calc: &InstrumentCalculator,
        fingerings: &[Fingering],
    ) -> Result<Vec<f64>, GeometryError> {
        range_errors(
            calc,
            fingerings,
            &self.config,
            |note| note.frequency_min.or_else(|| note.target_frequency()),
            |range, note, target| {
                let near = note
                    .frequency_max
                    .or_else(|| note.target_frequency())
                    .unwrap_or(target);
                let fmax = range.find_x_zero(near)?;
                range.find_fmin(fmax)
            },
        )
    }
}

/// Normalised reactance `X / Z0` at each target frequency. No root
/// finding, so it is cheap enough for a first rough pass.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReactanceEvaluator;

impl Evaluator for ReactanceEvaluator {
    fn calculate_error_vector(
        &self,
        calc: &InstrumentCalculator,
        fingerings: &[Fingering],
    ) -> Result<Vec<f64>, GeometryError> {
        check_all(calc, fingerings)?;
        let z0 = calc.z0();
        fingerings
            .iter()
            .map(|fingering| match fingering.target_frequency() {
                Some(f) => Ok(calc.calc_z_for(f, fingering)?.im / z0),
                None => Ok(0.0),
            })
            .collect()
    }
}
