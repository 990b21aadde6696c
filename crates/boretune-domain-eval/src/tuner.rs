use boretune_domain_acoustics::{
    InstrumentCalculator, PlayingRange, PlayingRangeConfig, PlayingRangeError,
};
use boretune_domain_instrument::{Fingering, GeometryError, Note, Tuning};
use log::debug;
use std::f64::consts::PI;

/// A straight line through two (target frequency, value) points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TuningBasis {
    pub low_frequency: f64,
    pub low_value: f64,
    pub high_frequency: f64,
    pub high_value: f64,
}

impl TuningBasis {
    pub fn value_at(&self, frequency: f64) -> f64 {
        let span = self.high_frequency - self.low_frequency;
        if span.abs() < f64::EPSILON * self.high_frequency.abs() {
            return self.low_value;
        }
        let t = (frequency - self.low_frequency) / span;
        self.low_value + t * (self.high_value - self.low_value)
    }
}

/// Predicts the sounding frequencies of a tuning's fingerings.
pub trait InstrumentTuner: Send + Sync {
    fn playing_range_config(&self) -> &PlayingRangeConfig;

    /// Basis derived from the full target tuning, or `None` when the model
    /// needs none or it cannot be located.
    fn basis(&self, _calc: &InstrumentCalculator, _target: &Tuning) -> Option<TuningBasis> {
        None
    }

    /// `fingering` must match the calculator's hole count.
    fn predicted_note(
        &self,
        calc: &InstrumentCalculator,
        fingering: &Fingering,
        basis: Option<&TuningBasis>,
    ) -> Result<Note, PlayingRangeError>;

    fn predicted_tuning(
        &self,
        calc: &InstrumentCalculator,
        target: &Tuning,
    ) -> Result<Tuning, GeometryError> {
        target.check_hole_count(calc.hole_count())?;
        let basis = self.basis(calc, target);
        let fingerings = target
            .fingerings
            .iter()
            .map(|fingering| {
                let note = self
                    .predicted_note(calc, fingering, basis.as_ref())
                    .unwrap_or_else(|err| {
                        debug!("{}: {err}", fingering.display_name());
                        unpredicted(fingering)
                    });
                Fingering {
                    note: Some(note),
                    ..fingering.clone()
                }
            })
            .collect();
        Ok(Tuning::new(
            target.name.clone(),
            target.number_of_holes,
            fingerings,
        ))
    }
}

fn playing_range<'a>(
    calc: &'a InstrumentCalculator,
    fingering: &'a Fingering,
    config: &PlayingRangeConfig,
) -> Result<PlayingRange<'a>, PlayingRangeError> {
    Ok(PlayingRange::new(calc, fingering)?.with_config(*config))
}

fn unpredicted(fingering: &Fingering) -> Note {
    Note {
        name: fingering.note.as_ref().and_then(|n| n.name.clone()),
        ..Note::default()
    }
}

/// Fingering plays where the reactance crosses zero.
#[derive(Clone, Debug, Default)]
pub struct SimpleInstrumentTuner {
    config: PlayingRangeConfig,
}

impl SimpleInstrumentTuner {
    pub fn new(config: PlayingRangeConfig) -> Self {
        Self { config }
    }
}

impl InstrumentTuner for SimpleInstrumentTuner {
    fn playing_range_config(&self) -> &PlayingRangeConfig {
        &self.config
    }

    fn predicted_note(
        &self,
        calc: &InstrumentCalculator,
        fingering: &Fingering,
        _basis: Option<&TuningBasis>,
    ) -> Result<Note, PlayingRangeError> {
        let Some(target) = fingering.target_frequency() else {
            return Ok(unpredicted(fingering));
        };
        let nominal = playing_range(calc, fingering, &self.config)?.find_x_zero(target)?;
        Ok(Note {
            frequency: Some(nominal),
            ..unpredicted(fingering)
        })
    }
}

/// fmin, fmax and the target clamped into that range.
fn range_sample(
    range: &PlayingRange<'_>,
    target: f64,
) -> Result<(f64, f64, f64), PlayingRangeError> {
    let fmax = range.find_x_zero(target)?;
    let fmin = range.find_fmin(fmax)?;
    let f = target.clamp(fmin, fmax);
    Ok((fmin, fmax, f))
}

fn extreme_fingerings(target: &Tuning) -> Option<(&Fingering, &Fingering)> {
    let (low, high) = target.extreme_targets()?;
    Some((&target.fingerings[low], &target.fingerings[high]))
}

/// Fingering plays where X/R equals a value interpolated linearly between
/// the lowest and highest notes of the tuning.
#[derive(Clone, Debug, Default)]
pub struct LinearXInstrumentTuner {
    config: PlayingRangeConfig,
}

impl LinearXInstrumentTuner {
    pub fn new(config: PlayingRangeConfig) -> Self {
        Self { config }
    }

    fn basis_point(
        &self,
        calc: &InstrumentCalculator,
        fingering: &Fingering,
    ) -> Result<(f64, f64), PlayingRangeError> {
        let target = fingering
            .target_frequency()
            .ok_or(PlayingRangeError::NoTarget)?;
        let range = playing_range(calc, fingering, &self.config)?;
        let (_, _, f) = range_sample(&range, target)?;
        Ok((target, range.z_ratio(f)))
    }
}

fn with_range(range: &PlayingRange<'_>, nominal: f64, note: Note) -> Note {
    let fmax = range.find_x_zero(nominal).ok();
    let fmin = fmax.and_then(|fmax| range.find_fmin(fmax).ok());
    Note {
        frequency: Some(nominal),
        frequency_min: fmin,
        frequency_max: fmax,
        ..note
    }
}

impl InstrumentTuner for LinearXInstrumentTuner {
    fn playing_range_config(&self) -> &PlayingRangeConfig {
        &self.config
    }

    fn basis(&self, calc: &InstrumentCalculator, target: &Tuning) -> Option<TuningBasis> {
        let (low, high) = extreme_fingerings(target)?;
        let (low_frequency, low_value) = self.basis_point(calc, low).ok()?;
        let (high_frequency, high_value) = self.basis_point(calc, high).ok()?;
        Some(TuningBasis {
            low_frequency,
            low_value,
            high_frequency,
            high_value,
        })
    }

    fn predicted_note(
        &self,
        calc: &InstrumentCalculator,
        fingering: &Fingering,
        basis: Option<&TuningBasis>,
    ) -> Result<Note, PlayingRangeError> {
        let Some(target) = fingering.target_frequency() else {
            return Ok(unpredicted(fingering));
        };
        let range = playing_range(calc, fingering, &self.config)?;
        let nominal = match basis {
            Some(basis) => range.find_z_ratio(target, basis.value_at(target))?,
            None => range.find_x_zero(target)?,
        };
        Ok(with_range(&range, nominal, unpredicted(fingering)))
    }
}

/// Like [`LinearXInstrumentTuner`], but the interpolated quantity is the
/// jet velocity implied by X/R and the jet length. Reed mouthpieces have no
/// jet and use the linear-X model.
#[derive(Clone, Debug, Default)]
pub struct LinearVInstrumentTuner {
    config: PlayingRangeConfig,
}

/// Keeps `tan` away from its poles.
const MAX_JET_PHASE: f64 = 1.5;

impl LinearVInstrumentTuner {
    pub fn new(config: PlayingRangeConfig) -> Self {
        Self { config }
    }

    fn jet_length(calc: &InstrumentCalculator) -> Option<f64> {
        let mouthpiece = &calc.instrument().mouthpiece;
        if mouthpiece.kind.is_reed() {
            return None;
        }
        mouthpiece.kind.jet_length().filter(|l| *l > 0.0)
    }

    fn linear_x(&self) -> LinearXInstrumentTuner {
        LinearXInstrumentTuner::new(self.config)
    }

    pub fn velocity(frequency: f64, jet_length: f64, z_ratio: f64) -> f64 {
        2.0 * PI * frequency * jet_length / (0.5 * (0.5 * PI + z_ratio.atan()))
    }

    /// X/R a jet of `velocity` needs at `frequency`.
    pub fn z_ratio_for(frequency: f64, jet_length: f64, velocity: f64) -> f64 {
        let phase = 2.0 * PI * frequency * jet_length / (0.5 * velocity) - 0.5 * PI;
        phase.clamp(-MAX_JET_PHASE, MAX_JET_PHASE).tan()
    }

    fn basis_point(
        &self,
        calc: &InstrumentCalculator,
        fingering: &Fingering,
        jet_length: f64,
    ) -> Result<(f64, f64), PlayingRangeError> {
        let target = fingering
            .target_frequency()
            .ok_or(PlayingRangeError::NoTarget)?;
        let range = playing_range(calc, fingering, &self.config)?;
        let (_, _, f) = range_sample(&range, target)?;
        Ok((target, Self::velocity(f, jet_length, range.z_ratio(f))))
    }
}

impl InstrumentTuner for LinearVInstrumentTuner {
    fn playing_range_config(&self) -> &PlayingRangeConfig {
        &self.config
    }

    fn basis(&self, calc: &InstrumentCalculator, target: &Tuning) -> Option<TuningBasis> {
        let Some(jet_length) = Self::jet_length(calc) else {
            return self.linear_x().basis(calc, target);
        };
        let (low, high) = extreme_fingerings(target)?;
        let (low_frequency, low_value) = self.basis_point(calc, low, jet_length).ok()?;
        let (high_frequency, high_value) = self.basis_point(calc, high, jet_length).ok()?;
        Some(TuningBasis {
            low_frequency,
            low_value,
            high_frequency,
            high_value,
        })
    }

    fn predicted_note(
        &self,
        calc: &InstrumentCalculator,
        fingering: &Fingering,
        basis: Option<&TuningBasis>,
    ) -> Result<Note, PlayingRangeError> {
        let Some(jet_length) = Self::jet_length(calc) else {
            return self.linear_x().predicted_note(calc, fingering, basis);
        };
        let Some(target) = fingering.target_frequency() else {
            return Ok(unpredicted(fingering));
        };
        let range = playing_range(calc, fingering, &self.config)?;
        let nominal = match basis {
            Some(basis) => {
                let velocity = basis.value_at(target);
                range.find_crossing(target, |f| {
                    range.z_ratio(f) - Self::z_ratio_for(f, jet_length, velocity)
                })?
            }
            None => range.find_x_zero(target)?,
        };
        Ok(with_range(&range, nominal, unpredicted(fingering)))
    }
}
