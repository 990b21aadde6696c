use crate::range_processor::GridRangeProcessor;
use crate::shape::ObjectiveShape;
use boretune_domain_acoustics::InstrumentCalculator;
use boretune_domain_eval::Evaluator;
use boretune_domain_instrument::{GeometryError, Instrument, LengthUnit, Tuning};
use boretune_ports::optimizer::{Bounds, ObjectiveFn, OptimizerError};
use log::warn;
use std::sync::Arc;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ObjectiveError {
    #[error("objective shape has no axes")]
    EmptyShape,
    #[error("bore length and hole positions cannot both be free")]
    ConflictingAxes,
    #[error("{axis} needs at least one hole")]
    NeedsHoles { axis: &'static str },
    #[error("invalid hole grouping: {0}")]
    InvalidGrouping(String),
    #[error("{requested} bore diameter ratios requested, instrument has {available}")]
    BorePointCount { requested: usize, available: usize },
    #[error("{axis} not supported: {reason}")]
    UnsupportedAxis {
        axis: &'static str,
        reason: &'static str,
    },
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("bounds are not set")]
    BoundsNotSet,
    #[error("range processor varies dimension {index} of {dimensions}")]
    InvalidRangeProcessor { index: usize, dimensions: usize },
    #[error(transparent)]
    Bounds(#[from] OptimizerError),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// Cost reported for vectors that do not describe a valid instrument.
pub const INVALID_GEOMETRY_COST: f64 = 1.0e12;

pub const DEFAULT_MAX_EVALUATIONS: usize = 10_000;

/// Scalar tuning cost of a geometry vector.
///
/// Every vector is written into a fresh copy of the current geometry; the
/// current geometry only changes through [`InstrumentObjective::set_geometry`].
pub struct InstrumentObjective {
    calculator: InstrumentCalculator,
    geometry: Instrument,
    unit: LengthUnit,
    tuning: Tuning,
    evaluator: Arc<dyn Evaluator>,
    shape: ObjectiveShape,
    lower: Option<Vec<f64>>,
    upper: Option<Vec<f64>>,
    range_processor: Option<GridRangeProcessor>,
    max_evaluations: usize,
    evaluations: usize,
    initial_norm: Option<f64>,
    final_norm: Option<f64>,
}

impl InstrumentObjective {
    pub fn new(
        calculator: InstrumentCalculator,
        tuning: Tuning,
        evaluator: Arc<dyn Evaluator>,
        shape: ObjectiveShape,
    ) -> Result<Self, ObjectiveError> {
        let geometry = calculator.instrument().clone();
        tuning.check_hole_count(geometry.hole_count())?;
        shape.validate(&geometry)?;
        Ok(Self {
            unit: calculator.source_unit(),
            calculator,
            geometry,
            tuning,
            evaluator,
            shape,
            lower: None,
            upper: None,
            range_processor: None,
            max_evaluations: DEFAULT_MAX_EVALUATIONS,
            evaluations: 0,
            initial_norm: None,
            final_norm: None,
        })
    }

    pub fn nr_dimensions(&self) -> usize {
        self.shape.dimensions(self.geometry.hole_count())
    }

    pub fn shape(&self) -> &ObjectiveShape {
        &self.shape
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    fn check_dimension(&self, found: usize) -> Result<(), ObjectiveError> {
        let expected = self.nr_dimensions();
        if found != expected {
            return Err(ObjectiveError::DimensionMismatch { expected, found });
        }
        Ok(())
    }

    pub fn set_lower_bounds(&mut self, lower: Vec<f64>) -> Result<(), ObjectiveError> {
        self.check_dimension(lower.len())?;
        self.lower = Some(lower);
        Ok(())
    }

    pub fn set_upper_bounds(&mut self, upper: Vec<f64>) -> Result<(), ObjectiveError> {
        self.check_dimension(upper.len())?;
        self.upper = Some(upper);
        Ok(())
    }

    pub fn bounds(&self) -> Result<Bounds, ObjectiveError> {
        match (&self.lower, &self.upper) {
            (Some(lower), Some(upper)) => Ok(Bounds::new(lower.clone(), upper.clone())?),
            _ => Err(ObjectiveError::BoundsNotSet),
        }
    }

    pub fn set_range_processor(
        &mut self,
        processor: Option<GridRangeProcessor>,
    ) -> Result<(), ObjectiveError> {
        if let Some(p) = &processor {
            p.validate(self.nr_dimensions())?;
        }
        self.range_processor = processor;
        Ok(())
    }

    pub fn range_processor(&self) -> Option<&GridRangeProcessor> {
        self.range_processor.as_ref()
    }

    /// Evaluation budget of a single optimiser start.
    pub fn set_max_evaluations(&mut self, max_evaluations: usize) {
        self.max_evaluations = max_evaluations;
    }

    pub fn max_evaluations(&self) -> usize {
        self.max_evaluations
    }

    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    /// Geometry vector of the current instrument.
    pub fn initial_point(&self) -> Vec<f64> {
        self.shape.read(&self.geometry)
    }

    fn candidate(&self, x: &[f64]) -> Result<Instrument, ObjectiveError> {
        self.check_dimension(x.len())?;
        let mut instrument = self.geometry.clone();
        self.shape.apply(&mut instrument, x);
        Ok(instrument)
    }

    fn errors_for(&mut self, instrument: &Instrument) -> Result<Vec<f64>, GeometryError> {
        self.calculator.set_instrument(instrument)?;
        self.evaluator
            .calculate_error_vector(&self.calculator, &self.tuning.fingerings)
    }

    fn norm(&self, errors: &[f64]) -> f64 {
        self.tuning
            .fingerings
            .iter()
            .zip(errors)
            .map(|(f, e)| f.weight() * e * e)
            .sum()
    }

    pub fn error_vector(&mut self, x: &[f64]) -> Result<Vec<f64>, ObjectiveError> {
        let instrument = self.candidate(x)?;
        Ok(self.errors_for(&instrument)?)
    }

    /// Weighted sum of squared errors of the current geometry.
    pub fn current_norm(&mut self) -> Result<f64, ObjectiveError> {
        let geometry = self.geometry.clone();
        let errors = self.errors_for(&geometry)?;
        Ok(self.norm(&errors))
    }

    /// Weighted sum of squared errors of `x`, or [`INVALID_GEOMETRY_COST`]
    /// when `x` does not give a valid instrument.
    pub fn value(&mut self, x: &[f64]) -> f64 {
        self.evaluations += 1;
        let errors = self
            .candidate(x)
            .and_then(|instrument| Ok(self.errors_for(&instrument)?));
        match errors {
            Ok(errors) => self.norm(&errors),
            Err(err) => {
                warn!("rejected geometry {x:?}: {err}");
                INVALID_GEOMETRY_COST
            }
        }
    }

    /// Makes `x` the current geometry.
    pub fn set_geometry(&mut self, x: &[f64]) -> Result<(), ObjectiveError> {
        let instrument = self.candidate(x)?;
        self.calculator.set_instrument(&instrument)?;
        self.geometry = instrument;
        Ok(())
    }

    /// The current geometry in the unit the instrument was supplied in.
    pub fn instrument(&self) -> Instrument {
        self.geometry.convert_to(self.unit)
    }

    pub fn calculator(&self) -> &InstrumentCalculator {
        &self.calculator
    }

    pub fn initial_norm(&self) -> Option<f64> {
        self.initial_norm
    }

    pub fn final_norm(&self) -> Option<f64> {
        self.final_norm
    }

    pub(crate) fn record_norms(&mut self, initial: f64, last: f64) {
        self.initial_norm = Some(initial);
        self.final_norm = Some(last);
    }
}

impl ObjectiveFn for InstrumentObjective {
    fn dimension(&self) -> usize {
        self.nr_dimensions()
    }

    fn value(&mut self, x: &[f64]) -> f64 {
        InstrumentObjective::value(self, x)
    }
}
