use crate::config::{build_optimizer, physical_parameters, playing_range_config, OptimizerConfig};
use boretune_core::{
    optimize_instrument, GridRangeProcessor, InstrumentObjective, ObjectiveError, ObjectiveShape,
    OptimizeError,
};
use boretune_domain_acoustics::{CalculatorFamily, InstrumentCalculator, PlayingRangeConfig};
use boretune_domain_eval::{
    CentDeviationEvaluator, ErrorStatistics, Evaluator, FmaxEvaluator, FminEvaluator,
    InstrumentTuner, LinearVInstrumentTuner, LinearXInstrumentTuner, ReactanceEvaluator,
    SimpleInstrumentTuner,
};
use boretune_domain_instrument::{GeometryError, Instrument, PhysicalParameters, Tuning};
use boretune_infra_storage_fs::FsStorage;
use boretune_ports::storage::{SettingsDto, SettingsError, StorageError, StoragePort};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("invalid settings: {0}")]
    Settings(#[from] SettingsError),
    #[error("geometry error: {0}")]
    Geometry(#[from] GeometryError),
    #[error("objective error: {0}")]
    Objective(#[from] ObjectiveError),
    #[error("optimization failed: {0}")]
    Optimize(#[from] OptimizeError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TunerKind {
    Simple,
    LinearX,
    LinearV,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EvaluatorKind {
    CentDeviation(TunerKind),
    Fmax,
    Fmin,
    Reactance,
}

/// One optimisation job: which geometry is free, within which bounds, and
/// against which target tuning.
#[derive(Clone, Debug)]
pub struct OptimizationRequest {
    pub instrument: Instrument,
    pub family: CalculatorFamily,
    pub tuning: Tuning,
    pub evaluator: EvaluatorKind,
    pub shape: ObjectiveShape,
    pub lower_bounds: Vec<f64>,
    pub upper_bounds: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OptimizationOutcome {
    pub improved: bool,
    /// Resulting geometry, in the unit of the request's instrument.
    pub instrument: Instrument,
    pub initial_norm: f64,
    pub final_norm: f64,
    pub evaluations: usize,
    pub statistics: ErrorStatistics,
}

/// Holds the persisted settings and turns them into calculators, tuners,
/// evaluators and optimisers.
pub struct Workbench {
    storage: Option<Box<dyn StoragePort>>,
    settings: SettingsDto,
}

impl Workbench {
    /// Unreadable or invalid stored settings are logged and replaced by the
    /// defaults; the next `update_settings` overwrites them.
    pub fn new(storage: Option<Box<dyn StoragePort>>) -> Self {
        let settings = match storage.as_ref().map(|storage| storage.load_settings()) {
            Some(Ok(settings)) => settings,
            Some(Err(e)) => {
                warn!("{e}; using default settings");
                SettingsDto::default()
            }
            None => SettingsDto::default(),
        };
        Self { storage, settings }
    }

    /// Settings kept in the user's config directory.
    pub fn with_default_storage() -> Result<Self, AppError> {
        Ok(Self::new(Some(Box::new(FsStorage::in_config_dir()?))))
    }

    pub fn settings(&self) -> &SettingsDto {
        &self.settings
    }

    pub fn update_settings(&mut self, settings: SettingsDto) -> Result<(), AppError> {
        settings.validate()?;
        if let Some(storage) = self.storage.as_ref() {
            storage.save_settings(&settings)?;
        }
        self.settings = settings;
        Ok(())
    }

    pub fn optimizer_config(&self) -> OptimizerConfig {
        OptimizerConfig::from(&self.settings)
    }

    pub fn physical_parameters(&self) -> PhysicalParameters {
        physical_parameters(&self.settings)
    }

    pub fn playing_range_config(&self) -> PlayingRangeConfig {
        playing_range_config(&self.settings)
    }

    pub fn calculator(
        &self,
        family: CalculatorFamily,
        instrument: &Instrument,
    ) -> Result<InstrumentCalculator, AppError> {
        Ok(InstrumentCalculator::for_family(
            family,
            instrument,
            self.physical_parameters(),
        )?)
    }

    pub fn tuner(&self, kind: TunerKind) -> Arc<dyn InstrumentTuner> {
        let config = self.playing_range_config();
        match kind {
            TunerKind::Simple => Arc::new(SimpleInstrumentTuner::new(config)),
            TunerKind::LinearX => Arc::new(LinearXInstrumentTuner::new(config)),
            TunerKind::LinearV => Arc::new(LinearVInstrumentTuner::new(config)),
        }
    }

    /// Range penalty the cent-deviation evaluator gets with `tuner`. The
    /// simple tuner predicts no playing range, so it never gets one.
    pub fn range_penalty(&self, tuner: TunerKind) -> Option<f64> {
        let factor = self.settings.range_penalty_factor?;
        match tuner {
            TunerKind::LinearX | TunerKind::LinearV => Some(factor),
            TunerKind::Simple => {
                warn!("range_penalty_factor {factor} ignored with the simple tuner");
                None
            }
        }
    }

    pub fn evaluator(&self, kind: EvaluatorKind) -> Arc<dyn Evaluator> {
        let config = self.playing_range_config();
        match kind {
            EvaluatorKind::CentDeviation(tuner) => {
                let evaluator = CentDeviationEvaluator::new(self.tuner(tuner));
                match self.range_penalty(tuner) {
                    Some(factor) => Arc::new(evaluator.with_range_penalty(factor)),
                    None => Arc::new(evaluator),
                }
            }
            EvaluatorKind::Fmax => Arc::new(FmaxEvaluator::new(config)),
            EvaluatorKind::Fmin => Arc::new(FminEvaluator::new(config)),
            EvaluatorKind::Reactance => Arc::new(ReactanceEvaluator),
        }
    }

    pub fn predicted_tuning(
        &self,
        family: CalculatorFamily,
        instrument: &Instrument,
        target: &Tuning,
        tuner: TunerKind,
    ) -> Result<Tuning, AppError> {
        let calc = self.calculator(family, instrument)?;
        Ok(self.tuner(tuner).predicted_tuning(&calc, target)?)
    }

    /// Builds the objective and optimiser from the current settings and runs
    /// them. A geometry that does not improve comes back unchanged with
    /// `improved == false`.
    pub fn optimize(&self, request: OptimizationRequest) -> Result<OptimizationOutcome, AppError> {
        let config = self.optimizer_config();
        let calc = self.calculator(request.family, &request.instrument)?;
        let mut objective = InstrumentObjective::new(
            calc,
            request.tuning,
            self.evaluator(request.evaluator),
            request.shape,
        )?;
        objective.set_lower_bounds(request.lower_bounds)?;
        objective.set_upper_bounds(request.upper_bounds)?;
        objective.set_max_evaluations(config.max_evaluations);
        if let Some(points) = config.multi_start() {
            let dimensions = (0..objective.nr_dimensions()).collect();
            objective.set_range_processor(Some(GridRangeProcessor::new(dimensions, points)))?;
        }

        let optimizer = build_optimizer(&config);
        let improved = optimize_instrument(&mut objective, optimizer)?;

        let point = objective.initial_point();
        let errors = objective.error_vector(&point)?;
        let statistics = ErrorStatistics::from_errors(&objective.tuning().fingerings, &errors);
        let initial_norm = objective.initial_norm().unwrap_or_default();
        let final_norm = objective.final_norm().unwrap_or(initial_norm);
        info!(
            "{}: norm {:.6e} -> {:.6e}, rms error {:.3}",
            request.instrument.name, initial_norm, final_norm, statistics.rms
        );
        Ok(OptimizationOutcome {
            improved,
            instrument: objective.instrument(),
            initial_norm,
            final_norm,
            evaluations: objective.evaluations(),
            statistics,
        })
    }
}
