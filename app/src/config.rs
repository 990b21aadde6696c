use boretune_domain_acoustics::PlayingRangeConfig;
use boretune_domain_instrument::PhysicalParameters;
use boretune_infra_optim_de::DifferentialEvolutionOptimizer;
use boretune_infra_optim_simplex::NelderMeadOptimizer;
use boretune_ports::optimizer::OptimizerPort;
use boretune_ports::storage::SettingsDto;
use boretune_ports::types::OptimizerKind;
use std::sync::Arc;

/// Everything needed to pick and tune an optimiser for one run.
#[derive(Clone, Debug, PartialEq)]
pub struct OptimizerConfig {
    pub kind: OptimizerKind,
    pub max_evaluations: usize,
    pub seed: Option<u64>,
    pub de_population: usize,
    pub simplex_x_tolerance: f64,
    pub simplex_f_tolerance: f64,
    /// Number of grid starts; `None` or fewer than two means a single start.
    pub multi_start_points: Option<usize>,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self::from(&SettingsDto::default())
    }
}

impl From<&SettingsDto> for OptimizerConfig {
    fn from(s: &SettingsDto) -> Self {
        Self {
            kind: s.optimizer,
            max_evaluations: s.max_evaluations,
            seed: s.seed,
            de_population: s.de_population,
            simplex_x_tolerance: s.simplex_x_tolerance,
            simplex_f_tolerance: s.simplex_f_tolerance,
            multi_start_points: s.multi_start_points,
        }
    }
}

impl OptimizerConfig {
    pub fn multi_start(&self) -> Option<usize> {
        self.multi_start_points.filter(|&points| points > 1)
    }
}

pub fn build_optimizer(config: &OptimizerConfig) -> Arc<dyn OptimizerPort> {
    match config.kind {
        OptimizerKind::NelderMead => Arc::new(NelderMeadOptimizer::new(
            config.simplex_x_tolerance,
            config.simplex_f_tolerance,
        )),
        OptimizerKind::DifferentialEvolution => Arc::new(DifferentialEvolutionOptimizer::new(
            config.de_population,
            config.seed,
        )),
    }
}

pub fn physical_parameters(s: &SettingsDto) -> PhysicalParameters {
    PhysicalParameters::new(
        s.temperature_c,
        s.pressure_kpa,
        s.relative_humidity.get(),
        s.co2_ppm * 1e-6,
    )
}

pub fn playing_range_config(s: &SettingsDto) -> PlayingRangeConfig {
    PlayingRangeConfig {
        granularity: s.granularity,
        ..PlayingRangeConfig::default()
    }
    .with_preferred_solution_cents(s.preferred_solution_cents)
}
