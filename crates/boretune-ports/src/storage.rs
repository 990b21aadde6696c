use crate::types::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_optimizer() -> OptimizerKind {
    OptimizerKind::NelderMead
}

fn default_max_evaluations() -> usize {
    10_000
}

fn default_de_population() -> usize {
    20
}

fn default_simplex_x_tolerance() -> f64 {
    1e-7
}

fn default_simplex_f_tolerance() -> f64 {
    1e-9
}

fn default_temperature_c() -> f64 {
    20.0
}

fn default_pressure_kpa() -> f64 {
    101.325
}

fn default_relative_humidity() -> Fraction01 {
    Fraction01::new(0.45)
}

fn default_co2_ppm() -> f64 {
    390.0
}

fn default_granularity() -> f64 {
    0.012
}

fn default_preferred_solution_cents() -> f64 {
    200.0
}

/// A settings value outside the range the engine can run with.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SettingsError {
    #[error("max_evaluations must be at least 1")]
    EmptyBudget,
    #[error("de_population {0} is below the minimum of 4")]
    PopulationTooSmall(usize),
    #[error("multi_start_points must be at least 1")]
    NoStartPoints,
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },
    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f64 },
    #[error("temperature {0} degC is below absolute zero")]
    BelowAbsoluteZero(f64),
    #[error("relative_humidity must lie in [0, 1], got {0}")]
    HumidityOutOfRange(f64),
}

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("no config directory on this system")]
    NoConfigDir,
    #[error("cannot read {}: {reason}", path.display())]
    Read { path: PathBuf, reason: String },
    #[error("cannot write {}: {reason}", path.display())]
    Write { path: PathBuf, reason: String },
    #[error("{} is not valid settings JSON: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },
    #[error("{}: {source}", path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: SettingsError,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsDto {
    #[serde(default = "default_optimizer")]
    pub optimizer: OptimizerKind,
    #[serde(default = "default_max_evaluations")]
    pub max_evaluations: usize,
    pub seed: Option<u64>,
    #[serde(default = "default_de_population")]
    pub de_population: usize,
    #[serde(default = "default_simplex_x_tolerance")]
    pub simplex_x_tolerance: f64,
    #[serde(default = "default_simplex_f_tolerance")]
    pub simplex_f_tolerance: f64,
    pub multi_start_points: Option<usize>,
    #[serde(default = "default_temperature_c")]
    pub temperature_c: f64,
    #[serde(default = "default_pressure_kpa")]
    pub pressure_kpa: f64,
    #[serde(default = "default_relative_humidity")]
    pub relative_humidity: Fraction01,
    #[serde(default = "default_co2_ppm")]
    pub co2_ppm: f64,
    #[serde(default = "default_granularity")]
    pub granularity: f64,
    #[serde(default = "default_preferred_solution_cents")]
    pub preferred_solution_cents: f64,
    pub range_penalty_factor: Option<f64>,
}

impl Default for SettingsDto {
    fn default() -> Self {
        Self {
            optimizer: default_optimizer(),
            max_evaluations: default_max_evaluations(),
            seed: None,
            de_population: default_de_population(),
            simplex_x_tolerance: default_simplex_x_tolerance(),
            simplex_f_tolerance: default_simplex_f_tolerance(),
            multi_start_points: None,
            temperature_c: default_temperature_c(),
            pressure_kpa: default_pressure_kpa(),
            relative_humidity: default_relative_humidity(),
            co2_ppm: default_co2_ppm(),
            granularity: default_granularity(),
            preferred_solution_cents: default_preferred_solution_cents(),
            range_penalty_factor: None,
        }
    }
}

impl SettingsDto {
    /// Checks every field the engine divides by, counts with or feeds to
    /// the air model.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.max_evaluations == 0 {
            return Err(SettingsError::EmptyBudget);
        }
        if self.de_population < 4 {
            return Err(SettingsError::PopulationTooSmall(self.de_population));
        }
        if self.multi_start_points == Some(0) {
            return Err(SettingsError::NoStartPoints);
        }
        if self.temperature_c <= -273.15 {
            return Err(SettingsError::BelowAbsoluteZero(self.temperature_c));
        }
        let humidity = self.relative_humidity.get();
        if !(0.0..=1.0).contains(&humidity) {
            return Err(SettingsError::HumidityOutOfRange(humidity));
        }
        let positive = [
            ("pressure_kpa", self.pressure_kpa),
            ("granularity", self.granularity),
            ("preferred_solution_cents", self.preferred_solution_cents),
        ];
        for (field, value) in positive {
            if !(value > 0.0) {
                return Err(SettingsError::NotPositive { field, value });
            }
        }
        let non_negative = [
            ("simplex_x_tolerance", Some(self.simplex_x_tolerance)),
            ("simplex_f_tolerance", Some(self.simplex_f_tolerance)),
            ("co2_ppm", Some(self.co2_ppm)),
            ("range_penalty_factor", self.range_penalty_factor),
        ];
        for (field, value) in non_negative {
            if let Some(value) = value {
                if !(value >= 0.0) {
                    return Err(SettingsError::Negative { field, value });
                }
            }
        }
        Ok(())
    }
}

/// Where settings live between runs. Implementations hand back only
/// settings that pass [`SettingsDto::validate`].
pub trait StoragePort: Send + Sync {
    fn load_settings(&self) -> Result<SettingsDto, StorageError>;
    fn save_settings(&self, settings: &SettingsDto) -> Result<(), StorageError>;
}
