use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptimizerKind {
    NelderMead,
    DifferentialEvolution,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlgorithmType {
    /// Refines a starting point; may stop in a local minimum.
    Local,
    /// Explores the whole bounded domain.
    Global,
}

impl OptimizerKind {
    pub const ALL: [OptimizerKind; 2] = [OptimizerKind::NelderMead, OptimizerKind::DifferentialEvolution];

    pub fn name(self) -> &'static str {
        match self {
            OptimizerKind::NelderMead => "neldermead",
            OptimizerKind::DifferentialEvolution => "de",
        }
    }

    pub fn algorithm_type(self) -> AlgorithmType {
        match self {
            OptimizerKind::NelderMead => AlgorithmType::Local,
            OptimizerKind::DifferentialEvolution => AlgorithmType::Global,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown optimizer: '{0}'")]
pub struct UnknownOptimizer(pub String);

impl FromStr for OptimizerKind {
    type Err = UnknownOptimizer;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "neldermead" | "nelder-mead" | "simplex" => Ok(OptimizerKind::NelderMead),
            "de" | "differential-evolution" | "differentialevolution" => {
                Ok(OptimizerKind::DifferentialEvolution)
            }
            _ => Err(UnknownOptimizer(s.to_string())),
        }
    }
}

impl fmt::Display for OptimizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct Fraction01(pub f64);

impl Fraction01 {
    pub fn new(value: f64) -> Self {
        Self(value.clamp(0.0, 1.0))
    }

    pub fn get(self) -> f64 {
        self.0
    }
}
