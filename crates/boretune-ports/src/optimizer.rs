use crate::types::AlgorithmType;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum OptimizerError {
    #[error("bounds length mismatch: lower={lower}, upper={upper}")]
    BoundsLengthMismatch { lower: usize, upper: usize },
    #[error("invalid bounds at dimension {index}: lower {lower} > upper {upper}")]
    InvalidBounds { index: usize, lower: f64, upper: f64 },
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("evaluation budget is empty")]
    EmptyBudget,
    #[error("{optimizer} failed before evaluating anything: {reason}")]
    Backend {
        optimizer: &'static str,
        reason: String,
    },
}

/// Box constraints for an optimisation problem.
#[derive(Clone, Debug, PartialEq)]
pub struct Bounds {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl Bounds {
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> Result<Self, OptimizerError> {
        if lower.len() != upper.len() {
            return Err(OptimizerError::BoundsLengthMismatch {
                lower: lower.len(),
                upper: upper.len(),
            });
        }
        for (index, (&lo, &hi)) in lower.iter().zip(upper.iter()).enumerate() {
            if !(lo <= hi) {
                return Err(OptimizerError::InvalidBounds {
                    index,
                    lower: lo,
                    upper: hi,
                });
            }
        }
        Ok(Self { lower, upper })
    }

    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    pub fn dimension(&self) -> usize {
        self.lower.len()
    }

    pub fn width(&self, index: usize) -> f64 {
        self.upper[index] - self.lower[index]
    }

    pub fn check_dimension(&self, expected: usize) -> Result<(), OptimizerError> {
        if self.dimension() != expected {
            return Err(OptimizerError::DimensionMismatch {
                expected,
                found: self.dimension(),
            });
        }
        Ok(())
    }

    pub fn contains(&self, x: &[f64]) -> bool {
        x.len() == self.dimension()
            && x
                .iter()
                .zip(self.lower.iter().zip(self.upper.iter()))
                .all(|(&v, (&lo, &hi))| v >= lo && v <= hi)
    }

    pub fn clamp(&self, x: &mut [f64]) {
        for (v, (&lo, &hi)) in x.iter_mut().zip(self.lower.iter().zip(self.upper.iter())) {
            *v = v.clamp(lo, hi);
        }
    }

    pub fn clamped(&self, x: &[f64]) -> Vec<f64> {
        let mut out = x.to_vec();
        self.clamp(&mut out);
        out
    }

    pub fn midpoint(&self) -> Vec<f64> {
        self.lower
            .iter()
            .zip(self.upper.iter())
            .map(|(&lo, &hi)| 0.5 * (lo + hi))
            .collect()
    }
}

/// A scalar cost over a bounded real vector.
///
/// `Send` so optimiser backends may move it behind their own locks.
pub trait ObjectiveFn: Send {
    fn dimension(&self) -> usize;
    fn value(&mut self, x: &[f64]) -> f64;
}

/// Adapts a closure into an [`ObjectiveFn`].
pub struct ClosureObjective<F> {
    dimension: usize,
    f: F,
}

impl<F> ClosureObjective<F>
where
    F: FnMut(&[f64]) -> f64 + Send,
{
    pub fn new(dimension: usize, f: F) -> Self {
        Self { dimension, f }
    }
}

impl<F> ObjectiveFn for ClosureObjective<F>
where
    F: FnMut(&[f64]) -> f64 + Send,
{
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn value(&mut self, x: &[f64]) -> f64 {
        (self.f)(x)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct OptimumReport {
    pub point: Vec<f64>,
    pub value: f64,
    pub evaluations: usize,
    pub converged: bool,
}

/// Contract shared by every optimiser strategy:
/// - `minimize` never evaluates outside `bounds`
/// - at most `max_evaluations` objective calls are made
/// - the returned point is the best one evaluated
pub trait OptimizerPort: Send + Sync {
    fn name(&self) -> &'static str;
    fn algorithm_type(&self) -> AlgorithmType;
    fn minimize(
        &self,
        objective: &mut dyn ObjectiveFn,
        bounds: &Bounds,
        start: Option<&[f64]>,
        max_evaluations: usize,
    ) -> Result<OptimumReport, OptimizerError>;
}

/// Objective calls counted against a budget.
///
/// Points are projected onto the bounds before evaluation and the best one
/// seen is kept, so adapters only decide where to look next.
pub struct BudgetedObjective<'a> {
    objective: &'a mut dyn ObjectiveFn,
    bounds: &'a Bounds,
    max_evaluations: usize,
    used: usize,
    best: Option<(Vec<f64>, f64)>,
}

impl<'a> BudgetedObjective<'a> {
    pub fn new(
        objective: &'a mut dyn ObjectiveFn,
        bounds: &'a Bounds,
        max_evaluations: usize,
    ) -> Result<Self, OptimizerError> {
        bounds.check_dimension(objective.dimension())?;
        if max_evaluations == 0 {
            return Err(OptimizerError::EmptyBudget);
        }
        Ok(Self {
            objective,
            bounds,
            max_evaluations,
            used: 0,
            best: None,
        })
    }

    pub fn bounds(&self) -> &Bounds {
        self.bounds
    }

    pub fn used(&self) -> usize {
        self.used
    }

    pub fn exhausted(&self) -> bool {
        self.used >= self.max_evaluations
    }

    /// Projects `x` onto the bounds and evaluates it; `None` once the budget
    /// is spent. NaN costs count as infinite.
    pub fn evaluate(&mut self, x: &mut [f64]) -> Option<f64> {
        if self.exhausted() {
            return None;
        }
        self.bounds.clamp(x);
        self.used += 1;
        let value = self.objective.value(x);
        let value = if value.is_nan() { f64::INFINITY } else { value };
        if self.best.as_ref().map_or(true, |(_, b)| value < *b) {
            self.best = Some((x.to_vec(), value));
        }
        Some(value)
    }

    pub fn best_value(&self) -> Option<f64> {
        self.best.as_ref().map(|(_, v)| *v)
    }

    pub fn into_report(self, converged: bool) -> Result<OptimumReport, OptimizerError> {
        let (point, value) = self.best.ok_or(OptimizerError::EmptyBudget)?;
        Ok(OptimumReport {
            point,
            value,
            evaluations: self.used,
            converged,
        })
    }
}
