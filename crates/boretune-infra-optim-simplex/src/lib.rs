use boretune_ports::optimizer::{
    Bounds, BudgetedObjective, ObjectiveFn, OptimizerError, OptimizerPort, OptimumReport,
};
use boretune_ports::types::AlgorithmType;
use log::{debug, warn};
use nlopt::{Algorithm, FailState, Nlopt, SuccessState, Target};

/// Nelder-Mead downhill simplex, run by NLopt. Trial points are projected
/// onto the bounds.
#[derive(Clone, Debug, PartialEq)]
pub struct NelderMeadOptimizer {
    /// Stop once a step moves every coordinate by less than this fraction of
    /// its bound width. Zero disables the test.
    pub x_tolerance: f64,
    /// Stop once a step changes the value by less than this relative
    /// tolerance. Zero disables the test.
    pub f_tolerance: f64,
    /// Edge of the initial simplex as a fraction of the bound widths.
    pub initial_step: f64,
}

impl Default for NelderMeadOptimizer {
    fn default() -> Self {
        Self::new(1e-7, 1e-9)
    }
}

impl NelderMeadOptimizer {
    pub fn new(x_tolerance: f64, f_tolerance: f64) -> Self {
        Self {
            x_tolerance,
            f_tolerance,
            initial_step: 0.1,
        }
    }

    pub fn with_initial_step(mut self, initial_step: f64) -> Self {
        self.initial_step = initial_step;
        self
    }
}

fn setting(result: Result<SuccessState, FailState>, what: &str) -> Result<(), OptimizerError> {
    result.map(|_| ()).map_err(|state| OptimizerError::Backend {
        optimizer: "neldermead",
        reason: format!("setting {what}: {state:?}"),
    })
}

/// NLopt callback; a spent budget reads as an infinite cost.
fn budgeted_cost(
    x: &[f64],
    _gradient: Option<&mut [f64]>,
    budget: &mut &mut BudgetedObjective<'_>,
) -> f64 {
    let mut point = x.to_vec();
    budget.evaluate(&mut point).unwrap_or(f64::INFINITY)
}

impl OptimizerPort for NelderMeadOptimizer {
    fn name(&self) -> &'static str {
        "neldermead"
    }

    fn algorithm_type(&self) -> AlgorithmType {
        AlgorithmType::Local
    }

    fn minimize(
        &self,
        objective: &mut dyn ObjectiveFn,
        bounds: &Bounds,
        start: Option<&[f64]>,
        max_evaluations: usize,
    ) -> Result<OptimumReport, OptimizerError> {
        let n = bounds.dimension();
        let mut x = match start {
            Some(x) if x.len() != n => {
                return Err(OptimizerError::DimensionMismatch {
                    expected: n,
                    found: x.len(),
                })
            }
            Some(x) => bounds.clamped(x),
            None => bounds.midpoint(),
        };
        let mut budget = BudgetedObjective::new(objective, bounds, max_evaluations)?;
        if n == 0 {
            budget.evaluate(&mut x);
            return budget.into_report(true);
        }

        let widths: Vec<f64> = (0..n).map(|d| bounds.width(d)).collect();
        // NLopt refuses a zero initial step, even on a pinned dimension.
        let steps: Vec<f64> = widths
            .iter()
            .map(|w| self.initial_step * if *w > 0.0 { *w } else { 1.0 })
            .collect();
        let maxeval = u32::try_from(max_evaluations).unwrap_or(u32::MAX);
        let outcome = {
            let mut solver = Nlopt::new(
                Algorithm::Neldermead,
                n,
                budgeted_cost,
                Target::Minimize,
                &mut budget,
            );
            setting(solver.set_lower_bounds(bounds.lower()), "lower bounds")?;
            setting(solver.set_upper_bounds(bounds.upper()), "upper bounds")?;
            setting(solver.set_initial_step(&steps), "initial step")?;
            setting(solver.set_maxeval(maxeval), "maxeval")?;
            if self.x_tolerance > 0.0 {
                let xtol: Vec<f64> = widths.iter().map(|w| self.x_tolerance * w).collect();
                setting(solver.set_xtol_abs(&xtol), "xtol")?;
            }
            if self.f_tolerance > 0.0 {
                setting(solver.set_ftol_rel(self.f_tolerance), "ftol")?;
            }
            solver.optimize(&mut x)
        };

        let converged = match outcome {
            Ok((state, value)) => {
                debug!("nelder-mead stopped with {state:?} at {value}");
                matches!(
                    state,
                    SuccessState::Success
                        | SuccessState::FtolReached
                        | SuccessState::XtolReached
                        | SuccessState::StopValReached
                )
            }
            Err((state, value)) => {
                if budget.used() == 0 {
                    return Err(OptimizerError::Backend {
                        optimizer: "neldermead",
                        reason: format!("{state:?}"),
                    });
                }
                warn!("nelder-mead gave up with {state:?} at {value}");
                false
            }
        };
        debug!(
            "nelder-mead: {} evaluations, best {:?}, converged {}",
            budget.used(),
            budget.best_value(),
            converged
        );
        budget.into_report(converged)
    }
}
