use crate::multistart::MultiStartOptimizer;
use crate::objective::{InstrumentObjective, ObjectiveError};
use boretune_ports::optimizer::{OptimizerError, OptimizerPort};
use log::info;
use std::sync::Arc;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum OptimizeError {
    #[error("objective error: {0}")]
    Objective(#[from] ObjectiveError),
    #[error("optimizer error: {0}")]
    Optimizer(#[from] OptimizerError),
}

/// Minimises `objective` with `optimizer`, starting from the current
/// geometry.
///
/// Returns `Ok(true)` and keeps the optimum when it beats the starting cost.
/// Otherwise the geometry is left alone and `Ok(false)` is returned. A range
/// processor on the objective turns the run into a multi-start with the
/// budget multiplied by the number of starts.
pub fn optimize_instrument(
    objective: &mut InstrumentObjective,
    optimizer: Arc<dyn OptimizerPort>,
) -> Result<bool, OptimizeError> {
    let bounds = objective.bounds()?;
    bounds.check_dimension(objective.nr_dimensions())?;
    let start = bounds.clamped(&objective.initial_point());
    let initial = objective.current_norm()?;

    let (optimizer, budget): (Arc<dyn OptimizerPort>, usize) = match objective.range_processor() {
        Some(processor) => {
            let budget = objective.max_evaluations() * processor.points().max(1);
            let multi: Arc<dyn OptimizerPort> =
                Arc::new(MultiStartOptimizer::new(optimizer, processor.clone()));
            (multi, budget)
        }
        None => (optimizer, objective.max_evaluations()),
    };
    info!(
        "optimizing {} dimensions with {} ({} evaluations), initial norm {:.6e}",
        objective.nr_dimensions(),
        optimizer.name(),
        budget,
        initial
    );

    let report = optimizer.minimize(objective, &bounds, Some(start.as_slice()), budget)?;
    if report.value < initial {
        objective.set_geometry(&report.point)?;
        objective.record_norms(initial, report.value);
        info!(
            "final norm {:.6e} after {} evaluations",
            report.value, report.evaluations
        );
        Ok(true)
    } else {
        objective.record_norms(initial, initial);
        info!(
            "no improvement on {:.6e} after {} evaluations",
            initial, report.evaluations
        );
        Ok(false)
    }
}
