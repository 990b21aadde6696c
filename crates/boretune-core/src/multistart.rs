use crate::range_processor::GridRangeProcessor;
use boretune_ports::optimizer::{Bounds, ObjectiveFn, OptimizerError, OptimizerPort, OptimumReport};
use boretune_ports::types::AlgorithmType;
use log::debug;
use std::sync::Arc;

/// Runs a base optimiser once per grid start and keeps the best result.
///
/// The evaluation budget is split evenly between the starts, so callers
/// scale it by the number of points.
pub struct MultiStartOptimizer {
    base: Arc<dyn OptimizerPort>,
    processor: GridRangeProcessor,
}

impl MultiStartOptimizer {
    pub fn new(base: Arc<dyn OptimizerPort>, processor: GridRangeProcessor) -> Self {
        Self { base, processor }
    }

    pub fn processor(&self) -> &GridRangeProcessor {
        &self.processor
    }
}

impl OptimizerPort for MultiStartOptimizer {
    fn name(&self) -> &'static str {
        "multistart"
    }

    fn algorithm_type(&self) -> AlgorithmType {
        self.base.algorithm_type()
    }

    fn minimize(
        &self,
        objective: &mut dyn ObjectiveFn,
        bounds: &Bounds,
        start: Option<&[f64]>,
        max_evaluations: usize,
    ) -> Result<OptimumReport, OptimizerError> {
        bounds.check_dimension(objective.dimension())?;
        let base = match start {
            Some(x) => x.to_vec(),
            None => bounds.midpoint(),
        };
        let starts = self.processor.starts(bounds, &base);
        let per_start = max_evaluations / starts.len();
        if per_start == 0 {
            return Err(OptimizerError::EmptyBudget);
        }

        let mut best: Option<OptimumReport> = None;
        let mut evaluations = 0;
        for (i, x0) in starts.iter().enumerate() {
            let report = self.base.minimize(objective, bounds, Some(x0.as_slice()), per_start)?;
            debug!(
                "start {}/{}: value {:.6e} after {} evaluations",
                i + 1,
                starts.len(),
                report.value,
                report.evaluations
            );
            evaluations += report.evaluations;
            if best.as_ref().map_or(true, |b| report.value < b.value) {
                best = Some(report);
            }
        }
        let best = best.ok_or(OptimizerError::EmptyBudget)?;
        Ok(OptimumReport {
            evaluations,
            ..best
        })
    }
}
