use boretune_ports::optimizer::{
    Bounds, BudgetedObjective, ObjectiveFn, OptimizerError, OptimizerPort, OptimumReport,
};
use boretune_ports::types::AlgorithmType;
use log::debug;
use metaheuristics_nature::methods::De;
use metaheuristics_nature::{Bounded, ObjFunc, Solver};
use std::sync::{Mutex, MutexGuard};

/// Differential evolution, run by `metaheuristics-nature`.
///
/// A supplied start point is evaluated before the random population, so the
/// result is never worse than the start. Without a seed every run draws
/// fresh entropy.
#[derive(Clone, Debug, PartialEq)]
pub struct DifferentialEvolutionOptimizer {
    pub population: usize,
    /// Stop once the best value has improved by less than this relative
    /// amount over [`STALL_GENERATIONS`] generations. Zero disables the test.
    pub f_tolerance: f64,
    pub seed: Option<u64>,
}

const MIN_POPULATION: usize = 4;

pub const STALL_GENERATIONS: usize = 25;

impl Default for DifferentialEvolutionOptimizer {
    fn default() -> Self {
        Self {
            population: 20,
            f_tolerance: 1e-10,
            seed: None,
        }
    }
}

impl DifferentialEvolutionOptimizer {
    pub fn new(population: usize, seed: Option<u64>) -> Self {
        Self {
            population,
            seed,
            ..Self::default()
        }
    }

    pub fn with_f_tolerance(mut self, f_tolerance: f64) -> Self {
        self.f_tolerance = f_tolerance;
        self
    }
}

fn lock<'g, 'a>(
    budget: &'g Mutex<BudgetedObjective<'a>>,
) -> MutexGuard<'g, BudgetedObjective<'a>> {
    budget.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Fitness side of the solver; every call goes through the shared budget.
struct DeObjective<'b, 'a> {
    bound: Vec<[f64; 2]>,
    budget: &'b Mutex<BudgetedObjective<'a>>,
}

impl Bounded for DeObjective<'_, '_> {
    fn bound(&self) -> &[[f64; 2]] {
        &self.bound
    }
}

impl ObjFunc for DeObjective<'_, '_> {
    type Ys = f64;

    fn fitness(&self, xs: &[f64]) -> Self::Ys {
        let mut point = xs.to_vec();
        lock(self.budget)
            .evaluate(&mut point)
            .unwrap_or(f64::INFINITY)
    }
}

/// Tracks the best value between generations.
struct Stall {
    tolerance: f64,
    last: f64,
    quiet: usize,
}

impl Stall {
    fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            last: f64::INFINITY,
            quiet: 0,
        }
    }

    /// True once [`STALL_GENERATIONS`] generations in a row brought no real
    /// improvement.
    fn settled(&mut self, best: f64) -> bool {
        if self.tolerance <= 0.0 {
            return false;
        }
        let gain = self.last - best;
        if gain.is_finite() && gain <= self.tolerance * (1.0 + best.abs()) {
            self.quiet += 1;
        } else {
            self.quiet = 0;
        }
        self.last = best;
        self.quiet >= STALL_GENERATIONS
    }
}

impl OptimizerPort for DifferentialEvolutionOptimizer {
    fn name(&self) -> &'static str {
        "de"
    }

    fn algorithm_type(&self) -> AlgorithmType {
        AlgorithmType::Global
    }

    fn minimize(
        &self,
        objective: &mut dyn ObjectiveFn,
        bounds: &Bounds,
        start: Option<&[f64]>,
        max_evaluations: usize,
    ) -> Result<OptimumReport, OptimizerError> {
        let n = bounds.dimension();
        if let Some(x) = start {
            if x.len() != n {
                return Err(OptimizerError::DimensionMismatch {
                    expected: n,
                    found: x.len(),
                });
            }
        }
        let mut budget = BudgetedObjective::new(objective, bounds, max_evaluations)?;
        if let Some(x) = start {
            budget.evaluate(&mut x.to_vec());
        }
        if n == 0 {
            budget.evaluate(&mut []);
            return budget.into_report(true);
        }

        let size = self.population.max(MIN_POPULATION);
        let shared = Mutex::new(budget);
        let mut stall = Stall::new(self.f_tolerance);
        let mut generations = 0usize;
        let mut converged = false;
        {
            let func = DeObjective {
                bound: bounds
                    .lower()
                    .iter()
                    .zip(bounds.upper())
                    .map(|(&lo, &hi)| [lo, hi])
                    .collect(),
                budget: &shared,
            };
            // A generation is only started when the whole population fits in
            // what is left, so a seeded run never depends on which trials the
            // budget cut off.
            let mut builder = Solver::build(De::default(), func)
                .pop_num(size)
                .task(|_ctx| {
                    let budget = lock(&shared);
                    if budget.used() + size > max_evaluations {
                        return true;
                    }
                    let best = budget.best_value().unwrap_or(f64::INFINITY);
                    converged = stall.settled(best);
                    if !converged {
                        generations += 1;
                    }
                    converged
                });
            if let Some(seed) = self.seed {
                builder = builder.seed(seed);
            }
            let _ = builder.solve();
        }

        let budget = shared
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        debug!(
            "differential evolution: {} generations, {} evaluations, best {:?}",
            generations,
            budget.used(),
            budget.best_value()
        );
        budget.into_report(converged)
    }
}
