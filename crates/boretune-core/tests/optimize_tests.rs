use boretune_core::{
    optimize_instrument, van_der_corput, GridRangeProcessor, InstrumentObjective,
    MultiStartOptimizer, ObjectiveError, ObjectiveShape, OptimizeError,
};
use boretune_domain_acoustics::{CalculatorFamily, InstrumentCalculator};
use boretune_domain_eval::CentDeviationEvaluator;
use boretune_domain_instrument::{
    BorePoint, Fingering, Instrument, LengthUnit, Mouthpiece, MouthpieceKind, Note,
    PhysicalParameters, Termination, Tuning,
};
use boretune_ports::optimizer::{
    Bounds, ClosureObjective, ObjectiveFn, OptimizerError, OptimizerPort, OptimumReport,
};
use boretune_ports::types::AlgorithmType;
use pretty_assertions::assert_eq;
use std::sync::Arc;

/// Compass search that always spends its whole budget.
struct PatternSearch;

impl OptimizerPort for PatternSearch {
    fn name(&self) -> &'static str {
        "pattern"
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
        if max_evaluations == 0 {
            return Err(OptimizerError::EmptyBudget);
        }
        let dims = bounds.dimension();
        let mut point = match start {
            Some(x) => bounds.clamped(x),
            None => bounds.midpoint(),
        };
        let mut best = objective.value(&point);
        let mut steps: Vec<f64> = (0..dims).map(|d| 0.25 * bounds.width(d)).collect();
        let mut evaluations = 1;
        let (mut d, mut sign) = (0, 1.0);
        while evaluations < max_evaluations {
            let mut x = point.clone();
            x[d] = (x[d] + sign * steps[d]).clamp(bounds.lower()[d], bounds.upper()[d]);
            let value = objective.value(&x);
            evaluations += 1;
            if value < best {
                best = value;
                point = x;
            } else if sign > 0.0 {
                sign = -1.0;
                continue;
            } else {
                steps[d] *= 0.5;
            }
            sign = 1.0;
            d = (d + 1) % dims;
        }
        Ok(OptimumReport {
            point,
            value: best,
            evaluations,
            converged: true,
        })
    }
}

fn bumpy(x: &[f64]) -> f64 {
    (5.0 * x[0]).sin() + 0.1 * x[0] + 0.01 * (x[1] - 1.0).powi(2)
}

#[test]
fn van_der_corput_sequence() {
    let got: Vec<f64> = (1..=4).map(|i| van_der_corput(i, 2)).collect();
    assert_eq!(got, vec![0.5, 0.25, 0.75, 0.125]);
    assert!((van_der_corput(1, 3) - 1.0 / 3.0).abs() < 1e-15);
}

#[test]
fn grid_starts_cover_the_varying_dimension() {
    let bounds = Bounds::new(vec![0.0, 0.0], vec![4.0, 2.0]).unwrap();
    let starts = GridRangeProcessor::new(vec![0], 4).starts(&bounds, &[9.0, 1.5]);
    assert_eq!(
        starts,
        vec![
            vec![0.5, 1.5],
            vec![1.5, 1.5],
            vec![2.5, 1.5],
            vec![3.5, 1.5],
        ]
    );
    let two = GridRangeProcessor::new(vec![0, 1], 2).starts(&bounds, &[0.0, 0.0]);
    assert_eq!(two, vec![vec![1.0, 1.0], vec![3.0, 0.5]]);
}

#[test]
fn multi_start_spends_the_scaled_budget_and_keeps_the_best() {
    let bounds = Bounds::new(vec![0.0, 0.0], vec![4.0, 2.0]).unwrap();
    let per_start = 40;
    let points = 5;
    let processor = GridRangeProcessor::new(vec![0], points);

    let mut single_count = 0;
    let single = {
        let mut f = ClosureObjective::new(2, |x: &[f64]| {
            single_count += 1;
            bumpy(x)
        });
        PatternSearch
            .minimize(&mut f, &bounds, Some(&[2.0, 1.0][..]), per_start)
            .unwrap()
    };

    let mut multi_count = 0;
    let multi = {
        let mut f = ClosureObjective::new(2, |x: &[f64]| {
            multi_count += 1;
            bumpy(x)
        });
        MultiStartOptimizer::new(Arc::new(PatternSearch), processor.clone())
            .minimize(&mut f, &bounds, Some(&[2.0, 1.0][..]), per_start * points)
            .unwrap()
    };
    assert_eq!(single_count, per_start);
    assert_eq!(multi_count, points * single_count);
    assert_eq!(multi.evaluations, points * single.evaluations);

    for start in processor.starts(&bounds, &[2.0, 1.0]) {
        let mut f = ClosureObjective::new(2, bumpy);
        let run = PatternSearch
            .minimize(&mut f, &bounds, Some(start.as_slice()), per_start)
            .unwrap();
        assert!(multi.value <= run.value);
    }
    assert!(bounds.contains(&multi.point));
}

#[test]
fn multi_start_rejects_a_budget_smaller_than_the_grid() {
    let bounds = Bounds::new(vec![0.0], vec![1.0]).unwrap();
    let mut f = ClosureObjective::new(1, |x: &[f64]| x[0]);
    let err = MultiStartOptimizer::new(Arc::new(PatternSearch), GridRangeProcessor::new(vec![0], 4))
        .minimize(&mut f, &bounds, None, 3)
        .unwrap_err();
    assert_eq!(err, OptimizerError::EmptyBudget);
}

fn plain_whistle() -> InstrumentObjective {
    let instrument = Instrument::new(
        "plain",
        LengthUnit::Millimetres,
        Mouthpiece::new(
            0.0,
            MouthpieceKind::Fipple {
                window_length: 5.0,
                window_width: 10.0,
                window_height: Some(2.0),
                windway_length: None,
                windway_height: None,
                fipple_factor: None,
            },
        ),
        vec![BorePoint::new(0.0, 16.0), BorePoint::new(300.0, 16.0)],
        Vec::new(),
        Termination {
            flange_diameter: 16.0,
        },
    );
    let calc = InstrumentCalculator::for_family(
        CalculatorFamily::Whistle,
        &instrument,
        PhysicalParameters::default(),
    )
    .unwrap();
    let tuning = Tuning::new(
        "A",
        0,
        vec![Fingering::new(Some(Note::new("A4", 440.0)), Vec::new())],
    );
    InstrumentObjective::new(
        calc,
        tuning,
        Arc::new(CentDeviationEvaluator::simple()),
        ObjectiveShape::bore_length(),
    )
    .unwrap()
}

#[test]
fn optimize_requires_bounds() {
    let mut objective = plain_whistle();
    assert_eq!(
        optimize_instrument(&mut objective, Arc::new(PatternSearch)),
        Err(OptimizeError::Objective(ObjectiveError::BoundsNotSet))
    );
}

#[test]
fn optimize_with_grid_improves_the_length() {
    let mut objective = plain_whistle();
    objective.set_lower_bounds(vec![0.2]).unwrap();
    objective.set_upper_bounds(vec![0.7]).unwrap();
    objective.set_max_evaluations(30);
    objective
        .set_range_processor(Some(GridRangeProcessor::new(vec![0], 3)))
        .unwrap();

    let before = objective.evaluations();
    assert_eq!(optimize_instrument(&mut objective, Arc::new(PatternSearch)), Ok(true));
    assert_eq!(objective.evaluations() - before, 90);

    let initial = objective.initial_norm().unwrap();
    let last = objective.final_norm().unwrap();
    assert!(last < initial);
    assert_eq!(objective.current_norm().unwrap(), last);
    let length = objective.instrument().bore_length();
    assert!((200.0..=700.0).contains(&length));
    assert!(length > 300.0, "440 Hz needs a longer bore, got {length}");
}

#[test]
fn optimize_keeps_geometry_when_nothing_improves() {
    let mut objective = plain_whistle();
    objective.set_lower_bounds(vec![0.25]).unwrap();
    objective.set_upper_bounds(vec![0.25]).unwrap();
    objective.set_max_evaluations(5);

    assert_eq!(optimize_instrument(&mut objective, Arc::new(PatternSearch)), Ok(false));
    assert_eq!(objective.initial_norm(), objective.final_norm());
    assert!((objective.instrument().bore_length() - 300.0).abs() < 1e-9);
}

#[test]
fn range_processor_must_fit_the_objective() {
    let mut objective = plain_whistle();
    assert_eq!(
        objective.set_range_processor(Some(GridRangeProcessor::new(vec![1], 3))),
        Err(ObjectiveError::InvalidRangeProcessor {
            index: 1,
            dimensions: 1
        })
    );
}
