use approx::assert_abs_diff_eq;
use boretune_infra_optim_simplex::NelderMeadOptimizer;
use boretune_ports::optimizer::{Bounds, ClosureObjective, OptimizerError, OptimizerPort};
use pretty_assertions::assert_eq;

fn rosenbrock(x: &[f64]) -> f64 {
    (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2)
}

#[test]
fn finds_the_rosenbrock_valley_floor() {
    let bounds = Bounds::new(vec![-2.0, -2.0], vec![2.0, 2.0]).unwrap();
    let mut f = ClosureObjective::new(2, rosenbrock);
    let report = NelderMeadOptimizer::default()
        .minimize(&mut f, &bounds, Some(&[-1.2, 1.0][..]), 5_000)
        .unwrap();
    assert!(report.converged);
    assert!(report.value < 1e-6, "value {}", report.value);
    assert!((report.point[0] - 1.0).abs() < 1e-2);
    assert!((report.point[1] - 1.0).abs() < 2e-2);
    assert!(report.evaluations <= 5_000);
}

#[test]
fn never_leaves_the_bounds() {
    let bounds = Bounds::new(vec![0.0, -1.0], vec![1.0, 1.0]).unwrap();
    let inside = bounds.clone();
    let mut f = ClosureObjective::new(2, move |x: &[f64]| {
        assert!(inside.contains(x), "evaluated outside bounds: {x:?}");
        (x[0] - 3.0).powi(2) + x[1] * x[1]
    });
    let report = NelderMeadOptimizer::default()
        .minimize(&mut f, &bounds, None, 2_000)
        .unwrap();
    assert_abs_diff_eq!(report.point[0], 1.0, epsilon = 1e-4);
    assert_abs_diff_eq!(report.point[1], 0.0, epsilon = 1e-3);
}

#[test]
fn zero_tolerances_keep_going_until_the_budget() {
    let bounds = Bounds::new(vec![-1.0], vec![1.0]).unwrap();
    let mut count = 0;
    let report = {
        let mut f = ClosureObjective::new(1, |x: &[f64]| {
            count += 1;
            x[0] * x[0]
        });
        NelderMeadOptimizer::new(0.0, 0.0)
            .minimize(&mut f, &bounds, Some(&[0.5][..]), 150)
            .unwrap()
    };
    assert_eq!(report.evaluations, count);
    assert!(count <= 150);
    assert!(report.value < 1e-12, "value {}", report.value);
}

#[test]
fn returns_the_best_point_when_budget_runs_out() {
    let bounds = Bounds::new(vec![-5.0, -5.0], vec![5.0, 5.0]).unwrap();
    let mut f = ClosureObjective::new(2, rosenbrock);
    let start = [-1.2, 1.0];
    let report = NelderMeadOptimizer::default()
        .minimize(&mut f, &bounds, Some(&start[..]), 2)
        .unwrap();
    assert_eq!(report.evaluations, 2);
    assert!(report.value <= rosenbrock(&start));
}

#[test]
fn rejects_bad_problems() {
    let bounds = Bounds::new(vec![0.0, 0.0], vec![1.0, 1.0]).unwrap();
    let mut f = ClosureObjective::new(2, rosenbrock);
    let optimizer = NelderMeadOptimizer::default();
    assert_eq!(
        optimizer.minimize(&mut f, &bounds, Some(&[0.5][..]), 10),
        Err(OptimizerError::DimensionMismatch {
            expected: 2,
            found: 1
        })
    );
    assert_eq!(
        optimizer.minimize(&mut f, &bounds, None, 0),
        Err(OptimizerError::EmptyBudget)
    );
}

