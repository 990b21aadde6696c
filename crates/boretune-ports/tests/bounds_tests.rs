use boretune_ports::{AlgorithmType, Bounds, OptimizerError, OptimizerKind};
use pretty_assertions::assert_eq;

#[test]
fn rejects_mismatched_lengths() {
    let err = Bounds::new(vec![0.0, 1.0], vec![2.0]).unwrap_err();
    assert_eq!(err, OptimizerError::BoundsLengthMismatch { lower: 2, upper: 1 });
}

#[test]
fn rejects_inverted_bounds() {
    let err = Bounds::new(vec![0.0, 3.0], vec![1.0, 2.0]).unwrap_err();
    assert_eq!(
        err,
        OptimizerError::InvalidBounds {
            index: 1,
            lower: 3.0,
            upper: 2.0
        }
    );
}

#[test]
fn clamps_into_box() {
    let bounds = Bounds::new(vec![0.2, -1.0], vec![0.7, 1.0]).unwrap();
    let clamped = bounds.clamped(&[0.9, -4.0]);
    assert_eq!(clamped, vec![0.7, -1.0]);
    assert!(bounds.contains(&clamped));
    assert!(!bounds.contains(&[0.1, 0.0]));
    assert_eq!(bounds.midpoint(), vec![0.45, 0.0]);
}

#[test]
fn equal_bounds_are_valid() {
    let bounds = Bounds::new(vec![0.5], vec![0.5]).unwrap();
    assert_eq!(bounds.width(0), 0.0);
    assert!(bounds.check_dimension(1).is_ok());
    assert!(bounds.check_dimension(2).is_err());
}

#[test]
fn parses_optimizer_names() {
    assert_eq!("NelderMead".parse::<OptimizerKind>().unwrap(), OptimizerKind::NelderMead);
    assert_eq!("de".parse::<OptimizerKind>().unwrap(), OptimizerKind::DifferentialEvolution);
    assert!("bobyqa".parse::<OptimizerKind>().is_err());
    assert_eq!(OptimizerKind::DifferentialEvolution.algorithm_type(), AlgorithmType::Global);
}

#[test]
fn budgeted_objective_projects_and_counts() {
    use boretune_ports::{BudgetedObjective, ClosureObjective};
    let bounds = Bounds::new(vec![0.0], vec![1.0]).unwrap();
    let mut f = ClosureObjective::new(1, |x: &[f64]| (x[0] - 0.25).abs());
    let mut budget = BudgetedObjective::new(&mut f, &bounds, 2).unwrap();
    let mut outside = [3.0];
    assert_eq!(budget.evaluate(&mut outside), Some(0.75));
    assert_eq!(outside, [1.0]);
    assert_eq!(budget.evaluate(&mut [0.5]), Some(0.25));
    assert!(budget.exhausted());
    assert_eq!(budget.evaluate(&mut [0.25]), None);
    let report = budget.into_report(false).unwrap();
    assert_eq!(report.point, vec![0.5]);
    assert_eq!(report.evaluations, 2);

    let mut g = ClosureObjective::new(2, |_: &[f64]| 0.0);
    assert!(matches!(
        BudgetedObjective::new(&mut g, &bounds, 5),
        Err(OptimizerError::DimensionMismatch { expected: 2, found: 1 })
    ));
    let mut h = ClosureObjective::new(1, |_: &[f64]| 0.0);
    assert!(matches!(
        BudgetedObjective::new(&mut h, &bounds, 0),
        Err(OptimizerError::EmptyBudget)
    ));
}
