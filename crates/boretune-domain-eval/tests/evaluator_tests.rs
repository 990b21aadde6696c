use approx::assert_relative_eq;
use boretune_domain_acoustics::{
    CalculatorFamily, InstrumentCalculator, PlayingRange, PlayingRangeConfig,
};
use boretune_domain_eval::{
    cents, CentDeviationEvaluator, ErrorStatistics, Evaluator, FmaxEvaluator, FminEvaluator,
    InstrumentTuner, ReactanceEvaluator, SimpleInstrumentTuner, RANGE_FAILURE_DEVIATION,
};
use boretune_domain_instrument::{
    BorePoint, Fingering, GeometryError, Hole, Instrument, LengthUnit, Mouthpiece, MouthpieceKind,
    Note, PhysicalParameters, Termination, Tuning,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn whistle() -> InstrumentCalculator {
    let inst = Instrument::new(
        "whistle",
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
        vec![Hole::new(220.0, 7.0, 3.0)],
        Termination {
            flange_diameter: 16.0,
        },
    );
    InstrumentCalculator::for_family(CalculatorFamily::Whistle, &inst, PhysicalParameters::default())
        .unwrap()
}

fn fingering(name: &str, frequency: f64, open: bool) -> Fingering {
    Fingering::new(Some(Note::new(name, frequency)), vec![open])
}

#[test]
fn no_target_contributes_exactly_zero() {
    let calc = whistle();
    let fingerings = vec![
        fingering("B", 500.0, false),
        Fingering::new(None, vec![true]),
        Fingering::new(Some(Note::default()), vec![true]),
    ];
    let evaluators: Vec<Box<dyn Evaluator>> = vec![
        Box::new(CentDeviationEvaluator::simple()),
        Box::new(FmaxEvaluator::default()),
        Box::new(FminEvaluator::default()),
        Box::new(ReactanceEvaluator),
    ];
    for evaluator in evaluators {
        let errors = evaluator.calculate_error_vector(&calc, &fingerings).unwrap();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[1], 0.0);
        assert_eq!(errors[2], 0.0);
        assert!(errors[0].is_finite());
    }
}

#[test]
fn evaluation_is_idempotent() {
    let calc = whistle();
    let fingerings = vec![fingering("B", 500.0, false), fingering("D", 600.0, true)];
    let evaluator = CentDeviationEvaluator::simple();
    let first = evaluator.calculate_error_vector(&calc, &fingerings).unwrap();
    let second = evaluator.calculate_error_vector(&calc, &fingerings).unwrap();
    assert_eq!(first, second);
}

#[test]
fn predicted_frequency_as_target_gives_zero_error() {
    let calc = whistle();
    let target = Tuning::new("t", 1, vec![fingering("B", 500.0, false)]);
    let predicted = SimpleInstrumentTuner::default()
        .predicted_tuning(&calc, &target)
        .unwrap();
    let nominal = predicted.fingerings[0]
        .target_frequency()
        .expect("closed fingering plays");
    let errors = CentDeviationEvaluator::simple()
        .calculate_error_vector(&calc, &[fingering("B", nominal, false)])
        .unwrap();
    assert!(errors[0].abs() < 1e-3, "error {}", errors[0]);
    assert!(cents(500.0, nominal).abs() < 100.0);
}

#[test]
fn unplayable_fingerings_get_fixed_deviation() {
    let calc = whistle();
    let narrow = PlayingRangeConfig {
        search_ratio: 1.002,
        preferred_solution_ratio: 1.001,
        ..PlayingRangeConfig::default()
    };
    let fingerings = vec![fingering("low", 300.0, false)];
    let evaluator = CentDeviationEvaluator::new(Arc::new(SimpleInstrumentTuner::new(narrow)));
    let errors = evaluator.calculate_error_vector(&calc, &fingerings).unwrap();
    assert_eq!(errors, vec![CentDeviationEvaluator::UNPLAYABLE_DEVIATION]);

    let errors = FmaxEvaluator::new(narrow)
        .calculate_error_vector(&calc, &fingerings)
        .unwrap();
    assert_eq!(errors, vec![RANGE_FAILURE_DEVIATION]);
    let errors = FminEvaluator::new(narrow)
        .calculate_error_vector(&calc, &fingerings)
        .unwrap();
    assert_eq!(errors, vec![RANGE_FAILURE_DEVIATION]);
}

#[test]
fn range_penalty_amplifies_out_of_range_error() {
    let evaluator = CentDeviationEvaluator::simple().with_range_penalty(3.0);
    let predicted = Note {
        name: None,
        frequency: Some(440.0),
        frequency_min: Some(400.0),
        frequency_max: Some(440.0),
    };
    let above = 440.0 * 2f64.powf(100.0 / 1200.0);
    assert_relative_eq!(evaluator.deviation(above, &predicted), -300.0, epsilon = 1e-9);
    let inside = 430.0;
    assert_relative_eq!(
        evaluator.deviation(inside, &predicted),
        cents(440.0, 430.0),
        epsilon = 1e-12
    );
    let below = 400.0 / 2f64.powf(50.0 / 1200.0);
    let expected = cents(440.0, below) + 2.0 * 50.0;
    assert_relative_eq!(evaluator.deviation(below, &predicted), expected, epsilon = 1e-9);
}

#[test]
fn reactance_vanishes_at_playing_frequency() {
    let calc = whistle();
    let closed = Fingering::new(None, vec![false]);
    let f = PlayingRange::new(&calc, &closed)
        .unwrap()
        .find_x_zero(500.0)
        .unwrap();
    let errors = ReactanceEvaluator
        .calculate_error_vector(&calc, &[fingering("B", f, false), fingering("x", 0.9 * f, false)])
        .unwrap();
    assert!(errors[0].abs() < 1e-6);
    assert!(errors[1] < -0.1);
}

#[test]
fn hole_count_mismatch_is_an_error() {
    let calc = whistle();
    let wrong = vec![Fingering::new(Some(Note::new("A", 440.0)), vec![true, true])];
    assert!(matches!(
        CentDeviationEvaluator::simple().calculate_error_vector(&calc, &wrong),
        Err(GeometryError::HoleCountMismatch { .. })
    ));
    assert!(ReactanceEvaluator.calculate_error_vector(&calc, &wrong).is_err());
}

#[test]
fn statistics_skip_fingerings_without_target() {
    let fingerings = vec![
        fingering("a", 400.0, true),
        Fingering::new(None, vec![true]),
        fingering("b", 500.0, true),
    ];
    let stats = ErrorStatistics::from_errors(&fingerings, &[3.0, 100.0, -4.0]);
    assert_eq!(stats.count, 2);
    assert_relative_eq!(stats.mean, -0.5);
    assert_relative_eq!(stats.rms, (12.5f64).sqrt());
    assert_eq!(stats.max_abs, 4.0);
    assert_eq!(stats.worst, Some(2));
    assert_eq!(ErrorStatistics::from_errors(&[], &[]), ErrorStatistics::default());
}
