use boretune_app::{AppError, EvaluatorKind, OptimizationRequest, TunerKind, Workbench};
use boretune_core::ObjectiveShape;
use boretune_domain_acoustics::CalculatorFamily;
use boretune_domain_eval::cents;
use boretune_domain_instrument::{
    BorePoint, Fingering, Hole, Instrument, LengthUnit, Mouthpiece, MouthpieceKind, Note,
    Termination, Tuning,
};
use boretune_ports::storage::SettingsDto;
use boretune_ports::types::OptimizerKind;
use pretty_assertions::assert_eq;

fn whistle(hole_positions: &[f64]) -> Instrument {
    Instrument::new(
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
        hole_positions
            .iter()
            .map(|&p| Hole::new(p, 7.0, 3.0))
            .collect(),
        Termination {
            flange_diameter: 16.0,
        },
    )
}

fn single_note(frequency: f64) -> Tuning {
    Tuning::new(
        "single",
        0,
        vec![Fingering::new(Some(Note::new("A4", frequency)), Vec::new())],
    )
}

/// Six-hole fingering chart, from all closed to all open, with rough
/// major-scale targets.
fn six_hole_chart() -> Vec<Fingering> {
    let ratios = [1.0, 9.0 / 8.0, 5.0 / 4.0, 4.0 / 3.0, 3.0 / 2.0, 5.0 / 3.0, 15.0 / 8.0];
    ratios
        .iter()
        .enumerate()
        .map(|(open, ratio)| {
            let holes = (0..6).map(|h| h >= 6 - open).collect();
            Fingering::new(Some(Note::new(format!("step {open}"), 510.0 * ratio)), holes)
        })
        .collect()
}

#[test]
fn bore_length_moves_a_whistle_onto_its_note() {
    let workbench = Workbench::new(None);
    let outcome = workbench
        .optimize(OptimizationRequest {
            instrument: whistle(&[]),
            family: CalculatorFamily::Whistle,
            tuning: single_note(440.0),
            evaluator: EvaluatorKind::CentDeviation(TunerKind::Simple),
            shape: ObjectiveShape::bore_length(),
            lower_bounds: vec![0.2],
            upper_bounds: vec![0.7],
        })
        .unwrap();

    assert!(outcome.improved);
    assert!(outcome.final_norm <= outcome.initial_norm);
    assert!(outcome.final_norm < 1e-2, "norm {}", outcome.final_norm);
    assert_eq!(outcome.instrument.unit, LengthUnit::Millimetres);
    let length = outcome.instrument.bore_length();
    assert!((330.0..380.0).contains(&length), "length {length}");
    assert_eq!(outcome.statistics.count, 1);
    assert!(outcome.statistics.max_abs < 0.1);

    let predicted = workbench
        .predicted_tuning(
            CalculatorFamily::Whistle,
            &outcome.instrument,
            &single_note(440.0),
            TunerKind::Simple,
        )
        .unwrap();
    let played = predicted.fingerings[0]
        .note
        .as_ref()
        .and_then(|n| n.frequency)
        .unwrap();
    assert!(cents(played, 440.0).abs() < 0.1, "plays {played}");

    let calc = workbench
        .calculator(CalculatorFamily::Whistle, &outcome.instrument)
        .unwrap();
    let reactance = calc.calc_z_for(440.0, &Fingering::new(None, Vec::new())).unwrap();
    assert!((reactance.im / calc.z0()).abs() < 1e-3);
}

#[test]
fn multi_start_reaches_the_same_length() {
    let mut workbench = Workbench::new(None);
    workbench
        .update_settings(SettingsDto {
            max_evaluations: 400,
            multi_start_points: Some(3),
            ..SettingsDto::default()
        })
        .unwrap();
    let outcome = workbench
        .optimize(OptimizationRequest {
            instrument: whistle(&[]),
            family: CalculatorFamily::Whistle,
            tuning: single_note(440.0),
            evaluator: EvaluatorKind::CentDeviation(TunerKind::Simple),
            shape: ObjectiveShape::bore_length(),
            lower_bounds: vec![0.2],
            upper_bounds: vec![0.7],
        })
        .unwrap();
    assert!(outcome.improved);
    assert!(outcome.statistics.max_abs < 0.1, "{:?}", outcome.statistics);
    let length = outcome.instrument.bore_length();
    assert!((330.0..380.0).contains(&length), "length {length}");
}

#[test]
fn hole_sizes_stay_within_their_bounds() {
    let mut workbench = Workbench::new(None);
    workbench
        .update_settings(SettingsDto {
            optimizer: OptimizerKind::DifferentialEvolution,
            max_evaluations: 150,
            seed: Some(5),
            de_population: 10,
            ..SettingsDto::default()
        })
        .unwrap();
    let instrument = whistle(&[120.0, 140.0, 160.0, 180.0, 200.0, 220.0]);
    let chart = Tuning::new("chart", 6, six_hole_chart());
    let predicted = workbench
        .predicted_tuning(CalculatorFamily::Whistle, &instrument, &chart, TunerKind::Simple)
        .unwrap();
    let fingerings = predicted
        .fingerings
        .iter()
        .zip(chart.fingerings)
        .filter_map(|(played, fingering)| {
            let frequency = played.note.as_ref()?.frequency?;
            Some(Fingering {
                note: Some(Note::new("target", frequency * 1.01)),
                ..fingering
            })
        })
        .collect::<Vec<_>>();
    let targets = fingerings.len();
    assert!(targets > 0);

    let outcome = workbench
        .optimize(OptimizationRequest {
            instrument,
            family: CalculatorFamily::Whistle,
            tuning: Tuning::new("sharp", 6, fingerings),
            evaluator: EvaluatorKind::CentDeviation(TunerKind::Simple),
            shape: ObjectiveShape::hole_sizes(),
            lower_bounds: vec![0.004; 6],
            upper_bounds: vec![0.0091; 6],
        })
        .unwrap();

    assert!(outcome.final_norm <= outcome.initial_norm);
    assert_eq!(outcome.statistics.count, targets);
    assert_eq!(outcome.instrument.holes.len(), 6);
    for hole in &outcome.instrument.holes {
        assert!(
            hole.diameter >= 4.0 - 1e-9 && hole.diameter <= 9.1 + 1e-9,
            "diameter {}",
            hole.diameter
        );
    }
}

#[test]
fn mismatched_tuning_is_rejected() {
    let workbench = Workbench::new(None);
    let result = workbench.optimize(OptimizationRequest {
        instrument: whistle(&[]),
        family: CalculatorFamily::Whistle,
        tuning: Tuning::new("chart", 6, six_hole_chart()),
        evaluator: EvaluatorKind::Reactance,
        shape: ObjectiveShape::bore_length(),
        lower_bounds: vec![0.2],
        upper_bounds: vec![0.7],
    });
    assert!(matches!(result, Err(AppError::Objective(_))));
}
