use boretune_domain_acoustics::{CalculatorFamily, InstrumentCalculator, PlayingRange};
use boretune_domain_eval::{
    cents, InstrumentTuner, LinearVInstrumentTuner, LinearXInstrumentTuner, SimpleInstrumentTuner,
    TuningBasis,
};
use boretune_domain_instrument::{
    BorePoint, Fingering, Hole, Instrument, LengthUnit, Mouthpiece, MouthpieceKind, Note,
    PhysicalParameters, Termination, Tuning,
};
use pretty_assertions::assert_eq;

fn whistle(kind: MouthpieceKind, family: CalculatorFamily) -> InstrumentCalculator {
    let inst = Instrument::new(
        "whistle",
        LengthUnit::Millimetres,
        Mouthpiece::new(0.0, kind),
        vec![BorePoint::new(0.0, 16.0), BorePoint::new(300.0, 16.0)],
        vec![Hole::new(220.0, 7.0, 3.0)],
        Termination {
            flange_diameter: 16.0,
        },
    );
    InstrumentCalculator::for_family(family, &inst, PhysicalParameters::default()).unwrap()
}

fn fipple() -> MouthpieceKind {
    MouthpieceKind::Fipple {
        window_length: 5.0,
        window_width: 10.0,
        window_height: Some(2.0),
        windway_length: None,
        windway_height: None,
        fipple_factor: None,
    }
}

/// Targets just below each fingering's fmax, well inside its playing range.
fn tuning_inside_range(calc: &InstrumentCalculator) -> Tuning {
    let mut fingerings = Vec::new();
    for (name, open, guess) in [("low", false, 520.0), ("high", true, 600.0)] {
        let probe = Fingering::new(None, vec![open]);
        let fmax = PlayingRange::new(calc, &probe)
            .unwrap()
            .find_x_zero(guess)
            .unwrap();
        fingerings.push(Fingering::new(Some(Note::new(name, 0.995 * fmax)), vec![open]));
    }
    fingerings.push(Fingering::new(None, vec![true]));
    Tuning::new("inside", 1, fingerings)
}

fn assert_basis_notes_recovered(tuner: &dyn InstrumentTuner, calc: &InstrumentCalculator) {
    let target = tuning_inside_range(calc);
    assert!(tuner.basis(calc, &target).is_some());
    let predicted = tuner.predicted_tuning(calc, &target).unwrap();
    assert_eq!(predicted.fingerings.len(), 3);
    for (t, p) in target.fingerings.iter().zip(&predicted.fingerings).take(2) {
        let want = t.target_frequency().unwrap();
        let note = p.note.as_ref().unwrap();
        let got = note.frequency.unwrap();
        assert!(cents(got, want).abs() < 0.01, "{want} vs {got}");
        let (fmin, fmax) = (note.frequency_min.unwrap(), note.frequency_max.unwrap());
        assert!(fmin < got && got <= fmax);
    }
    assert_eq!(predicted.fingerings[2].note.as_ref().unwrap().frequency, None);
}

#[test]
fn basis_interpolates_linearly() {
    let basis = TuningBasis {
        low_frequency: 400.0,
        low_value: -2.0,
        high_frequency: 800.0,
        high_value: 2.0,
    };
    assert_eq!(basis.value_at(600.0), 0.0);
    assert_eq!(basis.value_at(400.0), -2.0);
    let flat = TuningBasis {
        high_frequency: 400.0,
        ..basis
    };
    assert_eq!(flat.value_at(900.0), -2.0);
}

#[test]
fn linear_x_recovers_its_basis_notes() {
    let calc = whistle(fipple(), CalculatorFamily::Whistle);
    assert_basis_notes_recovered(&LinearXInstrumentTuner::default(), &calc);
}

#[test]
fn linear_v_recovers_its_basis_notes() {
    let calc = whistle(fipple(), CalculatorFamily::Whistle);
    assert_basis_notes_recovered(&LinearVInstrumentTuner::default(), &calc);
}

#[test]
fn linear_v_velocity_round_trips() {
    let v = LinearVInstrumentTuner::velocity(500.0, 0.005, -3.0);
    let r = LinearVInstrumentTuner::z_ratio_for(500.0, 0.005, v);
    assert!((r + 3.0).abs() < 1e-9);
}

#[test]
fn simple_tuner_is_never_above_fmax() {
    let calc = whistle(fipple(), CalculatorFamily::Whistle);
    let target = tuning_inside_range(&calc);
    let simple = SimpleInstrumentTuner::default()
        .predicted_tuning(&calc, &target)
        .unwrap();
    let linear = LinearXInstrumentTuner::default()
        .predicted_tuning(&calc, &target)
        .unwrap();
    for (s, l) in simple.fingerings.iter().zip(&linear.fingerings).take(2) {
        let s = s.target_frequency().unwrap();
        let l = l.note.as_ref().unwrap();
        assert!((s - l.frequency_max.unwrap()).abs() < 1e-6);
    }
}

#[test]
fn linear_v_falls_back_to_linear_x_for_reeds() {
    let calc = whistle(
        MouthpieceKind::SingleReed { alpha: None },
        CalculatorFamily::Reed,
    );
    let target = Tuning::new(
        "reed",
        1,
        vec![
            Fingering::new(Some(Note::new("low", 260.0)), vec![false]),
            Fingering::new(Some(Note::new("high", 300.0)), vec![true]),
        ],
    );
    let v = LinearVInstrumentTuner::default()
        .predicted_tuning(&calc, &target)
        .unwrap();
    let x = LinearXInstrumentTuner::default()
        .predicted_tuning(&calc, &target)
        .unwrap();
    assert_eq!(v, x);
}
