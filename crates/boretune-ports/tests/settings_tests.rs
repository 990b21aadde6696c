use boretune_ports::storage::{SettingsDto, SettingsError};
use boretune_ports::types::Fraction01;
use pretty_assertions::assert_eq;

#[test]
fn defaults_are_valid() {
    assert_eq!(SettingsDto::default().validate(), Ok(()));
}

#[test]
fn rejects_settings_the_engine_cannot_run_with() {
    let base = SettingsDto::default();
    let cases = vec![
        (
            SettingsDto {
                max_evaluations: 0,
                ..base.clone()
            },
            SettingsError::EmptyBudget,
        ),
        (
            SettingsDto {
                de_population: 3,
                ..base.clone()
            },
            SettingsError::PopulationTooSmall(3),
        ),
        (
            SettingsDto {
                multi_start_points: Some(0),
                ..base.clone()
            },
            SettingsError::NoStartPoints,
        ),
        (
            SettingsDto {
                temperature_c: -300.0,
                ..base.clone()
            },
            SettingsError::BelowAbsoluteZero(-300.0),
        ),
        (
            SettingsDto {
                relative_humidity: Fraction01(1.5),
                ..base.clone()
            },
            SettingsError::HumidityOutOfRange(1.5),
        ),
        (
            SettingsDto {
                granularity: 0.0,
                ..base.clone()
            },
            SettingsError::NotPositive {
                field: "granularity",
                value: 0.0,
            },
        ),
        (
            SettingsDto {
                range_penalty_factor: Some(-1.0),
                ..base.clone()
            },
            SettingsError::Negative {
                field: "range_penalty_factor",
                value: -1.0,
            },
        ),
    ];
    for (settings, expected) in cases {
        assert_eq!(settings.validate(), Err(expected));
    }
}

#[test]
fn nan_is_not_a_pressure() {
    let settings = SettingsDto {
        pressure_kpa: f64::NAN,
        ..SettingsDto::default()
    };
    assert!(matches!(
        settings.validate(),
        Err(SettingsError::NotPositive {
            field: "pressure_kpa",
            ..
        })
    ));
}
