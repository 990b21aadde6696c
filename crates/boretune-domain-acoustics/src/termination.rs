use crate::algebra::StateVector;
use crate::tube;
use boretune_domain_instrument::{PhysicalParameters, TerminationSection};

pub trait TerminationCalculator: Send + Sync {
    fn state_vector(
        &self,
        termination: &TerminationSection,
        is_open: bool,
        wave_number: f64,
        params: &PhysicalParameters,
    ) -> StateVector;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UnflangedEndCalculator;

impl TerminationCalculator for UnflangedEndCalculator {
    fn state_vector(
        &self,
        termination: &TerminationSection,
        is_open: bool,
        wave_number: f64,
        params: &PhysicalParameters,
    ) -> StateVector {
        if !is_open {
            return StateVector::closed_end();
        }
        let a = termination.radius;
        let r = tube::unflanged_reflection(wave_number * a, wave_number, a);
        StateVector::from_impedance(tube::impedance_from_reflection(r, params.calc_z0(a)))
    }
}

/// Blends the unflanged and infinite-flange reflections by how far the
/// flange extends beyond the bore.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlangedEndCalculator;

impl FlangedEndCalculator {
    pub fn flange_weight(termination: &TerminationSection) -> f64 {
        if termination.flange_radius <= termination.radius {
            return 0.0;
        }
        (1.0 - termination.radius / termination.flange_radius).clamp(0.0, 1.0)
    }
}

impl TerminationCalculator for FlangedEndCalculator {
    fn state_vector(
        &self,
        termination: &TerminationSection,
        is_open: bool,
        wave_number: f64,
        params: &PhysicalParameters,
    ) -> StateVector {
        if !is_open {
            return StateVector::closed_end();
        }
        let a = termination.radius;
        let ka = wave_number * a;
        let w = Self::flange_weight(termination);
        let r = tube::unflanged_reflection(ka, wave_number, a) * (1.0 - w)
            + tube::flanged_reflection(ka, wave_number, a) * w;
        StateVector::from_impedance(tube::impedance_from_reflection(r, params.calc_z0(a)))
    }
}

/// Pressure node at the end, no radiation.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdealOpenEndCalculator;

impl TerminationCalculator for IdealOpenEndCalculator {
    fn state_vector(
        &self,
        _termination: &TerminationSection,
        is_open: bool,
        _wave_number: f64,
        _params: &PhysicalParameters,
    ) -> StateVector {
        if is_open {
            StateVector::ideal_open_end()
        } else {
            StateVector::closed_end()
        }
    }
}
