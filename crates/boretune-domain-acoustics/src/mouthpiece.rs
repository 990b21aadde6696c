use crate::algebra::StateVector;
use boretune_domain_instrument::{Mouthpiece, MouthpieceKind, PhysicalParameters};
use num_complex::Complex64;
use std::f64::consts::PI;

const J: Complex64 = Complex64::new(0.0, 1.0);

/// What a mouthpiece sees besides the bore below it.
#[derive(Debug, Clone, Copy)]
pub struct MouthpieceContext {
    pub bore_radius: f64,
    /// Input state of the closed cavity above the mouthpiece.
    pub headspace: StateVector,
}

impl MouthpieceContext {
    pub fn headspace_admittance(&self) -> Complex64 {
        if self.headspace.p.norm() == 0.0 {
            Complex64::new(0.0, 0.0)
        } else {
            self.headspace.admittance()
        }
    }
}

pub trait MouthpieceCalculator: Send + Sync {
    /// State at the excitation point, given the state of the bore just below.
    fn state_vector(
        &self,
        mouthpiece: &Mouthpiece,
        context: &MouthpieceContext,
        load: StateVector,
        wave_number: f64,
        params: &PhysicalParameters,
    ) -> StateVector;

    fn gain_factor(&self, mouthpiece: &Mouthpiece) -> Option<f64> {
        mouthpiece.gain_factor
    }

    /// Pressure-controlled mouthpieces play near impedance maxima.
    fn is_admittance_driven(&self, mouthpiece: &Mouthpiece) -> bool {
        mouthpiece.kind.is_reed()
    }
}

/// Hands the bore state through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThroughMouthpieceCalculator;

impl MouthpieceCalculator for PassThroughMouthpieceCalculator {
    fn state_vector(
        &self,
        _mouthpiece: &Mouthpiece,
        _context: &MouthpieceContext,
        load: StateVector,
        _wave_number: f64,
        _params: &PhysicalParameters,
    ) -> StateVector {
        load
    }
}

/// Headspace in parallel with the bore, then a series opening impedance.
fn opening_in_series(
    load: StateVector,
    context: &MouthpieceContext,
    z_opening: Complex64,
) -> StateVector {
    let u = load.u + load.p * context.headspace_admittance();
    StateVector::new(load.p + z_opening * u, u)
}

/// Inertance of an air plug of `effective_length` over `area`, plus the
/// low-frequency radiation resistance of the opening.
fn opening_impedance(
    area: f64,
    effective_length: f64,
    wave_number: f64,
    params: &PhysicalParameters,
) -> Complex64 {
    let rho_c = params.rho() * params.speed_of_sound();
    let equivalent_radius = (area / PI).sqrt();
    let ka = wave_number * equivalent_radius;
    let resistance = rho_c / area * 0.25 * ka * ka;
    let reactance = rho_c * wave_number * effective_length / area;
    Complex64::new(resistance, reactance)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FippleMouthpieceCalculator;

impl FippleMouthpieceCalculator {
    pub const DEFAULT_FIPPLE_FACTOR: f64 = 1.0;
}

impl MouthpieceCalculator for FippleMouthpieceCalculator {
    fn state_vector(
        &self,
        mouthpiece: &Mouthpiece,
        context: &MouthpieceContext,
        load: StateVector,
        wave_number: f64,
        params: &PhysicalParameters,
    ) -> StateVector {
        let MouthpieceKind::Fipple {
            window_length,
            window_width,
            window_height,
            windway_height,
            fipple_factor,
            ..
        } = &mouthpiece.kind
        else {
            return load;
        };
        let area = window_length * window_width;
        let equivalent_radius = (area / PI).sqrt();
        let height = window_height.or(*windway_height).unwrap_or(0.0);
        let effective_length = fipple_factor.unwrap_or(Self::DEFAULT_FIPPLE_FACTOR)
            * (height + 1.7 * equivalent_radius);
        let z_window = opening_impedance(area, effective_length, wave_number, params);
        opening_in_series(load, context, z_window)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EmbouchureMouthpieceCalculator;

impl MouthpieceCalculator for EmbouchureMouthpieceCalculator {
    fn state_vector(
        &self,
        mouthpiece: &Mouthpiece,
        context: &MouthpieceContext,
        load: StateVector,
        wave_number: f64,
        params: &PhysicalParameters,
    ) -> StateVector {
        let MouthpieceKind::Embouchure {
            length,
            width,
            height,
            ..
        } = &mouthpiece.kind
        else {
            return load;
        };
        // Oval hole.
        let area = 0.25 * PI * length * width;
        let equivalent_radius = (area / PI).sqrt();
        let effective_length = height + 1.7 * equivalent_radius;
        let z_hole = opening_impedance(area, effective_length, wave_number, params);
        opening_in_series(load, context, z_hole)
    }
}

/// Reed compliance as an equivalent volume `beta · pi r³` in parallel with
/// the bore and headspace.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReedMouthpieceCalculator;

impl MouthpieceCalculator for ReedMouthpieceCalculator {
    fn state_vector(
        &self,
        mouthpiece: &Mouthpiece,
        context: &MouthpieceContext,
        load: StateVector,
        wave_number: f64,
        params: &PhysicalParameters,
    ) -> StateVector {
        if !mouthpiece.kind.is_reed() {
            return load;
        }
        let r = context.bore_radius;
        let volume = mouthpiece.beta.unwrap_or(0.0) * PI * r * r * r;
        let y_reed = J * wave_number * volume / (params.rho() * params.speed_of_sound());
        let y = context.headspace_admittance() + y_reed;
        StateVector::new(load.p, load.u + load.p * y)
    }
}

/// Picks the model from the mouthpiece kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct KindMouthpieceCalculator;

impl MouthpieceCalculator for KindMouthpieceCalculator {
    fn state_vector(
        &self,
        mouthpiece: &Mouthpiece,
        context: &MouthpieceContext,
        load: StateVector,
        wave_number: f64,
        params: &PhysicalParameters,
    ) -> StateVector {
        match mouthpiece.kind {
            MouthpieceKind::Fipple { .. } => FippleMouthpieceCalculator.state_vector(
                mouthpiece,
                context,
                load,
                wave_number,
                params,
            ),
            MouthpieceKind::Embouchure { .. } => EmbouchureMouthpieceCalculator.state_vector(
                mouthpiece,
                context,
                load,
                wave_number,
                params,
            ),
            MouthpieceKind::SingleReed { .. }
            | MouthpieceKind::DoubleReed { .. }
            | MouthpieceKind::LipReed { .. } => ReedMouthpieceCalculator.state_vector(
                mouthpiece,
                context,
                load,
                wave_number,
                params,
            ),
        }
    }
}
