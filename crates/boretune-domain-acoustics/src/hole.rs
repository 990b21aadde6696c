use crate::algebra::TransferMatrix;
use boretune_domain_instrument::{HoleSection, PhysicalParameters};
use num_complex::Complex64;

const J: Complex64 = Complex64::new(0.0, 1.0);

pub trait HoleCalculator: Send + Sync {
    fn transfer_matrix(
        &self,
        hole: &HoleSection,
        is_open: bool,
        wave_number: f64,
        params: &PhysicalParameters,
    ) -> TransferMatrix;
}

/// Symmetric T network: half the series impedance on either side of the
/// shunt branch.
pub fn tee_matrix(za: Complex64, ys: Complex64) -> TransferMatrix {
    let zy = za * ys;
    let diagonal = 1.0 + 0.5 * zy;
    TransferMatrix::new(diagonal, za * (1.0 + 0.25 * zy), ys, diagonal)
}

/// Lefebvre-Kergomard tone-hole model.
#[derive(Debug, Clone, Copy)]
pub struct DefaultHoleCalculator {
    /// Scales every hole radius; 1.0 leaves holes unchanged.
    pub hole_size_mult: f64,
}

impl Default for DefaultHoleCalculator {
    fn default() -> Self {
        Self {
            hole_size_mult: 1.0,
        }
    }
}

impl HoleCalculator for DefaultHoleCalculator {
    fn transfer_matrix(
        &self,
        hole: &HoleSection,
        is_open: bool,
        wave_number: f64,
        params: &PhysicalParameters,
    ) -> TransferMatrix {
        let k = wave_number;
        let b = hole.radius * self.hole_size_mult;
        let a = hole.bore_radius;
        let t = hole.height;
        let delta = b / a;
        let delta2 = delta * delta;

        let z0 = params.calc_z0(a);
        let z0h = params.calc_z0(b);

        let tm = b * delta * (1.0 + 0.207 * delta * delta2) / 8.0;
        let te = t + tm;
        let ti = b
            * (0.822 - 0.095 * delta - 1.566 * delta2 + 2.138 * delta2 * delta
                - 1.640 * delta2 * delta2
                + 0.502 * delta2 * delta2 * delta);
        let tan_kte = (k * te).tan();

        let (ys, ta) = if is_open {
            let kb = k * b;
            let zr = Complex64::new(
                0.25 * kb * kb,
                kb * (0.822 - 0.47 * (b / (a + t)).powf(0.8)),
            );
            let zo = (zr + J * tan_kte) / (1.0 + J * zr * tan_kte);
            let wall_loss = params.alpha_constant() * k.sqrt() * te / b;
            let zs = z0h * (J * k * ti + zo + wall_loss);
            let ta = b * delta2 * (-0.37 + 0.087 * delta);
            (1.0 / zs, ta)
        } else {
            let ys = tan_kte / (J * z0h * (k * ti * tan_kte - 1.0));
            let ta = b * delta2 * (-0.12 - 0.17 * (2.4 * t / b).tanh());
            (ys, ta)
        };
        let za = J * k * ta * z0;
        tee_matrix(za, ys)
    }
}

/// Keefe (1990) tone-hole model, used for whistles.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeefeHoleCalculator;

impl HoleCalculator for KeefeHoleCalculator {
    fn transfer_matrix(
        &self,
        hole: &HoleSection,
        is_open: bool,
        wave_number: f64,
        params: &PhysicalParameters,
    ) -> TransferMatrix {
        let k = wave_number;
        let b = hole.radius;
        let a = hole.bore_radius;
        let t = hole.height;
        let delta = b / a;
        let delta2 = delta * delta;

        let z0 = params.calc_z0(a);
        let z0h = params.calc_z0(b);
        let tan_kt = (k * t).tan();

        let (ys, ta) = if is_open {
            let denominator = 1.0 - 0.61 * k * b * tan_kt;
            let numerator = tan_kt / k + b * (1.40 - 0.58 * delta2);
            let te = if denominator.abs() > 1e-6 {
                numerator / denominator
            } else {
                numerator / 1e-6_f64.copysign(denominator)
            };
            let alpha = params.alpha_constant() * k.sqrt() / b;
            let xi = 0.25 * (k * b).powi(2) + alpha * t;
            let zs = z0h * (J * k * te + xi);
            let ta = 0.47 * b * delta2 * delta2
                / ((1.84 * t / b).tanh() + 0.62 * delta2 + 0.64 * delta);
            (1.0 / zs, ta)
        } else {
            // Zs = -j Z0h cot(kt), inverted without the pole at t = 0.
            let ys = J * tan_kt / z0h;
            let ta = 0.47 * b * delta2 * delta2
                / (1.0 / (1.84 * t / b).tanh() + 0.62 * delta2 + 0.64 * delta);
            (ys, ta)
        };
        let za = -J * z0 * k * ta;
        tee_matrix(za, ys)
    }
}
