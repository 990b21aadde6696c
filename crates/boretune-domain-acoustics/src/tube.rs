//! Closed-form transfer matrices and radiation impedances for straight and
//! conical tubes.

use crate::algebra::TransferMatrix;
use boretune_domain_instrument::PhysicalParameters;
use num_complex::Complex64;
use std::f64::consts::PI;

const J: Complex64 = Complex64::new(0.0, 1.0);

/// Relative radius change below which a cone is treated as a cylinder.
const CYLINDER_TOLERANCE: f64 = 1e-5;

/// Cylinder of `length` and `radius`. `kc` is the (possibly lossy) wave
/// number; with losses the characteristic impedance scales by `kc / k`.
pub fn cylinder_matrix(
    kc: Complex64,
    k: f64,
    length: f64,
    radius: f64,
    params: &PhysicalParameters,
) -> TransferMatrix {
    let zc = params.calc_z0(radius) * kc / k;
    let kl = kc * length;
    let (cos, sin) = (kl.cos(), kl.sin());
    TransferMatrix::new(cos, J * zc * sin, J * sin / zc, cos)
}

/// Spherical-wave cone between `source_radius` (mouthpiece side) and
/// `load_radius`.
pub fn cone_matrix(
    kc: Complex64,
    k: f64,
    length: f64,
    source_radius: f64,
    load_radius: f64,
    params: &PhysicalParameters,
) -> TransferMatrix {
    let dr = load_radius - source_radius;
    if dr.abs() <= CYLINDER_TOLERANCE * source_radius {
        return cylinder_matrix(kc, k, length, 0.5 * (source_radius + load_radius), params);
    }
    // Signed distances from the apex; both share the sign of `dr`.
    let x1 = source_radius * length / dr;
    let x2 = load_radius * length / dr;
    let zc = params.rho() * params.speed_of_sound() / (PI * source_radius * load_radius) * kc / k;
    let kl = kc * length;
    let (cos, sin) = (kl.cos(), kl.sin());
    let ratio = load_radius / source_radius;

    let pp = cos * ratio - sin / (kc * x1);
    let pu = J * zc * sin;
    let up = J / zc * (sin * (1.0 + 1.0 / (kc * kc * x1 * x2)) - cos * length / (kc * x1 * x2));
    let uu = cos / ratio + sin / (kc * x2);
    TransferMatrix::new(pp, pu, up, uu)
}

/// Logarithmic mean radius of a cone: the radius whose boundary-layer loss
/// equals the average loss along the section.
pub fn mean_loss_radius(r1: f64, r2: f64) -> f64 {
    if (r2 - r1).abs() <= CYLINDER_TOLERANCE * r1 {
        0.5 * (r1 + r2)
    } else {
        (r2 - r1) / (r2 / r1).ln()
    }
}

/// Reflection coefficient of an unflanged open pipe end
/// (Silva et al. 2009).
pub fn unflanged_reflection(ka: f64, k: f64, radius: f64) -> Complex64 {
    let ka2 = ka * ka;
    let magnitude = (1.0 + 0.2 * ka - 0.084 * ka2) / (1.0 + 0.2 * ka + 0.416 * ka2);
    let end_correction = radius * (0.6133 + 0.027 * ka2) / (1.0 + 0.19 * ka2);
    -magnitude * (-2.0 * J * k * end_correction).exp()
}

/// Reflection coefficient of a pipe end in an infinite flange
/// (Silva et al. 2009).
pub fn flanged_reflection(ka: f64, k: f64, radius: f64) -> Complex64 {
    let ka2 = ka * ka;
    let magnitude = (1.0 + 0.323 * ka - 0.077 * ka2) / (1.0 + 0.323 * ka + 0.923 * ka2);
    let end_correction = radius * (0.8216 + 0.078 * ka2) / (1.0 + 0.46 * ka2);
    -magnitude * (-2.0 * J * k * end_correction).exp()
}

/// Impedance seen at a pipe end with reflection coefficient `r`.
pub fn impedance_from_reflection(r: Complex64, z0: f64) -> Complex64 {
    z0 * (1.0 + r) / (1.0 - r)
}
