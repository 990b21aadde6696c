use num_complex::Complex64;
use std::ops::Mul;

const ONE: Complex64 = Complex64::new(1.0, 0.0);
const ZERO: Complex64 = Complex64::new(0.0, 0.0);

/// Acoustic pressure and volume flow at a cross-section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateVector {
    pub p: Complex64,
    pub u: Complex64,
}

impl StateVector {
    pub fn new(p: Complex64, u: Complex64) -> Self {
        Self { p, u }
    }

    /// Rigid wall: no flow.
    pub fn closed_end() -> Self {
        Self::new(ONE, ZERO)
    }

    /// Pressure node.
    pub fn ideal_open_end() -> Self {
        Self::new(ZERO, ONE)
    }

    pub fn from_impedance(z: Complex64) -> Self {
        Self::new(z, ONE)
    }

    pub fn impedance(&self) -> Complex64 {
        self.p / self.u
    }

    pub fn admittance(&self) -> Complex64 {
        self.u / self.p
    }
}

/// A 2×2 complex transfer matrix.
///
/// ```text
/// [p_source]   [pp  pu] [p_load]
/// [u_source] = [up  uu] [u_load]
/// ```
///
/// The load side faces the termination, so a chain is built by walking from
/// the termination towards the mouthpiece.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferMatrix {
    pub pp: Complex64,
    pub pu: Complex64,
    pub up: Complex64,
    pub uu: Complex64,
}

impl TransferMatrix {
    pub fn new(pp: Complex64, pu: Complex64, up: Complex64, uu: Complex64) -> Self {
        Self { pp, pu, up, uu }
    }

    pub fn identity() -> Self {
        Self::new(ONE, ZERO, ZERO, ONE)
    }

    /// An impedance in series with the flow path.
    pub fn series_impedance(z: Complex64) -> Self {
        Self::new(ONE, z, ZERO, ONE)
    }

    /// An admittance branching off the flow path.
    pub fn shunt_admittance(y: Complex64) -> Self {
        Self::new(ONE, ZERO, y, ONE)
    }

    /// `self · other`: `other` sits on the load side of `self`.
    pub fn multiply(&self, other: &TransferMatrix) -> TransferMatrix {
        TransferMatrix {
            pp: self.pp * other.pp + self.pu * other.up,
            pu: self.pp * other.pu + self.pu * other.uu,
            up: self.up * other.pp + self.uu * other.up,
            uu: self.up * other.pu + self.uu * other.uu,
        }
    }

    pub fn apply(&self, load: StateVector) -> StateVector {
        StateVector {
            p: self.pp * load.p + self.pu * load.u,
            u: self.up * load.p + self.uu * load.u,
        }
    }

    pub fn determinant(&self) -> Complex64 {
        self.pp * self.uu - self.pu * self.up
    }
}

impl Mul for TransferMatrix {
    type Output = TransferMatrix;

    fn mul(self, rhs: TransferMatrix) -> TransferMatrix {
        self.multiply(&rhs)
    }
}

impl Mul<StateVector> for TransferMatrix {
    type Output = StateVector;

    fn mul(self, rhs: StateVector) -> StateVector {
        self.apply(rhs)
    }
}
