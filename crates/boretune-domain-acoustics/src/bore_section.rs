use crate::algebra::TransferMatrix;
use crate::tube;
use boretune_domain_instrument::{BoreSection, PhysicalParameters};
use num_complex::Complex64;

pub trait BoreSectionCalculator: Send + Sync {
    fn transfer_matrix(
        &self,
        section: &BoreSection,
        wave_number: f64,
        params: &PhysicalParameters,
    ) -> TransferMatrix;
}

/// Lossless cylinders and cones.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleBoreSectionCalculator;

impl BoreSectionCalculator for SimpleBoreSectionCalculator {
    fn transfer_matrix(
        &self,
        section: &BoreSection,
        wave_number: f64,
        params: &PhysicalParameters,
    ) -> TransferMatrix {
        tube::cone_matrix(
            Complex64::new(wave_number, 0.0),
            wave_number,
            section.length,
            section.left_radius,
            section.right_radius,
            params,
        )
    }
}

/// Thermo-viscous wall losses, applied through a complex wave number taken
/// at the section's mean-loss radius.
#[derive(Debug, Clone, Copy, Default)]
pub struct GordonBoreSectionCalculator;

impl BoreSectionCalculator for GordonBoreSectionCalculator {
    fn transfer_matrix(
        &self,
        section: &BoreSection,
        wave_number: f64,
        params: &PhysicalParameters,
    ) -> TransferMatrix {
        let radius = tube::mean_loss_radius(section.left_radius, section.right_radius);
        let kc = params.complex_wave_number(wave_number, radius);
        tube::cone_matrix(
            kc,
            wave_number,
            section.length,
            section.left_radius,
            section.right_radius,
            params,
        )
    }
}
