/// Interval from `reference` to `frequency` in cents.
pub fn cents(frequency: f64, reference: f64) -> f64 {
    1200.0 * (frequency / reference).log2()
}
