//! Floating point functions used by the filters, resolved once for both math backends.
//!
//! Call sites always use the free-function form `cos(x)`: under `libm` these are the `libm`
//! functions themselves, under `std` thin wrappers around the inherent `f64` methods.

#[cfg(feature = "libm")]
pub(crate) use libm::{cos, exp, round, sin, sqrt};

#[cfg(feature = "std")]
pub(crate) fn sqrt(f: f64) -> f64 {
    f.sqrt()
}
#[cfg(feature = "std")]
pub(crate) fn cos(f: f64) -> f64 {
    f.cos()
}
#[cfg(feature = "std")]
pub(crate) fn sin(f: f64) -> f64 {
    f.sin()
}
#[cfg(feature = "std")]
pub(crate) fn exp(f: f64) -> f64 {
    f.exp()
}
#[cfg(feature = "std")]
pub(crate) fn round(f: f64) -> f64 {
    f.round()
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f64::consts::PI;

    #[test]
    fn sin_and_cos_are_not_swapped() {
        assert!(sin(0.0).abs() < 1e-12);
        assert!((cos(0.0) - 1.0).abs() < 1e-12);
        assert!((sin(PI / 2.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn round_half_away_from_zero() {
        assert_eq!(round(2.5), 3.0);
        assert_eq!(round(83.333), 83.0);
        assert_eq!(round(-0.5), -1.0);
    }
}
