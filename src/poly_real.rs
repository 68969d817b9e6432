//! Real polynomials in `z^-1` and rational transfer functions built from them.
//!
//! A fraction is `[numerator, denominator]`, each ordered in ascending powers,
//! the same layout [`BasicFilter::get_transfer_function_coefficients`] returns.
//!
//! [`BasicFilter::get_transfer_function_coefficients`]: crate::BasicFilter::get_transfer_function_coefficients

use crate::error::{Result, SynthError};
use crate::math::{cos, sin, sqrt};
use alloc::{vec, vec::Vec};
use core::f64::consts::PI;

/// Multiplies two real polynomials (discrete convolution of their coefficients).
fn multiply(a1: &[f64], a2: &[f64], eps: Option<f64>) -> Result<Vec<f64>> {
    if a1.is_empty() || a2.is_empty() {
        return Err(SynthError::InvalidInput {
            reason: "polynomial has no coefficients",
        });
    }
    let mut out = vec![0.0; a1.len() + a2.len() - 1];
    for (i, x) in a1.iter().enumerate() {
        for (j, y) in a2.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    Ok(trim(out, eps))
}

/// Drops highest-order coefficients whose magnitude is at most `eps`, keeping at least one.
fn trim(mut a: Vec<f64>, eps: Option<f64>) -> Vec<f64> {
    let eps = eps.unwrap_or(0.0);
    while a.len() > 1 && a.last().is_some_and(|c| c.abs() <= eps) {
        a.pop();
    }
    a
}

/// Multiplies two transfer functions, i.e. connects the filters in series.
///
/// # Errors
///
/// [`SynthError::InvalidInput`] if either fraction is not `[numerator, denominator]` or a
/// polynomial is empty.
pub fn multiply_fractions(
    f1: &[Vec<f64>],
    f2: &[Vec<f64>],
    eps: Option<f64>,
) -> Result<Vec<Vec<f64>>> {
    let (Some(top1), Some(bottom1), Some(top2), Some(bottom2)) =
        (f1.first(), f1.get(1), f2.first(), f2.get(1))
    else {
        return Err(SynthError::InvalidInput {
            reason: "transfer function needs a numerator and a denominator",
        });
    };
    Ok(vec![
        multiply(top1, top2, eps)?,
        multiply(bottom1, bottom2, eps)?,
    ])
}

/// Evaluates `|P(e^-jw)|` for a polynomial in ascending powers of `z^-1`.
fn polynomial_magnitude(a: &[f64], w: f64) -> f64 {
    let (re, im) = a
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(re, im), (k, c)| {
            let phase = w * k as f64;
            (re + c * cos(phase), im - c * sin(phase))
        });
    sqrt(re * re + im * im)
}

/// Magnitude of a transfer function at frequency `f` (Hz).
///
/// Returns `f64::INFINITY` exactly at a pole on the unit circle.
///
/// # Errors
///
/// [`SynthError::InvalidInput`] if `fraction` is malformed, [`SynthError::NonPositive`] for a
/// zero sample rate.
pub fn magnitude_response(fraction: &[Vec<f64>], f: f64, sample_rate: usize) -> Result<f64> {
    let (Some(top), Some(bottom)) = (fraction.first(), fraction.get(1)) else {
        return Err(SynthError::InvalidInput {
            reason: "transfer function needs a numerator and a denominator",
        });
    };
    if sample_rate == 0 {
        return Err(SynthError::NonPositive {
            what: "sample rate",
            value: 0.0,
        });
    }
    let w = 2.0 * PI * f / sample_rate as f64;
    let den = polynomial_magnitude(bottom, w);
    if den == 0.0 {
        return Ok(f64::INFINITY);
    }
    Ok(polynomial_magnitude(top, w) / den)
}
