//! Control contours and their resampling onto the synthesis timeline.
//!
//! A contour is the sparse list of values a user drew for one track
//! (pitch, a formant frequency, a bandwidth, or the amplitude envelope).
//! The point index is the time axis: point `0` sits at the start of the
//! sound and the last point at its end, with the points evenly spaced in
//! between.

use crate::error::{Result, SynthError};
use alloc::{vec, vec::Vec};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An ordered, evenly spaced sequence of control values.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct ControlContour {
    points: Vec<f64>,
}

impl ControlContour {
    /// Wraps drawn points, first point at the start of the sound.
    #[must_use]
    pub fn new(points: Vec<f64>) -> Self {
        ControlContour { points }
    }

    /// A single-point contour, held for the whole sound.
    #[must_use]
    pub fn constant(value: f64) -> Self {
        ControlContour {
            points: vec![value],
        }
    }

    /// The drawn values in time order.
    #[must_use]
    pub fn points(&self) -> &[f64] {
        &self.points
    }

    /// Number of drawn points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Checks that the contour has at least one point and every point is finite.
    ///
    /// # Errors
    ///
    /// [`SynthError::InvalidInput`] for an empty contour, [`SynthError::NonFinite`] for NaN or
    /// infinite points. `what` names the contour in the error.
    pub fn check(&self, what: &'static str) -> Result<()> {
        if self.points.is_empty() {
            return Err(SynthError::InvalidInput {
                reason: "control contour has no points",
            });
        }
        if self.points.iter().any(|p| !p.is_finite()) {
            return Err(SynthError::NonFinite { what });
        }
        Ok(())
    }

    /// Checks [`ControlContour::check`] and additionally that every point is `> 0`.
    ///
    /// # Errors
    ///
    /// As [`ControlContour::check`], plus [`SynthError::NonPositive`] for the first point `<= 0`.
    pub fn check_positive(&self, what: &'static str) -> Result<()> {
        self.check(what)?;
        match self.points.iter().find(|p| **p <= 0.0) {
            Some(&value) => Err(SynthError::NonPositive { what, value }),
            None => Ok(()),
        }
    }

    /// Resamples the contour to `target_len` values, see [`interpolate`].
    ///
    /// # Errors
    ///
    /// See [`interpolate`].
    pub fn resample(&self, target_len: usize) -> Result<Vec<f64>> {
        interpolate(&self.points, target_len)
    }
}

impl From<Vec<f64>> for ControlContour {
    fn from(points: Vec<f64>) -> Self {
        ControlContour::new(points)
    }
}

impl From<&[f64]> for ControlContour {
    fn from(points: &[f64]) -> Self {
        ControlContour::new(points.to_vec())
    }
}

impl<const N: usize> From<[f64; N]> for ControlContour {
    fn from(points: [f64; N]) -> Self {
        ControlContour::new(points.to_vec())
    }
}

/// Piecewise-linear resampling of `points` onto `target_len` evenly spaced positions.
///
/// The positions span the index domain `[0, points.len() - 1]` including both ends,
/// so the first and last output values equal the first and last points exactly.
/// A single point yields `target_len` copies of itself.
///
/// # Errors
///
/// [`SynthError::InvalidInput`] if `points` is empty or `target_len` is zero.
pub fn interpolate(points: &[f64], target_len: usize) -> Result<Vec<f64>> {
    if points.is_empty() {
        return Err(SynthError::InvalidInput {
            reason: "cannot interpolate an empty contour",
        });
    }
    if target_len == 0 {
        return Err(SynthError::InvalidInput {
            reason: "interpolation target length must be at least 1",
        });
    }
    if points.len() == 1 || target_len == 1 {
        return Ok(vec![points[0]; target_len]);
    }

    let last = points.len() - 1;
    let span = (target_len - 1) as f64;
    let out = (0..target_len)
        .map(|i| {
            // exact at both ends
            let pos = (i * last) as f64 / span;
            // truncation is the floor here, pos is never negative
            #[allow(clippy::cast_sign_loss)]
            let k = pos as usize;
            if k >= last {
                return points[last];
            }
            let frac = pos - k as f64;
            points[k] + (points[k + 1] - points[k]) * frac
        })
        .collect();
    Ok(out)
}

/// Expands a per-interval table into a per-sample step function.
///
/// Every value is held for `interval_len` samples. The last value covers the final,
/// possibly partial, interval and any samples beyond the table.
///
/// # Errors
///
/// [`SynthError::InvalidInput`] if `per_interval` is empty or `interval_len` is zero.
pub fn hold_per_interval(
    per_interval: &[f64],
    interval_len: usize,
    sample_count: usize,
) -> Result<Vec<f64>> {
    if per_interval.is_empty() {
        return Err(SynthError::InvalidInput {
            reason: "cannot hold an empty interval table",
        });
    }
    if interval_len == 0 {
        return Err(SynthError::InvalidInput {
            reason: "update interval must be at least one sample",
        });
    }
    let last = per_interval.len() - 1;
    Ok((0..sample_count)
        .map(|n| per_interval[(n / interval_len).min(last)])
        .collect())
}
