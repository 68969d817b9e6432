//! Second-order formant sections and the lip-radiation differencer.

use crate::error::{Result, SynthError};
use crate::math::{cos, exp};
use crate::traits::BasicFilter;
use alloc::{vec, vec::Vec};
use core::f64::consts::PI;

/// Coefficients of one two-pole section.
///
/// Stored with their natural sign, so every section runs
/// ```text
///    y[n] = a * x[n] + b * y[n-1] + c * y[n-2]
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coefficients {
    /// input gain
    pub a: f64,
    /// weight of y[n-1]
    pub b: f64,
    /// weight of y[n-2]
    pub c: f64,
}

impl Coefficients {
    /// Leaves the input untouched.
    pub const IDENTITY: Coefficients = Coefficients {
        a: 1.0,
        b: 0.0,
        c: 0.0,
    };

    /// Klatt resonator coefficients.
    ///
    /// # Formulas:
    /// ```text
    ///    dt = 1 / sampleRate
    ///    c  = -exp(-2 * PI * bw * dt)
    ///    b  =  2 * exp(-PI * bw * dt) * cos(2 * PI * f * dt)
    ///    a  =  1 - b - c
    /// ```
    /// `a` normalizes the DC gain to 1. With `f = 0` the section is a low-pass filter.
    ///
    /// # Errors
    ///
    /// - [`SynthError::NonPositive`] if `bw <= 0` or `sample_rate == 0`.
    /// - [`SynthError::NonFinite`] if `f` or `bw` is NaN or infinite.
    /// - [`SynthError::InvalidInput`] if `f < 0`.
    /// - [`SynthError::NumericDegeneracy`] if a coefficient comes out non-finite.
    pub fn resonator(f: f64, bw: f64, sample_rate: usize) -> Result<Self> {
        if sample_rate == 0 {
            return Err(SynthError::NonPositive {
                what: "sample rate",
                value: 0.0,
            });
        }
        if !f.is_finite() {
            return Err(SynthError::NonFinite {
                what: "formant frequency",
            });
        }
        if !bw.is_finite() {
            return Err(SynthError::NonFinite {
                what: "formant bandwidth",
            });
        }
        if bw <= 0.0 {
            return Err(SynthError::NonPositive {
                what: "formant bandwidth",
                value: bw,
            });
        }
        if f < 0.0 {
            return Err(SynthError::InvalidInput {
                reason: "formant frequency must not be negative",
            });
        }
        let dt = 1.0 / sample_rate as f64;
        let c = -exp(-2.0 * PI * bw * dt);
        let b = 2.0 * exp(-PI * bw * dt) * cos(2.0 * PI * f * dt);
        let a = 1.0 - b - c;
        Coefficients { a, b, c }.finite_or("resonator coefficients")
    }

    /// Coefficients of the matching anti-resonator: `a' = 1/a`, `b' = -b/a`, `c' = -c/a`.
    ///
    /// # Errors
    ///
    /// [`SynthError::NumericDegeneracy`] if `a` is zero or the result is not finite.
    pub fn inverted(self) -> Result<Self> {
        if self.a == 0.0 {
            return Err(SynthError::NumericDegeneracy {
                what: "anti-resonator coefficients",
            });
        }
        Coefficients {
            a: 1.0 / self.a,
            b: -self.b / self.a,
            c: -self.c / self.a,
        }
        .finite_or("anti-resonator coefficients")
    }

    fn finite_or(self, what: &'static str) -> Result<Self> {
        if self.a.is_finite() && self.b.is_finite() && self.c.is_finite() {
            Ok(self)
        } else {
            tracing::warn!(a = self.a, b = self.b, c = self.c, "{what} are not finite");
            Err(SynthError::NumericDegeneracy { what })
        }
    }
}

/// Delay line of a two-pole section.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FilterState {
    /// y[n-1], last output value
    pub y1: f64,
    /// y[n-2], second-last output value
    pub y2: f64,
}

/// A Klatt resonator.
/// This is a second order IIR filter.
/// With f=0 it can also be used as a low-pass filter.
///
/// # Formulas:
/// ## Filter function:
/// ```text
///    y[n] = a * x[n] + b * y[n-1] + c * y[n-2]
/// ```
/// ## Transfer function:
/// ```text
///    H(w) = a / ( 1 - b * e^(-jw) - c * e^(-2jw) )
/// ```
/// ## Gain at DC:
/// ```text
///    |H(0)| = a / (1 - c - b) = 1
/// ```
///
/// Coefficients are held until the next [`Resonator::set`], which never touches the delay
/// line: the last two outputs of one update interval seed the first two samples of the next.
/// A fresh resonator starts from zero history.
#[derive(Debug, Clone)]
pub struct Resonator {
    sample_rate: usize,
    coefficients: Coefficients,
    state: FilterState,
}

impl Resonator {
    /// ### params
    /// ```text
    /// sample_rate = Sample rate in Hz.
    /// ```
    /// Passes its input through until [`Resonator::set`] is called.
    #[must_use]
    pub fn new(sample_rate: usize) -> Self {
        Resonator {
            sample_rate,
            coefficients: Coefficients::IDENTITY,
            state: FilterState::default(),
        }
    }

    /// Adjusts the filter parameters without resetting the inner state.
    /// ### params
    /// ```text
    /// f = Frequency of resonator in Hz. May be 0 for LP filtering.
    /// bw = Bandwidth of resonator in Hz.
    /// ```
    ///
    /// # Errors
    ///
    /// See [`Coefficients::resonator`]. On error the previous coefficients are kept.
    pub fn set(&mut self, f: f64, bw: f64) -> Result<()> {
        self.coefficients = Coefficients::resonator(f, bw, self.sample_rate)?;
        Ok(())
    }

    /// Installs precomputed coefficients, keeping the delay line.
    pub fn set_coefficients(&mut self, coefficients: Coefficients) {
        self.coefficients = coefficients;
    }

    #[must_use]
    pub fn coefficients(&self) -> Coefficients {
        self.coefficients
    }

    #[must_use]
    pub fn state(&self) -> FilterState {
        self.state
    }

    /// Filters one update interval in place with coefficients computed from `f` and `bw`.
    ///
    /// # Errors
    ///
    /// See [`Coefficients::resonator`]. The block is left untouched on error.
    pub fn apply(&mut self, block: &mut [f64], f: f64, bw: f64) -> Result<()> {
        self.set(f, bw)?;
        self.process_block(block);
        Ok(())
    }
}

impl BasicFilter for Resonator {
    fn get_transfer_function_coefficients(&self) -> Vec<Vec<f64>> {
        let Coefficients { a, b, c } = self.coefficients;
        vec![vec![a], vec![1.0, -b, -c]]
    }

    fn step(&mut self, x: f64) -> f64 {
        let Coefficients { a, b, c } = self.coefficients;
        let y = a * x + b * self.state.y1 + c * self.state.y2;
        self.state.y2 = self.state.y1;
        self.state.y1 = y;
        y
    }

    fn reset(&mut self) {
        self.state = FilterState::default();
    }
}

/// A Klatt anti-resonator, as used to shape the glottal pulse.
///
/// Runs the resonator recurrence with inverted coefficients
/// ```text
///    a' = 1 / a,   b' = -b / a,   c' = -c / a
///    y[n] = a' * x[n] + b' * y[n-1] + c' * y[n-2]
/// ```
/// where `a`, `b`, `c` are the resonator coefficients for the same `f` and `bw`.
#[derive(Debug, Clone)]
pub struct AntiResonator {
    inner: Resonator,
}

impl AntiResonator {
    #[must_use]
    pub fn new(sample_rate: usize) -> Self {
        AntiResonator {
            inner: Resonator::new(sample_rate),
        }
    }

    /// Adjusts the filter parameters without resetting the inner state.
    /// ### params
    /// ```text
    ///    f = Frequency of anti-resonator in Hz.
    ///    bw = bandwidth of anti-resonator in Hz.
    /// ```
    ///
    /// # Errors
    ///
    /// See [`Coefficients::resonator`] and [`Coefficients::inverted`].
    pub fn set(&mut self, f: f64, bw: f64) -> Result<()> {
        let coefficients = Coefficients::resonator(f, bw, self.inner.sample_rate)?.inverted()?;
        self.inner.set_coefficients(coefficients);
        Ok(())
    }

    #[must_use]
    pub fn coefficients(&self) -> Coefficients {
        self.inner.coefficients()
    }

    #[must_use]
    pub fn state(&self) -> FilterState {
        self.inner.state()
    }
}

impl BasicFilter for AntiResonator {
    fn get_transfer_function_coefficients(&self) -> Vec<Vec<f64>> {
        self.inner.get_transfer_function_coefficients()
    }

    fn step(&mut self, x: f64) -> f64 {
        self.inner.step(x)
    }

    fn reset(&mut self) {
        self.inner.reset();
    }
}

/// Lip radiation characteristic.
/// This is a first-order FIR HP filter (a differencer).
///
/// # Formulas:
/// ## Filter function:
/// ```text
///    y[n] = x[n] - x[n-1]
/// ```
/// ## Frequency response:
/// ```text
///    |H(w)| = sqrt(2 - 2 * cos(w))
/// ```
/// `x[-1]` is zero for a fresh filter, so `y[0] = x[0]`. Within one run the
/// last input of a block is carried into the next block.
#[derive(Debug, Clone, Default)]
pub struct RadiationFilter {
    /// x[n-1], last input value
    x1: f64,
}

impl RadiationFilter {
    #[must_use]
    pub fn new() -> Self {
        RadiationFilter { x1: 0.0 }
    }
}

impl BasicFilter for RadiationFilter {
    fn get_transfer_function_coefficients(&self) -> Vec<Vec<f64>> {
        vec![vec![1.0, -1.0], vec![1.0]]
    }

    fn step(&mut self, x: f64) -> f64 {
        let y = x - self.x1;
        self.x1 = x;
        y
    }

    fn reset(&mut self) {
        self.x1 = 0.0;
    }
}
