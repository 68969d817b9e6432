//! Parameters for one synthesis request.

use crate::contour::ControlContour;
use crate::error::{Result, SynthError};
use crate::glottal::Voicing;
use crate::math::round;
use alloc::{vec, vec::Vec};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Longest sound a single call renders, in samples (2 GiB of `f64`, about 7.5 hours at
/// 10 kHz).
pub const MAX_SAMPLE_COUNT: usize = 1 << 28;

/// Which synthesizer renders the tracks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "lowercase"))]
pub enum SynthesisMethod {
    /// Cascade formant synthesis after Klatt (1980).
    #[default]
    Klatt,
    /// One cosine per formant track, summed.
    Sine,
}

/// Everything a synthesis call reads. Built by the caller, never mutated by the engine.
///
/// Contours are sparse and evenly spaced over the whole duration; the engine resamples
/// them. `formants[i]` and `bandwidths[i]` describe formant `i`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct SynthesisParameters {
    /// fundamental frequency in Hz
    pub f0: ControlContour,
    /// formant frequencies in Hz, lowest formant first
    pub formants: Vec<ControlContour>,
    /// formant bandwidths in Hz
    pub bandwidths: Vec<ControlContour>,
    /// linear amplitude envelope
    pub envelope: ControlContour,
    pub voicing: Voicing,
    /// sample rate in Hz
    pub sample_rate: usize,
    /// duration in seconds
    pub duration: f64,
    /// samples per coefficient update
    pub interval_len: usize,
    /// apply the lip radiation differencer
    pub radiation: bool,
    /// difference the unvoiced noise (+6 dB/octave)
    pub noise_differencing: bool,
    pub method: SynthesisMethod,
    /// seed for the unvoiced noise source
    pub seed: u64,
}

impl Default for SynthesisParameters {
    fn default() -> Self {
        SynthesisParameters {
            f0: ControlContour::constant(100.0),
            formants: [800.0, 1600.0, 2400.0, 3200.0, 4000.0]
                .into_iter()
                .map(ControlContour::constant)
                .collect(),
            bandwidths: [50.0, 100.0, 100.0, 200.0, 250.0]
                .into_iter()
                .map(ControlContour::constant)
                .collect(),
            envelope: ControlContour::new(vec![0.0, 1.0, 1.0, 1.0, 0.0]),
            voicing: Voicing::Voiced,
            sample_rate: 10_000,
            duration: 1.0,
            interval_len: 50,
            radiation: false,
            noise_differencing: false,
            method: SynthesisMethod::Klatt,
            seed: 0,
        }
    }
}

impl SynthesisParameters {
    #[must_use]
    pub fn with_f0(mut self, f0: impl Into<ControlContour>) -> Self {
        self.f0 = f0.into();
        self
    }

    /// Replaces all formant tracks at once.
    #[must_use]
    pub fn with_formants(
        mut self,
        formants: Vec<ControlContour>,
        bandwidths: Vec<ControlContour>,
    ) -> Self {
        self.formants = formants;
        self.bandwidths = bandwidths;
        self
    }

    #[must_use]
    pub fn with_envelope(mut self, envelope: impl Into<ControlContour>) -> Self {
        self.envelope = envelope.into();
        self
    }

    #[must_use]
    pub fn with_voicing(mut self, voicing: Voicing) -> Self {
        self.voicing = voicing;
        self
    }

    #[must_use]
    pub fn with_sample_rate(mut self, sample_rate: usize) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    #[must_use]
    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = seconds;
        self
    }

    #[must_use]
    pub fn with_interval_len(mut self, samples: usize) -> Self {
        self.interval_len = samples;
        self
    }

    #[must_use]
    pub fn with_radiation(mut self, enabled: bool) -> Self {
        self.radiation = enabled;
        self
    }

    #[must_use]
    pub fn with_noise_differencing(mut self, enabled: bool) -> Self {
        self.noise_differencing = enabled;
        self
    }

    #[must_use]
    pub fn with_method(mut self, method: SynthesisMethod) -> Self {
        self.method = method;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Number of output samples, `round(duration * sample_rate)`, at most [`MAX_SAMPLE_COUNT`].
    ///
    /// # Errors
    ///
    /// The scalar checks of [`SynthesisParameters::validate`].
    // duration is checked positive and finite before the cast
    #[allow(clippy::cast_sign_loss)]
    pub fn sample_count(&self) -> Result<usize> {
        if self.sample_rate == 0 {
            return Err(SynthError::NonPositive {
                what: "sample rate",
                value: 0.0,
            });
        }
        if !self.duration.is_finite() {
            return Err(SynthError::NonFinite { what: "duration" });
        }
        if self.duration <= 0.0 {
            return Err(SynthError::NonPositive {
                what: "duration",
                value: self.duration,
            });
        }
        let n = round(self.duration * self.sample_rate as f64);
        if n < 1.0 {
            return Err(SynthError::InvalidInput {
                reason: "duration is shorter than one sample",
            });
        }
        if n > MAX_SAMPLE_COUNT as f64 {
            tracing::warn!(samples = n, max = MAX_SAMPLE_COUNT, "duration too long");
            return Err(SynthError::InvalidInput {
                reason: "duration exceeds the maximum sample count",
            });
        }
        Ok(n as usize)
    }

    /// Number of update intervals covering `sample_count` samples, the last one possibly partial.
    #[must_use]
    pub fn interval_count(&self, sample_count: usize) -> usize {
        sample_count.div_ceil(self.interval_len.max(1))
    }

    /// Checks everything a synthesis call with `self.method` relies on. Nothing is
    /// synthesized on failure.
    ///
    /// # Errors
    ///
    /// See [`SynthesisParameters::validate_klatt`] and [`SynthesisParameters::validate_common`].
    pub fn validate(&self) -> Result<()> {
        match self.method {
            SynthesisMethod::Klatt => self.validate_klatt(),
            SynthesisMethod::Sine => self.validate_common(),
        }
    }

    /// Checks for Klatt synthesis, whatever `self.method` says: the shared checks, plus a
    /// positive F0 when the excitation is voiced.
    ///
    /// # Errors
    ///
    /// See [`SynthesisParameters::validate_common`], plus [`SynthError::NonPositive`] for
    /// a voiced F0 point `<= 0`.
    pub fn validate_klatt(&self) -> Result<()> {
        self.validate_common()?;
        if self.voicing == Voicing::Voiced {
            self.f0.check_positive("fundamental frequency")?;
        }
        Ok(())
    }

    /// Checks shared by every synthesis method. F0 only has to be finite here.
    ///
    /// # Errors
    ///
    /// - [`SynthError::NonPositive`] for a zero sample rate or update interval, a duration
    ///   `<= 0`, or any bandwidth point `<= 0`.
    /// - [`SynthError::NonFinite`] for NaN or infinite values.
    /// - [`SynthError::ShapeMismatch`] if formant and bandwidth track counts differ.
    /// - [`SynthError::InvalidInput`] for empty contours, negative formant frequencies, or a
    ///   duration below one sample or above [`MAX_SAMPLE_COUNT`] samples.
    pub fn validate_common(&self) -> Result<()> {
        self.sample_count()?;
        if self.interval_len == 0 {
            return Err(SynthError::NonPositive {
                what: "update interval",
                value: 0.0,
            });
        }
        if self.formants.len() != self.bandwidths.len() {
            return Err(SynthError::ShapeMismatch {
                what: "bandwidth contours",
                expected: self.formants.len(),
                found: self.bandwidths.len(),
            });
        }
        self.f0.check("fundamental frequency")?;
        for formant in &self.formants {
            formant.check("formant frequency")?;
            if formant.points().iter().any(|f| *f < 0.0) {
                return Err(SynthError::InvalidInput {
                    reason: "formant frequency must not be negative",
                });
            }
        }
        for bandwidth in &self.bandwidths {
            bandwidth.check_positive("formant bandwidth")?;
        }
        self.envelope.check("envelope")
    }
}
