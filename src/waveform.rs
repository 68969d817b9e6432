//! The synthesized sound handed back to the caller.

use crate::math::{round, sqrt};
use alloc::vec::Vec;

/// Mono samples at a fixed sample rate. Owned by the caller once returned.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    samples: Vec<f64>,
    sample_rate: usize,
}

impl Waveform {
    #[must_use]
    pub fn new(samples: Vec<f64>, sample_rate: usize) -> Self {
        Waveform {
            samples,
            sample_rate,
        }
    }

    #[must_use]
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    #[must_use]
    pub fn into_samples(self) -> Vec<f64> {
        self.samples
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// sample rate in Hz
    #[must_use]
    pub fn sample_rate(&self) -> usize {
        self.sample_rate
    }

    #[must_use]
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Largest absolute sample value.
    #[must_use]
    pub fn peak(&self) -> f64 {
        self.samples.iter().fold(0.0, |m, x| f64::max(m, x.abs()))
    }

    #[must_use]
    pub fn rms(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        sqrt(self.samples.iter().map(|x| x * x).sum::<f64>() / self.samples.len() as f64)
    }

    /// Scales the waveform so its peak equals `target_peak`. Silence stays silent.
    #[must_use]
    pub fn normalized(&self, target_peak: f64) -> Waveform {
        let peak = self.peak();
        if peak == 0.0 {
            return self.clone();
        }
        let r = target_peak / peak;
        Waveform {
            samples: self.samples.iter().map(|x| x * r).collect(),
            sample_rate: self.sample_rate,
        }
    }

    /// 16-bit signed PCM; samples outside -1 .. 1 are clipped.
    // clamped to the i16 range before the cast
    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn to_pcm_i16(&self) -> Vec<i16> {
        self.samples
            .iter()
            .map(|x| round(x.clamp(-1.0, 1.0) * f64::from(i16::MAX)) as i16)
            .collect()
    }

    /// 32-bit float PCM; samples outside -1 .. 1 are clipped.
    #[must_use]
    pub fn to_pcm_f32(&self) -> Vec<f32> {
        self.samples
            .iter()
            .map(|x| x.clamp(-1.0, 1.0) as f32)
            .collect()
    }
}

impl From<Waveform> for Vec<f64> {
    fn from(waveform: Waveform) -> Self {
        waveform.samples
    }
}

impl AsRef<[f64]> for Waveform {
    fn as_ref(&self) -> &[f64] {
        &self.samples
    }
}
