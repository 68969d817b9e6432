//! Excitation for the formant cascade.

use crate::error::{Result, SynthError};
use crate::filters::{AntiResonator, RadiationFilter, Resonator};
use crate::math::round;
use crate::traits::BasicFilter;
use alloc::{vec, vec::Vec};
use rand::Rng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Glottal shaping low-pass: resonator at 0 Hz.
pub const GLOTTAL_POLE_BW: f64 = 100.0;
/// Glottal shaping zero.
pub const GLOTTAL_ZERO_FREQ: f64 = 1500.0;
/// Bandwidth of the glottal shaping zero.
pub const GLOTTAL_ZERO_BW: f64 = 6000.0;

/// Raw uniform values averaged into one noise sample.
const NOISE_WINDOW: usize = 16;
/// Raw values consumed per noise sample; windows overlap by half.
const NOISE_HOP: usize = NOISE_WINDOW / 2;

/// Excitation driving the formant cascade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "lowercase"))]
pub enum Voicing {
    /// Periodic pulses at the F0 contour.
    #[default]
    Voiced,
    /// Shaped white noise, F0 is ignored.
    Unvoiced,
}

/// Returns a random number within the range -1 .. 1.
fn get_white_noise<R: Rng>(rng: &mut R) -> f64 {
    rng.random_range(-1.0..=1.0)
}

/// Unit impulses, one per glottal period.
///
/// The first impulse falls on the first sample. The period is re-read on every call, so a
/// shortened period takes effect as soon as the elapsed time reaches it.
#[derive(Debug, Default)]
struct ImpulseTrain {
    /// samples since the last impulse, `None` before the first one
    since_pulse: Option<usize>,
}

impl ImpulseTrain {
    fn get_next(&mut self, period: usize) -> f64 {
        match self.since_pulse {
            Some(n) if n < period => {
                self.since_pulse = Some(n + 1);
                0.0
            }
            _ => {
                self.since_pulse = Some(1);
                1.0
            }
        }
    }
}

/// Block-averaged uniform noise.
struct NoiseSource<R> {
    rng: R,
    /// sum of the newest half window
    previous_half: Option<f64>,
}

impl<R: Rng> NoiseSource<R> {
    fn new(rng: R) -> Self {
        NoiseSource {
            rng,
            previous_half: None,
        }
    }

    fn half_window(&mut self) -> f64 {
        (0..NOISE_HOP).map(|_| get_white_noise(&mut self.rng)).sum()
    }

    /// Mean of the previous half window and a freshly drawn one.
    fn get_next(&mut self) -> f64 {
        let previous = match self.previous_half {
            Some(sum) => sum,
            None => self.half_window(),
        };
        let current = self.half_window();
        self.previous_half = Some(current);
        (previous + current) / NOISE_WINDOW as f64
    }
}

/// Produces the excitation signal one update interval at a time.
///
/// Voiced excitation is an impulse train passed through a 0 Hz resonator
/// ([`GLOTTAL_POLE_BW`]) and an anti-resonator ([`GLOTTAL_ZERO_FREQ`], [`GLOTTAL_ZERO_BW`]).
/// Unvoiced excitation is averaged uniform noise, optionally differenced
/// (+6 dB/octave).
pub struct GlottalSource<R> {
    sample_rate: usize,
    voicing: Voicing,
    impulses: ImpulseTrain,
    /// resonator used as an LP filter
    pole: Resonator,
    zero: AntiResonator,
    noise: NoiseSource<R>,
    noise_differencing: Option<RadiationFilter>,
}

impl<R: Rng> GlottalSource<R> {
    /// # Errors
    ///
    /// [`SynthError::NonPositive`] for a zero sample rate, [`SynthError::NumericDegeneracy`]
    /// if the fixed shaping filters cannot be realized at `sample_rate`.
    pub fn new(voicing: Voicing, sample_rate: usize, rng: R) -> Result<Self> {
        let mut pole = Resonator::new(sample_rate);
        pole.set(0.0, GLOTTAL_POLE_BW)?;
        let mut zero = AntiResonator::new(sample_rate);
        zero.set(GLOTTAL_ZERO_FREQ, GLOTTAL_ZERO_BW)?;
        Ok(GlottalSource {
            sample_rate,
            voicing,
            impulses: ImpulseTrain::default(),
            pole,
            zero,
            noise: NoiseSource::new(rng),
            noise_differencing: None,
        })
    }

    /// Enables the first-difference stage on unvoiced excitation.
    #[must_use]
    pub fn with_noise_differencing(mut self, enabled: bool) -> Self {
        self.noise_differencing = enabled.then(RadiationFilter::new);
        self
    }

    #[must_use]
    pub fn voicing(&self) -> Voicing {
        self.voicing
    }

    /// Glottal period in samples for fundamental frequency `f0`.
    ///
    /// # Errors
    ///
    /// [`SynthError::NonPositive`] / [`SynthError::NonFinite`] for an unusable `f0`,
    /// [`SynthError::NumericDegeneracy`] if the period rounds to zero samples.
    // f0 is checked positive, so the rounded ratio is never negative
    #[allow(clippy::cast_sign_loss)]
    pub fn period_for(&self, f0: f64) -> Result<usize> {
        if !f0.is_finite() {
            return Err(SynthError::NonFinite {
                what: "fundamental frequency",
            });
        }
        if f0 <= 0.0 {
            return Err(SynthError::NonPositive {
                what: "fundamental frequency",
                value: f0,
            });
        }
        let period = round(self.sample_rate as f64 / f0);
        if period < 1.0 {
            tracing::warn!(f0, sample_rate = self.sample_rate, "glottal period below one sample");
            return Err(SynthError::NumericDegeneracy {
                what: "glottal period",
            });
        }
        Ok(period as usize)
    }

    /// Writes the excitation for one interval into `block`.
    ///
    /// `f0` is only read in voiced mode; the pulse spacing is `round(sampleRate / f0)`.
    ///
    /// # Errors
    ///
    /// See [`GlottalSource::period_for`].
    pub fn fill_interval(&mut self, f0: f64, block: &mut [f64]) -> Result<()> {
        match self.voicing {
            Voicing::Voiced => {
                let period = self.period_for(f0)?;
                tracing::trace!(f0, period, "voiced interval");
                for out in block.iter_mut() {
                    let pulse = self.impulses.get_next(period);
                    *out = self.zero.step(self.pole.step(pulse));
                }
            }
            Voicing::Unvoiced => {
                for out in block.iter_mut() {
                    let x = self.noise.get_next();
                    *out = match self.noise_differencing.as_mut() {
                        Some(diff) => diff.step(x),
                        None => x,
                    };
                }
            }
        }
        Ok(())
    }

    /// Generates `sample_count` samples of excitation from a per-interval F0 table.
    ///
    /// # Errors
    ///
    /// [`SynthError::ShapeMismatch`] if `f0` does not hold one value per interval,
    /// [`SynthError::InvalidInput`] for a zero `interval_len`, and the errors of
    /// [`GlottalSource::fill_interval`].
    pub fn generate(
        &mut self,
        f0: &[f64],
        interval_len: usize,
        sample_count: usize,
    ) -> Result<Vec<f64>> {
        if interval_len == 0 {
            return Err(SynthError::InvalidInput {
                reason: "update interval must be at least one sample",
            });
        }
        let intervals = sample_count.div_ceil(interval_len);
        if f0.len() != intervals {
            return Err(SynthError::ShapeMismatch {
                what: "f0 intervals",
                expected: intervals,
                found: f0.len(),
            });
        }
        let mut out = vec![0.0; sample_count];
        for (block, f0) in out.chunks_mut(interval_len).zip(f0) {
            self.fill_interval(*f0, block)?;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::SmallRng};

    fn rng(seed: u64) -> SmallRng {
        SmallRng::seed_from_u64(seed)
    }

    #[test]
    fn impulse_train_spacing() {
        let mut train = ImpulseTrain::default();
        let pulses: Vec<f64> = (0..12).map(|_| train.get_next(5)).collect();
        let at: Vec<usize> = pulses
            .iter()
            .enumerate()
            .filter(|(_, p)| **p == 1.0)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(at, vec![0, 5, 10]);
    }

    #[test]
    fn shorter_period_fires_without_waiting() {
        let mut train = ImpulseTrain::default();
        assert_eq!(train.get_next(10), 1.0);
        for _ in 0..6 {
            assert_eq!(train.get_next(10), 0.0);
        }
        // 7 samples elapsed, new period 4 is already exceeded
        assert_eq!(train.get_next(4), 1.0);
        assert_eq!(train.get_next(4), 0.0);
    }

    #[test]
    fn period_rounding() {
        let src = GlottalSource::new(Voicing::Voiced, 10_000, rng(1)).unwrap();
        assert_eq!(src.period_for(120.0).unwrap(), 83);
        assert_eq!(src.period_for(100.0).unwrap(), 100);
        assert!(matches!(src.period_for(0.0), Err(SynthError::NonPositive { .. })));
        assert!(matches!(src.period_for(f64::NAN), Err(SynthError::NonFinite { .. })));
        assert_eq!(
            src.period_for(50_000.0),
            Err(SynthError::NumericDegeneracy { what: "glottal period" })
        );
    }

    #[test]
    fn voiced_is_shaped_impulse_train() {
        let mut src = GlottalSource::new(Voicing::Voiced, 10_000, rng(1)).unwrap();
        let out = src.generate(&[100.0, 100.0], 50, 100).unwrap();

        let mut pole = Resonator::new(10_000);
        pole.set(0.0, GLOTTAL_POLE_BW).unwrap();
        let mut zero = AntiResonator::new(10_000);
        zero.set(GLOTTAL_ZERO_FREQ, GLOTTAL_ZERO_BW).unwrap();
        let expected: Vec<f64> = (0..100)
            .map(|n| zero.step(pole.step(if n == 0 { 1.0 } else { 0.0 })))
            .collect();
        assert_eq!(out, expected);
    }

    #[test]
    fn voiced_ignores_rng() {
        let a = GlottalSource::new(Voicing::Voiced, 10_000, rng(1))
            .unwrap()
            .generate(&[130.0; 4], 50, 200)
            .unwrap();
        let b = GlottalSource::new(Voicing::Voiced, 10_000, rng(99))
            .unwrap()
            .generate(&[130.0; 4], 50, 200)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn unvoiced_is_seeded_and_bounded() {
        let make = |seed| {
            GlottalSource::new(Voicing::Unvoiced, 10_000, rng(seed))
                .unwrap()
                .generate(&[0.0; 20], 50, 1000)
                .unwrap()
        };
        let a = make(7);
        assert_eq!(a, make(7));
        assert_ne!(a, make(8));
        assert!(a.iter().all(|x| x.abs() <= 1.0));
        let mean = a.iter().sum::<f64>() / a.len() as f64;
        assert!(mean.abs() < 0.05, "mean {mean}");
    }

    #[test]
    fn noise_is_independent_of_interval_split() {
        let whole = GlottalSource::new(Voicing::Unvoiced, 10_000, rng(3))
            .unwrap()
            .generate(&[1.0], 300, 300)
            .unwrap();
        let split = GlottalSource::new(Voicing::Unvoiced, 10_000, rng(3))
            .unwrap()
            .generate(&[1.0; 6], 50, 300)
            .unwrap();
        assert_eq!(whole, split);
    }

    #[test]
    fn differenced_noise() {
        let plain = GlottalSource::new(Voicing::Unvoiced, 10_000, rng(5))
            .unwrap()
            .generate(&[1.0; 2], 50, 100)
            .unwrap();
        let diff = GlottalSource::new(Voicing::Unvoiced, 10_000, rng(5))
            .unwrap()
            .with_noise_differencing(true)
            .generate(&[1.0; 2], 50, 100)
            .unwrap();
        assert_eq!(diff[0], plain[0]);
        for n in 1..100 {
            assert!((diff[n] - (plain[n] - plain[n - 1])).abs() < 1e-15);
        }
    }

    #[test]
    fn generate_checks_table_length() {
        let mut src = GlottalSource::new(Voicing::Voiced, 10_000, rng(1)).unwrap();
        // 101 samples in 50-sample intervals is two full intervals and a partial one
        assert_eq!(
            src.generate(&[100.0; 2], 50, 101),
            Err(SynthError::ShapeMismatch { what: "f0 intervals", expected: 3, found: 2 })
        );
        assert_eq!(src.generate(&[100.0; 3], 50, 101).unwrap().len(), 101);
        assert!(matches!(src.generate(&[100.0], 0, 10), Err(SynthError::InvalidInput { .. })));
    }
}
