//! The synthesis driver: contours in, waveform out.

use crate::cascade::FormantCascade;
use crate::contour::hold_per_interval;
use crate::error::{Result, SynthError};
use crate::filters::RadiationFilter;
use crate::glottal::{GlottalSource, Voicing};
use crate::params::{SynthesisMethod, SynthesisParameters};
use crate::sine;
use crate::traits::BasicFilter;
use crate::waveform::Waveform;
use alloc::{vec, vec::Vec};
use core::sync::atomic::{AtomicBool, Ordering};
use rand::{Rng, SeedableRng, rngs::SmallRng};

//--- Driver -------------------------------------------------------------------

/// Klatt cascade synthesis of one parameter set.
///
/// Construction validates the parameters and resamples every contour onto the
/// synthesis timeline: F0 and the formant tracks get one value per update interval,
/// the envelope one value per sample. Running the synthesizer consumes it, so every
/// call starts from fresh filter state.
#[derive(Debug, Clone)]
pub struct KlattSynthesizer {
    sample_rate: usize,
    interval_len: usize,
    sample_count: usize,
    voicing: Voicing,
    radiation: bool,
    noise_differencing: bool,
    /// F0 per interval
    f0: Vec<f64>,
    /// `formants[i][t]`: formant `i` during interval `t`
    formants: Vec<Vec<f64>>,
    bandwidths: Vec<Vec<f64>>,
    /// envelope per sample
    envelope: Vec<f64>,
}

impl KlattSynthesizer {
    /// `params.method` is not consulted: the parameters are always checked for Klatt
    /// synthesis.
    ///
    /// # Errors
    ///
    /// See [`SynthesisParameters::validate_klatt`]. Nothing is computed for invalid parameters.
    pub fn new(params: &SynthesisParameters) -> Result<Self> {
        params
            .validate_klatt()
            .inspect_err(|e| tracing::warn!(%e, "rejecting synthesis parameters"))?;
        let sample_count = params.sample_count()?;
        let intervals = params.interval_count(sample_count);
        let formants = params
            .formants
            .iter()
            .map(|c| c.resample(intervals))
            .collect::<Result<Vec<_>>>()?;
        let bandwidths = params
            .bandwidths
            .iter()
            .map(|c| c.resample(intervals))
            .collect::<Result<Vec<_>>>()?;
        Ok(KlattSynthesizer {
            sample_rate: params.sample_rate,
            interval_len: params.interval_len,
            sample_count,
            voicing: params.voicing,
            radiation: params.radiation,
            noise_differencing: params.noise_differencing,
            f0: params.f0.resample(intervals)?,
            formants,
            bandwidths,
            envelope: params.envelope.resample(sample_count)?,
        })
    }

    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    #[must_use]
    pub fn interval_count(&self) -> usize {
        self.f0.len()
    }

    #[must_use]
    pub fn formant_count(&self) -> usize {
        self.formants.len()
    }

    /// F0 per update interval.
    #[must_use]
    pub fn f0_table(&self) -> &[f64] {
        &self.f0
    }

    /// Formant frequencies, one table per formant with one value per update interval.
    #[must_use]
    pub fn formant_tables(&self) -> &[Vec<f64>] {
        &self.formants
    }

    #[must_use]
    pub fn bandwidth_tables(&self) -> &[Vec<f64>] {
        &self.bandwidths
    }

    /// Amplitude envelope per sample.
    #[must_use]
    pub fn envelope(&self) -> &[f64] {
        &self.envelope
    }

    /// F0 as the voice source sees it: each interval's value held for the interval.
    ///
    /// # Errors
    ///
    /// See [`hold_per_interval`].
    pub fn f0_per_sample(&self) -> Result<Vec<f64>> {
        hold_per_interval(&self.f0, self.interval_len, self.sample_count)
    }

    /// Formant `index` as the cascade sees it, held per interval, or `None` past the
    /// last formant.
    ///
    /// # Errors
    ///
    /// See [`hold_per_interval`].
    pub fn formant_per_sample(&self, index: usize) -> Option<Result<Vec<f64>>> {
        self.formants
            .get(index)
            .map(|table| hold_per_interval(table, self.interval_len, self.sample_count))
    }

    /// Transfer function of the formant cascade during update interval `interval`,
    /// as `[numerator, denominator]` in ascending powers of `z^-1`.
    ///
    /// # Errors
    ///
    /// [`SynthError::InvalidInput`] if `interval` is out of range, otherwise the errors of
    /// [`FormantCascade::set_interval`].
    pub fn cascade_transfer_function(&self, interval: usize) -> Result<Vec<Vec<f64>>> {
        if interval >= self.interval_count() {
            return Err(SynthError::InvalidInput {
                reason: "update interval out of range",
            });
        }
        let (frequencies, bandwidths) = self.interval_values(interval);
        let mut cascade = FormantCascade::new(self.formant_count(), self.sample_rate);
        cascade.set_interval(&frequencies, &bandwidths)?;
        cascade.transfer_function()
    }

    /// Runs the whole interval loop.
    ///
    /// `rng` feeds the unvoiced noise source and is not touched for voiced sounds.
    ///
    /// # Errors
    ///
    /// [`SynthError::NumericDegeneracy`] if a filter or the pulse spacing cannot be
    /// realized for some interval.
    pub fn run<R: Rng>(self, rng: R) -> Result<Waveform> {
        self.render(rng, None)
    }

    /// As [`KlattSynthesizer::run`], checking `cancel` before every update interval.
    ///
    /// # Errors
    ///
    /// [`SynthError::Cancelled`] with the first interval not computed once `cancel` is
    /// set; no partial output is returned. Otherwise as [`KlattSynthesizer::run`].
    pub fn run_cancellable<R: Rng>(self, rng: R, cancel: &AtomicBool) -> Result<Waveform> {
        self.render(rng, Some(cancel))
    }

    fn interval_values(&self, interval: usize) -> (Vec<f64>, Vec<f64>) {
        (
            self.formants.iter().map(|f| f[interval]).collect(),
            self.bandwidths.iter().map(|bw| bw[interval]).collect(),
        )
    }

    fn render<R: Rng>(self, rng: R, cancel: Option<&AtomicBool>) -> Result<Waveform> {
        tracing::debug!(
            samples = self.sample_count,
            intervals = self.interval_count(),
            formants = self.formant_count(),
            voicing = ?self.voicing,
            "klatt synthesis started"
        );
        let mut source = GlottalSource::new(self.voicing, self.sample_rate, rng)?
            .with_noise_differencing(self.noise_differencing);
        let mut cascade = FormantCascade::new(self.formant_count(), self.sample_rate);
        let mut radiation = self.radiation.then(RadiationFilter::new);

        let mut out = vec![0.0; self.sample_count];
        for (t, block) in out.chunks_mut(self.interval_len).enumerate() {
            if cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
                tracing::debug!(interval = t, "klatt synthesis cancelled");
                return Err(SynthError::Cancelled { interval: t });
            }
            source.fill_interval(self.f0[t], block)?;
            let (frequencies, bandwidths) = self.interval_values(t);
            cascade
                .process_interval(block, &frequencies, &bandwidths)
                .inspect_err(|e| tracing::warn!(interval = t, %e, "formant cascade failed"))?;
            if let Some(radiation) = radiation.as_mut() {
                radiation.process_block(block);
            }
        }
        for (y, e) in out.iter_mut().zip(&self.envelope) {
            *y *= e;
        }
        if out.iter().any(|y| !y.is_finite()) {
            tracing::warn!("klatt synthesis produced non-finite samples");
            return Err(SynthError::NumericDegeneracy {
                what: "output signal",
            });
        }
        tracing::debug!(samples = out.len(), "klatt synthesis finished");
        Ok(Waveform::new(out, self.sample_rate))
    }
}

//------------------------------------------------------------------------------

/// Synthesizes `params` with the method it selects. Unvoiced noise is seeded from
/// `params.seed`, so equal parameters give equal waveforms.
///
/// # Errors
///
/// [`SynthError::is_invalid_input`] errors for malformed parameters, and
/// [`SynthError::NumericDegeneracy`] if filtering breaks down numerically.
pub fn synthesize(params: &SynthesisParameters) -> Result<Waveform> {
    synthesize_with_rng(params, SmallRng::seed_from_u64(params.seed))
}

/// As [`synthesize`], stopping early once `cancel` is set.
///
/// Klatt synthesis checks the flag before every update interval. Sine synthesis has
/// no intervals and checks it once, before starting.
///
/// # Errors
///
/// [`SynthError::Cancelled`] once `cancel` is set, with no partial output; otherwise see
/// [`synthesize`].
pub fn synthesize_cancellable(
    params: &SynthesisParameters,
    cancel: &AtomicBool,
) -> Result<Waveform> {
    let rng = SmallRng::seed_from_u64(params.seed);
    match params.method {
        SynthesisMethod::Klatt => KlattSynthesizer::new(params)?.run_cancellable(rng, cancel),
        SynthesisMethod::Sine => {
            params.validate_common()?;
            if cancel.load(Ordering::Relaxed) {
                tracing::debug!("sine synthesis cancelled");
                return Err(SynthError::Cancelled { interval: 0 });
            }
            sine::synthesize(params)
        }
    }
}

/// As [`synthesize`], drawing unvoiced noise from `rng` instead.
///
/// # Errors
///
/// See [`synthesize`].
pub fn synthesize_with_rng<R: Rng>(params: &SynthesisParameters, rng: R) -> Result<Waveform> {
    match params.method {
        SynthesisMethod::Klatt => KlattSynthesizer::new(params)?.run(rng),
        SynthesisMethod::Sine => sine::synthesize(params),
    }
}
