//! Sine-wave synthesis: a quick preview of the drawn formant tracks.
//!
//! Each formant track becomes a cosine whose instantaneous frequency follows the track,
//! the cosines are summed and shaped by the envelope. Bandwidths, F0 and voicing are
//! not used.

use crate::error::Result;
use crate::math::cos;
use crate::params::SynthesisParameters;
use crate::waveform::Waveform;
use alloc::{vec, vec::Vec};
use core::f64::consts::TAU;

/// Renders `params` with one cosine per formant track.
///
/// # Errors
///
/// See [`SynthesisParameters::validate_common`].
pub fn synthesize(params: &SynthesisParameters) -> Result<Waveform> {
    params
        .validate_common()
        .inspect_err(|e| tracing::warn!(%e, "rejecting sine synthesis parameters"))?;
    let n = params.sample_count()?;
    let fs = params.sample_rate as f64;
    tracing::debug!(samples = n, formants = params.formants.len(), "sine synthesis");

    let mut out = vec![0.0; n];
    for formant in &params.formants {
        let track = formant.resample(n)?;
        let mut phase = 0.0;
        for (y, f) in out.iter_mut().zip(track) {
            phase = (phase + TAU * f / fs) % TAU;
            *y += cos(phase);
        }
    }
    let envelope: Vec<f64> = params.envelope.resample(n)?;
    for (y, e) in out.iter_mut().zip(envelope) {
        *y *= e;
    }
    Ok(Waveform::new(out, params.sample_rate))
}
