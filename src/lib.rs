//! Cascade formant synthesis of drawn pitch and formant tracks, after Klatt (1980).
//!
//! *NOTE*: This is _not_ a text-to-speech engine.
//! A sound is described by a handful of sparse [`ControlContour`]s (F0, formant
//! frequencies and bandwidths, amplitude envelope) collected in
//! [`SynthesisParameters`], and rendered to a [`Waveform`] by [`synthesize`].
//!
//! ```
//! use trackdraw::{ControlContour, SynthesisParameters, synthesize};
//!
//! let params = SynthesisParameters::default()
//!     .with_f0([120.0, 100.0])
//!     .with_formants(
//!         vec![ControlContour::constant(700.0), ControlContour::from([1100.0, 1800.0])],
//!         vec![ControlContour::constant(80.0), ControlContour::constant(90.0)],
//!     )
//!     .with_duration(0.5);
//! let sound = synthesize(&params)?;
//! assert_eq!(sound.len(), 5000);
//! # Ok::<(), trackdraw::SynthError>(())
//! ```
//!
//! ## `no_std`
//!
//! Disable the default `std` feature and enable `libm` to build without the standard
//! library. `alloc` is required.

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(
    clippy::all,
    clippy::cargo,
    clippy::pedantic,
    unsafe_code,
    rustdoc::all
)]
// sample counts and rates stay far below 2^52, so the usize <-> f64 casts are exact
#![allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]

#[cfg(all(feature = "std", feature = "libm"))]
compile_error!("Features \"std\" and \"libm\" are mutually exclusive.");

#[cfg(not(any(feature = "std", feature = "libm")))]
compile_error!("Must specify a math feature: either \"std\" or \"libm\".");

extern crate alloc;

mod cascade;
mod contour;
mod error;
mod filters;
mod glottal;
mod klatt;
mod math;
mod params;
pub mod poly_real;
pub mod sine;
mod traits;
mod waveform;

pub use cascade::FormantCascade;
pub use contour::{ControlContour, hold_per_interval, interpolate};
pub use error::{Result, SynthError};
pub use filters::{AntiResonator, Coefficients, FilterState, RadiationFilter, Resonator};
pub use glottal::{GLOTTAL_POLE_BW, GLOTTAL_ZERO_BW, GLOTTAL_ZERO_FREQ, GlottalSource, Voicing};
pub use klatt::{KlattSynthesizer, synthesize, synthesize_cancellable, synthesize_with_rng};
pub use params::{MAX_SAMPLE_COUNT, SynthesisMethod, SynthesisParameters};
pub use traits::BasicFilter;
pub use waveform::Waveform;
