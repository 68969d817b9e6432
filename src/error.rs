//! Error type shared by every stage of the synthesizer.

use thiserror::Error;

/// Everything that can stop a synthesis call.
///
/// All variants except [`SynthError::NumericDegeneracy`] and [`SynthError::Cancelled`]
/// describe malformed input and are reported before any sample is computed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SynthError {
    /// Parameters are inconsistent in a way not covered by a more specific variant.
    #[error("invalid input: {reason}")]
    InvalidInput {
        /// What was wrong.
        reason: &'static str,
    },

    /// Two collections that must agree in size do not.
    #[error("shape mismatch in {what}: expected {expected}, found {found}")]
    ShapeMismatch {
        /// Which collection disagrees.
        what: &'static str,
        /// Size implied by the other collection.
        expected: usize,
        /// Size actually supplied.
        found: usize,
    },

    /// A value that must be strictly positive is not.
    #[error("{what} must be positive, got {value}")]
    NonPositive {
        /// Name of the offending parameter.
        what: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// A contour or scalar holds NaN or an infinity.
    #[error("{what} must be finite")]
    NonFinite {
        /// Name of the offending parameter.
        what: &'static str,
    },

    /// Filter coefficients or pulse spacing could not be represented.
    #[error("numeric degeneracy in {what}")]
    NumericDegeneracy {
        /// Where the degenerate value appeared.
        what: &'static str,
    },

    /// The caller asked synthesis to stop.
    #[error("synthesis cancelled before interval {interval}")]
    Cancelled {
        /// First interval that was not computed.
        interval: usize,
    },
}

impl SynthError {
    /// `true` for every variant that reports malformed parameters.
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            SynthError::InvalidInput { .. }
                | SynthError::ShapeMismatch { .. }
                | SynthError::NonPositive { .. }
                | SynthError::NonFinite { .. }
        )
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, SynthError>;
