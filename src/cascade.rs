//! Formant resonators in series.

use crate::error::{Result, SynthError};
use crate::filters::{Coefficients, Resonator};
use crate::poly_real;
use crate::traits::BasicFilter;
use alloc::{vec, vec::Vec};

const EPS: f64 = 1E-10;

/// The cascade branch of the Klatt model, restricted to vowels: one [`Resonator`] per
/// formant, the output of formant `i` feeding formant `i + 1`.
///
/// Coefficients change only between update intervals. Each resonator keeps its delay
/// line across intervals, so splitting the signal into intervals never introduces a
/// discontinuity of its own.
#[derive(Debug, Clone)]
pub struct FormantCascade {
    sample_rate: usize,
    sections: Vec<Resonator>,
}

impl FormantCascade {
    #[must_use]
    pub fn new(formants: usize, sample_rate: usize) -> Self {
        FormantCascade {
            sample_rate,
            sections: vec![Resonator::new(sample_rate); formants],
        }
    }

    /// Number of formant sections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    #[must_use]
    pub fn sample_rate(&self) -> usize {
        self.sample_rate
    }

    /// Recomputes every section's coefficients for one interval. Delay lines are untouched.
    ///
    /// If any formant is rejected, no section is changed.
    ///
    /// # Errors
    ///
    /// [`SynthError::ShapeMismatch`] unless both slices hold one value per section,
    /// otherwise the errors of [`Coefficients::resonator`].
    pub fn set_interval(&mut self, frequencies: &[f64], bandwidths: &[f64]) -> Result<()> {
        self.check_count("formant frequencies", frequencies.len())?;
        self.check_count("formant bandwidths", bandwidths.len())?;
        let coefficients = frequencies
            .iter()
            .zip(bandwidths)
            .map(|(f, bw)| Coefficients::resonator(*f, *bw, self.sample_rate))
            .collect::<Result<Vec<_>>>()?;
        for (section, co) in self.sections.iter_mut().zip(coefficients) {
            section.set_coefficients(co);
        }
        Ok(())
    }

    /// Filters one interval in place after refreshing the coefficients.
    ///
    /// # Errors
    ///
    /// See [`FormantCascade::set_interval`].
    pub fn process_interval(
        &mut self,
        block: &mut [f64],
        frequencies: &[f64],
        bandwidths: &[f64],
    ) -> Result<()> {
        self.set_interval(frequencies, bandwidths)?;
        for section in &mut self.sections {
            section.process_block(block);
        }
        Ok(())
    }

    /// Runs a whole excitation signal through the cascade.
    ///
    /// `formant_tables[i][t]` and `bandwidth_tables[i][t]` hold formant `i` during
    /// interval `t`; there must be one table per section and one entry per interval,
    /// the last interval possibly being partial.
    ///
    /// # Errors
    ///
    /// [`SynthError::InvalidInput`] for a zero `interval_len`,
    /// [`SynthError::ShapeMismatch`] for any table of the wrong size, and the errors of
    /// [`FormantCascade::set_interval`].
    pub fn process(
        &mut self,
        excitation: &[f64],
        formant_tables: &[Vec<f64>],
        bandwidth_tables: &[Vec<f64>],
        interval_len: usize,
    ) -> Result<Vec<f64>> {
        if interval_len == 0 {
            return Err(SynthError::InvalidInput {
                reason: "update interval must be at least one sample",
            });
        }
        self.check_count("formant contours", formant_tables.len())?;
        self.check_count("bandwidth contours", bandwidth_tables.len())?;
        let intervals = excitation.len().div_ceil(interval_len);
        for table in formant_tables.iter().chain(bandwidth_tables) {
            if table.len() != intervals {
                return Err(SynthError::ShapeMismatch {
                    what: "contour intervals",
                    expected: intervals,
                    found: table.len(),
                });
            }
        }

        let mut out = excitation.to_vec();
        let mut frequencies = vec![0.0; self.len()];
        let mut bandwidths = vec![0.0; self.len()];
        for (t, block) in out.chunks_mut(interval_len).enumerate() {
            for (i, (f, bw)) in formant_tables.iter().zip(bandwidth_tables).enumerate() {
                frequencies[i] = f[t];
                bandwidths[i] = bw[t];
            }
            self.process_interval(block, &frequencies, &bandwidths)?;
        }
        Ok(out)
    }

    /// Clears every section's delay line.
    pub fn reset(&mut self) {
        for section in &mut self.sections {
            section.reset();
        }
    }

    /// Returns the polynomial coefficients of the cascade transfer function in the z-plane for
    /// the current coefficients.
    /// The returned array contains the top and bottom coefficients of the rational fraction, ordered in ascending powers.
    ///
    /// # Errors
    ///
    /// Only on malformed section fractions, which the resonators never produce.
    pub fn transfer_function(&self) -> Result<Vec<Vec<f64>>> {
        let mut v: Vec<Vec<f64>> = vec![vec![1.0], vec![1.0]];
        for section in &self.sections {
            let trans = section.get_transfer_function_coefficients();
            v = poly_real::multiply_fractions(&v, &trans, Some(EPS))?;
        }
        Ok(v)
    }

    fn check_count(&self, what: &'static str, found: usize) -> Result<()> {
        if found == self.sections.len() {
            Ok(())
        } else {
            Err(SynthError::ShapeMismatch {
                what,
                expected: self.sections.len(),
                found,
            })
        }
    }
}
