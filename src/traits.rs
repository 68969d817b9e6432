//! The interface shared by every filter stage.

use alloc::vec::Vec;

/// A sample-by-sample filter with its own delay line.
///
/// Implementors keep their state between calls, so feeding a signal in several
/// blocks gives the same output as feeding it in one.
pub trait BasicFilter {
    /// Returns the polynomial coefficients of the filter transfer function in the z-plane.
    /// The returned array contains the top and bottom coefficients of the rational fraction, ordered in ascending powers.
    fn get_transfer_function_coefficients(&self) -> Vec<Vec<f64>>;
    /// Perform one step of a filter.
    fn step(&mut self, x: f64) -> f64;
    /// Clears the delay line, keeping the coefficients.
    fn reset(&mut self);

    /// Filters `block` in place, carrying state in and out of the block.
    fn process_block(&mut self, block: &mut [f64]) {
        for x in block.iter_mut() {
            *x = self.step(*x);
        }
    }
}
