//! Direct-form difference-equation filter.
//!
//! ```text
//! a[0] y[n] = sum_k b[k] x[n-k] - sum_{k>=1} a[k] y[n-k]
//! ```

use crate::error::{LocalError, LocalResult};

/// Filter with normalized coefficients and its delay lines.
#[derive(Debug, Clone)]
pub struct DifferenceEquation {
    b: Vec<f64>,
    a: Vec<f64>,
    x_history: Vec<f64>,
    y_history: Vec<f64>,
}

impl DifferenceEquation {
    /// Creates a filter. Coefficients are normalized by `a[0]`.
    pub fn new(b: &[f64], a: &[f64]) -> LocalResult<Self> {
        if b.is_empty() || a.is_empty() {
            return Err(LocalError::invalid_param("b/a", "coefficients cannot be empty"));
        }
        let a0 = a[0];
        if a0 == 0.0 || !a0.is_finite() {
            return Err(LocalError::invalid_param("a", "a[0] must be finite and non-zero"));
        }
        if b.iter().chain(a).any(|c| !c.is_finite()) {
            return Err(LocalError::invalid_param("b/a", "coefficients must be finite"));
        }
        Ok(Self {
            b: b.iter().map(|c| c / a0).collect(),
            a: a.iter().map(|c| c / a0).collect(),
            x_history: vec![0.0; b.len()],
            y_history: vec![0.0; a.len()],
        })
    }

    /// Resets the delay lines.
    pub fn reset(&mut self) {
        self.x_history.iter_mut().for_each(|v| *v = 0.0);
        self.y_history.iter_mut().for_each(|v| *v = 0.0);
    }

    /// Processes a single sample through the filter.
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        self.x_history.rotate_right(1);
        self.x_history[0] = input;

        let mut output: f64 = self
            .b
            .iter()
            .zip(&self.x_history)
            .map(|(b, x)| b * x)
            .sum();
        // y_history[k] holds y[n-k]; slot 0 is overwritten below.
        self.y_history.rotate_right(1);
        for (a, y) in self.a.iter().zip(&self.y_history).skip(1) {
            output -= a * y;
        }
        self.y_history[0] = output;
        output
    }

    /// Processes a buffer of samples, returning a new buffer.
    pub fn process_buffer_copy(&mut self, input: &[f64]) -> Vec<f64> {
        input.iter().map(|&s| self.process(s)).collect()
    }
}
