//! Digital filter applied to a track's rendered signal.
//!
//! Filtering evaluates the difference equation
//!
//! ```text
//! y[n] = sum_{k=0..N} b[k] x[n-k] - sum_{k=1..M} a[k] y[n-k]
//! ```
//!
//! (normalized by `a[0]`) through the session. Coefficients are tied to the
//! filter's sampling frequency; the signal must have the same rate.

use std::fmt;
use std::path::Path;

use tracing::debug;

use crate::error::{check_sampling_frequency, ComposerError, ComposerResult};
use crate::io;
use crate::session::Session;
use crate::signal::{same_sampling_frequency, Signal, Spectrum, DEFAULT_SAMPLING_FREQUENCY};

/// IIR or FIR filter coefficients and their sampling frequency.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    b: Vec<f64>,
    a: Vec<f64>,
    sampling_frequency: f64,
}

impl Filter {
    /// Creates a filter at 44100 Hz.
    pub fn new(b: Vec<f64>, a: Vec<f64>) -> ComposerResult<Self> {
        Self::with_sampling_frequency(b, a, DEFAULT_SAMPLING_FREQUENCY)
    }

    /// Creates a filter at `sampling_frequency`.
    pub fn with_sampling_frequency(
        b: Vec<f64>,
        a: Vec<f64>,
        sampling_frequency: f64,
    ) -> ComposerResult<Self> {
        check_sampling_frequency(sampling_frequency)?;
        validate_coefficients(&b, &a)?;
        Ok(Self {
            b,
            a,
            sampling_frequency,
        })
    }

    /// Creates an FIR filter from its taps.
    pub fn fir(taps: Vec<f64>, sampling_frequency: f64) -> ComposerResult<Self> {
        Self::with_sampling_frequency(taps, vec![1.0], sampling_frequency)
    }

    /// Designs a minimum-phase FIR filter from a frequency response (linear
    /// magnitude). Response beyond half the sampling frequency is ignored;
    /// below it and past the last given frequency the response is zero.
    pub fn design_fir_from_frf(
        session: &dyn Session,
        frf: &Spectrum,
        sampling_frequency: f64,
    ) -> ComposerResult<Self> {
        check_sampling_frequency(sampling_frequency)?;
        frf.validate()?;
        debug!(
            operator = "design_fir_from_frf",
            sampling_frequency,
            points = frf.len(),
            "designing minimum-phase FIR filter"
        );
        let taps = session.design_fir_from_frf(frf, sampling_frequency)?;
        Self::fir(taps, sampling_frequency)
    }

    /// Designs a minimum-phase FIR filter from a two-column (frequency, gain
    /// in dB) text file.
    pub fn design_fir_from_frf_file(
        session: &dyn Session,
        path: impl AsRef<Path>,
        sampling_frequency: f64,
    ) -> ComposerResult<Self> {
        let (frequencies, gains_db) = io::read_two_column_text(path.as_ref())?;
        let magnitudes = gains_db
            .iter()
            .map(|db| 10f64.powf(db / 20.0))
            .collect();
        let frf = Spectrum::new(frequencies, magnitudes)?;
        Self::design_fir_from_frf(session, &frf, sampling_frequency)
    }

    /// Numerator coefficients.
    pub fn b(&self) -> &[f64] {
        &self.b
    }

    /// Denominator coefficients.
    pub fn a(&self) -> &[f64] {
        &self.a
    }

    /// Sampling frequency the coefficients are designed for.
    pub fn sampling_frequency(&self) -> f64 {
        self.sampling_frequency
    }

    /// Filters `signal`.
    ///
    /// Fails with `InvalidInput` when the signal's rate (rounded to 0.1 Hz)
    /// differs from the filter's.
    pub fn apply(&self, session: &dyn Session, signal: &Signal) -> ComposerResult<Signal> {
        if !same_sampling_frequency(signal.sampling_frequency, self.sampling_frequency) {
            return Err(ComposerError::invalid_input(format!(
                "signal sampling frequency ({:.1} Hz) must match the filter sampling frequency ({:.1} Hz)",
                signal.sampling_frequency, self.sampling_frequency
            )));
        }
        debug!(
            operator = "filter_signal",
            b = self.b.len(),
            a = self.a.len(),
            samples = signal.len(),
            "filtering signal"
        );
        Ok(session.filter_signal(&self.b, &self.a, signal)?)
    }
}

fn validate_coefficients(b: &[f64], a: &[f64]) -> ComposerResult<()> {
    if b.is_empty() {
        return Err(ComposerError::invalid_input(
            "Filter's numerator coefficients (b) cannot be empty.",
        ));
    }
    if a.is_empty() {
        return Err(ComposerError::invalid_input(
            "Filter's denominator coefficients (a) cannot be empty.",
        ));
    }
    if b.iter().chain(a).any(|c| !c.is_finite()) {
        return Err(ComposerError::invalid_input(
            "Filter coefficients must be finite.",
        ));
    }
    if a[0] == 0.0 {
        return Err(ComposerError::invalid_input(
            "Filter's first denominator coefficient (a[0]) cannot be zero.",
        ));
    }
    Ok(())
}

fn format_coefficients(coefficients: &[f64]) -> String {
    let shown: Vec<String> = coefficients
        .iter()
        .take(5)
        .map(|c| format!("{c:?}"))
        .collect();
    if coefficients.len() > 5 {
        format!("[{}, ... ]", shown.join(", "))
    } else {
        format!("[{}]", shown.join(", "))
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Sampling frequency: {:.1} Hz\nNumerator coefficients (B): {}\nDenominator coefficients (A): {}",
            self.sampling_frequency,
            format_coefficients(&self.b),
            format_coefficients(&self.a)
        )
    }
}
