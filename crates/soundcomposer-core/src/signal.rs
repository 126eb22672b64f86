//! Signal and table types exchanged with the operator runtime.

use serde::{Deserialize, Serialize};

use crate::error::{check_sampling_frequency, ComposerError, ComposerResult};

/// Default sampling frequency in Hz, used whenever none is given.
pub const DEFAULT_SAMPLING_FREQUENCY: f64 = 44100.0;

/// Returns true if two sampling frequencies are equal once rounded to 0.1 Hz.
pub fn same_sampling_frequency(a: f64, b: f64) -> bool {
    (a * 10.0).round() == (b * 10.0).round()
}

/// A time-domain signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// Samples, one per `1 / sampling_frequency` seconds.
    pub samples: Vec<f64>,
    /// Sampling frequency in Hz.
    pub sampling_frequency: f64,
    /// Physical unit of the samples (e.g. "Pa").
    #[serde(default)]
    pub unit: String,
    /// Signal name.
    #[serde(default)]
    pub name: String,
}

impl Signal {
    /// Creates a signal, checking the sampling frequency.
    pub fn new(samples: Vec<f64>, sampling_frequency: f64) -> ComposerResult<Self> {
        check_sampling_frequency(sampling_frequency)?;
        Ok(Self {
            samples,
            sampling_frequency,
            unit: String::new(),
            name: String::new(),
        })
    }

    /// Creates a signal with no samples.
    pub fn empty(sampling_frequency: f64) -> ComposerResult<Self> {
        Self::new(Vec::new(), sampling_frequency)
    }

    /// Sets the unit.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    /// Sets the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if the signal holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sampling_frequency
    }

    /// Time of each sample in seconds.
    pub fn time_support(&self) -> Vec<f64> {
        (0..self.samples.len())
            .map(|i| i as f64 / self.sampling_frequency)
            .collect()
    }

    /// Multiplies every sample by `factor`.
    pub fn scale(&mut self, factor: f64) {
        for sample in &mut self.samples {
            *sample *= factor;
        }
    }
}

/// A time-varying control profile (e.g. RPM versus time).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlProfile {
    /// Sample times in seconds, non-decreasing.
    pub times: Vec<f64>,
    /// Control values, one per time.
    pub values: Vec<f64>,
    /// Unit of the values (e.g. "rpm").
    #[serde(default)]
    pub unit: String,
    /// Profile name.
    #[serde(default)]
    pub name: String,
}

impl ControlProfile {
    /// Creates a control profile from paired times and values.
    pub fn new(times: Vec<f64>, values: Vec<f64>) -> ComposerResult<Self> {
        let profile = Self {
            times,
            values,
            unit: String::new(),
            name: String::new(),
        };
        profile.validate()?;
        Ok(profile)
    }

    /// Creates a control profile from uniformly sampled values.
    pub fn from_samples(values: Vec<f64>, sampling_frequency: f64) -> ComposerResult<Self> {
        check_sampling_frequency(sampling_frequency)?;
        let times = (0..values.len())
            .map(|i| i as f64 / sampling_frequency)
            .collect();
        Self::new(times, values)
    }

    /// Creates a linear ramp from `start` to `end` over `duration` seconds,
    /// sampled at `sampling_frequency`.
    pub fn ramp(
        start: f64,
        end: f64,
        duration: f64,
        sampling_frequency: f64,
    ) -> ComposerResult<Self> {
        check_sampling_frequency(sampling_frequency)?;
        if !duration.is_finite() || duration < 0.0 {
            return Err(ComposerError::invalid_input(format!(
                "ramp duration must be non-negative (got {duration})"
            )));
        }
        let n = (duration * sampling_frequency).round() as usize + 1;
        let times: Vec<f64> = (0..n).map(|i| i as f64 / sampling_frequency).collect();
        let values = if n == 1 {
            vec![start]
        } else {
            (0..n)
                .map(|i| start + (end - start) * i as f64 / (n - 1) as f64)
                .collect()
        };
        Self::new(times, values)
    }

    /// Sets the unit.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    /// Sets the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Checks the profile invariants.
    pub fn validate(&self) -> ComposerResult<()> {
        if self.times.is_empty() {
            return Err(ComposerError::invalid_input(
                "control profile must contain at least one sample",
            ));
        }
        if self.times.len() != self.values.len() {
            return Err(ComposerError::invalid_input(format!(
                "control profile has {} times but {} values",
                self.times.len(),
                self.values.len()
            )));
        }
        if self
            .times
            .iter()
            .chain(self.values.iter())
            .any(|v| !v.is_finite())
        {
            return Err(ComposerError::invalid_input(
                "control profile contains non-finite values",
            ));
        }
        if self.times.windows(2).any(|w| w[1] < w[0]) {
            return Err(ComposerError::invalid_input(
                "control profile times must be non-decreasing",
            ));
        }
        Ok(())
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Returns true if the profile holds no samples.
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Time between the first and last sample, in seconds.
    pub fn duration(&self) -> f64 {
        match (self.times.first(), self.times.last()) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        }
    }

    /// Smallest control value.
    pub fn min(&self) -> f64 {
        self.values.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Largest control value.
    pub fn max(&self) -> f64 {
        self.values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Control value at time `t` (seconds from the first sample), linearly
    /// interpolated and clamped at both ends.
    pub fn value_at(&self, t: f64) -> f64 {
        let (Some(&t0), Some(&first), Some(&last)) =
            (self.times.first(), self.values.first(), self.values.last())
        else {
            return 0.0;
        };
        let t = t + t0;
        if t <= t0 {
            return first;
        }
        // Index of the first time strictly greater than t.
        let upper = self.times.partition_point(|&x| x <= t);
        if upper >= self.times.len() {
            return last;
        }
        let lower = upper - 1;
        let (ta, tb) = (self.times[lower], self.times[upper]);
        let (va, vb) = (self.values[lower], self.values[upper]);
        if tb <= ta {
            return vb;
        }
        va + (vb - va) * (t - ta) / (tb - ta)
    }
}

/// A spectrum: frequencies and one value per frequency.
///
/// Source spectra hold power spectral density (unit^2/Hz); frequency
/// responses used for filter design hold linear magnitude.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spectrum {
    /// Frequencies in Hz, strictly increasing and non-negative.
    pub frequencies: Vec<f64>,
    /// One value per frequency.
    pub values: Vec<f64>,
    /// Unit of the values.
    #[serde(default)]
    pub unit: String,
    /// Spectrum name.
    #[serde(default)]
    pub name: String,
}

impl Spectrum {
    /// Creates a spectrum from frequencies and values.
    pub fn new(frequencies: Vec<f64>, values: Vec<f64>) -> ComposerResult<Self> {
        let spectrum = Self {
            frequencies,
            values,
            unit: String::new(),
            name: String::new(),
        };
        spectrum.validate()?;
        Ok(spectrum)
    }

    /// Sets the unit.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    /// Sets the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Checks the spectrum invariants.
    pub fn validate(&self) -> ComposerResult<()> {
        if self.frequencies.is_empty() {
            return Err(ComposerError::invalid_input(
                "spectrum must contain at least one frequency",
            ));
        }
        if self.frequencies.len() != self.values.len() {
            return Err(ComposerError::invalid_input(format!(
                "spectrum has {} frequencies but {} values",
                self.frequencies.len(),
                self.values.len()
            )));
        }
        if self
            .frequencies
            .iter()
            .chain(self.values.iter())
            .any(|v| !v.is_finite())
        {
            return Err(ComposerError::invalid_input(
                "spectrum contains non-finite values",
            ));
        }
        if self.frequencies[0] < 0.0 {
            return Err(ComposerError::invalid_input(
                "spectrum frequencies must be non-negative",
            ));
        }
        if self.frequencies.windows(2).any(|w| w[1] <= w[0]) {
            return Err(ComposerError::invalid_input(
                "spectrum frequencies must be strictly increasing",
            ));
        }
        Ok(())
    }

    /// Number of frequency bins.
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    /// Returns true if the spectrum holds no bins.
    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Lowest and highest frequency.
    pub fn frequency_range(&self) -> (f64, f64) {
        match (self.frequencies.first(), self.frequencies.last()) {
            (Some(&lo), Some(&hi)) => (lo, hi),
            _ => (0.0, 0.0),
        }
    }

    /// Mean frequency step, 0 for a single-bin spectrum.
    pub fn frequency_resolution(&self) -> f64 {
        let (lo, hi) = self.frequency_range();
        if self.frequencies.len() < 2 {
            0.0
        } else {
            (hi - lo) / (self.frequencies.len() - 1) as f64
        }
    }
}

/// A named, strictly increasing axis for a control dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlAxis {
    /// Control name (e.g. "RPM", "Speed").
    pub name: String,
    /// Control unit (e.g. "rpm", "km/h").
    #[serde(default)]
    pub unit: String,
    /// Axis values, strictly increasing.
    pub values: Vec<f64>,
}

impl ControlAxis {
    /// Creates an axis.
    pub fn new(
        name: impl Into<String>,
        unit: impl Into<String>,
        values: Vec<f64>,
    ) -> ComposerResult<Self> {
        let axis = Self {
            name: name.into(),
            unit: unit.into(),
            values,
        };
        axis.validate()?;
        Ok(axis)
    }

    /// Checks the axis invariants.
    pub fn validate(&self) -> ComposerResult<()> {
        if self.values.is_empty() {
            return Err(ComposerError::invalid_input(format!(
                "control axis '{}' must contain at least one value",
                self.name
            )));
        }
        if self.values.iter().any(|v| !v.is_finite()) {
            return Err(ComposerError::invalid_input(format!(
                "control axis '{}' contains non-finite values",
                self.name
            )));
        }
        if self.values.windows(2).any(|w| w[1] <= w[0]) {
            return Err(ComposerError::invalid_input(format!(
                "control axis '{}' must be strictly increasing",
                self.name
            )));
        }
        Ok(())
    }

    /// Number of axis values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the axis holds no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// First and last axis value.
    pub fn range(&self) -> (f64, f64) {
        match (self.values.first(), self.values.last()) {
            (Some(&lo), Some(&hi)) => (lo, hi),
            _ => (0.0, 0.0),
        }
    }
}
