//! Test doubles: a fake operator runtime and a warning counter.

use std::cell::Cell;
use std::sync::{Arc, Mutex};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::Registry;

use crate::control::SourceControlSpectrum;
use crate::error::{OperatorError, OperatorResult};
use crate::session::Session;
use crate::signal::{ControlProfile, Signal, Spectrum};
use crate::source::{
    BroadbandNoiseData, BroadbandNoiseTwoParametersData, HarmonicsData,
    HarmonicsTwoParametersData,
};

/// Session that renders deterministic placeholder samples of the right
/// length, or fails every call.
#[derive(Debug, Default)]
pub(crate) struct FakeSession {
    failing: bool,
    calls: Cell<usize>,
}

impl FakeSession {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing() -> Self {
        Self {
            failing: true,
            calls: Cell::new(0),
        }
    }

    /// Number of session calls made so far.
    pub(crate) fn calls(&self) -> usize {
        self.calls.get()
    }

    fn call(&self, operator: &str) -> OperatorResult<()> {
        self.calls.set(self.calls.get() + 1);
        if self.failing {
            return Err(OperatorError::new(operator, "FAKE_001", "fake session failure"));
        }
        Ok(())
    }

    fn render(duration: f64, level: f64, sampling_frequency: f64) -> OperatorResult<Signal> {
        let len = (sampling_frequency * duration).round() as usize;
        let samples = (0..len)
            .map(|i| level * (i as f64 * 0.37).sin())
            .collect();
        Signal::new(samples, sampling_frequency)
            .map_err(|e| OperatorError::new("render", "FAKE_002", e.to_string()))
    }
}

impl Session for FakeSession {
    fn generate_spectrum(
        &self,
        spectrum: &Spectrum,
        control: &SourceControlSpectrum,
        sampling_frequency: f64,
    ) -> OperatorResult<Signal> {
        self.call("generate_spectrum")?;
        Self::render(control.duration(), spectrum.values[0].sqrt(), sampling_frequency)
    }

    fn generate_broadband_noise(
        &self,
        _data: &BroadbandNoiseData,
        control: &ControlProfile,
        sampling_frequency: f64,
    ) -> OperatorResult<Signal> {
        self.call("generate_broadband_noise")?;
        Self::render(control.duration(), 0.1, sampling_frequency)
    }

    fn generate_broadband_noise_two_parameters(
        &self,
        _data: &BroadbandNoiseTwoParametersData,
        control_1: &ControlProfile,
        _control_2: &ControlProfile,
        sampling_frequency: f64,
    ) -> OperatorResult<Signal> {
        self.call("generate_broadband_noise_two_parameters")?;
        Self::render(control_1.duration(), 0.1, sampling_frequency)
    }

    fn generate_harmonics(
        &self,
        _data: &HarmonicsData,
        rpm: &ControlProfile,
        sampling_frequency: f64,
    ) -> OperatorResult<Signal> {
        self.call("generate_harmonics")?;
        Self::render(rpm.duration(), 0.2, sampling_frequency)
    }

    fn generate_harmonics_two_parameters(
        &self,
        _data: &HarmonicsTwoParametersData,
        rpm: &ControlProfile,
        _control_2: &ControlProfile,
        sampling_frequency: f64,
    ) -> OperatorResult<Signal> {
        self.call("generate_harmonics_two_parameters")?;
        Self::render(rpm.duration(), 0.2, sampling_frequency)
    }

    fn resample(&self, signal: &Signal, sampling_frequency: f64) -> OperatorResult<Signal> {
        self.call("resample")?;
        let ratio = sampling_frequency / signal.sampling_frequency;
        let len = (signal.len() as f64 * ratio).round() as usize;
        let samples = (0..len)
            .map(|i| {
                let source = ((i as f64 / ratio) as usize).min(signal.len().saturating_sub(1));
                signal.samples.get(source).copied().unwrap_or(0.0)
            })
            .collect();
        let mut resampled = signal.clone();
        resampled.samples = samples;
        resampled.sampling_frequency = sampling_frequency;
        Ok(resampled)
    }

    fn filter_signal(&self, b: &[f64], a: &[f64], signal: &Signal) -> OperatorResult<Signal> {
        self.call("filter_signal")?;
        let x = &signal.samples;
        let mut y = vec![0.0; x.len()];
        for n in 0..x.len() {
            let mut acc = 0.0;
            for (k, bk) in b.iter().enumerate().take(n + 1) {
                acc += bk * x[n - k];
            }
            for (k, ak) in a.iter().enumerate().skip(1).take(n) {
                acc -= ak * y[n - k];
            }
            y[n] = acc / a[0];
        }
        let mut filtered = signal.clone();
        filtered.samples = y;
        Ok(filtered)
    }

    fn design_fir_from_frf(
        &self,
        frf: &Spectrum,
        _sampling_frequency: f64,
    ) -> OperatorResult<Vec<f64>> {
        self.call("design_fir_from_frf")?;
        Ok(frf.values.clone())
    }
}

/// Warnings seen while running a closure.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WarningCount {
    pub(crate) total: usize,
    pub(crate) not_processed: usize,
}

struct WarningLayer {
    counts: Arc<Mutex<WarningCount>>,
}

#[derive(Default)]
struct WarningKind {
    not_processed: bool,
}

impl Visit for WarningKind {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "warning" && value == "NotProcessed" {
            self.not_processed = true;
        }
    }

    fn record_debug(&mut self, _field: &Field, _value: &dyn std::fmt::Debug) {}
}

impl<S: Subscriber> Layer<S> for WarningLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() != Level::WARN {
            return;
        }
        let mut kind = WarningKind::default();
        event.record(&mut kind);
        if let Ok(mut counts) = self.counts.lock() {
            counts.total += 1;
            if kind.not_processed {
                counts.not_processed += 1;
            }
        }
    }
}

/// Runs `f` with a subscriber that counts `WARN` events.
pub(crate) fn count_warnings<R>(f: impl FnOnce() -> R) -> (R, WarningCount) {
    let counts = Arc::new(Mutex::new(WarningCount::default()));
    let subscriber = Registry::default().with(WarningLayer {
        counts: Arc::clone(&counts),
    });
    let result = tracing::subscriber::with_default(subscriber, f);
    let counts = *counts.lock().unwrap();
    (result, counts)
}
