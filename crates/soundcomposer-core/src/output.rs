//! Render state shared by every composable object.

use tracing::warn;

use crate::error::{ComposerError, ComposerResult};
use crate::signal::Signal;

/// Cached render result of a source, track or composer.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Output {
    /// `process()` has not succeeded yet.
    #[default]
    NotProcessed,
    /// Result of the last successful `process()`.
    Processed(Signal),
}

impl Output {
    /// Returns the signal if processed.
    pub fn signal(&self) -> Option<&Signal> {
        match self {
            Output::NotProcessed => None,
            Output::Processed(signal) => Some(signal),
        }
    }

    /// Returns true if processed.
    pub fn is_processed(&self) -> bool {
        matches!(self, Output::Processed(_))
    }
}

/// Lifecycle state of a composable object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Required data or controls are missing.
    Unconfigured,
    /// Ready to process.
    Configured,
    /// An output is cached.
    Processed,
}

/// Plot-ready series. Drawing is left to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotData {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl PlotData {
    /// Time-domain series of a signal.
    pub fn from_signal(signal: &Signal, title: impl Into<String>) -> Self {
        let y_label = if signal.unit.is_empty() {
            "Amplitude".to_string()
        } else {
            format!("Amplitude ({})", signal.unit)
        };
        Self {
            title: title.into(),
            x_label: "Time (s)".to_string(),
            y_label,
            x: signal.time_support(),
            y: signal.samples.clone(),
        }
    }
}

/// Emits the `NotProcessed` warning for `component`.
pub(crate) fn warn_not_processed(component: &str) {
    warn!(
        warning = "NotProcessed",
        component,
        "Output is not processed yet. Use the {}.process() method.",
        component
    );
}

/// Output accessors common to sources, tracks and the composer.
///
/// Accessors never fail: when nothing is cached they emit exactly one
/// `NotProcessed` warning and return an empty value.
pub trait Component {
    /// Type name used in warnings and plot titles.
    fn component_name(&self) -> &'static str;

    /// Cached output.
    fn output(&self) -> &Output;

    /// Returns true once every input needed by `process()` is set.
    fn is_configured(&self) -> bool;

    /// Current lifecycle state.
    fn state(&self) -> State {
        if self.output().is_processed() {
            State::Processed
        } else if self.is_configured() {
            State::Configured
        } else {
            State::Unconfigured
        }
    }

    /// Cached output signal, or `None` with a warning.
    fn get_output(&self) -> Option<&Signal> {
        let signal = self.output().signal();
        if signal.is_none() {
            warn_not_processed(self.component_name());
        }
        signal
    }

    /// Cached output samples, or an empty vector with a warning.
    fn get_output_as_vec(&self) -> Vec<f64> {
        self.get_output()
            .map(|signal| signal.samples.clone())
            .unwrap_or_default()
    }

    /// Plot series of the cached output.
    fn plot_data(&self) -> ComposerResult<PlotData> {
        match self.output() {
            Output::Processed(signal) => {
                let title = if signal.name.is_empty() {
                    self.component_name().to_string()
                } else {
                    signal.name.clone()
                };
                Ok(PlotData::from_signal(signal, title))
            }
            Output::NotProcessed => Err(ComposerError::not_processed(format!(
                "Output is not processed yet. Use the {}.process() method.",
                self.component_name()
            ))),
        }
    }
}
