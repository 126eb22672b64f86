//! A track: one source, an optional filter and a gain.

use std::fmt;

use tracing::debug;

use crate::error::{check_sampling_frequency, ComposerError, ComposerResult};
use crate::filter::Filter;
use crate::output::{Component, Output};
use crate::session::Session;
use crate::source::Source;

/// Converts a gain in dB to a linear amplitude factor.
pub fn db_to_linear(gain_db: f64) -> f64 {
    10f64.powf(gain_db / 20.0)
}

/// One layer of a composition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Track {
    /// Track name.
    pub name: String,
    gain: f64,
    /// Sound source of the track.
    pub source: Option<Source>,
    /// Filter applied to the rendered source.
    pub filter: Option<Filter>,
    output: Output,
}

impl Track {
    /// Creates an unnamed track with no source, no filter and 0 dB gain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a track playing `source`.
    pub fn with_source(source: impl Into<Source>) -> Self {
        Self {
            source: Some(source.into()),
            ..Self::default()
        }
    }

    /// Sets the name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the gain in dB.
    pub fn with_gain(mut self, gain: f64) -> ComposerResult<Self> {
        self.set_gain(gain)?;
        Ok(self)
    }

    /// Sets the filter.
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Gain in dB.
    pub fn gain(&self) -> f64 {
        self.gain
    }

    /// Sets the gain in dB. Must be finite.
    pub fn set_gain(&mut self, gain: f64) -> ComposerResult<()> {
        if !gain.is_finite() {
            return Err(ComposerError::invalid_input(format!(
                "track gain must be finite (got {gain})"
            )));
        }
        self.gain = gain;
        Ok(())
    }

    /// Renders the source, filters it and applies the gain.
    ///
    /// `None` renders at 44100 Hz. On error the previous output is kept.
    pub fn process(
        &mut self,
        session: &dyn Session,
        sampling_frequency: Option<f64>,
    ) -> ComposerResult<()> {
        if let Some(sampling_frequency) = sampling_frequency {
            check_sampling_frequency(sampling_frequency)?;
        }
        let source = self
            .source
            .as_mut()
            .ok_or_else(|| ComposerError::missing_input("Source is not set. Use Track.source."))?;

        source.process(session, sampling_frequency)?;
        let Some(rendered) = source.output().signal() else {
            return Err(ComposerError::not_processed(
                "source produced no output after process()",
            ));
        };

        let mut signal = match &self.filter {
            Some(filter) => filter.apply(session, rendered)?,
            None => rendered.clone(),
        };
        if self.gain != 0.0 {
            signal.scale(db_to_linear(self.gain));
        }
        if !self.name.is_empty() {
            signal.name = self.name.clone();
        }

        debug!(
            track = %self.name,
            samples = signal.len(),
            gain = self.gain,
            "track processed"
        );
        self.output = Output::Processed(signal);
        Ok(())
    }
}

impl Component for Track {
    fn component_name(&self) -> &'static str {
        "Track"
    }

    fn output(&self) -> &Output {
        &self.output
    }

    fn is_configured(&self) -> bool {
        self.source.as_ref().map_or(false, Component::is_configured)
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = if self.name.is_empty() {
            "Unnamed track"
        } else {
            self.name.as_str()
        };
        write!(f, "{name}\n\tSource: ")?;
        match &self.source {
            Some(source) => write!(f, "{source}")?,
            None => write!(f, "Not set")?,
        }
        let filter = if self.filter.is_some() { "Set" } else { "Not set" };
        write!(f, "\n\tFilter: {filter}")
    }
}
