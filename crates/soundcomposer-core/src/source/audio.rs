//! Audio source: a recorded clip, resampled when needed.

use std::fmt;
use std::path::Path;

use tracing::debug;

use super::{read_source_data, resolve_sampling_frequency, write_source_data, SourcePersistence};
use crate::container::GenericDataContainer;
use crate::error::{check_sampling_frequency, ComposerError, ComposerResult};
use crate::io;
use crate::output::{Component, Output};
use crate::session::Session;
use crate::signal::{same_sampling_frequency, Signal};

/// A source playing back an audio clip.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceAudio {
    source_audio_data: Option<Signal>,
    output: Output,
}

impl SourceAudio {
    /// Creates a source with no clip.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a source playing `signal`.
    pub fn from_signal(signal: Signal) -> ComposerResult<Self> {
        let mut source = Self::new();
        source.set_source_audio_data(signal)?;
        Ok(source)
    }

    /// Creates a source from a WAV file or a two-column (time, value) text file.
    pub fn from_file(path: impl AsRef<Path>) -> ComposerResult<Self> {
        let path = path.as_ref();
        let mut source = Self::new();
        if io::is_wave_file(path) {
            source.load_from_wave_file(path)?;
        } else {
            source.load_from_text_file(path)?;
        }
        Ok(source)
    }

    /// The audio clip, if set.
    pub fn source_audio_data(&self) -> Option<&Signal> {
        self.source_audio_data.as_ref()
    }

    /// Sets the audio clip.
    pub fn set_source_audio_data(&mut self, signal: Signal) -> ComposerResult<()> {
        check_sampling_frequency(signal.sampling_frequency)?;
        self.source_audio_data = Some(signal);
        Ok(())
    }

    /// Audio sources have no control: always true.
    pub fn is_source_control_valid(&self) -> bool {
        true
    }

    /// Loads the clip from the first channel of a WAV file.
    pub fn load_from_wave_file(&mut self, path: impl AsRef<Path>) -> ComposerResult<()> {
        let signal = io::read_wav(path.as_ref())?;
        self.set_source_audio_data(signal)
    }

    /// Loads the clip from a two-column (time, value) text file. The sampling
    /// frequency is taken from the first time step.
    pub fn load_from_text_file(&mut self, path: impl AsRef<Path>) -> ComposerResult<()> {
        let path = path.as_ref();
        let (times, samples) = io::read_two_column_text(path)?;
        let step = match times.as_slice() {
            [first, second, ..] => second - first,
            _ => {
                return Err(ComposerError::invalid_input(format!(
                    "{}: at least two samples are needed to derive the sampling frequency",
                    path.display()
                )))
            }
        };
        if step <= 0.0 {
            return Err(ComposerError::invalid_input(format!(
                "{}: time step must be strictly positive",
                path.display()
            )));
        }
        let name = io::file_stem_name(path);
        self.set_source_audio_data(Signal::new(samples, 1.0 / step)?.with_name(name))
    }

    /// Produces the clip at `sampling_frequency`, resampling through the
    /// session when the rates differ.
    pub fn process(
        &mut self,
        session: &dyn Session,
        sampling_frequency: Option<f64>,
    ) -> ComposerResult<()> {
        let sampling_frequency = resolve_sampling_frequency(sampling_frequency)?;
        let clip = self.source_audio_data.as_ref().ok_or_else(|| {
            ComposerError::missing_input(
                "Source's audio data is not set. Use SourceAudio::set_source_audio_data() \
                 or SourceAudio::load_from_wave_file().",
            )
        })?;

        let signal = if same_sampling_frequency(clip.sampling_frequency, sampling_frequency) {
            clip.clone()
        } else {
            debug!(
                operator = "resample",
                from = clip.sampling_frequency,
                to = sampling_frequency,
                "resampling audio source"
            );
            session.resample(clip, sampling_frequency)?
        };
        self.output = Output::Processed(signal);
        Ok(())
    }
}

impl Component for SourceAudio {
    fn component_name(&self) -> &'static str {
        "SourceAudio"
    }

    fn output(&self) -> &Output {
        &self.output
    }

    fn is_configured(&self) -> bool {
        self.source_audio_data.is_some()
    }
}

impl SourcePersistence for SourceAudio {
    fn set_from_generic_data_containers(
        &mut self,
        source_data: Option<&GenericDataContainer>,
        _source_control_data: Option<&GenericDataContainer>,
    ) -> ComposerResult<()> {
        self.source_audio_data = read_source_data(source_data, |signal: &Signal| {
            check_sampling_frequency(signal.sampling_frequency)
        })?;
        Ok(())
    }

    fn get_as_generic_data_containers(
        &self,
    ) -> ComposerResult<(Option<GenericDataContainer>, Option<GenericDataContainer>)> {
        let source = write_source_data(self.source_audio_data.as_ref(), "SourceAudio")?;
        Ok((source, None))
    }
}

impl fmt::Display for SourceAudio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source_audio_data {
            Some(clip) => {
                let duration = match clip.len() {
                    0 => "N/A".to_string(),
                    n => format!("{:.1} s", (n - 1) as f64 / clip.sampling_frequency),
                };
                write!(
                    f,
                    "Audio source: '{}'\n\tDuration: {}\n\tSampling frequency: {:.1} Hz",
                    clip.name, duration, clip.sampling_frequency
                )
            }
            None => write!(f, "Audio source: Not set"),
        }
    }
}
