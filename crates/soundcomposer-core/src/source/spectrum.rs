//! Spectrum source: sound synthesized from a power spectral density.

use std::fmt;
use std::path::Path;

use tracing::{debug, warn};

use super::{
    read_source_data, resolve_sampling_frequency, write_source_data, SourcePersistence,
    SPECTRUM_DURATION_PROPERTY, SPECTRUM_METHOD_PROPERTY,
};
use crate::container::GenericDataContainer;
use crate::control::SourceControlSpectrum;
use crate::error::{ComposerError, ComposerResult};
use crate::io;
use crate::output::{Component, Output};
use crate::session::Session;
use crate::signal::Spectrum;

/// A source rendered from a spectrum, for a given duration and method.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceSpectrum {
    source_spectrum_data: Option<Spectrum>,
    source_control: Option<SourceControlSpectrum>,
    output: Output,
}

impl SourceSpectrum {
    /// Creates a source with no data and no control.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a source from a spectrum and its control.
    pub fn with_data(spectrum: Spectrum, control: SourceControlSpectrum) -> ComposerResult<Self> {
        let mut source = Self::new();
        source.set_source_spectrum_data(spectrum)?;
        source.set_source_control(control);
        Ok(source)
    }

    /// Creates a source whose spectrum is loaded from a text file.
    pub fn from_file(
        path: impl AsRef<Path>,
        control: Option<SourceControlSpectrum>,
    ) -> ComposerResult<Self> {
        let mut source = Self::new();
        source.load_source_spectrum(path)?;
        source.source_control = control;
        Ok(source)
    }

    /// Power spectral density of the source, if set.
    pub fn source_spectrum_data(&self) -> Option<&Spectrum> {
        self.source_spectrum_data.as_ref()
    }

    /// Sets the power spectral density.
    pub fn set_source_spectrum_data(&mut self, spectrum: Spectrum) -> ComposerResult<()> {
        spectrum.validate()?;
        self.source_spectrum_data = Some(spectrum);
        Ok(())
    }

    /// Duration and method control, if set.
    pub fn source_control(&self) -> Option<&SourceControlSpectrum> {
        self.source_control.as_ref()
    }

    /// Sets the duration and method control.
    pub fn set_source_control(&mut self, control: SourceControlSpectrum) {
        self.source_control = Some(control);
    }

    /// Returns true if the control is set with a strictly positive duration.
    pub fn is_source_control_valid(&self) -> bool {
        self.source_control
            .map(|control| control.duration() > 0.0)
            .unwrap_or(false)
    }

    /// Loads the spectrum from a two-column (frequency, PSD) text file.
    pub fn load_source_spectrum(&mut self, path: impl AsRef<Path>) -> ComposerResult<()> {
        let path = path.as_ref();
        let (frequencies, values) = io::read_two_column_text(path)?;
        let name = io::file_stem_name(path);
        self.set_source_spectrum_data(Spectrum::new(frequencies, values)?.with_name(name))
    }

    /// Synthesizes the sound of the source.
    pub fn process(
        &mut self,
        session: &dyn Session,
        sampling_frequency: Option<f64>,
    ) -> ComposerResult<()> {
        let sampling_frequency = resolve_sampling_frequency(sampling_frequency)?;

        let control = self.source_control.ok_or_else(|| {
            ComposerError::missing_input(
                "Spectrum source control is not set. Use SourceSpectrum::set_source_control().",
            )
        })?;
        if control.duration() <= 0.0 {
            return Err(ComposerError::invalid_input(
                "Spectrum source control duration must be strictly positive.",
            ));
        }
        let spectrum = self.source_spectrum_data.as_ref().ok_or_else(|| {
            ComposerError::missing_input(
                "Source spectrum is not set. Use SourceSpectrum::set_source_spectrum_data() \
                 or SourceSpectrum::load_source_spectrum().",
            )
        })?;

        debug!(
            operator = "generate_spectrum",
            sampling_frequency,
            duration = control.duration(),
            method = control.method().name(),
            "rendering spectrum source"
        );
        let signal = session.generate_spectrum(spectrum, &control, sampling_frequency)?;
        self.output = Output::Processed(signal);
        Ok(())
    }
}

impl Component for SourceSpectrum {
    fn component_name(&self) -> &'static str {
        "SourceSpectrum"
    }

    fn output(&self) -> &Output {
        &self.output
    }

    fn is_configured(&self) -> bool {
        self.source_spectrum_data.is_some() && self.is_source_control_valid()
    }
}

impl SourcePersistence for SourceSpectrum {
    fn set_from_generic_data_containers(
        &mut self,
        source_data: Option<&GenericDataContainer>,
        source_control_data: Option<&GenericDataContainer>,
    ) -> ComposerResult<()> {
        self.source_spectrum_data = read_source_data(source_data, Spectrum::validate)?;
        self.source_control = match source_control_data {
            Some(container) => {
                let duration: f64 = container.get_property(SPECTRUM_DURATION_PROPERTY)?;
                let method: u32 = container.get_property(SPECTRUM_METHOD_PROPERTY)?;
                Some(SourceControlSpectrum::new(duration, method)?)
            }
            None => None,
        };
        Ok(())
    }

    fn get_as_generic_data_containers(
        &self,
    ) -> ComposerResult<(Option<GenericDataContainer>, Option<GenericDataContainer>)> {
        let source = write_source_data(self.source_spectrum_data.as_ref(), "SourceSpectrum")?;
        let control = match self.source_control {
            Some(control) => {
                let mut container = GenericDataContainer::new();
                container.set_property(SPECTRUM_DURATION_PROPERTY, &control.duration())?;
                container.set_property(SPECTRUM_METHOD_PROPERTY, &control.method().code())?;
                Some(container)
            }
            None => {
                warn!(
                    source = "SourceSpectrum",
                    "Cannot create source control generic data container because there is no source control data."
                );
                None
            }
        };
        Ok((source, control))
    }
}

impl fmt::Display for SourceSpectrum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Spectrum source: ")?;
        match &self.source_spectrum_data {
            Some(spectrum) => {
                let (_, fmax) = spectrum.frequency_range();
                let delta_f = match spectrum.frequencies.as_slice() {
                    [first, second, ..] => format!("{:.1} Hz", second - first),
                    _ => "N/A".to_string(),
                };
                write!(
                    f,
                    "'{}'\n\tFmax: {:.0} Hz\n\tDeltaF: {}",
                    spectrum.name, fmax, delta_f
                )?;
            }
            None => write!(f, "Not set")?,
        }
        match self.source_control {
            Some(control) if self.is_source_control_valid() => write!(
                f,
                "\nSource control: {}, {:?} s",
                control.method(),
                control.duration()
            ),
            _ => write!(f, "\nSource control: Not set/valid"),
        }
    }
}
