//! Broadband noise source driven by one control parameter.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    describe_time_control, format_value_list, read_source_data, read_time_control,
    resolve_sampling_frequency, time_profile, write_source_data, write_time_controls,
    SourcePersistence, CONTROL_PROPERTY,
};
use crate::container::GenericDataContainer;
use crate::control::SourceControlTime;
use crate::error::{ComposerError, ComposerResult};
use crate::io::{self, KeyedTable};
use crate::output::{Component, Output};
use crate::session::Session;
use crate::signal::{ControlAxis, Spectrum};

/// How the values of a noise spectrum are expressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpectrumType {
    /// Power spectral density per Hz.
    #[default]
    Narrowband,
    /// Band power per octave band, at the band centre frequencies.
    Octave,
    /// Band power per 1/3-octave band, at the band centre frequencies.
    ThirdOctave,
}

impl SpectrumType {
    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            SpectrumType::Narrowband => "Narrowband",
            SpectrumType::Octave => "Octave",
            SpectrumType::ThirdOctave => "1/3-octave",
        }
    }
}

impl FromStr for SpectrumType {
    type Err = ComposerError;

    /// Accepts the display names and `ThirdOctave`, in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            SpectrumType::Narrowband,
            SpectrumType::Octave,
            SpectrumType::ThirdOctave,
        ]
        .into_iter()
        .find(|t| s.eq_ignore_ascii_case(t.name()) || s.eq_ignore_ascii_case(&format!("{t:?}")))
        .ok_or_else(|| ComposerError::invalid_input(format!("unknown spectrum type '{s}'")))
    }
}

/// Reads the optional `Type` entry of a noise table.
pub(crate) fn read_spectrum_type(table: &KeyedTable) -> ComposerResult<SpectrumType> {
    match (table.text("Type"), table.line("Type")) {
        (Some(name), Some(line)) => name.parse().map_err(|_| {
            ComposerError::invalid_input(format!("line {line}: unknown spectrum type '{name}'"))
        }),
        _ => Ok(SpectrumType::default()),
    }
}

impl fmt::Display for SpectrumType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// First line of a broadband noise text file.
pub const BBN_HEADER: &str = "AnsysSound_BBN";

/// Noise spectra tabulated against one control parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadbandNoiseData {
    /// Data set name.
    #[serde(default)]
    pub name: String,
    pub spectrum_type: SpectrumType,
    /// Control parameter values, one per spectrum.
    pub control_axis: ControlAxis,
    /// One spectrum per control value.
    pub spectra: Vec<Spectrum>,
}

impl BroadbandNoiseData {
    /// Creates a data set, checking that there is one spectrum per control value.
    pub fn new(
        spectrum_type: SpectrumType,
        control_axis: ControlAxis,
        spectra: Vec<Spectrum>,
    ) -> ComposerResult<Self> {
        let data = Self {
            name: String::new(),
            spectrum_type,
            control_axis,
            spectra,
        };
        data.validate()?;
        Ok(data)
    }

    /// Sets the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Builds a data set from a [`BBN_HEADER`] table.
    ///
    /// The optional `Type` entry names the spectrum type (narrowband when
    /// absent) and `Control <name> <unit> <values...>` gives the control
    /// axis. Each data row holds a frequency then one value per control
    /// value.
    pub fn from_table(table: &KeyedTable) -> ComposerResult<Self> {
        let spectrum_type = read_spectrum_type(table)?;
        let control_axis = table.axis("Control")?;
        let (frequencies, columns) = table.columns(control_axis.len())?;
        let spectra = columns
            .into_iter()
            .map(|values| Spectrum::new(frequencies.clone(), values))
            .collect::<ComposerResult<Vec<_>>>()?;
        Self::new(spectrum_type, control_axis, spectra)
    }

    /// Checks the data invariants.
    pub fn validate(&self) -> ComposerResult<()> {
        self.control_axis.validate()?;
        if self.spectra.len() != self.control_axis.len() {
            return Err(ComposerError::invalid_input(format!(
                "broadband noise data has {} spectra for {} control values",
                self.spectra.len(),
                self.control_axis.len()
            )));
        }
        self.spectra.iter().try_for_each(Spectrum::validate)
    }
}

/// Broadband noise whose spectrum varies with a control profile.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceBroadbandNoise {
    source_bbn: Option<BroadbandNoiseData>,
    source_control: Option<SourceControlTime>,
    output: Output,
}

impl SourceBroadbandNoise {
    /// Creates a source with no data and no control.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a source from its noise data and control.
    pub fn with_data(data: BroadbandNoiseData, control: SourceControlTime) -> ComposerResult<Self> {
        let mut source = Self::new();
        source.set_source_bbn(data)?;
        source.set_source_control(control);
        Ok(source)
    }

    /// Creates a source whose noise data is loaded from a text file.
    pub fn from_file(
        path: impl AsRef<Path>,
        control: Option<SourceControlTime>,
    ) -> ComposerResult<Self> {
        let mut source = Self::new();
        source.load_source_bbn(path)?;
        source.source_control = control;
        Ok(source)
    }

    /// Noise data, if set.
    pub fn source_bbn(&self) -> Option<&BroadbandNoiseData> {
        self.source_bbn.as_ref()
    }

    /// Sets the noise data.
    pub fn set_source_bbn(&mut self, data: BroadbandNoiseData) -> ComposerResult<()> {
        data.validate()?;
        self.source_bbn = Some(data);
        Ok(())
    }

    /// Loads the noise data from an `AnsysSound_BBN` text file.
    ///
    /// The data set is named after the file.
    pub fn load_source_bbn(&mut self, path: impl AsRef<Path>) -> ComposerResult<()> {
        let path = path.as_ref();
        let table = io::read_keyed_table(path, BBN_HEADER)?;
        let data = BroadbandNoiseData::from_table(&table)
            .map_err(|e| io::prefix_path(path, e))?
            .with_name(io::file_stem_name(path));
        self.set_source_bbn(data)
    }

    /// Control, if set.
    pub fn source_control(&self) -> Option<&SourceControlTime> {
        self.source_control.as_ref()
    }

    /// Sets the control.
    pub fn set_source_control(&mut self, control: SourceControlTime) {
        self.source_control = Some(control);
    }

    /// Returns true if the control and its profile are set.
    pub fn is_source_control_valid(&self) -> bool {
        time_profile(self.source_control.as_ref()).is_some()
    }

    /// Synthesizes the noise along the control profile.
    pub fn process(
        &mut self,
        session: &dyn Session,
        sampling_frequency: Option<f64>,
    ) -> ComposerResult<()> {
        let sampling_frequency = resolve_sampling_frequency(sampling_frequency)?;
        let profile = time_profile(self.source_control.as_ref()).ok_or_else(|| {
            ComposerError::missing_input(
                "Broadband noise source control is not set. \
                 Use SourceBroadbandNoise::set_source_control().",
            )
        })?;
        let data = self.source_bbn.as_ref().ok_or_else(|| {
            ComposerError::missing_input(
                "Broadband noise source data is not set. Use SourceBroadbandNoise::set_source_bbn().",
            )
        })?;

        debug!(
            operator = "generate_broadband_noise",
            sampling_frequency,
            duration = profile.duration(),
            "rendering broadband noise source"
        );
        let signal = session.generate_broadband_noise(data, profile, sampling_frequency)?;
        self.output = Output::Processed(signal);
        Ok(())
    }
}

impl Component for SourceBroadbandNoise {
    fn component_name(&self) -> &'static str {
        "SourceBroadbandNoise"
    }

    fn output(&self) -> &Output {
        &self.output
    }

    fn is_configured(&self) -> bool {
        self.source_bbn.is_some() && self.is_source_control_valid()
    }
}

impl SourcePersistence for SourceBroadbandNoise {
    fn set_from_generic_data_containers(
        &mut self,
        source_data: Option<&GenericDataContainer>,
        source_control_data: Option<&GenericDataContainer>,
    ) -> ComposerResult<()> {
        self.source_bbn = read_source_data(source_data, BroadbandNoiseData::validate)?;
        self.source_control = read_time_control(source_control_data, CONTROL_PROPERTY)?;
        Ok(())
    }

    fn get_as_generic_data_containers(
        &self,
    ) -> ComposerResult<(Option<GenericDataContainer>, Option<GenericDataContainer>)> {
        let source = write_source_data(self.source_bbn.as_ref(), "SourceBroadbandNoise")?;
        let control = write_time_controls(
            &[(CONTROL_PROPERTY, self.source_control.as_ref())],
            "SourceBroadbandNoise",
        )?;
        Ok((source, control))
    }
}

impl fmt::Display for SourceBroadbandNoise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Broadband noise source: ")?;
        match &self.source_bbn {
            Some(data) => write!(
                f,
                "'{}'\n\tSpectrum type: {}\n\tSpectrum count: {}\n\tControl parameter: {}, {}\n\t\t{}",
                data.name,
                data.spectrum_type,
                data.spectra.len(),
                data.control_axis.name,
                data.control_axis.unit,
                format_value_list(&data.control_axis.values)
            )?,
            None => write!(f, "Not set")?,
        }
        match describe_time_control(self.source_control.as_ref()) {
            Some(control) => write!(f, "\nSource control: {control}"),
            None => write!(f, "\nSource control: Not set"),
        }
    }
}
