//! Broadband noise source driven by two control parameters.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::broadband_noise::read_spectrum_type;
use super::{
    describe_time_control, format_value_list, read_source_data, read_time_control,
    resolve_sampling_frequency, time_profile, write_source_data, write_time_controls,
    SourcePersistence, SpectrumType, CONTROL_1_PROPERTY, CONTROL_2_PROPERTY,
};
use crate::container::GenericDataContainer;
use crate::control::SourceControlTime;
use crate::error::{ComposerError, ComposerResult};
use crate::io::{self, KeyedTable};
use crate::output::{Component, Output};
use crate::session::Session;
use crate::signal::{ControlAxis, Spectrum};

/// First line of a two-parameter broadband noise text file.
pub const BBN_TWO_PARAMETERS_HEADER: &str = "AnsysSound_BBN_MultipleParameters";

/// Noise spectra tabulated against two control parameters.
///
/// `spectra` holds `n1 * n2` spectra in row-major order: the spectrum for
/// `(control_axis_1.values[i], control_axis_2.values[j])` is at `i * n2 + j`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadbandNoiseTwoParametersData {
    #[serde(default)]
    pub name: String,
    pub spectrum_type: SpectrumType,
    pub control_axis_1: ControlAxis,
    pub control_axis_2: ControlAxis,
    pub spectra: Vec<Spectrum>,
}

impl BroadbandNoiseTwoParametersData {
    /// Creates a data set, checking the grid size.
    pub fn new(
        spectrum_type: SpectrumType,
        control_axis_1: ControlAxis,
        control_axis_2: ControlAxis,
        spectra: Vec<Spectrum>,
    ) -> ComposerResult<Self> {
        let data = Self {
            name: String::new(),
            spectrum_type,
            control_axis_1,
            control_axis_2,
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

    /// Builds a data set from a [`BBN_TWO_PARAMETERS_HEADER`] table.
    ///
    /// `Control1` and `Control2` give the axes. Each data row holds a
    /// frequency then `n1 * n2` values in the grid order of `spectra`.
    pub fn from_table(table: &KeyedTable) -> ComposerResult<Self> {
        let spectrum_type = read_spectrum_type(table)?;
        let control_axis_1 = table.axis("Control1")?;
        let control_axis_2 = table.axis("Control2")?;
        let (frequencies, columns) =
            table.columns(control_axis_1.len() * control_axis_2.len())?;
        let spectra = columns
            .into_iter()
            .map(|values| Spectrum::new(frequencies.clone(), values))
            .collect::<ComposerResult<Vec<_>>>()?;
        Self::new(spectrum_type, control_axis_1, control_axis_2, spectra)
    }

    /// Checks the data invariants.
    pub fn validate(&self) -> ComposerResult<()> {
        self.control_axis_1.validate()?;
        self.control_axis_2.validate()?;
        let expected = self.control_axis_1.len() * self.control_axis_2.len();
        if self.spectra.len() != expected {
            return Err(ComposerError::invalid_input(format!(
                "broadband noise data has {} spectra for a {}x{} control grid",
                self.spectra.len(),
                self.control_axis_1.len(),
                self.control_axis_2.len()
            )));
        }
        self.spectra.iter().try_for_each(Spectrum::validate)
    }

    /// Spectrum at grid position `(i, j)`.
    pub fn spectrum(&self, i: usize, j: usize) -> Option<&Spectrum> {
        if j >= self.control_axis_2.len() {
            return None;
        }
        self.spectra.get(i * self.control_axis_2.len() + j)
    }
}

/// Broadband noise whose spectrum varies with two control profiles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceBroadbandNoiseTwoParameters {
    source_bbn_two_parameters: Option<BroadbandNoiseTwoParametersData>,
    source_control_1: Option<SourceControlTime>,
    source_control_2: Option<SourceControlTime>,
    output: Output,
}

impl SourceBroadbandNoiseTwoParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a source from its noise data and both controls.
    pub fn with_data(
        data: BroadbandNoiseTwoParametersData,
        control_1: SourceControlTime,
        control_2: SourceControlTime,
    ) -> ComposerResult<Self> {
        let mut source = Self::new();
        source.set_source_bbn_two_parameters(data)?;
        source.set_source_control_1(control_1);
        source.set_source_control_2(control_2);
        Ok(source)
    }

    /// Creates a source whose noise data is loaded from a text file.
    pub fn from_file(
        path: impl AsRef<Path>,
        control_1: Option<SourceControlTime>,
        control_2: Option<SourceControlTime>,
    ) -> ComposerResult<Self> {
        let mut source = Self::new();
        source.load_source_bbn_two_parameters(path)?;
        source.source_control_1 = control_1;
        source.source_control_2 = control_2;
        Ok(source)
    }

    pub fn source_bbn_two_parameters(&self) -> Option<&BroadbandNoiseTwoParametersData> {
        self.source_bbn_two_parameters.as_ref()
    }

    pub fn set_source_bbn_two_parameters(
        &mut self,
        data: BroadbandNoiseTwoParametersData,
    ) -> ComposerResult<()> {
        data.validate()?;
        self.source_bbn_two_parameters = Some(data);
        Ok(())
    }

    /// Loads the noise data from an `AnsysSound_BBN_MultipleParameters` text
    /// file, named after the file.
    pub fn load_source_bbn_two_parameters(&mut self, path: impl AsRef<Path>) -> ComposerResult<()> {
        let path = path.as_ref();
        let table = io::read_keyed_table(path, BBN_TWO_PARAMETERS_HEADER)?;
        let data = BroadbandNoiseTwoParametersData::from_table(&table)
            .map_err(|e| io::prefix_path(path, e))?
            .with_name(io::file_stem_name(path));
        self.set_source_bbn_two_parameters(data)
    }

    pub fn source_control_1(&self) -> Option<&SourceControlTime> {
        self.source_control_1.as_ref()
    }

    pub fn set_source_control_1(&mut self, control: SourceControlTime) {
        self.source_control_1 = Some(control);
    }

    pub fn source_control_2(&self) -> Option<&SourceControlTime> {
        self.source_control_2.as_ref()
    }

    pub fn set_source_control_2(&mut self, control: SourceControlTime) {
        self.source_control_2 = Some(control);
    }

    /// Returns true if both controls and their profiles are set.
    pub fn is_source_control_valid(&self) -> bool {
        time_profile(self.source_control_1.as_ref()).is_some()
            && time_profile(self.source_control_2.as_ref()).is_some()
    }

    /// Synthesizes the noise along both control profiles. The first control
    /// sets the duration.
    pub fn process(
        &mut self,
        session: &dyn Session,
        sampling_frequency: Option<f64>,
    ) -> ComposerResult<()> {
        let sampling_frequency = resolve_sampling_frequency(sampling_frequency)?;
        let (Some(profile_1), Some(profile_2)) = (
            time_profile(self.source_control_1.as_ref()),
            time_profile(self.source_control_2.as_ref()),
        ) else {
            return Err(ComposerError::missing_input(
                "Broadband noise source control is not valid. Both controls must be set. Use \
                 SourceBroadbandNoiseTwoParameters::set_source_control_1() and \
                 SourceBroadbandNoiseTwoParameters::set_source_control_2().",
            ));
        };
        let data = self.source_bbn_two_parameters.as_ref().ok_or_else(|| {
            ComposerError::missing_input(
                "Broadband noise source data is not set. \
                 Use SourceBroadbandNoiseTwoParameters::set_source_bbn_two_parameters().",
            )
        })?;

        debug!(
            operator = "generate_broadband_noise_two_parameters",
            sampling_frequency,
            duration = profile_1.duration(),
            "rendering two-parameter broadband noise source"
        );
        let signal = session.generate_broadband_noise_two_parameters(
            data,
            profile_1,
            profile_2,
            sampling_frequency,
        )?;
        self.output = Output::Processed(signal);
        Ok(())
    }
}

impl Component for SourceBroadbandNoiseTwoParameters {
    fn component_name(&self) -> &'static str {
        "SourceBroadbandNoiseTwoParameters"
    }

    fn output(&self) -> &Output {
        &self.output
    }

    fn is_configured(&self) -> bool {
        self.source_bbn_two_parameters.is_some() && self.is_source_control_valid()
    }
}

impl SourcePersistence for SourceBroadbandNoiseTwoParameters {
    fn set_from_generic_data_containers(
        &mut self,
        source_data: Option<&GenericDataContainer>,
        source_control_data: Option<&GenericDataContainer>,
    ) -> ComposerResult<()> {
        self.source_bbn_two_parameters =
            read_source_data(source_data, BroadbandNoiseTwoParametersData::validate)?;
        self.source_control_1 = read_time_control(source_control_data, CONTROL_1_PROPERTY)?;
        self.source_control_2 = read_time_control(source_control_data, CONTROL_2_PROPERTY)?;
        Ok(())
    }

    fn get_as_generic_data_containers(
        &self,
    ) -> ComposerResult<(Option<GenericDataContainer>, Option<GenericDataContainer>)> {
        let type_name = "SourceBroadbandNoiseTwoParameters";
        let source = write_source_data(self.source_bbn_two_parameters.as_ref(), type_name)?;
        let control = write_time_controls(
            &[
                (CONTROL_1_PROPERTY, self.source_control_1.as_ref()),
                (CONTROL_2_PROPERTY, self.source_control_2.as_ref()),
            ],
            type_name,
        )?;
        Ok((source, control))
    }
}

impl fmt::Display for SourceBroadbandNoiseTwoParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Broadband noise source with two parameters: ")?;
        match &self.source_bbn_two_parameters {
            Some(data) => write!(
                f,
                "'{}'\n\tSpectrum type: {}\n\tSpectrum count: {}\n\
                 \tFirst parameter: {}, {}\n\t\t{}\n\
                 \tSecond parameter: {}, {}\n\t\t{}",
                data.name,
                data.spectrum_type,
                data.spectra.len(),
                data.control_axis_1.name,
                data.control_axis_1.unit,
                format_value_list(&data.control_axis_1.values),
                data.control_axis_2.name,
                data.control_axis_2.unit,
                format_value_list(&data.control_axis_2.values)
            )?,
            None => write!(f, "Not set")?,
        }
        let describe = |control: Option<&SourceControlTime>| {
            describe_time_control(control).unwrap_or_else(|| "Not set".to_string())
        };
        write!(
            f,
            "\nSource control 1: {}\nSource control 2: {}",
            describe(self.source_control_1.as_ref()),
            describe(self.source_control_2.as_ref())
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::ControlProfile;
    use crate::testing::FakeSession;

    fn grid() -> BroadbandNoiseTwoParametersData {
        let speed = ControlAxis::new("Speed", "km/h", vec![30.0, 90.0]).unwrap();
        let load = ControlAxis::new("Load", "%", vec![0.0, 50.0, 100.0]).unwrap();
        let spectra = (0..6)
            .map(|k| Spectrum::new(vec![100.0, 1000.0], vec![1e-4 * (k + 1) as f64, 1e-5]).unwrap())
            .collect();
        BroadbandNoiseTwoParametersData::new(SpectrumType::ThirdOctave, speed, load, spectra)
            .unwrap()
    }

    fn control(values: [f64; 2], duration: f64) -> SourceControlTime {
        let profile = ControlProfile::new(vec![0.0, duration], values.to_vec()).unwrap();
        SourceControlTime::from_profile(profile).unwrap()
    }

    #[test]
    fn test_grid_indexing_is_row_major() {
        let data = grid();
        assert_eq!(data.spectrum(1, 0).unwrap().values[0], 1e-4 * 4.0);
        assert_eq!(data.spectrum(0, 2).unwrap().values[0], 1e-4 * 3.0);
        assert!(data.spectrum(0, 3).is_none());
        assert!(data.spectrum(2, 0).is_none());
    }

    #[test]
    fn test_grid_size_is_checked() {
        let mut data = grid();
        data.spectra.pop();
        assert!(matches!(
            data.validate(),
            Err(ComposerError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_process_needs_both_controls() {
        let session = FakeSession::new();
        let mut source = SourceBroadbandNoiseTwoParameters::new();
        source.set_source_bbn_two_parameters(grid()).unwrap();
        source.set_source_control_1(control([30.0, 90.0], 1.0));
        assert!(matches!(
            source.process(&session, None),
            Err(ComposerError::MissingInput(_))
        ));

        source.set_source_control_2(control([0.0, 100.0], 3.0));
        source.process(&session, Some(50.0)).unwrap();
        assert_eq!(source.get_output().unwrap().len(), 50);
    }

    #[test]
    fn test_generic_data_containers_round_trip() {
        let source = SourceBroadbandNoiseTwoParameters::with_data(
            grid(),
            control([30.0, 90.0], 1.0),
            control([0.0, 100.0], 1.0),
        )
        .unwrap();
        let (data, control) = source.get_as_generic_data_containers().unwrap();
        let mut restored = SourceBroadbandNoiseTwoParameters::new();
        restored
            .set_from_generic_data_containers(data.as_ref(), control.as_ref())
            .unwrap();
        assert_eq!(restored, source);
    }

    #[test]
    fn test_display_lists_both_controls() {
        let text = SourceBroadbandNoiseTwoParameters::new().to_string();
        assert_eq!(
            text,
            "Broadband noise source with two parameters: Not set\n\
             Source control 1: Not set\nSource control 2: Not set"
        );
    }
}
