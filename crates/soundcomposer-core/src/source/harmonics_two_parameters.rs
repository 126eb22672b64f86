//! Harmonics source driven by RPM and a second control parameter.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::harmonics::{validate_levels, validate_orders};
use super::{
    describe_time_control, format_value_list, read_source_data, read_time_control,
    resolve_sampling_frequency, time_profile, write_source_data, write_time_controls,
    SourcePersistence, CONTROL_1_PROPERTY, CONTROL_2_PROPERTY,
};
use crate::container::GenericDataContainer;
use crate::control::SourceControlTime;
use crate::error::{ComposerError, ComposerResult};
use crate::io::{self, KeyedTable};
use crate::output::{Component, Output};
use crate::session::Session;
use crate::signal::ControlAxis;

/// First line of a two-parameter harmonics text file.
pub const HARMONICS_TWO_PARAMETERS_HEADER: &str = "AnsysSound_Orders_MultipleParameters";

/// Harmonic levels tabulated against RPM and a second parameter.
///
/// `levels` holds `n_rpm * n2` rows in row-major order: the row for
/// `(rpm_axis.values[i], control_axis_2.values[j])` is at `i * n2 + j`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarmonicsTwoParametersData {
    #[serde(default)]
    pub name: String,
    pub orders: Vec<f64>,
    pub rpm_axis: ControlAxis,
    pub control_axis_2: ControlAxis,
    pub levels: Vec<Vec<f64>>,
    #[serde(default)]
    pub unit: String,
}

impl HarmonicsTwoParametersData {
    pub fn new(
        orders: Vec<f64>,
        rpm_axis: ControlAxis,
        control_axis_2: ControlAxis,
        levels: Vec<Vec<f64>>,
    ) -> ComposerResult<Self> {
        let data = Self {
            name: String::new(),
            orders,
            rpm_axis,
            control_axis_2,
            levels,
            unit: String::new(),
        };
        data.validate()?;
        Ok(data)
    }

    /// Sets the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Builds a level table from a [`HARMONICS_TWO_PARAMETERS_HEADER`] table.
    ///
    /// `Control1` is the RPM axis, `Control2` the second axis and `Unit`
    /// the optional level unit. Each data row holds an order then
    /// `n_rpm * n2` levels in the grid order of `levels`.
    pub fn from_table(table: &KeyedTable) -> ComposerResult<Self> {
        let rpm_axis = table.axis("Control1")?;
        let control_axis_2 = table.axis("Control2")?;
        let (orders, levels) = table.columns(rpm_axis.len() * control_axis_2.len())?;
        let mut data = Self::new(orders, rpm_axis, control_axis_2, levels)?;
        data.unit = table.text("Unit").unwrap_or_default();
        Ok(data)
    }

    /// Checks the data invariants.
    pub fn validate(&self) -> ComposerResult<()> {
        validate_orders(&self.orders)?;
        self.rpm_axis.validate()?;
        self.control_axis_2.validate()?;
        validate_levels(
            &self.levels,
            self.rpm_axis.len() * self.control_axis_2.len(),
            self.orders.len(),
        )
    }

    /// Level row at grid position `(i, j)`.
    pub fn levels_at(&self, i: usize, j: usize) -> Option<&[f64]> {
        if j >= self.control_axis_2.len() {
            return None;
        }
        self.levels
            .get(i * self.control_axis_2.len() + j)
            .map(Vec::as_slice)
    }
}

/// Harmonics of an RPM profile, with levels also depending on a second
/// control profile.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceHarmonicsTwoParameters {
    source_harmonics_two_parameters: Option<HarmonicsTwoParametersData>,
    source_control_rpm: Option<SourceControlTime>,
    source_control_2: Option<SourceControlTime>,
    output: Output,
}

impl SourceHarmonicsTwoParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(
        data: HarmonicsTwoParametersData,
        control_rpm: SourceControlTime,
        control_2: SourceControlTime,
    ) -> ComposerResult<Self> {
        let mut source = Self::new();
        source.set_source_harmonics_two_parameters(data)?;
        source.set_source_control_rpm(control_rpm);
        source.set_source_control_2(control_2);
        Ok(source)
    }

    /// Creates a source whose level table is loaded from a text file.
    pub fn from_file(
        path: impl AsRef<Path>,
        control_rpm: Option<SourceControlTime>,
        control_2: Option<SourceControlTime>,
    ) -> ComposerResult<Self> {
        let mut source = Self::new();
        source.load_source_harmonics_two_parameters(path)?;
        source.source_control_rpm = control_rpm;
        source.source_control_2 = control_2;
        Ok(source)
    }

    pub fn source_harmonics_two_parameters(&self) -> Option<&HarmonicsTwoParametersData> {
        self.source_harmonics_two_parameters.as_ref()
    }

    pub fn set_source_harmonics_two_parameters(
        &mut self,
        data: HarmonicsTwoParametersData,
    ) -> ComposerResult<()> {
        data.validate()?;
        self.source_harmonics_two_parameters = Some(data);
        Ok(())
    }

    /// Loads the level table from an `AnsysSound_Orders_MultipleParameters`
    /// text file, named after the file.
    pub fn load_source_harmonics_two_parameters(
        &mut self,
        path: impl AsRef<Path>,
    ) -> ComposerResult<()> {
        let path = path.as_ref();
        let table = io::read_keyed_table(path, HARMONICS_TWO_PARAMETERS_HEADER)?;
        let data = HarmonicsTwoParametersData::from_table(&table)
            .map_err(|e| io::prefix_path(path, e))?
            .with_name(io::file_stem_name(path));
        self.set_source_harmonics_two_parameters(data)
    }

    pub fn source_control_rpm(&self) -> Option<&SourceControlTime> {
        self.source_control_rpm.as_ref()
    }

    pub fn set_source_control_rpm(&mut self, control: SourceControlTime) {
        self.source_control_rpm = Some(control);
    }

    pub fn source_control_2(&self) -> Option<&SourceControlTime> {
        self.source_control_2.as_ref()
    }

    pub fn set_source_control_2(&mut self, control: SourceControlTime) {
        self.source_control_2 = Some(control);
    }

    pub fn is_source_control_valid(&self) -> bool {
        time_profile(self.source_control_rpm.as_ref()).is_some()
            && time_profile(self.source_control_2.as_ref()).is_some()
    }

    /// Synthesizes the harmonics. The RPM control sets the duration.
    pub fn process(
        &mut self,
        session: &dyn Session,
        sampling_frequency: Option<f64>,
    ) -> ComposerResult<()> {
        let sampling_frequency = resolve_sampling_frequency(sampling_frequency)?;
        let (Some(rpm), Some(profile_2)) = (
            time_profile(self.source_control_rpm.as_ref()),
            time_profile(self.source_control_2.as_ref()),
        ) else {
            return Err(ComposerError::missing_input(
                "Harmonics source control is not valid. Both controls must be set. Use \
                 SourceHarmonicsTwoParameters::set_source_control_rpm() and \
                 SourceHarmonicsTwoParameters::set_source_control_2().",
            ));
        };
        let data = self.source_harmonics_two_parameters.as_ref().ok_or_else(|| {
            ComposerError::missing_input(
                "Harmonics source data is not set. \
                 Use SourceHarmonicsTwoParameters::set_source_harmonics_two_parameters().",
            )
        })?;

        debug!(
            operator = "generate_harmonics_two_parameters",
            sampling_frequency,
            orders = data.orders.len(),
            "rendering two-parameter harmonics source"
        );
        let signal =
            session.generate_harmonics_two_parameters(data, rpm, profile_2, sampling_frequency)?;
        self.output = Output::Processed(signal);
        Ok(())
    }
}

impl Component for SourceHarmonicsTwoParameters {
    fn component_name(&self) -> &'static str {
        "SourceHarmonicsTwoParameters"
    }

    fn output(&self) -> &Output {
        &self.output
    }

    fn is_configured(&self) -> bool {
        self.source_harmonics_two_parameters.is_some() && self.is_source_control_valid()
    }
}

impl SourcePersistence for SourceHarmonicsTwoParameters {
    fn set_from_generic_data_containers(
        &mut self,
        source_data: Option<&GenericDataContainer>,
        source_control_data: Option<&GenericDataContainer>,
    ) -> ComposerResult<()> {
        self.source_harmonics_two_parameters =
            read_source_data(source_data, HarmonicsTwoParametersData::validate)?;
        self.source_control_rpm = read_time_control(source_control_data, CONTROL_1_PROPERTY)?;
        self.source_control_2 = read_time_control(source_control_data, CONTROL_2_PROPERTY)?;
        Ok(())
    }

    fn get_as_generic_data_containers(
        &self,
    ) -> ComposerResult<(Option<GenericDataContainer>, Option<GenericDataContainer>)> {
        let type_name = "SourceHarmonicsTwoParameters";
        let source = write_source_data(self.source_harmonics_two_parameters.as_ref(), type_name)?;
        let control = write_time_controls(
            &[
                (CONTROL_1_PROPERTY, self.source_control_rpm.as_ref()),
                (CONTROL_2_PROPERTY, self.source_control_2.as_ref()),
            ],
            type_name,
        )?;
        Ok((source, control))
    }
}

impl fmt::Display for SourceHarmonicsTwoParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Harmonics source with two parameters: ")?;
        match &self.source_harmonics_two_parameters {
            Some(data) => {
                let (rpm_min, rpm_max) = data.rpm_axis.range();
                let (min_2, max_2) = data.control_axis_2.range();
                write!(
                    f,
                    "'{}'\n\tNumber of orders: {}\n\t\t{}\n\
                     \tFirst parameter: {}, {:.1} - {:.1} rpm\n\t\t{}\n\
                     \tSecond parameter: {}, {:.1} - {:.1} {}\n\t\t{}",
                    data.name,
                    data.orders.len(),
                    format_value_list(&data.orders),
                    data.rpm_axis.name,
                    rpm_min,
                    rpm_max,
                    format_value_list(&data.rpm_axis.values),
                    data.control_axis_2.name,
                    min_2,
                    max_2,
                    data.control_axis_2.unit,
                    format_value_list(&data.control_axis_2.values)
                )?;
            }
            None => write!(f, "Not set")?,
        }
        let describe = |control: Option<&SourceControlTime>| {
            describe_time_control(control).unwrap_or_else(|| "Not set/valid".to_string())
        };
        write!(
            f,
            "\nSource control RPM: {}\nSource control 2: {}",
            describe(self.source_control_rpm.as_ref()),
            describe(self.source_control_2.as_ref())
        )
    }
}
