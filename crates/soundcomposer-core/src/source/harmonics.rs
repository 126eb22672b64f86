//! Harmonics source: tonal orders of a rotating machine following an RPM profile.

use std::fmt;
use std::path::Path;

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
use crate::signal::ControlAxis;

/// First line of a harmonics text file.
pub const HARMONICS_HEADER: &str = "AnsysSound_Orders";

/// Checks harmonic orders: at least one, all strictly positive and finite.
pub(crate) fn validate_orders(orders: &[f64]) -> ComposerResult<()> {
    if orders.is_empty() {
        return Err(ComposerError::invalid_input(
            "harmonics data must contain at least one order",
        ));
    }
    if orders.iter().any(|o| !o.is_finite() || *o <= 0.0) {
        return Err(ComposerError::invalid_input(
            "harmonic orders must be strictly positive",
        ));
    }
    Ok(())
}

/// Checks a level table: `rows` rows of one finite level per order.
pub(crate) fn validate_levels(levels: &[Vec<f64>], rows: usize, orders: usize) -> ComposerResult<()> {
    if levels.len() != rows {
        return Err(ComposerError::invalid_input(format!(
            "harmonics data has {} level rows, expected {}",
            levels.len(),
            rows
        )));
    }
    for (index, row) in levels.iter().enumerate() {
        if row.len() != orders {
            return Err(ComposerError::invalid_input(format!(
                "level row {} has {} values for {} orders",
                index,
                row.len(),
                orders
            )));
        }
        if row.iter().any(|v| !v.is_finite()) {
            return Err(ComposerError::invalid_input(format!(
                "level row {index} contains non-finite values"
            )));
        }
    }
    Ok(())
}

/// Harmonic levels tabulated against RPM.
///
/// `levels[k][o]` is the RMS amplitude of `orders[o]` at `rpm_axis.values[k]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarmonicsData {
    #[serde(default)]
    pub name: String,
    /// Harmonic orders (multiples of the rotation frequency).
    pub orders: Vec<f64>,
    pub rpm_axis: ControlAxis,
    /// One row of levels per RPM value.
    pub levels: Vec<Vec<f64>>,
    /// Unit of the levels.
    #[serde(default)]
    pub unit: String,
}

impl HarmonicsData {
    pub fn new(orders: Vec<f64>, rpm_axis: ControlAxis, levels: Vec<Vec<f64>>) -> ComposerResult<Self> {
        let data = Self {
            name: String::new(),
            orders,
            rpm_axis,
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

    /// Sets the unit of the levels.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    /// Builds a level table from a [`HARMONICS_HEADER`] table.
    ///
    /// `Control <name> <unit> <values...>` gives the RPM axis and the
    /// optional `Unit` entry the unit of the levels. Each data row holds an
    /// order then its level at every RPM value.
    pub fn from_table(table: &KeyedTable) -> ComposerResult<Self> {
        let rpm_axis = table.axis("Control")?;
        let (orders, levels) = table.columns(rpm_axis.len())?;
        let unit = table.text("Unit").unwrap_or_default();
        Ok(Self::new(orders, rpm_axis, levels)?.with_unit(unit))
    }

    /// Checks the data invariants.
    pub fn validate(&self) -> ComposerResult<()> {
        validate_orders(&self.orders)?;
        self.rpm_axis.validate()?;
        validate_levels(&self.levels, self.rpm_axis.len(), self.orders.len())
    }
}

/// Harmonics of an RPM profile.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceHarmonics {
    source_harmonics: Option<HarmonicsData>,
    source_control: Option<SourceControlTime>,
    output: Output,
}

impl SourceHarmonics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a source from its level table and RPM control.
    pub fn with_data(data: HarmonicsData, control: SourceControlTime) -> ComposerResult<Self> {
        let mut source = Self::new();
        source.set_source_harmonics(data)?;
        source.set_source_control(control);
        Ok(source)
    }

    /// Creates a source whose level table is loaded from a text file.
    pub fn from_file(
        path: impl AsRef<Path>,
        control: Option<SourceControlTime>,
    ) -> ComposerResult<Self> {
        let mut source = Self::new();
        source.load_source_harmonics(path)?;
        source.source_control = control;
        Ok(source)
    }

    pub fn source_harmonics(&self) -> Option<&HarmonicsData> {
        self.source_harmonics.as_ref()
    }

    pub fn set_source_harmonics(&mut self, data: HarmonicsData) -> ComposerResult<()> {
        data.validate()?;
        self.source_harmonics = Some(data);
        Ok(())
    }

    /// Loads the level table from an `AnsysSound_Orders` text file, named
    /// after the file.
    pub fn load_source_harmonics(&mut self, path: impl AsRef<Path>) -> ComposerResult<()> {
        let path = path.as_ref();
        let table = io::read_keyed_table(path, HARMONICS_HEADER)?;
        let data = HarmonicsData::from_table(&table)
            .map_err(|e| io::prefix_path(path, e))?
            .with_name(io::file_stem_name(path));
        self.set_source_harmonics(data)
    }

    /// RPM control, if set.
    pub fn source_control(&self) -> Option<&SourceControlTime> {
        self.source_control.as_ref()
    }

    pub fn set_source_control(&mut self, control: SourceControlTime) {
        self.source_control = Some(control);
    }

    /// Returns true if the RPM control and its profile are set.
    pub fn is_source_control_valid(&self) -> bool {
        time_profile(self.source_control.as_ref()).is_some()
    }

    /// Synthesizes the harmonics along the RPM profile.
    pub fn process(
        &mut self,
        session: &dyn Session,
        sampling_frequency: Option<f64>,
    ) -> ComposerResult<()> {
        let sampling_frequency = resolve_sampling_frequency(sampling_frequency)?;
        let rpm = time_profile(self.source_control.as_ref()).ok_or_else(|| {
            ComposerError::missing_input(
                "Harmonics source control is not valid. Use SourceHarmonics::set_source_control().",
            )
        })?;
        let data = self.source_harmonics.as_ref().ok_or_else(|| {
            ComposerError::missing_input(
                "Harmonics source data is not set. Use SourceHarmonics::set_source_harmonics().",
            )
        })?;

        debug!(
            operator = "generate_harmonics",
            sampling_frequency,
            orders = data.orders.len(),
            "rendering harmonics source"
        );
        let signal = session.generate_harmonics(data, rpm, sampling_frequency)?;
        self.output = Output::Processed(signal);
        Ok(())
    }
}

impl Component for SourceHarmonics {
    fn component_name(&self) -> &'static str {
        "SourceHarmonics"
    }

    fn output(&self) -> &Output {
        &self.output
    }

    fn is_configured(&self) -> bool {
        self.source_harmonics.is_some() && self.is_source_control_valid()
    }
}

impl SourcePersistence for SourceHarmonics {
    fn set_from_generic_data_containers(
        &mut self,
        source_data: Option<&GenericDataContainer>,
        source_control_data: Option<&GenericDataContainer>,
    ) -> ComposerResult<()> {
        self.source_harmonics = read_source_data(source_data, HarmonicsData::validate)?;
        self.source_control = read_time_control(source_control_data, CONTROL_PROPERTY)?;
        Ok(())
    }

    fn get_as_generic_data_containers(
        &self,
    ) -> ComposerResult<(Option<GenericDataContainer>, Option<GenericDataContainer>)> {
        let source = write_source_data(self.source_harmonics.as_ref(), "SourceHarmonics")?;
        let control = write_time_controls(
            &[(CONTROL_PROPERTY, self.source_control.as_ref())],
            "SourceHarmonics",
        )?;
        Ok((source, control))
    }
}

impl fmt::Display for SourceHarmonics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Harmonics source: ")?;
        match &self.source_harmonics {
            Some(data) => {
                let (min, max) = data.rpm_axis.range();
                write!(
                    f,
                    "'{}'\n\tNumber of orders: {}\n\t\t{}\n\tControl parameter: {}, {:.1} - {:.1} rpm\n\t\t{}",
                    data.name,
                    data.orders.len(),
                    format_value_list(&data.orders),
                    data.rpm_axis.name,
                    min,
                    max,
                    format_value_list(&data.rpm_axis.values)
                )?;
            }
            None => write!(f, "Not set")?,
        }
        match describe_time_control(self.source_control.as_ref()) {
            Some(control) => write!(f, "\nSource control: {control}"),
            None => write!(f, "\nSource control: Not set/valid"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::ControlProfile;
    use crate::testing::FakeSession;
    use pretty_assertions::assert_eq;

    fn engine() -> HarmonicsData {
        let rpm = ControlAxis::new("RPM", "rpm", vec![1000.0, 3000.0]).unwrap();
        HarmonicsData::new(vec![1.0, 2.0], rpm, vec![vec![0.1, 0.05], vec![0.2, 0.1]])
            .unwrap()
            .with_name("engine")
            .with_unit("Pa")
    }

    fn rpm_ramp() -> SourceControlTime {
        let profile = ControlProfile::new(vec![0.0, 4.0], vec![1000.0, 3000.0])
            .unwrap()
            .with_unit("rpm")
            .with_name("RPM");
        SourceControlTime::from_profile(profile).unwrap()
    }

    #[test]
    fn test_data_validation() {
        let rpm = ControlAxis::new("RPM", "rpm", vec![1000.0]).unwrap();
        assert!(HarmonicsData::new(vec![], rpm.clone(), vec![vec![]]).is_err());
        assert!(HarmonicsData::new(vec![0.0], rpm.clone(), vec![vec![1.0]]).is_err());
        assert!(HarmonicsData::new(vec![1.0], rpm.clone(), vec![vec![1.0, 2.0]]).is_err());
        assert!(HarmonicsData::new(vec![1.0], rpm.clone(), vec![]).is_err());
        assert!(HarmonicsData::new(vec![1.0], rpm, vec![vec![1.0]]).is_ok());
    }

    #[test]
    fn test_process() {
        let session = FakeSession::new();
        let mut source = SourceHarmonics::with_data(engine(), rpm_ramp()).unwrap();
        source.process(&session, Some(1000.0)).unwrap();
        assert_eq!(source.get_output().unwrap().len(), 4000);
    }

    #[test]
    fn test_process_without_data() {
        let session = FakeSession::new();
        let mut source = SourceHarmonics::new();
        source.set_source_control(rpm_ramp());
        assert!(matches!(
            source.process(&session, None),
            Err(ComposerError::MissingInput(_))
        ));
    }

    #[test]
    fn test_display() {
        let source = SourceHarmonics::with_data(engine(), rpm_ramp()).unwrap();
        assert_eq!(
            source.to_string(),
            "Harmonics source: 'engine'\n\tNumber of orders: 2\n\t\t[1.0 2.0]\n\
             \tControl parameter: RPM, 1000.0 - 3000.0 rpm\n\t\t[1000.0 3000.0]\n\
             Source control: RPM\n\tMin: 1000.0\n\tMax: 3000.0\n\tDuration: 4.0 s"
        );
    }

    #[test]
    fn test_generic_data_containers_round_trip() {
        let source = SourceHarmonics::with_data(engine(), rpm_ramp()).unwrap();
        let (data, control) = source.get_as_generic_data_containers().unwrap();
        let mut restored = SourceHarmonics::new();
        restored
            .set_from_generic_data_containers(data.as_ref(), control.as_ref())
            .unwrap();
        assert_eq!(restored, source);
    }
}
