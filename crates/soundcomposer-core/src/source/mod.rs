//! Sound sources.
//!
//! A [`Source`] is a closed union over the six source variants. Each variant
//! owns its static data, its control(s) and its cached output, and renders
//! itself through a [`Session`].

mod audio;
mod broadband_noise;
mod broadband_noise_two_parameters;
mod harmonics;
mod harmonics_two_parameters;
mod spectrum;

pub use audio::SourceAudio;
pub use broadband_noise::{BroadbandNoiseData, SourceBroadbandNoise, SpectrumType, BBN_HEADER};
pub use broadband_noise_two_parameters::{
    BroadbandNoiseTwoParametersData, SourceBroadbandNoiseTwoParameters, BBN_TWO_PARAMETERS_HEADER,
};
pub use harmonics::{HarmonicsData, SourceHarmonics, HARMONICS_HEADER};
pub use harmonics_two_parameters::{
    HarmonicsTwoParametersData, SourceHarmonicsTwoParameters, HARMONICS_TWO_PARAMETERS_HEADER,
};
pub use spectrum::SourceSpectrum;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::container::GenericDataContainer;
use crate::control::{SourceControl, SourceControlTime};
use crate::error::{check_sampling_frequency, ComposerError, ComposerResult};
use crate::output::{Component, Output, PlotData};
use crate::session::Session;
use crate::signal::{ControlProfile, DEFAULT_SAMPLING_FREQUENCY};

/// Container property holding a source's static data.
pub const SOURCE_PROPERTY: &str = "sound_composer_source";
/// Control container property of a spectrum source's duration.
pub const SPECTRUM_DURATION_PROPERTY: &str = "sound_composer_source_control_spectrum_duration";
/// Control container property of a spectrum source's synthesis method.
pub const SPECTRUM_METHOD_PROPERTY: &str = "sound_composer_source_control_spectrum_method";
/// Control container property of a one-parameter source's control.
pub const CONTROL_PROPERTY: &str = "sound_composer_source_control_one_parameter";
/// Control container property of a two-parameter source's first control.
pub const CONTROL_1_PROPERTY: &str = "sound_composer_source_control_two_parameter_1";
/// Control container property of a two-parameter source's second control.
pub const CONTROL_2_PROPERTY: &str = "sound_composer_source_control_two_parameter_2";

/// Kind of a source, with the integer tag used in project files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum SourceKind {
    BroadbandNoise,
    BroadbandNoiseTwoParameters,
    Harmonics,
    HarmonicsTwoParameters,
    Spectrum,
    Audio,
}

impl SourceKind {
    /// All kinds in tag order.
    pub const ALL: [SourceKind; 6] = [
        SourceKind::BroadbandNoise,
        SourceKind::BroadbandNoiseTwoParameters,
        SourceKind::Harmonics,
        SourceKind::HarmonicsTwoParameters,
        SourceKind::Spectrum,
        SourceKind::Audio,
    ];

    /// Integer tag of the kind.
    pub fn tag(self) -> u32 {
        match self {
            SourceKind::BroadbandNoise => 1,
            SourceKind::BroadbandNoiseTwoParameters => 2,
            SourceKind::Harmonics => 3,
            SourceKind::HarmonicsTwoParameters => 4,
            SourceKind::Spectrum => 5,
            SourceKind::Audio => 6,
        }
    }

    /// Parses an integer tag.
    pub fn from_tag(tag: u32) -> ComposerResult<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.tag() == tag)
            .ok_or_else(|| ComposerError::unsupported_format(format!("unknown source type {tag}")))
    }

    /// Type name of the variant.
    pub fn type_name(self) -> &'static str {
        match self {
            SourceKind::BroadbandNoise => "SourceBroadbandNoise",
            SourceKind::BroadbandNoiseTwoParameters => "SourceBroadbandNoiseTwoParameters",
            SourceKind::Harmonics => "SourceHarmonics",
            SourceKind::HarmonicsTwoParameters => "SourceHarmonicsTwoParameters",
            SourceKind::Spectrum => "SourceSpectrum",
            SourceKind::Audio => "SourceAudio",
        }
    }

    /// Number of control slots of the kind.
    pub fn control_count(self) -> usize {
        match self {
            SourceKind::Audio => 0,
            SourceKind::Spectrum | SourceKind::BroadbandNoise | SourceKind::Harmonics => 1,
            SourceKind::BroadbandNoiseTwoParameters | SourceKind::HarmonicsTwoParameters => 2,
        }
    }

    /// Creates an empty source of this kind.
    pub fn new_source(self) -> Source {
        match self {
            SourceKind::BroadbandNoise => SourceBroadbandNoise::new().into(),
            SourceKind::BroadbandNoiseTwoParameters => {
                SourceBroadbandNoiseTwoParameters::new().into()
            }
            SourceKind::Harmonics => SourceHarmonics::new().into(),
            SourceKind::HarmonicsTwoParameters => SourceHarmonicsTwoParameters::new().into(),
            SourceKind::Spectrum => SourceSpectrum::new().into(),
            SourceKind::Audio => SourceAudio::new().into(),
        }
    }
}

impl TryFrom<u32> for SourceKind {
    type Error = ComposerError;

    fn try_from(tag: u32) -> Result<Self, Self::Error> {
        Self::from_tag(tag)
    }
}

impl From<SourceKind> for u32 {
    fn from(kind: SourceKind) -> Self {
        kind.tag()
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Conversion of a source to and from generic data containers.
///
/// The defaults have nothing to convert: they warn and leave everything as is.
pub trait SourcePersistence {
    /// Restores static data and control(s) from containers. A `None`
    /// container leaves the corresponding part unset.
    fn set_from_generic_data_containers(
        &mut self,
        source_data: Option<&GenericDataContainer>,
        source_control_data: Option<&GenericDataContainer>,
    ) -> ComposerResult<()> {
        let _ = (source_data, source_control_data);
        warn!("Cannot set from generic data containers because there is nothing to set here.");
        Ok(())
    }

    /// Exports static data and control(s) as containers. Missing parts warn
    /// and yield `None`.
    fn get_as_generic_data_containers(
        &self,
    ) -> ComposerResult<(Option<GenericDataContainer>, Option<GenericDataContainer>)> {
        warn!("Cannot create generic data containers because there is no data.");
        Ok((None, None))
    }
}

/// A sound source.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Audio(SourceAudio),
    Spectrum(SourceSpectrum),
    BroadbandNoise(SourceBroadbandNoise),
    BroadbandNoiseTwoParameters(SourceBroadbandNoiseTwoParameters),
    Harmonics(SourceHarmonics),
    HarmonicsTwoParameters(SourceHarmonicsTwoParameters),
}

macro_rules! each_source {
    ($source:expr, $inner:ident => $body:expr) => {
        match $source {
            Source::Audio($inner) => $body,
            Source::Spectrum($inner) => $body,
            Source::BroadbandNoise($inner) => $body,
            Source::BroadbandNoiseTwoParameters($inner) => $body,
            Source::Harmonics($inner) => $body,
            Source::HarmonicsTwoParameters($inner) => $body,
        }
    };
}

impl Source {
    /// Kind of the source.
    pub fn kind(&self) -> SourceKind {
        match self {
            Source::Audio(_) => SourceKind::Audio,
            Source::Spectrum(_) => SourceKind::Spectrum,
            Source::BroadbandNoise(_) => SourceKind::BroadbandNoise,
            Source::BroadbandNoiseTwoParameters(_) => SourceKind::BroadbandNoiseTwoParameters,
            Source::Harmonics(_) => SourceKind::Harmonics,
            Source::HarmonicsTwoParameters(_) => SourceKind::HarmonicsTwoParameters,
        }
    }

    /// Renders the source at `sampling_frequency` (44100 Hz if `None`).
    pub fn process(
        &mut self,
        session: &dyn Session,
        sampling_frequency: Option<f64>,
    ) -> ComposerResult<()> {
        each_source!(self, source => source.process(session, sampling_frequency))
    }

    /// Returns true if every control the source needs is set and valid.
    pub fn is_source_control_valid(&self) -> bool {
        each_source!(self, source => source.is_source_control_valid())
    }

    /// Assigns a control to a 1-based slot.
    ///
    /// Fails with `InvalidInput` if the source has no such slot and with
    /// `TypeMismatch` if the control is of the wrong kind for that slot.
    pub fn set_control(&mut self, slot: usize, control: SourceControl) -> ComposerResult<()> {
        let kind = self.kind();
        let no_slot = || {
            ComposerError::invalid_input(format!(
                "{} has no control slot {} (it has {})",
                kind.type_name(),
                slot,
                kind.control_count()
            ))
        };
        if slot == 0 || slot > kind.control_count() {
            return Err(no_slot());
        }
        match self {
            Source::Audio(_) => return Err(no_slot()),
            Source::Spectrum(source) => source.set_source_control(control.into_spectrum()?),
            Source::BroadbandNoise(source) => source.set_source_control(control.into_time()?),
            Source::Harmonics(source) => source.set_source_control(control.into_time()?),
            Source::BroadbandNoiseTwoParameters(source) => {
                let control = control.into_time()?;
                if slot == 1 {
                    source.set_source_control_1(control);
                } else {
                    source.set_source_control_2(control);
                }
            }
            Source::HarmonicsTwoParameters(source) => {
                let control = control.into_time()?;
                if slot == 1 {
                    source.set_source_control_rpm(control);
                } else {
                    source.set_source_control_2(control);
                }
            }
        }
        Ok(())
    }

    /// One-line control range, `None` when no control is set.
    pub fn control_summary(&self) -> Option<String> {
        match self {
            Source::Audio(_) => None,
            Source::Spectrum(source) => source
                .source_control()
                .map(|control| format!("{}, {:?} s", control.method(), control.duration())),
            Source::BroadbandNoise(source) => {
                source.source_control().and_then(SourceControlTime::range_summary)
            }
            Source::Harmonics(source) => {
                source.source_control().and_then(SourceControlTime::range_summary)
            }
            Source::BroadbandNoiseTwoParameters(source) => {
                join_ranges(source.source_control_1(), source.source_control_2())
            }
            Source::HarmonicsTwoParameters(source) => {
                join_ranges(source.source_control_rpm(), source.source_control_2())
            }
        }
    }

    /// Plot series of every time control that is set.
    pub fn plot_control_data(&self) -> Vec<PlotData> {
        let controls: Vec<Option<&SourceControlTime>> = match self {
            Source::Audio(_) | Source::Spectrum(_) => Vec::new(),
            Source::BroadbandNoise(source) => vec![source.source_control()],
            Source::Harmonics(source) => vec![source.source_control()],
            Source::BroadbandNoiseTwoParameters(source) => {
                vec![source.source_control_1(), source.source_control_2()]
            }
            Source::HarmonicsTwoParameters(source) => {
                vec![source.source_control_rpm(), source.source_control_2()]
            }
        };
        controls
            .into_iter()
            .flatten()
            .filter_map(|control| control.plot_data().ok())
            .collect()
    }
}

fn join_ranges(
    control_1: Option<&SourceControlTime>,
    control_2: Option<&SourceControlTime>,
) -> Option<String> {
    let range_1 = control_1.and_then(SourceControlTime::range_summary);
    let range_2 = control_2.and_then(SourceControlTime::range_summary);
    match (range_1, range_2) {
        (None, None) => None,
        (range_1, range_2) => Some(format!(
            "{} / {}",
            range_1.as_deref().unwrap_or("not set"),
            range_2.as_deref().unwrap_or("not set")
        )),
    }
}

impl Component for Source {
    fn component_name(&self) -> &'static str {
        self.kind().type_name()
    }

    fn output(&self) -> &Output {
        each_source!(self, source => source.output())
    }

    fn is_configured(&self) -> bool {
        each_source!(self, source => source.is_configured())
    }
}

impl SourcePersistence for Source {
    fn set_from_generic_data_containers(
        &mut self,
        source_data: Option<&GenericDataContainer>,
        source_control_data: Option<&GenericDataContainer>,
    ) -> ComposerResult<()> {
        each_source!(self, source => {
            source.set_from_generic_data_containers(source_data, source_control_data)
        })
    }

    fn get_as_generic_data_containers(
        &self,
    ) -> ComposerResult<(Option<GenericDataContainer>, Option<GenericDataContainer>)> {
        each_source!(self, source => source.get_as_generic_data_containers())
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        each_source!(self, source => fmt::Display::fmt(source, f))
    }
}

macro_rules! impl_from_variant {
    ($variant:ident, $ty:ty) => {
        impl From<$ty> for Source {
            fn from(source: $ty) -> Self {
                Source::$variant(source)
            }
        }
    };
}

impl_from_variant!(Audio, SourceAudio);
impl_from_variant!(Spectrum, SourceSpectrum);
impl_from_variant!(BroadbandNoise, SourceBroadbandNoise);
impl_from_variant!(BroadbandNoiseTwoParameters, SourceBroadbandNoiseTwoParameters);
impl_from_variant!(Harmonics, SourceHarmonics);
impl_from_variant!(HarmonicsTwoParameters, SourceHarmonicsTwoParameters);

/// Resolves an optional sampling frequency, defaulting to 44100 Hz.
pub(crate) fn resolve_sampling_frequency(sampling_frequency: Option<f64>) -> ComposerResult<f64> {
    let sampling_frequency = sampling_frequency.unwrap_or(DEFAULT_SAMPLING_FREQUENCY);
    check_sampling_frequency(sampling_frequency)?;
    Ok(sampling_frequency)
}

/// Profile of a time control, if both the control and its profile are set.
pub(crate) fn time_profile(control: Option<&SourceControlTime>) -> Option<&ControlProfile> {
    control.and_then(SourceControlTime::control)
}

/// Multi-line summary of a time control for source displays.
pub(crate) fn describe_time_control(control: Option<&SourceControlTime>) -> Option<String> {
    time_profile(control).map(|profile| {
        format!(
            "{}\n\tMin: {:?}\n\tMax: {:?}\n\tDuration: {:?} s",
            profile.name,
            profile.min(),
            profile.max(),
            profile.duration()
        )
    })
}

/// Formats a list of values rounded to 0.1, eliding the middle of long lists.
pub(crate) fn format_value_list(values: &[f64]) -> String {
    let format = |values: &[f64]| {
        values
            .iter()
            .map(|v| format!("{v:.1}"))
            .collect::<Vec<_>>()
            .join(" ")
    };
    if values.len() > 10 {
        format!(
            "[{} ... {}]",
            format(&values[..5]),
            format(&values[values.len() - 5..])
        )
    } else {
        format!("[{}]", format(values))
    }
}

/// Reads an optional time control property from a control container.
pub(crate) fn read_time_control(
    container: Option<&GenericDataContainer>,
    property: &str,
) -> ComposerResult<Option<SourceControlTime>> {
    match container {
        Some(container) if container.has_property(property) => {
            let control: SourceControlTime = container.get_property(property)?;
            if let Some(profile) = control.control() {
                profile.validate()?;
            }
            Ok(Some(control))
        }
        _ => Ok(None),
    }
}

/// Reads the static data property from a source container and validates it.
pub(crate) fn read_source_data<T>(
    container: Option<&GenericDataContainer>,
    validate: impl FnOnce(&T) -> ComposerResult<()>,
) -> ComposerResult<Option<T>>
where
    T: serde::de::DeserializeOwned,
{
    match container {
        Some(container) => {
            let data: T = container.get_property(SOURCE_PROPERTY)?;
            validate(&data)?;
            Ok(Some(data))
        }
        None => Ok(None),
    }
}

/// Wraps static data in a source container, warning when it is missing.
pub(crate) fn write_source_data<T: Serialize>(
    data: Option<&T>,
    type_name: &str,
) -> ComposerResult<Option<GenericDataContainer>> {
    match data {
        Some(data) => {
            let mut container = GenericDataContainer::new();
            container.set_property(SOURCE_PROPERTY, data)?;
            Ok(Some(container))
        }
        None => {
            warn!(
                source = type_name,
                "Cannot create source generic data container because there is no source data."
            );
            Ok(None)
        }
    }
}

/// Wraps time controls in a control container, warning when none is set.
pub(crate) fn write_time_controls(
    controls: &[(&str, Option<&SourceControlTime>)],
    type_name: &str,
) -> ComposerResult<Option<GenericDataContainer>> {
    let mut container = GenericDataContainer::new();
    for (property, control) in controls {
        if let Some(control) = control {
            container.set_property(*property, *control)?;
        }
    }
    if container.is_empty() {
        warn!(
            source = type_name,
            "Cannot create source control generic data container because there is no source control data."
        );
        Ok(None)
    } else {
        Ok(Some(container))
    }
}
