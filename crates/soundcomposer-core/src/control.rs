//! Source controls: time profiles and spectrum synthesis parameters.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ComposerError, ComposerResult};
use crate::io;
use crate::output::PlotData;
use crate::signal::ControlProfile;

/// Description given to profiles loaded from WAV files.
pub const WAVE_PROFILE_DESCRIPTION: &str = "Profile created in PyAnsys Sound.";

/// A control profile over time (e.g. RPM versus time).
///
/// A control with no profile is "not set" and invalidates any source that
/// requires it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceControlTime {
    control: Option<ControlProfile>,
    /// Free-text description of where the profile came from.
    #[serde(default)]
    pub description: String,
}

impl SourceControlTime {
    /// Creates a control with no profile.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a control holding `profile`.
    pub fn from_profile(profile: ControlProfile) -> ComposerResult<Self> {
        let mut control = Self::new();
        control.set_control(profile)?;
        Ok(control)
    }

    /// Creates a control from a file, dispatching on the extension: `.wav`
    /// files are read as WAV, anything else as a two-column text table.
    pub fn from_file(path: impl AsRef<Path>) -> ComposerResult<Self> {
        let path = path.as_ref();
        let mut control = Self::new();
        if io::is_wave_file(path) {
            control.load_from_wave_file(path)?;
        } else {
            control.load_from_text_file(path)?;
        }
        Ok(control)
    }

    /// The control profile, if set.
    pub fn control(&self) -> Option<&ControlProfile> {
        self.control.as_ref()
    }

    /// Sets the control profile after validating it.
    pub fn set_control(&mut self, profile: ControlProfile) -> ComposerResult<()> {
        profile.validate()?;
        self.control = Some(profile);
        Ok(())
    }

    /// Removes the control profile.
    pub fn clear_control(&mut self) {
        self.control = None;
    }

    /// Returns true if a profile is set.
    pub fn is_set(&self) -> bool {
        self.control.is_some()
    }

    /// Loads the profile from the first channel of a WAV file.
    pub fn load_from_wave_file(&mut self, path: impl AsRef<Path>) -> ComposerResult<()> {
        let signal = io::read_wav(path.as_ref())?;
        let profile = ControlProfile::from_samples(signal.samples, signal.sampling_frequency)?
            .with_unit(signal.unit)
            .with_name(signal.name);
        self.set_control(profile)?;
        self.description = WAVE_PROFILE_DESCRIPTION.to_string();
        Ok(())
    }

    /// Loads the profile from a two-column (time, value) text file.
    ///
    /// The unit and the description are cleared.
    pub fn load_from_text_file(&mut self, path: impl AsRef<Path>) -> ComposerResult<()> {
        let path = path.as_ref();
        let (times, values) = io::read_two_column_text(path)?;
        let name = io::file_stem_name(path);
        let profile = ControlProfile::new(times, values)?.with_name(name);
        self.set_control(profile)?;
        self.description.clear();
        Ok(())
    }

    /// Plot series of the control profile.
    pub fn plot_data(&self) -> ComposerResult<PlotData> {
        let profile = self
            .control
            .as_ref()
            .ok_or_else(|| ComposerError::missing_input("Control profile is not set."))?;
        let title = if profile.name.is_empty() {
            "Control profile".to_string()
        } else {
            profile.name.clone()
        };
        let y_label = if profile.unit.is_empty() {
            "Control parameter".to_string()
        } else {
            format!("Control parameter ({})", profile.unit)
        };
        Ok(PlotData {
            title,
            x_label: "Time (s)".to_string(),
            y_label,
            x: profile.times.clone(),
            y: profile.values.clone(),
        })
    }

    /// One-line range summary used in composer listings.
    pub(crate) fn range_summary(&self) -> Option<String> {
        self.control.as_ref().map(|profile| {
            let unit = if profile.unit.is_empty() {
                String::new()
            } else {
                format!(" {}", profile.unit)
            };
            format!("{:.1}-{:.1}{}", profile.min(), profile.max(), unit)
        })
    }
}

impl fmt::Display for SourceControlTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.control {
            None => write!(f, "Not set"),
            Some(profile) => write!(
                f,
                "Unit: {unit}\nDuration: {duration:.1} s\nMin - max: {min:.1} - {max:.1} {unit}",
                unit = profile.unit,
                duration = profile.duration(),
                min = profile.min(),
                max = profile.max(),
            ),
        }
    }
}

/// Spectrum synthesis method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum SynthesisMethod {
    /// Inverse FFT with random phases.
    #[default]
    Ifft,
    /// Sine tones for spectral peaks, inverse FFT for the rest.
    Hybrid,
}

impl SynthesisMethod {
    /// Integer code of the method.
    pub fn code(self) -> u32 {
        match self {
            SynthesisMethod::Ifft => 1,
            SynthesisMethod::Hybrid => 2,
        }
    }

    /// Parses an integer code.
    pub fn from_code(code: u32) -> ComposerResult<Self> {
        match code {
            1 => Ok(SynthesisMethod::Ifft),
            2 => Ok(SynthesisMethod::Hybrid),
            other => Err(ComposerError::invalid_input(format!(
                "unknown synthesis method {other}. Available options are:\n1: IFFT\n2: Hybrid"
            ))),
        }
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            SynthesisMethod::Ifft => "IFFT",
            SynthesisMethod::Hybrid => "Hybrid",
        }
    }
}

impl TryFrom<u32> for SynthesisMethod {
    type Error = ComposerError;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        Self::from_code(code)
    }
}

impl From<SynthesisMethod> for u32 {
    fn from(method: SynthesisMethod) -> Self {
        method.code()
    }
}

impl fmt::Display for SynthesisMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Duration and synthesis method of a spectrum source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceControlSpectrum {
    duration: f64,
    method: SynthesisMethod,
}

impl SourceControlSpectrum {
    /// Creates a spectrum control from a duration in seconds and a method code.
    pub fn new(duration: f64, method: u32) -> ComposerResult<Self> {
        let mut control = Self::default();
        control.set_duration(duration)?;
        control.set_method(SynthesisMethod::from_code(method)?);
        Ok(control)
    }

    /// Duration of the generated sound, in seconds.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Sets the duration. Must be non-negative.
    pub fn set_duration(&mut self, duration: f64) -> ComposerResult<()> {
        if !duration.is_finite() || duration < 0.0 {
            return Err(ComposerError::invalid_input(format!(
                "Duration must be positive (got {duration})."
            )));
        }
        self.duration = duration;
        Ok(())
    }

    /// Synthesis method.
    pub fn method(&self) -> SynthesisMethod {
        self.method
    }

    /// Sets the synthesis method.
    pub fn set_method(&mut self, method: SynthesisMethod) {
        self.method = method;
    }
}

impl fmt::Display for SourceControlSpectrum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Duration: {:?} s\nMethod: {}",
            self.duration, self.method
        )
    }
}

/// A control assigned dynamically to a source.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceControl {
    Time(SourceControlTime),
    Spectrum(SourceControlSpectrum),
}

impl SourceControl {
    /// Kind name used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            SourceControl::Time(_) => "SourceControlTime",
            SourceControl::Spectrum(_) => "SourceControlSpectrum",
        }
    }

    pub(crate) fn into_time(self) -> ComposerResult<SourceControlTime> {
        match self {
            SourceControl::Time(control) => Ok(control),
            other => Err(ComposerError::type_mismatch(format!(
                "expected a SourceControlTime, got a {}",
                other.kind_name()
            ))),
        }
    }

    pub(crate) fn into_spectrum(self) -> ComposerResult<SourceControlSpectrum> {
        match self {
            SourceControl::Spectrum(control) => Ok(control),
            other => Err(ComposerError::type_mismatch(format!(
                "expected a SourceControlSpectrum, got a {}",
                other.kind_name()
            ))),
        }
    }
}

impl From<SourceControlTime> for SourceControl {
    fn from(control: SourceControlTime) -> Self {
        SourceControl::Time(control)
    }
}

impl From<SourceControlSpectrum> for SourceControl {
    fn from(control: SourceControlSpectrum) -> Self {
        SourceControl::Spectrum(control)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_time_control_display() {
        assert_eq!(SourceControlTime::new().to_string(), "Not set");

        let profile = ControlProfile::ramp(250.0, 5000.0, 8.0, 10.0)
            .unwrap()
            .with_unit("rpm");
        let control = SourceControlTime::from_profile(profile).unwrap();
        assert_eq!(
            control.to_string(),
            "Unit: rpm\nDuration: 8.0 s\nMin - max: 250.0 - 5000.0 rpm"
        );
    }

    #[test]
    fn test_time_control_load_text_clears_unit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rpm.txt");
        std::fs::write(&path, "AnsysSound_SoundSamples\n0 1000\n1 2000\n").unwrap();

        let control = SourceControlTime::from_file(&path).unwrap();
        let profile = control.control().unwrap();
        assert_eq!(profile.unit, "");
        assert_eq!(profile.values, vec![1000.0, 2000.0]);
        assert!(control.description.is_empty());
    }

    #[test]
    fn test_time_control_load_wave_sets_description() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rpm.wav");
        let signal = crate::Signal::new(vec![0.0, 0.5, 1.0], 2.0).unwrap();
        io::write_wav(&path, &signal).unwrap();

        let control = SourceControlTime::from_file(&path).unwrap();
        assert_eq!(control.description, WAVE_PROFILE_DESCRIPTION);
        assert_eq!(control.control().unwrap().times, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_time_control_load_failure_is_invalid_input() {
        let mut control = SourceControlTime::new();
        let err = control
            .load_from_wave_file("/nonexistent/profile.wav")
            .unwrap_err();
        assert!(matches!(err, ComposerError::InvalidInput(_)));
        assert!(!control.is_set());
    }

    #[test]
    fn test_time_control_plot_requires_profile() {
        let control = SourceControlTime::new();
        assert!(matches!(
            control.plot_data(),
            Err(ComposerError::MissingInput(_))
        ));
    }

    #[test]
    fn test_spectrum_control_validation() {
        assert!(SourceControlSpectrum::new(-1.0, 1).is_err());
        assert!(SourceControlSpectrum::new(f64::NAN, 1).is_err());
        assert!(matches!(
            SourceControlSpectrum::new(1.0, 3),
            Err(ComposerError::InvalidInput(_))
        ));
        assert!(matches!(
            SourceControlSpectrum::new(1.0, 0),
            Err(ComposerError::InvalidInput(_))
        ));
        let control = SourceControlSpectrum::new(0.0, 2).unwrap();
        assert_eq!(control.method(), SynthesisMethod::Hybrid);
    }

    #[test]
    fn test_spectrum_control_display() {
        let control = SourceControlSpectrum::new(3.0, 1).unwrap();
        assert_eq!(control.to_string(), "Duration: 3.0 s\nMethod: IFFT");
    }

    #[test]
    fn test_spectrum_control_serializes_method_code() {
        let control = SourceControlSpectrum::new(2.5, 2).unwrap();
        let json = serde_json::to_value(control).unwrap();
        assert_eq!(json, serde_json::json!({"duration": 2.5, "method": 2}));

        let bad = serde_json::json!({"duration": 2.5, "method": 7});
        assert!(serde_json::from_value::<SourceControlSpectrum>(bad).is_err());
    }

    #[test]
    fn test_source_control_kind_checks() {
        let control: SourceControl = SourceControlSpectrum::default().into();
        assert!(matches!(
            control.clone().into_time(),
            Err(ComposerError::TypeMismatch(_))
        ));
        assert!(control.into_spectrum().is_ok());
    }
}
