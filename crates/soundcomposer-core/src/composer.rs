//! The sound composer: an ordered list of tracks mixed into one signal.

use std::fmt;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::{check_sampling_frequency, ComposerResult};
use crate::output::{Component, Output};
use crate::project::ProjectFile;
use crate::session::Session;
use crate::signal::{Signal, DEFAULT_SAMPLING_FREQUENCY};
use crate::track::Track;

/// A composition of tracks rendered at a common sampling frequency.
#[derive(Debug, Clone, PartialEq)]
pub struct SoundComposer {
    /// Tracks in display order.
    pub tracks: Vec<Track>,
    sampling_frequency: f64,
    output: Output,
}

impl Default for SoundComposer {
    fn default() -> Self {
        Self {
            tracks: Vec::new(),
            sampling_frequency: DEFAULT_SAMPLING_FREQUENCY,
            output: Output::NotProcessed,
        }
    }
}

impl SoundComposer {
    /// Creates an empty project at 44100 Hz.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty project at `sampling_frequency`.
    pub fn with_sampling_frequency(sampling_frequency: f64) -> ComposerResult<Self> {
        let mut composer = Self::new();
        composer.set_sampling_frequency(sampling_frequency)?;
        Ok(composer)
    }

    /// Loads a project from a `.scn` file.
    pub fn from_file(path: impl AsRef<Path>) -> ComposerResult<Self> {
        let mut composer = Self::new();
        composer.load(path)?;
        Ok(composer)
    }

    /// Appends a track.
    pub fn add_track(&mut self, track: Track) {
        self.tracks.push(track);
    }

    /// Project sampling frequency in Hz.
    pub fn sampling_frequency(&self) -> f64 {
        self.sampling_frequency
    }

    /// Sets the project sampling frequency. Must be finite and positive.
    pub fn set_sampling_frequency(&mut self, sampling_frequency: f64) -> ComposerResult<()> {
        check_sampling_frequency(sampling_frequency)?;
        self.sampling_frequency = sampling_frequency;
        Ok(())
    }

    /// Renders every track at `sampling_frequency` (the project rate if
    /// `None`) and sums them.
    ///
    /// Shorter tracks are zero-padded to the longest one. The first failing
    /// track aborts the call; the previous output of the composer and of
    /// every track is kept.
    pub fn process(
        &mut self,
        session: &dyn Session,
        sampling_frequency: Option<f64>,
    ) -> ComposerResult<()> {
        let sampling_frequency = sampling_frequency.unwrap_or(self.sampling_frequency);
        check_sampling_frequency(sampling_frequency)?;

        if self.tracks.is_empty() {
            warn!("There are no tracks to process. Use SoundComposer::add_track().");
            self.output = Output::Processed(Signal::empty(sampling_frequency)?);
            return Ok(());
        }

        // Tracks render into copies; nothing is committed unless all succeed.
        let mut tracks = self.tracks.clone();
        for (index, track) in tracks.iter_mut().enumerate() {
            debug!(track = index + 1, name = %track.name, "processing track");
            track.process(session, Some(sampling_frequency))?;
        }

        let rendered: Vec<&Signal> = tracks
            .iter()
            .filter_map(|track| track.output().signal())
            .collect();
        let max_len = rendered.iter().map(|signal| signal.len()).max().unwrap_or(0);
        let mut mix = vec![0.0; max_len];
        for signal in &rendered {
            for (sum, sample) in mix.iter_mut().zip(&signal.samples) {
                *sum += sample;
            }
        }

        info!(
            tracks = tracks.len(),
            samples = max_len,
            sampling_frequency,
            "sound composer processed"
        );
        let output = Signal::new(mix, sampling_frequency)?.with_name("Sound Composer");
        self.tracks = tracks;
        self.output = Output::Processed(output);
        Ok(())
    }

    /// Saves the project to a `.scn` file.
    pub fn save(&self, path: impl AsRef<Path>) -> ComposerResult<()> {
        ProjectFile::from_composer(self)?.save(path.as_ref())
    }

    /// Replaces the project with the content of a `.scn` file.
    ///
    /// On error the project is left unchanged.
    pub fn load(&mut self, path: impl AsRef<Path>) -> ComposerResult<()> {
        let loaded = ProjectFile::load(path.as_ref())?.into_composer()?;
        *self = loaded;
        Ok(())
    }
}

impl Component for SoundComposer {
    fn component_name(&self) -> &'static str {
        "SoundComposer"
    }

    fn output(&self) -> &Output {
        &self.output
    }

    fn is_configured(&self) -> bool {
        self.tracks.iter().all(Component::is_configured)
    }
}

impl fmt::Display for SoundComposer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Sound Composer object ({} track(s), sampling frequency: {:?} Hz)",
            self.tracks.len(),
            self.sampling_frequency
        )?;
        for (index, track) in self.tracks.iter().enumerate() {
            let source = track
                .source
                .as_ref()
                .map_or("Source not set", |source| source.kind().type_name());
            let name = if track.name.is_empty() {
                "Unnamed"
            } else {
                track.name.as_str()
            };
            write!(
                f,
                "\n\tTrack {}: {}, {}, gain = {:+.1} dB",
                index + 1,
                source,
                name,
                track.gain()
            )?;
            if let Some(summary) = track.source.as_ref().and_then(|s| s.control_summary()) {
                write!(f, ", control: {summary}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::{SourceControlSpectrum, SourceControlTime};
    use crate::error::ComposerError;
    use crate::signal::{ControlProfile, Spectrum};
    use crate::source::{SourceAudio, SourceHarmonics, SourceSpectrum};
    use crate::testing::{count_warnings, FakeSession};
    use crate::State;
    use pretty_assertions::assert_eq;

    fn spectrum_track(duration: f64) -> Track {
        let spectrum = Spectrum::new(vec![0.0, 1000.0], vec![1e-3, 1e-3]).unwrap();
        let source =
            SourceSpectrum::with_data(spectrum, SourceControlSpectrum::new(duration, 1).unwrap())
                .unwrap();
        Track::with_source(source)
    }

    #[test]
    fn test_mix_zero_pads_shorter_tracks() {
        let session = FakeSession::new();
        let mut composer = SoundComposer::with_sampling_frequency(1000.0).unwrap();
        composer.add_track(spectrum_track(0.01));
        composer.add_track(spectrum_track(0.02));
        composer.process(&session, None).unwrap();

        let short = composer.tracks[0].get_output_as_vec();
        let long = composer.tracks[1].get_output_as_vec();
        let mix = composer.get_output_as_vec();
        assert_eq!(mix.len(), 20);
        for i in 0..20 {
            let expected = long[i] + short.get(i).copied().unwrap_or(0.0);
            assert!((mix[i] - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_explicit_rate_overrides_project_rate() {
        let session = FakeSession::new();
        let mut composer = SoundComposer::new();
        composer.add_track(spectrum_track(0.1));
        composer.process(&session, Some(500.0)).unwrap();
        let output = composer.get_output().unwrap();
        assert_eq!(output.len(), 50);
        assert_eq!(output.sampling_frequency, 500.0);
        assert_eq!(composer.sampling_frequency(), 44100.0);
    }

    #[test]
    fn test_empty_project_warns_and_yields_empty_signal() {
        let session = FakeSession::new();
        let mut composer = SoundComposer::new();
        let (result, warnings) = count_warnings(|| composer.process(&session, None));
        result.unwrap();
        assert_eq!(warnings.total, 1);
        assert_eq!(warnings.not_processed, 0);
        assert!(composer.get_output().unwrap().is_empty());
        assert_eq!(composer.state(), State::Processed);
    }

    #[test]
    fn test_invalid_rate() {
        let session = FakeSession::new();
        let mut composer = SoundComposer::new();
        assert!(matches!(
            composer.process(&session, Some(-1.0)),
            Err(ComposerError::InvalidInput(_))
        ));
        assert!(SoundComposer::with_sampling_frequency(0.0).is_err());
    }

    #[test]
    fn test_failing_track_keeps_previous_output() {
        let session = FakeSession::new();
        let mut composer = SoundComposer::with_sampling_frequency(1000.0).unwrap();
        composer.add_track(spectrum_track(0.01));
        composer.process(&session, None).unwrap();
        let before = composer.get_output_as_vec();

        composer.add_track(Track::new());
        let err = composer.process(&session, None).unwrap_err();
        assert!(matches!(err, ComposerError::MissingInput(_)));
        assert_eq!(composer.get_output_as_vec(), before);
    }

    #[test]
    fn test_failing_track_keeps_other_track_outputs() {
        let session = FakeSession::new();
        let mut composer = SoundComposer::with_sampling_frequency(8000.0).unwrap();
        composer.add_track(spectrum_track(0.01));
        composer.process(&session, None).unwrap();
        let track_before = composer.tracks[0].clone();
        let mix_before = composer.get_output().unwrap().clone();

        composer.add_track(Track::new());
        let err = composer.process(&session, Some(16000.0)).unwrap_err();
        assert!(matches!(err, ComposerError::MissingInput(_)));
        assert_eq!(composer.tracks[0], track_before);
        assert_eq!(
            composer.tracks[0].get_output().unwrap().sampling_frequency,
            8000.0
        );
        assert_eq!(composer.get_output().unwrap(), &mix_before);
        assert_eq!(composer.tracks[1].state(), State::Unconfigured);
    }

    #[test]
    fn test_operator_error_propagates() {
        let mut composer = SoundComposer::with_sampling_frequency(1000.0).unwrap();
        composer.add_track(spectrum_track(0.01));
        let err = composer
            .process(&FakeSession::failing(), None)
            .unwrap_err();
        let ComposerError::Operator(err) = err else {
            panic!("expected an operator error, got {err:?}");
        };
        assert_eq!(err.operator, "generate_spectrum");
        assert_eq!(composer.state(), State::Configured);
    }

    #[test]
    fn test_display() {
        let mut composer = SoundComposer::new();
        assert_eq!(
            composer.to_string(),
            "Sound Composer object (0 track(s), sampling frequency: 44100.0 Hz)"
        );

        composer.add_track(spectrum_track(3.0).named("hiss").with_gain(3.0).unwrap());
        let profile = ControlProfile::new(vec![0.0, 8.0], vec![250.0, 5000.0])
            .unwrap()
            .with_unit("rpm");
        let mut harmonics = SourceHarmonics::new();
        harmonics.set_source_control(SourceControlTime::from_profile(profile).unwrap());
        composer.add_track(Track::with_source(harmonics).with_gain(-6.0).unwrap());
        composer.add_track(Track::with_source(SourceAudio::new()).named("clip"));
        composer.add_track(Track::new());

        assert_eq!(
            composer.to_string(),
            "Sound Composer object (4 track(s), sampling frequency: 44100.0 Hz)\n\
             \tTrack 1: SourceSpectrum, hiss, gain = +3.0 dB, control: IFFT, 3.0 s\n\
             \tTrack 2: SourceHarmonics, Unnamed, gain = -6.0 dB, control: 250.0-5000.0 rpm\n\
             \tTrack 3: SourceAudio, clip, gain = +0.0 dB\n\
             \tTrack 4: Source not set, Unnamed, gain = +0.0 dB"
        );
    }

    #[test]
    fn test_unprocessed_composer_warns() {
        let composer = SoundComposer::new();
        let (samples, warnings) = count_warnings(|| composer.get_output_as_vec());
        assert!(samples.is_empty());
        assert_eq!(warnings.not_processed, 1);
    }
}
