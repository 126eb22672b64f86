//! Accessors before processing, and processing with missing inputs.
//!
//! Reading an unprocessed output never fails: it warns exactly once and
//! returns an empty value. Processing without inputs fails with a typed error.

use soundcomposer_backend_local::LocalSession;
use soundcomposer_core::{
    Component, ComposerError, SoundComposer, Source, SourceAudio, SourceSpectrum, State, Track,
};
use soundcomposer_tests::{all_sources, count_warnings, FIXTURE_SAMPLING_FREQUENCY};

fn components() -> Vec<Box<dyn Component>> {
    let mut components: Vec<Box<dyn Component>> = vec![
        Box::new(SoundComposer::new()),
        Box::new(Track::new()),
        Box::new(SourceAudio::new()),
        Box::new(SourceSpectrum::new()),
    ];
    for source in all_sources() {
        components.push(Box::new(Track::with_source(source.clone())));
        components.push(Box::new(source));
    }
    components
}

// ============================================================================
// Unprocessed Outputs
// ============================================================================

#[test]
fn test_get_output_warns_once_per_call() {
    for component in components() {
        let (output, warnings) = count_warnings(|| component.get_output().is_none());
        assert!(output, "{} has an output", component.component_name());
        assert_eq!(warnings.not_processed, 1);
        assert_eq!(warnings.total, 1);
        assert_eq!(warnings.components, vec![component.component_name().to_string()]);
    }
}

#[test]
fn test_get_output_as_vec_is_empty() {
    for component in components() {
        let (samples, warnings) = count_warnings(|| {
            let first = component.get_output_as_vec();
            let second = component.get_output_as_vec();
            (first, second)
        });
        assert!(samples.0.is_empty() && samples.1.is_empty());
        assert_eq!(warnings.not_processed, 2);
    }
}

#[test]
fn test_plot_data_reports_not_processed() {
    for component in components() {
        let (result, warnings) = count_warnings(|| component.plot_data());
        assert!(matches!(result, Err(ComposerError::NotProcessed(_))));
        assert_eq!(warnings.total, 0);
    }
}

#[test]
fn test_processed_output_does_not_warn() {
    let session = LocalSession::default();
    for source in all_sources() {
        let mut track = Track::with_source(source);
        track
            .process(&session, Some(FIXTURE_SAMPLING_FREQUENCY))
            .unwrap();
        let (samples, warnings) = count_warnings(|| track.get_output_as_vec());
        assert!(!samples.is_empty());
        assert_eq!(warnings.total, 0);
    }
}

// ============================================================================
// Missing Inputs
// ============================================================================

#[test]
fn test_track_without_source() {
    let session = LocalSession::default();
    let mut track = Track::new();
    let err = track.process(&session, None).unwrap_err();
    assert!(matches!(err, ComposerError::MissingInput(_)), "{err}");
    assert_eq!(track.state(), State::Unconfigured);

    let err = track.process(&session, Some(0.0)).unwrap_err();
    assert!(matches!(err, ComposerError::InvalidInput(_)), "{err}");
}

#[test]
fn test_invalid_rates_are_rejected() {
    let session = LocalSession::default();
    for source in all_sources() {
        let mut track = Track::with_source(source);
        for rate in [0.0, -8000.0, f64::NAN, f64::INFINITY] {
            let err = track.process(&session, Some(rate)).unwrap_err();
            assert!(matches!(err, ComposerError::InvalidInput(_)), "{err}");
        }
        assert_eq!(track.state(), State::Configured);
    }
}

#[test]
fn test_sources_without_inputs() {
    let session = LocalSession::default();
    for source in all_sources() {
        let mut empty = source.kind().new_source();
        assert!(!empty.is_configured());
        let err = empty.process(&session, Some(FIXTURE_SAMPLING_FREQUENCY)).unwrap_err();
        assert!(matches!(err, ComposerError::MissingInput(_)), "{}: {err}", source.kind());
        assert!(matches!(empty, Source::Audio(_)) || !empty.is_source_control_valid());
    }
}

#[test]
fn test_composer_with_unconfigured_track() {
    let mut composer = SoundComposer::new();
    composer.add_track(Track::new().named("Empty"));
    let err = composer.process(&LocalSession::default(), None).unwrap_err();
    assert!(matches!(err, ComposerError::MissingInput(_)));
    assert_eq!(composer.state(), State::Unconfigured);
}
