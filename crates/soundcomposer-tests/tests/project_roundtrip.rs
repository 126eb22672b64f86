//! Saving and loading `.scn` project files.
//!
//! A loaded project must equal the saved one and render the same mix.

use std::fs;
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use soundcomposer_backend_local::LocalSession;
use soundcomposer_core::project::is_project_file;
use soundcomposer_core::{
    Component, ComposerError, Filter, ProjectFile, SoundComposer, Track, PROJECT_EXTENSION,
};
use soundcomposer_tests::{composer_with_tracks, mix_hash, spectrum_source};
use tempfile::TempDir;

fn project_path(dir: &TempDir, name: &str) -> PathBuf {
    dir.path().join(format!("{name}.{PROJECT_EXTENSION}"))
}

fn save_and_load(composer: &SoundComposer, path: &Path) -> SoundComposer {
    composer.save(path).unwrap();
    assert!(is_project_file(path));
    SoundComposer::from_file(path).unwrap()
}

// ============================================================================
// Round Trips
// ============================================================================

#[test]
fn test_roundtrip_track_counts() {
    let dir = TempDir::new().unwrap();
    for count in [0, 1, 4, 7] {
        let composer = composer_with_tracks(count);
        let loaded = save_and_load(&composer, &project_path(&dir, &format!("tracks_{count}")));
        assert_eq!(loaded.tracks.len(), count);
        assert_eq!(loaded, composer);
    }
}

#[test]
fn test_roundtrip_preserves_render() {
    let dir = TempDir::new().unwrap();
    let session = LocalSession::default();
    let mut composer = composer_with_tracks(7);
    let mut loaded = save_and_load(&composer, &project_path(&dir, "render"));

    composer.process(&session, None).unwrap();
    loaded.process(&session, None).unwrap();
    assert_eq!(
        mix_hash(&loaded.get_output_as_vec()),
        mix_hash(&composer.get_output_as_vec())
    );
}

#[test]
fn test_roundtrip_filter_and_empty_track() {
    let dir = TempDir::new().unwrap();
    let mut composer = SoundComposer::with_sampling_frequency(22050.0).unwrap();
    let filter = Filter::with_sampling_frequency(vec![0.2, 0.3], vec![1.0, -0.5], 22050.0).unwrap();
    composer.add_track(
        Track::with_source(spectrum_source(2))
            .named("Filtered")
            .with_filter(filter),
    );
    composer.add_track(Track::new().named("Placeholder").with_gain(-1.5).unwrap());

    let loaded = save_and_load(&composer, &project_path(&dir, "filter"));
    assert_eq!(loaded.sampling_frequency(), 22050.0);
    assert_eq!(loaded, composer);
    assert!(loaded.tracks[1].source.is_none());
    assert_eq!(loaded.tracks[0].filter.as_ref().unwrap().a(), &[1.0, -0.5]);
}

#[test]
fn test_document_hash_is_stable() {
    let composer = composer_with_tracks(4);
    let first = ProjectFile::from_composer(&composer).unwrap();
    let second = ProjectFile::from_composer(&composer).unwrap();
    assert_eq!(first.content_hash, second.content_hash);
    assert_eq!(first.content_hash.len(), 64);

    let reparsed = ProjectFile::from_json(&first.to_json().unwrap()).unwrap();
    assert_eq!(reparsed.compute_hash().unwrap(), first.content_hash);
}

// ============================================================================
// Load Errors
// ============================================================================

#[test]
fn test_tampered_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = project_path(&dir, "tampered");
    composer_with_tracks(1).save(&path).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    fs::write(&path, text.replacen("\"Track 1\"", "\"Track X\"", 1)).unwrap();

    let mut composer = composer_with_tracks(4);
    let before = composer.clone();
    let err = composer.load(&path).unwrap_err();
    assert!(matches!(err, ComposerError::InvalidInput(_)), "{err}");
    assert!(err.to_string().contains("hash"));
    assert_eq!(composer, before);
}

#[test]
fn test_missing_and_foreign_files_are_rejected() {
    let dir = TempDir::new().unwrap();
    let missing = SoundComposer::from_file(project_path(&dir, "absent")).unwrap_err();
    assert!(matches!(missing, ComposerError::InvalidInput(_)));

    let foreign = project_path(&dir, "foreign");
    fs::write(&foreign, r#"{"format": "something-else", "version": 1}"#).unwrap();
    let err = SoundComposer::from_file(&foreign).unwrap_err();
    assert!(matches!(err, ComposerError::InvalidInput(_)));

    let garbage = project_path(&dir, "garbage");
    fs::write(&garbage, "RIFF....WAVE").unwrap();
    assert_eq!(SoundComposer::from_file(&garbage).unwrap_err().code(), "SC_002");
}

#[test]
fn test_future_version_is_unsupported() {
    let dir = TempDir::new().unwrap();
    let path = project_path(&dir, "future");
    composer_with_tracks(1).save(&path).unwrap();
    let text = fs::read_to_string(&path).unwrap();
    fs::write(&path, text.replacen("\"version\": 1", "\"version\": 2", 1)).unwrap();

    let err = SoundComposer::from_file(&path).unwrap_err();
    assert!(matches!(err, ComposerError::UnsupportedFormat(_)), "{err}");
}
