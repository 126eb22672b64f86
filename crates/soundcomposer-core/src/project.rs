//! Sound Composer project files (`.scn`).
//!
//! A project file is a JSON document carrying a format marker, a version and
//! a BLAKE3 hash of its own canonical content:
//!
//! ```text
//! {
//!   "format": "sound-composer-project",
//!   "version": 1,
//!   "sampling_frequency": 44100.0,
//!   "tracks": [ { "name", "gain", "source_type", "source", "source_control", "filter" } ],
//!   "content_hash": "<hex>"
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::composer::SoundComposer;
use crate::container::GenericDataContainer;
use crate::error::{ComposerError, ComposerResult};
use crate::filter::Filter;
use crate::hash::canonical_value_hash;
use crate::source::{SourceKind, SourcePersistence};
use crate::track::Track;

/// Format marker of project files.
pub const PROJECT_FORMAT: &str = "sound-composer-project";
/// Current project file version.
pub const PROJECT_VERSION: u32 = 1;
/// File extension of project files.
pub const PROJECT_EXTENSION: &str = "scn";

const CONTENT_HASH_FIELD: &str = "content_hash";

/// Returns true if `path` has the project file extension.
pub fn is_project_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(PROJECT_EXTENSION))
}

/// Serialized filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterRecord {
    pub b: Vec<f64>,
    pub a: Vec<f64>,
    pub sampling_frequency: f64,
}

/// Serialized track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub gain: f64,
    /// Integer tag of the source kind, `None` if the track has no source.
    #[serde(default)]
    pub source_type: Option<u32>,
    #[serde(default)]
    pub source: Option<GenericDataContainer>,
    #[serde(default)]
    pub source_control: Option<GenericDataContainer>,
    #[serde(default)]
    pub filter: Option<FilterRecord>,
}

/// A project file document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectFile {
    pub format: String,
    pub version: u32,
    pub sampling_frequency: f64,
    #[serde(default)]
    pub tracks: Vec<TrackRecord>,
    /// BLAKE3 hash of the canonical document without this field.
    #[serde(default)]
    pub content_hash: String,
}

impl ProjectFile {
    /// Captures a composer's tracks and sampling frequency.
    pub fn from_composer(composer: &SoundComposer) -> ComposerResult<Self> {
        let tracks = composer
            .tracks
            .iter()
            .map(TrackRecord::from_track)
            .collect::<ComposerResult<Vec<_>>>()?;
        let mut project = Self {
            format: PROJECT_FORMAT.to_string(),
            version: PROJECT_VERSION,
            sampling_frequency: composer.sampling_frequency(),
            tracks,
            content_hash: String::new(),
        };
        project.content_hash = project.compute_hash()?;
        Ok(project)
    }

    /// Rebuilds a composer.
    pub fn into_composer(self) -> ComposerResult<SoundComposer> {
        let mut composer = SoundComposer::with_sampling_frequency(self.sampling_frequency)
            .map_err(|e| structure_error("project", e))?;
        for (index, record) in self.tracks.into_iter().enumerate() {
            let track = record
                .into_track()
                .map_err(|e| structure_error(&format!("track {}", index + 1), e))?;
            composer.add_track(track);
        }
        Ok(composer)
    }

    /// Hash of the document with the `content_hash` field left out.
    pub fn compute_hash(&self) -> ComposerResult<String> {
        let mut value = serde_json::to_value(self)?;
        if let Value::Object(map) = &mut value {
            map.remove(CONTENT_HASH_FIELD);
        }
        Ok(canonical_value_hash(&value))
    }

    /// Serializes the document as pretty-printed JSON.
    pub fn to_json(&self) -> ComposerResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses and checks a document.
    ///
    /// Fails with `InvalidInput` on malformed JSON, a wrong format marker, a
    /// missing or mismatching hash, or a malformed structure, and with
    /// `UnsupportedFormat` on an unknown version.
    pub fn from_json(text: &str) -> ComposerResult<Self> {
        let mut value: Value = serde_json::from_str(text).map_err(|e| {
            ComposerError::invalid_input(format!("project file is not valid JSON: {e}"))
        })?;
        let Some(map) = value.as_object_mut() else {
            return Err(ComposerError::invalid_input(
                "project file must contain a JSON object",
            ));
        };

        match map.get("format").and_then(Value::as_str) {
            Some(PROJECT_FORMAT) => {}
            Some(other) => {
                return Err(ComposerError::invalid_input(format!(
                    "not a Sound Composer project (format '{other}')"
                )))
            }
            None => {
                return Err(ComposerError::invalid_input(
                    "not a Sound Composer project (missing format marker)",
                ))
            }
        }

        match map.get("version").and_then(Value::as_u64) {
            Some(version) if version == u64::from(PROJECT_VERSION) => {}
            Some(version) => {
                return Err(ComposerError::unsupported_format(format!(
                    "unsupported project version {version} (supported: {PROJECT_VERSION})"
                )))
            }
            None => {
                return Err(ComposerError::invalid_input(
                    "project file has no valid version",
                ))
            }
        }

        let Some(Value::String(expected)) = map.remove(CONTENT_HASH_FIELD) else {
            return Err(ComposerError::invalid_input(
                "project file has no content hash",
            ));
        };
        let actual = canonical_value_hash(&value);
        if actual != expected {
            return Err(ComposerError::invalid_input(format!(
                "project content hash mismatch (expected {expected}, computed {actual})"
            )));
        }

        let mut project: ProjectFile = serde_json::from_value(value).map_err(|e| {
            ComposerError::invalid_input(format!("malformed project file: {e}"))
        })?;
        project.content_hash = expected;
        Ok(project)
    }

    /// Writes the document to `path`.
    pub fn save(&self, path: &Path) -> ComposerResult<()> {
        let json = self.to_json()?;
        fs::write(path, json)?;
        info!(
            path = %path.display(),
            tracks = self.tracks.len(),
            "saved sound composer project"
        );
        Ok(())
    }

    /// Reads and checks a document from `path`.
    pub fn load(path: &Path) -> ComposerResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            ComposerError::invalid_input(format!(
                "cannot read project file {}: {e}",
                path.display()
            ))
        })?;
        let project = Self::from_json(&text)?;
        info!(
            path = %path.display(),
            tracks = project.tracks.len(),
            "loaded sound composer project"
        );
        Ok(project)
    }
}

impl TrackRecord {
    fn from_track(track: &Track) -> ComposerResult<Self> {
        let (source_type, source, source_control) = match &track.source {
            Some(source) => {
                let (data, control) = source.get_as_generic_data_containers()?;
                (Some(source.kind().tag()), data, control)
            }
            None => (None, None, None),
        };
        Ok(Self {
            name: track.name.clone(),
            gain: track.gain(),
            source_type,
            source,
            source_control,
            filter: track.filter.as_ref().map(|filter| FilterRecord {
                b: filter.b().to_vec(),
                a: filter.a().to_vec(),
                sampling_frequency: filter.sampling_frequency(),
            }),
        })
    }

    fn into_track(self) -> ComposerResult<Track> {
        let mut track = Track::new().named(self.name).with_gain(self.gain)?;
        match self.source_type {
            Some(tag) => {
                let kind = SourceKind::from_tag(tag)?;
                let mut source = kind.new_source();
                source.set_from_generic_data_containers(
                    self.source.as_ref(),
                    self.source_control.as_ref(),
                )?;
                debug!(source = kind.type_name(), "restored track source");
                track.source = Some(source);
            }
            None if self.source.is_some() || self.source_control.is_some() => {
                return Err(ComposerError::invalid_input(
                    "source data is present but the source type is missing",
                ));
            }
            None => {}
        }
        if let Some(filter) = self.filter {
            track.filter = Some(Filter::with_sampling_frequency(
                filter.b,
                filter.a,
                filter.sampling_frequency,
            )?);
        }
        Ok(track)
    }
}

/// Prefixes an error with its location in the file. Shape errors of stored
/// data are reported as invalid input.
fn structure_error(location: &str, error: ComposerError) -> ComposerError {
    match error {
        ComposerError::InvalidInput(message) | ComposerError::TypeMismatch(message) => {
            ComposerError::invalid_input(format!("{location}: {message}"))
        }
        ComposerError::UnsupportedFormat(message) => {
            ComposerError::unsupported_format(format!("{location}: {message}"))
        }
        other => other,
    }
}
