//! Sound Composer composition model
//!
//! This crate composes a sound from independently parameterized sources. A
//! [`SoundComposer`] holds an ordered list of [`Track`]s; each track plays one
//! [`Source`] through an optional [`Filter`] and a gain. Rendering goes
//! through a [`Session`], the handle on an operator runtime that performs
//! every numerically significant transform.
//!
//! # Example
//!
//! ```no_run
//! use soundcomposer_core::{
//!     Component, SoundComposer, SourceControlSpectrum, SourceSpectrum, Spectrum, Track,
//! };
//! # fn run(session: &dyn soundcomposer_core::Session) -> soundcomposer_core::ComposerResult<()> {
//! let psd = Spectrum::new(vec![0.0, 1000.0, 2000.0], vec![1e-4, 1e-3, 1e-4])?;
//! let control = SourceControlSpectrum::new(3.0, 1)?;
//! let source = SourceSpectrum::with_data(psd, control)?;
//!
//! let mut composer = SoundComposer::new();
//! composer.add_track(Track::with_source(source).named("hiss").with_gain(3.0)?);
//! composer.process(session, None)?;
//! let samples = composer.get_output_as_vec();
//! composer.save("hiss.scn")?;
//! # let _ = samples;
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`signal`]: signals, control profiles, spectra and control axes
//! - [`control`]: source controls (time profiles and spectrum descriptors)
//! - [`source`]: the six source variants
//! - [`filter`]: IIR/FIR filters
//! - [`track`]: tracks
//! - [`composer`]: the sound composer
//! - [`project`]: `.scn` project files
//! - [`session`]: the operator runtime contract
//! - [`hash`]: canonical JSON hashing

pub mod composer;
pub mod container;
pub mod control;
pub mod error;
pub mod filter;
pub mod hash;
pub mod io;
pub mod output;
pub mod project;
pub mod session;
pub mod signal;
pub mod source;
pub mod track;

#[cfg(test)]
mod testing;

// Re-export commonly used types at the crate root
pub use composer::SoundComposer;
pub use container::GenericDataContainer;
pub use control::{SourceControl, SourceControlSpectrum, SourceControlTime, SynthesisMethod};
pub use error::{ComposerError, ComposerResult, OperatorError, OperatorResult};
pub use filter::Filter;
pub use output::{Component, Output, PlotData, State};
pub use project::{ProjectFile, PROJECT_EXTENSION, PROJECT_FORMAT, PROJECT_VERSION};
pub use session::Session;
pub use signal::{ControlAxis, ControlProfile, Signal, Spectrum, DEFAULT_SAMPLING_FREQUENCY};
pub use source::{
    BroadbandNoiseData, BroadbandNoiseTwoParametersData, HarmonicsData,
    HarmonicsTwoParametersData, Source, SourceAudio, SourceBroadbandNoise,
    SourceBroadbandNoiseTwoParameters, SourceHarmonics, SourceHarmonicsTwoParameters, SourceKind,
    SourcePersistence, SourceSpectrum, SpectrumType,
};
pub use track::{db_to_linear, Track};
