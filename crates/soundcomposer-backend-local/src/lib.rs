//! Sound Composer Local Backend
//!
//! A deterministic, in-process operator runtime implementing the
//! [`soundcomposer_core::Session`] contract.
//!
//! # Determinism
//!
//! All synthesis is deterministic. The crate uses PCG32 for all random number
//! generation, seeded via BLAKE3 from the configured seed, the operator name
//! and the operator's inputs. Identical calls yield bit-identical signals on
//! the same platform, whatever was rendered before.
//!
//! # Example
//!
//! ```
//! use soundcomposer_backend_local::LocalSession;
//! use soundcomposer_core::{Component, SourceControlSpectrum, SourceSpectrum, Spectrum, Track};
//!
//! let session = LocalSession::default();
//! let psd = Spectrum::new(vec![0.0, 4000.0], vec![1e-4, 1e-4]).unwrap();
//! let source = SourceSpectrum::with_data(psd, SourceControlSpectrum::new(0.5, 1).unwrap()).unwrap();
//! let mut track = Track::with_source(source);
//! track.process(&session, Some(8000.0)).unwrap();
//! assert_eq!(track.get_output().unwrap().len(), 4000);
//! ```
//!
//! # Crate Structure
//!
//! - [`session`] - [`LocalSession`], the `Session` implementation
//! - [`config`] - Rendering configuration
//! - [`synthesis`] - Spectrum, broadband noise and harmonics synthesis
//! - [`spectral`] - Random-phase IFFT and minimum-phase FIR design
//! - [`filter`] - Difference-equation filter
//! - [`resample`] - Linear-interpolation resampling
//! - [`interp`] - Interpolation over tabulated data
//! - [`rng`] - Deterministic RNG with seed derivation

pub mod config;
pub mod error;
pub mod filter;
pub mod interp;
pub mod resample;
pub mod rng;
pub mod session;
pub mod spectral;
pub mod synthesis;

// Re-export main types at crate root
pub use config::{LocalConfig, LocalConfigBuilder};
pub use error::{LocalError, LocalResult};
pub use session::LocalSession;
