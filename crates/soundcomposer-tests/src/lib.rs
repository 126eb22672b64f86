//! Sound Composer End-to-End Test Infrastructure
//!
//! This crate holds the cross-crate tests of the composition model rendered
//! through the local backend:
//!
//! - **Properties**: idempotence, gain linearity, track-order commutativity
//! - **Persistence**: project files round-trip for every source variant
//! - **Contracts**: unprocessed outputs warn exactly once, missing inputs fail
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p soundcomposer-tests
//! ```
//!
//! ## Counting Warnings
//!
//! ```rust,ignore
//! use soundcomposer_tests::warnings::count_warnings;
//!
//! let (_, counts) = count_warnings(|| track.get_output_as_vec());
//! assert_eq!(counts.not_processed, 1);
//! ```

pub mod fixtures;
pub mod warnings;

// Re-export commonly used items
pub use fixtures::{
    all_sources, audio_source, broadband_noise_source, broadband_noise_two_parameters_source,
    composer_with_tracks, harmonics_source, harmonics_two_parameters_source, mix_hash,
    spectrum_source, FIXTURE_SAMPLING_FREQUENCY,
};
pub use warnings::{count_warnings, WarningCount};
