//! Contract between the composition model and the operator runtime.

use crate::control::SourceControlSpectrum;
use crate::error::OperatorResult;
use crate::signal::{ControlProfile, Signal, Spectrum};
use crate::source::{
    BroadbandNoiseData, BroadbandNoiseTwoParametersData, HarmonicsData,
    HarmonicsTwoParametersData,
};

/// Handle on an operator runtime.
///
/// Every numerically significant transform of the composer goes through this
/// trait. Calls are blocking; implementations must not keep per-call state
/// that would make a result depend on call order.
pub trait Session {
    /// Synthesizes `round(sampling_frequency * duration)` samples of sound
    /// whose power spectral density follows `spectrum`.
    fn generate_spectrum(
        &self,
        spectrum: &Spectrum,
        control: &SourceControlSpectrum,
        sampling_frequency: f64,
    ) -> OperatorResult<Signal>;

    /// Synthesizes broadband noise whose spectrum follows `data` at the value
    /// of `control` at each instant.
    fn generate_broadband_noise(
        &self,
        data: &BroadbandNoiseData,
        control: &ControlProfile,
        sampling_frequency: f64,
    ) -> OperatorResult<Signal>;

    /// Two-parameter variant of [`Session::generate_broadband_noise`].
    fn generate_broadband_noise_two_parameters(
        &self,
        data: &BroadbandNoiseTwoParametersData,
        control_1: &ControlProfile,
        control_2: &ControlProfile,
        sampling_frequency: f64,
    ) -> OperatorResult<Signal>;

    /// Synthesizes harmonics of the `rpm` profile with levels from `data`.
    fn generate_harmonics(
        &self,
        data: &HarmonicsData,
        rpm: &ControlProfile,
        sampling_frequency: f64,
    ) -> OperatorResult<Signal>;

    /// Two-parameter variant of [`Session::generate_harmonics`].
    fn generate_harmonics_two_parameters(
        &self,
        data: &HarmonicsTwoParametersData,
        rpm: &ControlProfile,
        control_2: &ControlProfile,
        sampling_frequency: f64,
    ) -> OperatorResult<Signal>;

    /// Resamples `signal` to `sampling_frequency`.
    fn resample(&self, signal: &Signal, sampling_frequency: f64) -> OperatorResult<Signal>;

    /// Filters `signal` with the difference equation given by `b` and `a`.
    fn filter_signal(&self, b: &[f64], a: &[f64], signal: &Signal) -> OperatorResult<Signal>;

    /// Designs minimum-phase FIR taps approximating the magnitude response
    /// `frf` at `sampling_frequency`.
    fn design_fir_from_frf(&self, frf: &Spectrum, sampling_frequency: f64)
        -> OperatorResult<Vec<f64>>;
}
