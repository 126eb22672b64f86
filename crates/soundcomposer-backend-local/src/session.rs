//! In-process implementation of the operator runtime contract.

use soundcomposer_core::{
    BroadbandNoiseData, BroadbandNoiseTwoParametersData, ControlProfile, HarmonicsData,
    HarmonicsTwoParametersData, OperatorResult, Session, Signal, SourceControlSpectrum, Spectrum,
    SynthesisMethod,
};
use tracing::debug;

use crate::config::LocalConfig;
use crate::error::{LocalError, LocalResult};
use crate::filter::DifferenceEquation;
use crate::resample::resample_linear;
use crate::rng::SeedBuilder;
use crate::spectral::minimum_phase_fir;
use crate::synthesis::harmonics::{synthesize_harmonics, synthesize_harmonics_two_parameters};
use crate::synthesis::noise::{
    synthesize_broadband_noise, synthesize_broadband_noise_two_parameters,
};
use crate::synthesis::output_len;
use crate::synthesis::spectrum::{synthesize_hybrid, synthesize_ifft};

/// Deterministic local session.
///
/// The session holds only its configuration. Every random stream is seeded
/// from the configuration seed and the call's inputs, so identical calls
/// produce identical signals regardless of call order.
#[derive(Debug, Clone, Default)]
pub struct LocalSession {
    config: LocalConfig,
}

impl LocalSession {
    /// Creates a session with a validated configuration.
    pub fn new(config: LocalConfig) -> LocalResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Creates a default session with another seed.
    pub fn with_seed(seed: u32) -> Self {
        Self {
            config: LocalConfig {
                seed,
                ..LocalConfig::default()
            },
        }
    }

    /// Configuration of the session.
    pub fn config(&self) -> &LocalConfig {
        &self.config
    }

    fn seed(&self, operator: &str) -> SeedBuilder {
        SeedBuilder::new(self.config.seed, operator)
    }
}

fn add_spectrum(seed: SeedBuilder, spectrum: &Spectrum) -> SeedBuilder {
    seed.f64s(&spectrum.frequencies).f64s(&spectrum.values)
}

fn add_profile(seed: SeedBuilder, profile: &ControlProfile) -> SeedBuilder {
    seed.f64s(&profile.times).f64s(&profile.values)
}

fn make_signal(samples: Vec<f64>, sampling_frequency: f64, name: &str) -> LocalResult<Signal> {
    let signal = Signal::new(samples, sampling_frequency).map_err(|_| {
        LocalError::InvalidSamplingFrequency {
            rate: sampling_frequency,
        }
    })?;
    Ok(signal.with_name(name))
}

fn check_rate(sampling_frequency: f64) -> LocalResult<()> {
    output_len(sampling_frequency, 0.0).map(|_| ())
}

impl LocalSession {
    fn spectrum(
        &self,
        spectrum: &Spectrum,
        control: &SourceControlSpectrum,
        sampling_frequency: f64,
    ) -> LocalResult<Signal> {
        spectrum
            .validate()
            .map_err(|e| LocalError::shape(e.to_string()))?;
        let n = output_len(sampling_frequency, control.duration())?;
        let mut rng = add_spectrum(self.seed("generate_spectrum"), spectrum)
            .f64(control.duration())
            .f64(f64::from(control.method().code()))
            .f64(sampling_frequency)
            .rng();
        let samples = match control.method() {
            SynthesisMethod::Ifft => synthesize_ifft(spectrum, n, sampling_frequency, &mut rng),
            SynthesisMethod::Hybrid => synthesize_hybrid(
                spectrum,
                n,
                sampling_frequency,
                self.config.hybrid_peak_threshold_db,
                &mut rng,
            ),
        };
        make_signal(samples, sampling_frequency, &spectrum.name)
    }

    fn broadband_noise(
        &self,
        data: &BroadbandNoiseData,
        control: &ControlProfile,
        sampling_frequency: f64,
    ) -> LocalResult<Signal> {
        let n = output_len(sampling_frequency, control.duration())?;
        let mut seed = self
            .seed("generate_broadband_noise")
            .str(data.spectrum_type.name())
            .f64s(&data.control_axis.values);
        for spectrum in &data.spectra {
            seed = add_spectrum(seed, spectrum);
        }
        let mut rng = add_profile(seed, control).f64(sampling_frequency).rng();
        let samples = synthesize_broadband_noise(
            data,
            control,
            n,
            sampling_frequency,
            self.config.frame_size,
            &mut rng,
        )?;
        make_signal(samples, sampling_frequency, &data.name)
    }

    fn broadband_noise_two_parameters(
        &self,
        data: &BroadbandNoiseTwoParametersData,
        control_1: &ControlProfile,
        control_2: &ControlProfile,
        sampling_frequency: f64,
    ) -> LocalResult<Signal> {
        let n = output_len(sampling_frequency, control_1.duration())?;
        let mut seed = self
            .seed("generate_broadband_noise_two_parameters")
            .str(data.spectrum_type.name())
            .f64s(&data.control_axis_1.values)
            .f64s(&data.control_axis_2.values);
        for spectrum in &data.spectra {
            seed = add_spectrum(seed, spectrum);
        }
        let mut rng = add_profile(add_profile(seed, control_1), control_2)
            .f64(sampling_frequency)
            .rng();
        let samples = synthesize_broadband_noise_two_parameters(
            data,
            control_1,
            control_2,
            n,
            sampling_frequency,
            self.config.frame_size,
            &mut rng,
        )?;
        make_signal(samples, sampling_frequency, &data.name)
    }

    fn harmonics(
        &self,
        data: &HarmonicsData,
        rpm: &ControlProfile,
        sampling_frequency: f64,
    ) -> LocalResult<Signal> {
        let n = output_len(sampling_frequency, rpm.duration())?;
        let mut rng = add_profile(
            self.seed("generate_harmonics")
                .f64s(&data.orders)
                .f64s(&data.rpm_axis.values),
            rpm,
        )
        .f64(sampling_frequency)
        .rng();
        let samples = synthesize_harmonics(data, rpm, n, sampling_frequency, &mut rng)?;
        Ok(make_signal(samples, sampling_frequency, &data.name)?.with_unit(data.unit.clone()))
    }

    fn harmonics_two_parameters(
        &self,
        data: &HarmonicsTwoParametersData,
        rpm: &ControlProfile,
        control_2: &ControlProfile,
        sampling_frequency: f64,
    ) -> LocalResult<Signal> {
        let n = output_len(sampling_frequency, rpm.duration())?;
        let seed = self
            .seed("generate_harmonics_two_parameters")
            .f64s(&data.orders)
            .f64s(&data.rpm_axis.values)
            .f64s(&data.control_axis_2.values);
        let mut rng = add_profile(add_profile(seed, rpm), control_2)
            .f64(sampling_frequency)
            .rng();
        let samples = synthesize_harmonics_two_parameters(
            data,
            rpm,
            control_2,
            n,
            sampling_frequency,
            &mut rng,
        )?;
        Ok(make_signal(samples, sampling_frequency, &data.name)?.with_unit(data.unit.clone()))
    }

    fn resample_signal(&self, signal: &Signal, sampling_frequency: f64) -> LocalResult<Signal> {
        check_rate(sampling_frequency)?;
        check_rate(signal.sampling_frequency)?;
        let mut resampled = signal.clone();
        resampled.samples =
            resample_linear(&signal.samples, signal.sampling_frequency, sampling_frequency);
        resampled.sampling_frequency = sampling_frequency;
        Ok(resampled)
    }

    fn filter(&self, b: &[f64], a: &[f64], signal: &Signal) -> LocalResult<Signal> {
        let mut filter = DifferenceEquation::new(b, a)?;
        let mut filtered = signal.clone();
        filtered.samples = filter.process_buffer_copy(&signal.samples);
        Ok(filtered)
    }

    fn design_fir(&self, frf: &Spectrum, sampling_frequency: f64) -> LocalResult<Vec<f64>> {
        check_rate(sampling_frequency)?;
        frf.validate().map_err(|e| LocalError::shape(e.to_string()))?;
        Ok(minimum_phase_fir(
            &frf.frequencies,
            &frf.values,
            sampling_frequency,
            self.config.fir_length,
        ))
    }
}

impl Session for LocalSession {
    fn generate_spectrum(
        &self,
        spectrum: &Spectrum,
        control: &SourceControlSpectrum,
        sampling_frequency: f64,
    ) -> OperatorResult<Signal> {
        let operator = "generate_spectrum";
        debug!(operator, method = %control.method(), "local render");
        self.spectrum(spectrum, control, sampling_frequency)
            .map_err(|e| e.into_operator_error(operator))
    }

    fn generate_broadband_noise(
        &self,
        data: &BroadbandNoiseData,
        control: &ControlProfile,
        sampling_frequency: f64,
    ) -> OperatorResult<Signal> {
        let operator = "generate_broadband_noise";
        debug!(operator, spectra = data.spectra.len(), "local render");
        self.broadband_noise(data, control, sampling_frequency)
            .map_err(|e| e.into_operator_error(operator))
    }

    fn generate_broadband_noise_two_parameters(
        &self,
        data: &BroadbandNoiseTwoParametersData,
        control_1: &ControlProfile,
        control_2: &ControlProfile,
        sampling_frequency: f64,
    ) -> OperatorResult<Signal> {
        let operator = "generate_broadband_noise_two_parameters";
        debug!(operator, spectra = data.spectra.len(), "local render");
        self.broadband_noise_two_parameters(data, control_1, control_2, sampling_frequency)
            .map_err(|e| e.into_operator_error(operator))
    }

    fn generate_harmonics(
        &self,
        data: &HarmonicsData,
        rpm: &ControlProfile,
        sampling_frequency: f64,
    ) -> OperatorResult<Signal> {
        let operator = "generate_harmonics";
        debug!(operator, orders = data.orders.len(), "local render");
        self.harmonics(data, rpm, sampling_frequency)
            .map_err(|e| e.into_operator_error(operator))
    }

    fn generate_harmonics_two_parameters(
        &self,
        data: &HarmonicsTwoParametersData,
        rpm: &ControlProfile,
        control_2: &ControlProfile,
        sampling_frequency: f64,
    ) -> OperatorResult<Signal> {
        let operator = "generate_harmonics_two_parameters";
        debug!(operator, orders = data.orders.len(), "local render");
        self.harmonics_two_parameters(data, rpm, control_2, sampling_frequency)
            .map_err(|e| e.into_operator_error(operator))
    }

    fn resample(&self, signal: &Signal, sampling_frequency: f64) -> OperatorResult<Signal> {
        self.resample_signal(signal, sampling_frequency)
            .map_err(|e| e.into_operator_error("resample"))
    }

    fn filter_signal(&self, b: &[f64], a: &[f64], signal: &Signal) -> OperatorResult<Signal> {
        self.filter(b, a, signal)
            .map_err(|e| e.into_operator_error("filter_signal"))
    }

    fn design_fir_from_frf(
        &self,
        frf: &Spectrum,
        sampling_frequency: f64,
    ) -> OperatorResult<Vec<f64>> {
        self.design_fir(frf, sampling_frequency)
            .map_err(|e| e.into_operator_error("design_fir_from_frf"))
    }
}
