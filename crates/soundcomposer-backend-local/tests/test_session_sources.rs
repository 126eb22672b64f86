//! Rendering every source variant through the local session.

use soundcomposer_backend_local::{LocalConfig, LocalSession};
use soundcomposer_core::{
    BroadbandNoiseData, BroadbandNoiseTwoParametersData, Component, ControlAxis, ControlProfile,
    Filter, HarmonicsData, HarmonicsTwoParametersData, Signal, SoundComposer, SourceAudio,
    SourceBroadbandNoise, SourceBroadbandNoiseTwoParameters, SourceControlSpectrum,
    SourceControlTime, SourceHarmonics, SourceHarmonicsTwoParameters, SourceSpectrum, Spectrum,
    SpectrumType, Track,
};

const FS: f64 = 8000.0;

fn time_control(start: f64, end: f64, duration: f64) -> SourceControlTime {
    let profile = ControlProfile::ramp(start, end, duration, 100.0).unwrap();
    SourceControlTime::from_profile(profile).unwrap()
}

fn rms(samples: &[f64]) -> f64 {
    (samples.iter().map(|x| x * x).sum::<f64>() / samples.len().max(1) as f64).sqrt()
}

fn flat(level: f64) -> Spectrum {
    Spectrum::new(vec![0.0, 4000.0], vec![level, level]).unwrap()
}

// ============================================================================
// Source Variants
// ============================================================================

#[test]
fn test_spectrum_ifft_and_hybrid() {
    let session = LocalSession::default();
    for method in [1, 2] {
        let source =
            SourceSpectrum::with_data(flat(1e-4), SourceControlSpectrum::new(0.5, method).unwrap())
                .unwrap();
        let mut track = Track::with_source(source);
        track.process(&session, Some(FS)).unwrap();
        let output = track.get_output().unwrap();
        assert_eq!(output.len(), 4000);
        assert!((rms(&output.samples) - 0.4f64.sqrt()).abs() < 0.05);
    }
}

#[test]
fn test_broadband_noise() {
    let session = LocalSession::default();
    let axis = ControlAxis::new("Speed", "km/h", vec![0.0, 100.0]).unwrap();
    let data =
        BroadbandNoiseData::new(SpectrumType::Narrowband, axis, vec![flat(1e-6), flat(1e-4)])
            .unwrap();
    let source = SourceBroadbandNoise::with_data(data, time_control(0.0, 100.0, 1.5)).unwrap();
    let mut track = Track::with_source(source);
    track.process(&session, Some(FS)).unwrap();
    let samples = track.get_output_as_vec();
    assert_eq!(samples.len(), 12000);
    // Rising control: the second half is louder.
    assert!(rms(&samples[6000..]) > rms(&samples[..6000]));
}

#[test]
fn test_broadband_noise_two_parameters() {
    let session = LocalSession::default();
    let axis_1 = ControlAxis::new("Speed", "km/h", vec![0.0, 100.0]).unwrap();
    let axis_2 = ControlAxis::new("Load", "%", vec![0.0, 100.0]).unwrap();
    let spectra = vec![flat(1e-6), flat(1e-5), flat(1e-5), flat(1e-4)];
    let data = BroadbandNoiseTwoParametersData::new(SpectrumType::Octave, axis_1, axis_2, spectra)
        .unwrap();
    let source = SourceBroadbandNoiseTwoParameters::with_data(
        data,
        time_control(0.0, 100.0, 1.0),
        time_control(50.0, 50.0, 3.0),
    )
    .unwrap();
    let mut track = Track::with_source(source);
    track.process(&session, Some(FS)).unwrap();
    assert_eq!(track.get_output().unwrap().len(), 8000);
}

#[test]
fn test_harmonics() {
    let session = LocalSession::default();
    let rpm = ControlAxis::new("RPM", "rpm", vec![1000.0, 3000.0]).unwrap();
    let data = HarmonicsData::new(vec![1.0, 2.0], rpm, vec![vec![0.1, 0.05], vec![0.2, 0.1]])
        .unwrap()
        .with_unit("Pa");
    let source = SourceHarmonics::with_data(data, time_control(1000.0, 3000.0, 2.0)).unwrap();
    let mut track = Track::with_source(source);
    track.process(&session, Some(FS)).unwrap();
    let output = track.get_output().unwrap();
    assert_eq!(output.len(), 16000);
    assert_eq!(output.unit, "Pa");
    assert!(rms(&output.samples) > 0.05);
}

#[test]
fn test_harmonics_two_parameters() {
    let session = LocalSession::default();
    let rpm = ControlAxis::new("RPM", "rpm", vec![1000.0, 3000.0]).unwrap();
    let torque = ControlAxis::new("Torque", "Nm", vec![0.0, 100.0]).unwrap();
    let levels = vec![vec![0.1], vec![0.2], vec![0.3], vec![0.4]];
    let data = HarmonicsTwoParametersData::new(vec![4.0], rpm, torque, levels).unwrap();
    let source = SourceHarmonicsTwoParameters::with_data(
        data,
        time_control(1000.0, 3000.0, 0.5),
        time_control(0.0, 100.0, 0.5),
    )
    .unwrap();
    let mut track = Track::with_source(source);
    track.process(&session, Some(FS)).unwrap();
    assert_eq!(track.get_output().unwrap().len(), 4000);
}

#[test]
fn test_audio_resampled() {
    let session = LocalSession::default();
    let clip = Signal::new((0..4410).map(|i| (i as f64 * 0.01).sin()).collect(), 44100.0).unwrap();
    let mut track = Track::with_source(SourceAudio::from_signal(clip).unwrap());
    track.process(&session, Some(FS)).unwrap();
    let output = track.get_output().unwrap();
    assert_eq!(output.len(), 800);
    assert_eq!(output.sampling_frequency, FS);
}

// ============================================================================
// Filters and Determinism
// ============================================================================

#[test]
fn test_designed_fir_filter_on_track() {
    let session = LocalSession::new(LocalConfig::builder().fir_length(128).build().unwrap()).unwrap();
    let frf = Spectrum::new(vec![0.0, 4000.0], vec![0.5, 0.5]).unwrap();
    let filter = Filter::design_fir_from_frf(&session, &frf, FS).unwrap();
    assert_eq!(filter.b().len(), 128);

    let source =
        SourceSpectrum::with_data(flat(1e-4), SourceControlSpectrum::new(0.5, 1).unwrap()).unwrap();
    let mut plain = Track::with_source(source.clone());
    plain.process(&session, Some(FS)).unwrap();
    let mut filtered = Track::with_source(source).with_filter(filter);
    filtered.process(&session, Some(FS)).unwrap();

    let ratio = rms(&filtered.get_output_as_vec()) / rms(&plain.get_output_as_vec());
    assert!((ratio - 0.5).abs() < 0.01, "ratio {ratio}");
}

#[test]
fn test_composer_render_is_reproducible() {
    let build = || {
        let mut composer = SoundComposer::with_sampling_frequency(FS).unwrap();
        let spectrum =
            SourceSpectrum::with_data(flat(1e-4), SourceControlSpectrum::new(1.0, 1).unwrap())
                .unwrap();
        composer.add_track(Track::with_source(spectrum));
        let rpm = ControlAxis::new("RPM", "rpm", vec![1000.0, 3000.0]).unwrap();
        let data = HarmonicsData::new(vec![1.0], rpm, vec![vec![0.1], vec![0.2]]).unwrap();
        composer.add_track(
            Track::with_source(
                SourceHarmonics::with_data(data, time_control(1000.0, 3000.0, 0.5)).unwrap(),
            )
            .with_gain(-6.0)
            .unwrap(),
        );
        composer
    };

    let session = LocalSession::default();
    let mut first = build();
    first.process(&session, None).unwrap();
    let mut second = build();
    // A fresh session with the same seed renders the same mix.
    second.process(&LocalSession::default(), None).unwrap();
    assert_eq!(first.get_output_as_vec(), second.get_output_as_vec());
    assert_eq!(first.get_output().unwrap().len(), 8000);

    let mut reseeded = build();
    reseeded.process(&LocalSession::with_seed(7), None).unwrap();
    assert_ne!(first.get_output_as_vec(), reseeded.get_output_as_vec());
}
