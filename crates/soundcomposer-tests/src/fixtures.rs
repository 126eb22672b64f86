//! Source and project fixtures covering every source variant.
//!
//! Fixtures are short (well under a second) and rendered at a low rate so
//! the property tests stay fast.

use soundcomposer_core::{
    BroadbandNoiseData, BroadbandNoiseTwoParametersData, ControlAxis, ControlProfile,
    HarmonicsData, HarmonicsTwoParametersData, Signal, SoundComposer, Source, SourceAudio,
    SourceBroadbandNoise, SourceBroadbandNoiseTwoParameters, SourceControlSpectrum,
    SourceControlTime, SourceHarmonics, SourceHarmonicsTwoParameters, SourceSpectrum, Spectrum,
    SpectrumType, Track,
};

/// Rate used by the fixture composers.
pub const FIXTURE_SAMPLING_FREQUENCY: f64 = 8000.0;

fn ramp(start: f64, end: f64, duration: f64, unit: &str) -> SourceControlTime {
    let profile = ControlProfile::ramp(start, end, duration, 50.0)
        .expect("valid ramp")
        .with_unit(unit);
    SourceControlTime::from_profile(profile).expect("valid control")
}

fn flat(level: f64) -> Spectrum {
    Spectrum::new(vec![0.0, 1000.0, 4000.0], vec![level, level, level / 10.0])
        .expect("valid spectrum")
        .with_unit("Pa^2/Hz")
}

/// Spectrum source: 0.25 s with the given method code.
pub fn spectrum_source(method: u32) -> SourceSpectrum {
    let control = SourceControlSpectrum::new(0.25, method).expect("valid control");
    SourceSpectrum::with_data(flat(1e-5), control).expect("valid source")
}

/// Audio source: a 0.2 s clip at 16 kHz.
pub fn audio_source() -> SourceAudio {
    let samples = (0..3200).map(|i| 0.3 * (i as f64 * 0.05).sin()).collect();
    let clip = Signal::new(samples, 16000.0)
        .expect("valid clip")
        .with_unit("Pa")
        .with_name("clip");
    SourceAudio::from_signal(clip).expect("valid source")
}

/// Broadband noise along a speed ramp.
pub fn broadband_noise_source() -> SourceBroadbandNoise {
    let axis = ControlAxis::new("Speed", "km/h", vec![20.0, 80.0, 140.0]).expect("valid axis");
    let data = BroadbandNoiseData::new(
        SpectrumType::Narrowband,
        axis,
        vec![flat(1e-7), flat(1e-6), flat(1e-5)],
    )
    .expect("valid data")
    .with_name("Rolling noise");
    SourceBroadbandNoise::with_data(data, ramp(20.0, 140.0, 0.3, "km/h")).expect("valid source")
}

/// Octave-band noise over speed and load.
pub fn broadband_noise_two_parameters_source() -> SourceBroadbandNoiseTwoParameters {
    let speed = ControlAxis::new("Speed", "km/h", vec![0.0, 100.0]).expect("valid axis");
    let load = ControlAxis::new("Load", "%", vec![0.0, 50.0, 100.0]).expect("valid axis");
    let bands = |level: f64| {
        Spectrum::new(vec![125.0, 250.0, 500.0, 1000.0], vec![level; 4]).expect("valid bands")
    };
    let spectra = (1..=6).map(|k| bands(1e-4 * k as f64)).collect();
    let data = BroadbandNoiseTwoParametersData::new(SpectrumType::Octave, speed, load, spectra)
        .expect("valid data");
    SourceBroadbandNoiseTwoParameters::with_data(
        data,
        ramp(0.0, 100.0, 0.4, "km/h"),
        ramp(100.0, 0.0, 0.4, "%"),
    )
    .expect("valid source")
}

/// Engine orders along an RPM run-up.
pub fn harmonics_source() -> SourceHarmonics {
    let rpm = ControlAxis::new("RPM", "rpm", vec![1000.0, 4000.0]).expect("valid axis");
    let data = HarmonicsData::new(
        vec![2.0, 4.0, 6.5],
        rpm,
        vec![vec![0.05, 0.02, 0.01], vec![0.1, 0.05, 0.02]],
    )
    .expect("valid data")
    .with_unit("Pa");
    SourceHarmonics::with_data(data, ramp(1000.0, 4000.0, 0.4, "rpm")).expect("valid source")
}

/// Engine orders over RPM and torque.
pub fn harmonics_two_parameters_source() -> SourceHarmonicsTwoParameters {
    let rpm = ControlAxis::new("RPM", "rpm", vec![1000.0, 4000.0]).expect("valid axis");
    let torque = ControlAxis::new("Torque", "Nm", vec![0.0, 200.0]).expect("valid axis");
    let levels = vec![vec![0.02, 0.01], vec![0.04, 0.02], vec![0.06, 0.03], vec![0.08, 0.04]];
    let data = HarmonicsTwoParametersData::new(vec![1.0, 3.0], rpm, torque, levels)
        .expect("valid data")
        .with_name("Gearbox");
    SourceHarmonicsTwoParameters::with_data(
        data,
        ramp(1500.0, 3500.0, 0.3, "rpm"),
        ramp(50.0, 150.0, 0.3, "Nm"),
    )
    .expect("valid source")
}

/// One source of every variant, both spectrum methods included.
pub fn all_sources() -> Vec<Source> {
    vec![
        spectrum_source(1).into(),
        spectrum_source(2).into(),
        audio_source().into(),
        broadband_noise_source().into(),
        broadband_noise_two_parameters_source().into(),
        harmonics_source().into(),
        harmonics_two_parameters_source().into(),
    ]
}

/// A composer at the fixture rate with the first `count` fixture sources as
/// named tracks with distinct gains. Sources wrap around past the full set.
pub fn composer_with_tracks(count: usize) -> SoundComposer {
    let mut composer =
        SoundComposer::with_sampling_frequency(FIXTURE_SAMPLING_FREQUENCY).expect("valid rate");
    let sources = all_sources();
    for (i, source) in sources.into_iter().cycle().take(count).enumerate() {
        let track = Track::with_source(source)
            .named(format!("Track {}", i + 1))
            .with_gain(-3.0 * i as f64)
            .expect("valid gain");
        composer.add_track(track);
    }
    composer
}

/// BLAKE3 hash of rendered samples, for comparing renders.
pub fn mix_hash(samples: &[f64]) -> String {
    let mut hasher = blake3::Hasher::new();
    for sample in samples {
        hasher.update(&sample.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use soundcomposer_core::Component;

    #[test]
    fn test_fixtures_are_configured() {
        for source in all_sources() {
            assert!(source.is_configured(), "{} is not configured", source.kind());
        }
    }

    #[test]
    fn test_composer_with_tracks() {
        let composer = composer_with_tracks(4);
        assert_eq!(composer.tracks.len(), 4);
        assert_eq!(composer.tracks[3].gain(), -9.0);
        assert_eq!(composer.tracks[0].name, "Track 1");
    }

    #[test]
    fn test_mix_hash_distinguishes_signs() {
        assert_ne!(mix_hash(&[0.0]), mix_hash(&[-0.0]));
        assert_eq!(mix_hash(&[1.0, 2.0]), mix_hash(&[1.0, 2.0]));
    }
}
