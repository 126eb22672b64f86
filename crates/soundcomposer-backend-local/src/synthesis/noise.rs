//! Broadband noise following control profiles.
//!
//! Noise is rendered as Hann-windowed frames at 50% overlap. Each frame is a
//! random-phase block whose PSD is interpolated from the data set at the
//! control value(s) at the frame centre.

use std::f64::consts::PI;

use rand_pcg::Pcg32;
use soundcomposer_core::{BroadbandNoiseData, BroadbandNoiseTwoParametersData, ControlProfile};

use crate::error::{LocalError, LocalResult};
use crate::interp::{bracket, density_at, lerp_rows};
use crate::spectral::RandomPhaseSynth;

/// Restores unit mean power after windowing: the squared Hann windows of two
/// overlapping frames average to 3/4.
const OVERLAP_CORRECTION: f64 = 1.154_700_538_379_251_5; // sqrt(4/3)

/// Renders `n` samples of noise following one control profile.
pub fn synthesize_broadband_noise(
    data: &BroadbandNoiseData,
    control: &ControlProfile,
    n: usize,
    sampling_frequency: f64,
    frame_size: usize,
    rng: &mut Pcg32,
) -> LocalResult<Vec<f64>> {
    data.validate().map_err(|e| LocalError::shape(e.to_string()))?;
    let synth = RandomPhaseSynth::new(frame_size, sampling_frequency);
    let frequencies = synth.frequencies();
    let densities: Vec<Vec<f64>> = data
        .spectra
        .iter()
        .map(|spectrum| density_at(spectrum, data.spectrum_type, &frequencies))
        .collect();

    Ok(overlap_add(&synth, n, sampling_frequency, rng, |t| {
        let (i0, i1, w) = bracket(&data.control_axis.values, control.value_at(t));
        lerp_rows(&densities[i0], &densities[i1], w)
    }))
}

/// Renders `n` samples of noise following two control profiles, with the
/// PSD blended bilinearly over the data grid.
pub fn synthesize_broadband_noise_two_parameters(
    data: &BroadbandNoiseTwoParametersData,
    control_1: &ControlProfile,
    control_2: &ControlProfile,
    n: usize,
    sampling_frequency: f64,
    frame_size: usize,
    rng: &mut Pcg32,
) -> LocalResult<Vec<f64>> {
    data.validate().map_err(|e| LocalError::shape(e.to_string()))?;
    let synth = RandomPhaseSynth::new(frame_size, sampling_frequency);
    let frequencies = synth.frequencies();
    let densities: Vec<Vec<f64>> = data
        .spectra
        .iter()
        .map(|spectrum| density_at(spectrum, data.spectrum_type, &frequencies))
        .collect();
    let n2 = data.control_axis_2.len();

    Ok(overlap_add(&synth, n, sampling_frequency, rng, |t| {
        let (i0, i1, u) = bracket(&data.control_axis_1.values, control_1.value_at(t));
        let (j0, j1, v) = bracket(&data.control_axis_2.values, control_2.value_at(t));
        let low = lerp_rows(&densities[i0 * n2 + j0], &densities[i0 * n2 + j1], v);
        let high = lerp_rows(&densities[i1 * n2 + j0], &densities[i1 * n2 + j1], v);
        lerp_rows(&low, &high, u)
    }))
}

/// Overlap-adds windowed random-phase frames over `n` samples. `density`
/// gives the PSD at a time in seconds.
fn overlap_add(
    synth: &RandomPhaseSynth,
    n: usize,
    sampling_frequency: f64,
    rng: &mut Pcg32,
    density: impl Fn(f64) -> Vec<f64>,
) -> Vec<f64> {
    let frame = synth.len();
    let hop = (frame / 2).max(1);
    let window: Vec<f64> = (0..frame)
        .map(|i| (PI * i as f64 / frame as f64).sin().powi(2) * OVERLAP_CORRECTION)
        .collect();
    let duration = n as f64 / sampling_frequency;

    let mut output = vec![0.0; n];
    // The first frame starts half a frame early so every sample is covered
    // by two frames.
    let mut start = -(hop as isize);
    while start < n as isize {
        let centre = start as f64 + frame as f64 / 2.0;
        let t = (centre / sampling_frequency).clamp(0.0, duration);
        let block = synth.block(&density(t), rng);
        for (i, (sample, w)) in block.iter().zip(&window).enumerate() {
            let index = start + i as isize;
            if index < 0 {
                continue;
            }
            let Some(out) = output.get_mut(index as usize) else {
                break;
            };
            *out += sample * w;
        }
        start += hop as isize;
    }
    output
}
