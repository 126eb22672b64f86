//! Harmonics of a rotating machine.
//!
//! Order `o` at `rpm` has frequency `o * rpm / 60`. Each order keeps its own
//! phase accumulator, so frequency sweeps stay continuous. Levels are RMS
//! amplitudes; orders at or above Nyquist are silent.

use std::f64::consts::{PI, SQRT_2};

use rand::Rng;
use rand_pcg::Pcg32;
use soundcomposer_core::{ControlProfile, HarmonicsData, HarmonicsTwoParametersData};

use crate::error::{LocalError, LocalResult};
use crate::interp::bracket;

/// Renders `n` samples of the orders of `data` along the `rpm` profile.
pub fn synthesize_harmonics(
    data: &HarmonicsData,
    rpm: &ControlProfile,
    n: usize,
    sampling_frequency: f64,
    rng: &mut Pcg32,
) -> LocalResult<Vec<f64>> {
    data.validate().map_err(|e| LocalError::shape(e.to_string()))?;
    let axis = &data.rpm_axis.values;
    Ok(accumulate(&data.orders, n, sampling_frequency, rng, |t, levels| {
        let speed = rpm.value_at(t);
        let (i0, i1, w) = bracket(axis, speed);
        for (o, level) in levels.iter_mut().enumerate() {
            let (a, b) = (data.levels[i0][o], data.levels[i1][o]);
            *level = a + (b - a) * w;
        }
        speed
    }))
}

/// Renders `n` samples of the orders of `data` along the `rpm` profile, with
/// levels blended bilinearly over RPM and the second control.
pub fn synthesize_harmonics_two_parameters(
    data: &HarmonicsTwoParametersData,
    rpm: &ControlProfile,
    control_2: &ControlProfile,
    n: usize,
    sampling_frequency: f64,
    rng: &mut Pcg32,
) -> LocalResult<Vec<f64>> {
    data.validate().map_err(|e| LocalError::shape(e.to_string()))?;
    let n2 = data.control_axis_2.len();
    Ok(accumulate(&data.orders, n, sampling_frequency, rng, |t, levels| {
        let speed = rpm.value_at(t);
        let (i0, i1, u) = bracket(&data.rpm_axis.values, speed);
        let (j0, j1, v) = bracket(&data.control_axis_2.values, control_2.value_at(t));
        let row = |i: usize, j: usize| &data.levels[i * n2 + j];
        for (o, level) in levels.iter_mut().enumerate() {
            let low = row(i0, j0)[o] + (row(i0, j1)[o] - row(i0, j0)[o]) * v;
            let high = row(i1, j0)[o] + (row(i1, j1)[o] - row(i1, j0)[o]) * v;
            *level = low + (high - low) * u;
        }
        speed
    }))
}

/// Sums one sine per order. `state` fills the levels at a time in seconds
/// and returns the RPM there.
fn accumulate(
    orders: &[f64],
    n: usize,
    sampling_frequency: f64,
    rng: &mut Pcg32,
    mut state: impl FnMut(f64, &mut [f64]) -> f64,
) -> Vec<f64> {
    let nyquist = sampling_frequency / 2.0;
    let mut phases: Vec<f64> = orders.iter().map(|_| rng.gen::<f64>() * 2.0 * PI).collect();
    let mut levels = vec![0.0; orders.len()];

    (0..n)
        .map(|i| {
            let rpm = state(i as f64 / sampling_frequency, &mut levels);
            let rotation = rpm / 60.0;
            let mut sample = 0.0;
            for ((order, phase), level) in orders.iter().zip(phases.iter_mut()).zip(&levels) {
                let frequency = order * rotation;
                if frequency.abs() < nyquist {
                    sample += SQRT_2 * level * phase.sin();
                }
                *phase = (*phase + 2.0 * PI * frequency / sampling_frequency) % (2.0 * PI);
            }
            sample
        })
        .collect()
}
