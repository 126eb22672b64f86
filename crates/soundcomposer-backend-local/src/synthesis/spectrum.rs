//! Time-domain synthesis of a power spectral density.

use std::f64::consts::PI;

use rand::Rng;
use rand_pcg::Pcg32;
use soundcomposer_core::{Spectrum, SpectrumType};

use crate::interp::density_at;
use crate::spectral::RandomPhaseSynth;

/// Renders `n` samples whose PSD follows `spectrum`, as one random-phase
/// inverse FFT.
pub fn synthesize_ifft(spectrum: &Spectrum, n: usize, sampling_frequency: f64, rng: &mut Pcg32) -> Vec<f64> {
    let synth = RandomPhaseSynth::new(n, sampling_frequency);
    let density = density_at(spectrum, SpectrumType::Narrowband, &synth.frequencies());
    synth.block(&density, rng)
}

/// Renders `n` samples whose PSD follows `spectrum`: points at least
/// `threshold_db` above the median PSD become sine tones carrying their
/// band power, the remaining spectrum goes through the inverse FFT.
pub fn synthesize_hybrid(
    spectrum: &Spectrum,
    n: usize,
    sampling_frequency: f64,
    threshold_db: f64,
    rng: &mut Pcg32,
) -> Vec<f64> {
    let peaks = find_peaks(&spectrum.values, threshold_db);
    let median = median(&spectrum.values);

    let mut residual = spectrum.clone();
    for &p in &peaks {
        residual.values[p] = median;
    }
    let mut output = synthesize_ifft(&residual, n, sampling_frequency, rng);

    let nyquist = sampling_frequency / 2.0;
    for &p in &peaks {
        let frequency = spectrum.frequencies[p];
        let bandwidth = point_bandwidth(&spectrum.frequencies, p, sampling_frequency, n);
        // Tone amplitude carrying the band power above the residual floor.
        let power = (spectrum.values[p] - median).max(0.0) * bandwidth;
        let phase = rng.gen::<f64>() * 2.0 * PI;
        if frequency <= 0.0 || frequency >= nyquist || power <= 0.0 {
            continue;
        }
        let amplitude = (2.0 * power).sqrt();
        let omega = 2.0 * PI * frequency / sampling_frequency;
        for (i, sample) in output.iter_mut().enumerate() {
            *sample += amplitude * (omega * i as f64 + phase).sin();
        }
    }
    output
}

/// Indices of local maxima at least `threshold_db` above the median.
pub fn find_peaks(values: &[f64], threshold_db: f64) -> Vec<usize> {
    let floor = median(values) * 10f64.powf(threshold_db / 10.0);
    (0..values.len())
        .filter(|&i| {
            let v = values[i];
            let left = i == 0 || v >= values[i - 1];
            let right = i + 1 == values.len() || v > values[i + 1];
            v > 0.0 && v >= floor && left && right
        })
        .collect()
}

fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Width of the frequency band a spectral point stands for.
fn point_bandwidth(frequencies: &[f64], p: usize, sampling_frequency: f64, n: usize) -> f64 {
    let len = frequencies.len();
    if len < 2 {
        return sampling_frequency / n.max(1) as f64;
    }
    let lower = if p == 0 { frequencies[0] } else { frequencies[p - 1] };
    let upper = if p + 1 == len {
        frequencies[len - 1]
    } else {
        frequencies[p + 1]
    };
    let span = if p == 0 || p + 1 == len { 2.0 } else { 1.0 };
    (upper - lower) * span / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::create_rng;

    fn mean_power(samples: &[f64]) -> f64 {
        samples.iter().map(|x| x * x).sum::<f64>() / samples.len() as f64
    }

    #[test]
    fn test_ifft_power() {
        let spectrum = Spectrum::new(vec![0.0, 500.0], vec![2e-3, 2e-3]).unwrap();
        let samples = synthesize_ifft(&spectrum, 1000, 1000.0, &mut create_rng(3));
        assert_eq!(samples.len(), 1000);
        assert!((mean_power(&samples) - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_find_peaks() {
        let values = [1.0, 1.0, 50.0, 1.0, 1.0, 5.0, 1.0];
        assert_eq!(find_peaks(&values, 10.0), vec![2]);
        assert_eq!(find_peaks(&values, 3.0), vec![2, 5]);
        assert!(find_peaks(&[0.0, 0.0], 10.0).is_empty());
    }

    #[test]
    fn test_hybrid_renders_tone() {
        // Flat floor with a strong line at 100 Hz.
        let frequencies: Vec<f64> = (0..=50).map(|k| k as f64 * 10.0).collect();
        let mut values = vec![1e-8; frequencies.len()];
        values[10] = 0.05;
        let spectrum = Spectrum::new(frequencies, values).unwrap();

        let samples = synthesize_hybrid(&spectrum, 1000, 1000.0, 10.0, &mut create_rng(5));
        assert_eq!(samples.len(), 1000);
        // Tone power is close to 0.05 * 10 Hz.
        let power = mean_power(&samples);
        assert!((power - 0.5).abs() < 0.02, "power {power}");
    }

    #[test]
    fn test_point_bandwidth() {
        let frequencies = [0.0, 10.0, 30.0];
        assert_eq!(point_bandwidth(&frequencies, 0, 100.0, 10), 10.0);
        assert_eq!(point_bandwidth(&frequencies, 1, 100.0, 10), 15.0);
        assert_eq!(point_bandwidth(&frequencies, 2, 100.0, 10), 20.0);
    }
}
