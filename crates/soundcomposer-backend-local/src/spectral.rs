//! FFT building blocks: random-phase synthesis from a PSD and minimum-phase
//! FIR design.

use std::f64::consts::PI;
use std::sync::Arc;

use rand::Rng;
use rand_pcg::Pcg32;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::interp::interp_linear;

/// Magnitude floor of the log spectrum in FIR design (-200 dB).
const LOG_FLOOR: f64 = 1e-10;

/// Frequencies of the non-negative FFT bins of an `n`-point transform.
pub fn bin_frequencies(n: usize, sampling_frequency: f64) -> Vec<f64> {
    (0..=n / 2)
        .map(|k| k as f64 * sampling_frequency / n as f64)
        .collect()
}

/// Synthesizes `n`-sample blocks of Gaussian-like noise with a prescribed
/// one-sided power spectral density.
///
/// Bin `k` gets magnitude `sqrt(S_k * fs * n / 2)` and a uniformly random
/// phase, so the block's mean power is the integral of `S` over
/// `0..fs/2`. DC is left at zero.
pub struct RandomPhaseSynth {
    ifft: Arc<dyn Fft<f64>>,
    n: usize,
    sampling_frequency: f64,
}

impl RandomPhaseSynth {
    /// Plans an `n`-point inverse FFT.
    pub fn new(n: usize, sampling_frequency: f64) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            ifft: planner.plan_fft_inverse(n.max(1)),
            n,
            sampling_frequency,
        }
    }

    /// Block length.
    pub fn len(&self) -> usize {
        self.n
    }

    /// Returns true for a zero-length block.
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Frequencies at which [`RandomPhaseSynth::block`] expects the density.
    pub fn frequencies(&self) -> Vec<f64> {
        bin_frequencies(self.n, self.sampling_frequency)
    }

    /// Renders one block. `density` holds one PSD value per non-negative
    /// bin, as given by [`RandomPhaseSynth::frequencies`].
    pub fn block(&self, density: &[f64], rng: &mut Pcg32) -> Vec<f64> {
        let n = self.n;
        if n == 0 {
            return Vec::new();
        }
        let scale = self.sampling_frequency * n as f64;
        let mut spectrum = vec![Complex::new(0.0, 0.0); n];
        for k in 1..=n / 2 {
            let psd = density.get(k).copied().unwrap_or(0.0).max(0.0);
            let phase = rng.gen::<f64>() * 2.0 * PI;
            if 2 * k == n {
                // Nyquist bin is real and carries the full bin power.
                let sign = if phase < PI { 1.0 } else { -1.0 };
                spectrum[k] = Complex::new(sign * (psd * scale).sqrt(), 0.0);
            } else {
                let bin = Complex::from_polar((psd * scale / 2.0).sqrt(), phase);
                spectrum[k] = bin;
                spectrum[n - k] = bin.conj();
            }
        }
        self.ifft.process(&mut spectrum);
        spectrum.iter().map(|c| c.re / n as f64).collect()
    }
}

/// Designs `taps` minimum-phase FIR coefficients whose magnitude response
/// follows `(frequencies, magnitudes)`.
///
/// The response is held at its first value below the first frequency and is
/// zero past the last one. The minimum-phase response is obtained by folding
/// the real cepstrum of the log magnitude.
pub fn minimum_phase_fir(
    frequencies: &[f64],
    magnitudes: &[f64],
    sampling_frequency: f64,
    taps: usize,
) -> Vec<f64> {
    let nfft = (4 * taps).next_power_of_two().max(64);
    let last = frequencies.last().copied().unwrap_or(0.0);
    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(nfft);
    let ifft = planner.plan_fft_inverse(nfft);

    // Symmetric log-magnitude spectrum.
    let mut log_spectrum = vec![Complex::new(0.0, 0.0); nfft];
    for (k, f) in bin_frequencies(nfft, sampling_frequency).into_iter().enumerate() {
        let magnitude = if f > last {
            0.0
        } else {
            interp_linear(frequencies, magnitudes, f).abs()
        };
        let value = Complex::new(magnitude.max(LOG_FLOOR).ln(), 0.0);
        log_spectrum[k] = value;
        if k > 0 && k < nfft - k {
            log_spectrum[nfft - k] = value;
        }
    }

    // Real cepstrum, folded onto positive quefrencies.
    ifft.process(&mut log_spectrum);
    let mut cepstrum: Vec<Complex<f64>> = log_spectrum
        .iter()
        .map(|c| Complex::new(c.re / nfft as f64, 0.0))
        .collect();
    for (q, c) in cepstrum.iter_mut().enumerate() {
        if q > 0 && q < nfft / 2 {
            *c *= 2.0;
        } else if q > nfft / 2 {
            *c = Complex::new(0.0, 0.0);
        }
    }

    fft.process(&mut cepstrum);
    let mut response: Vec<Complex<f64>> = cepstrum.iter().map(|c| c.exp()).collect();
    ifft.process(&mut response);
    response
        .iter()
        .take(taps)
        .map(|c| c.re / nfft as f64)
        .collect()
}
