//! Interpolation over tabulated data.

use soundcomposer_core::{Spectrum, SpectrumType};

/// Position of `x` on a strictly increasing axis: the two bracketing indices
/// and the blend weight of the upper one. Clamped at both ends.
pub fn bracket(axis: &[f64], x: f64) -> (usize, usize, f64) {
    match axis.len() {
        0 | 1 => (0, 0, 0.0),
        len => {
            if x <= axis[0] {
                return (0, 0, 0.0);
            }
            if x >= axis[len - 1] {
                return (len - 1, len - 1, 0.0);
            }
            // First index whose value exceeds x.
            let upper = axis.partition_point(|&v| v <= x);
            let lower = upper - 1;
            let t = (x - axis[lower]) / (axis[upper] - axis[lower]);
            (lower, upper, t)
        }
    }
}

/// Linear interpolation of `(xs, ys)` at `x`, clamped at both ends.
pub fn interp_linear(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    if ys.is_empty() {
        return 0.0;
    }
    let (i0, i1, t) = bracket(xs, x);
    ys[i0] + (ys[i1] - ys[i0]) * t
}

/// Blends two rows with weight `t` on the second one.
pub fn lerp_rows(a: &[f64], b: &[f64], t: f64) -> Vec<f64> {
    a.iter().zip(b).map(|(x, y)| x + (y - x) * t).collect()
}

/// Relative half-bandwidth exponent of a band type: a band centred on `fc`
/// spans `fc * 2^-e .. fc * 2^e`.
fn band_exponent(spectrum_type: SpectrumType) -> Option<f64> {
    match spectrum_type {
        SpectrumType::Narrowband => None,
        SpectrumType::Octave => Some(0.5),
        SpectrumType::ThirdOctave => Some(1.0 / 6.0),
    }
}

/// Power spectral density of `spectrum` sampled at `frequencies`.
///
/// Narrowband spectra are densities, interpolated linearly and zero outside
/// their frequency range. Octave and 1/3-octave spectra are band powers at
/// band centre frequencies, spread uniformly over each band.
pub fn density_at(spectrum: &Spectrum, spectrum_type: SpectrumType, frequencies: &[f64]) -> Vec<f64> {
    match band_exponent(spectrum_type) {
        None => {
            let (f_min, f_max) = spectrum.frequency_range();
            frequencies
                .iter()
                .map(|&f| {
                    if f < f_min || f > f_max {
                        0.0
                    } else {
                        interp_linear(&spectrum.frequencies, &spectrum.values, f)
                    }
                })
                .collect()
        }
        Some(exponent) => {
            let lower = 2f64.powf(-exponent);
            let upper = 2f64.powf(exponent);
            frequencies
                .iter()
                .map(|&f| {
                    spectrum
                        .frequencies
                        .iter()
                        .zip(&spectrum.values)
                        .find(|(fc, _)| f >= *fc * lower && f < *fc * upper)
                        .map_or(0.0, |(fc, power)| power / (fc * (upper - lower)))
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bracket() {
        let axis = [0.0, 10.0, 20.0];
        assert_eq!(bracket(&axis, -5.0), (0, 0, 0.0));
        assert_eq!(bracket(&axis, 25.0), (2, 2, 0.0));
        assert_eq!(bracket(&axis, 15.0), (1, 2, 0.5));
        assert_eq!(bracket(&axis, 10.0), (1, 2, 0.0));
        assert_eq!(bracket(&[3.0], 100.0), (0, 0, 0.0));
    }

    #[test]
    fn test_interp_linear() {
        let xs = [0.0, 1.0, 2.0];
        let ys = [0.0, 10.0, 30.0];
        assert_eq!(interp_linear(&xs, &ys, 0.5), 5.0);
        assert_eq!(interp_linear(&xs, &ys, 1.5), 20.0);
        assert_eq!(interp_linear(&xs, &ys, 9.0), 30.0);
    }

    #[test]
    fn test_narrowband_density_is_zero_outside_range() {
        let spectrum = Spectrum::new(vec![100.0, 200.0], vec![1.0, 3.0]).unwrap();
        let density = density_at(&spectrum, SpectrumType::Narrowband, &[50.0, 150.0, 250.0]);
        assert_eq!(density, vec![0.0, 2.0, 0.0]);
    }

    #[test]
    fn test_octave_band_power_is_preserved() {
        let spectrum = Spectrum::new(vec![1000.0], vec![2.0]).unwrap();
        let df = 1.0;
        let frequencies: Vec<f64> = (0..4000).map(|k| k as f64 * df).collect();
        let density = density_at(&spectrum, SpectrumType::Octave, &frequencies);
        let power: f64 = density.iter().sum::<f64>() * df;
        assert!((power - 2.0).abs() < 0.01, "band power {power}");
        assert_eq!(density[500], 0.0);
        assert!(density[1000] > 0.0);
    }
}
