//! Linear-interpolation resampling.

/// Number of samples of a `len`-sample signal resampled from `from` Hz to
/// `to` Hz.
pub fn resampled_len(len: usize, from: f64, to: f64) -> usize {
    (len as f64 * to / from).round() as usize
}

/// Resamples `samples` from `from` Hz to `to` Hz by linear interpolation.
/// Positions past the last input sample hold its value.
pub fn resample_linear(samples: &[f64], from: f64, to: f64) -> Vec<f64> {
    let Some(&last) = samples.last() else {
        return Vec::new();
    };
    let step = from / to;
    (0..resampled_len(samples.len(), from, to))
        .map(|m| {
            let position = m as f64 * step;
            let index = position.floor() as usize;
            if index + 1 >= samples.len() {
                return last;
            }
            let frac = position - index as f64;
            samples[index] + (samples[index + 1] - samples[index]) * frac
        })
        .collect()
}
