//! Source synthesis.
//!
//! - `spectrum` - IFFT and hybrid (tones + IFFT) synthesis of a PSD
//! - `noise` - broadband noise following one or two control profiles
//! - `harmonics` - rotating-machine orders following an RPM profile

pub mod harmonics;
pub mod noise;
pub mod spectrum;

use crate::error::{LocalError, LocalResult};

/// Number of samples covering `duration` seconds at `sampling_frequency`.
pub fn output_len(sampling_frequency: f64, duration: f64) -> LocalResult<usize> {
    if !sampling_frequency.is_finite() || sampling_frequency <= 0.0 {
        return Err(LocalError::InvalidSamplingFrequency {
            rate: sampling_frequency,
        });
    }
    if !duration.is_finite() || duration < 0.0 {
        return Err(LocalError::InvalidDuration { duration });
    }
    Ok((sampling_frequency * duration).round() as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_len() {
        assert_eq!(output_len(44100.0, 3.0).unwrap(), 132300);
        assert_eq!(output_len(1000.0, 0.0015).unwrap(), 2);
        assert!(output_len(0.0, 1.0).is_err());
        assert!(output_len(1000.0, f64::NAN).is_err());
    }
}
