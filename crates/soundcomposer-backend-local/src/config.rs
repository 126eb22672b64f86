//! Configuration of the local backend.

use serde::{Deserialize, Serialize};

use crate::error::{LocalError, LocalResult};

/// Rendering parameters of a [`crate::LocalSession`].
///
/// Every field has a default, so a partial JSON document is accepted:
///
/// ```
/// use soundcomposer_backend_local::LocalConfig;
///
/// let config = LocalConfig::from_json(r#"{ "seed": 7 }"#).unwrap();
/// assert_eq!(config.seed, 7);
/// assert_eq!(config.frame_size, 2048);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LocalConfig {
    /// Base seed of every random stream.
    pub seed: u32,
    /// Frame length of broadband noise overlap-add, in samples. Even, >= 16.
    pub frame_size: usize,
    /// Number of taps of designed FIR filters. >= 2.
    pub fir_length: usize,
    /// Level above the median PSD, in dB, at which a spectral point becomes
    /// a tone in hybrid synthesis.
    pub hybrid_peak_threshold_db: f64,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            frame_size: 2048,
            fir_length: 1024,
            hybrid_peak_threshold_db: 10.0,
        }
    }
}

impl LocalConfig {
    /// Starts a builder from the defaults.
    pub fn builder() -> LocalConfigBuilder {
        LocalConfigBuilder::default()
    }

    /// Parses and validates a JSON configuration.
    pub fn from_json(json: &str) -> LocalResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration to pretty-printed JSON.
    pub fn to_json(&self) -> LocalResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks the field ranges.
    pub fn validate(&self) -> LocalResult<()> {
        if self.frame_size < 16 || self.frame_size % 2 != 0 {
            return Err(LocalError::config(format!(
                "frame_size must be even and at least 16 (got {})",
                self.frame_size
            )));
        }
        if self.fir_length < 2 {
            return Err(LocalError::config(format!(
                "fir_length must be at least 2 (got {})",
                self.fir_length
            )));
        }
        if !self.hybrid_peak_threshold_db.is_finite() || self.hybrid_peak_threshold_db < 0.0 {
            return Err(LocalError::config(format!(
                "hybrid_peak_threshold_db must be finite and non-negative (got {})",
                self.hybrid_peak_threshold_db
            )));
        }
        Ok(())
    }
}

/// Builder for [`LocalConfig`].
#[derive(Debug, Clone, Default)]
pub struct LocalConfigBuilder {
    config: LocalConfig,
}

impl LocalConfigBuilder {
    /// Sets the base seed.
    pub fn seed(mut self, seed: u32) -> Self {
        self.config.seed = seed;
        self
    }

    /// Sets the noise frame length.
    pub fn frame_size(mut self, frame_size: usize) -> Self {
        self.config.frame_size = frame_size;
        self
    }

    /// Sets the FIR length.
    pub fn fir_length(mut self, fir_length: usize) -> Self {
        self.config.fir_length = fir_length;
        self
    }

    /// Sets the hybrid peak threshold in dB.
    pub fn hybrid_peak_threshold_db(mut self, threshold: f64) -> Self {
        self.config.hybrid_peak_threshold_db = threshold;
        self
    }

    /// Validates and returns the configuration.
    pub fn build(self) -> LocalResult<LocalConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = LocalConfig::default();
        assert_eq!(config.seed, 42);
        assert_eq!(config.frame_size, 2048);
        assert_eq!(config.fir_length, 1024);
        assert_eq!(config.hybrid_peak_threshold_db, 10.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_round_trip() {
        let config = LocalConfig::builder()
            .seed(3)
            .frame_size(512)
            .build()
            .unwrap();
        let json = config.to_json().unwrap();
        assert_eq!(LocalConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_invalid_values() {
        assert!(LocalConfig::builder().frame_size(1001).build().is_err());
        assert!(LocalConfig::builder().frame_size(8).build().is_err());
        assert!(LocalConfig::builder().fir_length(1).build().is_err());
        assert!(LocalConfig::builder()
            .hybrid_peak_threshold_db(f64::NAN)
            .build()
            .is_err());
        assert!(matches!(
            LocalConfig::from_json(r#"{ "frames": 3 }"#),
            Err(LocalError::Json(_))
        ));
    }
}
