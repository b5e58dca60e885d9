//! Learning parameters
//!
//! All thresholds of the Ron-Singer-Tishby construction in one place, with
//! call-time validation. Two presets are carried: the reference defaults of
//! the original learner, and the sparser thresholds used when training on
//! full song corpora.

use thiserror::Error;

/// A parameter failed validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// `max_order` must allow at least length-1 contexts.
    #[error("max_order must be at least 1")]
    ZeroOrder,

    /// A probability parameter left `[0, 1]`.
    #[error("{name} must lie in [0, 1], got {value}")]
    InvalidProbability {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f64,
    },

    /// The divergence ratio must exceed 1 for the two-sided test to mean
    /// anything.
    #[error("divergence ratio r must be > 1, got {0}")]
    RatioTooSmall(f64),

    /// `alpha` scales a probability threshold and cannot be negative.
    #[error("alpha must be non-negative, got {0}")]
    NegativeAlpha(f64),
}

/// Parameters of one PST learning run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct PstConfig {
    /// Maximum context length `L`.
    pub max_order: usize,
    /// Minimum context probability for seeding and exploration.
    pub p_min: f64,
    /// Smoothing floor: minimum probability any symbol keeps.
    pub g_min: f64,
    /// Divergence ratio threshold (`> 1`).
    pub r: f64,
    /// Frequency-adequacy multiplier in the admission test.
    pub alpha: f64,
    /// Whether scoring uses the smoothed or the raw distributions.
    pub smoothing: bool,
}

impl Default for PstConfig {
    fn default() -> Self {
        Self {
            max_order: 7,
            p_min: 0.0073,
            g_min: 0.185,
            r: 1.6,
            alpha: 17.5,
            smoothing: false,
        }
    }
}

impl PstConfig {
    /// Reference defaults with an explicit maximum order.
    pub fn for_order(max_order: usize) -> Self {
        Self {
            max_order,
            ..Self::default()
        }
    }

    /// Thresholds tuned for full song corpora: a much lower occurrence floor
    /// and a small smoothing floor, with smoothing on.
    pub fn trainer_defaults(max_order: usize) -> Self {
        Self {
            max_order,
            p_min: 0.00073,
            g_min: 0.01,
            r: 1.6,
            alpha: 17.5,
            smoothing: true,
        }
    }

    /// Check every parameter; the alphabet-dependent bound on `g_min` is
    /// checked at learn time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_order == 0 {
            return Err(ConfigError::ZeroOrder);
        }
        for (name, value) in [("p_min", self.p_min), ("g_min", self.g_min)] {
            if !(0.0..=1.0).contains(&value) || value.is_nan() {
                return Err(ConfigError::InvalidProbability { name, value });
            }
        }
        if !(self.r > 1.0) {
            return Err(ConfigError::RatioTooSmall(self.r));
        }
        if !(self.alpha >= 0.0) {
            return Err(ConfigError::NegativeAlpha(self.alpha));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(PstConfig::default().validate().is_ok());
        assert!(PstConfig::trainer_defaults(3).validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_parameters() {
        let mut config = PstConfig::default();
        config.max_order = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroOrder));

        let mut config = PstConfig::default();
        config.p_min = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidProbability { name: "p_min", .. })
        ));

        let mut config = PstConfig::default();
        config.r = 1.0;
        assert_eq!(config.validate(), Err(ConfigError::RatioTooSmall(1.0)));

        let mut config = PstConfig::default();
        config.alpha = -1.0;
        assert_eq!(config.validate(), Err(ConfigError::NegativeAlpha(-1.0)));
    }
}
