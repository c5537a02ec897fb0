//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use checkpoint_rules::IntRange;

use crate::error::ConfigError;

/// Tunables for generation and sequencing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum interval between two freshly generated encounters.
    pub cooldown_ms: u64,

    /// Assembly attempts before the placeholder encounter is issued.
    pub max_attempts: u32,

    /// Chance a denied vessel offers a bribe (0.0-1.0).
    pub bribe_chance: f64,
    pub bribe_min: u32,
    pub bribe_max: u32,

    /// Share of planned encounters that should be approvable (0.0-1.0).
    pub valid_ratio: f64,

    /// Chance a planned encounter is a story ship (0.0-1.0).
    pub story_chance: f64,

    /// Used when a scenario does not state its own ranges.
    pub casualties: IntRange,
    pub credit_penalty: IntRange,

    /// Fixed seed for reproducible runs; entropy when absent.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: 1500,
            max_attempts: 8,
            bribe_chance: 0.3,
            bribe_min: 500,
            bribe_max: 5000,
            valid_ratio: 0.6,
            story_chance: 0.15,
            casualties: IntRange::new(1, 25),
            credit_penalty: IntRange::new(100, 1000),
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document. Missing keys take defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check ranges and probabilities.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("bribe_chance", self.bribe_chance),
            ("valid_ratio", self.valid_ratio),
            ("story_chance", self.story_chance),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("{value} is outside [0, 1]"),
                });
            }
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "max_attempts",
                reason: "at least one attempt is required".to_string(),
            });
        }
        if self.bribe_min > self.bribe_max {
            return Err(ConfigError::Invalid {
                field: "bribe_min",
                reason: "exceeds bribe_max".to_string(),
            });
        }
        if !self.casualties.is_ordered() {
            return Err(ConfigError::Invalid {
                field: "casualties",
                reason: "min exceeds max".to_string(),
            });
        }
        if !self.credit_penalty.is_ordered() {
            return Err(ConfigError::Invalid {
                field: "credit_penalty",
                reason: "min exceeds max".to_string(),
            });
        }
        Ok(())
    }

    /// Cooldown as a duration.
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    /// Set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            cooldown_ms = 250
            seed = 42
            casualties = { min = 2, max = 9 }
            "#,
        )
        .unwrap();
        assert_eq!(config.cooldown(), Duration::from_millis(250));
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.casualties, IntRange::new(2, 9));
        assert_eq!(config.max_attempts, 8);
    }

    #[test]
    fn test_rejects_bad_probability() {
        let err = EngineConfig::from_toml_str("bribe_chance = 1.5").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "bribe_chance", .. }));
    }

    #[test]
    fn test_rejects_zero_attempts() {
        assert!(EngineConfig::from_toml_str("max_attempts = 0").is_err());
    }

    #[test]
    fn test_rejects_unparseable() {
        assert!(matches!(
            EngineConfig::from_toml_str("cooldown_ms = \"soon\""),
            Err(ConfigError::Parse(_))
        ));
    }
}
