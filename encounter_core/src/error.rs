//! Engine errors.

use std::time::Duration;
use thiserror::Error;

/// Rejections from the encounter sequencer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequencerError {
    #[error("encounter requested during cooldown ({remaining:?} remaining)")]
    CooldownRejected { remaining: Duration },
}

/// Engine configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse engine config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid engine config field {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
