//! Consequence records for wrong decisions.

use serde::{Deserialize, Serialize};

use super::{ConsequenceId, IntRange};
use crate::mechanics::ConsequenceTrigger;

/// Report text and penalties applied after a wrong call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consequence {
    pub id: ConsequenceId,
    pub trigger: ConsequenceTrigger,
    /// May contain `{casualties}` and `{credits}` placeholders.
    pub description: String,
    #[serde(default)]
    pub casualties: IntRange,
    #[serde(default)]
    pub credit_penalty: IntRange,
}

impl Consequence {
    /// Create a consequence with no casualties or penalty.
    pub fn new(
        id: impl Into<String>,
        trigger: ConsequenceTrigger,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: ConsequenceId::new(id),
            trigger,
            description: description.into(),
            casualties: IntRange::default(),
            credit_penalty: IntRange::default(),
        }
    }

    /// Set the credit penalty range.
    pub fn with_credit_penalty(mut self, min: u32, max: u32) -> Self {
        self.credit_penalty = IntRange::new(min, max);
        self
    }
}
