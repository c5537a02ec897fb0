//! The generated encounter record.

use checkpoint_rules::{FactionId, ScenarioId, ShipTypeId, Violation};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::assembler::ValidationExplanation;

/// Unique identifier for an issued encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EncounterId(pub Uuid);

impl EncounterId {
    /// Create a new random encounter ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Draw the ID from a seeded generator so replays reproduce it.
    pub fn from_rng<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(uuid::Builder::from_random_bytes(rng.gen()).into_uuid())
    }
}

impl Default for EncounterId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EncounterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A bribe the captain offers to be waved through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BribeOffer {
    pub amount: u32,
}

/// A fully assembled candidate vessel and its ground-truth verdict.
///
/// Owned by the caller once issued; the engine never touches it again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Encounter {
    pub id: EncounterId,
    pub day: u32,

    // Ship
    pub ship_type: ShipTypeId,
    pub ship_type_name: String,
    pub ship_name: String,
    pub origin: String,
    pub destination: String,
    pub crew_size: u32,

    // Documents
    pub access_code: String,
    pub captain_name: String,
    pub captain_rank: String,
    /// `None` only on placeholder encounters.
    pub faction: Option<FactionId>,
    pub faction_name: String,
    pub manifest: String,
    pub narrative: String,

    // Story
    pub scenario: ScenarioId,
    pub is_story_ship: bool,
    pub story_tag: Option<String>,

    pub bribe: Option<BribeOffer>,

    // Ground truth
    pub should_approve: bool,
    /// Empty exactly when `should_approve` is true.
    pub invalid_reason: String,
    pub violation: Option<Violation>,
    pub explanation: ValidationExplanation,

    // Cost of a wrong call
    pub consequence: String,
    pub casualties: u32,
    pub credit_penalty: u32,

    /// Built-in stand-in issued when no consistent combination was found.
    pub is_placeholder: bool,
}

impl Encounter {
    /// Check whether the captain offers a bribe.
    pub fn offers_bribe(&self) -> bool {
        self.bribe.is_some()
    }

    /// Ordered human-readable reasons this vessel fails inspection.
    pub fn explanation_lines(&self) -> Vec<String> {
        self.explanation.lines()
    }

    /// Serialize for a presentation layer.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_id_from_seeded_rng_is_reproducible() {
        let a = EncounterId::from_rng(&mut ChaCha8Rng::seed_from_u64(9));
        let b = EncounterId::from_rng(&mut ChaCha8Rng::seed_from_u64(9));
        let c = EncounterId::from_rng(&mut ChaCha8Rng::seed_from_u64(10));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_json_keeps_ground_truth() {
        use crate::assembler::EncounterAssembler;
        use crate::config::EngineConfig;
        use checkpoint_rules::ContentCatalog;
        use std::sync::Arc;

        let catalog = Arc::new(ContentCatalog::builtin().unwrap());
        let mut assembler = EncounterAssembler::new(catalog, EngineConfig::default());
        let encounter = assembler.assemble(2, false, None, &mut ChaCha8Rng::seed_from_u64(12));

        let json = encounter.to_json().unwrap();
        let back: Encounter = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, encounter.id);
        assert!(!back.should_approve);
        assert_eq!(back.invalid_reason, encounter.invalid_reason);
        assert_eq!(back.explanation, encounter.explanation);
    }
}
