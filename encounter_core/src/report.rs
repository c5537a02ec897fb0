//! Outcome of the player's call on an encounter.

use serde::{Deserialize, Serialize};

use crate::encounter::{Encounter, EncounterId};

/// The player's call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub approve: bool,
}

impl Decision {
    /// Let the ship through.
    pub fn approve() -> Self {
        Self { approve: true }
    }

    /// Turn the ship away.
    pub fn deny() -> Self {
        Self { approve: false }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionOutcome {
    CorrectApproval,
    CorrectDenial,
    /// Let through a ship that should have been turned away.
    WrongApproval,
    /// Turned away a ship that was cleared.
    WrongDenial,
}

impl DecisionOutcome {
    pub fn is_correct(&self) -> bool {
        matches!(
            self,
            DecisionOutcome::CorrectApproval | DecisionOutcome::CorrectDenial
        )
    }
}

/// What a decision cost. Holds no history; each report stands alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionReport {
    pub encounter: EncounterId,
    pub outcome: DecisionOutcome,
    /// Consequence text, only for wrong calls.
    pub consequence: Option<String>,
    pub casualties: u32,
    pub credit_penalty: u32,
    /// Why the ship should have been denied, when it should have been.
    pub reasons: Vec<String>,
    /// Bribe pocketed by approving a ship that offered one.
    pub bribe_taken: Option<u32>,
}

impl DecisionReport {
    /// Score `decision` against the encounter's ground truth.
    pub fn evaluate(encounter: &Encounter, decision: Decision) -> Self {
        let outcome = match (encounter.should_approve, decision.approve) {
            (true, true) => DecisionOutcome::CorrectApproval,
            (false, false) => DecisionOutcome::CorrectDenial,
            (false, true) => DecisionOutcome::WrongApproval,
            (true, false) => DecisionOutcome::WrongDenial,
        };
        let correct = outcome.is_correct();

        let reasons = if encounter.should_approve {
            Vec::new()
        } else {
            let mut reasons = vec![encounter.invalid_reason.clone()];
            reasons.extend(
                encounter
                    .explanation
                    .issues
                    .iter()
                    .map(|issue| issue.detail.clone())
                    .filter(|detail| *detail != encounter.invalid_reason),
            );
            reasons
        };

        Self {
            encounter: encounter.id,
            outcome,
            consequence: (!correct).then(|| encounter.consequence.clone()),
            casualties: if correct { 0 } else { encounter.casualties },
            credit_penalty: if correct { 0 } else { encounter.credit_penalty },
            reasons,
            bribe_taken: encounter
                .bribe
                .filter(|_| decision.approve)
                .map(|bribe| bribe.amount),
        }
    }

    pub fn is_correct(&self) -> bool {
        self.outcome.is_correct()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkpoint_rules::ContentCatalog;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::sync::Arc;

    use crate::assembler::EncounterAssembler;
    use crate::config::EngineConfig;
    use crate::encounter::BribeOffer;

    fn encounter(want_valid: bool) -> Encounter {
        let catalog = Arc::new(ContentCatalog::builtin().unwrap());
        let mut assembler = EncounterAssembler::new(catalog, EngineConfig::default());
        assembler.assemble(3, want_valid, None, &mut ChaCha8Rng::seed_from_u64(30))
    }

    #[test]
    fn test_correct_calls_cost_nothing() {
        let valid = encounter(true);
        let report = DecisionReport::evaluate(&valid, Decision::approve());
        assert_eq!(report.outcome, DecisionOutcome::CorrectApproval);
        assert!(report.consequence.is_none());
        assert_eq!(report.casualties, 0);
        assert!(report.reasons.is_empty());

        let invalid = encounter(false);
        let report = DecisionReport::evaluate(&invalid, Decision::deny());
        assert!(report.is_correct());
        assert_eq!(report.reasons[0], invalid.invalid_reason);
    }

    #[test]
    fn test_wrong_calls_carry_consequence() {
        let invalid = encounter(false);
        let report = DecisionReport::evaluate(&invalid, Decision::approve());
        assert_eq!(report.outcome, DecisionOutcome::WrongApproval);
        assert_eq!(report.consequence.as_deref(), Some(invalid.consequence.as_str()));
        assert_eq!(report.casualties, invalid.casualties);

        let valid = encounter(true);
        let report = DecisionReport::evaluate(&valid, Decision::deny());
        assert_eq!(report.outcome, DecisionOutcome::WrongDenial);
        assert_eq!(report.credit_penalty, valid.credit_penalty);
    }

    #[test]
    fn test_bribe_only_counts_when_approved() {
        let mut invalid = encounter(false);
        invalid.bribe = Some(BribeOffer { amount: 1500 });
        assert_eq!(
            DecisionReport::evaluate(&invalid, Decision::approve()).bribe_taken,
            Some(1500)
        );
        assert_eq!(DecisionReport::evaluate(&invalid, Decision::deny()).bribe_taken, None);
    }
}
