//! Checkpoint mechanics: code types, scenario kinds, relationships, violations.

use serde::{Deserialize, Serialize};

/// Kinds of access codes issued by command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CodeType {
    #[default]
    Standard,
    Vip,
    Emergency,
    Temporary,
    Special,
}

/// The three scenario pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioType {
    Standard,
    Invalid,
    StoryEvent,
}

impl ScenarioType {
    /// Snake-case name, as written in catalogs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioType::Standard => "standard",
            ScenarioType::Invalid => "invalid",
            ScenarioType::StoryEvent => "story_event",
        }
    }
}

impl std::fmt::Display for ScenarioType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hull size classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SizeClass {
    Tiny,
    #[default]
    Small,
    Medium,
    Large,
    Capital,
}

/// Directed relationship from one faction towards another.
///
/// Precedence when several apply: `SelfFaction` > `Allied` > `Hostile` >
/// `Neutral`. `Unknown` means one side is not in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relationship {
    SelfFaction,
    Allied,
    Hostile,
    Neutral,
    Unknown,
}

/// Story-suitability traits a ship type may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipTrait {
    /// Hull can carry an infiltration team.
    Infiltrated,
    /// Hull is one the Order flies.
    OrderUse,
    Smuggling,
}

/// The single flaw an invalid encounter is built around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Violation {
    /// Code window closed before today.
    ExpiredCode,
    /// Code withdrawn by command.
    RevokedCode,
    /// Code window opens after today.
    InactiveCode,
    /// Code is not in the registry at all.
    ForgedCode,
    /// Code belongs to a different faction.
    WrongFactionCode,
    /// Faction may not fly this ship category.
    CategoryMismatch,
    /// Ship departed from an origin banned by today's rules.
    BannedOrigin,
    /// Documents are clean; the scenario itself carries the reason.
    #[default]
    Declared,
}

impl Violation {
    /// True when the flaw lives in the access code.
    pub fn is_code_flaw(&self) -> bool {
        matches!(
            self,
            Violation::ExpiredCode
                | Violation::RevokedCode
                | Violation::InactiveCode
                | Violation::ForgedCode
                | Violation::WrongFactionCode
        )
    }

    /// Short label used in explanations.
    pub fn label(&self) -> &'static str {
        match self {
            Violation::ExpiredCode => "expired access code",
            Violation::RevokedCode => "revoked access code",
            Violation::InactiveCode => "access code not yet active",
            Violation::ForgedCode => "unrecognized access code",
            Violation::WrongFactionCode => "access code issued to another faction",
            Violation::CategoryMismatch => "faction not cleared for ship category",
            Violation::BannedOrigin => "banned origin",
            Violation::Declared => "scenario violation",
        }
    }
}

/// When a consequence applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsequenceTrigger {
    /// A ship that should have been turned away was let through.
    WrongApproval,
    /// A legitimate ship was turned away.
    WrongDenial,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_flaws() {
        assert!(Violation::ExpiredCode.is_code_flaw());
        assert!(Violation::ForgedCode.is_code_flaw());
        assert!(!Violation::CategoryMismatch.is_code_flaw());
        assert!(!Violation::Declared.is_code_flaw());
    }

    #[test]
    fn test_violation_parses_snake_case() {
        let v: Violation = serde_json::from_str("\"wrong_faction_code\"").unwrap();
        assert_eq!(v, Violation::WrongFactionCode);
    }
}
