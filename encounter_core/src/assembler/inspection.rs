//! Document checks shared by assembly and the player-facing explanation.

use serde::{Deserialize, Serialize};

use checkpoint_rules::{code_prefix, Faction, RuleClock, ShipType, Violation};

use crate::authority::AccessCodeAuthority;
use crate::compatibility::FactionCompatibilityMatrix;

/// What the inspector sees on the vessel's papers.
#[derive(Debug, Clone, Copy)]
pub struct Documents<'a> {
    pub day: u32,
    pub code: &'a str,
    pub faction: &'a Faction,
    pub ship_type: &'a ShipType,
    pub origin: &'a str,
}

/// One failed check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub violation: Violation,
    pub detail: String,
}

impl Issue {
    /// Create an issue.
    pub fn new(violation: Violation, detail: impl Into<String>) -> Self {
        Self {
            violation,
            detail: detail.into(),
        }
    }
}

/// Ordered list of reasons a vessel fails inspection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationExplanation {
    pub issues: Vec<Issue>,
}

impl ValidationExplanation {
    /// Check that no issue was found.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Append an issue.
    pub fn push(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    /// Violations in check order.
    pub fn violations(&self) -> Vec<Violation> {
        self.issues.iter().map(|issue| issue.violation).collect()
    }

    /// True when the only problem is `violation`.
    pub fn is_only(&self, violation: Violation) -> bool {
        matches!(self.issues.as_slice(), [issue] if issue.violation == violation)
    }

    /// Human-readable lines, one per issue.
    pub fn lines(&self) -> Vec<String> {
        self.issues
            .iter()
            .map(|issue| format!("{}: {}", issue.violation.label(), issue.detail))
            .collect()
    }
}

/// Run every document check in a fixed order.
///
/// An unregistered code yields a single forged-code issue and skips the
/// remaining code checks. A revoked code is not also reported as out of window.
pub fn inspect(
    docs: &Documents<'_>,
    authority: &AccessCodeAuthority,
    matrix: &FactionCompatibilityMatrix,
    rules: &RuleClock,
) -> ValidationExplanation {
    let mut explanation = ValidationExplanation::default();

    match authority.lookup(docs.code) {
        None => explanation.push(Issue::new(
            Violation::ForgedCode,
            format!("{} does not appear in the code registry", docs.code),
        )),
        Some(record) => {
            if record.revoked {
                explanation.push(Issue::new(
                    Violation::RevokedCode,
                    format!("{} was revoked by command", record.code),
                ));
            } else if record.window.has_expired_by(docs.day) {
                explanation.push(Issue::new(
                    Violation::ExpiredCode,
                    format!("{} expired before day {}", record.code, docs.day),
                ));
            } else if record.window.opens_after(docs.day) {
                explanation.push(Issue::new(
                    Violation::InactiveCode,
                    format!("{} is not active until day {}", record.code, record.window.from),
                ));
            }

            if !matrix.can_present_code(docs.faction, record) {
                let detail = if record.is_authorized_for(&docs.faction.id) {
                    format!(
                        "{} may not present {}-series codes",
                        docs.faction.name,
                        code_prefix(&record.code)
                    )
                } else {
                    format!("{} is not issued to {}", record.code, docs.faction.name)
                };
                explanation.push(Issue::new(Violation::WrongFactionCode, detail));
            }
        }
    }

    if !matrix.can_use_category(&docs.faction.id, &docs.ship_type.category) {
        explanation.push(Issue::new(
            Violation::CategoryMismatch,
            format!(
                "{} is not cleared to fly a {}",
                docs.faction.name, docs.ship_type.name
            ),
        ));
    }

    if rules.is_origin_banned(docs.origin, docs.day) {
        explanation.push(Issue::new(
            Violation::BannedOrigin,
            format!("{} is closed to traffic as of day {}", docs.origin, docs.day),
        ));
    }

    explanation
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkpoint_rules::{ContentCatalog, FactionId, ShipTypeId};
    use std::sync::Arc;

    struct Fixture {
        catalog: Arc<ContentCatalog>,
        authority: AccessCodeAuthority,
        matrix: FactionCompatibilityMatrix,
    }

    fn fixture() -> Fixture {
        let catalog = Arc::new(ContentCatalog::builtin().unwrap());
        Fixture {
            authority: AccessCodeAuthority::new(catalog.clone()),
            matrix: FactionCompatibilityMatrix::new(catalog.clone()),
            catalog,
        }
    }

    fn check(
        f: &Fixture,
        day: u32,
        code: &str,
        faction: &str,
        ship: &str,
        origin: &str,
    ) -> ValidationExplanation {
        let faction = f.catalog.get_faction(&FactionId::new(faction)).unwrap();
        let ship_type = f.catalog.get_ship_type(&ShipTypeId::new(ship)).unwrap();
        let docs = Documents {
            day,
            code,
            faction,
            ship_type,
            origin,
        };
        inspect(&docs, &f.authority, &f.matrix, f.catalog.rule_clock())
    }

    #[test]
    fn test_clean_papers() {
        let f = fixture();
        let explanation = check(&f, 1, "IMP-7741", "imperium", "lambda_shuttle", "Core Worlds");
        assert!(explanation.is_clean());
    }

    #[test]
    fn test_each_flaw_alone() {
        let f = fixture();
        let cases = [
            (4, "IMP-3302", "imperium", "lambda_shuttle", "Core Worlds", Violation::ExpiredCode),
            (1, "IMP-9120", "imperium", "lambda_shuttle", "Core Worlds", Violation::RevokedCode),
            (1, "IMP-5518", "imperium", "lambda_shuttle", "Core Worlds", Violation::InactiveCode),
            (1, "IMP-7472", "imperium", "lambda_shuttle", "Core Worlds", Violation::ForgedCode),
            (
                1,
                "ORD-1138",
                "imperium",
                "lambda_shuttle",
                "Core Worlds",
                Violation::WrongFactionCode,
            ),
            (1, "ORD-1138", "order", "bulk_hauler", "Core Worlds", Violation::CategoryMismatch),
            (3, "IMP-7741", "imperium", "lambda_shuttle", "Kessa Drift", Violation::BannedOrigin),
        ];
        for (day, code, faction, ship, origin, expected) in cases {
            let explanation = check(&f, day, code, faction, ship, origin);
            assert!(explanation.is_only(expected), "{code}: {:?}", explanation.violations());
        }
    }

    #[test]
    fn test_emergency_code_needs_faction_permission() {
        let f = fixture();
        assert!(check(&f, 3, "EMG-9999", "imperium", "lambda_shuttle", "Core Worlds").is_clean());
        let explanation =
            check(&f, 3, "EMG-9999", "merchant_league", "bulk_hauler", "Vantor Station");
        assert!(explanation.is_only(Violation::WrongFactionCode));
    }

    #[test]
    fn test_lines_are_ordered() {
        let f = fixture();
        let explanation =
            check(&f, 4, "IMP-3302", "merchant_league", "vigil_frigate", "Kessa Drift");
        assert_eq!(
            explanation.violations(),
            vec![
                Violation::ExpiredCode,
                Violation::WrongFactionCode,
                Violation::CategoryMismatch,
                Violation::BannedOrigin,
            ]
        );
        assert!(explanation.lines()[0].starts_with("expired access code: "));
    }
}
