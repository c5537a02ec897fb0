//! Faction compatibility matrix - relationships and ship-category authorization.
//!
//! Relationships are directed edges: `relationship_between(a, b)` reads only
//! `a`'s own lists. Nothing is symmetrized.

use std::sync::Arc;

use checkpoint_rules::{
    code_prefix, AccessCode, CodeType, ContentCatalog, Faction, FactionId, Relationship,
    ShipCategory, ShipCategoryId,
};

/// Answers which factions can plausibly fly which ships with which codes.
#[derive(Debug, Clone)]
pub struct FactionCompatibilityMatrix {
    catalog: Arc<ContentCatalog>,
}

impl FactionCompatibilityMatrix {
    /// Create a matrix over the catalog's factions and categories.
    pub fn new(catalog: Arc<ContentCatalog>) -> Self {
        Self { catalog }
    }

    /// Forbidden list, then authorized list, then the category's own
    /// faction association. Unknown factions or categories are never allowed.
    pub fn can_use_category(&self, faction: &FactionId, category: &ShipCategoryId) -> bool {
        let Some(faction) = self.catalog.get_faction(faction) else {
            return false;
        };
        faction_can_use(faction, self.catalog.get_ship_category(category), category)
    }

    /// How `a` regards `b`, read from `a`'s lists only.
    pub fn relationship_between(&self, a: &FactionId, b: &FactionId) -> Relationship {
        let (Some(from), Some(_)) = (self.catalog.get_faction(a), self.catalog.get_faction(b))
        else {
            return Relationship::Unknown;
        };
        if a == b {
            Relationship::SelfFaction
        } else if from.is_allied_with(b) {
            Relationship::Allied
        } else if from.is_hostile_to(b) {
            Relationship::Hostile
        } else {
            // Explicitly neutral and unlisted both read as neutral.
            Relationship::Neutral
        }
    }

    /// Factions able to fly `category` and present codes starting with `code_prefix`.
    pub fn compatible_factions(
        &self,
        category: &ShipCategoryId,
        code_prefix: &str,
    ) -> Vec<&Faction> {
        let record = self.catalog.get_ship_category(category);
        self.catalog
            .factions()
            .iter()
            .filter(|f| faction_can_use(f, record, category))
            .filter(|f| f.allows_prefix(code_prefix))
            .collect()
    }

    /// Prefix and allowlist checks for one faction and one code.
    ///
    /// Emergency codes pass the prefix check for factions allowed to use them.
    pub fn can_present_code(&self, faction: &Faction, code: &AccessCode) -> bool {
        let prefix_ok = faction.allows_prefix(code_prefix(&code.code))
            || (code.code_type == CodeType::Emergency && faction.can_use_emergency_codes);
        prefix_ok && code.is_authorized_for(&faction.id)
    }

    /// Categories a faction may fly.
    pub fn usable_categories(&self, faction: &FactionId) -> Vec<&ShipCategory> {
        self.catalog
            .ship_categories()
            .iter()
            .filter(|category| self.can_use_category(faction, &category.id))
            .collect()
    }

    /// Categories a faction may not fly, explicitly forbidden ones first.
    pub fn unusable_categories(&self, faction: &FactionId) -> Vec<&ShipCategory> {
        let forbidden = self
            .catalog
            .get_faction(faction)
            .map(|f| f.forbidden_ship_categories.clone())
            .unwrap_or_default();
        let mut categories: Vec<&ShipCategory> = self
            .catalog
            .ship_categories()
            .iter()
            .filter(|category| !self.can_use_category(faction, &category.id))
            .collect();
        categories.sort_by_key(|category| !forbidden.contains(&category.id));
        categories
    }

    /// Factions `faction` lists as enemies.
    pub fn hostile_factions(&self, faction: &FactionId) -> Vec<&Faction> {
        self.catalog
            .factions()
            .iter()
            .filter(|other| self.relationship_between(faction, &other.id) == Relationship::Hostile)
            .collect()
    }
}

fn faction_can_use(
    faction: &Faction,
    category: Option<&ShipCategory>,
    category_id: &ShipCategoryId,
) -> bool {
    if faction.forbidden_ship_categories.contains(category_id) {
        return false;
    }
    if faction.authorized_ship_categories.contains(category_id) {
        return true;
    }
    category.is_some_and(|c| c.associated_factions.contains(&faction.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkpoint_rules::CatalogSources;

    const FIXTURE: &str = r#"
        [[factions]]
        id = "a"
        name = "A"
        allowed_code_prefixes = ["AAA"]
        allies = ["b"]
        enemies = ["c"]
        neutral = ["d"]
        authorized_ship_categories = ["x", "y"]
        forbidden_ship_categories = ["x"]
        can_use_emergency_codes = true

        [[factions]]
        id = "b"
        name = "B"
        allowed_code_prefixes = ["BBB", "AAA"]
        enemies = ["a"]

        [[factions]]
        id = "c"
        name = "C"
        allowed_code_prefixes = ["CCC"]
        authorized_ship_categories = ["y"]

        [[factions]]
        id = "d"
        name = "D"

        [[ship_categories]]
        id = "x"
        name = "X"

        [[ship_categories]]
        id = "y"
        name = "Y"
        associated_factions = ["b"]

        [[ship_categories]]
        id = "z"
        name = "Z"

        [[ship_types]]
        id = "hull"
        name = "Hull"
        category = "y"

        [[captain_types]]
        id = "pilot"
        name = "Pilots"
        factions = ["a"]
    "#;

    fn matrix() -> FactionCompatibilityMatrix {
        let catalog =
            ContentCatalog::load(&CatalogSources::new().with_toml("fixture", FIXTURE)).unwrap();
        FactionCompatibilityMatrix::new(Arc::new(catalog))
    }

    fn id(s: &str) -> FactionId {
        FactionId::new(s)
    }

    #[test]
    fn test_forbidden_wins_over_authorized() {
        assert!(!matrix().can_use_category(&id("a"), &ShipCategoryId::new("x")));
    }

    #[test]
    fn test_authorized_and_association_fallback() {
        let m = matrix();
        assert!(m.can_use_category(&id("a"), &ShipCategoryId::new("y")));
        // b states nothing about y, but y is associated with b
        assert!(m.can_use_category(&id("b"), &ShipCategoryId::new("y")));
        assert!(!m.can_use_category(&id("b"), &ShipCategoryId::new("z")));
        assert!(!m.can_use_category(&id("ghost"), &ShipCategoryId::new("y")));
    }

    #[test]
    fn test_relationship_precedence_and_direction() {
        let m = matrix();
        assert_eq!(m.relationship_between(&id("a"), &id("a")), Relationship::SelfFaction);
        assert_eq!(m.relationship_between(&id("a"), &id("b")), Relationship::Allied);
        // b lists a as an enemy; a's ally list is not consulted
        assert_eq!(m.relationship_between(&id("b"), &id("a")), Relationship::Hostile);
        assert_eq!(m.relationship_between(&id("a"), &id("c")), Relationship::Hostile);
        assert_eq!(m.relationship_between(&id("c"), &id("a")), Relationship::Neutral);
        assert_eq!(m.relationship_between(&id("a"), &id("d")), Relationship::Neutral);
        assert_eq!(m.relationship_between(&id("a"), &id("ghost")), Relationship::Unknown);
    }

    #[test]
    fn test_compatible_factions_intersects_filters() {
        let m = matrix();
        let names: Vec<_> = m
            .compatible_factions(&ShipCategoryId::new("y"), "AAA")
            .iter()
            .map(|f| f.id.as_str())
            .collect();
        assert_eq!(names, vec!["a", "b"]);

        let names: Vec<_> = m
            .compatible_factions(&ShipCategoryId::new("y"), "CCC")
            .iter()
            .map(|f| f.id.as_str())
            .collect();
        assert_eq!(names, vec!["c"]);
        assert!(m.compatible_factions(&ShipCategoryId::new("x"), "AAA").is_empty());
    }

    fn faction<'m>(m: &'m FactionCompatibilityMatrix, s: &str) -> &'m Faction {
        m.catalog.get_faction(&id(s)).unwrap()
    }

    #[test]
    fn test_code_allowlist_and_emergency() {
        let m = matrix();
        let restricted = AccessCode::new("AAA-1", 0, None).with_faction("a");
        assert!(m.can_present_code(faction(&m, "a"), &restricted));
        // b allows the AAA prefix but is not on the allowlist
        assert!(!m.can_present_code(faction(&m, "b"), &restricted));

        let emergency = AccessCode::new("EMG-1", 0, None).with_type(CodeType::Emergency);
        assert!(m.can_present_code(faction(&m, "a"), &emergency));
        assert!(!m.can_present_code(faction(&m, "b"), &emergency));
    }

    #[test]
    fn test_hostile_factions_are_directed() {
        let m = matrix();
        let ids = |f: &str| -> Vec<String> {
            m.hostile_factions(&id(f))
                .iter()
                .map(|other| other.id.as_str().to_string())
                .collect()
        };
        assert_eq!(ids("a"), vec!["c"]);
        assert_eq!(ids("b"), vec!["a"]);
        assert!(ids("c").is_empty());
        assert!(ids("ghost").is_empty());
    }

    #[test]
    fn test_usable_categories() {
        let m = matrix();
        let ids: Vec<_> = m
            .usable_categories(&id("a"))
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids, vec!["y"]);
        assert!(m.usable_categories(&id("d")).is_empty());
    }

    #[test]
    fn test_unusable_categories_put_forbidden_first() {
        let m = matrix();
        let ids: Vec<_> = m
            .unusable_categories(&id("a"))
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids, vec!["x", "z"]);
    }
}
