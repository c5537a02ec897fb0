//! Ship categories and ship types.

use serde::{Deserialize, Serialize};

use super::{FactionId, IntRange, ShipCategoryId, ShipTypeId};
use crate::mechanics::{ShipTrait, SizeClass};

/// A coarse grouping of hulls (freighters, shuttles, warships, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipCategory {
    pub id: ShipCategoryId,
    pub name: String,
    /// Factions this category is associated with when a faction states no
    /// explicit authorization either way.
    #[serde(default)]
    pub associated_factions: Vec<FactionId>,
}

impl ShipCategory {
    /// Create a ship category with no faction association.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ShipCategoryId::new(id),
            name: name.into(),
            associated_factions: Vec::new(),
        }
    }

    /// Associate a faction with this category.
    pub fn with_faction(mut self, faction: impl Into<String>) -> Self {
        self.associated_factions.push(FactionId::new(faction));
        self
    }
}

/// A concrete hull design.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipType {
    pub id: ShipTypeId,
    pub name: String,
    pub category: ShipCategoryId,
    #[serde(default)]
    pub size_class: SizeClass,
    #[serde(default = "default_crew")]
    pub crew: IntRange,

    /// Registered names individual ships of this type fly under.
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub common_origins: Vec<String>,
    #[serde(default)]
    pub valid_purposes: Vec<String>,
    #[serde(default)]
    pub suspicious_indicators: Vec<String>,

    // Story suitability
    #[serde(default)]
    pub can_be_infiltrated: bool,
    #[serde(default)]
    pub can_be_used_by_order: bool,
    #[serde(default)]
    pub can_smuggle: bool,
}

fn default_crew() -> IntRange {
    IntRange::new(1, 4)
}

impl ShipType {
    /// Create a new ship type in `category`.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: ShipTypeId::new(id),
            name: name.into(),
            category: ShipCategoryId::new(category),
            size_class: SizeClass::default(),
            crew: default_crew(),
            names: Vec::new(),
            common_origins: Vec::new(),
            valid_purposes: Vec::new(),
            suspicious_indicators: Vec::new(),
            can_be_infiltrated: false,
            can_be_used_by_order: false,
            can_smuggle: false,
        }
    }

    /// Add a common origin.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.common_origins.push(origin.into());
        self
    }

    /// Add a hull name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.names.push(name.into());
        self
    }

    /// Check a story-suitability trait.
    pub fn has_trait(&self, ship_trait: ShipTrait) -> bool {
        match ship_trait {
            ShipTrait::Infiltrated => self.can_be_infiltrated,
            ShipTrait::OrderUse => self.can_be_used_by_order,
            ShipTrait::Smuggling => self.can_smuggle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_traits() {
        let mut ship = ShipType::new("courier", "Courier", "shuttle");
        assert!(!ship.has_trait(ShipTrait::Smuggling));
        ship.can_smuggle = true;
        assert!(ship.has_trait(ShipTrait::Smuggling));
        assert!(!ship.has_trait(ShipTrait::OrderUse));
    }

    #[test]
    fn test_defaults_from_toml() {
        let ship: ShipType = toml::from_str(
            r#"
            id = "hauler"
            name = "Hauler"
            category = "freighter"
            "#,
        )
        .unwrap();
        assert_eq!(ship.crew, IntRange::new(1, 4));
        assert_eq!(ship.size_class, SizeClass::Small);
        assert!(ship.names.is_empty());
    }
}
