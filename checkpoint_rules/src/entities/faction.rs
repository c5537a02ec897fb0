//! Faction definitions.

use serde::{Deserialize, Serialize};

use super::{FactionId, ShipCategoryId};

/// A named party that sends ships to the checkpoint.
///
/// Relation lists are directed: a faction listing another as an ally says
/// nothing about how the other faction regards it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Faction {
    pub id: FactionId,
    pub name: String,

    /// Prefixes (text before the first `-`) of codes this faction may present.
    #[serde(default)]
    pub allowed_code_prefixes: Vec<String>,
    #[serde(default)]
    pub can_use_emergency_codes: bool,

    #[serde(default)]
    pub allies: Vec<FactionId>,
    #[serde(default)]
    pub enemies: Vec<FactionId>,
    #[serde(default)]
    pub neutral: Vec<FactionId>,

    #[serde(default)]
    pub authorized_ship_categories: Vec<ShipCategoryId>,
    #[serde(default)]
    pub forbidden_ship_categories: Vec<ShipCategoryId>,

    // Behavioural scalars, each in [0, 1]
    #[serde(default = "default_protocol_adherence")]
    pub protocol_adherence: f32,
    #[serde(default)]
    pub contraband_probability: f32,
    #[serde(default)]
    pub base_suspicion: f32,

    #[serde(default)]
    pub flags: FactionFlags,
}

fn default_protocol_adherence() -> f32 {
    0.5
}

/// Special handling flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactionFlags {
    #[serde(default)]
    pub diplomatic_immunity: bool,
    #[serde(default)]
    pub search_exempt: bool,
    #[serde(default)]
    pub priority_access: bool,
    #[serde(default)]
    pub infiltration_eligible: bool,
}

impl Faction {
    /// Create a faction with no permissions and neutral scalars.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: FactionId::new(id),
            name: name.into(),
            allowed_code_prefixes: Vec::new(),
            can_use_emergency_codes: false,
            allies: Vec::new(),
            enemies: Vec::new(),
            neutral: Vec::new(),
            authorized_ship_categories: Vec::new(),
            forbidden_ship_categories: Vec::new(),
            protocol_adherence: default_protocol_adherence(),
            contraband_probability: 0.0,
            base_suspicion: 0.0,
            flags: FactionFlags::default(),
        }
    }

    /// Add an access code prefix the faction may present.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.allowed_code_prefixes.push(prefix.into());
        self
    }

    /// Authorize a ship category.
    pub fn with_authorized_category(mut self, category: impl Into<String>) -> Self {
        self.authorized_ship_categories
            .push(ShipCategoryId::new(category));
        self
    }

    /// Forbid a ship category. Forbidden beats authorized.
    pub fn with_forbidden_category(mut self, category: impl Into<String>) -> Self {
        self.forbidden_ship_categories
            .push(ShipCategoryId::new(category));
        self
    }

    /// Add an ally.
    pub fn with_ally(mut self, faction: impl Into<String>) -> Self {
        self.allies.push(FactionId::new(faction));
        self
    }

    /// Add an enemy.
    pub fn with_enemy(mut self, faction: impl Into<String>) -> Self {
        self.enemies.push(FactionId::new(faction));
        self
    }

    /// Check whether a code prefix is one this faction may present.
    pub fn allows_prefix(&self, prefix: &str) -> bool {
        self.allowed_code_prefixes
            .iter()
            .any(|p| p.eq_ignore_ascii_case(prefix))
    }

    /// Only inspects this faction's own ally list.
    pub fn is_allied_with(&self, other: &FactionId) -> bool {
        self.allies.contains(other)
    }

    /// Only inspects this faction's own enemy list.
    pub fn is_hostile_to(&self, other: &FactionId) -> bool {
        self.enemies.contains(other)
    }

    /// Names of scalars outside `[0, 1]`, for catalog validation.
    pub fn out_of_range_scalars(&self) -> Vec<&'static str> {
        [
            ("protocol_adherence", self.protocol_adherence),
            ("contraband_probability", self.contraband_probability),
            ("base_suspicion", self.base_suspicion),
        ]
        .into_iter()
        .filter(|(_, value)| !(0.0..=1.0).contains(value))
        .map(|(name, _)| name)
        .collect()
    }
}
