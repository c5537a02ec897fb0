//! Content catalog - immutable registries loaded once at startup.
//!
//! Loading is all-or-nothing: every source is parsed, merged, and checked for
//! unresolved cross references and malformed records before a catalog exists.

mod error;

pub use error::*;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;
use tracing::{info, warn};

use crate::clock::{DayRule, RuleClock};
use crate::entities::{
    AccessCode, CaptainType, CaptainTypeId, Consequence, ConsequenceId, Faction, FactionId,
    ScenarioId, ShipCategory, ShipCategoryId, ShipScenario, ShipType, ShipTypeId,
};
use crate::mechanics::{ConsequenceTrigger, ScenarioType, ShipTrait};

const DEFAULT_CATALOG: &str = include_str!("default_catalog.toml");

/// Records that can be stored in a registry.
pub trait Keyed {
    type Key: Eq + Hash + Clone;
    fn key(&self) -> &Self::Key;
}

impl Keyed for Faction {
    type Key = FactionId;
    fn key(&self) -> &FactionId {
        &self.id
    }
}

impl Keyed for ShipCategory {
    type Key = ShipCategoryId;
    fn key(&self) -> &ShipCategoryId {
        &self.id
    }
}

impl Keyed for ShipType {
    type Key = ShipTypeId;
    fn key(&self) -> &ShipTypeId {
        &self.id
    }
}

impl Keyed for CaptainType {
    type Key = CaptainTypeId;
    fn key(&self) -> &CaptainTypeId {
        &self.id
    }
}

impl Keyed for AccessCode {
    type Key = String;
    fn key(&self) -> &String {
        &self.code
    }
}

impl Keyed for ShipScenario {
    type Key = ScenarioId;
    fn key(&self) -> &ScenarioId {
        &self.id
    }
}

impl Keyed for Consequence {
    type Key = ConsequenceId;
    fn key(&self) -> &ConsequenceId {
        &self.id
    }
}

/// Load-ordered storage with an O(1) id index.
///
/// Iteration follows load order, so seeded draws over a registry are stable.
#[derive(Debug, Clone)]
pub struct Registry<T: Keyed> {
    items: Vec<T>,
    index: HashMap<T::Key, usize>,
}

impl<T: Keyed> Default for Registry<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: Keyed> Registry<T> {
    /// Build a registry, returning the keys that appeared more than once.
    fn build(items: Vec<T>) -> (Self, Vec<T::Key>) {
        let mut registry = Self::default();
        let mut duplicates = Vec::new();
        for item in items {
            let key = item.key().clone();
            if registry.index.contains_key(&key) {
                duplicates.push(key);
                continue;
            }
            registry.index.insert(key, registry.items.len());
            registry.items.push(item);
        }
        (registry, duplicates)
    }

    /// Get a record by key.
    pub fn get(&self, key: &T::Key) -> Option<&T> {
        self.index.get(key).map(|&i| &self.items[i])
    }

    pub fn contains(&self, key: &T::Key) -> bool {
        self.index.contains_key(key)
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Binds a story tag to the faction that canonically flies it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryTagBinding {
    pub tag: String,
    pub faction: FactionId,
    /// Restricts ship types to those carrying this story trait.
    #[serde(default)]
    pub ship_trait: Option<ShipTrait>,
}

/// Format of a catalog source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Toml,
    Json,
}

#[derive(Debug, Clone)]
struct CatalogSource {
    name: String,
    format: SourceFormat,
    text: String,
}

/// Ordered catalog sources. Later sources append records to earlier ones.
#[derive(Debug, Clone, Default)]
pub struct CatalogSources {
    sources: Vec<CatalogSource>,
}

impl CatalogSources {
    /// Create an empty source list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a TOML source.
    pub fn with_toml(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.sources.push(CatalogSource {
            name: name.into(),
            format: SourceFormat::Toml,
            text: text.into(),
        });
        self
    }

    /// Append a JSON source.
    pub fn with_json(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.sources.push(CatalogSource {
            name: name.into(),
            format: SourceFormat::Json,
            text: text.into(),
        });
        self
    }

    /// The bundled default content.
    pub fn builtin() -> Self {
        Self::new().with_toml("default_catalog.toml", DEFAULT_CATALOG)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// On-disk shape of one catalog source.
#[derive(Debug, Default, Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    factions: Vec<Faction>,
    #[serde(default)]
    ship_categories: Vec<ShipCategory>,
    #[serde(default)]
    ship_types: Vec<ShipType>,
    #[serde(default)]
    captain_types: Vec<CaptainType>,
    #[serde(default)]
    access_codes: Vec<AccessCode>,
    #[serde(default)]
    scenarios: Vec<ShipScenario>,
    #[serde(default)]
    consequences: Vec<Consequence>,
    #[serde(default)]
    day_rules: Vec<DayRule>,
    #[serde(default)]
    story_tags: Vec<StoryTagBinding>,
    #[serde(default)]
    destinations: Vec<String>,
}

impl CatalogDocument {
    fn parse(source: &CatalogSource) -> Result<Self, CatalogError> {
        let parsed = match source.format {
            SourceFormat::Toml => toml::from_str(&source.text).map_err(|e| e.to_string()),
            SourceFormat::Json => serde_json::from_str(&source.text).map_err(|e| e.to_string()),
        };
        parsed.map_err(|message| CatalogError::Parse {
            source_name: source.name.clone(),
            message,
        })
    }

    fn merge(&mut self, other: CatalogDocument) {
        self.factions.extend(other.factions);
        self.ship_categories.extend(other.ship_categories);
        self.ship_types.extend(other.ship_types);
        self.captain_types.extend(other.captain_types);
        self.access_codes.extend(other.access_codes);
        self.scenarios.extend(other.scenarios);
        self.consequences.extend(other.consequences);
        self.day_rules.extend(other.day_rules);
        self.story_tags.extend(other.story_tags);
        self.destinations.extend(other.destinations);
    }
}

/// The complete, validated content of the game.
#[derive(Debug, Clone)]
pub struct ContentCatalog {
    factions: Registry<Faction>,
    ship_categories: Registry<ShipCategory>,
    ship_types: Registry<ShipType>,
    captain_types: Registry<CaptainType>,
    access_codes: Registry<AccessCode>,
    scenarios: Registry<ShipScenario>,
    consequences: Registry<Consequence>,
    story_tags: Vec<StoryTagBinding>,
    destinations: Vec<String>,
    rule_clock: RuleClock,
}

impl ContentCatalog {
    /// Parse, merge and validate every source.
    pub fn load(sources: &CatalogSources) -> Result<Self, CatalogError> {
        let mut document = CatalogDocument::default();
        for source in &sources.sources {
            document.merge(CatalogDocument::parse(source)?);
        }
        Self::from_document(document)
    }

    /// Load the bundled default content.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::load(&CatalogSources::builtin())
    }

    fn from_document(document: CatalogDocument) -> Result<Self, CatalogError> {
        let mut invalid = Vec::new();

        let (factions, dup) = Registry::build(document.factions);
        invalid.extend(dup.iter().map(|id| duplicate("faction", id.as_str())));
        let (ship_categories, dup) = Registry::build(document.ship_categories);
        invalid.extend(dup.iter().map(|id| duplicate("ship_category", id.as_str())));
        let (ship_types, dup) = Registry::build(document.ship_types);
        invalid.extend(dup.iter().map(|id| duplicate("ship_type", id.as_str())));
        let (captain_types, dup) = Registry::build(document.captain_types);
        invalid.extend(dup.iter().map(|id| duplicate("captain_type", id.as_str())));
        let (access_codes, dup) = Registry::build(document.access_codes);
        invalid.extend(dup.iter().map(|code| duplicate("access_code", code)));
        let (scenarios, dup) = Registry::build(document.scenarios);
        invalid.extend(dup.iter().map(|id| duplicate("scenario", id.as_str())));
        let (consequences, dup) = Registry::build(document.consequences);
        invalid.extend(dup.iter().map(|id| duplicate("consequence", id.as_str())));

        let destinations = if document.destinations.is_empty() {
            vec!["Command Station".to_string()]
        } else {
            document.destinations
        };

        let catalog = Self {
            factions,
            ship_categories,
            ship_types,
            captain_types,
            access_codes,
            scenarios,
            consequences,
            story_tags: document.story_tags,
            destinations,
            rule_clock: RuleClock::new(document.day_rules),
        };

        let unresolved = catalog.unresolved_references();
        invalid.extend(catalog.invalid_records());
        let empty_pool = catalog.first_empty_pool();

        if !unresolved.is_empty() {
            for record in &invalid {
                warn!(record = %record, "invalid catalog record");
            }
            warn_empty_pool(empty_pool);
            return Err(CatalogError::Unresolved(unresolved));
        }
        if !invalid.is_empty() {
            warn_empty_pool(empty_pool);
            return Err(CatalogError::InvalidRecords(invalid));
        }
        if let Some(pool) = empty_pool {
            return Err(CatalogError::EmptyPool(pool));
        }

        info!(
            factions = catalog.factions.len(),
            ship_types = catalog.ship_types.len(),
            access_codes = catalog.access_codes.len(),
            scenarios = catalog.scenarios.len(),
            day_rules = catalog.rule_clock.rules().len(),
            "content catalog loaded"
        );
        Ok(catalog)
    }

    fn unresolved_references(&self) -> Vec<UnresolvedRef> {
        let mut missing = Vec::new();
        let mut check_faction = |owner: String, field: &'static str, id: &FactionId| {
            if !self.factions.contains(id) {
                missing.push(UnresolvedRef {
                    owner,
                    field,
                    missing: id.to_string(),
                });
            }
        };

        for faction in self.factions.as_slice() {
            let owner = format!("faction:{}", faction.id);
            for id in &faction.allies {
                check_faction(owner.clone(), "allies", id);
            }
            for id in &faction.enemies {
                check_faction(owner.clone(), "enemies", id);
            }
            for id in &faction.neutral {
                check_faction(owner.clone(), "neutral", id);
            }
        }
        for category in self.ship_categories.as_slice() {
            for id in &category.associated_factions {
                check_faction(
                    format!("ship_category:{}", category.id),
                    "associated_factions",
                    id,
                );
            }
        }
        for captain_type in self.captain_types.as_slice() {
            for id in &captain_type.factions {
                check_faction(format!("captain_type:{}", captain_type.id), "factions", id);
            }
        }
        for code in self.access_codes.as_slice() {
            for id in &code.authorized_factions {
                check_faction(
                    format!("access_code:{}", code.code),
                    "authorized_factions",
                    id,
                );
            }
        }
        for binding in &self.story_tags {
            check_faction(
                format!("story_tag:{}", binding.tag),
                "faction",
                &binding.faction,
            );
        }

        for faction in self.factions.as_slice() {
            let owner = format!("faction:{}", faction.id);
            for id in faction
                .authorized_ship_categories
                .iter()
                .map(|id| ("authorized_ship_categories", id))
                .chain(
                    faction
                        .forbidden_ship_categories
                        .iter()
                        .map(|id| ("forbidden_ship_categories", id)),
                )
            {
                if !self.ship_categories.contains(id.1) {
                    missing.push(UnresolvedRef {
                        owner: owner.clone(),
                        field: id.0,
                        missing: id.1.to_string(),
                    });
                }
            }
        }
        for ship_type in self.ship_types.as_slice() {
            if !self.ship_categories.contains(&ship_type.category) {
                missing.push(UnresolvedRef {
                    owner: format!("ship_type:{}", ship_type.id),
                    field: "category",
                    missing: ship_type.category.to_string(),
                });
            }
        }
        for code in self.access_codes.as_slice() {
            if let Some(target) = &code.mimics {
                if !self.access_codes.contains(target) {
                    missing.push(UnresolvedRef {
                        owner: format!("access_code:{}", code.code),
                        field: "mimics",
                        missing: target.clone(),
                    });
                }
            }
        }
        missing
    }

    fn invalid_records(&self) -> Vec<InvalidRecord> {
        let mut invalid = Vec::new();
        for faction in self.factions.as_slice() {
            for scalar in faction.out_of_range_scalars() {
                invalid.push(InvalidRecord {
                    id: format!("faction:{}", faction.id),
                    reason: format!("{scalar} must be within [0, 1]"),
                });
            }
        }
        for ship_type in self.ship_types.as_slice() {
            if !ship_type.crew.is_ordered() {
                invalid.push(InvalidRecord {
                    id: format!("ship_type:{}", ship_type.id),
                    reason: "crew range min exceeds max".to_string(),
                });
            }
        }
        for scenario in self.scenarios.as_slice() {
            let id = format!("scenario:{}", scenario.id);
            if !scenario.should_be_approved && scenario.invalid_reason.trim().is_empty() {
                invalid.push(InvalidRecord {
                    id: id.clone(),
                    reason: "denied scenario needs an invalid_reason".to_string(),
                });
            }
            match scenario.scenario_type {
                ScenarioType::Standard if !scenario.should_be_approved => {
                    invalid.push(InvalidRecord {
                        id: id.clone(),
                        reason: "standard scenarios must be approvable".to_string(),
                    });
                }
                ScenarioType::Invalid if scenario.should_be_approved => {
                    invalid.push(InvalidRecord {
                        id: id.clone(),
                        reason: "invalid scenarios must be denied".to_string(),
                    });
                }
                ScenarioType::StoryEvent if scenario.story_tag.is_none() => {
                    invalid.push(InvalidRecord {
                        id: id.clone(),
                        reason: "story scenarios need a story_tag".to_string(),
                    });
                }
                _ => {}
            }
            let ranges = [scenario.casualties, scenario.credit_penalty];
            if ranges.iter().flatten().any(|range| !range.is_ordered()) {
                invalid.push(InvalidRecord {
                    id,
                    reason: "range min exceeds max".to_string(),
                });
            }
        }
        for consequence in self.consequences.as_slice() {
            if !consequence.casualties.is_ordered() || !consequence.credit_penalty.is_ordered() {
                invalid.push(InvalidRecord {
                    id: format!("consequence:{}", consequence.id),
                    reason: "range min exceeds max".to_string(),
                });
            }
        }
        invalid
    }

    fn first_empty_pool(&self) -> Option<&'static str> {
        if self.factions.is_empty() {
            Some("factions")
        } else if self.ship_categories.is_empty() {
            Some("ship_categories")
        } else if self.ship_types.is_empty() {
            Some("ship_types")
        } else if self.captain_types.is_empty() {
            Some("captain_types")
        } else {
            None
        }
    }

    /// Get faction by ID.
    pub fn get_faction(&self, id: &FactionId) -> Option<&Faction> {
        self.factions.get(id)
    }

    /// Get faction by ID, or a [`NotFound`] error.
    pub fn try_faction(&self, id: &FactionId) -> Result<&Faction, NotFound> {
        self.get_faction(id)
            .ok_or_else(|| NotFound::new("faction", id.as_str()))
    }

    /// Get ship category by ID.
    pub fn get_ship_category(&self, id: &ShipCategoryId) -> Option<&ShipCategory> {
        self.ship_categories.get(id)
    }

    /// Get ship type by ID.
    pub fn get_ship_type(&self, id: &ShipTypeId) -> Option<&ShipType> {
        self.ship_types.get(id)
    }

    /// Get ship type by ID, or a [`NotFound`] error.
    pub fn try_ship_type(&self, id: &ShipTypeId) -> Result<&ShipType, NotFound> {
        self.get_ship_type(id)
            .ok_or_else(|| NotFound::new("ship_type", id.as_str()))
    }

    /// Get captain type by ID.
    pub fn get_captain_type(&self, id: &CaptainTypeId) -> Option<&CaptainType> {
        self.captain_types.get(id)
    }

    /// Get an access code record by its code string.
    pub fn get_access_code(&self, code: &str) -> Option<&AccessCode> {
        self.access_codes.get(&code.to_string())
    }

    /// Get an access code record, or a [`NotFound`] error.
    pub fn try_access_code(&self, code: &str) -> Result<&AccessCode, NotFound> {
        self.get_access_code(code)
            .ok_or_else(|| NotFound::new("access_code", code))
    }

    /// Get scenario by ID.
    pub fn get_scenario(&self, id: &ScenarioId) -> Option<&ShipScenario> {
        self.scenarios.get(id)
    }

    /// Get consequence by ID.
    pub fn get_consequence(&self, id: &ConsequenceId) -> Option<&Consequence> {
        self.consequences.get(id)
    }

    /// All factions in load order.
    pub fn factions(&self) -> &[Faction] {
        self.factions.as_slice()
    }

    /// All ship categories in load order.
    pub fn ship_categories(&self) -> &[ShipCategory] {
        self.ship_categories.as_slice()
    }

    /// All ship types in load order.
    pub fn ship_types(&self) -> &[ShipType] {
        self.ship_types.as_slice()
    }

    /// Ship types belonging to a category.
    pub fn ship_types_in(&self, category: &ShipCategoryId) -> Vec<&ShipType> {
        self.ship_types
            .as_slice()
            .iter()
            .filter(|ship| &ship.category == category)
            .collect()
    }

    /// All captain types in load order.
    pub fn captain_types(&self) -> &[CaptainType] {
        self.captain_types.as_slice()
    }

    /// Captain types serving a faction.
    pub fn captain_types_for(&self, faction: &FactionId) -> Vec<&CaptainType> {
        self.captain_types
            .as_slice()
            .iter()
            .filter(|captain_type| {
                captain_type.serves(faction) && !captain_type.captains.is_empty()
            })
            .collect()
    }

    /// Every registered access code, valid or not.
    pub fn access_codes(&self) -> &[AccessCode] {
        self.access_codes.as_slice()
    }

    /// All scenarios in load order.
    pub fn scenarios(&self) -> &[ShipScenario] {
        self.scenarios.as_slice()
    }

    /// All consequences in load order.
    pub fn consequences(&self) -> &[Consequence] {
        self.consequences.as_slice()
    }

    /// Consequences that apply to a kind of wrong call.
    pub fn consequences_for(&self, trigger: ConsequenceTrigger) -> Vec<&Consequence> {
        self.consequences
            .as_slice()
            .iter()
            .filter(|c| c.trigger == trigger)
            .collect()
    }

    /// Get the binding for a story tag, ignoring case.
    pub fn story_binding(&self, tag: &str) -> Option<&StoryTagBinding> {
        self.story_tags
            .iter()
            .find(|binding| binding.tag.eq_ignore_ascii_case(tag))
    }

    /// All story tag bindings.
    pub fn story_tags(&self) -> &[StoryTagBinding] {
        &self.story_tags
    }

    /// Destinations a vessel may declare.
    pub fn destinations(&self) -> &[String] {
        &self.destinations
    }

    /// Day rules for the whole campaign.
    pub fn rule_clock(&self) -> &RuleClock {
        &self.rule_clock
    }
}

fn duplicate(kind: &str, id: &str) -> InvalidRecord {
    InvalidRecord {
        id: format!("{kind}:{id}"),
        reason: "duplicate id".to_string(),
    }
}

fn warn_empty_pool(pool: Option<&'static str>) {
    if let Some(pool) = pool {
        warn!(pool, "required catalog pool is empty");
    }
}
