//! Captain types and named captains.

use serde::{Deserialize, Serialize};

use super::{CaptainTypeId, FactionId};

/// A named captain within a captain type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Captain {
    pub name: String,
    pub rank: String,
    /// Higher is more senior. Used for rank display only.
    #[serde(default)]
    pub authority_level: u32,
}

impl Captain {
    /// Create a new captain.
    pub fn new(name: impl Into<String>, rank: impl Into<String>, authority_level: u32) -> Self {
        Self {
            name: name.into(),
            rank: rank.into(),
            authority_level,
        }
    }
}

/// A pool of captains serving one or more factions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptainType {
    pub id: CaptainTypeId,
    pub name: String,
    pub factions: Vec<FactionId>,
    #[serde(default)]
    pub captains: Vec<Captain>,
}

impl CaptainType {
    /// Create an empty captain type.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: CaptainTypeId::new(id),
            name: name.into(),
            factions: Vec::new(),
            captains: Vec::new(),
        }
    }

    /// Add a faction this captain type serves.
    pub fn with_faction(mut self, faction: impl Into<String>) -> Self {
        self.factions.push(FactionId::new(faction));
        self
    }

    /// Add a captain to the pool.
    pub fn with_captain(mut self, captain: Captain) -> Self {
        self.captains.push(captain);
        self
    }

    /// Check whether this captain type serves `faction`.
    pub fn serves(&self, faction: &FactionId) -> bool {
        self.factions.contains(faction)
    }
}
