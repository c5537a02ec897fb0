//! Catalog record definitions.

mod access_code;
mod captain;
mod consequence;
mod faction;
mod scenario;
mod ship;

pub use access_code::*;
pub use captain::*;
pub use consequence::*;
pub use faction::*;
pub use scenario::*;
pub use ship::*;

use serde::{Deserialize, Serialize};

macro_rules! catalog_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

catalog_id!(
    /// Identifier of a faction record.
    FactionId
);
catalog_id!(
    /// Identifier of a coarse ship grouping.
    ShipCategoryId
);
catalog_id!(
    /// Identifier of a ship type.
    ShipTypeId
);
catalog_id!(
    /// Identifier of a captain type.
    CaptainTypeId
);
catalog_id!(
    /// Identifier of a scenario template.
    ScenarioId
);
catalog_id!(
    /// Identifier of a consequence record.
    ConsequenceId
);

/// Inclusive `[min, max]` integer range used by crew sizes, casualties and credits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntRange {
    pub min: u32,
    pub max: u32,
}

impl IntRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Check that `min <= max`.
    pub fn is_ordered(&self) -> bool {
        self.min <= self.max
    }

    /// Check whether `value` lies in the inclusive range.
    pub fn contains(&self, value: u32) -> bool {
        value >= self.min && value <= self.max
    }
}

impl Default for IntRange {
    fn default() -> Self {
        Self::new(0, 0)
    }
}
