//! # Checkpoint Rules
//!
//! The content bible for the checkpoint: factions, ship categories and types,
//! captains, access codes, scenario templates, consequences and day rules.
//! Everything here is loaded once and read-only afterwards; no randomness and
//! no encounter logic live in this crate.

pub mod catalog;
pub mod clock;
pub mod entities;
pub mod mechanics;
pub mod serde_day;

pub use catalog::*;
pub use clock::*;
pub use entities::*;
pub use mechanics::*;
