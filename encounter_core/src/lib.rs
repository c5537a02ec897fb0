//! # Encounter Core
//!
//! The engine behind the checkpoint. Given a day and the content catalog from
//! `checkpoint_rules`, it assembles candidate vessels whose papers, story text
//! and ground-truth verdict never contradict each other.
//!
//! ## Core Components
//!
//! - **authority**: Access codes valid on a day, faction authorization, emergency fallback
//! - **compatibility**: Directed faction relationships and ship-category authorization
//! - **scenario_selector**: Day-gated scenario pools with appearance limits and story synthesis
//! - **assembler**: Builds one encounter and verifies it against the document checks
//! - **sequencer**: Single-flight, rate-limited access to the assembler
//! - **report**: Scores a player's decision against the ground truth
//!
//! ## Design Philosophy
//!
//! - **Verdict first**: The scenario fixes approve/deny before any clue is chosen
//! - **Total**: Generation never fails; exhausted retries yield a labelled placeholder
//! - **Reproducible**: All randomness flows through a caller-supplied or seeded RNG

pub mod assembler;
pub mod authority;
pub mod compatibility;
pub mod config;
pub mod encounter;
pub mod error;
pub mod report;
pub mod scenario_selector;
pub mod sequencer;

pub use assembler::*;
pub use authority::*;
pub use compatibility::*;
pub use config::*;
pub use encounter::*;
pub use error::*;
pub use report::*;
pub use scenario_selector::*;
pub use sequencer::*;
