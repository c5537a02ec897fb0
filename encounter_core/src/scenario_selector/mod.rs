//! Scenario selector - day-gated picks from the standard, invalid and story pools.
//!
//! Every `pick*` bumps the scenario's appearance counter exactly once. The
//! `choose*` variants leave counting to the caller, who records the appearance
//! only once the scenario was really shown ([`ScenarioSelector::record_appearance`]).
//! A scenario whose counter reached its `max_appearances` is never picked again.

pub mod synthesis;

pub use synthesis::*;

use std::collections::HashMap;

use checkpoint_rules::{ContentCatalog, ScenarioId, ScenarioType, ShipScenario};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info};

/// Picks scenarios and tracks how often each one appeared.
#[derive(Debug, Clone, Default)]
pub struct ScenarioSelector {
    standard: Vec<ShipScenario>,
    invalid: Vec<ShipScenario>,
    story: Vec<ShipScenario>,
    appearances: HashMap<ScenarioId, u32>,
}

impl ScenarioSelector {
    /// Create a selector over `scenarios`, sorted into their pools.
    pub fn new(scenarios: impl IntoIterator<Item = ShipScenario>) -> Self {
        let mut selector = Self::default();
        for scenario in scenarios {
            selector.register(scenario);
        }
        selector
    }

    /// Create a selector over every catalog scenario.
    pub fn from_catalog(catalog: &ContentCatalog) -> Self {
        Self::new(catalog.scenarios().iter().cloned())
    }

    /// Add a scenario to its pool. Ids already present are ignored.
    pub fn register(&mut self, scenario: ShipScenario) {
        let kind = pool_kind(&scenario);
        let pool = self.pool_mut(kind);
        if pool.iter().any(|s| s.id == scenario.id) {
            return;
        }
        pool.push(scenario);
    }

    /// Registered scenarios of one kind.
    pub fn scenarios(&self, kind: ScenarioType) -> &[ShipScenario] {
        self.pool(kind)
    }

    /// Uniform pick among day-eligible scenarios of `kind`.
    pub fn pick<R: Rng + ?Sized>(
        &mut self,
        kind: ScenarioType,
        day: u32,
        rng: &mut R,
    ) -> ShipScenario {
        self.pick_matching(kind, day, |_| true, rng)
    }

    /// Like [`Self::pick`], restricted to scenarios accepted by `filter`.
    ///
    /// Standard and invalid picks fall back to any non-exhausted match when
    /// nothing is day-eligible; story picks never ignore day gating.
    pub fn pick_matching<R, F>(
        &mut self,
        kind: ScenarioType,
        day: u32,
        filter: F,
        rng: &mut R,
    ) -> ShipScenario
    where
        R: Rng + ?Sized,
        F: Fn(&ShipScenario) -> bool,
    {
        let scenario = self.choose_matching(kind, day, filter, rng);
        self.record_appearance(&scenario.id);
        scenario
    }

    /// Like [`Self::pick_matching`], without counting an appearance.
    pub fn choose_matching<R, F>(
        &mut self,
        kind: ScenarioType,
        day: u32,
        filter: F,
        rng: &mut R,
    ) -> ShipScenario
    where
        R: Rng + ?Sized,
        F: Fn(&ShipScenario) -> bool,
    {
        self.select(kind, None, day, filter, rng)
    }

    /// Story scenario carrying `tag`. Synthesizes and registers one on a miss.
    pub fn pick_story<R: Rng + ?Sized>(
        &mut self,
        tag: &str,
        day: u32,
        rng: &mut R,
    ) -> ShipScenario {
        self.pick_story_matching(tag, day, |_| true, rng)
    }

    /// Like [`Self::pick_story`], restricted to scenarios accepted by `filter`.
    pub fn pick_story_matching<R, F>(
        &mut self,
        tag: &str,
        day: u32,
        filter: F,
        rng: &mut R,
    ) -> ShipScenario
    where
        R: Rng + ?Sized,
        F: Fn(&ShipScenario) -> bool,
    {
        let scenario = self.choose_story_matching(tag, day, filter, rng);
        self.record_appearance(&scenario.id);
        scenario
    }

    /// Like [`Self::pick_story_matching`], without counting an appearance.
    pub fn choose_story_matching<R, F>(
        &mut self,
        tag: &str,
        day: u32,
        filter: F,
        rng: &mut R,
    ) -> ShipScenario
    where
        R: Rng + ?Sized,
        F: Fn(&ShipScenario) -> bool,
    {
        self.select(ScenarioType::StoryEvent, Some(tag), day, filter, rng)
    }

    /// Count one appearance of `id`.
    pub fn record_appearance(&mut self, id: &ScenarioId) {
        let count = self.appearances.entry(id.clone()).or_insert(0);
        *count += 1;
        debug!(scenario = %id, appearances = *count, "recorded scenario appearance");
    }

    /// How many times `id` has appeared.
    pub fn appearances(&self, id: &ScenarioId) -> u32 {
        self.appearances.get(id).copied().unwrap_or(0)
    }

    /// Check whether the scenario reached its appearance cap.
    pub fn is_exhausted(&self, scenario: &ShipScenario) -> bool {
        scenario
            .max_appearances
            .is_some_and(|max| self.appearances(&scenario.id) >= max)
    }

    /// Story tags with at least one day-eligible, non-exhausted scenario.
    pub fn available_story_tags(&self, day: u32) -> Vec<String> {
        let mut tags: Vec<String> = Vec::new();
        for scenario in &self.story {
            if !scenario.is_available_on(day) || self.is_exhausted(scenario) {
                continue;
            }
            if let Some(tag) = &scenario.story_tag {
                if !tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
                    tags.push(tag.clone());
                }
            }
        }
        tags
    }

    fn select<R, F>(
        &mut self,
        kind: ScenarioType,
        tag: Option<&str>,
        day: u32,
        filter: F,
        rng: &mut R,
    ) -> ShipScenario
    where
        R: Rng + ?Sized,
        F: Fn(&ShipScenario) -> bool,
    {
        let pool = self.pool(kind);
        let matches: Vec<usize> = pool
            .iter()
            .enumerate()
            .filter(|(_, s)| !self.is_exhausted(s))
            .filter(|(_, s)| tag.map_or(true, |t| s.has_tag(t)))
            .filter(|(_, s)| filter(*s))
            .map(|(i, _)| i)
            .collect();
        let day_eligible: Vec<usize> = matches
            .iter()
            .copied()
            .filter(|&i| pool[i].is_available_on(day))
            .collect();

        let chosen = if !day_eligible.is_empty() {
            day_eligible.choose(rng).copied()
        } else if kind != ScenarioType::StoryEvent && !matches.is_empty() {
            debug!(kind = %kind, day, "no day-eligible scenario, ignoring day gating");
            matches.choose(rng).copied()
        } else {
            None
        };

        let scenario = match chosen {
            Some(index) => pool[index].clone(),
            None => {
                let scenario = match tag {
                    Some(tag) => synthesize_story(tag),
                    None => synthesize(kind),
                };
                info!(kind = %kind, scenario = %scenario.id, day, "synthesized fallback scenario");
                self.register(scenario.clone());
                scenario
            }
        };

        debug!(scenario = %scenario.id, day, "picked scenario");
        scenario
    }

    fn pool(&self, kind: ScenarioType) -> &Vec<ShipScenario> {
        match kind {
            ScenarioType::Standard => &self.standard,
            ScenarioType::Invalid => &self.invalid,
            ScenarioType::StoryEvent => &self.story,
        }
    }

    fn pool_mut(&mut self, kind: ScenarioType) -> &mut Vec<ShipScenario> {
        match kind {
            ScenarioType::Standard => &mut self.standard,
            ScenarioType::Invalid => &mut self.invalid,
            ScenarioType::StoryEvent => &mut self.story,
        }
    }
}

fn pool_kind(scenario: &ShipScenario) -> ScenarioType {
    if scenario.is_story_mission {
        ScenarioType::StoryEvent
    } else {
        scenario.scenario_type
    }
}
