//! Scenario templates.

use serde::{Deserialize, Serialize};

use super::{IntRange, ScenarioId};
use crate::mechanics::{ScenarioType, Violation};

/// A reusable template supplying narrative text and the approval ground truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipScenario {
    pub id: ScenarioId,
    pub name: String,
    pub scenario_type: ScenarioType,
    pub should_be_approved: bool,
    /// Required when `should_be_approved` is false.
    #[serde(default)]
    pub invalid_reason: String,
    /// Which document flaw the encounter must exhibit when denied.
    #[serde(default)]
    pub violation: Violation,

    #[serde(default)]
    pub is_story_mission: bool,
    #[serde(default)]
    pub story_tag: Option<String>,
    #[serde(default)]
    pub day_first_appears: u32,
    /// `None` = unlimited.
    #[serde(default, with = "crate::serde_day")]
    pub max_appearances: Option<u32>,

    // Text pools, one entry drawn per encounter
    #[serde(default)]
    pub story_texts: Vec<String>,
    #[serde(default)]
    pub manifest_texts: Vec<String>,
    #[serde(default)]
    pub consequence_texts: Vec<String>,

    /// Overrides the engine default casualty range.
    #[serde(default)]
    pub casualties: Option<IntRange>,
    /// Overrides the engine default credit penalty range.
    #[serde(default)]
    pub credit_penalty: Option<IntRange>,
}

impl ShipScenario {
    /// A standard scenario that should be approved.
    pub fn approved(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::base(id, name, ScenarioType::Standard, true)
    }

    /// An invalid scenario built around one violation.
    pub fn denied(
        id: impl Into<String>,
        name: impl Into<String>,
        violation: Violation,
        reason: impl Into<String>,
    ) -> Self {
        let mut scenario = Self::base(id, name, ScenarioType::Invalid, false);
        scenario.violation = violation;
        scenario.invalid_reason = reason.into();
        scenario
    }

    /// A story scenario tied to a narrative arc.
    pub fn story(
        id: impl Into<String>,
        name: impl Into<String>,
        tag: impl Into<String>,
        should_be_approved: bool,
    ) -> Self {
        let mut scenario = Self::base(id, name, ScenarioType::StoryEvent, should_be_approved);
        scenario.is_story_mission = true;
        scenario.story_tag = Some(tag.into());
        scenario
    }

    fn base(
        id: impl Into<String>,
        name: impl Into<String>,
        scenario_type: ScenarioType,
        should_be_approved: bool,
    ) -> Self {
        Self {
            id: ScenarioId::new(id),
            name: name.into(),
            scenario_type,
            should_be_approved,
            invalid_reason: String::new(),
            violation: Violation::Declared,
            is_story_mission: false,
            story_tag: None,
            day_first_appears: 0,
            max_appearances: None,
            story_texts: Vec::new(),
            manifest_texts: Vec::new(),
            consequence_texts: Vec::new(),
            casualties: None,
            credit_penalty: None,
        }
    }

    /// Set the first day the scenario may appear.
    pub fn first_appearing_on(mut self, day: u32) -> Self {
        self.day_first_appears = day;
        self
    }

    /// Cap how many times the scenario may appear.
    pub fn limited_to(mut self, appearances: u32) -> Self {
        self.max_appearances = Some(appearances);
        self
    }

    /// Set the denial reason.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.invalid_reason = reason.into();
        self
    }

    /// Add a narrative template.
    pub fn with_story_text(mut self, text: impl Into<String>) -> Self {
        self.story_texts.push(text.into());
        self
    }

    /// Add a manifest template.
    pub fn with_manifest_text(mut self, text: impl Into<String>) -> Self {
        self.manifest_texts.push(text.into());
        self
    }

    /// Add a consequence template.
    pub fn with_consequence_text(mut self, text: impl Into<String>) -> Self {
        self.consequence_texts.push(text.into());
        self
    }

    /// Check the story tag, ignoring case.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.story_tag
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case(tag))
    }

    /// Check whether the scenario has unlocked by `day`.
    pub fn is_available_on(&self, day: u32) -> bool {
        day >= self.day_first_appears
    }

    /// The violation a denial is built around; approved scenarios have none.
    pub fn declared_violation(&self) -> Option<Violation> {
        (!self.should_be_approved).then_some(self.violation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let scenario = ShipScenario::story("ghost", "Ghost Ship", "insurgent", false)
            .first_appearing_on(5)
            .limited_to(1)
            .with_reason("Crew matches insurgent cell roster");
        assert!(scenario.is_story_mission);
        assert!(scenario.has_tag("INSURGENT"));
        assert!(!scenario.is_available_on(4));
        assert!(scenario.is_available_on(5));
        assert_eq!(scenario.max_appearances, Some(1));
        assert_eq!(scenario.declared_violation(), Some(Violation::Declared));
    }

    #[test]
    fn test_approved_has_no_violation() {
        assert_eq!(ShipScenario::approved("ok", "Routine").declared_violation(), None);
    }

    #[test]
    fn test_max_appearances_from_toml() {
        let scenario: ShipScenario = toml::from_str(
            r#"
            id = "routine"
            name = "Routine"
            scenario_type = "standard"
            should_be_approved = true
            max_appearances = -1
            "#,
        )
        .unwrap();
        assert_eq!(scenario.max_appearances, None);
        assert_eq!(scenario.scenario_type, ScenarioType::Standard);
    }
}
