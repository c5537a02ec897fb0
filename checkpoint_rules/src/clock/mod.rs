//! Rule clock - day-scoped validity windows and special day rules.
//!
//! Day rules accumulate: a rule activated on day 3 stays active on every
//! later day. Nothing here expires a rule.

use serde::{Deserialize, Serialize};

/// Inclusive `[from, until]` day window. `until = None` is open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityWindow {
    #[serde(rename = "valid_from_day", default)]
    pub from: u32,
    #[serde(rename = "valid_until_day", default, with = "crate::serde_day")]
    pub until: Option<u32>,
}

impl ValidityWindow {
    pub const fn new(from: u32, until: Option<u32>) -> Self {
        Self { from, until }
    }

    /// A window open from day zero with no end.
    pub const fn always() -> Self {
        Self::new(0, None)
    }

    /// Check whether `day` falls inside the window.
    pub fn contains(&self, day: u32) -> bool {
        day >= self.from && self.until.map_or(true, |until| day <= until)
    }

    /// The window closed before `day`.
    pub fn has_expired_by(&self, day: u32) -> bool {
        self.until.is_some_and(|until| day > until)
    }

    /// The window opens after `day`.
    pub fn opens_after(&self, day: u32) -> bool {
        day < self.from
    }
}

/// Anything exposing a day window.
pub trait DayWindowed {
    fn window(&self) -> ValidityWindow;
}

impl DayWindowed for ValidityWindow {
    fn window(&self) -> ValidityWindow {
        *self
    }
}

impl DayWindowed for crate::entities::AccessCode {
    fn window(&self) -> ValidityWindow {
        self.window
    }
}

impl DayWindowed for crate::entities::ShipScenario {
    fn window(&self) -> ValidityWindow {
        ValidityWindow::new(self.day_first_appears, None)
    }
}

/// Effect of a special day rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DayRuleKind {
    /// Ships departing from this origin must be denied.
    BanOrigin { origin: String },
    /// Player-facing notice with no effect on verdicts.
    Bulletin { text: String },
}

/// A special rule that switches on at a given day and stays on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRule {
    pub id: String,
    pub activate_on_day: u32,
    #[serde(flatten)]
    pub kind: DayRuleKind,
}

impl DayRule {
    /// Create a rule closing `origin` from `day` on.
    pub fn ban_origin(id: impl Into<String>, day: u32, origin: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            activate_on_day: day,
            kind: DayRuleKind::BanOrigin {
                origin: origin.into(),
            },
        }
    }

    /// Create a player-facing notice posted on `day`.
    pub fn bulletin(id: impl Into<String>, day: u32, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            activate_on_day: day,
            kind: DayRuleKind::Bulletin { text: text.into() },
        }
    }
}

/// Evaluates day windows and the static day-rule table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleClock {
    rules: Vec<DayRule>,
}

impl RuleClock {
    /// Create a clock over `rules`, ordered by activation day.
    pub fn new(mut rules: Vec<DayRule>) -> Self {
        rules.sort_by_key(|rule| rule.activate_on_day);
        Self { rules }
    }

    pub fn is_valid_on_day(window: &impl DayWindowed, day: u32) -> bool {
        window.window().contains(day)
    }

    /// Every rule with `activate_on_day <= day`, in activation order.
    pub fn active_day_rules(&self, day: u32) -> Vec<&DayRule> {
        self.rules
            .iter()
            .take_while(|rule| rule.activate_on_day <= day)
            .collect()
    }

    /// Origins banned as of `day`.
    pub fn banned_origins(&self, day: u32) -> Vec<&str> {
        self.active_day_rules(day)
            .into_iter()
            .filter_map(|rule| match &rule.kind {
                DayRuleKind::BanOrigin { origin } => Some(origin.as_str()),
                DayRuleKind::Bulletin { .. } => None,
            })
            .collect()
    }

    /// Check whether `origin` is closed on `day`, ignoring case.
    pub fn is_origin_banned(&self, origin: &str, day: u32) -> bool {
        self.banned_origins(day)
            .iter()
            .any(|banned| banned.eq_ignore_ascii_case(origin))
    }

    /// Bulletin texts in force as of `day`.
    pub fn bulletins(&self, day: u32) -> Vec<&str> {
        self.active_day_rules(day)
            .into_iter()
            .filter_map(|rule| match &rule.kind {
                DayRuleKind::Bulletin { text } => Some(text.as_str()),
                DayRuleKind::BanOrigin { .. } => None,
            })
            .collect()
    }

    /// Every rule, ordered by activation day.
    pub fn rules(&self) -> &[DayRule] {
        &self.rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_clock() -> RuleClock {
        RuleClock::new(vec![
            DayRule::ban_origin("ban-kessa", 3, "Kessa Drift"),
            DayRule::bulletin("curfew", 1, "Night curfew in effect"),
            DayRule::ban_origin("ban-orun", 6, "Orun Yards"),
        ])
    }

    #[test]
    fn test_window_contains() {
        let window = ValidityWindow::new(3, None);
        assert!(!RuleClock::is_valid_on_day(&window, 2));
        assert!(RuleClock::is_valid_on_day(&window, 3));
        assert!(RuleClock::is_valid_on_day(&window, 100));

        let bounded = ValidityWindow::new(1, Some(2));
        assert!(bounded.has_expired_by(3));
        assert!(!bounded.has_expired_by(2));
        assert!(ValidityWindow::new(4, None).opens_after(3));
    }

    #[test]
    fn test_rules_accumulate() {
        let clock = sample_clock();
        assert!(clock.active_day_rules(0).is_empty());
        assert_eq!(clock.active_day_rules(1).len(), 1);
        assert_eq!(clock.active_day_rules(3).len(), 2);
        assert_eq!(clock.active_day_rules(50).len(), 3);
    }

    #[test]
    fn test_banned_origins_stay_banned() {
        let clock = sample_clock();
        assert!(!clock.is_origin_banned("Kessa Drift", 2));
        assert!(clock.is_origin_banned("kessa drift", 3));
        assert!(clock.is_origin_banned("Kessa Drift", 40));
        assert_eq!(clock.banned_origins(6), vec!["Kessa Drift", "Orun Yards"]);
    }

    #[test]
    fn test_bulletins() {
        let clock = sample_clock();
        assert_eq!(clock.bulletins(5), vec!["Night curfew in effect"]);
    }

    #[test]
    fn test_day_rule_from_toml() {
        let rule: DayRule = toml::from_str(
            r#"
            id = "ban"
            activate_on_day = 2
            kind = "ban_origin"
            origin = "Kessa Drift"
            "#,
        )
        .unwrap();
        assert_eq!(rule, DayRule::ban_origin("ban", 2, "Kessa Drift"));
    }
}
