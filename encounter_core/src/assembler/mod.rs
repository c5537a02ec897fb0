//! # Encounter Assembler
//!
//! Composes a full encounter from the catalog: scenario, faction, ship,
//! captain, access code and origin. The scenario fixes the verdict first;
//! every other pick is then made so the documents exhibit exactly the flaw
//! the scenario declares (or none, for approvable ships). Each candidate is
//! run through [`inspect`] before it is accepted, and the resulting issue list
//! becomes the encounter's [`ValidationExplanation`].
//!
//! Failed candidates are retried with looser constraints (see
//! [`Relaxation`]). When every attempt fails, a placeholder shuttle is issued
//! instead, on a code valid today or, when there is none, on the reserved
//! emergency code. A scenario counts as appeared only once an encounter built
//! from it is issued.

pub mod inspection;
pub mod text;

pub use inspection::*;
pub use text::*;

use std::sync::Arc;

use checkpoint_rules::{
    AccessCode, Captain, CaptainType, ConsequenceTrigger, ContentCatalog, Faction, IntRange,
    ScenarioId, ScenarioType, ShipCategoryId, ShipScenario, ShipTrait, ShipType, ShipTypeId,
    StoryTagBinding, Violation,
};
use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::authority::AccessCodeAuthority;
use crate::compatibility::FactionCompatibilityMatrix;
use crate::config::EngineConfig;
use crate::encounter::{BribeOffer, Encounter, EncounterId};
use crate::scenario_selector::ScenarioSelector;

/// Scenario id carried by placeholder encounters.
pub const PLACEHOLDER_SCENARIO: &str = "placeholder";

const PLACEHOLDER_CATEGORY: &str = "shuttle";
const OPEN_SPACE: &str = "Open Space";
const DEFAULT_DESTINATION: &str = "Command Station";
const DEFAULT_NARRATIVE: &str = "{captain} requests clearance for the {ship}.";

/// How far constraints have been loosened for a retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Relaxation {
    /// Faction's own authorized categories and the story ship trait.
    Strict,
    /// Any category the faction can use; story ship trait dropped.
    AnyCategory,
    /// Story faction no longer forced.
    AnyFaction,
}

impl Relaxation {
    /// Attempts are split into three equal bands.
    pub fn for_attempt(attempt: u32, max_attempts: u32) -> Self {
        let band = max_attempts.div_ceil(3).max(1);
        match attempt / band {
            0 => Relaxation::Strict,
            1 => Relaxation::AnyCategory,
            _ => Relaxation::AnyFaction,
        }
    }
}

/// Everything one faction could contribute to a candidate.
struct FactionOptions<'c> {
    faction: &'c Faction,
    ships: Vec<&'c ShipType>,
    captain_types: Vec<&'c CaptainType>,
    codes: Vec<AccessCode>,
}

/// A verified combination of picks.
struct Candidate<'c> {
    faction: &'c Faction,
    ship_type: &'c ShipType,
    captain: Captain,
    code: AccessCode,
    origin: String,
    explanation: ValidationExplanation,
}

/// Consequence text and numbers for a wrong call.
struct Stakes {
    template: String,
    casualties: u32,
    credit_penalty: u32,
}

/// Builds encounters for a day.
#[derive(Debug, Clone)]
pub struct EncounterAssembler {
    catalog: Arc<ContentCatalog>,
    config: EngineConfig,
    authority: AccessCodeAuthority,
    matrix: FactionCompatibilityMatrix,
    selector: ScenarioSelector,
}

impl EncounterAssembler {
    /// Create an assembler with fresh collaborators over `catalog`.
    pub fn new(catalog: Arc<ContentCatalog>, config: EngineConfig) -> Self {
        let authority = AccessCodeAuthority::new(catalog.clone());
        let matrix = FactionCompatibilityMatrix::new(catalog.clone());
        let selector = ScenarioSelector::from_catalog(&catalog);
        Self::with_components(catalog, config, authority, matrix, selector)
    }

    /// Assemble from explicitly provided collaborators.
    pub fn with_components(
        catalog: Arc<ContentCatalog>,
        config: EngineConfig,
        authority: AccessCodeAuthority,
        matrix: FactionCompatibilityMatrix,
        selector: ScenarioSelector,
    ) -> Self {
        Self {
            catalog,
            config,
            authority,
            matrix,
            selector,
        }
    }

    /// Get the content catalog.
    pub fn catalog(&self) -> &ContentCatalog {
        &self.catalog
    }

    /// Get the engine config.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Get the access code authority.
    pub fn authority(&self) -> &AccessCodeAuthority {
        &self.authority
    }

    /// Get the access code authority mutably.
    pub fn authority_mut(&mut self) -> &mut AccessCodeAuthority {
        &mut self.authority
    }

    /// Get the compatibility matrix.
    pub fn matrix(&self) -> &FactionCompatibilityMatrix {
        &self.matrix
    }

    /// Get the scenario selector.
    pub fn selector(&self) -> &ScenarioSelector {
        &self.selector
    }

    /// Get the scenario selector mutably.
    pub fn selector_mut(&mut self) -> &mut ScenarioSelector {
        &mut self.selector
    }

    /// Build one encounter. Always returns something usable.
    ///
    /// With `want_story` set, the story scenario decides the verdict and
    /// `want_valid` is ignored.
    pub fn assemble<R: Rng + ?Sized>(
        &mut self,
        day: u32,
        want_valid: bool,
        want_story: Option<&str>,
        rng: &mut R,
    ) -> Encounter {
        let catalog = Arc::clone(&self.catalog);
        let scenario = self.resolve_scenario(&catalog, day, want_valid, want_story, rng);
        let flaw = scenario.declared_violation();
        let binding = want_story.and_then(|tag| catalog.story_binding(tag));
        let approvable = self.authority.approvable_codes(day);

        let max_attempts = self.config.max_attempts.max(1);
        for attempt in 0..max_attempts {
            let level = Relaxation::for_attempt(attempt, max_attempts);
            match self.try_candidate(&catalog, day, flaw, binding, level, &approvable, rng) {
                Some(candidate) => {
                    let encounter = self.finish(&catalog, day, &scenario, flaw, candidate, rng);
                    self.selector.record_appearance(&scenario.id);
                    return encounter;
                }
                None => {
                    debug!(
                        day,
                        attempt,
                        ?level,
                        scenario = %scenario.id,
                        "assembly attempt failed"
                    );
                }
            }
        }

        warn!(
            day,
            scenario = %scenario.id,
            attempts = max_attempts,
            "generation exhausted, issuing placeholder encounter"
        );
        self.placeholder(&catalog, day, &approvable, rng)
    }

    fn resolve_scenario<R: Rng + ?Sized>(
        &mut self,
        catalog: &ContentCatalog,
        day: u32,
        want_valid: bool,
        want_story: Option<&str>,
        rng: &mut R,
    ) -> ShipScenario {
        let authority = &self.authority;
        let feasible = |scenario: &ShipScenario| is_feasible(scenario, authority, catalog, day);
        match want_story {
            Some(tag) => self.selector.choose_story_matching(tag, day, feasible, rng),
            None => {
                let kind = if want_valid {
                    ScenarioType::Standard
                } else {
                    ScenarioType::Invalid
                };
                self.selector.choose_matching(
                    kind,
                    day,
                    |scenario| scenario.should_be_approved == want_valid && feasible(scenario),
                    rng,
                )
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn try_candidate<'c, R: Rng + ?Sized>(
        &self,
        catalog: &'c ContentCatalog,
        day: u32,
        flaw: Option<Violation>,
        binding: Option<&StoryTagBinding>,
        level: Relaxation,
        approvable: &[AccessCode],
        rng: &mut R,
    ) -> Option<Candidate<'c>> {
        let forced = binding
            .filter(|_| level < Relaxation::AnyFaction)
            .map(|binding| &binding.faction);
        let ship_trait = binding
            .and_then(|binding| binding.ship_trait)
            .filter(|_| level == Relaxation::Strict);

        let options: Vec<FactionOptions<'c>> = catalog
            .factions()
            .iter()
            .filter(|faction| forced.map_or(true, |id| &faction.id == id))
            .filter_map(|faction| {
                self.options_for(catalog, faction, day, flaw, ship_trait, level, approvable)
            })
            .collect();
        if options.is_empty() {
            return None;
        }

        let denied = flaw.is_some();
        let weights: Vec<f64> = options
            .iter()
            .map(|option| faction_weight(option.faction, denied))
            .collect();
        let index = match WeightedIndex::new(&weights) {
            Ok(distribution) => distribution.sample(rng),
            Err(_) => rng.gen_range(0..options.len()),
        };
        let option = &options[index];

        let ship_type = *option.ships.choose(rng)?;
        let captain = option
            .captain_types
            .choose(rng)?
            .captains
            .choose(rng)?
            .clone();
        let codes: Vec<&AccessCode> = if flaw == Some(Violation::WrongFactionCode) {
            borrowed_codes(&self.matrix, option, &ship_type.category)
        } else {
            option.codes.iter().collect()
        };
        let mut code = (*codes.choose(rng)?).clone();
        if flaw == Some(Violation::ForgedCode) {
            code = self.authority.forge_code(&code, rng);
        }
        let origin = pick_origin(catalog, ship_type, day, flaw, rng);

        let docs = Documents {
            day,
            code: &code.code,
            faction: option.faction,
            ship_type,
            origin: &origin,
        };
        let explanation = inspect(&docs, &self.authority, &self.matrix, catalog.rule_clock());
        let consistent = match flaw {
            None | Some(Violation::Declared) => explanation.is_clean(),
            Some(violation) => explanation.is_only(violation),
        };
        if !consistent {
            debug!(
                faction = %option.faction.id,
                ship = %ship_type.id,
                code = %code.code,
                found = ?explanation.violations(),
                "candidate rejected by inspection"
            );
            return None;
        }

        Some(Candidate {
            faction: option.faction,
            ship_type,
            captain,
            code,
            origin,
            explanation,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn options_for<'c>(
        &self,
        catalog: &'c ContentCatalog,
        faction: &'c Faction,
        day: u32,
        flaw: Option<Violation>,
        ship_trait: Option<ShipTrait>,
        level: Relaxation,
        approvable: &[AccessCode],
    ) -> Option<FactionOptions<'c>> {
        let categories: Vec<&ShipCategoryId> = match flaw {
            Some(Violation::CategoryMismatch) => self.matrix.unusable_categories(&faction.id),
            _ if level == Relaxation::Strict => self
                .matrix
                .usable_categories(&faction.id)
                .into_iter()
                .filter(|category| faction.authorized_ship_categories.contains(&category.id))
                .collect(),
            _ => self.matrix.usable_categories(&faction.id),
        }
        .into_iter()
        .map(|category| &category.id)
        .collect();
        let ships: Vec<&ShipType> = catalog
            .ship_types()
            .iter()
            .filter(|ship| ship_trait.map_or(true, |t| ship.has_trait(t)))
            .filter(|ship| categories.contains(&&ship.category))
            .collect();
        let captain_types = catalog.captain_types_for(&faction.id);
        let codes = self.codes_for(faction, day, flaw, approvable);

        if ships.is_empty() || captain_types.is_empty() || codes.is_empty() {
            return None;
        }
        Some(FactionOptions {
            faction,
            ships,
            captain_types,
            codes,
        })
    }

    /// Codes a faction could carry so that the code shows exactly `flaw`.
    fn codes_for(
        &self,
        faction: &Faction,
        day: u32,
        flaw: Option<Violation>,
        approvable: &[AccessCode],
    ) -> Vec<AccessCode> {
        let registered = |code: &&AccessCode| !self.authority.is_fallback(&code.code);
        match flaw {
            Some(
                violation @ (Violation::ExpiredCode
                | Violation::RevokedCode
                | Violation::InactiveCode),
            ) => self
                .authority
                .flawed_codes(violation, day)
                .into_iter()
                .filter(|code| self.matrix.can_present_code(faction, code))
                .cloned()
                .collect(),
            // Forgeries imitate a code the faction would really carry.
            Some(Violation::ForgedCode) => approvable
                .iter()
                .filter(registered)
                .filter(|code| self.matrix.can_present_code(faction, code))
                .cloned()
                .collect(),
            Some(Violation::WrongFactionCode) => approvable
                .iter()
                .filter(registered)
                .filter(|code| !self.matrix.can_present_code(faction, code))
                .cloned()
                .collect(),
            _ => approvable
                .iter()
                .filter(|code| self.matrix.can_present_code(faction, code))
                .cloned()
                .collect(),
        }
    }

    fn finish<R: Rng + ?Sized>(
        &self,
        catalog: &ContentCatalog,
        day: u32,
        scenario: &ShipScenario,
        flaw: Option<Violation>,
        candidate: Candidate<'_>,
        rng: &mut R,
    ) -> Encounter {
        let Candidate {
            faction,
            ship_type,
            captain,
            code,
            origin,
            mut explanation,
        } = candidate;
        let should_approve = scenario.should_be_approved;

        let invalid_reason = if should_approve {
            String::new()
        } else if !scenario.invalid_reason.trim().is_empty() {
            scenario.invalid_reason.clone()
        } else {
            explanation
                .issues
                .first()
                .map(|issue| issue.detail.clone())
                .unwrap_or_else(|| flaw.unwrap_or_default().label().to_string())
        };
        if flaw == Some(Violation::Declared) {
            explanation.push(Issue::new(Violation::Declared, invalid_reason.clone()));
        }

        let id = EncounterId::from_rng(rng);
        let ship_name = ship_type
            .names
            .choose(rng)
            .cloned()
            .unwrap_or_else(|| ship_type.name.clone());
        let destination = catalog
            .destinations()
            .choose(rng)
            .cloned()
            .unwrap_or_else(|| DEFAULT_DESTINATION.to_string());
        let crew_size = draw(ship_type.crew, rng);
        let stakes = self.stakes(catalog, scenario, should_approve, rng);

        let values = TemplateValues {
            ship: &ship_name,
            ship_type: &ship_type.name,
            captain: &captain.name,
            rank: &captain.rank,
            faction: &faction.name,
            origin: &origin,
            destination: &destination,
            code: &code.code,
            crew: crew_size,
            casualties: stakes.casualties,
            credits: stakes.credit_penalty,
        };
        let narrative = render(
            scenario
                .story_texts
                .choose(rng)
                .map_or(DEFAULT_NARRATIVE, String::as_str),
            &values,
        );
        let mut manifest = match scenario.manifest_texts.choose(rng) {
            Some(text) => render(text, &values),
            None => default_manifest(ship_type, rng),
        };
        if flaw == Some(Violation::Declared) && rng.gen_bool(0.5) {
            if let Some(indicator) = ship_type.suspicious_indicators.choose(rng) {
                manifest.push_str(&format!("\nInspector note: {indicator}."));
            }
        }
        if should_approve && faction.flags.search_exempt {
            manifest.push_str("\nSearch waived under diplomatic protocol.");
        }
        let consequence = render(&stakes.template, &values);
        let bribe = self.roll_bribe(faction, should_approve, rng);

        info!(
            encounter = %id,
            day,
            scenario = %scenario.id,
            faction = %faction.id,
            ship = %ship_type.id,
            code = %code.code,
            approve = should_approve,
            "assembled encounter"
        );

        Encounter {
            id,
            day,
            ship_type: ship_type.id.clone(),
            ship_type_name: ship_type.name.clone(),
            ship_name,
            origin,
            destination,
            crew_size,
            access_code: code.code,
            captain_name: captain.name,
            captain_rank: captain.rank,
            faction: Some(faction.id.clone()),
            faction_name: faction.name.clone(),
            manifest,
            narrative,
            scenario: scenario.id.clone(),
            is_story_ship: scenario.is_story_mission,
            story_tag: scenario.story_tag.clone(),
            bribe,
            should_approve,
            invalid_reason,
            violation: flaw,
            explanation,
            consequence,
            casualties: stakes.casualties,
            credit_penalty: stakes.credit_penalty,
            is_placeholder: false,
        }
    }

    /// Consequence for the wrong call on this encounter.
    fn stakes<R: Rng + ?Sized>(
        &self,
        catalog: &ContentCatalog,
        scenario: &ShipScenario,
        should_approve: bool,
        rng: &mut R,
    ) -> Stakes {
        let trigger = if should_approve {
            ConsequenceTrigger::WrongDenial
        } else {
            ConsequenceTrigger::WrongApproval
        };
        let consequence = catalog.consequences_for(trigger).choose(rng).copied();

        let template = scenario
            .consequence_texts
            .choose(rng)
            .cloned()
            .or_else(|| consequence.map(|c| c.description.clone()))
            .unwrap_or_else(|| default_consequence(trigger).to_string());

        let default_casualties = match trigger {
            ConsequenceTrigger::WrongApproval => self.config.casualties,
            ConsequenceTrigger::WrongDenial => IntRange::default(),
        };
        let casualties = scenario
            .casualties
            .or(consequence.map(|c| c.casualties))
            .unwrap_or(default_casualties);
        let credit_penalty = scenario
            .credit_penalty
            .or(consequence.map(|c| c.credit_penalty))
            .unwrap_or(self.config.credit_penalty);

        Stakes {
            template,
            casualties: draw(casualties, rng),
            credit_penalty: draw(credit_penalty, rng),
        }
    }

    fn roll_bribe<R: Rng + ?Sized>(
        &self,
        faction: &Faction,
        should_approve: bool,
        rng: &mut R,
    ) -> Option<BribeOffer> {
        if should_approve || faction.flags.diplomatic_immunity {
            return None;
        }
        if !rng.gen_bool(self.config.bribe_chance.clamp(0.0, 1.0)) {
            return None;
        }
        let (min, max) = (self.config.bribe_min, self.config.bribe_max);
        let raw = draw(IntRange::new(min, max), rng);
        // Round to the nearest 50 credits without leaving the range.
        let amount = (raw.saturating_add(25) / 50 * 50).clamp(min, max.max(min));
        Some(BribeOffer { amount })
    }

    /// Valid shuttle with no faction, on a code from `approvable`.
    ///
    /// Codes open to every faction are preferred. `approvable` only holds the
    /// reserved emergency code when nothing in the catalog is valid today.
    fn placeholder<R: Rng + ?Sized>(
        &self,
        catalog: &ContentCatalog,
        day: u32,
        approvable: &[AccessCode],
        rng: &mut R,
    ) -> Encounter {
        let unrestricted: Vec<&AccessCode> = approvable
            .iter()
            .filter(|code| code.authorized_factions.is_empty())
            .collect();
        let code = unrestricted
            .choose(rng)
            .copied()
            .or_else(|| approvable.first())
            .cloned()
            .unwrap_or_else(|| self.authority.issue_fallback());
        let on_emergency_code = self.authority.is_fallback(&code.code);
        let ship = catalog
            .ship_types()
            .iter()
            .find(|ship| ship.category.as_str() == PLACEHOLDER_CATEGORY)
            .or_else(|| catalog.ship_types().first());

        let ship_type = ship.map_or_else(|| ShipTypeId::new("unregistered"), |s| s.id.clone());
        let ship_type_name = ship
            .map_or_else(|| "Unregistered shuttle".to_string(), |s| s.name.clone());
        let ship_name = ship
            .and_then(|s| s.names.first().cloned())
            .unwrap_or_else(|| ship_type_name.clone());
        let rules = catalog.rule_clock();
        let origin = ship
            .and_then(|s| {
                s.common_origins
                    .iter()
                    .find(|origin| !rules.is_origin_banned(origin, day))
                    .cloned()
            })
            .unwrap_or_else(|| OPEN_SPACE.to_string());
        let destination = catalog
            .destinations()
            .first()
            .cloned()
            .unwrap_or_else(|| DEFAULT_DESTINATION.to_string());

        let narrative = if on_emergency_code {
            "Unscheduled shuttle on an emergency code. Its papers check out.".to_string()
        } else {
            format!("Unscheduled shuttle on {}. Its papers check out.", code.code)
        };

        let id = EncounterId::from_rng(rng);
        info!(encounter = %id, day, code = %code.code, "issued placeholder encounter");

        Encounter {
            id,
            day,
            ship_type,
            ship_type_name,
            ship_name,
            origin,
            destination,
            crew_size: ship.map_or(1, |s| s.crew.min.max(1)),
            access_code: code.code,
            captain_name: "Unregistered pilot".to_string(),
            captain_rank: "Pilot".to_string(),
            faction: None,
            faction_name: "Unaffiliated".to_string(),
            manifest: "Placeholder manifest: no cargo declared.".to_string(),
            narrative,
            scenario: ScenarioId::new(PLACEHOLDER_SCENARIO),
            is_story_ship: false,
            story_tag: None,
            bribe: None,
            should_approve: true,
            invalid_reason: String::new(),
            violation: None,
            explanation: ValidationExplanation::default(),
            consequence: default_consequence(ConsequenceTrigger::WrongDenial).replace(
                "{credits}",
                &self.config.credit_penalty.min.to_string(),
            ),
            casualties: 0,
            credit_penalty: self.config.credit_penalty.min,
            is_placeholder: true,
        }
    }
}

/// Codes another faction cleared for `category` would carry, else all codes.
fn borrowed_codes<'o>(
    matrix: &FactionCompatibilityMatrix,
    option: &'o FactionOptions<'_>,
    category: &ShipCategoryId,
) -> Vec<&'o AccessCode> {
    let borrowed: Vec<&AccessCode> = option
        .codes
        .iter()
        .filter(|code| {
            matrix
                .compatible_factions(category, code.prefix())
                .iter()
                .any(|other| other.id != option.faction.id)
        })
        .collect();
    if borrowed.is_empty() {
        option.codes.iter().collect()
    } else {
        borrowed
    }
}

/// Whether today's catalog can produce the flaw a scenario declares.
fn is_feasible(
    scenario: &ShipScenario,
    authority: &AccessCodeAuthority,
    catalog: &ContentCatalog,
    day: u32,
) -> bool {
    match scenario.declared_violation() {
        None | Some(Violation::Declared) | Some(Violation::CategoryMismatch) => true,
        Some(
            violation @ (Violation::ExpiredCode | Violation::RevokedCode | Violation::InactiveCode),
        ) => !authority.flawed_codes(violation, day).is_empty(),
        Some(Violation::ForgedCode) | Some(Violation::WrongFactionCode) => {
            catalog.access_codes().iter().any(|code| code.is_valid_on(day))
        }
        Some(Violation::BannedOrigin) => !catalog.rule_clock().banned_origins(day).is_empty(),
    }
}

/// Denials favour suspicious factions, approvals favour disciplined ones.
fn faction_weight(faction: &Faction, denied: bool) -> f64 {
    let weight = if denied {
        faction.base_suspicion + faction.contraband_probability
    } else {
        faction.protocol_adherence
    };
    f64::from(weight.max(0.0))
}

fn pick_origin<R: Rng + ?Sized>(
    catalog: &ContentCatalog,
    ship_type: &ShipType,
    day: u32,
    flaw: Option<Violation>,
    rng: &mut R,
) -> String {
    let rules = catalog.rule_clock();
    if flaw == Some(Violation::BannedOrigin) {
        let banned = rules.banned_origins(day);
        let familiar: Vec<&str> = banned
            .iter()
            .copied()
            .filter(|origin| {
                ship_type
                    .common_origins
                    .iter()
                    .any(|common| common.eq_ignore_ascii_case(origin))
            })
            .collect();
        let pool = if familiar.is_empty() { &banned } else { &familiar };
        return pool
            .choose(rng)
            .map(|origin| origin.to_string())
            .unwrap_or_else(|| OPEN_SPACE.to_string());
    }

    let open: Vec<&String> = ship_type
        .common_origins
        .iter()
        .filter(|origin| !rules.is_origin_banned(origin, day))
        .collect();
    open.choose(rng)
        .map(|origin| origin.to_string())
        .unwrap_or_else(|| OPEN_SPACE.to_string())
}

fn default_manifest<R: Rng + ?Sized>(ship_type: &ShipType, rng: &mut R) -> String {
    match ship_type.valid_purposes.choose(rng) {
        Some(purpose) => format!("Declared purpose: {purpose}."),
        None => "No cargo declared.".to_string(),
    }
}

fn default_consequence(trigger: ConsequenceTrigger) -> &'static str {
    match trigger {
        ConsequenceTrigger::WrongApproval => {
            "The vessel should never have docked. {casualties} people paid for it."
        }
        ConsequenceTrigger::WrongDenial => {
            "A cleared vessel was turned away. Command docked {credits} credits."
        }
    }
}

fn draw<R: Rng + ?Sized>(range: IntRange, rng: &mut R) -> u32 {
    if range.max <= range.min {
        range.min
    } else {
        rng.gen_range(range.min..=range.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::FALLBACK_CODE;
    use checkpoint_rules::{CatalogSources, FactionId};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn assembler(config: EngineConfig) -> EncounterAssembler {
        EncounterAssembler::new(Arc::new(ContentCatalog::builtin().unwrap()), config)
    }

    #[test]
    fn test_relaxation_bands() {
        let levels: Vec<_> = (0..8).map(|a| Relaxation::for_attempt(a, 8)).collect();
        assert_eq!(levels[0], Relaxation::Strict);
        assert_eq!(levels[2], Relaxation::Strict);
        assert_eq!(levels[3], Relaxation::AnyCategory);
        assert_eq!(levels[6], Relaxation::AnyFaction);
        assert_eq!(Relaxation::for_attempt(0, 1), Relaxation::Strict);
    }

    #[test]
    fn test_valid_encounters_pass_inspection() {
        let mut assembler = assembler(EngineConfig::default());
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for day in 0..8 {
            for _ in 0..40 {
                let encounter = assembler.assemble(day, true, None, &mut rng);
                assert!(encounter.should_approve);
                assert!(encounter.invalid_reason.is_empty());
                assert!(encounter.explanation.is_clean());
                assert!(!encounter.offers_bribe());
                if !encounter.is_placeholder {
                    let code = assembler.authority().lookup(&encounter.access_code).unwrap();
                    assert!(code.is_valid_on(day) || assembler.authority().is_fallback(&code.code));
                }
            }
        }
    }

    #[test]
    fn test_denied_encounters_show_exactly_their_flaw() {
        let mut assembler = assembler(EngineConfig::default());
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        for day in 0..8 {
            for _ in 0..40 {
                let encounter = assembler.assemble(day, false, None, &mut rng);
                assert!(!encounter.should_approve);
                assert!(!encounter.invalid_reason.is_empty());
                let violation = encounter.violation.unwrap();
                assert!(encounter.explanation.is_only(violation), "{:?}", encounter.explanation);
            }
        }
    }

    #[test]
    fn test_story_forces_bound_faction() {
        let mut assembler = assembler(EngineConfig::default());
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let encounter = assembler.assemble(5, true, Some("traitor_officer"), &mut rng);
        assert!(encounter.is_story_ship);
        assert_eq!(encounter.scenario.as_str(), "traitor_officer");
        assert_eq!(encounter.faction, Some(FactionId::new("imperium")));
        assert!(!encounter.should_approve);
        assert_eq!(encounter.invalid_reason, "Officer is listed as a deserter");

        let ship = assembler
            .catalog()
            .get_ship_type(&encounter.ship_type)
            .unwrap();
        assert!(ship.can_be_infiltrated);
    }

    #[test]
    fn test_bribes_follow_verdict_and_immunity() {
        let config = EngineConfig {
            bribe_chance: 1.0,
            ..EngineConfig::default()
        };
        let mut assembler = assembler(config);
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        for _ in 0..100 {
            let encounter = assembler.assemble(4, false, None, &mut rng);
            let faction = assembler
                .catalog()
                .get_faction(encounter.faction.as_ref().unwrap())
                .unwrap();
            assert_eq!(encounter.offers_bribe(), !faction.flags.diplomatic_immunity);
            if let Some(bribe) = encounter.bribe {
                assert!((500..=5000).contains(&bribe.amount));
                assert_eq!(bribe.amount % 50, 0);
            }
        }
    }

    #[test]
    fn test_same_seed_same_encounter() {
        let mut a = assembler(EngineConfig::default());
        let mut b = assembler(EngineConfig::default());
        let mut rng_a = ChaCha8Rng::seed_from_u64(5);
        let mut rng_b = ChaCha8Rng::seed_from_u64(5);
        for day in 0..5 {
            let x = a.assemble(day, day % 2 == 0, None, &mut rng_a);
            let y = b.assemble(day, day % 2 == 0, None, &mut rng_b);
            assert_eq!(x.id, y.id);
            assert_eq!(x.access_code, y.access_code);
            assert_eq!(x.narrative, y.narrative);
        }
    }

    #[test]
    fn test_placeholder_when_nothing_fits() {
        let toml = r#"
            [[factions]]
            id = "drifters"
            name = "Drifters"
            authorized_ship_categories = ["shuttle"]

            [[ship_categories]]
            id = "shuttle"
            name = "Shuttles"

            [[ship_types]]
            id = "pod"
            name = "Escape Pod"
            category = "shuttle"

            [[captain_types]]
            id = "nobody"
            name = "Nobodies"
            factions = ["drifters"]
            captains = [{ name = "Anon", rank = "Pilot" }]
        "#;
        let catalog = ContentCatalog::load(&CatalogSources::new().with_toml("tiny", toml)).unwrap();
        let mut assembler = EncounterAssembler::new(Arc::new(catalog), EngineConfig::default());
        let encounter = assembler.assemble(1, true, None, &mut ChaCha8Rng::seed_from_u64(6));

        assert!(encounter.is_placeholder);
        assert!(encounter.should_approve);
        assert_eq!(encounter.access_code, FALLBACK_CODE);
        assert_eq!(encounter.faction, None);
        assert_eq!(encounter.ship_type.as_str(), "pod");
        assert!(!encounter.consequence.contains("{credits}"));
    }

    /// One faction that can fly nothing, so every candidate fails.
    const GROUNDED: &str = r#"
        [[factions]]
        id = "drifters"
        name = "Drifters"
        allowed_code_prefixes = ["DRF"]

        [[ship_categories]]
        id = "shuttle"
        name = "Shuttles"

        [[ship_types]]
        id = "pod"
        name = "Escape Pod"
        category = "shuttle"

        [[captain_types]]
        id = "nobody"
        name = "Nobodies"
        factions = ["drifters"]
        captains = [{ name = "Anon", rank = "Pilot" }]

        [[access_codes]]
        code = "DRF-1000"
        valid_from_day = 0
        valid_until_day = -1

        [[access_codes]]
        code = "DRF-2000"
        valid_from_day = 0
        valid_until_day = -1
        authorized_factions = ["drifters"]

        [[scenarios]]
        id = "arc_one"
        name = "Arc one"
        scenario_type = "story_event"
        should_be_approved = true
        is_story_mission = true
        story_tag = "arc"
        max_appearances = 1
    "#;

    fn grounded() -> EncounterAssembler {
        let catalog =
            ContentCatalog::load(&CatalogSources::new().with_toml("grounded", GROUNDED)).unwrap();
        EncounterAssembler::new(Arc::new(catalog), EngineConfig::default())
    }

    #[test]
    fn test_placeholder_keeps_todays_valid_code() {
        let mut assembler = grounded();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        for day in 0..5 {
            let encounter = assembler.assemble(day, true, None, &mut rng);
            assert!(encounter.is_placeholder);
            // the unrestricted code wins over the allowlisted one
            assert_eq!(encounter.access_code, "DRF-1000");
            let valid = assembler.authority_mut().valid_codes_for_day(day);
            assert!(valid.iter().any(|code| code.code == encounter.access_code));
        }
    }

    #[test]
    fn test_placeholder_does_not_use_up_story_scenario() {
        let mut assembler = grounded();
        let mut rng = ChaCha8Rng::seed_from_u64(10);
        let arc = ScenarioId::new("arc_one");

        for day in 1..4 {
            let encounter = assembler.assemble(day, true, Some("arc"), &mut rng);
            assert!(encounter.is_placeholder);
            assert_eq!(assembler.selector().appearances(&arc), 0);
            assert_eq!(assembler.selector().available_story_tags(day), vec!["arc".to_string()]);
        }
    }

    #[test]
    fn test_issued_encounter_counts_its_scenario() {
        let mut assembler = assembler(EngineConfig::default());
        let mut rng = ChaCha8Rng::seed_from_u64(12);
        let encounter = assembler.assemble(5, true, Some("traitor_officer"), &mut rng);
        assert!(!encounter.is_placeholder);
        assert_eq!(assembler.selector().appearances(&encounter.scenario), 1);
    }

    #[test]
    fn test_bribe_rounding_saturates() {
        let config = EngineConfig {
            bribe_chance: 1.0,
            bribe_min: u32::MAX - 10,
            bribe_max: u32::MAX,
            ..EngineConfig::default()
        };
        let mut assembler = assembler(config);
        let mut rng = ChaCha8Rng::seed_from_u64(13);
        for _ in 0..20 {
            let encounter = assembler.assemble(4, false, None, &mut rng);
            if let Some(bribe) = encounter.bribe {
                assert!(bribe.amount >= u32::MAX - 10);
            }
        }
    }

    #[test]
    fn test_templates_are_filled() {
        let mut assembler = assembler(EngineConfig::default());
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..50 {
            let encounter = assembler.assemble(3, false, None, &mut rng);
            for text in [&encounter.narrative, &encounter.manifest, &encounter.consequence] {
                assert!(!text.contains("{captain}") && !text.contains("{casualties}"), "{text}");
            }
        }
    }
}
