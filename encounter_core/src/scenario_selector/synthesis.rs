//! Built-in scenarios used when a pool has nothing to offer.
//!
//! This is the only place minimal scenarios are constructed.

use checkpoint_rules::{ScenarioType, ShipScenario, Violation};

/// Minimal scenario of the given kind.
pub fn synthesize(kind: ScenarioType) -> ShipScenario {
    match kind {
        ScenarioType::Standard => ShipScenario::approved("synthetic_standard", "Routine traffic")
            .with_story_text("The {ship} requests clearance through the checkpoint.")
            .with_manifest_text("General cargo, nothing out of the ordinary.")
            .with_consequence_text("A cleared vessel was turned away. Command was not pleased."),
        ScenarioType::Invalid => ShipScenario::denied(
            "synthetic_invalid",
            "Irregular papers",
            Violation::Declared,
            "Manifest does not match the vessel's declared purpose",
        )
        .with_story_text("{captain} answers every question a little too quickly.")
        .with_manifest_text("Cargo listed as \"assorted goods\", no weights given.")
        .with_consequence_text("The irregular vessel was let through. {casualties} were hurt."),
        ScenarioType::StoryEvent => synthesize_story("generic"),
    }
}

/// Tag-specific story scenario, or a generic one for unknown tags.
pub fn synthesize_story(tag: &str) -> ShipScenario {
    let id = format!("synthetic_story_{}", tag.to_ascii_lowercase());
    match tag.to_ascii_lowercase().as_str() {
        "insurgent" => ShipScenario::story(id, "Insurgent contact", tag, false)
            .with_reason("Crew linked to insurgent activity")
            .with_story_text("One of the {ship}'s crew flinches at the sight of the scanner.")
            .with_manifest_text("Medical kits and ration bars, packed for a long stay.")
            .with_consequence_text(
                "Insurgents aboard the {ship} sabotaged the docks. {casualties} dead.",
            ),
        "bounty_hunter" => ShipScenario::story(id, "Hunter on contract", tag, true)
            .with_story_text("{captain} flashes a guild seal and asks for a fast lane.")
            .with_manifest_text("One restrained passenger, contract paperwork.")
            .with_consequence_text("The guild billed the station {credits} credits for the delay."),
        "traitor_officer" => ShipScenario::story(id, "Officer under suspicion", tag, false)
            .with_reason("Officer is flagged for desertion")
            .with_story_text("{rank} {captain} avoids eye contact and keeps the visor down.")
            .with_manifest_text("Officer's kit, one unlisted data spike.")
            .with_consequence_text(
                "The officer leaked patrol routes. {casualties} lost in an ambush.",
            ),
        _ => ShipScenario::story(id, "Unscheduled contact", tag, true)
            .with_story_text("The {ship} was not on today's schedule, but its papers are in order.")
            .with_manifest_text("Personal effects only."),
    }
}
