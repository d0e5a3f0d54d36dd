//! Demo mode fixtures
//!
//! Seeds an in-memory store with a few teams and one AI evaluation so
//! the board can be explored without a hosted service. The jury
//! collection starts empty; submitting scores works and locks teams
//! exactly as it would against the real store.

use serde_json::json;

use evalboard_common::probe::{JURY_COLLECTION, TEAMS_COLLECTION};
use evalboard_common::store::{MemoryStore, Row};

/// Build the seeded demo store.
pub fn demo_store() -> MemoryStore {
    let store = MemoryStore::new();

    store.seed(
        TEAMS_COLLECTION,
        vec![
            team_row(json!({
                "team_id": "demo-aurora",
                "team_name": "Aurora Grid",
                "problem_title": "Rooftop solar goes to waste",
                "problem_statement": "Household panels overproduce at noon and the surplus is simply curtailed.",
                "proposed_solution": "A neighborhood battery pool with per-home settlement.",
                "target_users": "Homeowners, Housing cooperatives",
                "innovation_highlights": "Per-home settlement ledger, Grid-aware charging",
                "tech_stack": "Rust, Postgres, MQTT",
                "business_model": "Fee on each settled kilowatt-hour.",
                "market_insight": "Curtailment doubled in three years.",
                "team_size": 4,
                "team_members": "Iris, Mateo, Lena, Kofi",
                "team_roles": "Lead, Hardware, Backend",
                "contact_email": "aurora@example.org"
            })),
            team_row(json!({
                "team_id": "demo-harvest",
                "team_name": "Harvest Route",
                "problem_title": "Produce spoils between farm and market",
                "problem_statement": "Smallholders lose a third of every harvest to slow, uncoordinated transport.",
                "proposed_solution": "Pooled cold-chain pickups scheduled by ripeness forecasts.",
                "target_users": "Smallholder farms, Market vendors",
                "tech_stack": "Rust, SQLite",
                "team_size": 3,
                "team_members": "Amara, Jonas, Priya",
                "team_roles": "Lead, Logistics, Data",
                "contact_email": "harvest@example.org"
            })),
            team_row(json!({
                "team_id": "demo-quiet",
                "team_name": "Quiet Streets",
                "problem_title": "Night noise complaints go nowhere",
                "problem_statement": "Cities field thousands of noise complaints with no way to verify or locate them.",
                "proposed_solution": "Calibrated curbside sensors with complaint matching.",
                "target_users": "City councils",
                "team_members": "Noor, Felix",
                "team_roles": "Lead, Firmware",
                "contact_email": "quiet@example.org"
            })),
        ],
    );

    store.seed(
        "ai_evaluations",
        vec![team_row(json!({
            "team_name": "Aurora Grid",
            "desirability_score": 8.2,
            "feasibility_score": 6.9,
            "viability_score": 7.4,
            "average_dfv_score": 7.5,
            "market_readiness": 6.8,
            "execution_risk": 5.5,
            "summary": "Strong household demand and a credible settlement mechanism; hardware rollout is the main risk.",
            "insights": "Cooperatives are the fastest early channel.",
            "market_context_signal": "Curtailment rates are rising across residential solar markets.",
            "execution_readiness_signal": "Prototype pool running in one neighborhood.",
            "evaluated_at": "2025-06-14T09:30:00Z"
        }))],
    );

    store.create_collection(JURY_COLLECTION);

    store
}

fn team_row(value: serde_json::Value) -> Row {
    value.as_object().cloned().unwrap_or_default()
}
