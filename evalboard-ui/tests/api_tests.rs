//! Integration tests for evalboard-ui API endpoints
//!
//! Tests cover:
//! - Health endpoint
//! - Page shells and static assets
//! - Team listing (ordering, reserved-id filtering, store failures)
//! - Team detail resolution (names, raw ids, path hints, misses)
//! - AI score reveal gating
//! - Jury score submission (accept, lock, validation, conflicts)
//! - One-shot and live search

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use futures::StreamExt;
use serde_json::{json, Value};
use tower::util::ServiceExt; // for `oneshot` method

use evalboard_common::probe::{JURY_COLLECTION, TEAMS_COLLECTION};
use evalboard_common::store::{MemoryStore, Row};
use evalboard_ui::{build_router, AppState};

fn row(value: Value) -> Row {
    value.as_object().expect("object").clone()
}

/// Test helper: store with two teams and an empty jury collection
fn seeded_store() -> Arc<MemoryStore> {
    let store = MemoryStore::new();
    store.seed(
        TEAMS_COLLECTION,
        vec![
            row(json!({
                "team_id": "t-1",
                "team_name": "Alpha Squad",
                "problem_title": "Cold chains",
                "problem_statement": "Vaccine logistics break down at the last mile.",
                "proposed_solution": "Solar-powered micro depots.",
                "target_users": "Clinics, Field teams",
                "tech_stack": "Rust, Postgres",
                "team_members": "Asha, Binod",
                "team_roles": "Lead"
            })),
            row(json!({"team_id": "t-2", "team_name": "Beta Crew"})),
        ],
    );
    store.create_collection(JURY_COLLECTION);
    Arc::new(store)
}

/// Test helper: create app over a store
fn setup_app(store: Arc<MemoryStore>) -> axum::Router {
    build_router(AppState::new(store))
}

/// Test helper: create request with empty body
fn test_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Test helper: create POST request with a JSON body
fn test_post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Test helper: extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

/// Test helper: extract text body from response
async fn extract_text(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    String::from_utf8(bytes.to_vec()).expect("Should be UTF-8")
}

fn submission(d: &str, f: &str, v: &str, p: &str) -> Value {
    json!({
        "desirability": d,
        "feasibility": f,
        "viability": v,
        "presentation": p,
    })
}

// =============================================================================
// Health Endpoint Tests
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = setup_app(seeded_store());

    let response = app.oneshot(test_request("GET", "/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "evalboard-ui");
    assert!(body["version"].is_string());
}

// =============================================================================
// Page Shell and Static Asset Tests
// =============================================================================

#[tokio::test]
async fn test_pages_and_static_assets() {
    let app = setup_app(seeded_store());

    let response = app.clone().oneshot(test_request("GET", "/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = extract_text(response.into_body()).await;
    assert!(html.contains("Project Evaluation Board"));

    // Team page shell is served for every segment, reserved ones included;
    // the page script and detail API decide what it names.
    let response = app
        .clone()
        .oneshot(test_request("GET", "/team/placeholder"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = extract_text(response.into_body()).await;
    assert!(html.contains("Jury Scoring Board"));

    let response = app
        .oneshot(test_request("GET", "/static/team.js"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "application/javascript"
    );
}

// =============================================================================
// Team Listing Tests
// =============================================================================

#[tokio::test]
async fn test_team_listing_orders_by_name() {
    let store = MemoryStore::new();
    store.seed(
        TEAMS_COLLECTION,
        vec![
            row(json!({"team_id": "t-2", "team_name": "Zeta"})),
            row(json!({"team_id": "t-1", "team_name": "Alpha"})),
        ],
    );
    let app = setup_app(Arc::new(store));

    let response = app.oneshot(test_request("GET", "/api/teams")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    let teams = body["teams"].as_array().unwrap();
    assert_eq!(teams.len(), 2);
    assert_eq!(teams[0]["team_name"], "Alpha");
    assert_eq!(teams[1]["team_name"], "Zeta");
}

#[tokio::test]
async fn test_team_listing_drops_reserved_and_empty_ids() {
    let store = MemoryStore::new();
    store.seed(
        TEAMS_COLLECTION,
        vec![
            row(json!({"team_id": "placeholder", "team_name": "Import artifact"})),
            row(json!({"team_id": "view", "team_name": "Another artifact"})),
            row(json!({"team_id": "", "team_name": "No id"})),
            row(json!({"team_name": "No id at all"})),
            row(json!({"team_id": "t-1", "team_name": "Real Team"})),
        ],
    );
    let app = setup_app(Arc::new(store));

    let response = app.oneshot(test_request("GET", "/api/teams")).await.unwrap();
    let body = extract_json(response.into_body()).await;
    let teams = body["teams"].as_array().unwrap();
    assert_eq!(teams.len(), 1);
    assert_eq!(teams[0]["team_id"], "t-1");
}

#[tokio::test]
async fn test_team_listing_store_failure_is_bad_gateway() {
    let store = seeded_store();
    store.fail_next_select("store down");
    let app = setup_app(store);

    let response = app.oneshot(test_request("GET", "/api/teams")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body = extract_json(response.into_body()).await;
    assert!(body["error"].as_str().unwrap().contains("Teams fetch error"));
}

// =============================================================================
// Team Detail Tests
// =============================================================================

#[tokio::test]
async fn test_team_detail_by_encoded_name() {
    let app = setup_app(seeded_store());

    let response = app
        .oneshot(test_request("GET", "/api/teams/Alpha%20Squad"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["team"]["team_id"], "t-1");
    assert_eq!(body["team"]["team_name"], "Alpha Squad");
    assert_eq!(body["team"]["target_users"], json!(["Clinics", "Field teams"]));
    assert_eq!(body["team"]["tech_stack"], json!(["Rust", "Postgres"]));
    assert_eq!(
        body["team"]["members"],
        json!([
            {"name": "Asha", "role": "Lead"},
            {"name": "Binod", "role": "Member"},
        ])
    );
    assert_eq!(body["jury"]["count"], 0);
    assert_eq!(body["jury"]["locked"], false);
    assert_eq!(body["jury"]["scoring_available"], true);
    assert_eq!(body["ai_revealed"], false);
    assert!(body.get("ai").is_none());
}

#[tokio::test]
async fn test_team_detail_by_raw_id() {
    let app = setup_app(seeded_store());

    let response = app
        .oneshot(test_request("GET", "/api/teams/t-2"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["team"]["team_name"], "Beta Crew");
}

#[tokio::test]
async fn test_team_detail_plain_miss_is_not_found() {
    let app = setup_app(seeded_store());

    let response = app
        .oneshot(test_request("GET", "/api/teams/nobody"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "team_not_found");
    assert_eq!(body["segment"], "nobody");
    assert_eq!(body["redirect_home"], false);
}

#[tokio::test]
async fn test_path_hint_recovers_reserved_param() {
    let app = setup_app(seeded_store());

    // A fallback-rendered page reports `view` as its route param but the
    // browser location still names the team.
    let response = app
        .oneshot(test_request(
            "GET",
            "/api/teams/view?path=%2Fteam%2FAlpha%2520Squad",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["team"]["team_id"], "t-1");
}

#[tokio::test(start_paused = true)]
async fn test_reserved_segment_without_hint_redirects_home() {
    let store = seeded_store();
    let app = setup_app(Arc::clone(&store));

    let response = app
        .oneshot(test_request("GET", "/api/teams/placeholder"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["redirect_home"], true);
    assert_eq!(store.reads_issued(), 0);
}

#[tokio::test]
async fn test_team_detail_store_failure_is_bad_gateway() {
    let store = seeded_store();
    store.fail_next_select("store down");
    let app = setup_app(store);

    let response = app
        .oneshot(test_request("GET", "/api/teams/Alpha%20Squad"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body = extract_json(response.into_body()).await;
    assert!(body["error"].as_str().unwrap().contains("Team lookup failed"));
}

#[tokio::test]
async fn test_missing_jury_collection_disables_scoring() {
    let store = MemoryStore::new();
    store.seed(
        TEAMS_COLLECTION,
        vec![row(json!({"team_id": "t-1", "team_name": "Alpha"}))],
    );
    let app = setup_app(Arc::new(store));

    let response = app
        .oneshot(test_request("GET", "/api/teams/t-1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["jury"]["scoring_available"], false);
}

// =============================================================================
// AI Reveal Gating Tests
// =============================================================================

#[tokio::test]
async fn test_ai_stays_hidden_until_jury_entry_exists() {
    let store = seeded_store();
    store.seed(
        "ai_evaluations",
        vec![row(json!({
            "team_name": "Alpha Squad",
            "desirability_score": 8.4,
            "summary": "Strong problem fit."
        }))],
    );
    let app = setup_app(Arc::clone(&store));

    // AI evaluation exists but no jury entry yet: gate stays closed.
    let response = app
        .clone()
        .oneshot(test_request("GET", "/api/teams/t-1"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["ai_revealed"], false);
    assert!(body.get("ai").is_none());

    store.seed(
        JURY_COLLECTION,
        vec![row(json!({
            "idea_id": "t-1",
            "team_name": "Alpha Squad",
            "desirability_score": 7.0,
            "feasibility_score": 6.0,
            "viability_score": 8.0,
            "presentation_score": 9.0
        }))],
    );

    let response = app
        .oneshot(test_request("GET", "/api/teams/t-1"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["ai_revealed"], true);
    assert_eq!(body["ai"]["desirability"], json!(8.4));
    assert_eq!(body["ai"]["summary"], "Strong problem fit.");
    assert_eq!(body["jury"]["count"], 1);
    assert_eq!(body["jury"]["locked"], true);
    assert_eq!(body["jury"]["averages"]["presentation"], json!(9.0));
}

// =============================================================================
// Jury Submission Tests
// =============================================================================

#[tokio::test]
async fn test_submit_scores_accepts_then_locks() {
    let app = setup_app(seeded_store());

    let response = app
        .clone()
        .oneshot(test_post(
            "/api/teams/t-1/scores",
            submission("8", "6.5", "7", "9"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["submitted"], true);
    assert_eq!(body["entry"]["desirability"], json!(8.0));
    assert_eq!(body["entry"]["feasibility"], json!(6.5));
    assert_eq!(body["jury"]["count"], 1);
    assert_eq!(body["jury"]["locked"], true);
    assert_eq!(body["jury"]["averages"]["presentation"], json!(9.0));

    // Second submission for the same team is refused.
    let response = app
        .oneshot(test_post(
            "/api/teams/t-1/scores",
            submission("5", "5", "5", "5"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "already_evaluated");
    assert_eq!(body["message"], "This team has already been evaluated.");
}

#[tokio::test]
async fn test_submit_scores_clamp_out_of_range_values() {
    let app = setup_app(seeded_store());

    let response = app
        .oneshot(test_post(
            "/api/teams/t-1/scores",
            submission("12", "-3", "5.5", "10"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["entry"]["desirability"], json!(10.0));
    assert_eq!(body["entry"]["feasibility"], json!(0.0));
}

#[tokio::test]
async fn test_submit_invalid_score_names_first_bad_field() {
    let app = setup_app(seeded_store());

    let response = app
        .oneshot(test_post(
            "/api/teams/t-1/scores",
            submission("7", "oops", "", "2"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "invalid_score");
    assert_eq!(body["field"], "feasibility");
    assert_eq!(
        body["message"],
        "Enter valid jury scores (0 to 10) for all 4 categories."
    );
}

#[tokio::test]
async fn test_submit_for_unknown_team_reports_incomplete_data() {
    let app = setup_app(seeded_store());

    let response = app
        .oneshot(test_post(
            "/api/teams/ghost/scores",
            submission("5", "5", "5", "5"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "incomplete_team");
    assert_eq!(
        body["message"],
        "Team data not loaded properly. Please refresh the page."
    );
}

#[tokio::test]
async fn test_submit_write_failure_is_retryable() {
    let store = seeded_store();
    store.fail_next_insert("connection reset by peer");
    let app = setup_app(store);

    let response = app
        .clone()
        .oneshot(test_post(
            "/api/teams/t-1/scores",
            submission("5", "5", "5", "5"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "write_failed");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("connection reset by peer"));

    // The failure did not consume the one-per-team slot.
    let response = app
        .oneshot(test_post(
            "/api/teams/t-1/scores",
            submission("5", "5", "5", "5"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_submit_lost_insert_race_conflicts() {
    let store = seeded_store();
    store.set_unique(JURY_COLLECTION, "team_name");
    // Competing entry landed under another id; only the constraint
    // catches the clash.
    store.seed(
        JURY_COLLECTION,
        vec![row(json!({"idea_id": "t-other", "team_name": "Alpha Squad"}))],
    );
    let app = setup_app(store);

    let response = app
        .oneshot(test_post(
            "/api/teams/t-1/scores",
            submission("5", "5", "5", "5"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "already_evaluated");
}

// =============================================================================
// Search Tests
// =============================================================================

#[tokio::test]
async fn test_one_shot_search() {
    let store = seeded_store();
    let app = setup_app(Arc::clone(&store));

    // Blank queries never reach the store.
    let response = app
        .clone()
        .oneshot(test_request("GET", "/api/search"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["results"], json!([]));
    assert_eq!(store.reads_issued(), 0);

    let response = app
        .oneshot(test_request("GET", "/api/search?q=alpha"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["query"], "alpha");
    assert_eq!(body["results"].as_array().unwrap().len(), 1);
    assert_eq!(body["results"][0]["team_name"], "Alpha Squad");
}

#[tokio::test(start_paused = true)]
async fn test_live_search_round_trip() {
    let app = setup_app(seeded_store());

    let response = app
        .clone()
        .oneshot(test_request("GET", "/api/search/live"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()["content-type"].to_str().unwrap();
    assert!(content_type.starts_with("text/event-stream"));

    // First event announces the session id; ids start at 1 for a fresh
    // registry.
    let mut frames = response.into_body().into_data_stream();
    let first = frames.next().await.expect("session event").expect("frame");
    let text = String::from_utf8(first.to_vec()).expect("utf8");
    assert!(text.contains("event: session"));
    assert!(text.contains("data: 1"));

    let response = app
        .oneshot(test_post("/api/search/live/1", json!({"q": "beta"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    // The debounced query answers over the stream.
    let mut delivered = String::new();
    while !delivered.contains("event: results") {
        let frame = frames.next().await.expect("results event").expect("frame");
        delivered.push_str(&String::from_utf8(frame.to_vec()).expect("utf8"));
    }
    assert!(delivered.contains("Beta Crew"));
}

#[tokio::test]
async fn test_live_search_unknown_session_is_not_found() {
    let app = setup_app(seeded_store());

    let response = app
        .oneshot(test_post("/api/search/live/999", json!({"q": "alpha"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = extract_json(response.into_body()).await;
    assert!(body["error"].as_str().unwrap().contains("999"));
}
