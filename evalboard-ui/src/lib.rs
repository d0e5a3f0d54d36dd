//! evalboard-ui library - evaluation board web module
//!
//! Serves the team listing and team detail pages plus the JSON API
//! behind them. Every read and write goes through the shared record
//! store gateway in `evalboard-common`.

use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;

use evalboard_common::store::RecordStore;

pub mod aggregate;
pub mod api;
pub mod demo;
pub mod guard;
pub mod resolver;
pub mod search;

use search::LiveSearchRegistry;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Gateway to the hosted record store
    pub store: Arc<dyn RecordStore>,
    /// Open live search sessions
    pub live_search: Arc<LiveSearchRegistry>,
}

impl AppState {
    /// Create new application state
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            live_search: Arc::new(LiveSearchRegistry::new()),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    Router::new()
        // Pages and static assets
        .route("/", get(api::serve_index))
        .route("/team/:segment", get(api::serve_team_page))
        .route("/static/board.js", get(api::serve_board_js))
        .route("/static/team.js", get(api::serve_team_js))
        // Team browsing
        .route("/api/teams", get(api::list_teams))
        .route("/api/teams/:segment", get(api::get_team))
        .route("/api/teams/:segment/scores", post(api::submit_scores))
        // Search
        .route("/api/search", get(api::search_teams))
        .route("/api/search/live", get(api::live_search_stream))
        .route("/api/search/live/:session", post(api::live_search_input))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
