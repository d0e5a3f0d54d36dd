//! HTTP API handlers for evalboard-ui

pub mod health;
pub mod scores;
pub mod search;
pub mod teams;
pub mod ui;

pub use health::health_routes;
pub use scores::submit_scores;
pub use search::{live_search_input, live_search_stream, search_teams};
pub use teams::{get_team, list_teams};
pub use ui::{serve_board_js, serve_index, serve_team_js, serve_team_page};
