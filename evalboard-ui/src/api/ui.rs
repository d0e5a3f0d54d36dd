//! UI serving routes
//!
//! Serves the static HTML/JS for the listing and team pages.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

const INDEX_HTML: &str = include_str!("../ui/index.html");
const TEAM_HTML: &str = include_str!("../ui/team.html");
const BOARD_JS: &str = include_str!("../ui/board.js");
const TEAM_JS: &str = include_str!("../ui/team.js");

/// GET /
///
/// Serves the team listing page
pub async fn serve_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// GET /team/:segment
///
/// Serves the team page shell for every segment, including reserved
/// routing artifacts; the page script derives the real team from the
/// browser location and the API decides what it names.
pub async fn serve_team_page() -> Html<&'static str> {
    Html(TEAM_HTML)
}

/// GET /static/board.js
pub async fn serve_board_js() -> Response {
    (
        StatusCode::OK,
        [("content-type", "application/javascript")],
        BOARD_JS,
    )
        .into_response()
}

/// GET /static/team.js
pub async fn serve_team_js() -> Response {
    (
        StatusCode::OK,
        [("content-type", "application/javascript")],
        TEAM_JS,
    )
        .into_response()
}
