//! Team search endpoints
//!
//! One-shot search plus the live variant. A live client opens the SSE
//! stream, learns its session id from the first event, then POSTs each
//! keystroke against that id; debounced result batches flow back over
//! the stream.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    response::{IntoResponse, Response},
    Json,
};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::search::{self, SearchHit};
use crate::AppState;

/// Query text, as `?q=` on the one-shot endpoint or as the POST body
/// of a live keystroke.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchHit>,
}

/// GET /api/search
///
/// One-shot variant for clients without an open live session. Store
/// failures log and read as empty; the box just shows no suggestions.
pub async fn search_teams(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<SearchResponse> {
    let results = match search::search_teams(state.store.as_ref(), &params.q).await {
        Ok(hits) => hits,
        Err(e) => {
            warn!(error = %e, "Search failed");
            Vec::new()
        }
    };
    Json(SearchResponse {
        query: params.q,
        results,
    })
}

/// GET /api/search/live
///
/// Opens a live search session. The first event announces the session
/// id; each debounced query then delivers one `results` event carrying
/// a JSON [`search::SearchUpdate`]. Disconnecting tears the session
/// down.
pub async fn live_search_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut session = state.live_search.open(Arc::clone(&state.store));
    info!(session = session.id, "New live search client connected");

    let stream = async_stream::stream! {
        yield Ok(Event::default()
            .event("session")
            .data(session.id.to_string()));

        while let Some(update) = session.updates.recv().await {
            debug!(
                session = session.id,
                seq = update.seq,
                "SSE: delivering search results"
            );
            match serde_json::to_string(&update) {
                Ok(payload) => yield Ok(Event::default().event("results").data(payload)),
                Err(e) => warn!(error = %e, "Search update serialization failed"),
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    )
}

/// POST /api/search/live/:session
///
/// Feeds one keystroke into an open session. Accepted input is
/// answered over the session's stream, not here.
pub async fn live_search_input(
    State(state): State<AppState>,
    Path(session): Path<u64>,
    Json(input): Json<SearchParams>,
) -> Result<StatusCode, SearchError> {
    if state.live_search.feed(session, input.q) {
        Ok(StatusCode::ACCEPTED)
    } else {
        Err(SearchError::UnknownSession(session))
    }
}

/// Search API errors
#[derive(Debug)]
pub enum SearchError {
    UnknownSession(u64),
}

impl IntoResponse for SearchError {
    fn into_response(self) -> Response {
        match self {
            SearchError::UnknownSession(session) => {
                let body = Json(json!({
                    "error": format!("No live search session {session}"),
                }));
                (StatusCode::NOT_FOUND, body).into_response()
            }
        }
    }
}
