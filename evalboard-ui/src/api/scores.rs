//! Jury score submission endpoint

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

use evalboard_common::probe::TEAMS_COLLECTION;
use evalboard_common::records::{JuryEntry, TeamRecord};
use evalboard_common::store::SelectQuery;

use crate::api::teams::JuryPanel;
use crate::guard::{self, RawScores, SubmitError};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub submitted: bool,
    pub entry: JuryEntry,
    pub jury: JuryPanel,
}

/// POST /api/teams/:segment/scores
///
/// The segment here is always the team id (the page submits with the
/// id it loaded). The record is re-fetched so the guard validates
/// against current store state; a team that vanished re-validates as
/// incomplete, which tells the juror to refresh.
pub async fn submit_scores(
    State(state): State<AppState>,
    Path(team_id): Path<String>,
    Json(raw): Json<RawScores>,
) -> Result<Json<SubmitResponse>, ScoreError> {
    let team = match state
        .store
        .maybe_single(SelectQuery::from(TEAMS_COLLECTION).eq("team_id", team_id.as_str()))
        .await
    {
        Ok(Some(row)) => TeamRecord::from_row(&row),
        Ok(None) => TeamRecord::default(),
        Err(e) => return Err(ScoreError(SubmitError::WriteFailed(e.to_string()))),
    };

    let receipt = guard::submit(state.store.as_ref(), &team, &raw)
        .await
        .map_err(ScoreError)?;

    Ok(Json(SubmitResponse {
        submitted: true,
        entry: receipt.entry,
        jury: JuryPanel {
            count: receipt.jury.len(),
            locked: true,
            scoring_available: true,
            averages: receipt.averages,
        },
    }))
}

/// Submission refusals mapped onto HTTP statuses. The `message` field
/// always carries the operator-facing text the page shows verbatim.
#[derive(Debug)]
pub struct ScoreError(pub SubmitError);

impl IntoResponse for ScoreError {
    fn into_response(self) -> Response {
        let message = self.0.to_string();
        match self.0 {
            SubmitError::AlreadyEvaluated => {
                let body = Json(json!({
                    "error": "already_evaluated",
                    "message": message,
                }));
                (StatusCode::CONFLICT, body).into_response()
            }
            SubmitError::IncompleteTeamData => {
                let body = Json(json!({
                    "error": "incomplete_team",
                    "message": message,
                }));
                (StatusCode::UNPROCESSABLE_ENTITY, body).into_response()
            }
            SubmitError::InvalidScore { field } => {
                let body = Json(json!({
                    "error": "invalid_score",
                    "field": field,
                    "message": message,
                }));
                (StatusCode::UNPROCESSABLE_ENTITY, body).into_response()
            }
            SubmitError::WriteFailed(_) => {
                let body = Json(json!({
                    "error": "write_failed",
                    "message": message,
                }));
                (StatusCode::BAD_GATEWAY, body).into_response()
            }
        }
    }
}
