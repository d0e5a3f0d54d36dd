//! Team listing and detail endpoints

use axum::{
    extract::{Query, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio_util::sync::CancellationToken;

use evalboard_common::probe::TEAMS_COLLECTION;
use evalboard_common::records::{split_list, Evaluation, JuryAverages, Member, TeamRecord};
use evalboard_common::store::{Direction, Row, SelectQuery};

use crate::aggregate;
use crate::resolver::{self, Resolution};
use crate::AppState;

/// Summary of one team on the listing page
#[derive(Debug, Serialize)]
pub struct TeamPreview {
    pub team_id: String,
    pub team_name: Option<String>,
    pub problem_title: Option<String>,
    pub problem_statement: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TeamListResponse {
    pub teams: Vec<TeamPreview>,
}

/// GET /api/teams
///
/// All submissions ordered by team name. Imported data sometimes
/// carries reserved routing tokens as ids; those rows are dropped so
/// the listing never links to them.
pub async fn list_teams(
    State(state): State<AppState>,
) -> Result<Json<TeamListResponse>, TeamError> {
    let rows = state
        .store
        .select(
            SelectQuery::from(TEAMS_COLLECTION)
                .columns(&["team_id", "team_name", "problem_title", "problem_statement"])
                .order_by("team_name", Direction::Ascending),
        )
        .await
        .map_err(|e| TeamError::LookupFailed(format!("Teams fetch error: {e}")))?;

    let teams = rows
        .iter()
        .filter_map(|row| {
            let team_id = row.get("team_id")?.as_str()?.to_string();
            if team_id.is_empty() || resolver::is_reserved(&team_id) {
                return None;
            }
            Some(TeamPreview {
                team_id,
                team_name: string_field(row, "team_name"),
                problem_title: string_field(row, "problem_title"),
                problem_statement: string_field(row, "problem_statement"),
            })
        })
        .collect();

    Ok(Json(TeamListResponse { teams }))
}

fn string_field(row: &Row, column: &str) -> Option<String> {
    row.get(column).and_then(|v| v.as_str()).map(str::to_string)
}

#[derive(Debug, Deserialize)]
pub struct DetailParams {
    /// Browser location path, used to re-derive a segment when the
    /// route param is a reserved routing artifact.
    pub path: Option<String>,
}

/// Team page payload: the record, the jury panel, and the AI block
/// (present only once revealed).
#[derive(Debug, Serialize)]
pub struct TeamDetailResponse {
    pub team: TeamView,
    pub jury: JuryPanel,
    pub ai_revealed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai: Option<Evaluation>,
}

#[derive(Debug, Serialize)]
pub struct JuryPanel {
    pub count: usize,
    pub locked: bool,
    pub scoring_available: bool,
    pub averages: Option<JuryAverages>,
}

/// Presentation shape of a team record: list-like fields arrive as
/// comma-separated text in the store and are split here.
#[derive(Debug, Serialize)]
pub struct TeamView {
    pub team_id: String,
    pub team_name: String,
    pub problem_title: Option<String>,
    pub problem_statement: Option<String>,
    pub proposed_solution: Option<String>,
    pub target_users: Vec<String>,
    pub innovation_highlights: Vec<String>,
    pub tech_stack: Vec<String>,
    pub market_readiness: Option<String>,
    pub execution_risk: Option<String>,
    pub business_model: Option<String>,
    pub market_insight: Option<String>,
    pub team_size: Option<String>,
    pub contact_email: Option<String>,
    pub members: Vec<Member>,
}

impl TeamView {
    fn from_record(team: &TeamRecord) -> Self {
        let listify = |field: &Option<String>| {
            field.as_deref().map(split_list).unwrap_or_default()
        };
        Self {
            team_id: team.team_id.clone(),
            team_name: team.team_name.clone(),
            problem_title: team.problem_title.clone(),
            problem_statement: team.problem_statement.clone(),
            proposed_solution: team.proposed_solution.clone(),
            target_users: listify(&team.target_users),
            innovation_highlights: listify(&team.innovation_highlights),
            tech_stack: listify(&team.tech_stack),
            market_readiness: team.market_readiness.clone(),
            execution_risk: team.execution_risk.clone(),
            business_model: team.business_model.clone(),
            market_insight: team.market_insight.clone(),
            team_size: team.team_size.clone(),
            contact_email: team.contact_email.clone(),
            members: team.members_with_roles(),
        }
    }
}

/// GET /api/teams/:segment
///
/// Resolves the segment (team name first, team id second) and
/// aggregates the panel state. The raw path is used for the id match
/// because browsers percent-encode names but ids are stored verbatim.
/// `?path=` carries the browser location so a fallback-rendered page
/// whose param is reserved can still be resolved; while no usable
/// segment exists the resolver polls on its bounded schedule, and a
/// dropped connection cancels the wait.
pub async fn get_team(
    State(state): State<AppState>,
    uri: Uri,
    Query(params): Query<DetailParams>,
) -> Result<Json<TeamDetailResponse>, TeamError> {
    let raw_segment = uri
        .path()
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string();

    let path_hint = params.path.clone();
    let observed_path = path_hint
        .clone()
        .unwrap_or_else(|| uri.path().to_string());

    let cancel = CancellationToken::new();
    let _teardown = cancel.clone().drop_guard();

    let source = || {
        if !raw_segment.is_empty() && !resolver::is_reserved(&raw_segment) {
            Some(raw_segment.clone())
        } else {
            path_hint.as_deref().and_then(resolver::segment_from_path)
        }
    };

    let outcome =
        resolver::resolve_when_available(state.store.as_ref(), source, &observed_path, &cancel)
            .await
            .map_err(|e| TeamError::LookupFailed(format!("Team lookup failed: {e}")))?;

    match outcome {
        Resolution::Resolved(team) => {
            let scores = aggregate::collect(state.store.as_ref(), &team).await;
            let ai_revealed = scores.ai_revealed();
            Ok(Json(TeamDetailResponse {
                team: TeamView::from_record(&team),
                jury: JuryPanel {
                    count: scores.jury.len(),
                    locked: scores.locked(),
                    scoring_available: scores.scoring_available,
                    averages: scores.averages(),
                },
                ai_revealed,
                ai: if ai_revealed { scores.ai } else { None },
            }))
        }
        Resolution::NotFound {
            segment,
            redirect_home,
        } => Err(TeamError::NotFound {
            segment,
            redirect_home,
        }),
    }
}

/// Team API errors
#[derive(Debug)]
pub enum TeamError {
    NotFound {
        segment: String,
        redirect_home: bool,
    },
    LookupFailed(String),
}

impl IntoResponse for TeamError {
    fn into_response(self) -> Response {
        match self {
            TeamError::NotFound {
                segment,
                redirect_home,
            } => {
                let body = Json(json!({
                    "error": "team_not_found",
                    "segment": segment,
                    "redirect_home": redirect_home,
                }));
                (StatusCode::NOT_FOUND, body).into_response()
            }
            TeamError::LookupFailed(message) => {
                let body = Json(json!({
                    "error": message,
                }));
                (StatusCode::BAD_GATEWAY, body).into_response()
            }
        }
    }
}
