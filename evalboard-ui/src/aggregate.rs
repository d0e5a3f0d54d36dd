//! Score aggregation
//!
//! Collects everything the scores panel shows for one team: the best
//! available AI evaluation (probed across several collections, newest
//! preferred) and the jury score entries with their per-category
//! averages. AI and jury fetches run concurrently.

use evalboard_common::probe::{MatchBy, JURY_COLLECTION, PROBE_PLAN};
use evalboard_common::records::{jury_averages, Evaluation, JuryAverages, JuryEntry, TeamRecord};
use evalboard_common::store::{RecordStore, SelectQuery, StoreError};

/// Aggregated scores for one team.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamScores {
    pub ai: Option<Evaluation>,
    pub jury: Vec<JuryEntry>,
    /// False when the jury collection is not provisioned. Scoring is
    /// then disabled and the page shows a setup notice instead.
    pub scoring_available: bool,
}

impl TeamScores {
    pub fn averages(&self) -> Option<JuryAverages> {
        jury_averages(&self.jury)
    }

    /// A team locks once any jury entry exists.
    pub fn locked(&self) -> bool {
        !self.jury.is_empty()
    }

    /// AI results stay hidden until a jury entry exists and an AI
    /// evaluation was actually found. Either one alone keeps the gate
    /// closed.
    pub fn ai_revealed(&self) -> bool {
        !self.jury.is_empty() && self.ai.is_some()
    }
}

/// Fetch AI and jury scores for a resolved team concurrently.
pub async fn collect(store: &dyn RecordStore, team: &TeamRecord) -> TeamScores {
    let (ai, (jury, scoring_available)) =
        tokio::join!(probe_ai(store, team), fetch_jury(store, &team.team_id));
    TeamScores {
        ai,
        jury,
        scoring_available,
    }
}

/// Walk the probe plan and return the first evaluation found.
///
/// Sources are tried strictly in plan order, name columns before id
/// columns, and the walk stops at the first row. A missing collection
/// skips to the next source; any other store failure is logged and the
/// walk continues, so one bad source cannot blank the panel.
pub async fn probe_ai(store: &dyn RecordStore, team: &TeamRecord) -> Option<Evaluation> {
    for source in PROBE_PLAN {
        for probe_col in source.columns {
            let mut query = SelectQuery::from(source.collection);
            query = match probe_col.match_by {
                MatchBy::Name => {
                    let name = team.team_name.trim();
                    if name.is_empty() {
                        continue;
                    }
                    query.ilike(probe_col.column, name)
                }
                MatchBy::Id => {
                    if team.team_id.is_empty() {
                        continue;
                    }
                    query.eq(probe_col.column, team.team_id.as_str())
                }
            };
            if let Some((column, direction)) = source.sort {
                query = query.order_by(column, direction);
            }

            match store.maybe_single(query).await {
                Ok(Some(row)) => {
                    tracing::debug!(
                        collection = source.collection,
                        column = probe_col.column,
                        "AI evaluation found"
                    );
                    return Some(Evaluation::from_row(source, &row));
                }
                Ok(None) => {}
                Err(StoreError::MissingCollection(_)) => {
                    tracing::debug!(
                        collection = source.collection,
                        "Collection not provisioned, skipping source"
                    );
                    break;
                }
                Err(e) => {
                    tracing::warn!(
                        collection = source.collection,
                        column = probe_col.column,
                        error = %e,
                        "Probe failed, continuing"
                    );
                }
            }
        }
    }
    None
}

/// Fetch all jury entries for a team.
///
/// Returns the entries plus whether scoring is available at all; a
/// missing jury collection disables scoring, while a transient fetch
/// failure just leaves the list empty.
pub async fn fetch_jury(store: &dyn RecordStore, team_id: &str) -> (Vec<JuryEntry>, bool) {
    if team_id.is_empty() {
        return (Vec::new(), true);
    }

    match store
        .select(SelectQuery::from(JURY_COLLECTION).eq("idea_id", team_id))
        .await
    {
        Ok(rows) => (rows.iter().map(JuryEntry::from_row).collect(), true),
        Err(StoreError::MissingCollection(_)) => {
            tracing::warn!("Jury collection not provisioned; scoring disabled");
            (Vec::new(), false)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Jury fetch failed");
            (Vec::new(), true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evalboard_common::store::{MemoryStore, Row};
    use serde_json::{json, Value};

    fn row(value: Value) -> Row {
        value.as_object().expect("object").clone()
    }

    fn team(id: &str, name: &str) -> TeamRecord {
        TeamRecord {
            team_id: id.to_string(),
            team_name: name.to_string(),
            ..TeamRecord::default()
        }
    }

    #[tokio::test]
    async fn first_probe_hit_short_circuits() {
        let store = MemoryStore::new();
        store.seed(
            "ai_evaluations",
            vec![row(json!({
                "team_name": "Alpha",
                "desirability_score": 8.2
            }))],
        );
        store.seed(
            "idea_submissions",
            vec![row(json!({
                "team_name": "Alpha",
                "desirability_score": 1.0
            }))],
        );

        let eval = probe_ai(&store, &team("t-1", "Alpha")).await.expect("hit");
        assert_eq!(eval.source, "ai_evaluations");
        assert_eq!(eval.desirability, Some(8.2));
        assert_eq!(store.reads_issued(), 1);
    }

    #[tokio::test]
    async fn name_column_is_tried_before_id_column() {
        let store = MemoryStore::new();
        store.seed(
            "ai_evaluations",
            vec![
                row(json!({"team_id": "t-1", "desirability_score": 1.0})),
                row(json!({"team_name": "alpha", "desirability_score": 9.0})),
            ],
        );

        let eval = probe_ai(&store, &team("t-1", " Alpha ")).await.expect("hit");
        assert_eq!(eval.desirability, Some(9.0));
    }

    #[tokio::test]
    async fn missing_collections_fall_through_to_legacy_sources() {
        let store = MemoryStore::new();
        store.seed(
            "evaluation_runs",
            vec![row(json!({
                "team_name": "Alpha",
                "desirability_score": 85
            }))],
        );

        let eval = probe_ai(&store, &team("t-1", "Alpha")).await.expect("hit");
        assert_eq!(eval.source, "evaluation_runs");
        assert_eq!(eval.desirability, Some(8.5));
    }

    #[tokio::test]
    async fn newest_evaluation_wins_within_a_source() {
        let store = MemoryStore::new();
        store.seed(
            "ai_evaluations",
            vec![
                row(json!({
                    "team_name": "Alpha",
                    "desirability_score": 5.0,
                    "evaluated_at": "2025-01-01T00:00:00Z"
                })),
                row(json!({
                    "team_name": "Alpha",
                    "desirability_score": 7.0,
                    "evaluated_at": "2025-04-01T00:00:00Z"
                })),
            ],
        );

        let eval = probe_ai(&store, &team("t-1", "Alpha")).await.expect("hit");
        assert_eq!(eval.desirability, Some(7.0));
    }

    #[tokio::test]
    async fn probe_errors_continue_to_later_sources() {
        let store = MemoryStore::new();
        store.seed("ai_evaluations", vec![]);
        store.seed(
            "human_evaluations",
            vec![row(json!({
                "team_name": "Alpha",
                "desirability_score": 6.0
            }))],
        );
        store.fail_next_select("flaky");

        let eval = probe_ai(&store, &team("t-1", "Alpha")).await.expect("hit");
        assert_eq!(eval.source, "human_evaluations");
    }

    #[tokio::test]
    async fn no_rows_anywhere_yields_none() {
        let store = MemoryStore::new();
        for collection in [
            "ai_evaluations",
            "human_evaluations",
            "evaluation_runs",
            "idea_submissions",
        ] {
            store.create_collection(collection);
        }
        assert_eq!(probe_ai(&store, &team("t-1", "Alpha")).await, None);
    }

    #[tokio::test]
    async fn missing_jury_collection_disables_scoring() {
        let store = MemoryStore::new();
        let (entries, available) = fetch_jury(&store, "t-1").await;
        assert!(entries.is_empty());
        assert!(!available);
    }

    #[tokio::test]
    async fn transient_jury_failure_keeps_scoring_enabled() {
        let store = MemoryStore::new();
        store.create_collection(JURY_COLLECTION);
        store.fail_next_select("flaky");
        let (entries, available) = fetch_jury(&store, "t-1").await;
        assert!(entries.is_empty());
        assert!(available);
    }

    #[tokio::test]
    async fn collect_combines_ai_and_jury() {
        let store = MemoryStore::new();
        store.seed(
            "ai_evaluations",
            vec![row(json!({"team_name": "Alpha", "desirability_score": 8.0}))],
        );
        store.seed(
            JURY_COLLECTION,
            vec![row(json!({
                "idea_id": "t-1",
                "team_name": "Alpha",
                "desirability_score": 7.0,
                "feasibility_score": 6.0,
                "viability_score": 8.0,
                "presentation_score": 9.0
            }))],
        );

        let scores = collect(&store, &team("t-1", "Alpha")).await;
        assert!(scores.ai.is_some());
        assert_eq!(scores.jury.len(), 1);
        assert!(scores.scoring_available);
        assert!(scores.locked());
        assert!(scores.ai_revealed());
        let avg = scores.averages().expect("averages");
        assert_eq!(avg.presentation, 9.0);
    }

    #[test]
    fn reveal_gate_requires_both_sides() {
        let ai = Evaluation {
            source: "ai_evaluations",
            desirability: Some(8.0),
            feasibility: None,
            viability: None,
            average: None,
            market_readiness: None,
            execution_risk: None,
            summary: None,
            insights: None,
            market_context_signal: None,
            execution_readiness_signal: None,
            evaluated_at: None,
        };
        let entry = JuryEntry {
            idea_id: "t-1".into(),
            team_name: "Alpha".into(),
            desirability: 5.0,
            feasibility: 5.0,
            viability: 5.0,
            presentation: 5.0,
            created_at: None,
        };

        let neither = TeamScores {
            ai: None,
            jury: vec![],
            scoring_available: true,
        };
        assert!(!neither.ai_revealed());

        let only_ai = TeamScores {
            ai: Some(ai.clone()),
            jury: vec![],
            scoring_available: true,
        };
        assert!(!only_ai.ai_revealed());

        let only_jury = TeamScores {
            ai: None,
            jury: vec![entry.clone()],
            scoring_available: true,
        };
        assert!(!only_jury.ai_revealed());

        let both = TeamScores {
            ai: Some(ai),
            jury: vec![entry],
            scoring_available: true,
        };
        assert!(both.ai_revealed());
    }
}
