//! Evaluation probe plan
//!
//! Ordered list of collections that may hold an AI evaluation for a
//! team. The order is part of the product contract: dedicated AI
//! results are probed first, legacy locations after, and the first
//! source that yields a row wins. Later sources are never consulted.

use crate::store::Direction;

/// Collection holding team submissions (also the listing source).
pub const TEAMS_COLLECTION: &str = "idea_submissions";

/// Collection holding jury score entries.
pub const JURY_COLLECTION: &str = "human_evaluations";

/// How a probe column is matched against the team.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchBy {
    /// Case-insensitive match against the trimmed team name.
    Name,
    /// Exact match against the team identifier.
    Id,
}

/// One candidate column within a probe source.
#[derive(Debug, Clone, Copy)]
pub struct ProbeColumn {
    pub column: &'static str,
    pub match_by: MatchBy,
}

/// Value scale of a probe source's numeric score fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreScale {
    /// Scores already on the 0 to 10 scale.
    TenPoint,
    /// Legacy 0 to 100 scores, divided by ten during normalization.
    Percent,
}

/// One collection to probe for an AI evaluation.
#[derive(Debug, Clone, Copy)]
pub struct ProbeSource {
    pub collection: &'static str,
    /// Columns to try, in order. Name columns come before id columns.
    pub columns: &'static [ProbeColumn],
    /// Sort applied before taking the single newest row, if any.
    pub sort: Option<(&'static str, Direction)>,
    pub scale: ScoreScale,
}

pub const PROBE_PLAN: &[ProbeSource] = &[
    ProbeSource {
        collection: "ai_evaluations",
        columns: &[
            ProbeColumn {
                column: "team_name",
                match_by: MatchBy::Name,
            },
            ProbeColumn {
                column: "team_id",
                match_by: MatchBy::Id,
            },
        ],
        sort: Some(("evaluated_at", Direction::Descending)),
        scale: ScoreScale::TenPoint,
    },
    ProbeSource {
        collection: "human_evaluations",
        columns: &[
            ProbeColumn {
                column: "team_name",
                match_by: MatchBy::Name,
            },
            ProbeColumn {
                column: "idea_id",
                match_by: MatchBy::Id,
            },
        ],
        sort: None,
        scale: ScoreScale::TenPoint,
    },
    ProbeSource {
        collection: "evaluation_runs",
        columns: &[ProbeColumn {
            column: "team_name",
            match_by: MatchBy::Name,
        }],
        sort: None,
        scale: ScoreScale::Percent,
    },
    ProbeSource {
        collection: "idea_submissions",
        columns: &[
            ProbeColumn {
                column: "team_name",
                match_by: MatchBy::Name,
            },
            ProbeColumn {
                column: "team_id",
                match_by: MatchBy::Id,
            },
        ],
        sort: None,
        scale: ScoreScale::TenPoint,
    },
];
