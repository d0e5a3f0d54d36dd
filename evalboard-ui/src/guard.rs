//! Jury submission guard
//!
//! One jury evaluation per team. The guard validates a submission
//! end to end: the team must still be unevaluated, the record must be
//! complete, and all four category scores must parse. Accepted entries
//! are written in a single insert and the jury list is re-read so the
//! caller always returns store-backed state.

use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;

use evalboard_common::probe::JURY_COLLECTION;
use evalboard_common::records::{jury_averages, JuryAverages, JuryEntry, TeamRecord};
use evalboard_common::store::{RecordStore, StoreError};

use crate::aggregate;

/// Raw score inputs as submitted, one string per category.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawScores {
    pub desirability: String,
    pub feasibility: String,
    pub viability: String,
    pub presentation: String,
}

/// Why a submission was refused.
#[derive(Debug, Error, PartialEq)]
pub enum SubmitError {
    /// A jury entry already exists for this team.
    #[error("This team has already been evaluated.")]
    AlreadyEvaluated,

    /// The team record is missing its identifier or name.
    #[error("Team data not loaded properly. Please refresh the page.")]
    IncompleteTeamData,

    /// One of the four scores failed to parse.
    #[error("Enter valid jury scores (0 to 10) for all 4 categories.")]
    InvalidScore { field: &'static str },

    /// The store refused the submission or could not be reached. The
    /// message is surfaced verbatim and the caller may retry.
    #[error("{0}")]
    WriteFailed(String),
}

/// Accepted submission: the stored entry plus refreshed jury state.
#[derive(Debug, Clone)]
pub struct SubmitReceipt {
    pub entry: JuryEntry,
    pub jury: Vec<JuryEntry>,
    pub averages: Option<JuryAverages>,
}

/// Parse one raw score. Out-of-range numbers clamp into 0..=10; empty
/// or non-numeric input is rejected.
pub fn parse_score(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let value = trimmed.parse::<f64>().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(value.clamp(0.0, 10.0))
}

/// Per-keystroke input filter: a value that already parses above 10 is
/// refused outright, so the field never holds it even transiently.
/// Partial input that does not parse yet ("-", ".") passes through.
pub fn accepts_keystroke(value: &str) -> bool {
    if value.trim().is_empty() {
        return true;
    }
    match value.trim().parse::<f64>() {
        // NaN compares false here and is allowed through; the submit
        // guard rejects it later.
        Ok(n) => !(n > 10.0),
        Err(_) => true,
    }
}

/// Validate and store one jury submission.
///
/// Preconditions run in order: zero existing jury entries (checked
/// against the store, never a cached count), a complete team record,
/// then all four scores in category order. The winner of a concurrent
/// duplicate insert is decided by the store's unique constraint, which
/// also maps to [`SubmitError::AlreadyEvaluated`].
pub async fn submit(
    store: &dyn RecordStore,
    team: &TeamRecord,
    raw: &RawScores,
) -> Result<SubmitReceipt, SubmitError> {
    let (existing, _) = aggregate::fetch_jury(store, &team.team_id).await;
    if !existing.is_empty() {
        return Err(SubmitError::AlreadyEvaluated);
    }

    if !team.is_complete() {
        return Err(SubmitError::IncompleteTeamData);
    }

    let desirability = parse_score(&raw.desirability).ok_or(SubmitError::InvalidScore {
        field: "desirability",
    })?;
    let feasibility = parse_score(&raw.feasibility).ok_or(SubmitError::InvalidScore {
        field: "feasibility",
    })?;
    let viability = parse_score(&raw.viability).ok_or(SubmitError::InvalidScore {
        field: "viability",
    })?;
    let presentation = parse_score(&raw.presentation).ok_or(SubmitError::InvalidScore {
        field: "presentation",
    })?;

    let entry = JuryEntry {
        idea_id: team.team_id.clone(),
        team_name: team.team_name.clone(),
        desirability,
        feasibility,
        viability,
        presentation,
        created_at: Some(Utc::now()),
    };

    match store.insert(JURY_COLLECTION, entry.to_row()).await {
        Ok(()) => {}
        Err(StoreError::UniqueViolation(_)) => return Err(SubmitError::AlreadyEvaluated),
        Err(e) => return Err(SubmitError::WriteFailed(e.to_string())),
    }

    tracing::info!(team_id = %team.team_id, "Jury scores recorded");

    // Fresh read rather than a local append; concurrent entries count.
    let (jury, _) = aggregate::fetch_jury(store, &team.team_id).await;
    let jury = if jury.is_empty() {
        vec![entry.clone()]
    } else {
        jury
    };
    let averages = jury_averages(&jury);

    Ok(SubmitReceipt {
        entry,
        jury,
        averages,
    })
}
