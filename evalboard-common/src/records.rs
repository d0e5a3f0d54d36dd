//! Domain records and row normalization
//!
//! Store rows are loosely typed: numeric scores arrive as numbers or
//! strings, columns go by different names across collections, and most
//! fields are optional. Everything row-shaped is normalized here so the
//! rest of the code works with plain typed records.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::probe::{ProbeSource, ScoreScale};
use crate::store::Row;

/// A team submission.
///
/// `team_id` and `team_name` are empty strings when the row carried no
/// value; [`TeamRecord::is_complete`] gates operations that need both.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TeamRecord {
    pub team_id: String,
    pub team_name: String,
    pub problem_title: Option<String>,
    pub problem_statement: Option<String>,
    pub proposed_solution: Option<String>,
    pub target_users: Option<String>,
    pub innovation_highlights: Option<String>,
    pub tech_stack: Option<String>,
    pub market_readiness: Option<String>,
    pub execution_risk: Option<String>,
    pub business_model: Option<String>,
    pub market_insight: Option<String>,
    pub team_size: Option<String>,
    pub team_members: Option<String>,
    pub team_roles: Option<String>,
    pub contact_email: Option<String>,
}

impl TeamRecord {
    pub fn from_row(row: &Row) -> Self {
        Self {
            team_id: text(row, "team_id").unwrap_or_default(),
            team_name: text(row, "team_name").unwrap_or_default(),
            problem_title: text(row, "problem_title"),
            problem_statement: text(row, "problem_statement"),
            proposed_solution: text(row, "proposed_solution"),
            target_users: text(row, "target_users"),
            innovation_highlights: text(row, "innovation_highlights"),
            tech_stack: text(row, "tech_stack"),
            market_readiness: text(row, "market_readiness"),
            execution_risk: text(row, "execution_risk"),
            business_model: text(row, "business_model"),
            market_insight: text(row, "market_insight"),
            team_size: display(row, "team_size"),
            team_members: text(row, "team_members"),
            team_roles: text(row, "team_roles"),
            contact_email: text(row, "contact_email"),
        }
    }

    /// Whether the record carries both an identifier and a name.
    pub fn is_complete(&self) -> bool {
        !self.team_id.is_empty() && !self.team_name.is_empty()
    }

    /// Pair member names with roles positionally. Members without a
    /// matching role entry get the default role.
    pub fn members_with_roles(&self) -> Vec<Member> {
        let names = self
            .team_members
            .as_deref()
            .map(split_list)
            .unwrap_or_default();
        let roles = self
            .team_roles
            .as_deref()
            .map(split_list)
            .unwrap_or_default();

        names
            .into_iter()
            .enumerate()
            .map(|(i, name)| Member {
                role: roles.get(i).cloned().unwrap_or_else(|| "Member".to_string()),
                name,
            })
            .collect()
    }
}

/// One team member with an assigned role.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Member {
    pub name: String,
    pub role: String,
}

/// Split a comma-separated field into trimmed, non-empty entries.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// An AI evaluation after normalization.
///
/// All numeric fields are on the 0 to 10 scale, rounded to one decimal.
/// `source` names the collection the row came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub source: &'static str,
    pub desirability: Option<f64>,
    pub feasibility: Option<f64>,
    pub viability: Option<f64>,
    pub average: Option<f64>,
    pub market_readiness: Option<f64>,
    pub execution_risk: Option<f64>,
    pub summary: Option<String>,
    pub insights: Option<String>,
    pub market_context_signal: Option<String>,
    pub execution_readiness_signal: Option<String>,
    pub evaluated_at: Option<DateTime<Utc>>,
}

impl Evaluation {
    /// Normalize a raw row from `source`.
    ///
    /// Each field follows an alias chain; the first non-null alias wins
    /// and is then coerced, so a present-but-garbage value yields `None`
    /// rather than falling through to a later alias.
    pub fn from_row(source: &ProbeSource, row: &Row) -> Self {
        Self {
            source: source.collection,
            desirability: scaled(row, &["desirability_score", "desirability"], source.scale),
            feasibility: scaled(row, &["feasibility_score", "feasibility"], source.scale),
            viability: scaled(row, &["viability_score", "viability"], source.scale),
            average: scaled(row, &["average_dfv_score", "weighted_dfv"], source.scale),
            market_readiness: scaled(row, &["market_readiness"], source.scale),
            execution_risk: scaled(row, &["execution_risk"], source.scale),
            summary: first_text(row, &["summary"]),
            insights: first_text(row, &["insights"]),
            market_context_signal: first_text(row, &["market_context_signal"]),
            execution_readiness_signal: first_text(row, &["execution_readiness_signal"]),
            evaluated_at: timestamp(row, &["evaluated_at", "created_at"]),
        }
    }
}

/// One jury score entry for a team.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JuryEntry {
    pub idea_id: String,
    pub team_name: String,
    pub desirability: f64,
    pub feasibility: f64,
    pub viability: f64,
    pub presentation: f64,
    pub created_at: Option<DateTime<Utc>>,
}

impl JuryEntry {
    /// Read an entry from a store row. Missing or malformed score
    /// columns count as zero, matching how averages treat them.
    pub fn from_row(row: &Row) -> Self {
        Self {
            idea_id: text(row, "idea_id").unwrap_or_default(),
            team_name: text(row, "team_name").unwrap_or_default(),
            desirability: entry_score(row, "desirability_score"),
            feasibility: entry_score(row, "feasibility_score"),
            viability: entry_score(row, "viability_score"),
            presentation: entry_score(row, "presentation_score"),
            created_at: timestamp(row, &["created_at"]),
        }
    }

    /// Serialize for insertion into the jury collection.
    pub fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.insert("idea_id".to_string(), Value::from(self.idea_id.clone()));
        row.insert("team_name".to_string(), Value::from(self.team_name.clone()));
        row.insert("desirability_score".to_string(), Value::from(self.desirability));
        row.insert("feasibility_score".to_string(), Value::from(self.feasibility));
        row.insert("viability_score".to_string(), Value::from(self.viability));
        row.insert("presentation_score".to_string(), Value::from(self.presentation));
        if let Some(at) = self.created_at {
            row.insert("created_at".to_string(), Value::from(at.to_rfc3339()));
        }
        row
    }
}

/// Per-category means over jury entries, rounded to one decimal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct JuryAverages {
    pub desirability: f64,
    pub feasibility: f64,
    pub viability: f64,
    pub presentation: f64,
}

/// `None` when there are no entries; a zero-entry panel has no average.
pub fn jury_averages(entries: &[JuryEntry]) -> Option<JuryAverages> {
    if entries.is_empty() {
        return None;
    }
    let count = entries.len() as f64;
    let mean = |pick: fn(&JuryEntry) -> f64| round1(entries.iter().map(pick).sum::<f64>() / count);
    Some(JuryAverages {
        desirability: mean(|e| e.desirability),
        feasibility: mean(|e| e.feasibility),
        viability: mean(|e| e.viability),
        presentation: mean(|e| e.presentation),
    })
}

/// Round to one decimal place for display.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Coerce a JSON value to a finite score. Strings holding numbers are
/// accepted; anything else is `None`.
pub fn score_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn first_present<'a>(row: &'a Row, aliases: &[&str]) -> Option<&'a Value> {
    aliases
        .iter()
        .find_map(|alias| row.get(*alias).filter(|v| !v.is_null()))
}

fn scaled(row: &Row, aliases: &[&str], scale: ScoreScale) -> Option<f64> {
    let value = score_value(first_present(row, aliases)?)?;
    let value = match scale {
        ScoreScale::TenPoint => value,
        ScoreScale::Percent => value / 10.0,
    };
    Some(round1(value))
}

fn first_text(row: &Row, aliases: &[&str]) -> Option<String> {
    first_present(row, aliases)?.as_str().map(str::to_string)
}

fn timestamp(row: &Row, aliases: &[&str]) -> Option<DateTime<Utc>> {
    let raw = first_present(row, aliases)?.as_str()?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn text(row: &Row, column: &str) -> Option<String> {
    row.get(column)?.as_str().map(str::to_string)
}

/// Render a display-only field that may arrive as string or number.
fn display(row: &Row, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn entry_score(row: &Row, column: &str) -> f64 {
    row.get(column).and_then(score_value).unwrap_or(0.0)
}
