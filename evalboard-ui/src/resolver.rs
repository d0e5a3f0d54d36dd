//! Team segment resolution
//!
//! Turns the path segment of a team URL into a team record. Framework
//! routing artifacts like `placeholder` or `view` can show up as
//! segments on fallback-rendered pages, so those are rejected before
//! the store is ever consulted. Real segments may be a team name
//! (percent-encoded by the browser) or a raw team id; the name lookup
//! runs first and wins.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use evalboard_common::probe::TEAMS_COLLECTION;
use evalboard_common::records::TeamRecord;
use evalboard_common::store::{RecordStore, SelectQuery, StoreError};

/// Routing artifacts that can never name a team.
pub const RESERVED_SEGMENTS: [&str; 7] = [
    "view",
    "placeholder",
    "fallback",
    "index",
    "loading",
    "undefined",
    "null",
];

/// Delay between attempts while waiting for a usable segment.
pub const SEGMENT_RETRY_INTERVAL: Duration = Duration::from_millis(100);

/// Attempts before giving up on a segment source.
pub const MAX_SEGMENT_ATTEMPTS: u32 = 25;

/// Outcome of resolving a path segment against the team collection.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved(TeamRecord),
    NotFound {
        segment: String,
        /// Send the client back to the listing. Set only when the
        /// observed path itself looked malformed (carried a reserved
        /// routing token), not on an ordinary miss.
        redirect_home: bool,
    },
}

pub fn is_reserved(segment: &str) -> bool {
    RESERVED_SEGMENTS.contains(&segment)
}

/// Extract the team segment from a full request path: the element
/// following `team`, provided it is non-empty and not reserved.
pub fn segment_from_path(path: &str) -> Option<String> {
    let mut parts = path.split('/').filter(|p| !p.is_empty());
    parts
        .by_ref()
        .find(|p| *p == "team")
        .and_then(|_| parts.next())
        .filter(|candidate| !is_reserved(candidate))
        .map(str::to_string)
}

/// Whether any element of the path is a reserved routing token.
pub fn path_has_reserved_segment(path: &str) -> bool {
    path.split('/').filter(|p| !p.is_empty()).any(is_reserved)
}

/// Resolve one raw (still percent-encoded) segment.
///
/// Reserved or empty segments report `NotFound` without touching the
/// store. Otherwise the team name is matched against the decoded
/// segment, then the team id against the raw segment; the first hit
/// wins. Store failures propagate to the caller.
pub async fn resolve(
    store: &dyn RecordStore,
    raw_segment: &str,
) -> Result<Resolution, StoreError> {
    if raw_segment.is_empty() || is_reserved(raw_segment) {
        tracing::debug!(segment = %raw_segment, "Refusing reserved team segment");
        return Ok(Resolution::NotFound {
            segment: raw_segment.to_string(),
            redirect_home: true,
        });
    }

    let decoded = percent_decode(raw_segment);
    let by_name = store
        .maybe_single(SelectQuery::from(TEAMS_COLLECTION).eq("team_name", decoded.as_str()))
        .await?;
    if let Some(row) = by_name {
        return Ok(Resolution::Resolved(TeamRecord::from_row(&row)));
    }

    let by_id = store
        .maybe_single(SelectQuery::from(TEAMS_COLLECTION).eq("team_id", raw_segment))
        .await?;
    if let Some(row) = by_id {
        return Ok(Resolution::Resolved(TeamRecord::from_row(&row)));
    }

    tracing::debug!(segment = %raw_segment, "No team matched segment");
    Ok(Resolution::NotFound {
        segment: raw_segment.to_string(),
        redirect_home: false,
    })
}

/// Resolve as soon as `source` yields a segment.
///
/// Routing context is not always ready on fallback-rendered pages, so
/// the source is polled on a fixed schedule. After
/// [`MAX_SEGMENT_ATTEMPTS`] polls the wait reports `NotFound`, sending
/// the client home only when `observed_path` carries a reserved token.
/// The owner cancels the token on teardown; a cancelled wait reports a
/// plain `NotFound` that the owner discards.
pub async fn resolve_when_available<S>(
    store: &dyn RecordStore,
    mut source: S,
    observed_path: &str,
    cancel: &CancellationToken,
) -> Result<Resolution, StoreError>
where
    S: FnMut() -> Option<String>,
{
    let mut attempts = 0u32;
    loop {
        if let Some(segment) = source() {
            return resolve(store, &segment).await;
        }

        attempts += 1;
        if attempts >= MAX_SEGMENT_ATTEMPTS {
            tracing::warn!(path = %observed_path, "No usable team segment after retries");
            return Ok(Resolution::NotFound {
                segment: String::new(),
                redirect_home: path_has_reserved_segment(observed_path),
            });
        }

        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("Team segment wait cancelled");
                return Ok(Resolution::NotFound {
                    segment: String::new(),
                    redirect_home: false,
                });
            }
            _ = tokio::time::sleep(SEGMENT_RETRY_INTERVAL) => {}
        }
    }
}

/// Lenient percent-decoding: valid `%XX` escapes decode, anything
/// malformed passes through literally, invalid UTF-8 is replaced.
/// `+` is a path character, not a space.
fn percent_decode(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_val(bytes[i + 1]), hex_val(bytes[i + 2])) {
                out.push(hi * 16 + lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
