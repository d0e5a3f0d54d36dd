//! Team search
//!
//! One-shot substring search over team submissions, plus a live
//! variant: each SSE session owns a server-side debounce task that
//! absorbs keystrokes, waits out a quiet period, then issues at most
//! one store query. Deliveries carry a sequence number assigned at
//! issuance and stale completions are dropped, so the newest issued
//! query always wins regardless of completion order.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;

use evalboard_common::probe::TEAMS_COLLECTION;
use evalboard_common::store::{RecordStore, SelectQuery, StoreError};

/// Quiet period a keystroke must survive before its query is issued.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Maximum hits returned per query.
pub const SEARCH_RESULT_LIMIT: usize = 5;

/// One search hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub team_id: String,
    pub team_name: String,
}

/// One delivery to a live session.
#[derive(Debug, Clone, Serialize)]
pub struct SearchUpdate {
    pub seq: u64,
    pub query: String,
    pub hits: Vec<SearchHit>,
}

/// Substring search over team names, capped at [`SEARCH_RESULT_LIMIT`].
///
/// A blank query returns nothing without touching the store, and an
/// unprovisioned team collection searches as empty.
pub async fn search_teams(
    store: &dyn RecordStore,
    raw_query: &str,
) -> Result<Vec<SearchHit>, StoreError> {
    let needle = raw_query.trim();
    if needle.is_empty() {
        return Ok(Vec::new());
    }

    let rows = match store
        .select(
            SelectQuery::from(TEAMS_COLLECTION)
                .columns(&["team_id", "team_name"])
                .ilike("team_name", format!("%{needle}%"))
                .limit(SEARCH_RESULT_LIMIT),
        )
        .await
    {
        Ok(rows) => rows,
        Err(StoreError::MissingCollection(_)) => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    Ok(rows
        .iter()
        .filter_map(|row| {
            Some(SearchHit {
                team_id: row.get("team_id")?.as_str()?.to_string(),
                team_name: row.get("team_name")?.as_str()?.to_string(),
            })
        })
        .collect())
}

struct Session {
    input_tx: mpsc::UnboundedSender<String>,
}

/// Registry of live search sessions, shared through the app state.
pub struct LiveSearchRegistry {
    next_id: AtomicU64,
    sessions: Mutex<HashMap<u64, Session>>,
}

/// Stream side of an open session. Dropping it tears the session down.
pub struct LiveSearch {
    pub id: u64,
    pub updates: mpsc::UnboundedReceiver<SearchUpdate>,
    registry: Arc<LiveSearchRegistry>,
}

impl Drop for LiveSearch {
    fn drop(&mut self) {
        self.registry.close(self.id);
    }
}

impl LiveSearchRegistry {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Open a session and spawn its debounce task.
    pub fn open(self: &Arc<Self>, store: Arc<dyn RecordStore>) -> LiveSearch {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let (update_tx, updates) = mpsc::unbounded_channel();

        self.sessions
            .lock()
            .unwrap()
            .insert(id, Session { input_tx });
        tokio::spawn(drive_session(id, store, input_rx, update_tx));
        tracing::debug!(session = id, "Live search session opened");

        LiveSearch {
            id,
            updates,
            registry: Arc::clone(self),
        }
    }

    /// Feed one keystroke into a session. False when the session is
    /// unknown or already torn down.
    pub fn feed(&self, id: u64, query: String) -> bool {
        let sessions = self.sessions.lock().unwrap();
        match sessions.get(&id) {
            Some(session) => session.input_tx.send(query).is_ok(),
            None => false,
        }
    }

    /// Remove a session; its input channel closes and the task exits.
    pub fn close(&self, id: u64) {
        if self.sessions.lock().unwrap().remove(&id).is_some() {
            tracing::debug!(session = id, "Live search session closed");
        }
    }
}

impl Default for LiveSearchRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-session debounce loop.
///
/// Newer keystrokes during the quiet period replace the pending query
/// before it is ever issued. Issued queries run on their own task and
/// re-check the latest issued sequence before delivering, which drops
/// completions that a newer issuance has superseded.
async fn drive_session(
    id: u64,
    store: Arc<dyn RecordStore>,
    mut input_rx: mpsc::UnboundedReceiver<String>,
    update_tx: mpsc::UnboundedSender<SearchUpdate>,
) {
    let latest_issued = Arc::new(AtomicU64::new(0));
    let mut seq = 0u64;

    while let Some(mut query) = input_rx.recv().await {
        loop {
            match tokio::time::timeout(SEARCH_DEBOUNCE, input_rx.recv()).await {
                Ok(Some(newer)) => query = newer,
                Ok(None) => return,
                Err(_) => break,
            }
        }

        seq += 1;
        latest_issued.store(seq, Ordering::SeqCst);

        let store = Arc::clone(&store);
        let latest = Arc::clone(&latest_issued);
        let update_tx = update_tx.clone();
        tokio::spawn(async move {
            let hits = match search_teams(store.as_ref(), &query).await {
                Ok(hits) => hits,
                Err(e) => {
                    tracing::warn!(session = id, error = %e, "Live search query failed");
                    Vec::new()
                }
            };
            if latest.load(Ordering::SeqCst) != seq {
                return;
            }
            let _ = update_tx.send(SearchUpdate { seq, query, hits });
        });
    }
}
