//! Hosted record store client
//!
//! Speaks the PostgREST-style HTTP dialect used by the hosted service:
//! reads are GETs with filter operators in the query string, writes are
//! POSTs of JSON rows. Service errors arrive as a JSON body carrying a
//! SQLSTATE-like `code` plus a `message`, which we fold into
//! [`StoreError`] so callers never see transport details.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::{Direction, Filter, RecordStore, Row, SelectQuery, StoreError};

const USER_AGENT: &str = concat!("EvalBoard/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// [`RecordStore`] backed by the hosted REST service.
pub struct RestStore {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RestStore {
    /// Create a client for the service at `base_url`, authenticating
    /// every request with `api_key`.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, StoreError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, collection)
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .header("authorization", format!("Bearer {}", self.api_key))
    }
}

#[async_trait]
impl RecordStore for RestStore {
    async fn select(&self, query: SelectQuery) -> Result<Vec<Row>, StoreError> {
        let url = self.collection_url(&query.collection);
        let pairs = query_pairs(&query);

        tracing::debug!(
            collection = %query.collection,
            filters = query.filters.len(),
            "Store select"
        );

        let response = self
            .authed(self.http_client.get(&url).query(&pairs))
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_error(status.as_u16(), &body, &query.collection));
        }

        response
            .json::<Vec<Row>>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    async fn insert(&self, collection: &str, row: Row) -> Result<(), StoreError> {
        let url = self.collection_url(collection);

        tracing::debug!(collection = %collection, "Store insert");

        let response = self
            .authed(self.http_client.post(&url))
            .header("prefer", "return=minimal")
            .json(&row)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_error(status.as_u16(), &body, collection));
        }

        Ok(())
    }
}

/// Translate a [`SelectQuery`] into PostgREST query parameters.
fn query_pairs(query: &SelectQuery) -> Vec<(String, String)> {
    let mut pairs = Vec::new();

    let select = match &query.columns {
        Some(columns) => columns.join(","),
        None => "*".to_string(),
    };
    pairs.push(("select".to_string(), select));

    for filter in &query.filters {
        match filter {
            Filter::Eq { column, value } => {
                pairs.push((column.clone(), format!("eq.{}", literal(value))));
            }
            Filter::ILike { column, pattern } => {
                // PostgREST spells the LIKE wildcard as `*`
                pairs.push((column.clone(), format!("ilike.{}", pattern.replace('%', "*"))));
            }
        }
    }

    if let Some((column, direction)) = &query.order_by {
        let dir = match direction {
            Direction::Ascending => "asc",
            Direction::Descending => "desc",
        };
        pairs.push(("order".to_string(), format!("{column}.{dir}")));
    }

    if let Some(limit) = query.limit {
        pairs.push(("limit".to_string(), limit.to_string()));
    }

    pairs
}

fn literal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Debug, Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    code: String,
}

/// Map a non-success response onto [`StoreError`].
///
/// The service reports a missing table either as SQLSTATE `42P01` or,
/// through its schema cache, as `PGRST205` with a "Could not find the
/// table" message. Both collapse to [`StoreError::MissingCollection`].
fn classify_error(status: u16, body: &str, collection: &str) -> StoreError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();

    let missing_table = parsed.code == "42P01"
        || parsed.code == "PGRST205"
        || parsed.message.contains("Could not find the table");
    if missing_table {
        return StoreError::MissingCollection(collection.to_string());
    }

    if parsed.code == "23505" || parsed.message.contains("duplicate key value") {
        return StoreError::UniqueViolation(parsed.message);
    }

    let code = if parsed.code.is_empty() {
        status.to_string()
    } else {
        parsed.code
    };
    let message = if parsed.message.is_empty() {
        body.to_string()
    } else {
        parsed.message
    };

    StoreError::Api { code, message }
}
