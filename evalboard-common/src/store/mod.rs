//! Record store gateway
//!
//! All reads and writes against the hosted record store go through the
//! [`RecordStore`] trait. Production uses [`RestStore`] (PostgREST-style
//! HTTP dialect); tests use [`MemoryStore`], which evaluates the same
//! queries against in-process tables so both backends honor one contract.

pub mod memory;
pub mod rest;

pub use memory::MemoryStore;
pub use rest::RestStore;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

/// One row as returned by the store: column name to JSON value.
pub type Row = Map<String, Value>;

/// Errors surfaced by a record store backend
#[derive(Debug, Error)]
pub enum StoreError {
    /// The named collection is not provisioned in the store
    #[error("collection `{0}` does not exist")]
    MissingCollection(String),

    /// A unique constraint rejected an insert
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// Transport-level failure (connect, timeout, TLS)
    #[error("store unreachable: {0}")]
    Transport(String),

    /// The store answered with an error payload
    #[error("store error {code}: {message}")]
    Api { code: String, message: String },

    /// Response body could not be decoded
    #[error("malformed store response: {0}")]
    Decode(String),
}

/// Sort direction for [`SelectQuery::order_by`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// A single filter condition on one column.
///
/// `ILike` compares case-insensitively; `%` in the pattern matches any
/// run of characters (a pattern without `%` is a whole-value match).
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq { column: String, value: Value },
    ILike { column: String, pattern: String },
}

/// Declarative description of one read against a collection.
///
/// Built fluently and interpreted by each backend: the REST store
/// translates it to query parameters, the in-memory store evaluates it
/// directly over its tables.
#[derive(Debug, Clone)]
pub struct SelectQuery {
    pub collection: String,
    /// Columns to return; `None` selects all columns.
    pub columns: Option<Vec<String>>,
    pub filters: Vec<Filter>,
    pub order_by: Option<(String, Direction)>,
    pub limit: Option<usize>,
}

impl SelectQuery {
    /// Start a query against the named collection, selecting all columns.
    pub fn from(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            columns: None,
            filters: Vec::new(),
            order_by: None,
            limit: None,
        }
    }

    /// Restrict the returned columns.
    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = Some(columns.iter().map(|c| c.to_string()).collect());
        self
    }

    /// Add an exact-match filter.
    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq {
            column: column.to_string(),
            value: value.into(),
        });
        self
    }

    /// Add a case-insensitive pattern filter (`%` wildcards).
    pub fn ilike(mut self, column: &str, pattern: impl Into<String>) -> Self {
        self.filters.push(Filter::ILike {
            column: column.to_string(),
            pattern: pattern.into(),
        });
        self
    }

    /// Sort the result by one column.
    pub fn order_by(mut self, column: &str, direction: Direction) -> Self {
        self.order_by = Some((column.to_string(), direction));
        self
    }

    /// Cap the number of returned rows.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Gateway to the record store backing the evaluation data.
///
/// Implementations must be shareable across request handlers.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Run a filtered read, returning all matching rows.
    async fn select(&self, query: SelectQuery) -> Result<Vec<Row>, StoreError>;

    /// Insert one row into a collection.
    async fn insert(&self, collection: &str, row: Row) -> Result<(), StoreError>;

    /// Zero-or-one row convenience: applies `limit 1` and returns the
    /// first match, or `None` when nothing matched.
    async fn maybe_single(&self, query: SelectQuery) -> Result<Option<Row>, StoreError> {
        let rows = self.select(query.limit(1)).await?;
        Ok(rows.into_iter().next())
    }
}
