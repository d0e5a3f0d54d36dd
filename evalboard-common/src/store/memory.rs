//! In-memory record store
//!
//! Test double that evaluates [`SelectQuery`] over plain tables with the
//! same semantics the REST backend gets from the hosted service. Also
//! tracks how many reads were issued so tests can assert that short
//! circuits really skip the store.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::{Direction, Filter, RecordStore, Row, SelectQuery, StoreError};

/// In-process [`RecordStore`] backed by per-collection row vectors.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<BTreeMap<String, Vec<Row>>>,
    unique: Mutex<HashMap<String, String>>,
    fail_select: Mutex<Option<String>>,
    fail_insert: Mutex<Option<String>>,
    reads: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provision an empty collection. Queries against collections that
    /// were never created fail with [`StoreError::MissingCollection`],
    /// matching the hosted service.
    pub fn create_collection(&self, name: &str) {
        self.tables
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_default();
    }

    /// Provision a collection and append rows to it.
    pub fn seed(&self, name: &str, rows: Vec<Row>) {
        let mut tables = self.tables.lock().unwrap();
        tables.entry(name.to_string()).or_default().extend(rows);
    }

    /// Declare a unique column; later inserts that repeat an existing
    /// value fail with [`StoreError::UniqueViolation`].
    pub fn set_unique(&self, collection: &str, column: &str) {
        self.unique
            .lock()
            .unwrap()
            .insert(collection.to_string(), column.to_string());
    }

    /// Make the next `select` fail with a generic store error.
    pub fn fail_next_select(&self, message: &str) {
        *self.fail_select.lock().unwrap() = Some(message.to_string());
    }

    /// Make the next `insert` fail with a generic store error.
    pub fn fail_next_insert(&self, message: &str) {
        *self.fail_insert.lock().unwrap() = Some(message.to_string());
    }

    /// Number of `select` calls issued so far.
    pub fn reads_issued(&self) -> u64 {
        self.reads.load(AtomicOrdering::SeqCst)
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn select(&self, query: SelectQuery) -> Result<Vec<Row>, StoreError> {
        self.reads.fetch_add(1, AtomicOrdering::SeqCst);

        if let Some(message) = self.fail_select.lock().unwrap().take() {
            return Err(StoreError::Api {
                code: "XX000".to_string(),
                message,
            });
        }

        let tables = self.tables.lock().unwrap();
        let rows = tables
            .get(&query.collection)
            .ok_or_else(|| StoreError::MissingCollection(query.collection.clone()))?;

        let mut matched: Vec<Row> = rows
            .iter()
            .filter(|row| query.filters.iter().all(|f| filter_matches(f, row)))
            .cloned()
            .collect();

        if let Some((column, direction)) = &query.order_by {
            matched.sort_by(|a, b| {
                let ord = cmp_values(
                    a.get(column).unwrap_or(&Value::Null),
                    b.get(column).unwrap_or(&Value::Null),
                );
                match direction {
                    Direction::Ascending => ord,
                    Direction::Descending => ord.reverse(),
                }
            });
        }

        if let Some(limit) = query.limit {
            matched.truncate(limit);
        }

        if let Some(columns) = &query.columns {
            for row in &mut matched {
                row.retain(|key, _| columns.iter().any(|c| c == key));
            }
        }

        Ok(matched)
    }

    async fn insert(&self, collection: &str, row: Row) -> Result<(), StoreError> {
        if let Some(message) = self.fail_insert.lock().unwrap().take() {
            return Err(StoreError::Api {
                code: "XX000".to_string(),
                message,
            });
        }

        let mut tables = self.tables.lock().unwrap();
        let rows = tables
            .get_mut(collection)
            .ok_or_else(|| StoreError::MissingCollection(collection.to_string()))?;

        if let Some(column) = self.unique.lock().unwrap().get(collection) {
            let value = row.get(column).cloned().unwrap_or(Value::Null);
            if !value.is_null() && rows.iter().any(|r| r.get(column) == Some(&value)) {
                return Err(StoreError::UniqueViolation(format!(
                    "{collection}.{column}"
                )));
            }
        }

        rows.push(row);
        Ok(())
    }
}

fn filter_matches(filter: &Filter, row: &Row) -> bool {
    match filter {
        Filter::Eq { column, value } => row.get(column) == Some(value),
        Filter::ILike { column, pattern } => match row.get(column) {
            Some(Value::String(text)) => ilike_matches(pattern, text),
            _ => false,
        },
    }
}

/// Case-insensitive SQL LIKE with `%` wildcards. A pattern without `%`
/// is a whole-value match.
fn ilike_matches(pattern: &str, text: &str) -> bool {
    let pattern = pattern.to_lowercase();
    let text = text.to_lowercase();

    if !pattern.contains('%') {
        return pattern == text;
    }

    let segments: Vec<&str> = pattern.split('%').collect();
    let last = segments.len() - 1;
    let mut pos = 0usize;

    for (i, segment) in segments.iter().enumerate() {
        if segment.is_empty() {
            continue;
        }
        if i == 0 {
            if !text.starts_with(segment) {
                return false;
            }
            pos = segment.len();
        } else if i == last {
            return text[pos..].ends_with(segment);
        } else {
            match text[pos..].find(segment) {
                Some(at) => pos += at + segment.len(),
                None => return false,
            }
        }
    }
    true
}

fn cmp_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}
