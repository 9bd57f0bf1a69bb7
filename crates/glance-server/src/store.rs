//! Persistence seam.
//!
//! The service layer talks to a `RecordStore` trait object, so the backing
//! store (in-memory here, a database in a deployment) can be swapped
//! without touching dataset or dashboard logic.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("No rows matched in table '{0}'")]
    NotFound(String),

    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Equality filter on one field of the stored JSON documents.
#[derive(Debug, Clone)]
pub struct Filter {
    pub field: String,
    pub equals: Value,
}

impl Filter {
    pub fn new(field: impl Into<String>, equals: Value) -> Self {
        Self {
            field: field.into(),
            equals,
        }
    }

    fn matches(&self, row: &Value) -> bool {
        row.get(&self.field) == Some(&self.equals)
    }
}

/// Sort order on one field, compared as JSON strings.
#[derive(Debug, Clone)]
pub struct Order {
    pub field: String,
    pub descending: bool,
}

/// Table-oriented JSON document store.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn select(
        &self,
        table: &str,
        filter: Option<&Filter>,
        order: Option<&Order>,
        limit: Option<usize>,
    ) -> Result<Vec<Value>, StoreError>;

    async fn insert(&self, table: &str, row: Value) -> Result<(), StoreError>;

    /// Delete matching rows, returning how many were removed.
    async fn delete(&self, table: &str, filter: &Filter) -> Result<usize, StoreError>;
}

/// In-memory store, used by tests and the standalone binary.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Vec<Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn select(
        &self,
        table: &str,
        filter: Option<&Filter>,
        order: Option<&Order>,
        limit: Option<usize>,
    ) -> Result<Vec<Value>, StoreError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Value> = tables
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| filter.map(|f| f.matches(row)).unwrap_or(true))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = order {
            rows.sort_by(|a, b| {
                let left = a.get(&order.field).map(|v| v.to_string()).unwrap_or_default();
                let right = b.get(&order.field).map(|v| v.to_string()).unwrap_or_default();
                if order.descending {
                    right.cmp(&left)
                } else {
                    left.cmp(&right)
                }
            });
        }
        if let Some(limit) = limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn insert(&self, table: &str, row: Value) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        tables.entry(table.to_string()).or_default().push(row);
        Ok(())
    }

    async fn delete(&self, table: &str, filter: &Filter) -> Result<usize, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(rows) = tables.get_mut(table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|row| !filter.matches(row));
        Ok(before - rows.len())
    }
}
