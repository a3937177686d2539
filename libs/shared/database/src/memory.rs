use std::collections::HashMap;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::DbError;

/// Process-local table keyed by id.
///
/// Every write takes the table's write lock for its whole check-and-mutate
/// step, so uniqueness checks and the write they guard are atomic.
pub struct MemoryTable<T> {
    rows: RwLock<HashMap<Uuid, T>>,
}

impl<T> Default for MemoryTable<T> {
    fn default() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }
}

impl<T> MemoryTable<T>
where
    T: Clone + Send + Sync,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, id: Uuid, row: T) -> Result<T, DbError> {
        self.insert_unique(id, row, |_, _| None).await
    }

    /// Inserts `row` unless `conflict(existing, candidate)` reports a clash
    /// with any stored row, in which case the message becomes a
    /// [`DbError::Conflict`].
    pub async fn insert_unique<F>(&self, id: Uuid, row: T, conflict: F) -> Result<T, DbError>
    where
        F: Fn(&T, &T) -> Option<String>,
    {
        let mut rows = self.rows.write().await;

        if rows.contains_key(&id) {
            return Err(DbError::Conflict(format!("duplicate id {}", id)));
        }
        if let Some(message) = rows.values().find_map(|existing| conflict(existing, &row)) {
            return Err(DbError::Conflict(message));
        }

        rows.insert(id, row.clone());
        Ok(row)
    }

    pub async fn get(&self, id: Uuid) -> Option<T> {
        self.rows.read().await.get(&id).cloned()
    }

    pub async fn find<P>(&self, predicate: P) -> Vec<T>
    where
        P: Fn(&T) -> bool,
    {
        self.rows
            .read()
            .await
            .values()
            .filter(|row| predicate(row))
            .cloned()
            .collect()
    }

    /// Applies `mutate` to the stored row. `None` when the id is unknown.
    pub async fn update<F>(&self, id: Uuid, mutate: F) -> Result<Option<T>, DbError>
    where
        F: FnOnce(&mut T),
    {
        self.update_unique(id, mutate, |_, _| None).await
    }

    /// Like [`MemoryTable::update`], but the mutated row is checked against
    /// every other row before it replaces the stored one.
    pub async fn update_unique<F, C>(&self, id: Uuid, mutate: F, conflict: C) -> Result<Option<T>, DbError>
    where
        F: FnOnce(&mut T),
        C: Fn(&T, &T) -> Option<String>,
    {
        let mut rows = self.rows.write().await;

        let Some(current) = rows.get(&id) else {
            return Ok(None);
        };
        let mut candidate = current.clone();
        mutate(&mut candidate);

        if let Some(message) = rows
            .iter()
            .filter(|(other_id, _)| **other_id != id)
            .find_map(|(_, existing)| conflict(existing, &candidate))
        {
            return Err(DbError::Conflict(message));
        }

        rows.insert(id, candidate.clone());
        Ok(Some(candidate))
    }

    pub async fn remove(&self, id: Uuid) -> Option<T> {
        self.rows.write().await.remove(&id)
    }
}
