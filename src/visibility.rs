//! Per-viewer exclusion sets.
//!
//! A notification hidden by a viewer (read or deleted) is recorded here by id
//! and filtered out of every later load for that viewer. Keys are namespaced
//! so several inboxes can share one store.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    sea_query::OnConflict,
};
use thiserror::Error;

use crate::models::notification_exclusion;

pub const DEFAULT_NAMESPACE: &str = "fleetops.hidden_notifications";

#[derive(Debug, Error)]
pub enum VisibilityError {
    #[error("visibility store database error: {0}")]
    Database(#[from] DbErr),
    #[error("visibility store lock poisoned")]
    Poisoned,
}

/// Store of notification ids each viewer has hidden.
#[async_trait]
pub trait VisibilityStore: Send + Sync {
    async fn excluded_ids(&self, viewer_key: &str) -> Result<HashSet<String>, VisibilityError>;

    /// Add `ids` to the viewer's exclusion set. Already-excluded ids are ignored.
    async fn exclude(&self, viewer_key: &str, ids: &[String]) -> Result<(), VisibilityError>;

    /// Drop the whole exclusion set, returning how many ids it held.
    async fn clear(&self, viewer_key: &str) -> Result<u64, VisibilityError>;
}

/// Build the namespaced key a viewer's exclusion set is stored under.
pub fn viewer_key(namespace: &str, viewer_id: &str) -> String {
    format!("{}:{}", namespace, viewer_id)
}

/// Process-local store; contents are lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryVisibilityStore {
    sets: RwLock<HashMap<String, HashSet<String>>>,
}

impl InMemoryVisibilityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VisibilityStore for InMemoryVisibilityStore {
    async fn excluded_ids(&self, viewer_key: &str) -> Result<HashSet<String>, VisibilityError> {
        let sets = self.sets.read().map_err(|_| VisibilityError::Poisoned)?;
        Ok(sets.get(viewer_key).cloned().unwrap_or_default())
    }

    async fn exclude(&self, viewer_key: &str, ids: &[String]) -> Result<(), VisibilityError> {
        let mut sets = self.sets.write().map_err(|_| VisibilityError::Poisoned)?;
        sets.entry(viewer_key.to_string())
            .or_default()
            .extend(ids.iter().cloned());
        Ok(())
    }

    async fn clear(&self, viewer_key: &str) -> Result<u64, VisibilityError> {
        let mut sets = self.sets.write().map_err(|_| VisibilityError::Poisoned)?;
        Ok(sets.remove(viewer_key).map_or(0, |set| set.len() as u64))
    }
}

/// Store backed by the `notification_exclusions` table.
#[derive(Clone)]
pub struct DatabaseVisibilityStore {
    db: DatabaseConnection,
}

impl DatabaseVisibilityStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl VisibilityStore for DatabaseVisibilityStore {
    async fn excluded_ids(&self, viewer_key: &str) -> Result<HashSet<String>, VisibilityError> {
        let rows = notification_exclusion::Entity::find()
            .filter(notification_exclusion::Column::ViewerKey.eq(viewer_key))
            .all(&self.db)
            .await?;

        Ok(rows.into_iter().map(|row| row.notification_id).collect())
    }

    async fn exclude(&self, viewer_key: &str, ids: &[String]) -> Result<(), VisibilityError> {
        if ids.is_empty() {
            return Ok(());
        }

        let now = Utc::now().fixed_offset();
        let rows = ids.iter().map(|id| notification_exclusion::ActiveModel {
            viewer_key: Set(viewer_key.to_string()),
            notification_id: Set(id.clone()),
            created_at: Set(now),
        });

        notification_exclusion::Entity::insert_many(rows)
            .on_conflict(
                OnConflict::columns([
                    notification_exclusion::Column::ViewerKey,
                    notification_exclusion::Column::NotificationId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(())
    }

    async fn clear(&self, viewer_key: &str) -> Result<u64, VisibilityError> {
        let result = notification_exclusion::Entity::delete_many()
            .filter(notification_exclusion::Column::ViewerKey.eq(viewer_key))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_store_scopes_by_viewer() {
        let store = InMemoryVisibilityStore::new();
        let alice = viewer_key(DEFAULT_NAMESPACE, "alice");
        let bob = viewer_key(DEFAULT_NAMESPACE, "bob");

        store
            .exclude(&alice, &["n1".to_string(), "n2".to_string()])
            .await
            .unwrap();
        store.exclude(&alice, &["n2".to_string()]).await.unwrap();

        let hidden = store.excluded_ids(&alice).await.unwrap();
        assert_eq!(hidden.len(), 2);
        assert!(hidden.contains("n1"));
        assert!(store.excluded_ids(&bob).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn in_memory_clear_returns_removed_count() {
        let store = InMemoryVisibilityStore::new();
        store
            .exclude("k", &["a".to_string(), "b".to_string()])
            .await
            .unwrap();

        assert_eq!(store.clear("k").await.unwrap(), 2);
        assert_eq!(store.clear("k").await.unwrap(), 0);
        assert!(store.excluded_ids("k").await.unwrap().is_empty());
    }

    #[test]
    fn viewer_key_is_namespaced() {
        assert_eq!(
            viewer_key(DEFAULT_NAMESPACE, "42"),
            "fleetops.hidden_notifications:42"
        );
    }
}
