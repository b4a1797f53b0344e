//! Test utilities for database and aggregator testing.
//!
//! Provides in-memory SQLite databases with migrations applied, row fixtures
//! for every notification source table, and in-process fakes for the query
//! client and the visibility store.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use migration::{Migrator, MigratorTrait};
use notifications::aggregator::{NotificationAggregator, Viewer};
use notifications::config::AppConfig;
use notifications::models::{
    partner_action, security_alert, support_notification, system_log, user_action_log,
};
use notifications::permissions::ViewerRole;
use notifications::query::{Patch, QueryClient, QueryError, SourceQuery};
use notifications::visibility::{InMemoryVisibilityStore, VisibilityError, VisibilityStore};
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, Set, Statement,
};
use serde_json::{Value as JsonValue, json};
use uuid::Uuid;

pub const TEST_TOKEN: &str = "test-operator-token";

/// Sets up an in-memory SQLite database with all migrations applied.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;

    Migrator::up(&db, None).await?;

    db.execute(Statement::from_string(
        db.get_database_backend(),
        "PRAGMA foreign_keys = OFF".to_string(),
    ))
    .await?;

    Ok(db)
}

/// Config suitable for tests: one operator token, in-memory exclusions.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig {
        database_url: "sqlite::memory:".to_string(),
        operator_tokens: vec![TEST_TOKEN.to_string()],
        ..Default::default()
    };
    config.aggregator.visibility_backend = notifications::config::VisibilityBackend::Memory;
    config
}

pub fn ts(raw: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(raw).unwrap()
}

pub fn admin() -> Viewer {
    Viewer::new("admin-1", ViewerRole::Admin)
}

pub async fn insert_support_notification(
    db: &DatabaseConnection,
    title: &str,
    category: Option<&str>,
    is_read: bool,
    created_at: &str,
) -> Result<Uuid> {
    let id = Uuid::new_v4();
    support_notification::ActiveModel {
        id: Set(id),
        title: Set(Some(title.to_string())),
        message: Set(Some(format!("{} details", title))),
        category: Set(category.map(str::to_string)),
        priority: Set(Some("high".to_string())),
        is_read: Set(is_read),
        created_at: Set(ts(created_at)),
        updated_at: Set(None),
    }
    .insert(db)
    .await?;
    Ok(id)
}

pub async fn insert_system_log(
    db: &DatabaseConnection,
    level: &str,
    message: &str,
    created_at: &str,
) -> Result<Uuid> {
    let id = Uuid::new_v4();
    system_log::ActiveModel {
        id: Set(id),
        level: Set(Some(level.to_string())),
        message: Set(Some(message.to_string())),
        source: Set(Some("gateway".to_string())),
        metadata: Set(Some(json!({ "host": "api-1" }))),
        created_at: Set(ts(created_at)),
    }
    .insert(db)
    .await?;
    Ok(id)
}

pub async fn insert_security_alert(
    db: &DatabaseConnection,
    title: &str,
    severity: &str,
    created_at: &str,
) -> Result<Uuid> {
    let id = Uuid::new_v4();
    security_alert::ActiveModel {
        id: Set(id),
        title: Set(Some(title.to_string())),
        description: Set(Some(format!("{} detected", title))),
        severity: Set(Some(severity.to_string())),
        alert_type: Set(Some("failed_login".to_string())),
        resolved: Set(false),
        created_at: Set(ts(created_at)),
        updated_at: Set(None),
    }
    .insert(db)
    .await?;
    Ok(id)
}

pub async fn insert_user_action(
    db: &DatabaseConnection,
    action: &str,
    entity_type: &str,
    created_at: &str,
) -> Result<Uuid> {
    let id = Uuid::new_v4();
    user_action_log::ActiveModel {
        id: Set(id),
        user_id: Set(Some(Uuid::new_v4())),
        action: Set(Some(action.to_string())),
        entity_type: Set(Some(entity_type.to_string())),
        entity_id: Set(Some("42".to_string())),
        details: Set(None),
        created_at: Set(ts(created_at)),
    }
    .insert(db)
    .await?;
    Ok(id)
}

pub async fn insert_partner_action(
    db: &DatabaseConnection,
    action: &str,
    created_at: &str,
) -> Result<Uuid> {
    let id = Uuid::new_v4();
    partner_action::ActiveModel {
        id: Set(id),
        partner_id: Set(Some(Uuid::new_v4())),
        action: Set(Some(action.to_string())),
        notes: Set(Some(format!("Partner {}", action))),
        performed_by: Set(Some("ops@fleet.test".to_string())),
        created_at: Set(ts(created_at)),
    }
    .insert(db)
    .await?;
    Ok(id)
}

/// In-process [`QueryClient`] over JSON rows keyed by table name.
#[derive(Default)]
pub struct FakeQueryClient {
    rows: Mutex<HashMap<String, Vec<JsonValue>>>,
    failing_tables: Mutex<HashSet<String>>,
    failing_ids: Mutex<HashSet<String>>,
}

impl FakeQueryClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_row(self, table: &str, row: JsonValue) -> Self {
        self.rows
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .push(row);
        self
    }

    /// Make every `select` against `table` fail.
    pub fn fail_table(self, table: &str) -> Self {
        self.failing_tables
            .lock()
            .unwrap()
            .insert(table.to_string());
        self
    }

    /// Make `update` and `delete` fail for the row `id`.
    pub fn fail_id(self, id: &str) -> Self {
        self.failing_ids.lock().unwrap().insert(id.to_string());
        self
    }

    pub fn row(&self, table: &str, id: &str) -> Option<JsonValue> {
        self.rows
            .lock()
            .unwrap()
            .get(table)
            .and_then(|rows| rows.iter().find(|row| row["id"] == id).cloned())
    }

    fn check_id(&self, table: &str, id: &str) -> Result<(), QueryError> {
        if self.failing_ids.lock().unwrap().contains(id) {
            return Err(QueryError::Database(sea_orm::DbErr::Custom(format!(
                "write to {} rejected",
                table
            ))));
        }
        Ok(())
    }
}

#[async_trait]
impl QueryClient for FakeQueryClient {
    async fn select(&self, query: &SourceQuery) -> Result<Vec<JsonValue>, QueryError> {
        if self.failing_tables.lock().unwrap().contains(query.table) {
            return Err(QueryError::Database(sea_orm::DbErr::Custom(format!(
                "relation \"{}\" is unavailable",
                query.table
            ))));
        }

        let mut rows: Vec<JsonValue> = self
            .rows
            .lock()
            .unwrap()
            .get(query.table)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|row| query.filters.iter().all(|filter| filter.matches(row)))
            .collect();

        rows.sort_by(|a, b| {
            let key = |row: &JsonValue| row[query.order_by_desc].as_str().unwrap_or("").to_string();
            key(b).cmp(&key(a))
        });
        rows.truncate(query.limit as usize);
        Ok(rows)
    }

    async fn update(&self, table: &str, patch: &Patch, id: &str) -> Result<(), QueryError> {
        self.check_id(table, id)?;
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .get_mut(table)
            .and_then(|rows| rows.iter_mut().find(|row| row["id"] == id))
            .ok_or_else(|| QueryError::NotFound {
                table: table.to_string(),
                id: id.to_string(),
            })?;

        for (key, value) in patch {
            row[key.as_str()] = value.clone();
        }
        Ok(())
    }

    async fn delete(&self, table: &str, id: &str) -> Result<(), QueryError> {
        self.check_id(table, id)?;
        let mut rows = self.rows.lock().unwrap();
        let table_rows = rows.entry(table.to_string()).or_default();
        let before = table_rows.len();
        table_rows.retain(|row| row["id"] != id);
        if table_rows.len() == before {
            return Err(QueryError::NotFound {
                table: table.to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }
}

/// Store whose reads and writes always fail.
pub struct UnavailableVisibilityStore;

#[async_trait]
impl VisibilityStore for UnavailableVisibilityStore {
    async fn excluded_ids(&self, _viewer_key: &str) -> Result<HashSet<String>, VisibilityError> {
        Err(VisibilityError::Poisoned)
    }

    async fn exclude(&self, _viewer_key: &str, _ids: &[String]) -> Result<(), VisibilityError> {
        Err(VisibilityError::Poisoned)
    }

    async fn clear(&self, _viewer_key: &str) -> Result<u64, VisibilityError> {
        Err(VisibilityError::Poisoned)
    }
}

/// Aggregator over `client` with a fresh in-memory exclusion store.
pub fn aggregator_over(client: Arc<FakeQueryClient>) -> (NotificationAggregator, Arc<InMemoryVisibilityStore>) {
    let visibility = Arc::new(InMemoryVisibilityStore::new());
    let aggregator = NotificationAggregator::new(client, visibility.clone());
    (aggregator, visibility)
}
