//! Relational query client used by the aggregator.
//!
//! Rows come back loosely typed (`serde_json::Value`) so every source table
//! can flow through the same fetch path. Table and column names are the
//! storage contract and are resolved against the SeaORM entities at runtime.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use sea_orm::{
    ColumnTrait, ColumnType, Condition, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Value,
    sea_query::{Expr, Func},
};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use thiserror::Error;
use uuid::Uuid;

use crate::aggregator::catalog::DEFAULT_ROW_LIMIT;
use crate::models::{
    partner_action, security_alert, support_notification, system_log, user_action_log,
};

/// Storage table names.
pub mod tables {
    pub const SUPPORT_NOTIFICATIONS: &str = "support_notifications";
    pub const SYSTEM_LOGS: &str = "system_logs";
    pub const SECURITY_ALERTS: &str = "security_alerts";
    pub const USER_ACTION_LOGS: &str = "user_action_logs";
    pub const PARTNER_ACTIONS: &str = "partner_actions";
}

/// Column patch for [`QueryClient::update`], keyed by column name.
pub type Patch = Map<String, JsonValue>;

/// Row predicate applied by [`QueryClient::select`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Case-insensitive substring match of any needle against a text column.
    ContainsAny {
        column: &'static str,
        needles: &'static [&'static str],
    },
}

impl Filter {
    /// In-memory evaluation against a fetched row; used by fakes and tests.
    pub fn matches(&self, row: &JsonValue) -> bool {
        match self {
            Filter::ContainsAny { column, needles } => row
                .get(*column)
                .and_then(JsonValue::as_str)
                .map(|text| {
                    let text = text.to_lowercase();
                    needles.iter().any(|needle| text.contains(needle))
                })
                .unwrap_or(false),
        }
    }
}

/// `select(table, filters, orderBy desc, limit)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceQuery {
    pub table: &'static str,
    pub filters: Vec<Filter>,
    pub order_by_desc: &'static str,
    pub limit: u64,
}

impl SourceQuery {
    pub fn new(table: &'static str) -> Self {
        Self {
            table,
            filters: Vec::new(),
            order_by_desc: "created_at",
            limit: DEFAULT_ROW_LIMIT,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("unknown table '{0}'")]
    UnknownTable(String),
    #[error("unknown column '{column}' on table '{table}'")]
    UnknownColumn { table: String, column: String },
    #[error("invalid row id '{0}'")]
    InvalidId(String),
    #[error("invalid value for column '{column}': {reason}")]
    InvalidValue { column: String, reason: String },
    #[error("no row with id '{id}' in '{table}'")]
    NotFound { table: String, id: String },
    #[error("failed to encode row: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

/// Generic access to the source tables.
#[async_trait]
pub trait QueryClient: Send + Sync {
    /// Fetch rows matching `query`, newest first.
    async fn select(&self, query: &SourceQuery) -> Result<Vec<JsonValue>, QueryError>;

    /// Apply `patch` to the row whose primary key is `id`.
    async fn update(&self, table: &str, patch: &Patch, id: &str) -> Result<(), QueryError>;

    /// Delete the row whose primary key is `id`.
    async fn delete(&self, table: &str, id: &str) -> Result<(), QueryError>;
}

/// [`QueryClient`] over a SeaORM connection.
#[derive(Clone)]
pub struct SeaOrmQueryClient {
    db: DatabaseConnection,
}

impl SeaOrmQueryClient {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn select_rows<E>(&self, query: &SourceQuery) -> Result<Vec<JsonValue>, QueryError>
    where
        E: EntityTrait,
        E::Model: Serialize,
    {
        let mut select = E::find();
        for filter in &query.filters {
            select = select.filter(condition_for::<E>(query.table, filter)?);
        }

        let order_column = column::<E>(query.table, query.order_by_desc)?;
        let models = select
            .order_by_desc(order_column)
            .limit(query.limit)
            .all(&self.db)
            .await?;

        models
            .iter()
            .map(|model| serde_json::to_value(model).map_err(QueryError::from))
            .collect()
    }

    async fn update_row<E>(&self, table: &str, patch: &Patch, id: &str) -> Result<(), QueryError>
    where
        E: EntityTrait,
    {
        let key = parse_id(id)?;
        let mut update = E::update_many();
        for (name, value) in patch {
            let col = column::<E>(table, name)?;
            update = update.col_expr(col, Expr::value(json_to_value(col, name, value)?));
        }

        let result = update
            .filter(column::<E>(table, "id")?.eq(key))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(QueryError::NotFound {
                table: table.to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn delete_row<E>(&self, table: &str, id: &str) -> Result<(), QueryError>
    where
        E: EntityTrait,
    {
        let key = parse_id(id)?;
        let result = E::delete_many()
            .filter(column::<E>(table, "id")?.eq(key))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(QueryError::NotFound {
                table: table.to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl QueryClient for SeaOrmQueryClient {
    async fn select(&self, query: &SourceQuery) -> Result<Vec<JsonValue>, QueryError> {
        match query.table {
            tables::SUPPORT_NOTIFICATIONS => {
                self.select_rows::<support_notification::Entity>(query).await
            }
            tables::SYSTEM_LOGS => self.select_rows::<system_log::Entity>(query).await,
            tables::SECURITY_ALERTS => self.select_rows::<security_alert::Entity>(query).await,
            tables::USER_ACTION_LOGS => self.select_rows::<user_action_log::Entity>(query).await,
            tables::PARTNER_ACTIONS => self.select_rows::<partner_action::Entity>(query).await,
            other => Err(QueryError::UnknownTable(other.to_string())),
        }
    }

    async fn update(&self, table: &str, patch: &Patch, id: &str) -> Result<(), QueryError> {
        match table {
            tables::SUPPORT_NOTIFICATIONS => {
                self.update_row::<support_notification::Entity>(table, patch, id)
                    .await
            }
            tables::SYSTEM_LOGS => self.update_row::<system_log::Entity>(table, patch, id).await,
            tables::SECURITY_ALERTS => {
                self.update_row::<security_alert::Entity>(table, patch, id)
                    .await
            }
            tables::USER_ACTION_LOGS => {
                self.update_row::<user_action_log::Entity>(table, patch, id)
                    .await
            }
            tables::PARTNER_ACTIONS => {
                self.update_row::<partner_action::Entity>(table, patch, id)
                    .await
            }
            other => Err(QueryError::UnknownTable(other.to_string())),
        }
    }

    async fn delete(&self, table: &str, id: &str) -> Result<(), QueryError> {
        match table {
            tables::SUPPORT_NOTIFICATIONS => {
                self.delete_row::<support_notification::Entity>(table, id)
                    .await
            }
            tables::SYSTEM_LOGS => self.delete_row::<system_log::Entity>(table, id).await,
            tables::SECURITY_ALERTS => self.delete_row::<security_alert::Entity>(table, id).await,
            tables::USER_ACTION_LOGS => self.delete_row::<user_action_log::Entity>(table, id).await,
            tables::PARTNER_ACTIONS => self.delete_row::<partner_action::Entity>(table, id).await,
            other => Err(QueryError::UnknownTable(other.to_string())),
        }
    }
}

fn column<E: EntityTrait>(table: &str, name: &str) -> Result<E::Column, QueryError> {
    E::Column::from_str(name).map_err(|_| QueryError::UnknownColumn {
        table: table.to_string(),
        column: name.to_string(),
    })
}

fn condition_for<E: EntityTrait>(table: &str, filter: &Filter) -> Result<Condition, QueryError> {
    match filter {
        Filter::ContainsAny { column: name, needles } => {
            let col = column::<E>(table, name)?;
            let condition = needles.iter().fold(Condition::any(), |cond, needle| {
                cond.add(
                    Expr::expr(Func::lower(Expr::col(col)))
                        .like(format!("%{}%", needle.to_lowercase())),
                )
            });
            Ok(condition)
        }
    }
}

fn parse_id(id: &str) -> Result<Uuid, QueryError> {
    Uuid::parse_str(id).map_err(|_| QueryError::InvalidId(id.to_string()))
}

/// Convert a JSON patch value into a bind value shaped by the column type.
fn json_to_value<C: ColumnTrait>(col: C, name: &str, value: &JsonValue) -> Result<Value, QueryError> {
    let invalid = |reason: &str| QueryError::InvalidValue {
        column: name.to_string(),
        reason: reason.to_string(),
    };

    let converted = match (col.def().get_column_type(), value) {
        (ColumnType::Boolean, JsonValue::Bool(flag)) => Value::from(*flag),
        (ColumnType::Boolean, JsonValue::Null) => Value::from(None::<bool>),
        (ColumnType::TimestampWithTimeZone, JsonValue::String(raw)) => {
            let parsed = DateTime::<FixedOffset>::parse_from_rfc3339(raw)
                .map_err(|_| invalid("expected an RFC 3339 timestamp"))?;
            Value::from(parsed)
        }
        (ColumnType::TimestampWithTimeZone, JsonValue::Null) => {
            Value::from(None::<DateTime<FixedOffset>>)
        }
        (ColumnType::Uuid, JsonValue::String(raw)) => {
            Value::from(Uuid::parse_str(raw).map_err(|_| invalid("expected a UUID"))?)
        }
        (ColumnType::Uuid, JsonValue::Null) => Value::from(None::<Uuid>),
        (ColumnType::Json | ColumnType::JsonBinary, other) => Value::from(other.clone()),
        (ColumnType::String(_) | ColumnType::Text, JsonValue::String(raw)) => {
            Value::from(raw.clone())
        }
        (ColumnType::String(_) | ColumnType::Text, JsonValue::Null) => Value::from(None::<String>),
        _ => return Err(invalid("unsupported value for column type")),
    };

    Ok(converted)
}
