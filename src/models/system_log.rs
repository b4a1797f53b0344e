//! System log entity model
//!
//! Application log lines written by platform services. Several notification
//! categories are carved out of this table by message filters.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::Serialize;
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "system_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Log level (error, warning, info, ...)
    pub level: Option<String>,

    pub message: Option<String>,

    /// Emitting component
    pub source: Option<String>,

    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub metadata: Option<JsonValue>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
