//! Support notification entity model
//!
//! Rows in `support_notifications` are the only notification source that
//! persists read state and can be deleted from the inbox.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::Serialize;

/// Support notification raised for operations staff
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "support_notifications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub title: Option<String>,

    pub message: Option<String>,

    /// Business category tag (e.g. bookings, payments); free text in storage
    pub category: Option<String>,

    /// Priority label as entered by support tooling
    pub priority: Option<String>,

    pub is_read: bool,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
