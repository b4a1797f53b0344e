//! Notification exclusion entity model
//!
//! One row per (viewer key, notification id) the viewer has hidden.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "notification_exclusions")]
pub struct Model {
    /// Namespaced viewer key (`{namespace}:{viewer id}`)
    #[sea_orm(primary_key, auto_increment = false)]
    pub viewer_key: String,

    #[sea_orm(primary_key, auto_increment = false)]
    pub notification_id: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
