//! Database migrations for the notifications service.
//!
//! Creates the source tables the aggregator reads from and the exclusion
//! table backing the database visibility store.

pub use sea_orm_migration::prelude::*;

mod m2025_01_10_000001_create_support_notifications;
mod m2025_01_10_000002_create_system_logs;
mod m2025_01_10_000003_create_security_alerts;
mod m2025_01_10_000004_create_user_action_logs;
mod m2025_01_10_000005_create_partner_actions;
mod m2025_01_10_000006_create_notification_exclusions;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2025_01_10_000001_create_support_notifications::Migration),
            Box::new(m2025_01_10_000002_create_system_logs::Migration),
            Box::new(m2025_01_10_000003_create_security_alerts::Migration),
            Box::new(m2025_01_10_000004_create_user_action_logs::Migration),
            Box::new(m2025_01_10_000005_create_partner_actions::Migration),
            Box::new(m2025_01_10_000006_create_notification_exclusions::Migration),
        ]
    }
}
