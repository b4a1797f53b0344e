//! Migration to create the notification_exclusions table.
//!
//! Stores, per viewer key, the notification ids that viewer has hidden.
//! Origin rows are never touched; clearing a viewer's rows resurrects them.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(NotificationExclusions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(NotificationExclusions::ViewerKey)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(NotificationExclusions::NotificationId)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(NotificationExclusions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .primary_key(
                        Index::create()
                            .name("pk_notification_exclusions")
                            .col(NotificationExclusions::ViewerKey)
                            .col(NotificationExclusions::NotificationId),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(NotificationExclusions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum NotificationExclusions {
    Table,
    ViewerKey,
    NotificationId,
    CreatedAt,
}
