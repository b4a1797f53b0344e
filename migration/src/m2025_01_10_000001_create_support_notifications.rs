//! Migration to create the support_notifications table.
//!
//! Support notifications are the only source that persists read state, so the
//! table carries an `is_read` flag alongside the free-text fields.

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Statement;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SupportNotifications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SupportNotifications::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SupportNotifications::Title).text().null())
                    .col(ColumnDef::new(SupportNotifications::Message).text().null())
                    .col(ColumnDef::new(SupportNotifications::Category).text().null())
                    .col(ColumnDef::new(SupportNotifications::Priority).text().null())
                    .col(
                        ColumnDef::new(SupportNotifications::IsRead)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(SupportNotifications::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(SupportNotifications::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute(Statement::from_string(
                manager.get_database_backend(),
                "CREATE INDEX IF NOT EXISTS idx_support_notifications_created ON support_notifications (created_at DESC)".to_string(),
            ))
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_support_notifications_created")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(SupportNotifications::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SupportNotifications {
    Table,
    Id,
    Title,
    Message,
    Category,
    Priority,
    IsRead,
    CreatedAt,
    UpdatedAt,
}
