//! Migration to create the system_logs table.
//!
//! System log lines feed several notification categories (fleet, documents,
//! payments, bookings, claims) through message filters, so the message column
//! is indexed alongside creation time.

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
                    .table(SystemLogs::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(SystemLogs::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(SystemLogs::Level).text().null())
                    .col(ColumnDef::new(SystemLogs::Message).text().null())
                    .col(ColumnDef::new(SystemLogs::Source).text().null())
                    .col(ColumnDef::new(SystemLogs::Metadata).json_binary().null())
                    .col(
                        ColumnDef::new(SystemLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute(Statement::from_string(
                manager.get_database_backend(),
                "CREATE INDEX IF NOT EXISTS idx_system_logs_created ON system_logs (created_at DESC)"
                    .to_string(),
            ))
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_system_logs_created").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(SystemLogs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SystemLogs {
    Table,
    Id,
    Level,
    Message,
    Source,
    Metadata,
    CreatedAt,
}
