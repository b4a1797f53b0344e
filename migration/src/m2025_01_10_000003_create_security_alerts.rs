//! Migration to create the security_alerts table.

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
                    .table(SecurityAlerts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SecurityAlerts::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SecurityAlerts::Title).text().null())
                    .col(ColumnDef::new(SecurityAlerts::Description).text().null())
                    .col(ColumnDef::new(SecurityAlerts::Severity).text().null())
                    .col(ColumnDef::new(SecurityAlerts::AlertType).text().null())
                    .col(
                        ColumnDef::new(SecurityAlerts::Resolved)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(SecurityAlerts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(SecurityAlerts::UpdatedAt)
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
                "CREATE INDEX IF NOT EXISTS idx_security_alerts_created ON security_alerts (created_at DESC)".to_string(),
            ))
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_security_alerts_created").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(SecurityAlerts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SecurityAlerts {
    Table,
    Id,
    Title,
    Description,
    Severity,
    AlertType,
    Resolved,
    CreatedAt,
    UpdatedAt,
}
