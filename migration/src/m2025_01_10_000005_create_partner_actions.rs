//! Migration to create the partner_actions table.
//!
//! Records administrative actions taken against partner accounts
//! (approvals, rejections, suspensions).

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
                    .table(PartnerActions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PartnerActions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PartnerActions::PartnerId).uuid().null())
                    .col(ColumnDef::new(PartnerActions::Action).text().null())
                    .col(ColumnDef::new(PartnerActions::Notes).text().null())
                    .col(ColumnDef::new(PartnerActions::PerformedBy).text().null())
                    .col(
                        ColumnDef::new(PartnerActions::CreatedAt)
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
                "CREATE INDEX IF NOT EXISTS idx_partner_actions_created ON partner_actions (created_at DESC)".to_string(),
            ))
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_partner_actions_created").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(PartnerActions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PartnerActions {
    Table,
    Id,
    PartnerId,
    Action,
    Notes,
    PerformedBy,
    CreatedAt,
}
