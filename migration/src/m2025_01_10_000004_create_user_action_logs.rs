//! Migration to create the user_action_logs table.

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
                    .table(UserActionLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserActionLogs::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserActionLogs::UserId).uuid().null())
                    .col(ColumnDef::new(UserActionLogs::Action).text().null())
                    .col(ColumnDef::new(UserActionLogs::EntityType).text().null())
                    .col(ColumnDef::new(UserActionLogs::EntityId).text().null())
                    .col(ColumnDef::new(UserActionLogs::Details).text().null())
                    .col(
                        ColumnDef::new(UserActionLogs::CreatedAt)
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
                "CREATE INDEX IF NOT EXISTS idx_user_action_logs_created ON user_action_logs (created_at DESC)".to_string(),
            ))
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_user_action_logs_created").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(UserActionLogs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum UserActionLogs {
    Table,
    Id,
    UserId,
    Action,
    EntityType,
    EntityId,
    Details,
    CreatedAt,
}
