use sea_orm_migration::prelude::*;

use crate::m20260110_000003_transfers::Transfers;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Mutations {
    Table,
    Id,
    AccountId,
    Delta,
    Kind,
    TransferId,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Mutations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Mutations::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Mutations::AccountId).string().not_null())
                    .col(ColumnDef::new(Mutations::Delta).big_integer().not_null())
                    .col(ColumnDef::new(Mutations::Kind).string().not_null())
                    .col(ColumnDef::new(Mutations::TransferId).string())
                    // The log is append-only and kept after account deletion;
                    // account_id is a historical reference, not a foreign key.
                    .col(ColumnDef::new(Mutations::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-mutations-transfer_id")
                            .from(Mutations::Table, Mutations::TransferId)
                            .to(Transfers::Table, Transfers::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-mutations-account_id-created_at")
                    .table(Mutations::Table)
                    .col(Mutations::AccountId)
                    .col(Mutations::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Mutations::Table).to_owned())
            .await
    }
}
