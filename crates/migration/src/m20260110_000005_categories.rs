use sea_orm_migration::prelude::*;

use crate::m20260110_000001_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
pub enum TransactionCategories {
    Table,
    Id,
    Owner,
    Name,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TransactionCategories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TransactionCategories::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TransactionCategories::Owner)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TransactionCategories::Name)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TransactionCategories::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transaction_categories-owner")
                            .from(TransactionCategories::Table, TransactionCategories::Owner)
                            .to(Users::Table, Users::Username),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transaction_categories-owner-name")
                    .table(TransactionCategories::Table)
                    .col(TransactionCategories::Owner)
                    .col(TransactionCategories::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TransactionCategories::Table).to_owned())
            .await
    }
}
