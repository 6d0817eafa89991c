use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
pub enum Transfers {
    Table,
    Id,
    SourceId,
    DestId,
    Amount,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Transfers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transfers::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transfers::SourceId).string().not_null())
                    .col(ColumnDef::new(Transfers::DestId).string().not_null())
                    .col(ColumnDef::new(Transfers::Amount).big_integer().not_null())
                    // Audit rows outlive the accounts they mention, so the
                    // account ids carry no foreign key.
                    .col(ColumnDef::new(Transfers::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Transfers::Table).to_owned())
            .await
    }
}
