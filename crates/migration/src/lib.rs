pub use sea_orm_migration::prelude::*;

mod m20260110_000001_users;
mod m20260110_000002_accounts;
mod m20260110_000003_transfers;
mod m20260110_000004_mutations;
mod m20260110_000005_categories;
mod m20260110_000006_transactions;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260110_000001_users::Migration),
            Box::new(m20260110_000002_accounts::Migration),
            Box::new(m20260110_000003_transfers::Migration),
            Box::new(m20260110_000004_mutations::Migration),
            Box::new(m20260110_000005_categories::Migration),
            Box::new(m20260110_000006_transactions::Migration),
        ]
    }
}
