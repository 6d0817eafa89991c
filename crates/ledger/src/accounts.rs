//! The module contains the `Account` struct and its database model.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::LedgerError;

/// A user account.
///
/// An account holds identity/profile data and the current balance in minor
/// units. The balance is only ever mutated through the ledger operations;
/// profile updates never touch it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Account {
    /// Stable identifier, a UUID generated once and persisted as a string.
    pub id: Uuid,
    /// Username of the owning identity.
    pub owner: String,
    pub name: String,
    pub balance_minor: i64,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// New account with a zero balance.
    pub fn new(owner: String, name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            name,
            balance_minor: 0,
            created_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub owner: String,
    pub name: String,
    pub balance: i64,
    /// Optimistic concurrency counter, bumped by every balance write.
    pub version: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::mutations::Entity")]
    Mutations,
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::mutations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Mutations.def()
    }
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Account> for ActiveModel {
    fn from(value: &Account) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            owner: ActiveValue::Set(value.owner.clone()),
            name: ActiveValue::Set(value.name.clone()),
            balance: ActiveValue::Set(value.balance_minor),
            version: ActiveValue::Set(0),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}

impl TryFrom<Model> for Account {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| LedgerError::NotFound("account not exists".to_string()))?,
            owner: model.owner,
            name: model.name,
            balance_minor: model.balance,
            created_at: model.created_at,
        })
    }
}
