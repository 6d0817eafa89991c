//! Categorized transaction records.
//!
//! A `Transaction` links an account to a category with an amount. It is a
//! bookkeeping record only: balances move exclusively through top-ups and
//! transfers.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::LedgerError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub account_id: Uuid,
    pub category_id: Uuid,
    pub amount_minor: i64,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        account_id: Uuid,
        category_id: Uuid,
        amount_minor: i64,
        note: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            category_id,
            amount_minor,
            note,
            created_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub account_id: String,
    pub category_id: String,
    pub amount: i64,
    pub note: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Accounts,
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Categories,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(value: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            account_id: ActiveValue::Set(value.account_id.to_string()),
            category_id: ActiveValue::Set(value.category_id.to_string()),
            amount: ActiveValue::Set(value.amount_minor),
            note: ActiveValue::Set(value.note.clone()),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| LedgerError::NotFound("transaction not exists".to_string()))?,
            account_id: Uuid::parse_str(&model.account_id)
                .map_err(|_| LedgerError::NotFound("account not exists".to_string()))?,
            category_id: Uuid::parse_str(&model.category_id)
                .map_err(|_| LedgerError::NotFound("category not exists".to_string()))?,
            amount_minor: model.amount,
            note: model.note,
            created_at: model.created_at,
        })
    }
}
