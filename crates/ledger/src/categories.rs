//! The module contains the `Category` struct and its database model.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::LedgerError;

/// A transaction category, a simple catalog row scoped by owner.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub owner: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn new(owner: String, name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            name,
            created_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transaction_categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub owner: String,
    pub name: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Category> for ActiveModel {
    fn from(value: &Category) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            owner: ActiveValue::Set(value.owner.clone()),
            name: ActiveValue::Set(value.name.clone()),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}

impl TryFrom<Model> for Category {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| LedgerError::NotFound("category not exists".to_string()))?,
            owner: model.owner,
            name: model.name,
            created_at: model.created_at,
        })
    }
}
