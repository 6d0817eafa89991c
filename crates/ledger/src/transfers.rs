//! The module contains the `Transfer` struct and its database model.
//!
//! A transfer moves money between two accounts. The row is written in the
//! same database transaction as both balance adjustments and both linked
//! mutation entries; it is never visible half-applied.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: Uuid,
    pub source_id: Uuid,
    pub dest_id: Uuid,
    pub amount_minor: i64,
    pub created_at: DateTime<Utc>,
}

impl Transfer {
    pub fn new(source_id: Uuid, dest_id: Uuid, amount_minor: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_id,
            dest_id,
            amount_minor,
            created_at: Utc::now(),
        }
    }
}

/// Result of a committed transfer: the id plus both post-transfer balances.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferOutcome {
    pub transfer_id: Uuid,
    pub source_balance_minor: i64,
    pub dest_balance_minor: i64,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transfers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub source_id: String,
    pub dest_id: String,
    pub amount: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::mutations::Entity")]
    Mutations,
}

impl Related<super::mutations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Mutations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transfer> for ActiveModel {
    fn from(value: &Transfer) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            source_id: ActiveValue::Set(value.source_id.to_string()),
            dest_id: ActiveValue::Set(value.dest_id.to_string()),
            amount: ActiveValue::Set(value.amount_minor),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}
