//! Mutation log primitives.
//!
//! Every balance-affecting event appends exactly one `MutationEntry` per
//! touched account. Entries are immutable once written; for each account the
//! sum of all deltas equals the current balance.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::LedgerError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    TopUp,
    TransferOut,
    TransferIn,
}

impl MutationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TopUp => "top_up",
            Self::TransferOut => "transfer_out",
            Self::TransferIn => "transfer_in",
        }
    }
}

impl TryFrom<&str> for MutationKind {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "top_up" => Ok(Self::TopUp),
            "transfer_out" => Ok(Self::TransferOut),
            "transfer_in" => Ok(Self::TransferIn),
            other => Err(LedgerError::NotFound(format!(
                "invalid mutation kind: {other}"
            ))),
        }
    }
}

/// An immutable record of a single balance delta.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationEntry {
    pub id: Uuid,
    pub account_id: Uuid,
    pub delta_minor: i64,
    pub kind: MutationKind,
    /// Present on `transfer_out`/`transfer_in`; both sides of one transfer
    /// carry the same id.
    pub transfer_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl MutationEntry {
    pub fn new(
        account_id: Uuid,
        delta_minor: i64,
        kind: MutationKind,
        transfer_id: Option<Uuid>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            delta_minor,
            kind,
            transfer_id,
            created_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "mutations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub account_id: String,
    pub delta: i64,
    pub kind: String,
    pub transfer_id: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Accounts,
    #[sea_orm(
        belongs_to = "super::transfers::Entity",
        from = "Column::TransferId",
        to = "super::transfers::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Transfers,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl Related<super::transfers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transfers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&MutationEntry> for ActiveModel {
    fn from(entry: &MutationEntry) -> Self {
        Self {
            id: ActiveValue::Set(entry.id.to_string()),
            account_id: ActiveValue::Set(entry.account_id.to_string()),
            delta: ActiveValue::Set(entry.delta_minor),
            kind: ActiveValue::Set(entry.kind.as_str().to_string()),
            transfer_id: ActiveValue::Set(entry.transfer_id.map(|id| id.to_string())),
            created_at: ActiveValue::Set(entry.created_at),
        }
    }
}

impl TryFrom<Model> for MutationEntry {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| LedgerError::NotFound("mutation not exists".to_string()))?,
            account_id: Uuid::parse_str(&model.account_id)
                .map_err(|_| LedgerError::NotFound("account not exists".to_string()))?,
            delta_minor: model.delta,
            kind: MutationKind::try_from(model.kind.as_str())?,
            transfer_id: model
                .transfer_id
                .map(|s| {
                    Uuid::parse_str(&s)
                        .map_err(|_| LedgerError::NotFound("transfer not exists".to_string()))
                })
                .transpose()?,
            created_at: model.created_at,
        })
    }
}
