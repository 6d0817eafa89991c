use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod auth {
    use super::*;

    /// Request body for `/auth/login` and `/auth/upsert`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct Credentials {
        pub username: String,
        pub password: String,
    }

    /// Signed bearer token, to be sent as `Authorization: Bearer <token>`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TokenResponse {
        pub token: String,
    }
}

pub mod account {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountNew {
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountUpdate {
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountView {
        pub id: Uuid,
        pub owner: String,
        pub name: String,
        pub balance_minor: i64,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountsResponse {
        pub accounts: Vec<AccountView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TopUpNew {
        pub account_id: Uuid,
        /// Must be > 0, in minor units.
        pub amount_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalanceResponse {
        pub account_id: Uuid,
        pub balance_minor: i64,
    }

    /// Query parameters for `/account/balance` and `/account/mutation`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountQuery {
        pub account_id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferNew {
        pub source_id: Uuid,
        pub dest_id: Uuid,
        /// Must be > 0, in minor units.
        pub amount_minor: i64,
    }

    /// Both post-transfer balances plus the id linking the two mutation
    /// log entries.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferResponse {
        pub transfer_id: Uuid,
        pub source_balance_minor: i64,
        pub dest_balance_minor: i64,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum MutationKind {
        TopUp,
        TransferOut,
        TransferIn,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MutationView {
        pub id: Uuid,
        pub account_id: Uuid,
        pub delta_minor: i64,
        pub kind: MutationKind,
        pub transfer_id: Option<Uuid>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MutationsResponse {
        pub mutations: Vec<MutationView>,
    }
}

pub mod category {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryNew {
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryUpdate {
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryView {
        pub id: Uuid,
        pub owner: String,
        pub name: String,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoriesResponse {
        pub categories: Vec<CategoryView>,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionNew {
        pub account_id: Uuid,
        pub category_id: Uuid,
        pub amount_minor: i64,
        pub note: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub account_id: Uuid,
        pub category_id: Uuid,
        pub amount_minor: i64,
        pub note: Option<String>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionsResponse {
        pub transactions: Vec<TransactionView>,
    }
}
