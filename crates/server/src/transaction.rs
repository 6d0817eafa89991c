//! Categorized transaction API endpoints.

use api_types::transaction::{TransactionNew, TransactionView, TransactionsResponse};
use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
};

use crate::{ServerError, server::ServerState};
use ledger::Caller;

fn transaction_view(transaction: ledger::Transaction) -> TransactionView {
    TransactionView {
        id: transaction.id,
        account_id: transaction.account_id,
        category_id: transaction.category_id,
        amount_minor: transaction.amount_minor,
        note: transaction.note,
        created_at: transaction.created_at,
    }
}

pub async fn new(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Json(payload): Json<TransactionNew>,
) -> Result<(StatusCode, Json<TransactionView>), ServerError> {
    let transaction = state
        .ledger
        .new_transaction(
            &caller,
            payload.account_id,
            payload.category_id,
            payload.amount_minor,
            payload.note,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(transaction_view(transaction))))
}

pub async fn list(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
) -> Result<Json<TransactionsResponse>, ServerError> {
    let transactions = state.ledger.list_transactions(&caller).await?;
    Ok(Json(TransactionsResponse {
        transactions: transactions.into_iter().map(transaction_view).collect(),
    }))
}
