//! Account API endpoints.

use api_types::account::{
    AccountNew, AccountQuery, AccountUpdate, AccountView, AccountsResponse, BalanceResponse,
    MutationKind as ApiKind, MutationView, MutationsResponse, TopUpNew, TransferNew,
    TransferResponse,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};
use ledger::Caller;

fn map_kind(kind: ledger::MutationKind) -> ApiKind {
    match kind {
        ledger::MutationKind::TopUp => ApiKind::TopUp,
        ledger::MutationKind::TransferOut => ApiKind::TransferOut,
        ledger::MutationKind::TransferIn => ApiKind::TransferIn,
    }
}

fn account_view(account: ledger::Account) -> AccountView {
    AccountView {
        id: account.id,
        owner: account.owner,
        name: account.name,
        balance_minor: account.balance_minor,
        created_at: account.created_at,
    }
}

pub async fn create(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Json(payload): Json<AccountNew>,
) -> Result<(StatusCode, Json<AccountView>), ServerError> {
    let account = state.ledger.create_account(&caller, &payload.name).await?;
    Ok((StatusCode::CREATED, Json(account_view(account))))
}

pub async fn read(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AccountView>, ServerError> {
    let account = state.ledger.account(&caller, id).await?;
    Ok(Json(account_view(account)))
}

pub async fn update(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AccountUpdate>,
) -> Result<Json<AccountView>, ServerError> {
    let account = state
        .ledger
        .update_account(&caller, id, &payload.name)
        .await?;
    Ok(Json(account_view(account)))
}

pub async fn delete(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.ledger.delete_account(&caller, id).await?;
    Ok(StatusCode::OK)
}

pub async fn list(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
) -> Result<Json<AccountsResponse>, ServerError> {
    let accounts = state.ledger.list_accounts(&caller).await?;
    Ok(Json(AccountsResponse {
        accounts: accounts.into_iter().map(account_view).collect(),
    }))
}

pub async fn top_up(
    Extension(_caller): Extension<Caller>,
    State(state): State<ServerState>,
    Json(payload): Json<TopUpNew>,
) -> Result<Json<BalanceResponse>, ServerError> {
    let balance_minor = state
        .ledger
        .top_up(payload.account_id, payload.amount_minor)
        .await?;
    Ok(Json(BalanceResponse {
        account_id: payload.account_id,
        balance_minor,
    }))
}

pub async fn my(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
) -> Result<Json<AccountsResponse>, ServerError> {
    let accounts = state.ledger.my_accounts(&caller).await?;
    Ok(Json(AccountsResponse {
        accounts: accounts.into_iter().map(account_view).collect(),
    }))
}

pub async fn balance(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Query(query): Query<AccountQuery>,
) -> Result<Json<BalanceResponse>, ServerError> {
    let balance_minor = state.ledger.balance(&caller, query.account_id).await?;
    Ok(Json(BalanceResponse {
        account_id: query.account_id,
        balance_minor,
    }))
}

pub async fn transfer(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Json(payload): Json<TransferNew>,
) -> Result<Json<TransferResponse>, ServerError> {
    let outcome = state
        .ledger
        .transfer(
            &caller,
            payload.source_id,
            payload.dest_id,
            payload.amount_minor,
        )
        .await?;
    Ok(Json(TransferResponse {
        transfer_id: outcome.transfer_id,
        source_balance_minor: outcome.source_balance_minor,
        dest_balance_minor: outcome.dest_balance_minor,
    }))
}

pub async fn mutation(
    Extension(caller): Extension<Caller>,
    State(state): State<ServerState>,
    Query(query): Query<AccountQuery>,
) -> Result<Json<MutationsResponse>, ServerError> {
    let entries = state
        .ledger
        .mutation_history(&caller, query.account_id)
        .await?;

    let mutations = entries
        .into_iter()
        .map(|entry| MutationView {
            id: entry.id,
            account_id: entry.account_id,
            delta_minor: entry.delta_minor,
            kind: map_kind(entry.kind),
            transfer_id: entry.transfer_id,
            created_at: entry.created_at,
        })
        .collect();

    Ok(Json(MutationsResponse { mutations }))
}
