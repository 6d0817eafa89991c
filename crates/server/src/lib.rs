use axum::{Json, http::StatusCode, response::IntoResponse};
use ledger::LedgerError;

use serde::Serialize;
pub use server::{AuthConfig, ServerState, app, run, run_with_listener, spawn_with_listener};

mod account;
mod auth;
mod category;
mod server;
mod token;
mod transaction;

pub enum ServerError {
    Ledger(LedgerError),
    Generic(String),
}

/// Machine-readable error body: a human message plus a stable `kind`.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    kind: &'static str,
}

fn status_for_ledger_error(err: &LedgerError) -> StatusCode {
    match err {
        LedgerError::InvalidAmount(_) | LedgerError::SameAccount => StatusCode::BAD_REQUEST,
        LedgerError::InsufficientFunds(_) => StatusCode::PAYMENT_REQUIRED,
        LedgerError::Forbidden(_) => StatusCode::FORBIDDEN,
        LedgerError::NotFound(_) => StatusCode::NOT_FOUND,
        LedgerError::Conflict(_) | LedgerError::ExistingKey(_) => StatusCode::CONFLICT,
        LedgerError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn kind_for_ledger_error(err: &LedgerError) -> &'static str {
    match err {
        LedgerError::InvalidAmount(_) => "invalid_amount",
        LedgerError::SameAccount => "same_account",
        LedgerError::InsufficientFunds(_) => "insufficient_funds",
        LedgerError::Forbidden(_) => "forbidden",
        LedgerError::NotFound(_) => "not_found",
        LedgerError::Conflict(_) => "conflict",
        LedgerError::ExistingKey(_) => "existing_key",
        LedgerError::Database(_) => "internal",
    }
}

fn message_for_ledger_error(err: LedgerError) -> String {
    match err {
        LedgerError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, kind, error) = match self {
            ServerError::Ledger(err) => (
                status_for_ledger_error(&err),
                kind_for_ledger_error(&err),
                message_for_ledger_error(err),
            ),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, "bad_request", err),
        };

        (status, Json(ErrorBody { error, kind })).into_response()
    }
}

impl From<LedgerError> for ServerError {
    fn from(value: LedgerError) -> Self {
        Self::Ledger(value)
    }
}

impl From<sea_orm::DbErr> for ServerError {
    fn from(value: sea_orm::DbErr) -> Self {
        Self::Ledger(LedgerError::Database(value))
    }
}
