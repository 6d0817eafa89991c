//! The module contains the errors the ledger can throw.
//!
//! Every balance operation returns one of these kinds; the HTTP layer maps
//! each kind to a distinct status code. [`Conflict`] is the only transient
//! kind and the only one the ledger retries internally.
//!
//!  [`Conflict`]: LedgerError::Conflict
use sea_orm::DbErr;
use thiserror::Error;

/// Ledger custom errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("\"{0}\" not found!")]
    NotFound(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("source and destination account must differ")]
    SameAccount,
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for LedgerError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InsufficientFunds(a), Self::InsufficientFunds(b)) => a == b,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::SameAccount, Self::SameAccount) => true,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
