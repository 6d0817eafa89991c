//! Balance store: atomic read-modify-write on account balances.
//!
//! Adjustments use optimistic versioning: the current `(balance, version)`
//! pair is read, the new balance validated, then written with a
//! compare-and-swap on the version column. A swap that matches zero rows
//! means another writer got there first and the caller sees [`Conflict`].
//!
//! Operations on different accounts never contend with each other; the
//! version counter serializes writers per account only.
//!
//! [`Conflict`]: crate::LedgerError::Conflict

use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::{LedgerError, ResultLedger, accounts};

/// Bounded retry budget for transient [`Conflict`] failures.
///
/// [`Conflict`]: crate::LedgerError::Conflict
pub(crate) const MAX_ADJUST_ATTEMPTS: u32 = 3;

/// Current balance of an account.
pub(crate) async fn get_balance<C: ConnectionTrait>(
    conn: &C,
    account_id: Uuid,
) -> ResultLedger<i64> {
    let model = accounts::Entity::find_by_id(account_id.to_string())
        .one(conn)
        .await?
        .ok_or_else(|| LedgerError::NotFound("account not exists".to_string()))?;
    Ok(model.balance)
}

/// Applies a signed delta to an account balance.
///
/// Fails `NotFound` when the account is missing, `InsufficientFunds` when the
/// resulting balance would be negative and `Conflict` when a concurrent
/// adjustment invalidated the read. Returns the new balance.
pub(crate) async fn adjust_balance<C: ConnectionTrait>(
    conn: &C,
    account_id: Uuid,
    delta: i64,
) -> ResultLedger<i64> {
    let model = accounts::Entity::find_by_id(account_id.to_string())
        .one(conn)
        .await?
        .ok_or_else(|| LedgerError::NotFound("account not exists".to_string()))?;

    let new_balance = model
        .balance
        .checked_add(delta)
        .ok_or_else(|| LedgerError::InvalidAmount("balance overflow".to_string()))?;
    if new_balance < 0 {
        return Err(LedgerError::InsufficientFunds(format!(
            "balance {} cannot cover {}",
            model.balance, -delta
        )));
    }

    cas_balance(conn, account_id, model.version, new_balance).await
}

/// Writes the new balance iff the version column still matches the read.
async fn cas_balance<C: ConnectionTrait>(
    conn: &C,
    account_id: Uuid,
    expected_version: i64,
    new_balance: i64,
) -> ResultLedger<i64> {
    let result = accounts::Entity::update_many()
        .col_expr(accounts::Column::Balance, Expr::value(new_balance))
        .col_expr(accounts::Column::Version, Expr::value(expected_version + 1))
        .filter(accounts::Column::Id.eq(account_id.to_string()))
        .filter(accounts::Column::Version.eq(expected_version))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(LedgerError::Conflict(
            "concurrent balance adjustment".to_string(),
        ));
    }

    Ok(new_balance)
}

#[cfg(test)]
mod tests {
    use migration::MigratorTrait;
    use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

    use super::*;

    async fn db_with_account(account_id: Uuid) -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        let backend = db.get_database_backend();
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO users (username, password, admin) VALUES (?, ?, ?)",
            vec!["alice".into(), "password".into(), false.into()],
        ))
        .await
        .unwrap();
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO accounts (id, owner, name, balance, version, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
            vec![
                account_id.to_string().into(),
                "alice".into(),
                "Main".into(),
                100i64.into(),
                0i64.into(),
                chrono::Utc::now().into(),
            ],
        ))
        .await
        .unwrap();
        db
    }

    #[tokio::test]
    async fn stale_version_yields_conflict() {
        let account_id = Uuid::new_v4();
        let db = db_with_account(account_id).await;

        let err = cas_balance(&db, account_id, 7, 150).await.unwrap_err();
        assert_eq!(
            err,
            LedgerError::Conflict("concurrent balance adjustment".to_string())
        );
        assert_eq!(get_balance(&db, account_id).await.unwrap(), 100);
    }

    #[tokio::test]
    async fn matching_version_swaps_and_bumps() {
        let account_id = Uuid::new_v4();
        let db = db_with_account(account_id).await;

        assert_eq!(cas_balance(&db, account_id, 0, 150).await.unwrap(), 150);
        // The version moved, so the same expectation now conflicts.
        assert!(cas_balance(&db, account_id, 0, 200).await.is_err());
        assert_eq!(get_balance(&db, account_id).await.unwrap(), 150);
    }

    #[tokio::test]
    async fn adjust_rejects_negative_result() {
        let account_id = Uuid::new_v4();
        let db = db_with_account(account_id).await;

        let err = adjust_balance(&db, account_id, -150).await.unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientFunds(_)));
        assert_eq!(get_balance(&db, account_id).await.unwrap(), 100);
    }

    #[tokio::test]
    async fn adjust_missing_account_is_not_found() {
        let db = db_with_account(Uuid::new_v4()).await;
        let err = adjust_balance(&db, Uuid::new_v4(), 10).await.unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(_)));
    }
}
