use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use uuid::Uuid;

use ledger::{Caller, Ledger, LedgerError, MutationKind};
use migration::MigratorTrait;

async fn ledger_with_db() -> (Ledger, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    for (username, admin) in [("alice", false), ("bob", false), ("root", true)] {
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO users (username, password, admin) VALUES (?, ?, ?)",
            vec![username.into(), "password".into(), admin.into()],
        ))
        .await
        .unwrap();
    }
    let ledger = Ledger::builder().database(db.clone()).build();
    (ledger, db)
}

async fn ledger_with_file_db() -> (Ledger, DatabaseConnection, std::path::PathBuf) {
    let root = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/test_dbs");
    std::fs::create_dir_all(&root).unwrap();

    let path = root.join(format!("ledger_{}.db", Uuid::new_v4()));
    let url = format!("sqlite:{}?mode=rwc", path.display());

    let db = Database::connect(&url).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    for username in ["alice", "bob"] {
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO users (username, password, admin) VALUES (?, ?, ?)",
            vec![username.into(), "password".into(), false.into()],
        ))
        .await
        .unwrap();
    }
    let ledger = Ledger::builder().database(db.clone()).build();
    (ledger, db, path)
}

fn alice() -> Caller {
    Caller::new("alice", false)
}

fn bob() -> Caller {
    Caller::new("bob", false)
}

fn root() -> Caller {
    Caller::new("root", true)
}

#[tokio::test]
async fn new_account_starts_at_zero() {
    let (ledger, _db) = ledger_with_db().await;

    let account = ledger.create_account(&alice(), "Main").await.unwrap();
    assert_eq!(account.balance_minor, 0);
    assert_eq!(ledger.balance(&alice(), account.id).await.unwrap(), 0);
    assert!(
        ledger
            .mutation_history(&alice(), account.id)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn top_up_credits_and_logs() {
    let (ledger, _db) = ledger_with_db().await;
    let account = ledger.create_account(&alice(), "Main").await.unwrap();

    assert_eq!(ledger.top_up(account.id, 100).await.unwrap(), 100);
    assert_eq!(ledger.top_up(account.id, 50).await.unwrap(), 150);

    let history = ledger.mutation_history(&alice(), account.id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].delta_minor, 100);
    assert_eq!(history[0].kind, MutationKind::TopUp);
    assert_eq!(history[0].transfer_id, None);
    assert_eq!(history[1].delta_minor, 50);
}

#[tokio::test]
async fn top_up_rejects_bad_input() {
    let (ledger, _db) = ledger_with_db().await;
    let account = ledger.create_account(&alice(), "Main").await.unwrap();

    assert!(matches!(
        ledger.top_up(account.id, 0).await,
        Err(LedgerError::InvalidAmount(_))
    ));
    assert!(matches!(
        ledger.top_up(account.id, -10).await,
        Err(LedgerError::InvalidAmount(_))
    ));
    assert!(matches!(
        ledger.top_up(Uuid::new_v4(), 10).await,
        Err(LedgerError::NotFound(_))
    ));
    assert_eq!(ledger.balance(&alice(), account.id).await.unwrap(), 0);
}

#[tokio::test]
async fn transfer_moves_money_and_links_entries() {
    let (ledger, _db) = ledger_with_db().await;
    let source = ledger.create_account(&alice(), "Main").await.unwrap();
    let dest = ledger.create_account(&bob(), "Savings").await.unwrap();
    ledger.top_up(source.id, 100).await.unwrap();

    let outcome = ledger
        .transfer(&alice(), source.id, dest.id, 40)
        .await
        .unwrap();
    assert_eq!(outcome.source_balance_minor, 60);
    assert_eq!(outcome.dest_balance_minor, 40);

    let source_history = ledger.mutation_history(&alice(), source.id).await.unwrap();
    let out = source_history.last().unwrap();
    assert_eq!(out.kind, MutationKind::TransferOut);
    assert_eq!(out.delta_minor, -40);
    assert_eq!(out.transfer_id, Some(outcome.transfer_id));

    let dest_history = ledger.mutation_history(&bob(), dest.id).await.unwrap();
    assert_eq!(dest_history.len(), 1);
    assert_eq!(dest_history[0].kind, MutationKind::TransferIn);
    assert_eq!(dest_history[0].delta_minor, 40);
    assert_eq!(dest_history[0].transfer_id, Some(outcome.transfer_id));
}

#[tokio::test]
async fn failed_transfer_leaves_no_trace() {
    let (ledger, _db) = ledger_with_db().await;
    let source = ledger.create_account(&alice(), "Main").await.unwrap();
    let dest = ledger.create_account(&alice(), "Savings").await.unwrap();
    ledger.top_up(source.id, 60).await.unwrap();

    let err = ledger
        .transfer(&alice(), source.id, dest.id, 1000)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientFunds(_)));

    assert_eq!(ledger.balance(&alice(), source.id).await.unwrap(), 60);
    assert_eq!(ledger.balance(&alice(), dest.id).await.unwrap(), 0);
    assert_eq!(
        ledger
            .mutation_history(&alice(), source.id)
            .await
            .unwrap()
            .len(),
        1
    );
    assert!(
        ledger
            .mutation_history(&alice(), dest.id)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn transfer_validates_input() {
    let (ledger, _db) = ledger_with_db().await;
    let source = ledger.create_account(&alice(), "Main").await.unwrap();
    let dest = ledger.create_account(&alice(), "Savings").await.unwrap();
    ledger.top_up(source.id, 100).await.unwrap();

    assert_eq!(
        ledger.transfer(&alice(), source.id, source.id, 10).await,
        Err(LedgerError::SameAccount)
    );
    assert!(matches!(
        ledger.transfer(&alice(), source.id, dest.id, 0).await,
        Err(LedgerError::InvalidAmount(_))
    ));
    assert!(matches!(
        ledger
            .transfer(&alice(), Uuid::new_v4(), dest.id, 10)
            .await,
        Err(LedgerError::NotFound(_))
    ));
    assert!(matches!(
        ledger
            .transfer(&alice(), source.id, Uuid::new_v4(), 10)
            .await,
        Err(LedgerError::NotFound(_))
    ));
    assert_eq!(ledger.balance(&alice(), source.id).await.unwrap(), 100);
}

#[tokio::test]
async fn transfer_requires_source_ownership() {
    let (ledger, _db) = ledger_with_db().await;
    let source = ledger.create_account(&alice(), "Main").await.unwrap();
    let dest = ledger.create_account(&bob(), "Savings").await.unwrap();
    ledger.top_up(source.id, 100).await.unwrap();

    let err = ledger
        .transfer(&bob(), source.id, dest.id, 10)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Forbidden(_)));

    // The administrative capability reads everything but moves nothing.
    let err = ledger
        .transfer(&root(), source.id, dest.id, 10)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Forbidden(_)));
    assert_eq!(ledger.balance(&alice(), source.id).await.unwrap(), 100);
}

#[tokio::test]
async fn repeated_transfers_drain_whole_multiples() {
    let (ledger, _db) = ledger_with_db().await;
    let source = ledger.create_account(&alice(), "Main").await.unwrap();
    let dest = ledger.create_account(&alice(), "Savings").await.unwrap();
    ledger.top_up(source.id, 100).await.unwrap();

    let mut succeeded = 0;
    for _ in 0..5 {
        match ledger.transfer(&alice(), source.id, dest.id, 40).await {
            Ok(_) => succeeded += 1,
            Err(LedgerError::InsufficientFunds(_)) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(succeeded, 2);
    assert_eq!(ledger.balance(&alice(), source.id).await.unwrap(), 20);
    assert_eq!(ledger.balance(&alice(), dest.id).await.unwrap(), 80);
}

#[tokio::test(flavor = "multi_thread")]
async fn simultaneous_transfers_drain_whole_multiples() {
    let (ledger, db, path) = ledger_with_file_db().await;
    let ledger = std::sync::Arc::new(ledger);
    let source = ledger.create_account(&alice(), "Main").await.unwrap().id;
    let dest = ledger.create_account(&bob(), "Savings").await.unwrap().id;
    ledger.top_up(source, 100).await.unwrap();

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..5 {
        let ledger = ledger.clone();
        tasks.spawn(async move { ledger.transfer(&alice(), source, dest, 40).await });
    }

    let mut succeeded = 0;
    let mut insufficient = 0;
    while let Some(result) = tasks.join_next().await {
        match result.unwrap() {
            Ok(_) => succeeded += 1,
            Err(LedgerError::InsufficientFunds(_)) => insufficient += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(succeeded, 2);
    assert_eq!(insufficient, 3);
    assert_eq!(ledger.balance(&alice(), source).await.unwrap(), 20);
    assert_eq!(ledger.balance(&bob(), dest).await.unwrap(), 80);

    // No reader ever saw red ink, and the log accounts for every move.
    for (caller, account_id) in [(alice(), source), (bob(), dest)] {
        let history = ledger.mutation_history(&caller, account_id).await.unwrap();
        let sum: i64 = history.iter().map(|entry| entry.delta_minor).sum();
        assert_eq!(sum, ledger.balance(&caller, account_id).await.unwrap());
        assert!(sum >= 0);
    }

    drop(ledger);
    drop(db);
    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn mutation_log_reconciles_with_balances() {
    let (ledger, _db) = ledger_with_db().await;
    let a = ledger.create_account(&alice(), "Main").await.unwrap();
    let b = ledger.create_account(&bob(), "Savings").await.unwrap();
    ledger.top_up(a.id, 500).await.unwrap();
    ledger.top_up(b.id, 70).await.unwrap();
    ledger.transfer(&alice(), a.id, b.id, 130).await.unwrap();
    ledger.transfer(&bob(), b.id, a.id, 25).await.unwrap();

    for account_id in [a.id, b.id] {
        let history = ledger.mutation_history(&root(), account_id).await.unwrap();
        let sum: i64 = history.iter().map(|entry| entry.delta_minor).sum();
        assert_eq!(sum, ledger.balance(&root(), account_id).await.unwrap());
    }
}

#[tokio::test]
async fn reads_are_owner_or_admin_only() {
    let (ledger, _db) = ledger_with_db().await;
    let account = ledger.create_account(&alice(), "Main").await.unwrap();

    assert!(matches!(
        ledger.balance(&bob(), account.id).await,
        Err(LedgerError::Forbidden(_))
    ));
    assert!(matches!(
        ledger.mutation_history(&bob(), account.id).await,
        Err(LedgerError::Forbidden(_))
    ));
    assert!(matches!(
        ledger.account(&bob(), account.id).await,
        Err(LedgerError::Forbidden(_))
    ));

    assert_eq!(ledger.balance(&root(), account.id).await.unwrap(), 0);
    assert!(ledger.account(&root(), account.id).await.is_ok());
}

#[tokio::test]
async fn account_directory_round_trip() {
    let (ledger, _db) = ledger_with_db().await;
    let account = ledger.create_account(&alice(), "Main").await.unwrap();
    ledger.create_account(&bob(), "Other").await.unwrap();

    let mine = ledger.my_accounts(&alice()).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, account.id);

    let renamed = ledger
        .update_account(&alice(), account.id, "Salary")
        .await
        .unwrap();
    assert_eq!(renamed.name, "Salary");
    assert_eq!(renamed.balance_minor, 0);
    assert!(matches!(
        ledger.update_account(&bob(), account.id, "Stolen").await,
        Err(LedgerError::Forbidden(_))
    ));

    assert!(matches!(
        ledger.list_accounts(&alice()).await,
        Err(LedgerError::Forbidden(_))
    ));
    assert_eq!(ledger.list_accounts(&root()).await.unwrap().len(), 2);
}

#[tokio::test]
async fn delete_requires_zero_balance() {
    let (ledger, _db) = ledger_with_db().await;
    let account = ledger.create_account(&alice(), "Main").await.unwrap();
    let sink = ledger.create_account(&alice(), "Savings").await.unwrap();
    ledger.top_up(account.id, 30).await.unwrap();

    assert!(matches!(
        ledger.delete_account(&alice(), account.id).await,
        Err(LedgerError::Conflict(_))
    ));

    ledger
        .transfer(&alice(), account.id, sink.id, 30)
        .await
        .unwrap();
    ledger.delete_account(&alice(), account.id).await.unwrap();
    assert!(matches!(
        ledger.account(&alice(), account.id).await,
        Err(LedgerError::NotFound(_))
    ));
}

#[tokio::test]
async fn category_names_unique_per_owner() {
    let (ledger, _db) = ledger_with_db().await;

    let groceries = ledger.create_category(&alice(), "Groceries").await.unwrap();
    assert_eq!(
        ledger.create_category(&alice(), "Groceries").await,
        Err(LedgerError::ExistingKey("Groceries".to_string()))
    );
    // Different owners may reuse the name.
    ledger.create_category(&bob(), "Groceries").await.unwrap();

    let rent = ledger.create_category(&alice(), "Rent").await.unwrap();
    assert!(matches!(
        ledger.update_category(&alice(), rent.id, "Groceries").await,
        Err(LedgerError::ExistingKey(_))
    ));
    let renamed = ledger
        .update_category(&alice(), rent.id, "Housing")
        .await
        .unwrap();
    assert_eq!(renamed.name, "Housing");

    assert!(matches!(
        ledger.category(&bob(), groceries.id).await,
        Err(LedgerError::Forbidden(_))
    ));
    assert!(ledger.category(&root(), groceries.id).await.is_ok());
    assert_eq!(ledger.my_categories(&alice()).await.unwrap().len(), 2);

    ledger.delete_category(&alice(), groceries.id).await.unwrap();
    assert!(matches!(
        ledger.category(&alice(), groceries.id).await,
        Err(LedgerError::NotFound(_))
    ));
}

#[tokio::test]
async fn transactions_record_without_moving_money() {
    let (ledger, _db) = ledger_with_db().await;
    let account = ledger.create_account(&alice(), "Main").await.unwrap();
    let category = ledger.create_category(&alice(), "Groceries").await.unwrap();
    ledger.top_up(account.id, 100).await.unwrap();

    let transaction = ledger
        .new_transaction(
            &alice(),
            account.id,
            category.id,
            -1250,
            Some("market".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(transaction.amount_minor, -1250);

    // Bookkeeping rows never touch the ledger balance.
    assert_eq!(ledger.balance(&alice(), account.id).await.unwrap(), 100);
    assert_eq!(
        ledger
            .mutation_history(&alice(), account.id)
            .await
            .unwrap()
            .len(),
        1
    );

    assert!(matches!(
        ledger
            .new_transaction(&bob(), account.id, category.id, 10, None)
            .await,
        Err(LedgerError::Forbidden(_))
    ));
    assert!(matches!(
        ledger
            .new_transaction(&alice(), account.id, Uuid::new_v4(), 10, None)
            .await,
        Err(LedgerError::NotFound(_))
    ));

    let mine = ledger.list_transactions(&alice()).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, transaction.id);
    assert!(ledger.list_transactions(&bob()).await.unwrap().is_empty());
    assert_eq!(ledger.list_transactions(&root()).await.unwrap().len(), 1);
}
