//! Account ledger core.
//!
//! The [`Ledger`] orchestrates balance operations (top-up, transfer, reads)
//! against the balance store and the append-only mutation log, and owns the
//! account directory and the transaction-category catalog. It has no HTTP
//! knowledge: every operation takes a verified [`Caller`] as an explicit
//! parameter.

pub use accounts::Account;
pub use categories::Category;
pub use error::LedgerError;
pub use mutations::{MutationEntry, MutationKind};
use sea_orm::{
    ActiveValue, ColumnTrait, DatabaseConnection, DatabaseTransaction, QueryFilter, QueryOrder,
    TransactionTrait, prelude::*,
};
pub use transactions::Transaction;
pub use transfers::{Transfer, TransferOutcome};
use uuid::Uuid;

pub mod accounts;
pub mod categories;
mod error;
pub mod mutations;
mod store;
pub mod transactions;
pub mod transfers;

type ResultLedger<T> = Result<T, LedgerError>;

/// A verified identity, as produced by the auth layer.
///
/// `admin` grants the administrative capability: listing everything and
/// reading foreign accounts. It never grants the right to move money out of
/// a foreign account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Caller {
    pub user_id: String,
    pub admin: bool,
}

impl Caller {
    pub fn new(user_id: impl Into<String>, admin: bool) -> Self {
        Self {
            user_id: user_id.into(),
            admin,
        }
    }

    fn can_read(&self, account: &Account) -> bool {
        self.admin || account.owner == self.user_id
    }
}

#[derive(Debug)]
pub struct Ledger {
    database: DatabaseConnection,
}

impl Ledger {
    /// Return a builder for `Ledger`. Help to build the struct.
    pub fn builder() -> LedgerBuilder {
        LedgerBuilder::default()
    }

    async fn find_account(&self, account_id: Uuid) -> ResultLedger<Account> {
        let model = accounts::Entity::find_by_id(account_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| LedgerError::NotFound("account not exists".to_string()))?;
        Account::try_from(model)
    }

    fn readable_account(&self, caller: &Caller, account: Account) -> ResultLedger<Account> {
        if !caller.can_read(&account) {
            return Err(LedgerError::Forbidden(
                "caller does not own the account".to_string(),
            ));
        }
        Ok(account)
    }

    /// Credits an account.
    ///
    /// Appends one `top_up` mutation entry in the same database transaction
    /// as the balance adjustment. Transient `Conflict` failures are retried
    /// up to the store's attempt budget before surfacing.
    pub async fn top_up(&self, account_id: Uuid, amount_minor: i64) -> ResultLedger<i64> {
        if amount_minor <= 0 {
            return Err(LedgerError::InvalidAmount(
                "amount_minor must be > 0".to_string(),
            ));
        }

        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.top_up_once(account_id, amount_minor).await {
                Err(LedgerError::Conflict(_)) if attempts < store::MAX_ADJUST_ATTEMPTS => continue,
                other => return other,
            }
        }
    }

    async fn top_up_once(&self, account_id: Uuid, amount_minor: i64) -> ResultLedger<i64> {
        let db_tx = self.database.begin().await?;

        let new_balance = store::adjust_balance(&db_tx, account_id, amount_minor).await?;
        let entry = MutationEntry::new(account_id, amount_minor, MutationKind::TopUp, None);
        mutations::ActiveModel::from(&entry).insert(&db_tx).await?;

        db_tx.commit().await?;
        Ok(new_balance)
    }

    /// Moves money between two accounts.
    ///
    /// The caller must own the source account. Both balance adjustments, the
    /// transfer row and the two linked mutation entries commit in one
    /// database transaction; a failure on either side rolls everything back.
    pub async fn transfer(
        &self,
        caller: &Caller,
        source_id: Uuid,
        dest_id: Uuid,
        amount_minor: i64,
    ) -> ResultLedger<TransferOutcome> {
        if source_id == dest_id {
            return Err(LedgerError::SameAccount);
        }
        if amount_minor <= 0 {
            return Err(LedgerError::InvalidAmount(
                "amount_minor must be > 0".to_string(),
            ));
        }

        let source = self.find_account(source_id).await?;
        if source.owner != caller.user_id {
            return Err(LedgerError::Forbidden(
                "caller does not own the source account".to_string(),
            ));
        }

        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.transfer_once(source_id, dest_id, amount_minor).await {
                Err(LedgerError::Conflict(_)) if attempts < store::MAX_ADJUST_ATTEMPTS => continue,
                other => return other,
            }
        }
    }

    async fn transfer_once(
        &self,
        source_id: Uuid,
        dest_id: Uuid,
        amount_minor: i64,
    ) -> ResultLedger<TransferOutcome> {
        let db_tx = self.database.begin().await?;

        // Deterministic ordering: adjust the lower account id first so two
        // opposite-direction transfers between the same pair cannot deadlock.
        let (source_balance, dest_balance) = if source_id < dest_id {
            let source_balance = store::adjust_balance(&db_tx, source_id, -amount_minor).await?;
            let dest_balance = store::adjust_balance(&db_tx, dest_id, amount_minor).await?;
            (source_balance, dest_balance)
        } else {
            let dest_balance = store::adjust_balance(&db_tx, dest_id, amount_minor).await?;
            let source_balance = store::adjust_balance(&db_tx, source_id, -amount_minor).await?;
            (source_balance, dest_balance)
        };

        let transfer = Transfer::new(source_id, dest_id, amount_minor);
        transfers::ActiveModel::from(&transfer).insert(&db_tx).await?;
        self.append_transfer_entries(&db_tx, &transfer).await?;

        db_tx.commit().await?;

        Ok(TransferOutcome {
            transfer_id: transfer.id,
            source_balance_minor: source_balance,
            dest_balance_minor: dest_balance,
        })
    }

    async fn append_transfer_entries(
        &self,
        db_tx: &DatabaseTransaction,
        transfer: &Transfer,
    ) -> ResultLedger<()> {
        let entries = [
            MutationEntry::new(
                transfer.source_id,
                -transfer.amount_minor,
                MutationKind::TransferOut,
                Some(transfer.id),
            ),
            MutationEntry::new(
                transfer.dest_id,
                transfer.amount_minor,
                MutationKind::TransferIn,
                Some(transfer.id),
            ),
        ];
        for entry in &entries {
            mutations::ActiveModel::from(entry).insert(db_tx).await?;
        }
        Ok(())
    }

    /// Current balance of an account; owner or admin only.
    pub async fn balance(&self, caller: &Caller, account_id: Uuid) -> ResultLedger<i64> {
        let account = self.find_account(account_id).await?;
        self.readable_account(caller, account)?;
        store::get_balance(&self.database, account_id).await
    }

    /// Mutation log entries of an account, ordered by creation time.
    ///
    /// Same ownership rule as [`balance`].
    ///
    /// [`balance`]: Ledger::balance
    pub async fn mutation_history(
        &self,
        caller: &Caller,
        account_id: Uuid,
    ) -> ResultLedger<Vec<MutationEntry>> {
        let account = self.find_account(account_id).await?;
        self.readable_account(caller, account)?;

        let models = mutations::Entity::find()
            .filter(mutations::Column::AccountId.eq(account_id.to_string()))
            .order_by_asc(mutations::Column::CreatedAt)
            .order_by_asc(mutations::Column::Id)
            .all(&self.database)
            .await?;

        models.into_iter().map(MutationEntry::try_from).collect()
    }

    /// All accounts owned by the caller.
    pub async fn my_accounts(&self, caller: &Caller) -> ResultLedger<Vec<Account>> {
        let models = accounts::Entity::find()
            .filter(accounts::Column::Owner.eq(&caller.user_id))
            .order_by_asc(accounts::Column::CreatedAt)
            .all(&self.database)
            .await?;

        models.into_iter().map(Account::try_from).collect()
    }

    /// Add a new account owned by the caller. The balance starts at zero.
    pub async fn create_account(&self, caller: &Caller, name: &str) -> ResultLedger<Account> {
        let account = Account::new(caller.user_id.clone(), name.to_string());
        accounts::ActiveModel::from(&account)
            .insert(&self.database)
            .await?;
        Ok(account)
    }

    /// Return an account; owner or admin only.
    pub async fn account(&self, caller: &Caller, account_id: Uuid) -> ResultLedger<Account> {
        let account = self.find_account(account_id).await?;
        self.readable_account(caller, account)
    }

    /// Update the profile fields of an account. Never touches the balance.
    pub async fn update_account(
        &self,
        caller: &Caller,
        account_id: Uuid,
        name: &str,
    ) -> ResultLedger<Account> {
        let mut account = self.find_account(account_id).await?;
        if account.owner != caller.user_id {
            return Err(LedgerError::Forbidden(
                "caller does not own the account".to_string(),
            ));
        }

        let active = accounts::ActiveModel {
            id: ActiveValue::Set(account_id.to_string()),
            name: ActiveValue::Set(name.to_string()),
            ..Default::default()
        };
        active.update(&self.database).await?;

        account.name = name.to_string();
        Ok(account)
    }

    /// Delete an account.
    ///
    /// Rejected with `Conflict` while the balance is nonzero, so funds
    /// cannot be dropped by accident. Mutation log entries are kept for
    /// audit.
    pub async fn delete_account(&self, caller: &Caller, account_id: Uuid) -> ResultLedger<()> {
        let account = self.find_account(account_id).await?;
        if account.owner != caller.user_id {
            return Err(LedgerError::Forbidden(
                "caller does not own the account".to_string(),
            ));
        }
        if account.balance_minor != 0 {
            return Err(LedgerError::Conflict(
                "account balance must be zero before deletion".to_string(),
            ));
        }

        accounts::Entity::delete_by_id(account_id.to_string())
            .exec(&self.database)
            .await?;
        Ok(())
    }

    /// All accounts; administrative.
    pub async fn list_accounts(&self, caller: &Caller) -> ResultLedger<Vec<Account>> {
        if !caller.admin {
            return Err(LedgerError::Forbidden(
                "account listing requires the administrative capability".to_string(),
            ));
        }

        let models = accounts::Entity::find()
            .order_by_asc(accounts::Column::CreatedAt)
            .all(&self.database)
            .await?;

        models.into_iter().map(Account::try_from).collect()
    }

    async fn find_category(&self, category_id: Uuid) -> ResultLedger<Category> {
        let model = categories::Entity::find_by_id(category_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| LedgerError::NotFound("category not exists".to_string()))?;
        Category::try_from(model)
    }

    async fn category_name_taken(
        &self,
        owner: &str,
        name: &str,
        except: Option<Uuid>,
    ) -> ResultLedger<bool> {
        let mut query = categories::Entity::find()
            .filter(categories::Column::Owner.eq(owner))
            .filter(categories::Column::Name.eq(name));
        if let Some(id) = except {
            query = query.filter(categories::Column::Id.ne(id.to_string()));
        }
        Ok(query.one(&self.database).await?.is_some())
    }

    /// Add a new transaction category for the caller.
    ///
    /// Category names are unique per owner.
    pub async fn create_category(&self, caller: &Caller, name: &str) -> ResultLedger<Category> {
        if self
            .category_name_taken(&caller.user_id, name, None)
            .await?
        {
            return Err(LedgerError::ExistingKey(name.to_string()));
        }

        let category = Category::new(caller.user_id.clone(), name.to_string());
        categories::ActiveModel::from(&category)
            .insert(&self.database)
            .await?;
        Ok(category)
    }

    /// Return a category; owner or admin only.
    pub async fn category(&self, caller: &Caller, category_id: Uuid) -> ResultLedger<Category> {
        let category = self.find_category(category_id).await?;
        if !caller.admin && category.owner != caller.user_id {
            return Err(LedgerError::Forbidden(
                "caller does not own the category".to_string(),
            ));
        }
        Ok(category)
    }

    /// Rename a category, keeping names unique per owner.
    pub async fn update_category(
        &self,
        caller: &Caller,
        category_id: Uuid,
        name: &str,
    ) -> ResultLedger<Category> {
        let mut category = self.find_category(category_id).await?;
        if category.owner != caller.user_id {
            return Err(LedgerError::Forbidden(
                "caller does not own the category".to_string(),
            ));
        }
        if self
            .category_name_taken(&caller.user_id, name, Some(category_id))
            .await?
        {
            return Err(LedgerError::ExistingKey(name.to_string()));
        }

        let active = categories::ActiveModel {
            id: ActiveValue::Set(category_id.to_string()),
            name: ActiveValue::Set(name.to_string()),
            ..Default::default()
        };
        active.update(&self.database).await?;

        category.name = name.to_string();
        Ok(category)
    }

    /// Delete a category owned by the caller.
    pub async fn delete_category(&self, caller: &Caller, category_id: Uuid) -> ResultLedger<()> {
        let category = self.find_category(category_id).await?;
        if category.owner != caller.user_id {
            return Err(LedgerError::Forbidden(
                "caller does not own the category".to_string(),
            ));
        }

        categories::Entity::delete_by_id(category_id.to_string())
            .exec(&self.database)
            .await?;
        Ok(())
    }

    /// All categories; administrative.
    pub async fn list_categories(&self, caller: &Caller) -> ResultLedger<Vec<Category>> {
        if !caller.admin {
            return Err(LedgerError::Forbidden(
                "category listing requires the administrative capability".to_string(),
            ));
        }

        let models = categories::Entity::find()
            .order_by_asc(categories::Column::CreatedAt)
            .all(&self.database)
            .await?;

        models.into_iter().map(Category::try_from).collect()
    }

    /// Categories owned by the caller.
    pub async fn my_categories(&self, caller: &Caller) -> ResultLedger<Vec<Category>> {
        let models = categories::Entity::find()
            .filter(categories::Column::Owner.eq(&caller.user_id))
            .order_by_asc(categories::Column::CreatedAt)
            .all(&self.database)
            .await?;

        models.into_iter().map(Category::try_from).collect()
    }

    /// Record a categorized transaction on one of the caller's accounts.
    ///
    /// Bookkeeping only: the account balance is not changed.
    pub async fn new_transaction(
        &self,
        caller: &Caller,
        account_id: Uuid,
        category_id: Uuid,
        amount_minor: i64,
        note: Option<String>,
    ) -> ResultLedger<Transaction> {
        let account = self.find_account(account_id).await?;
        if account.owner != caller.user_id {
            return Err(LedgerError::Forbidden(
                "caller does not own the account".to_string(),
            ));
        }
        self.find_category(category_id).await?;

        let transaction = Transaction::new(account_id, category_id, amount_minor, note);
        transactions::ActiveModel::from(&transaction)
            .insert(&self.database)
            .await?;
        Ok(transaction)
    }

    /// Transactions recorded on the caller's accounts (admin: all).
    pub async fn list_transactions(&self, caller: &Caller) -> ResultLedger<Vec<Transaction>> {
        let mut query = transactions::Entity::find();

        if !caller.admin {
            let account_ids: Vec<String> = accounts::Entity::find()
                .filter(accounts::Column::Owner.eq(&caller.user_id))
                .all(&self.database)
                .await?
                .into_iter()
                .map(|model| model.id)
                .collect();
            query = query.filter(transactions::Column::AccountId.is_in(account_ids));
        }

        let models = query
            .order_by_asc(transactions::Column::CreatedAt)
            .all(&self.database)
            .await?;

        models.into_iter().map(Transaction::try_from).collect()
    }
}

/// The builder for `Ledger`
#[derive(Default)]
pub struct LedgerBuilder {
    database: DatabaseConnection,
}

impl LedgerBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> LedgerBuilder {
        self.database = db;
        self
    }

    /// Construct `Ledger`
    pub fn build(self) -> Ledger {
        Ledger {
            database: self.database,
        }
    }
}
