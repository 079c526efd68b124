use crate::errors::CoreError;
use crate::models::account::{Account, AccountId};
use crate::models::category::Category;
use crate::models::pending::PendingOperation;
use crate::models::transaction::{Transaction, TransactionId};

/// Durable on-device copy of server state, keyed by transaction id.
///
/// No network access. Writing a transaction also records its embedded
/// account (if not yet known) and category, so reads stay self-contained.
pub trait TransactionMirror: Send {
    /// All cached transactions, most recent `transaction_date` first.
    fn load(&self) -> Result<Vec<Transaction>, CoreError>;

    /// Fails with `StorageNotFound` if `id` is absent.
    fn get(&self, id: TransactionId) -> Result<Transaction, CoreError>;

    /// Fails with `StorageDuplicate` if the id is already present.
    fn add(&mut self, transaction: Transaction) -> Result<(), CoreError>;

    /// Fails with `StorageNotFound` if the id is absent.
    fn update(&mut self, transaction: Transaction) -> Result<(), CoreError>;

    /// Fails with `StorageNotFound` if `id` is absent.
    fn remove(&mut self, id: TransactionId) -> Result<(), CoreError>;

    fn account(&self, id: AccountId) -> Result<Option<Account>, CoreError>;

    /// Insert or replace the cached account.
    fn upsert_account(&mut self, account: Account) -> Result<(), CoreError>;

    /// Cached categories sorted by name.
    fn categories(&self) -> Result<Vec<Category>, CoreError>;

    /// Insert or replace categories by id.
    fn upsert_categories(&mut self, categories: &[Category]) -> Result<(), CoreError>;
}

/// Durable queue of mutations the server has not confirmed yet.
///
/// Holds at most one entry per transaction id and preserves first-insertion order.
pub trait PendingLog: Send {
    /// All entries in insertion order.
    fn load(&self) -> Result<Vec<PendingOperation>, CoreError>;

    /// Insert, or replace the existing entry for the same transaction id in place.
    fn put(&mut self, operation: PendingOperation) -> Result<(), CoreError>;

    /// Removing an absent id is not an error.
    fn remove(&mut self, id: TransactionId) -> Result<(), CoreError>;

    fn remove_many(&mut self, ids: &[TransactionId]) -> Result<(), CoreError>;

    fn clear(&mut self) -> Result<(), CoreError>;

    fn get(&self, id: TransactionId) -> Result<Option<PendingOperation>, CoreError>;
}
