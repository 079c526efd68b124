use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::errors::CoreError;
use crate::models::account::{Account, AccountId};
use crate::models::category::{Category, CategoryId};
use crate::models::pending::PendingOperation;
use crate::models::transaction::{Transaction, TransactionId};

use super::traits::{PendingLog, TransactionMirror};

/// Volatile mirror. Also the serialized payload of [`super::file::FileMirror`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryMirror {
    transactions: BTreeMap<TransactionId, Transaction>,
    accounts: BTreeMap<AccountId, Account>,
    categories: BTreeMap<CategoryId, Category>,
}

impl MemoryMirror {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    fn record_snapshots(&mut self, transaction: &Transaction) {
        // The embedded account balance is a snapshot; never let it overwrite a known account.
        self.accounts
            .entry(transaction.account.id)
            .or_insert_with(|| transaction.account.clone());
        self.categories
            .insert(transaction.category.id, transaction.category.clone());
    }
}

impl TransactionMirror for MemoryMirror {
    fn load(&self) -> Result<Vec<Transaction>, CoreError> {
        let mut all: Vec<Transaction> = self.transactions.values().cloned().collect();
        all.sort_by(|a, b| b.transaction_date.cmp(&a.transaction_date));
        Ok(all)
    }

    fn get(&self, id: TransactionId) -> Result<Transaction, CoreError> {
        self.transactions
            .get(&id)
            .cloned()
            .ok_or(CoreError::StorageNotFound(id))
    }

    fn add(&mut self, transaction: Transaction) -> Result<(), CoreError> {
        if self.transactions.contains_key(&transaction.id) {
            return Err(CoreError::StorageDuplicate(transaction.id));
        }
        self.record_snapshots(&transaction);
        self.transactions.insert(transaction.id, transaction);
        Ok(())
    }

    fn update(&mut self, transaction: Transaction) -> Result<(), CoreError> {
        if !self.transactions.contains_key(&transaction.id) {
            return Err(CoreError::StorageNotFound(transaction.id));
        }
        self.record_snapshots(&transaction);
        self.transactions.insert(transaction.id, transaction);
        Ok(())
    }

    fn remove(&mut self, id: TransactionId) -> Result<(), CoreError> {
        self.transactions
            .remove(&id)
            .map(|_| ())
            .ok_or(CoreError::StorageNotFound(id))
    }

    fn account(&self, id: AccountId) -> Result<Option<Account>, CoreError> {
        Ok(self.accounts.get(&id).cloned())
    }

    fn upsert_account(&mut self, account: Account) -> Result<(), CoreError> {
        self.accounts.insert(account.id, account);
        Ok(())
    }

    fn categories(&self) -> Result<Vec<Category>, CoreError> {
        let mut all: Vec<Category> = self.categories.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    fn upsert_categories(&mut self, categories: &[Category]) -> Result<(), CoreError> {
        for category in categories {
            self.categories.insert(category.id, category.clone());
        }
        Ok(())
    }
}

/// Volatile pending-operation log. Also the serialized payload of [`super::file::FilePendingLog`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryPendingLog {
    operations: Vec<PendingOperation>,
}

impl MemoryPendingLog {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl PendingLog for MemoryPendingLog {
    fn load(&self) -> Result<Vec<PendingOperation>, CoreError> {
        Ok(self.operations.clone())
    }

    fn put(&mut self, operation: PendingOperation) -> Result<(), CoreError> {
        match self
            .operations
            .iter_mut()
            .find(|op| op.transaction_id == operation.transaction_id)
        {
            Some(existing) => *existing = operation,
            None => self.operations.push(operation),
        }
        Ok(())
    }

    fn remove(&mut self, id: TransactionId) -> Result<(), CoreError> {
        self.operations.retain(|op| op.transaction_id != id);
        Ok(())
    }

    fn remove_many(&mut self, ids: &[TransactionId]) -> Result<(), CoreError> {
        let ids: HashSet<TransactionId> = ids.iter().copied().collect();
        self.operations.retain(|op| !ids.contains(&op.transaction_id));
        Ok(())
    }

    fn clear(&mut self) -> Result<(), CoreError> {
        self.operations.clear();
        Ok(())
    }

    fn get(&self, id: TransactionId) -> Result<Option<PendingOperation>, CoreError> {
        Ok(self
            .operations
            .iter()
            .find(|op| op.transaction_id == id)
            .cloned())
    }
}
