use log::debug;
use std::path::{Path, PathBuf};

use crate::errors::CoreError;
use crate::models::account::{Account, AccountId};
use crate::models::category::Category;
use crate::models::pending::PendingOperation;
use crate::models::transaction::{Transaction, TransactionId};

use super::format;
use super::memory::{MemoryMirror, MemoryPendingLog};
use super::traits::{PendingLog, TransactionMirror};

/// File name of the mirror inside a data directory.
pub const MIRROR_FILE: &str = "mirror.json";

/// File name of the pending-operation log inside a data directory.
pub const PENDING_FILE: &str = "pending.json";

/// Mirror persisted as a JSON file.
///
/// Every mutation is applied to a copy, written to disk, and only then
/// committed in memory, so a failed write leaves both sides unchanged.
#[derive(Debug)]
pub struct FileMirror {
    path: PathBuf,
    inner: MemoryMirror,
}

impl FileMirror {
    /// Open (or lazily create) the mirror at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let path = path.into();
        let inner: MemoryMirror = format::load_file(&path)?;
        debug!("Opened mirror at {} ({} transactions)", path.display(), inner.len());
        Ok(Self { path, inner })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn commit(
        &mut self,
        change: impl FnOnce(&mut MemoryMirror) -> Result<(), CoreError>,
    ) -> Result<(), CoreError> {
        let mut next = self.inner.clone();
        change(&mut next)?;
        format::save_file(&self.path, &next)?;
        self.inner = next;
        Ok(())
    }
}

impl TransactionMirror for FileMirror {
    fn load(&self) -> Result<Vec<Transaction>, CoreError> {
        self.inner.load()
    }

    fn get(&self, id: TransactionId) -> Result<Transaction, CoreError> {
        self.inner.get(id)
    }

    fn add(&mut self, transaction: Transaction) -> Result<(), CoreError> {
        self.commit(|m| m.add(transaction))
    }

    fn update(&mut self, transaction: Transaction) -> Result<(), CoreError> {
        self.commit(|m| m.update(transaction))
    }

    fn remove(&mut self, id: TransactionId) -> Result<(), CoreError> {
        self.commit(|m| m.remove(id))
    }

    fn account(&self, id: AccountId) -> Result<Option<Account>, CoreError> {
        self.inner.account(id)
    }

    fn upsert_account(&mut self, account: Account) -> Result<(), CoreError> {
        self.commit(|m| m.upsert_account(account))
    }

    fn categories(&self) -> Result<Vec<Category>, CoreError> {
        self.inner.categories()
    }

    fn upsert_categories(&mut self, categories: &[Category]) -> Result<(), CoreError> {
        self.commit(|m| m.upsert_categories(categories))
    }
}

/// Pending-operation log persisted as a JSON file.
#[derive(Debug)]
pub struct FilePendingLog {
    path: PathBuf,
    inner: MemoryPendingLog,
}

impl FilePendingLog {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let path = path.into();
        let inner: MemoryPendingLog = format::load_file(&path)?;
        debug!("Opened pending log at {} ({} entries)", path.display(), inner.len());
        Ok(Self { path, inner })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn commit(
        &mut self,
        change: impl FnOnce(&mut MemoryPendingLog) -> Result<(), CoreError>,
    ) -> Result<(), CoreError> {
        let mut next = self.inner.clone();
        change(&mut next)?;
        format::save_file(&self.path, &next)?;
        self.inner = next;
        Ok(())
    }
}

impl PendingLog for FilePendingLog {
    fn load(&self) -> Result<Vec<PendingOperation>, CoreError> {
        self.inner.load()
    }

    fn put(&mut self, operation: PendingOperation) -> Result<(), CoreError> {
        self.commit(|l| l.put(operation))
    }

    fn remove(&mut self, id: TransactionId) -> Result<(), CoreError> {
        self.commit(|l| l.remove(id))
    }

    fn remove_many(&mut self, ids: &[TransactionId]) -> Result<(), CoreError> {
        self.commit(|l| l.remove_many(ids))
    }

    fn clear(&mut self) -> Result<(), CoreError> {
        self.commit(|l| l.clear())
    }

    fn get(&self, id: TransactionId) -> Result<Option<PendingOperation>, CoreError> {
        self.inner.get(id)
    }
}
