use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::CoreError;
use crate::models::account::{Account, AccountId};
use crate::models::category::Category;
use crate::models::transaction::{Transaction, TransactionId};

use super::dto::TransactionRequest;

/// Typed contract to the authoritative server.
///
/// Implementations must classify failures into `Unreachable`, `Rejected`,
/// `ServerError` or `ProtocolMismatch`; the reconciliation engine decides
/// between offline fallback and immediate failure based on that classification.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// Human-readable name of this gateway (for logs/errors).
    fn name(&self) -> &str;

    /// The user's account.
    async fn fetch_account(&self) -> Result<Account, CoreError>;

    /// Overwrite the account's editable fields (name, balance, currency).
    async fn update_account(&self, account: &Account) -> Result<Account, CoreError>;

    /// All transactions of `account_id` with a transaction date in `[from, to]`.
    async fn fetch_transactions(
        &self,
        account_id: AccountId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, CoreError>;

    async fn create_transaction(&self, payload: &TransactionRequest)
        -> Result<Transaction, CoreError>;

    async fn update_transaction(
        &self,
        id: TransactionId,
        payload: &TransactionRequest,
    ) -> Result<Transaction, CoreError>;

    async fn delete_transaction(&self, id: TransactionId) -> Result<(), CoreError>;

    async fn fetch_categories(&self) -> Result<Vec<Category>, CoreError>;

    async fn fetch_categories_by_direction(
        &self,
        is_income: bool,
    ) -> Result<Vec<Category>, CoreError>;
}
