use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::account::{self, Account, AccountId, DEFAULT_ACCOUNT_NAME};
use crate::models::category::CategoryId;
use crate::models::transaction::Transaction;

/// Body for creating or updating a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub account_id: AccountId,
    pub category_id: CategoryId,
    /// Decimal string, e.g. `"500.00"`.
    pub amount: String,
    #[serde(with = "crate::models::timestamp")]
    pub transaction_date: DateTime<Utc>,
    pub comment: Option<String>,
}

impl From<&Transaction> for TransactionRequest {
    fn from(t: &Transaction) -> Self {
        Self {
            account_id: t.account.id,
            category_id: t.category.id,
            amount: t.amount.to_string(),
            transaction_date: t.transaction_date,
            comment: t.comment.clone(),
        }
    }
}

/// Body for `PUT accounts/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountUpdateRequest {
    pub name: String,
    pub balance: String,
    pub currency: String,
}

impl From<&Account> for AccountUpdateRequest {
    fn from(a: &Account) -> Self {
        let name = if a.name.trim().is_empty() {
            DEFAULT_ACCOUNT_NAME.to_string()
        } else {
            a.name.clone()
        };
        Self {
            name,
            balance: a.balance.to_string(),
            currency: account::currency_code(&a.currency),
        }
    }
}

