use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::account::Account;
use super::category::{Category, Direction};

/// Transaction identifier. Chosen by the client for not-yet-confirmed
/// transactions, assigned by the server once confirmed.
pub type TransactionId = i64;

/// A single income or expense entry.
///
/// `account` and `category` are snapshots taken when the transaction was
/// written, not live references, so a cached transaction is self-contained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    pub account: Account,
    pub category: Category,

    /// Always positive. The sign of the balance effect comes from the category direction.
    pub amount: Decimal,

    #[serde(with = "super::timestamp")]
    pub transaction_date: DateTime<Utc>,

    #[serde(default)]
    pub comment: Option<String>,

    #[serde(with = "super::timestamp")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "super::timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Build a new client-side transaction stamped with the current time.
    pub fn new(
        id: TransactionId,
        account: Account,
        category: Category,
        amount: Decimal,
        transaction_date: DateTime<Utc>,
        comment: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            account,
            category,
            amount,
            transaction_date,
            comment,
            created_at: now,
            updated_at: now,
        }
    }

    /// Signed effect on the owning account's balance:
    /// `+amount` for income categories, `-amount` otherwise.
    #[must_use]
    pub fn balance_effect(&self) -> Decimal {
        match self.category.direction() {
            Direction::Income => self.amount,
            Direction::Outcome => -self.amount,
        }
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        self.category.direction()
    }

    /// `true` if `transaction_date` lies within `[from, to]` (inclusive on both ends).
    #[must_use]
    pub fn is_within(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
        self.transaction_date >= from && self.transaction_date <= to
    }
}
