use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::transaction::{Transaction, TransactionId};

/// The kind of mutation a pending operation will replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Add,
    Update,
    Delete,
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationKind::Add => write!(f, "add"),
            OperationKind::Update => write!(f, "update"),
            OperationKind::Delete => write!(f, "delete"),
        }
    }
}

/// A mutation that was applied locally but not yet confirmed by the server.
///
/// At most one entry exists per transaction id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingOperation {
    pub kind: OperationKind,

    pub transaction_id: TransactionId,

    /// The payload to replay. `None` only for degenerate entries, which are skipped on replay.
    #[serde(default)]
    pub transaction: Option<Transaction>,

    /// Balance change already applied to the local account for this operation.
    pub balance_delta: Decimal,

    /// Part of `balance_delta` that already reached the server's account.
    #[serde(default)]
    pub pushed_delta: Decimal,
}

impl PendingOperation {
    pub fn new(kind: OperationKind, transaction: Transaction, balance_delta: Decimal) -> Self {
        Self {
            kind,
            transaction_id: transaction.id,
            transaction: Some(transaction),
            balance_delta,
            pushed_delta: Decimal::ZERO,
        }
    }

    /// Delta that still has to be pushed to the server once the operation replays.
    #[must_use]
    pub fn unpushed_delta(&self) -> Decimal {
        self.balance_delta - self.pushed_delta
    }
}
