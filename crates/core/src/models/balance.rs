use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bucket granularity of a projected balance series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BucketSize {
    Day,
    Month,
}

/// Point-in-time balances produced by walking backward from a known current balance.
///
/// Each bucket maps its start date to the balance at the END of that bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSeries {
    pub bucket: BucketSize,

    /// Bucket start date → closing balance for that bucket.
    pub points: BTreeMap<NaiveDate, Decimal>,

    /// Balance just before the first bucket opened.
    pub opening_balance: Decimal,
}

impl BalanceSeries {
    /// Earliest bucket and its balance.
    #[must_use]
    pub fn first(&self) -> Option<(NaiveDate, Decimal)> {
        self.points.iter().next().map(|(d, b)| (*d, *b))
    }

    /// Latest bucket and its balance (equals the current balance).
    #[must_use]
    pub fn last(&self) -> Option<(NaiveDate, Decimal)> {
        self.points.iter().next_back().map(|(d, b)| (*d, *b))
    }

    #[must_use]
    pub fn get(&self, date: NaiveDate) -> Option<Decimal> {
        self.points.get(&date).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
