use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::category::Category;

/// Ordering applied to a transaction history listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOption {
    /// Oldest first
    Date,
    /// Smallest amount first
    Amount,
    /// Keep the order the transactions were fetched in
    #[default]
    None,
}

/// Aggregated spending or income for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub category: Category,
    pub total: Decimal,
    /// Share of the overall total in percent (0 to 100), rounded to 2 decimal places.
    pub percentage: Decimal,
    pub transaction_count: usize,
}

/// Summary of one direction's transactions over a period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySummary {
    pub total: Decimal,
    pub breakdown: Vec<CategoryBreakdown>,
}
