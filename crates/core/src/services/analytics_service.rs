use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::models::analytics::{CategoryBreakdown, HistorySummary, SortOption};
use crate::models::category::{Category, CategoryId, Direction};
use crate::models::transaction::Transaction;

/// Summaries behind the history and analysis screens: per-direction
/// filtering, ordering, totals and per-category shares.
///
/// Pure business logic, no I/O.
pub struct AnalyticsService;

impl AnalyticsService {
    pub fn new() -> Self {
        Self
    }

    /// Keep only transactions flowing in `direction`, preserving order.
    #[must_use]
    pub fn filter_by_direction(
        &self,
        transactions: &[Transaction],
        direction: Direction,
    ) -> Vec<Transaction> {
        transactions
            .iter()
            .filter(|t| t.direction() == direction)
            .cloned()
            .collect()
    }

    /// Order a listing. `SortOption::None` leaves the input order untouched.
    /// Sorting is stable, so ties keep their fetched order.
    #[must_use]
    pub fn sort(&self, transactions: &[Transaction], option: SortOption) -> Vec<Transaction> {
        let mut sorted = transactions.to_vec();
        match option {
            SortOption::Date => sorted.sort_by(|a, b| a.transaction_date.cmp(&b.transaction_date)),
            SortOption::Amount => sorted.sort_by(|a, b| a.amount.cmp(&b.amount)),
            SortOption::None => {}
        }
        sorted
    }

    /// Sum of amounts (unsigned).
    #[must_use]
    pub fn total_amount(&self, transactions: &[Transaction]) -> Decimal {
        transactions.iter().map(|t| t.amount).sum()
    }

    /// Per-category totals, largest first (ties by category name).
    #[must_use]
    pub fn category_breakdown(&self, transactions: &[Transaction]) -> Vec<CategoryBreakdown> {
        let grand_total = self.total_amount(transactions);

        let mut by_category: HashMap<CategoryId, (Category, Decimal, usize)> = HashMap::new();
        for t in transactions {
            let entry = by_category
                .entry(t.category.id)
                .or_insert_with(|| (t.category.clone(), Decimal::ZERO, 0));
            entry.1 += t.amount;
            entry.2 += 1;
        }

        let mut breakdown: Vec<CategoryBreakdown> = by_category
            .into_values()
            .map(|(category, total, transaction_count)| {
                let percentage = if grand_total.is_zero() {
                    Decimal::ZERO
                } else {
                    (total / grand_total * Decimal::ONE_HUNDRED).round_dp(2)
                };
                CategoryBreakdown {
                    category,
                    total,
                    percentage,
                    transaction_count,
                }
            })
            .collect();

        breakdown.sort_by(|a, b| {
            b.total
                .cmp(&a.total)
                .then_with(|| a.category.name.cmp(&b.category.name))
        });
        breakdown
    }

    /// Total and breakdown for one direction of a period's transactions.
    #[must_use]
    pub fn summarize(&self, transactions: &[Transaction], direction: Direction) -> HistorySummary {
        let relevant = self.filter_by_direction(transactions, direction);
        HistorySummary {
            total: self.total_amount(&relevant),
            breakdown: self.category_breakdown(&relevant),
        }
    }
}

impl Default for AnalyticsService {
    fn default() -> Self {
        Self::new()
    }
}
