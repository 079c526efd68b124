use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

use crate::models::balance::{BalanceSeries, BucketSize};
use crate::models::transaction::Transaction;

/// Derives historical balances from the current balance and the transactions
/// that led up to it.
///
/// Walks backward from the newest bucket: each bucket records the running
/// balance, then the bucket's transaction deltas are subtracted before moving
/// to the previous one. Buckets without transactions carry the balance over.
/// Pure computation, deterministic for a given input.
pub struct BalanceService;

impl BalanceService {
    pub fn new() -> Self {
        Self
    }

    /// One point per calendar day for the `days` days ending at `today` (inclusive).
    #[must_use]
    pub fn project_daily(
        &self,
        current_balance: Decimal,
        transactions: &[Transaction],
        today: NaiveDate,
        days: u32,
    ) -> BalanceSeries {
        let mut buckets = Vec::with_capacity(days as usize);
        let mut day = today;
        for _ in 0..days {
            buckets.push(day);
            day = match day.pred_opt() {
                Some(prev) => prev,
                None => break,
            };
        }

        let deltas = Self::deltas_by(transactions, |t| t.transaction_date.date_naive());
        Self::walk_backward(BucketSize::Day, current_balance, &buckets, &deltas)
    }

    /// One point per month for the `months` months ending with `today`'s month,
    /// keyed by the first day of each month.
    #[must_use]
    pub fn project_monthly(
        &self,
        current_balance: Decimal,
        transactions: &[Transaction],
        today: NaiveDate,
        months: u32,
    ) -> BalanceSeries {
        let this_month = month_start(today);
        let buckets: Vec<NaiveDate> = (0..months)
            .map_while(|offset| this_month.checked_sub_months(Months::new(offset)))
            .collect();

        let deltas = Self::deltas_by(transactions, |t| month_start(t.transaction_date.date_naive()));
        Self::walk_backward(BucketSize::Month, current_balance, &buckets, &deltas)
    }

    /// Net signed balance effect per bucket key.
    fn deltas_by(
        transactions: &[Transaction],
        key: impl Fn(&Transaction) -> NaiveDate,
    ) -> HashMap<NaiveDate, Decimal> {
        let mut deltas: HashMap<NaiveDate, Decimal> = HashMap::new();
        for t in transactions {
            *deltas.entry(key(t)).or_insert(Decimal::ZERO) += t.balance_effect();
        }
        deltas
    }

    /// `buckets` must be ordered newest first.
    fn walk_backward(
        bucket: BucketSize,
        current_balance: Decimal,
        buckets: &[NaiveDate],
        deltas: &HashMap<NaiveDate, Decimal>,
    ) -> BalanceSeries {
        let mut points = BTreeMap::new();
        let mut running = current_balance;

        for date in buckets {
            points.insert(*date, running);
            running -= deltas.get(date).copied().unwrap_or(Decimal::ZERO);
        }

        BalanceSeries {
            bucket,
            points,
            opening_balance: running,
        }
    }
}

impl Default for BalanceService {
    fn default() -> Self {
        Self::new()
    }
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}
