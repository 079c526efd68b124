pub mod errors;
pub mod gateway;
pub mod models;
pub mod services;
pub mod storage;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use errors::CoreError;
use gateway::http::HttpGateway;
use gateway::traits::RemoteGateway;
use models::{
    account::{Account, AccountId},
    analytics::{HistorySummary, SortOption},
    balance::BalanceSeries,
    category::{Category, Direction},
    pending::PendingOperation,
    settings::Settings,
    transaction::{Transaction, TransactionId},
};
use services::{
    analytics_service::AnalyticsService, balance_service::BalanceService,
    csv_service::CsvService, sync_service::SyncEngine,
};
use storage::{
    file::{FileMirror, FilePendingLog, MIRROR_FILE, PENDING_FILE},
    memory::{MemoryMirror, MemoryPendingLog},
    traits::{PendingLog, TransactionMirror},
};

static LAST_CLIENT_ID: AtomicI64 = AtomicI64::new(0);

/// Main entry point for the finance tracker core library.
/// Owns the reconciliation engine and the pure services built on top of it.
#[must_use]
pub struct FinanceTracker {
    settings: Settings,
    engine: SyncEngine,
    balance_service: BalanceService,
    analytics_service: AnalyticsService,
    csv_service: CsvService,
}

impl std::fmt::Debug for FinanceTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinanceTracker")
            .field("settings", &self.settings)
            .finish()
    }
}

impl FinanceTracker {
    /// Build a tracker talking to the configured HTTP server.
    /// With `data_dir` set, the mirror and pending log persist as JSON files there.
    pub fn from_settings(settings: Settings) -> Result<Self, CoreError> {
        settings.validate()?;
        let gateway = Arc::new(HttpGateway::new(&settings.gateway)?);

        let (mirror, pending): (Box<dyn TransactionMirror>, Box<dyn PendingLog>) =
            match &settings.data_dir {
                Some(dir) => (
                    Box::new(FileMirror::open(dir.join(MIRROR_FILE))?),
                    Box::new(FilePendingLog::open(dir.join(PENDING_FILE))?),
                ),
                None => (
                    Box::new(MemoryMirror::new()),
                    Box::new(MemoryPendingLog::new()),
                ),
            };

        Ok(Self::with_parts(settings, gateway, mirror, pending))
    }

    /// Build a tracker from explicitly constructed collaborators.
    pub fn with_parts(
        settings: Settings,
        gateway: Arc<dyn RemoteGateway>,
        mirror: Box<dyn TransactionMirror>,
        pending: Box<dyn PendingLog>,
    ) -> Self {
        let engine = SyncEngine::new(gateway, mirror, pending, settings.sync.pending_cleanup);
        Self {
            settings,
            engine,
            balance_service: BalanceService::new(),
            analytics_service: AnalyticsService::new(),
            csv_service: CsvService::new(),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Direct access to the reconciliation engine.
    #[must_use]
    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    /// A fresh client-side identifier for a transaction that hasn't reached the server.
    /// Seeded from the clock in milliseconds and strictly increasing within the process.
    #[must_use]
    pub fn new_transaction_id() -> TransactionId {
        let now = Utc::now().timestamp_millis();
        let previous = LAST_CLIENT_ID
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(now.max(last + 1)))
            .unwrap_or_else(|last| last);
        now.max(previous + 1)
    }

    // ── Transactions ────────────────────────────────────────────────

    /// Transactions dated within `[from, to]`, synced with the server when reachable.
    pub async fn transactions(
        &self,
        account_id: AccountId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, CoreError> {
        self.engine.fetch_window(account_id, from, to).await
    }

    /// Transactions of one direction within `[from, to]`, in the requested order.
    pub async fn transactions_for_direction(
        &self,
        account_id: AccountId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        direction: Direction,
        sort: SortOption,
    ) -> Result<Vec<Transaction>, CoreError> {
        let all = self.engine.fetch_window(account_id, from, to).await?;
        let filtered = self.analytics_service.filter_by_direction(&all, direction);
        Ok(self.analytics_service.sort(&filtered, sort))
    }

    /// Total and per-category breakdown of one direction within `[from, to]`.
    pub async fn history_summary(
        &self,
        account_id: AccountId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        direction: Direction,
    ) -> Result<HistorySummary, CoreError> {
        let all = self.engine.fetch_window(account_id, from, to).await?;
        Ok(self.analytics_service.summarize(&all, direction))
    }

    pub async fn add_transaction(&self, transaction: Transaction) -> Result<Transaction, CoreError> {
        self.engine.add(transaction).await
    }

    pub async fn update_transaction(
        &self,
        transaction: Transaction,
    ) -> Result<Transaction, CoreError> {
        self.engine.update(transaction).await
    }

    pub async fn delete_transaction(&self, transaction: &Transaction) -> Result<(), CoreError> {
        self.engine.delete(transaction).await
    }

    /// Mutations recorded locally that the server hasn't confirmed yet.
    pub async fn pending_operations(&self) -> Result<Vec<PendingOperation>, CoreError> {
        self.engine.pending_operations().await
    }

    // ── Account & Categories ────────────────────────────────────────

    pub async fn account(&self, account_id: AccountId) -> Result<Account, CoreError> {
        self.engine.account(account_id).await
    }

    pub async fn update_account_details(
        &self,
        account_id: AccountId,
        name: &str,
        balance: Decimal,
        currency: &str,
    ) -> Result<Account, CoreError> {
        self.engine
            .update_account_details(account_id, name, balance, currency)
            .await
    }

    pub async fn categories(&self, direction: Option<Direction>) -> Result<Vec<Category>, CoreError> {
        self.engine.categories(direction).await
    }

    // ── Balance Charts ──────────────────────────────────────────────

    /// Daily closing balances for the configured number of days ending at `today`.
    pub async fn daily_balance_history(
        &self,
        account_id: AccountId,
        today: NaiveDate,
    ) -> Result<BalanceSeries, CoreError> {
        let days = self.settings.sync.daily_window_days;
        let first_day = today
            .checked_sub_days(chrono::Days::new(u64::from(days.saturating_sub(1))))
            .unwrap_or(NaiveDate::MIN);

        let (transactions, account) = self
            .engine
            .fetch_window_with_account(account_id, start_of_day(first_day), end_of_day(today))
            .await?;
        Ok(self
            .balance_service
            .project_daily(account.balance, &transactions, today, days))
    }

    /// Monthly closing balances for the configured number of months ending with `today`'s month.
    pub async fn monthly_balance_history(
        &self,
        account_id: AccountId,
        today: NaiveDate,
    ) -> Result<BalanceSeries, CoreError> {
        let months = self.settings.sync.monthly_window_months;
        let first_month = today
            .checked_sub_months(chrono::Months::new(months.saturating_sub(1)))
            .and_then(|d| d.with_day0(0))
            .unwrap_or(NaiveDate::MIN);

        let (transactions, account) = self
            .engine
            .fetch_window_with_account(account_id, start_of_day(first_month), end_of_day(today))
            .await?;
        Ok(self
            .balance_service
            .project_monthly(account.balance, &transactions, today, months))
    }

    // ── Export / Import ─────────────────────────────────────────────

    /// Parse transactions from CSV. Malformed rows are skipped.
    pub fn import_csv(&self, input: &str) -> Result<Vec<Transaction>, CoreError> {
        self.csv_service.parse(input)
    }

    pub fn export_csv(&self, transactions: &[Transaction]) -> Result<String, CoreError> {
        self.csv_service.export(transactions)
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_nano_opt(23, 59, 59, 999_999_999)
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|| start_of_day(date))
}
