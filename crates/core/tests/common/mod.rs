// ═══════════════════════════════════════════════════════════════════
// Shared fixtures: in-memory server stand-in and sample data
// ═══════════════════════════════════════════════════════════════════

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use finance_sync_core::errors::CoreError;
use finance_sync_core::gateway::dto::TransactionRequest;
use finance_sync_core::gateway::traits::RemoteGateway;
use finance_sync_core::models::account::{Account, AccountId};
use finance_sync_core::models::category::Category;
use finance_sync_core::models::transaction::{Transaction, TransactionId};

pub const ACCOUNT_ID: AccountId = 1;

/// How the mock server answers every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Online,
    /// Transport failure on every call.
    Offline,
    /// 503 on every call.
    Failing,
    /// 400 on every call.
    Rejecting,
}

struct ServerState {
    mode: Mode,
    account: Account,
    transactions: BTreeMap<TransactionId, Transaction>,
    categories: Vec<Category>,
    next_id: TransactionId,
    /// Answer successful deletes with an unreadable body.
    delete_body_mismatch: bool,
    /// Fail only the window fetch while everything else works.
    window_fetch_offline: bool,
    /// Fail every transaction endpoint while account endpoints keep working.
    transactions_offline: bool,
}

/// In-memory stand-in for the finance server.
///
/// Server-side ids start at 1000 so they never collide with client ids used in tests.
pub struct MockGateway {
    state: Mutex<ServerState>,
    pub create_calls: AtomicUsize,
    pub update_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
    pub account_updates: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl MockGateway {
    pub fn new(balance: Decimal) -> Self {
        Self {
            state: Mutex::new(ServerState {
                mode: Mode::Online,
                account: account(balance),
                transactions: BTreeMap::new(),
                categories: vec![salary(), groceries(), dentist()],
                next_id: 1000,
                delete_body_mismatch: false,
                window_fetch_offline: false,
                transactions_offline: false,
            }),
            create_calls: AtomicUsize::new(0),
            update_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
            account_updates: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn set_mode(&self, mode: Mode) {
        self.state.lock().unwrap().mode = mode;
    }

    pub fn set_delete_body_mismatch(&self, on: bool) {
        self.state.lock().unwrap().delete_body_mismatch = on;
    }

    pub fn set_window_fetch_offline(&self, on: bool) {
        self.state.lock().unwrap().window_fetch_offline = on;
    }

    pub fn set_transactions_offline(&self, on: bool) {
        self.state.lock().unwrap().transactions_offline = on;
    }

    pub fn balance(&self) -> Decimal {
        self.state.lock().unwrap().account.balance
    }

    pub fn server_transactions(&self) -> Vec<Transaction> {
        self.state.lock().unwrap().transactions.values().cloned().collect()
    }

    /// Put a transaction on the server directly, bypassing the engine.
    pub fn seed(&self, transaction: Transaction) {
        self.state
            .lock()
            .unwrap()
            .transactions
            .insert(transaction.id, transaction);
    }

    pub fn creates(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), CoreError> {
        match self.state.lock().unwrap().mode {
            Mode::Online => Ok(()),
            Mode::Offline => Err(CoreError::Unreachable("connection refused".into())),
            Mode::Failing => Err(CoreError::ServerError {
                status: 503,
                message: "service unavailable".into(),
            }),
            Mode::Rejecting => Err(CoreError::Rejected {
                status: 400,
                message: "bad request".into(),
            }),
        }
    }

    fn check_transactions(&self) -> Result<(), CoreError> {
        self.check()?;
        if self.state.lock().unwrap().transactions_offline {
            return Err(CoreError::Unreachable("transactions endpoint timed out".into()));
        }
        Ok(())
    }

    /// Simulate network latency so overlapping calls would be observable.
    async fn enter(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::task::yield_now().await;
    }

    fn leave(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    fn build(state: &ServerState, id: TransactionId, payload: &TransactionRequest) -> Result<Transaction, CoreError> {
        let category = state
            .categories
            .iter()
            .find(|c| c.id == payload.category_id)
            .cloned()
            .ok_or_else(|| CoreError::Rejected {
                status: 400,
                message: format!("unknown category {}", payload.category_id),
            })?;
        let amount: Decimal = payload.amount.parse().map_err(|_| CoreError::Rejected {
            status: 400,
            message: "bad amount".into(),
        })?;
        let now = Utc::now();
        Ok(Transaction {
            id,
            account: state.account.clone(),
            category,
            amount,
            transaction_date: payload.transaction_date,
            comment: payload.comment.clone(),
            created_at: now,
            updated_at: now,
        })
    }
}

#[async_trait]
impl RemoteGateway for MockGateway {
    fn name(&self) -> &str {
        "MockGateway"
    }

    async fn fetch_account(&self) -> Result<Account, CoreError> {
        self.enter().await;
        let result = self.check().map(|_| self.state.lock().unwrap().account.clone());
        self.leave();
        result
    }

    async fn update_account(&self, account: &Account) -> Result<Account, CoreError> {
        self.enter().await;
        let result = self.check().map(|_| {
            self.account_updates.fetch_add(1, Ordering::SeqCst);
            let mut state = self.state.lock().unwrap();
            state.account.name = account.name.clone();
            state.account.balance = account.balance;
            state.account.currency = account.currency.clone();
            state.account.clone()
        });
        self.leave();
        result
    }

    async fn fetch_transactions(
        &self,
        account_id: AccountId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, CoreError> {
        self.enter().await;
        let result = self.check_transactions().and_then(|_| {
            let state = self.state.lock().unwrap();
            if state.window_fetch_offline {
                return Err(CoreError::Unreachable("timed out".into()));
            }
            Ok(state
                .transactions
                .values()
                .filter(|t| t.account.id == account_id && t.is_within(from, to))
                .cloned()
                .collect())
        });
        self.leave();
        result
    }

    async fn create_transaction(&self, payload: &TransactionRequest) -> Result<Transaction, CoreError> {
        self.enter().await;
        let result = self.check_transactions().and_then(|_| {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            let mut state = self.state.lock().unwrap();
            let id = state.next_id;
            let created = Self::build(&state, id, payload)?;
            state.next_id += 1;
            state.transactions.insert(id, created.clone());
            Ok(created)
        });
        self.leave();
        result
    }

    async fn update_transaction(
        &self,
        id: TransactionId,
        payload: &TransactionRequest,
    ) -> Result<Transaction, CoreError> {
        self.enter().await;
        let result = self.check_transactions().and_then(|_| {
            self.update_calls.fetch_add(1, Ordering::SeqCst);
            let mut state = self.state.lock().unwrap();
            if !state.transactions.contains_key(&id) {
                return Err(CoreError::Rejected {
                    status: 404,
                    message: format!("transaction {id} not found"),
                });
            }
            let updated = Self::build(&state, id, payload)?;
            state.transactions.insert(id, updated.clone());
            Ok(updated)
        });
        self.leave();
        result
    }

    async fn delete_transaction(&self, id: TransactionId) -> Result<(), CoreError> {
        self.enter().await;
        let result = self.check_transactions().and_then(|_| {
            self.delete_calls.fetch_add(1, Ordering::SeqCst);
            let mut state = self.state.lock().unwrap();
            if state.transactions.remove(&id).is_none() {
                return Err(CoreError::Rejected {
                    status: 404,
                    message: format!("transaction {id} not found"),
                });
            }
            if state.delete_body_mismatch {
                return Err(CoreError::ProtocolMismatch("empty body".into()));
            }
            Ok(())
        });
        self.leave();
        result
    }

    async fn fetch_categories(&self) -> Result<Vec<Category>, CoreError> {
        self.enter().await;
        let result = self.check().map(|_| self.state.lock().unwrap().categories.clone());
        self.leave();
        result
    }

    async fn fetch_categories_by_direction(&self, is_income: bool) -> Result<Vec<Category>, CoreError> {
        self.enter().await;
        let result = self.check().map(|_| {
            self.state
                .lock()
                .unwrap()
                .categories
                .iter()
                .filter(|c| c.is_income == is_income)
                .cloned()
                .collect()
        });
        self.leave();
        result
    }
}

// ── Sample data ─────────────────────────────────────────────────────

pub fn account(balance: Decimal) -> Account {
    Account {
        id: ACCOUNT_ID,
        user_id: Some(1),
        name: "Main account".into(),
        balance,
        currency: "RUB".into(),
        created_at: None,
        updated_at: None,
    }
}

pub fn salary() -> Category {
    Category::new(1, "Salary", '💰', true)
}

pub fn groceries() -> Category {
    Category::new(3, "Groceries", '🧺', false)
}

pub fn dentist() -> Category {
    Category::new(2, "Dentist", '🦷', false)
}

pub fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

pub fn tx(id: TransactionId, category: Category, amount: Decimal, date: DateTime<Utc>) -> Transaction {
    Transaction {
        id,
        account: account(dec!(1000)),
        category,
        amount,
        transaction_date: date,
        comment: None,
        created_at: date,
        updated_at: date,
    }
}

/// A window comfortably containing every date used in the tests.
pub fn wide_window() -> (DateTime<Utc>, DateTime<Utc>) {
    (at(2025, 1, 1, 0), at(2025, 12, 31, 23))
}
