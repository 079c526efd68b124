use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::errors::CoreError;
use crate::gateway::dto::TransactionRequest;
use crate::gateway::traits::RemoteGateway;
use crate::models::account::{self, Account, AccountId, DEFAULT_ACCOUNT_NAME};
use crate::models::category::{Category, Direction};
use crate::models::pending::{OperationKind, PendingOperation};
use crate::models::settings::PendingCleanupPolicy;
use crate::models::transaction::{Transaction, TransactionId};
use crate::storage::traits::{PendingLog, TransactionMirror};

/// Everything the engine mutates. Only reachable through the engine's lock.
struct EngineState {
    mirror: Box<dyn TransactionMirror>,
    pending: Box<dyn PendingLog>,
}

/// Offline-first reconciliation engine.
///
/// Reads drain the pending-operation log against the gateway, fold the
/// results into the local mirror and then fetch the authoritative window.
/// Writes go to the gateway first and fall back to mirror + pending log when
/// the server is unreachable or failing, keeping the account balance in line
/// with every mutation the engine considers applied.
///
/// All public operations hold one lock for their whole duration, so
/// concurrent callers are serialized here and gateway calls issued by the
/// engine never overlap.
pub struct SyncEngine {
    gateway: Arc<dyn RemoteGateway>,
    state: Mutex<EngineState>,
    cleanup: PendingCleanupPolicy,
}

impl SyncEngine {
    pub fn new(
        gateway: Arc<dyn RemoteGateway>,
        mirror: Box<dyn TransactionMirror>,
        pending: Box<dyn PendingLog>,
        cleanup: PendingCleanupPolicy,
    ) -> Self {
        Self {
            gateway,
            state: Mutex::new(EngineState { mirror, pending }),
            cleanup,
        }
    }

    // ── Reads ───────────────────────────────────────────────────────

    /// Transactions of `account_id` dated within `[from, to]` (inclusive).
    ///
    /// 1. Fetch the account; if the server can't be reached, serve locally.
    /// 2. Replay every pending operation in FIFO order; failures are logged and left queued.
    /// 3. Drop the replayed operations from the log in one batch.
    /// 4. Fetch the window, overwrite the mirror with it and clean the pending log.
    /// 5. If that fetch can't reach the server, serve mirror + pending payloads.
    pub async fn fetch_window(
        &self,
        account_id: AccountId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, CoreError> {
        Self::check_window(from, to)?;
        let mut state = self.state.lock().await;
        let (transactions, _) = self.window_locked(&mut state, account_id, from, to).await?;
        Ok(transactions)
    }

    /// [`Self::fetch_window`] together with the account it was reconciled
    /// against. Both are taken under the same lock, so the balance always
    /// matches the returned transactions.
    pub async fn fetch_window_with_account(
        &self,
        account_id: AccountId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<(Vec<Transaction>, Account), CoreError> {
        Self::check_window(from, to)?;
        let mut state = self.state.lock().await;
        let (transactions, account) = self.window_locked(&mut state, account_id, from, to).await?;
        Ok((transactions, account?))
    }

    /// The account as the engine sees it: the server's balance plus every
    /// pending delta that hasn't reached the server yet.
    /// Falls back to the cached copy when the server can't be reached.
    pub async fn account(&self, account_id: AccountId) -> Result<Account, CoreError> {
        let mut state = self.state.lock().await;
        match self.gateway.fetch_account().await {
            Ok(server) => Self::reconcile_local_account(&mut state, server),
            Err(e) if e.is_offline_recoverable() => {
                state.mirror.account(account_id)?.ok_or(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Categories, optionally restricted to one direction. Cached on success,
    /// served from the cache while offline.
    pub async fn categories(&self, direction: Option<Direction>) -> Result<Vec<Category>, CoreError> {
        let mut state = self.state.lock().await;
        let remote = match direction {
            None => self.gateway.fetch_categories().await,
            Some(d) => {
                self.gateway
                    .fetch_categories_by_direction(d == Direction::Income)
                    .await
            }
        };
        match remote {
            Ok(categories) => {
                state.mirror.upsert_categories(&categories)?;
                Ok(categories)
            }
            Err(e) if e.is_offline_recoverable() => {
                debug!("Serving categories from cache: {e}");
                let cached = state.mirror.categories()?;
                Ok(cached
                    .into_iter()
                    .filter(|c| match direction {
                        Some(d) => c.direction() == d,
                        None => true,
                    })
                    .collect())
            }
            Err(e) => Err(e),
        }
    }

    // ── Writes ──────────────────────────────────────────────────────

    /// Create a transaction. On an offline-recoverable failure the transaction
    /// is still applied locally and queued, and the error is returned so the
    /// caller can report it as not yet synced.
    ///
    /// Retrying an add that was queued earlier only applies the difference
    /// to what the queued copy already contributed.
    pub async fn add(&self, transaction: Transaction) -> Result<Transaction, CoreError> {
        Self::validate(&transaction)?;
        let mut state = self.state.lock().await;
        let queued = state.pending.get(transaction.id)?;
        let old_effect = match queued {
            Some(_) => Self::mirrored_effect(&state, transaction.id)?.unwrap_or(Decimal::ZERO),
            None => Decimal::ZERO,
        };
        let delta = transaction.balance_effect() - old_effect;
        let payload = TransactionRequest::from(&transaction);

        match self.gateway.create_transaction(&payload).await {
            Ok(created) => {
                if created.id != transaction.id {
                    Self::remove_ignoring_missing(&mut state, transaction.id)?;
                }
                Self::upsert(&mut state, created.clone())?;
                self.apply_confirmed_delta(&mut state, &transaction.account, delta, queued.as_ref())
                    .await?;
                state.pending.remove(transaction.id)?;
                Ok(created)
            }
            Err(e) if e.is_offline_recoverable() => {
                self.record_offline(&mut state, OperationKind::Add, transaction, delta, queued)
                    .await?;
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Update a transaction. The balance delta is the new effect minus the
    /// effect of the mirrored copy (zero if it was never mirrored).
    pub async fn update(&self, transaction: Transaction) -> Result<Transaction, CoreError> {
        Self::validate(&transaction)?;
        let mut state = self.state.lock().await;
        let queued = state.pending.get(transaction.id)?;
        let old_effect = Self::mirrored_effect(&state, transaction.id)?.unwrap_or(Decimal::ZERO);
        let delta = transaction.balance_effect() - old_effect;
        let payload = TransactionRequest::from(&transaction);

        match self
            .gateway
            .update_transaction(transaction.id, &payload)
            .await
        {
            Ok(updated) => {
                Self::upsert(&mut state, updated.clone())?;
                self.apply_confirmed_delta(&mut state, &transaction.account, delta, queued.as_ref())
                    .await?;
                state.pending.remove(transaction.id)?;
                Ok(updated)
            }
            Err(e) if e.is_offline_recoverable() => {
                self.record_offline(&mut state, OperationKind::Update, transaction, delta, queued)
                    .await?;
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Delete a transaction. A `ProtocolMismatch` answer (the server confirmed
    /// but the body couldn't be understood) counts as success.
    pub async fn delete(&self, transaction: &Transaction) -> Result<(), CoreError> {
        let mut state = self.state.lock().await;
        let queued = state.pending.get(transaction.id)?;
        let effect = match Self::mirrored_effect(&state, transaction.id)? {
            Some(effect) => effect,
            // A queued delete already took it out of the local balance.
            None if queued.is_some() => Decimal::ZERO,
            None => transaction.balance_effect(),
        };
        let delta = -effect;

        let outcome = match self.gateway.delete_transaction(transaction.id).await {
            Ok(()) => Ok(()),
            Err(CoreError::ProtocolMismatch(msg)) => {
                debug!("Delete of {} confirmed with unreadable body: {msg}", transaction.id);
                Ok(())
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok(()) => {
                Self::remove_ignoring_missing(&mut state, transaction.id)?;
                self.apply_confirmed_delta(&mut state, &transaction.account, delta, queued.as_ref())
                    .await?;
                state.pending.remove(transaction.id)?;
                Ok(())
            }
            Err(e) if e.is_offline_recoverable() => {
                self.record_offline(
                    &mut state,
                    OperationKind::Delete,
                    transaction.clone(),
                    delta,
                    queued,
                )
                .await?;
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Edit the account's name, balance and currency. Write-through only:
    /// nothing changes locally unless the server accepts the update.
    pub async fn update_account_details(
        &self,
        account_id: AccountId,
        name: &str,
        balance: Decimal,
        currency: &str,
    ) -> Result<Account, CoreError> {
        let mut state = self.state.lock().await;
        let base = match state.mirror.account(account_id)? {
            Some(cached) => cached,
            None => self.gateway.fetch_account().await?,
        };

        let name = name.trim();
        let edited = Account {
            name: if name.is_empty() {
                DEFAULT_ACCOUNT_NAME.to_string()
            } else {
                name.to_string()
            },
            balance,
            currency: account::currency_code(currency),
            updated_at: Some(Utc::now()),
            ..base
        };

        let confirmed = self.gateway.update_account(&edited).await?;
        state.mirror.upsert_account(confirmed.clone())?;
        Ok(confirmed)
    }

    // ── Inspection ──────────────────────────────────────────────────

    /// Operations still waiting for the server, in replay order.
    pub async fn pending_operations(&self) -> Result<Vec<PendingOperation>, CoreError> {
        self.state.lock().await.pending.load()
    }

    /// Everything in the local mirror, most recent first.
    pub async fn cached_transactions(&self) -> Result<Vec<Transaction>, CoreError> {
        self.state.lock().await.mirror.load()
    }

    /// The locally cached account, without contacting the server.
    pub async fn cached_account(&self, account_id: AccountId) -> Result<Option<Account>, CoreError> {
        self.state.lock().await.mirror.account(account_id)
    }

    // ── Internal ────────────────────────────────────────────────────

    fn validate(transaction: &Transaction) -> Result<(), CoreError> {
        if transaction.amount <= Decimal::ZERO {
            return Err(CoreError::ValidationError(format!(
                "Amount must be positive, got {}",
                transaction.amount
            )));
        }
        Ok(())
    }

    fn check_window(from: DateTime<Utc>, to: DateTime<Utc>) -> Result<(), CoreError> {
        if from > to {
            return Err(CoreError::ValidationError(format!(
                "'from' ({from}) must not be after 'to' ({to})"
            )));
        }
        Ok(())
    }

    /// The read flow behind both window operations. The second element is the
    /// reconciled account, or the cached one when offline (the offline error
    /// if nothing is cached).
    async fn window_locked(
        &self,
        state: &mut EngineState,
        account_id: AccountId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<(Vec<Transaction>, Result<Account, CoreError>), CoreError> {
        let server_account = match self.gateway.fetch_account().await {
            Ok(account) => account,
            Err(e) if e.is_offline_recoverable() => {
                info!("{} unavailable, serving window from local state: {e}", self.gateway.name());
                let cached = state.mirror.account(account_id)?.ok_or(e);
                return Ok((Self::local_window(state, from, to)?, cached));
            }
            Err(e) => return Err(e),
        };

        let (synced, latest_account) = self.replay_pending(state).await?;
        if !synced.is_empty() {
            state.pending.remove_many(&synced)?;
            info!("Replayed {} pending operation(s)", synced.len());
        }
        let server_account = match latest_account {
            Some(account) if account.id == server_account.id => account,
            _ => server_account,
        };

        let remote = match self.gateway.fetch_transactions(account_id, from, to).await {
            Ok(remote) => remote,
            Err(e) if e.is_offline_recoverable() => {
                warn!("Window fetch failed, serving from local state: {e}");
                let local = Self::reconcile_local_account(state, server_account)?;
                return Ok((Self::local_window(state, from, to)?, Ok(local)));
            }
            Err(e) => return Err(e),
        };

        for transaction in &remote {
            Self::remove_ignoring_missing(state, transaction.id)?;
            state.mirror.add(transaction.clone())?;
        }
        debug!("Mirrored {} transaction(s) from the server", remote.len());

        if self.cleanup == PendingCleanupPolicy::ClearAll {
            let dropped = state.pending.load()?.len();
            if dropped > 0 {
                info!("Dropping {dropped} unreplayed pending operation(s) after authoritative fetch");
            }
            state.pending.clear()?;
        }
        let local = Self::reconcile_local_account(state, server_account)?;

        let transactions = remote
            .into_iter()
            .filter(|t| t.is_within(from, to))
            .collect();
        Ok((transactions, Ok(local)))
    }

        /// Replay all pending operations in stored order.
    /// Returns the ids that succeeded and the last account state the server reported.
    async fn replay_pending(
        &self,
        state: &mut EngineState,
    ) -> Result<(Vec<TransactionId>, Option<Account>), CoreError> {
        let operations = state.pending.load()?;
        let mut synced = Vec::new();
        let mut latest_account = None;

        for operation in operations {
            debug!("Replaying {} for transaction {}", operation.kind, operation.transaction_id);
            match self.replay(state, &operation).await {
                Ok(account) => {
                    synced.push(operation.transaction_id);
                    if account.is_some() {
                        latest_account = account;
                    }
                }
                Err(e) => warn!(
                    "Replay of {} for transaction {} failed, keeping it queued: {e}",
                    operation.kind, operation.transaction_id
                ),
            }
        }

        Ok((synced, latest_account))
    }

    /// Replay one operation and fold the result into the mirror. The
    /// recorded delta is pushed to the server only if it never got there.
    async fn replay(
        &self,
        state: &mut EngineState,
        operation: &PendingOperation,
    ) -> Result<Option<Account>, CoreError> {
        let transaction = operation.transaction.as_ref().ok_or_else(|| {
            CoreError::ValidationError(format!(
                "pending {} for transaction {} has no payload",
                operation.kind, operation.transaction_id
            ))
        })?;
        let payload = TransactionRequest::from(transaction);

        match operation.kind {
            OperationKind::Add => {
                let created = self.gateway.create_transaction(&payload).await?;
                Self::remove_ignoring_missing(state, transaction.id)?;
                Self::upsert(state, created)?;
            }
            OperationKind::Update => {
                let updated = self
                    .gateway
                    .update_transaction(transaction.id, &payload)
                    .await?;
                Self::upsert(state, updated)?;
            }
            OperationKind::Delete => {
                match self.gateway.delete_transaction(transaction.id).await {
                    Ok(()) | Err(CoreError::ProtocolMismatch(_)) => {}
                    Err(e) => return Err(e),
                }
                Self::remove_ignoring_missing(state, transaction.id)?;
            }
        }

        let delta = operation.unpushed_delta();
        if delta.is_zero() {
            return Ok(None);
        }
        match self.push_delta(transaction.account.id, delta).await {
            Ok(account) => Ok(Some(account)),
            Err(e) => {
                // The mutation itself is confirmed; replaying it again would duplicate it.
                warn!(
                    "Transaction {} synced but its balance delta could not be pushed: {e}",
                    transaction.id
                );
                Ok(None)
            }
        }
    }

    /// Record a write the server didn't get. A write on an id that is already
    /// queued is folded into the queued entry; an identical repeat is ignored.
    async fn record_offline(
        &self,
        state: &mut EngineState,
        kind: OperationKind,
        transaction: Transaction,
        delta: Decimal,
        queued: Option<PendingOperation>,
    ) -> Result<(), CoreError> {
        let id = transaction.id;
        if let Some(existing) = &queued {
            if existing.kind == kind && existing.transaction.as_ref() == Some(&transaction) {
                warn!("Identical {kind} for transaction {id} already queued, ignoring repeat");
                return Ok(());
            }
        }

        let pushed = if delta.is_zero() {
            Decimal::ZERO
        } else {
            match self.push_delta(transaction.account.id, delta).await {
                Ok(_) => delta,
                Err(e) => {
                    debug!("Optimistic balance push failed: {e}");
                    Decimal::ZERO
                }
            }
        };
        Self::adjust_local_balance(state, &transaction.account, delta)?;

        let operation = match queued {
            None => Some(PendingOperation {
                pushed_delta: pushed,
                ..PendingOperation::new(kind, transaction.clone(), delta)
            }),
            Some(existing) => {
                debug!("Folding {kind} for transaction {id} into queued {}", existing.kind);
                Self::coalesce(existing, kind, transaction.clone(), delta, pushed)
            }
        };

        match operation {
            Some(operation) => {
                let merged_kind = operation.kind;
                state.pending.put(operation)?;
                match merged_kind {
                    OperationKind::Add | OperationKind::Update => Self::upsert(state, transaction)?,
                    OperationKind::Delete => Self::remove_ignoring_missing(state, id)?,
                }
                info!("Queued {merged_kind} for transaction {id} until the server is reachable");
            }
            None => {
                state.pending.remove(id)?;
                Self::remove_ignoring_missing(state, id)?;
                info!("Queued add for transaction {id} cancelled by a delete");
            }
        }
        Ok(())
    }

    /// Fold a new offline write into the entry already queued for its id.
    /// `None` means the two cancel out: the transaction never reached the server.
    fn coalesce(
        existing: PendingOperation,
        kind: OperationKind,
        transaction: Transaction,
        delta: Decimal,
        pushed: Decimal,
    ) -> Option<PendingOperation> {
        let merged_kind = match (existing.kind, kind) {
            (OperationKind::Add, OperationKind::Delete) => {
                let stranded = existing.pushed_delta + pushed;
                if !stranded.is_zero() {
                    warn!(
                        "Cancelled add for transaction {} leaves {stranded} on the server balance",
                        existing.transaction_id
                    );
                }
                return None;
            }
            (OperationKind::Add, _) => OperationKind::Add,
            (_, OperationKind::Delete) => OperationKind::Delete,
            (_, _) => OperationKind::Update,
        };
        Some(PendingOperation {
            kind: merged_kind,
            transaction_id: existing.transaction_id,
            transaction: Some(transaction),
            balance_delta: existing.balance_delta + delta,
            pushed_delta: existing.pushed_delta + pushed,
        })
    }

    /// After a confirmed write: mirror `delta` locally and push it to the
    /// server, along with whatever a queued entry for the same id never pushed.
    async fn apply_confirmed_delta(
        &self,
        state: &mut EngineState,
        account: &Account,
        delta: Decimal,
        queued: Option<&PendingOperation>,
    ) -> Result<(), CoreError> {
        let server_delta = delta + queued.map_or(Decimal::ZERO, PendingOperation::unpushed_delta);
        if !server_delta.is_zero() {
            if let Err(e) = self.push_delta(account.id, server_delta).await {
                warn!("Balance update for account {} failed: {e}", account.id);
            }
        }
        if delta.is_zero() {
            return Ok(());
        }
        Self::adjust_local_balance(state, account, delta)
    }

    /// Add `delta` to the server's current balance.
    async fn push_delta(&self, account_id: AccountId, delta: Decimal) -> Result<Account, CoreError> {
        let current = self.gateway.fetch_account().await?;
        if current.id != account_id {
            return Err(CoreError::ValidationError(format!(
                "server account {} does not match transaction account {account_id}",
                current.id
            )));
        }
        self.gateway.update_account(&current.with_delta(delta)).await
    }

    fn adjust_local_balance(
        state: &mut EngineState,
        snapshot: &Account,
        delta: Decimal,
    ) -> Result<(), CoreError> {
        let base = state
            .mirror
            .account(snapshot.id)?
            .unwrap_or_else(|| snapshot.clone());
        state.mirror.upsert_account(base.with_delta(delta))
    }

    /// Cache the server's account with all unpushed pending deltas re-applied.
    fn reconcile_local_account(
        state: &mut EngineState,
        server: Account,
    ) -> Result<Account, CoreError> {
        let unpushed: Decimal = state
            .pending
            .load()?
            .iter()
            .filter(|op| {
                op.transaction
                    .as_ref()
                    .is_some_and(|t| t.account.id == server.id)
            })
            .map(PendingOperation::unpushed_delta)
            .sum();
        let local = server.with_delta(unpushed);
        state.mirror.upsert_account(local.clone())?;
        Ok(local)
    }

    /// Mirror contents plus non-delete pending payloads, deduplicated by id
    /// (mirror wins), restricted to the window.
    fn local_window(
        state: &EngineState,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, CoreError> {
        let mirrored = state.mirror.load()?;
        let queued = state
            .pending
            .load()?
            .into_iter()
            .filter(|op| op.kind != OperationKind::Delete)
            .filter_map(|op| op.transaction);

        let mut seen = HashSet::new();
        Ok(mirrored
            .into_iter()
            .chain(queued)
            .filter(|t| seen.insert(t.id))
            .filter(|t| t.is_within(from, to))
            .collect())
    }

    fn mirrored_effect(state: &EngineState, id: TransactionId) -> Result<Option<Decimal>, CoreError> {
        match state.mirror.get(id) {
            Ok(mirrored) => Ok(Some(mirrored.balance_effect())),
            Err(CoreError::StorageNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn upsert(state: &mut EngineState, transaction: Transaction) -> Result<(), CoreError> {
        match state.mirror.update(transaction.clone()) {
            Err(CoreError::StorageNotFound(_)) => state.mirror.add(transaction),
            other => other,
        }
    }

    fn remove_ignoring_missing(state: &mut EngineState, id: TransactionId) -> Result<(), CoreError> {
        match state.mirror.remove(id) {
            Err(CoreError::StorageNotFound(_)) => Ok(()),
            other => other,
        }
    }
}
