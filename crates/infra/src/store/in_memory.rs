use std::sync::RwLock;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use stockhold_core::{InventoryResult, ReservationId, Sku};
use stockhold_inventory::{LowStockScan, Reservation, StockRecord};

use super::collection::{CollectionTxn, VersionedCollection};
use super::context::CallContext;
use super::r#trait::{StoreError, Transaction, TransactionalStore};
use crate::config::EngineConfig;

#[derive(Debug, Default)]
struct StoreState {
    stocks: VersionedCollection<StockRecord>,
    reservations: VersionedCollection<Reservation>,
    /// Sequence number of the last successful commit.
    commit_seq: u64,
}

/// In-memory transactional store with optimistic concurrency control.
///
/// Transaction attempts read committed state without holding a lock across
/// the body, buffer their writes, and validate their read set under the
/// write lock at commit. A conflicting attempt is discarded and, after an
/// exponential backoff, the body is re-run, up to `max_attempts` times.
///
/// Intended for tests/dev and single-process deployments.
#[derive(Debug)]
pub struct InMemoryStore {
    state: RwLock<StoreState>,
    max_attempts: u32,
    retry: EngineConfig,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::from_config(&EngineConfig::default())
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            max_attempts: config.max_txn_attempts.max(1),
            retry: config.clone(),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Number of stock records.
    pub fn stock_count(&self) -> Result<usize, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::Poisoned)?;
        Ok(state.stocks.len())
    }

    /// Sequence number of the last successful commit.
    pub fn commit_seq(&self) -> Result<u64, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::Poisoned)?;
        Ok(state.commit_seq)
    }

    fn commit(&self, ctx: &CallContext, txn: InMemoryTransaction<'_>) -> Result<u64, StoreError> {
        let InMemoryTransaction {
            stocks,
            reservations,
            ..
        } = txn;

        let mut state = self.state.write().map_err(|_| StoreError::Poisoned)?;
        ctx.check()?;

        stocks.validate(&state.stocks)?;
        reservations.validate(&state.reservations)?;

        if stocks.is_empty() && reservations.is_empty() {
            return Ok(state.commit_seq);
        }

        state.commit_seq += 1;
        let version = state.commit_seq;
        stocks.apply(&mut state.stocks, version);
        reservations.apply(&mut state.reservations, version);
        Ok(version)
    }

    fn reads_are_stale(&self, txn: &InMemoryTransaction<'_>) -> Result<bool, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::Poisoned)?;
        Ok(txn.stocks.check_reads(&state.stocks).is_err()
            || txn.reservations.check_reads(&state.reservations).is_err())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

struct InMemoryTransaction<'s> {
    state: &'s RwLock<StoreState>,
    stocks: CollectionTxn<StockRecord>,
    reservations: CollectionTxn<Reservation>,
}

impl<'s> InMemoryTransaction<'s> {
    fn new(state: &'s RwLock<StoreState>) -> Self {
        Self {
            state,
            stocks: CollectionTxn::new("stock"),
            reservations: CollectionTxn::new("reservation"),
        }
    }
}

impl Transaction for InMemoryTransaction<'_> {
    fn get_stock(&mut self, sku: &Sku) -> Result<Option<StockRecord>, StoreError> {
        if let Some(staged) = self.stocks.staged(sku) {
            return Ok(Some(staged.clone()));
        }
        let state = self.state.read().map_err(|_| StoreError::Poisoned)?;
        let (value, version) = state.stocks.lookup(sku);
        self.stocks.record_read(sku, version);
        Ok(value.cloned())
    }

    fn put_stock(&mut self, record: StockRecord) -> Result<(), StoreError> {
        self.stocks.put(record);
        Ok(())
    }

    fn get_reservation(&mut self, id: &ReservationId) -> Result<Option<Reservation>, StoreError> {
        if let Some(staged) = self.reservations.staged(id) {
            return Ok(Some(staged.clone()));
        }
        let state = self.state.read().map_err(|_| StoreError::Poisoned)?;
        let (value, version) = state.reservations.lookup(id);
        self.reservations.record_read(id, version);
        Ok(value.cloned())
    }

    fn create_reservation(&mut self, reservation: Reservation) -> Result<(), StoreError> {
        self.reservations.create(reservation)
    }

    fn update_reservation(&mut self, reservation: Reservation) -> Result<(), StoreError> {
        self.reservations.update(reservation);
        Ok(())
    }
}

impl TransactionalStore for InMemoryStore {
    fn run_in_transaction<T, F>(&self, ctx: &CallContext, mut body: F) -> InventoryResult<T>
    where
        F: FnMut(&mut dyn Transaction) -> InventoryResult<T>,
    {
        for attempt in 1..=self.max_attempts {
            ctx.check()?;

            let mut txn = InMemoryTransaction::new(&self.state);
            match body(&mut txn) {
                Ok(value) => match self.commit(ctx, txn) {
                    Ok(version) => {
                        debug!(attempt, version, "transaction committed");
                        return Ok(value);
                    }
                    Err(StoreError::Conflict(key)) => {
                        let delay = self.retry.retry_delay(attempt);
                        debug!(attempt, key = %key, ?delay, "transaction conflict; retrying");
                        if delay.is_zero() {
                            std::thread::yield_now();
                        } else {
                            std::thread::sleep(delay);
                        }
                    }
                    Err(err) => return Err(err.into()),
                },
                Err(err) => {
                    // A decision taken on data that has since changed is retried, not returned.
                    if self.reads_are_stale(&txn)? {
                        debug!(attempt, error = %err, "transaction body failed on stale reads; retrying");
                        continue;
                    }
                    return Err(err);
                }
            }
        }

        warn!(attempts = self.max_attempts, "transaction retries exhausted");
        Err(StoreError::RetriesExhausted {
            attempts: self.max_attempts,
        }
        .into())
    }

    fn get_stock(&self, sku: &Sku) -> Result<Option<StockRecord>, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::Poisoned)?;
        Ok(state.stocks.get(sku).cloned())
    }

    fn get_reservation(&self, id: &ReservationId) -> Result<Option<Reservation>, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::Poisoned)?;
        Ok(state.reservations.get(id).cloned())
    }

    fn scan_stock(&self, scan: &LowStockScan) -> Result<Vec<StockRecord>, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::Poisoned)?;
        Ok(scan.apply(state.stocks.values()))
    }

    fn scan_expired_reservations(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Reservation>, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::Poisoned)?;
        let mut expired: Vec<&Reservation> = state
            .reservations
            .values()
            .filter(|r| r.is_expired_at(now))
            .collect();
        expired.sort_by(|a, b| (a.expires_at(), a.id()).cmp(&(b.expires_at(), b.id())));
        Ok(expired.into_iter().take(limit).cloned().collect())
    }
}
