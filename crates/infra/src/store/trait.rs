use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use stockhold_core::{InventoryError, InventoryResult, ReservationId, Sku};
use stockhold_inventory::{LowStockScan, Reservation, StockRecord};

use super::context::CallContext;

/// Store operation error.
///
/// These are **infrastructure errors** as opposed to the business errors in
/// `InventoryError`. `Conflict` never reaches engine callers directly: the
/// transaction runner retries it, and only an exhausted retry budget is
/// surfaced (as `InventoryError::Unknown`).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("write conflict on {0}")]
    Conflict(String),

    #[error("record already exists: {0}")]
    AlreadyExists(String),

    #[error("record missing: {0}")]
    Missing(String),

    #[error("transaction cancelled")]
    Cancelled,

    #[error("transaction deadline exceeded")]
    DeadlineExceeded,

    #[error("transaction retries exhausted after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },

    #[error("store lock poisoned")]
    Poisoned,
}

impl From<StoreError> for InventoryError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Cancelled | StoreError::DeadlineExceeded => {
                InventoryError::cancelled(value.to_string())
            }
            other => InventoryError::unknown(other.to_string()),
        }
    }
}

/// One attempt of an atomic multi-key unit of work.
///
/// Reads observe the transaction's own buffered writes first. Writes stay
/// buffered until the runner commits; nothing is visible to other callers
/// before that.
pub trait Transaction {
    fn get_stock(&mut self, sku: &Sku) -> Result<Option<StockRecord>, StoreError>;

    /// Insert or replace a stock record.
    fn put_stock(&mut self, record: StockRecord) -> Result<(), StoreError>;

    fn get_reservation(&mut self, id: &ReservationId) -> Result<Option<Reservation>, StoreError>;

    /// Stage a new reservation; the commit fails if the id is taken by then.
    fn create_reservation(&mut self, reservation: Reservation) -> Result<(), StoreError>;

    /// Stage a replacement of an existing reservation.
    fn update_reservation(&mut self, reservation: Reservation) -> Result<(), StoreError>;
}

/// Keyed stock and reservation collections with an atomic-transaction
/// primitive.
///
/// ## Transaction contract
///
/// `run_in_transaction` runs `body` against a fresh [`Transaction`] and then
/// commits every staged write atomically. Implementations must:
/// - apply all writes of a successful body or none of them
/// - detect conflicting concurrent commits (at least snapshot +
///   conflict-abort) and re-run the **whole** body on conflict, within a
///   bounded retry budget
/// - check the [`CallContext`] before each attempt and at commit, so a
///   cancelled call never applies writes
/// - return a business error from `body` unchanged, unless the data it was
///   computed from has since changed, in which case the body is re-run
///
/// Because of retries, `body` must not perform side effects other than
/// reads and writes through the transaction.
///
/// ## Plain reads
///
/// The remaining methods read committed state outside any transaction.
pub trait TransactionalStore: Send + Sync {
    fn run_in_transaction<T, F>(&self, ctx: &CallContext, body: F) -> InventoryResult<T>
    where
        F: FnMut(&mut dyn Transaction) -> InventoryResult<T>;

    fn get_stock(&self, sku: &Sku) -> Result<Option<StockRecord>, StoreError>;

    fn get_reservation(&self, id: &ReservationId) -> Result<Option<Reservation>, StoreError>;

    /// Ordered range scan over stock records (filter, start-after, limit).
    fn scan_stock(&self, scan: &LowStockScan) -> Result<Vec<StockRecord>, StoreError>;

    /// Reservations still `reserved` whose `expires_at <= now`, ordered by
    /// `(expires_at, id)`.
    fn scan_expired_reservations(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Reservation>, StoreError>;
}

impl<S> TransactionalStore for Arc<S>
where
    S: TransactionalStore + ?Sized,
{
    fn run_in_transaction<T, F>(&self, ctx: &CallContext, body: F) -> InventoryResult<T>
    where
        F: FnMut(&mut dyn Transaction) -> InventoryResult<T>,
    {
        (**self).run_in_transaction(ctx, body)
    }

    fn get_stock(&self, sku: &Sku) -> Result<Option<StockRecord>, StoreError> {
        (**self).get_stock(sku)
    }

    fn get_reservation(&self, id: &ReservationId) -> Result<Option<Reservation>, StoreError> {
        (**self).get_reservation(id)
    }

    fn scan_stock(&self, scan: &LowStockScan) -> Result<Vec<StockRecord>, StoreError> {
        (**self).scan_stock(scan)
    }

    fn scan_expired_reservations(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Reservation>, StoreError> {
        (**self).scan_expired_reservations(now, limit)
    }
}
