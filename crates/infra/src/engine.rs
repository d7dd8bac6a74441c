//! Inventory reservation engine (application-level orchestration).
//!
//! Each mutating operation is exactly one call into the store's transaction
//! primitive:
//!
//! ```text
//! reserve  : check id unused -> hold every line        -> create reservation
//! commit   : load reserved   -> consume every line     -> mark committed
//! release  : load reserved   -> unhold every line      -> mark released
//! configure: read-or-default stock -> apply settings   -> write stock
//! ```
//!
//! Transaction bodies only read and write through the transaction, so the
//! store may re-run them on conflict. `now` is taken once per call, before
//! the transaction, so every attempt stamps the same time. Low-stock listing
//! and lookups are plain reads.

use serde::Serialize;
use tracing::{debug, info, instrument};

use stockhold_core::{Clock, InventoryError, InventoryResult, ReservationId, Sku, SystemClock};
use stockhold_inventory::{
    clamp_page_size, CommitReservation, ConfigureSafetyStock, LowStockFilter, LowStockPage,
    LowStockQuery, LowStockScan, NewReservation, ReleaseReservation, Reservation, StockCursor,
    StockRecord,
};

use crate::config::EngineConfig;
use crate::store::{CallContext, InMemoryStore, Transaction, TransactionalStore};

/// A reservation after a state change, plus the post-update ledger of every
/// SKU it touched (first-touch order, one entry per SKU).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationOutcome {
    pub reservation: Reservation,
    pub stocks: Vec<StockRecord>,
}

impl ReservationOutcome {
    pub fn stock(&self, sku: &str) -> Option<&StockRecord> {
        self.stocks.iter().find(|s| s.sku().as_str() == sku)
    }
}

/// Orchestrates reservations over a [`TransactionalStore`].
///
/// Holds no locks and no mutable state of its own; share it behind an `Arc`
/// and call it from as many threads as needed.
#[derive(Debug)]
pub struct InventoryEngine<S, C = SystemClock> {
    store: S,
    clock: C,
    config: EngineConfig,
}

impl InventoryEngine<InMemoryStore, SystemClock> {
    /// In-memory engine on the wall clock.
    pub fn in_memory(config: EngineConfig) -> Self {
        Self::new(InMemoryStore::from_config(&config), SystemClock).with_config(config)
    }
}

impl<S, C> InventoryEngine<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self {
            store,
            clock,
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn into_parts(self) -> (S, C) {
        (self.store, self.clock)
    }
}

#[derive(Debug, Copy, Clone)]
enum Settlement<'a> {
    Commit { order_ref: Option<&'a str> },
    Release { reason: Option<&'a str> },
}

impl Settlement<'_> {
    fn name(&self) -> &'static str {
        match self {
            Settlement::Commit { .. } => "commit",
            Settlement::Release { .. } => "release",
        }
    }
}

impl<S, C> InventoryEngine<S, C>
where
    S: TransactionalStore,
    C: Clock,
{
    /// Hold stock for every line of a new reservation, all or nothing.
    #[instrument(skip_all, fields(reservation_id = %request.id, lines = request.lines.len()))]
    pub fn reserve(
        &self,
        ctx: &CallContext,
        request: NewReservation,
    ) -> InventoryResult<ReservationOutcome> {
        request.validate()?;
        let now = self.clock.now();

        let outcome = self
            .store
            .run_in_transaction(ctx, |tx| {
                if tx.get_reservation(&request.id)?.is_some() {
                    return Err(InventoryError::invalid_state(format!(
                        "reservation {} already exists",
                        request.id
                    )));
                }

                let mut touched = TouchedStocks::default();
                for line in &request.lines {
                    let mut stock = load_stock(tx, &line.sku)?;
                    stock.hold(line.quantity, now)?;
                    tx.put_stock(stock.clone())?;
                    touched.record(stock);
                }

                let reservation = request.clone().into_reservation(now);
                tx.create_reservation(reservation.clone())?;
                Ok(ReservationOutcome {
                    reservation,
                    stocks: touched.into_vec(),
                })
            })
            .inspect_err(|e| debug!(error = %e, "reserve rejected"))?;

        info!(skus = outcome.stocks.len(), "reservation created");
        Ok(outcome)
    }

    /// Consume a reservation's held stock (the only path that lowers `on_hand`).
    #[instrument(skip_all, fields(reservation_id = %cmd.reservation_id))]
    pub fn commit(
        &self,
        ctx: &CallContext,
        cmd: CommitReservation,
    ) -> InventoryResult<ReservationOutcome> {
        cmd.validate()?;
        self.settle(
            ctx,
            &cmd.reservation_id,
            Settlement::Commit {
                order_ref: cmd.order_ref.as_deref(),
            },
        )
    }

    /// Return a reservation's held stock to availability.
    #[instrument(skip_all, fields(reservation_id = %cmd.reservation_id))]
    pub fn release(
        &self,
        ctx: &CallContext,
        cmd: ReleaseReservation,
    ) -> InventoryResult<ReservationOutcome> {
        cmd.validate()?;
        self.settle(
            ctx,
            &cmd.reservation_id,
            Settlement::Release {
                reason: cmd.reason.as_deref(),
            },
        )
    }

    fn settle(
        &self,
        ctx: &CallContext,
        id: &ReservationId,
        settlement: Settlement<'_>,
    ) -> InventoryResult<ReservationOutcome> {
        let now = self.clock.now();

        let outcome = self
            .store
            .run_in_transaction(ctx, |tx| {
                let mut reservation = tx
                    .get_reservation(id)?
                    .ok_or_else(|| InventoryError::ReservationNotFound(id.clone()))?;
                reservation.ensure_reserved()?;
                if let Settlement::Commit { order_ref } = settlement {
                    reservation.ensure_order_ref(order_ref)?;
                }

                let mut touched = TouchedStocks::default();
                for line in reservation.lines() {
                    let mut stock = load_stock(tx, &line.sku)?;
                    match settlement {
                        Settlement::Commit { .. } => stock.consume(line.quantity, now)?,
                        Settlement::Release { .. } => stock.unhold(line.quantity, now)?,
                    }
                    tx.put_stock(stock.clone())?;
                    touched.record(stock);
                }

                match settlement {
                    Settlement::Commit { .. } => reservation.mark_committed(now)?,
                    Settlement::Release { reason } => {
                        reservation.mark_released(reason.map(str::to_string), now)?
                    }
                }
                tx.update_reservation(reservation.clone())?;
                Ok(ReservationOutcome {
                    reservation,
                    stocks: touched.into_vec(),
                })
            })
            .inspect_err(|e| debug!(error = %e, operation = settlement.name(), "settlement rejected"))?;

        info!(
            operation = settlement.name(),
            status = %outcome.reservation.status(),
            "reservation settled"
        );
        Ok(outcome)
    }

    /// Create or update a SKU's ledger entry.
    ///
    /// `initial_on_hand` overwrites the physical count; it does not adjust
    /// held stock and is rejected if it would drop below it.
    #[instrument(skip_all, fields(sku = %cmd.sku))]
    pub fn configure_safety_stock(
        &self,
        ctx: &CallContext,
        cmd: ConfigureSafetyStock,
    ) -> InventoryResult<StockRecord> {
        cmd.validate()?;
        let now = self.clock.now();

        let record = self.store.run_in_transaction(ctx, |tx| {
            let mut stock = tx
                .get_stock(&cmd.sku)?
                .unwrap_or_else(|| StockRecord::new(cmd.sku.clone(), now));
            stock.configure(
                cmd.product_ref.as_deref(),
                cmd.safety_stock,
                cmd.initial_on_hand,
                now,
            )?;
            tx.put_stock(stock.clone())?;
            Ok(stock)
        })?;

        info!(
            safety_stock = record.safety_stock(),
            on_hand = record.on_hand(),
            "safety stock configured"
        );
        Ok(record)
    }

    pub fn get_reservation(&self, id: &ReservationId) -> InventoryResult<Reservation> {
        self.store
            .get_reservation(id)?
            .ok_or_else(|| InventoryError::ReservationNotFound(id.clone()))
    }

    pub fn get_stock(&self, sku: &Sku) -> InventoryResult<StockRecord> {
        self.store
            .get_stock(sku)?
            .ok_or_else(|| InventoryError::StockNotFound(sku.clone()))
    }

    /// One page of low-stock records (keyset pagination).
    #[instrument(skip_all, fields(threshold = ?query.threshold))]
    pub fn list_low_stock(&self, query: &LowStockQuery) -> InventoryResult<LowStockPage> {
        let page_size = clamp_page_size(
            query.page_size,
            self.config.default_page_size,
            self.config.max_page_size,
        );
        let start_after = query
            .page_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .map(StockCursor::decode)
            .transpose()?;

        let scan = LowStockScan {
            filter: LowStockFilter::from_threshold(query.threshold),
            start_after,
            limit: page_size.saturating_add(1),
        };
        let rows = self.store.scan_stock(&scan)?;
        debug!(rows = rows.len(), page_size, "low stock scanned");
        Ok(LowStockPage::from_rows(rows, page_size))
    }

    /// Open reservations whose advisory expiry has passed, oldest first.
    ///
    /// Listing only; callers decide whether to release them.
    pub fn list_expired_reservations(&self, limit: Option<usize>) -> InventoryResult<Vec<Reservation>> {
        let limit = clamp_page_size(limit, self.config.default_page_size, self.config.max_page_size);
        Ok(self.store.scan_expired_reservations(self.clock.now(), limit)?)
    }
}

fn load_stock(tx: &mut dyn Transaction, sku: &Sku) -> InventoryResult<StockRecord> {
    tx.get_stock(sku)?
        .ok_or_else(|| InventoryError::StockNotFound(sku.clone()))
}

/// Latest state per SKU, in first-touch order.
#[derive(Default)]
struct TouchedStocks {
    records: Vec<StockRecord>,
}

impl TouchedStocks {
    fn record(&mut self, stock: StockRecord) {
        match self.records.iter_mut().find(|r| r.sku() == stock.sku()) {
            Some(existing) => *existing = stock,
            None => self.records.push(stock),
        }
    }

    fn into_vec(self) -> Vec<StockRecord> {
        self.records
    }
}
