use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockhold_core::{Entity, InventoryError, InventoryResult, Sku};

/// Per-SKU stock ledger entry.
///
/// Only `on_hand`, `reserved` and `safety_stock` are stored; `available` and
/// `safety_delta` are always derived. Every mutator checks
/// `0 <= reserved <= on_hand` before touching state, so a failed call leaves
/// the record unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "StockDocument", try_from = "StockDocument")]
pub struct StockRecord {
    sku: Sku,
    product_ref: String,
    on_hand: i64,
    reserved: i64,
    safety_stock: i64,
    updated_at: DateTime<Utc>,
}

impl StockRecord {
    /// Empty ledger entry (all counters zero).
    pub fn new(sku: Sku, now: DateTime<Utc>) -> Self {
        Self {
            sku,
            product_ref: String::new(),
            on_hand: 0,
            reserved: 0,
            safety_stock: 0,
            updated_at: now,
        }
    }

    /// Build a record from stored counters, enforcing the ledger invariant.
    pub fn from_parts(
        sku: Sku,
        product_ref: impl Into<String>,
        on_hand: i64,
        reserved: i64,
        safety_stock: i64,
        updated_at: DateTime<Utc>,
    ) -> InventoryResult<Self> {
        if on_hand < 0 || reserved < 0 || safety_stock < 0 {
            return Err(InventoryError::invalid_input(format!(
                "stock counters for {sku} must be non-negative"
            )));
        }
        if reserved > on_hand {
            return Err(InventoryError::invalid_input(format!(
                "reserved ({reserved}) exceeds on hand ({on_hand}) for {sku}"
            )));
        }
        Ok(Self {
            sku,
            product_ref: product_ref.into(),
            on_hand,
            reserved,
            safety_stock,
            updated_at,
        })
    }

    pub fn sku(&self) -> &Sku {
        &self.sku
    }

    pub fn product_ref(&self) -> &str {
        &self.product_ref
    }

    pub fn on_hand(&self) -> i64 {
        self.on_hand
    }

    pub fn reserved(&self) -> i64 {
        self.reserved
    }

    pub fn safety_stock(&self) -> i64 {
        self.safety_stock
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Units that can still be reserved.
    pub fn available(&self) -> i64 {
        self.on_hand - self.reserved
    }

    /// Distance from the safety buffer; negative means low stock.
    pub fn safety_delta(&self) -> i64 {
        self.available() - self.safety_stock
    }

    /// Hold `quantity` units for a reservation.
    pub fn hold(&mut self, quantity: i64, now: DateTime<Utc>) -> InventoryResult<()> {
        let available = self.available();
        if available < quantity {
            return Err(InventoryError::InsufficientStock {
                sku: self.sku.clone(),
                requested: quantity,
                available,
            });
        }
        self.reserved += quantity;
        self.updated_at = now;
        Ok(())
    }

    /// Consume held units: both `reserved` and `on_hand` drop by `quantity`.
    pub fn consume(&mut self, quantity: i64, now: DateTime<Utc>) -> InventoryResult<()> {
        if self.reserved < quantity || self.on_hand < quantity {
            return Err(InventoryError::invalid_state(format!(
                "cannot consume {quantity} of {}: reserved {}, on hand {}",
                self.sku, self.reserved, self.on_hand
            )));
        }
        self.reserved -= quantity;
        self.on_hand -= quantity;
        self.updated_at = now;
        Ok(())
    }

    /// Return held units to availability without touching `on_hand`.
    pub fn unhold(&mut self, quantity: i64, now: DateTime<Utc>) -> InventoryResult<()> {
        if self.reserved < quantity {
            return Err(InventoryError::invalid_state(format!(
                "cannot release {quantity} of {}: only {} reserved",
                self.sku, self.reserved
            )));
        }
        self.reserved -= quantity;
        self.updated_at = now;
        Ok(())
    }

    /// Apply a safety-stock configuration.
    ///
    /// `on_hand` overwrites the physical count without adjusting `reserved`;
    /// it is rejected when it would drop below what is already held.
    pub fn configure(
        &mut self,
        product_ref: Option<&str>,
        safety_stock: i64,
        on_hand: Option<i64>,
        now: DateTime<Utc>,
    ) -> InventoryResult<()> {
        if safety_stock < 0 {
            return Err(InventoryError::invalid_input("safety stock cannot be negative"));
        }
        if let Some(on_hand) = on_hand {
            if on_hand < 0 {
                return Err(InventoryError::invalid_input("on hand cannot be negative"));
            }
            if on_hand < self.reserved {
                return Err(InventoryError::invalid_input(format!(
                    "on hand ({on_hand}) cannot drop below reserved ({}) for {}",
                    self.reserved, self.sku
                )));
            }
            self.on_hand = on_hand;
        }
        if let Some(product_ref) = product_ref {
            self.product_ref = product_ref.to_string();
        }
        self.safety_stock = safety_stock;
        self.updated_at = now;
        Ok(())
    }
}

impl Entity for StockRecord {
    type Id = Sku;

    fn id(&self) -> &Self::Id {
        &self.sku
    }
}

/// Persisted shape: source counters plus the derived values, for readers
/// that only see the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StockDocument {
    sku: Sku,
    product_ref: String,
    on_hand: i64,
    reserved: i64,
    available: i64,
    safety_stock: i64,
    safety_delta: i64,
    updated_at: DateTime<Utc>,
}

impl From<StockRecord> for StockDocument {
    fn from(r: StockRecord) -> Self {
        Self {
            available: r.available(),
            safety_delta: r.safety_delta(),
            sku: r.sku,
            product_ref: r.product_ref,
            on_hand: r.on_hand,
            reserved: r.reserved,
            safety_stock: r.safety_stock,
            updated_at: r.updated_at,
        }
    }
}

impl TryFrom<StockDocument> for StockRecord {
    type Error = InventoryError;

    // Stored derived values are ignored and recomputed.
    fn try_from(d: StockDocument) -> Result<Self, Self::Error> {
        StockRecord::from_parts(
            d.sku,
            d.product_ref,
            d.on_hand,
            d.reserved,
            d.safety_stock,
            d.updated_at,
        )
    }
}
