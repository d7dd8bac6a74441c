//! Caller inputs for the engine operations other than reserve.

use serde::{Deserialize, Serialize};

use stockhold_core::{InventoryError, InventoryResult, ReservationId, Sku};

/// Command: CommitReservation (consume held stock).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitReservation {
    pub reservation_id: ReservationId,
    /// When set, must match the reservation's order reference.
    #[serde(default)]
    pub order_ref: Option<String>,
}

impl CommitReservation {
    pub fn new(reservation_id: impl Into<ReservationId>) -> Self {
        Self {
            reservation_id: reservation_id.into(),
            order_ref: None,
        }
    }

    pub fn with_order_ref(mut self, order_ref: impl Into<String>) -> Self {
        self.order_ref = Some(order_ref.into());
        self
    }

    pub fn validate(&self) -> InventoryResult<()> {
        if self.reservation_id.is_blank() {
            return Err(InventoryError::invalid_input("reservation id is required"));
        }
        Ok(())
    }
}

/// Command: ReleaseReservation (return held stock).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseReservation {
    pub reservation_id: ReservationId,
    #[serde(default)]
    pub reason: Option<String>,
}

impl ReleaseReservation {
    pub fn new(reservation_id: impl Into<ReservationId>) -> Self {
        Self {
            reservation_id: reservation_id.into(),
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn validate(&self) -> InventoryResult<()> {
        if self.reservation_id.is_blank() {
            return Err(InventoryError::invalid_input("reservation id is required"));
        }
        Ok(())
    }
}

/// Command: ConfigureSafetyStock (create or update a ledger entry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigureSafetyStock {
    pub sku: Sku,
    #[serde(default)]
    pub product_ref: Option<String>,
    pub safety_stock: i64,
    /// Overwrites `on_hand` when set; `reserved` is left alone.
    #[serde(default)]
    pub initial_on_hand: Option<i64>,
}

impl ConfigureSafetyStock {
    pub fn new(sku: impl Into<Sku>, safety_stock: i64) -> Self {
        Self {
            sku: sku.into(),
            product_ref: None,
            safety_stock,
            initial_on_hand: None,
        }
    }

    pub fn with_product_ref(mut self, product_ref: impl Into<String>) -> Self {
        self.product_ref = Some(product_ref.into());
        self
    }

    pub fn with_initial_on_hand(mut self, on_hand: i64) -> Self {
        self.initial_on_hand = Some(on_hand);
        self
    }

    pub fn validate(&self) -> InventoryResult<()> {
        if self.sku.is_blank() {
            return Err(InventoryError::invalid_input("sku is required"));
        }
        if self.safety_stock < 0 {
            return Err(InventoryError::invalid_input("safety stock cannot be negative"));
        }
        if self.initial_on_hand.is_some_and(|v| v < 0) {
            return Err(InventoryError::invalid_input("initial on hand cannot be negative"));
        }
        Ok(())
    }
}

/// Query: ListLowStock.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LowStockQuery {
    /// `Some(t)` with `t > 0` selects `available <= t`; otherwise the
    /// safety-stock breach path is used.
    #[serde(default)]
    pub threshold: Option<i64>,
    #[serde(default)]
    pub page_size: Option<usize>,
    #[serde(default)]
    pub page_token: Option<String>,
}

impl LowStockQuery {
    pub fn below_safety_stock() -> Self {
        Self::default()
    }

    pub fn at_or_below(threshold: i64) -> Self {
        Self {
            threshold: Some(threshold),
            ..Self::default()
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn with_page_token(mut self, token: impl Into<String>) -> Self {
        self.page_token = Some(token.into());
        self
    }
}
