use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockhold_core::{Entity, InventoryError, InventoryResult, ReservationId, Sku, ValueObject};

/// Reservation status lifecycle.
///
/// `Committed` and `Released` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Reserved,
    Committed,
    Released,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Reserved => "reserved",
            ReservationStatus::Committed => "committed",
            ReservationStatus::Released => "released",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ReservationStatus::Reserved)
    }
}

impl core::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One held line: `quantity` units of `sku`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationLine {
    pub product_ref: String,
    pub sku: Sku,
    pub quantity: i64,
}

impl ReservationLine {
    pub fn new(product_ref: impl Into<String>, sku: impl Into<Sku>, quantity: i64) -> Self {
        Self {
            product_ref: product_ref.into(),
            sku: sku.into(),
            quantity,
        }
    }
}

impl ValueObject for ReservationLine {}

/// Reservation document.
///
/// Created in `Reserved`, mutated in place by commit or release, never
/// deleted. Lifecycle fields are only reachable through the transition
/// methods below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    id: ReservationId,
    order_ref: String,
    user_ref: String,
    status: ReservationStatus,
    lines: Vec<ReservationLine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    idempotency_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    committed_at: Option<DateTime<Utc>>,
    released_at: Option<DateTime<Utc>>,
}

impl Reservation {
    pub fn id(&self) -> &ReservationId {
        &self.id
    }

    pub fn order_ref(&self) -> &str {
        &self.order_ref
    }

    pub fn user_ref(&self) -> &str {
        &self.user_ref
    }

    pub fn status(&self) -> ReservationStatus {
        self.status
    }

    pub fn lines(&self) -> &[ReservationLine] {
        &self.lines
    }

    /// Stored as supplied; never used for lookups.
    pub fn idempotency_key(&self) -> Option<&str> {
        self.idempotency_key.as_deref()
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Advisory only: nothing expires a reservation automatically.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn committed_at(&self) -> Option<DateTime<Utc>> {
        self.committed_at
    }

    pub fn released_at(&self) -> Option<DateTime<Utc>> {
        self.released_at
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.status == ReservationStatus::Reserved && self.expires_at.is_some_and(|at| at <= now)
    }

    /// Fail unless the reservation can still be committed or released.
    pub fn ensure_reserved(&self) -> InventoryResult<()> {
        if self.status != ReservationStatus::Reserved {
            return Err(InventoryError::invalid_state(format!(
                "reservation {} is {}",
                self.id, self.status
            )));
        }
        Ok(())
    }

    /// Cross-check a caller-supplied order reference; blank counts as not supplied.
    pub fn ensure_order_ref(&self, expected: Option<&str>) -> InventoryResult<()> {
        match expected {
            Some(order_ref) if !order_ref.trim().is_empty() && order_ref != self.order_ref => {
                Err(InventoryError::invalid_state(format!(
                    "reservation {} does not belong to order {order_ref}",
                    self.id
                )))
            }
            _ => Ok(()),
        }
    }

    pub fn mark_committed(&mut self, now: DateTime<Utc>) -> InventoryResult<()> {
        self.ensure_reserved()?;
        self.status = ReservationStatus::Committed;
        self.committed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    pub fn mark_released(&mut self, reason: Option<String>, now: DateTime<Utc>) -> InventoryResult<()> {
        self.ensure_reserved()?;
        self.status = ReservationStatus::Released;
        self.released_at = Some(now);
        if let Some(reason) = reason.filter(|r| !r.trim().is_empty()) {
            self.reason = Some(reason);
        }
        self.updated_at = now;
        Ok(())
    }
}

impl Entity for Reservation {
    type Id = ReservationId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Caller input for a new reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReservation {
    pub id: ReservationId,
    #[serde(default)]
    pub order_ref: String,
    #[serde(default)]
    pub user_ref: String,
    pub lines: Vec<ReservationLine>,
    #[serde(default)]
    pub idempotency_key: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// Preserved when supplied; otherwise the reservation time is used.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl NewReservation {
    pub fn new(id: impl Into<ReservationId>, lines: Vec<ReservationLine>) -> Self {
        Self {
            id: id.into(),
            order_ref: String::new(),
            user_ref: String::new(),
            lines,
            idempotency_key: None,
            expires_at: None,
            created_at: None,
        }
    }

    pub fn with_order_ref(mut self, order_ref: impl Into<String>) -> Self {
        self.order_ref = order_ref.into();
        self
    }

    pub fn with_user_ref(mut self, user_ref: impl Into<String>) -> Self {
        self.user_ref = user_ref.into();
        self
    }

    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    pub fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn validate(&self) -> InventoryResult<()> {
        if self.id.is_blank() {
            return Err(InventoryError::invalid_input("reservation id is required"));
        }
        if self.lines.is_empty() {
            return Err(InventoryError::invalid_input("at least one line is required"));
        }
        for (idx, line) in self.lines.iter().enumerate() {
            if line.sku.is_blank() {
                return Err(InventoryError::invalid_input(format!("line {idx}: sku is required")));
            }
            if line.quantity <= 0 {
                return Err(InventoryError::invalid_input(format!(
                    "line {idx}: quantity must be positive (got {})",
                    line.quantity
                )));
            }
        }
        Ok(())
    }

    /// Materialise the reservation document in `Reserved` status.
    pub fn into_reservation(self, now: DateTime<Utc>) -> Reservation {
        Reservation {
            id: self.id,
            order_ref: self.order_ref,
            user_ref: self.user_ref,
            status: ReservationStatus::Reserved,
            lines: self.lines,
            idempotency_key: self.idempotency_key,
            reason: None,
            expires_at: self.expires_at,
            created_at: self.created_at.unwrap_or(now),
            updated_at: now,
            committed_at: None,
            released_at: None,
        }
    }
}
