//! Domain error model.

use thiserror::Error;

use crate::id::{ReservationId, Sku};

/// Result type used across the inventory engine.
pub type InventoryResult<T> = Result<T, InventoryError>;

/// Error surfaced to callers of the inventory engine.
///
/// Business-rule variants carry only domain detail (never store internals) so
/// callers can branch on [`InventoryError::kind`] alone.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InventoryError {
    /// Malformed request (missing id/sku, non-positive quantity, negative stock level).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The referenced SKU has no ledger record.
    #[error("stock record not found: {0}")]
    StockNotFound(Sku),

    /// Requested quantity exceeds what is currently available.
    #[error("insufficient stock for {sku}: requested {requested}, available {available}")]
    InsufficientStock {
        sku: Sku,
        requested: i64,
        available: i64,
    },

    /// The referenced reservation does not exist.
    #[error("reservation not found: {0}")]
    ReservationNotFound(ReservationId),

    /// The operation is illegal for the reservation's current state.
    #[error("invalid reservation state: {0}")]
    InvalidReservationState(String),

    /// The call was cancelled or ran past its deadline; nothing was applied.
    #[error("operation cancelled: {0}")]
    Cancelled(String),

    /// Unrecognised failure of the underlying store.
    #[error("unknown store failure: {0}")]
    Unknown(String),
}

/// Fieldless discriminant of [`InventoryError`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInput,
    StockNotFound,
    InsufficientStock,
    ReservationNotFound,
    InvalidReservationState,
    Cancelled,
    Unknown,
}

impl InventoryError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidReservationState(msg.into())
    }

    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::Cancelled(msg.into())
    }

    pub fn unknown(msg: impl Into<String>) -> Self {
        Self::Unknown(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::StockNotFound(_) => ErrorKind::StockNotFound,
            Self::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            Self::ReservationNotFound(_) => ErrorKind::ReservationNotFound,
            Self::InvalidReservationState(_) => ErrorKind::InvalidReservationState,
            Self::Cancelled(_) => ErrorKind::Cancelled,
            Self::Unknown(_) => ErrorKind::Unknown,
        }
    }
}
