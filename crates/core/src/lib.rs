//! `stockhold-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, the error taxonomy, and the injectable clock.

pub mod clock;
pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use clock::{Clock, FixedClock, SystemClock};
pub use entity::Entity;
pub use error::{ErrorKind, InventoryError, InventoryResult};
pub use id::{ReservationId, Sku};
pub use value_object::ValueObject;
