//! Infrastructure layer: the transactional store boundary, configuration,
//! and the inventory reservation engine that runs on top of them.

pub mod config;
pub mod engine;
pub mod store;

#[cfg(test)]
mod integration_tests;

pub use config::{ConfigError, EngineConfig};
pub use engine::{InventoryEngine, ReservationOutcome};
pub use store::{CallContext, CancelHandle, InMemoryStore, StoreError, Transaction, TransactionalStore};
