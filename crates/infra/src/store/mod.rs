//! Transactional store boundary.
//!
//! Two keyed collections (stock records by SKU, reservations by id) behind
//! one atomic multi-key transaction primitive. The engine never locks
//! anything itself; every invariant it relies on comes from the contract on
//! [`TransactionalStore`].

mod collection;
pub mod context;
pub mod in_memory;
pub mod r#trait;

pub use context::{CallContext, CancelHandle};
pub use in_memory::InMemoryStore;
pub use r#trait::{StoreError, Transaction, TransactionalStore};
