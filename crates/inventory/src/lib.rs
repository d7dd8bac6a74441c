//! Inventory reservation domain.
//!
//! Stock ledgers, reservations and their lifecycle, and the low-stock
//! pagination codec, implemented as deterministic domain logic (no IO, no
//! storage). The engine in `stockhold-infra` runs these rules inside store
//! transactions.

pub mod commands;
pub mod pagination;
pub mod reservation;
pub mod stock;

pub use commands::{CommitReservation, ConfigureSafetyStock, LowStockQuery, ReleaseReservation};
pub use pagination::{
    clamp_page_size, LowStockFilter, LowStockPage, LowStockScan, StockCursor, DEFAULT_PAGE_SIZE,
    MAX_PAGE_SIZE,
};
pub use reservation::{NewReservation, Reservation, ReservationLine, ReservationStatus};
pub use stock::StockRecord;
