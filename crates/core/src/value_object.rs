//! Value object trait: equality by value, not identity.
//!
//! Reservation lines and pagination cursors are value objects: two lines for
//! the same SKU and quantity are interchangeable, and a cursor is nothing more
//! than the sort-key values it carries.

/// Marker trait for value objects.
///
/// The trait requires:
/// - **Clone**: value objects are copied freely (into transaction buffers,
///   tokens, responses)
/// - **PartialEq**: compared by attribute values
/// - **Debug**: shows up in logs and test failures
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
