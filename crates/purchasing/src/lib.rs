//! Purchasing domain module (purchase orders).
//!
//! This crate contains business rules for purchase orders and their conversion
//! into vendor bills, implemented purely as deterministic domain logic
//! (no IO, no HTTP, no storage).

pub mod order;

pub use order::{PurchaseOrder, PurchaseOrderId, PurchaseOrderPatch};
