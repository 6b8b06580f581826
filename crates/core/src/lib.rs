//! `ledgerly-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, money, document status enums and pagination.

pub mod error;
pub mod id;
pub mod money;
pub mod pagination;
pub mod status;

pub use error::{DomainError, DomainResult};
pub use id::{EntityId, UserId};
pub use money::Money;
pub use pagination::{Page, PageRequest};
pub use status::{OrderStatus, PaymentStatus};
