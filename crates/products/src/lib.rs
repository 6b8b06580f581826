//! Products module: the product/service catalog and stock statement.
//!
//! Pure domain logic only: no IO, no HTTP, no storage.

pub mod product;
pub mod stock;

pub use product::{NewProduct, Product, ProductId, ProductKind, ProductPatch, ProductStatus, TradeSide};
pub use stock::{StockLine, StockMovement, StockStatement};
