//! Infrastructure layer: SQLite pool, embedded migrations and repositories.
//!
//! Domain crates stay free of IO; everything that touches the database lives here.

pub mod db;
pub mod error;
pub mod migrations;
pub mod repo;

#[cfg(test)]
pub(crate) mod test_support;

pub use db::{Database, DbConfig};
pub use error::{StoreError, StoreResult};
