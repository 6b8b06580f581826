//! SQLite repositories.
//!
//! Every function takes `&mut SqliteConnection`, so the same call works on a
//! pooled connection and inside an open transaction:
//!
//! ```rust,ignore
//! let mut tx = db.begin().await?;
//! invoices::update(&mut tx, &invoice).await?;
//! ledger::insert_entry(&mut tx, &entry).await?;
//! tx.commit().await?;
//! ```
//!
//! Rows are decoded into `*Row` structs (`sqlx::FromRow`) and converted into
//! domain values through `parse`. Single-table rows implement `TryFrom`;
//! document headers (`into_invoice`, `into_order`, `into_entry`) take their
//! already-loaded lines as a second argument. Either way a bad enum literal or
//! id surfaces as `StoreError::Corrupt` instead of a panic.

use core::str::FromStr;

use sqlx::{QueryBuilder, Sqlite};

use ledgerly_core::DomainError;

use crate::error::StoreResult;

pub mod accounts;
pub mod contacts;
pub mod invoices;
pub mod ledger;
pub mod lines;
pub mod payments;
pub mod products;
pub mod purchase_orders;
pub mod reports;
pub mod sales_orders;
pub mod sequences;
pub mod taxes;
pub mod users;

pub(crate) fn parse<T>(raw: &str) -> StoreResult<T>
where
    T: FromStr<Err = DomainError>,
{
    Ok(raw.parse()?)
}

pub(crate) fn parse_opt<T>(raw: Option<&str>) -> StoreResult<Option<T>>
where
    T: FromStr<Err = DomainError>,
{
    raw.map(parse).transpose()
}

/// Case-insensitive `LIKE` on one or more columns.
pub(crate) fn push_search<'a>(qb: &mut QueryBuilder<'a, Sqlite>, columns: &[&str], term: &str) {
    let pattern = format!("%{}%", term.trim().to_lowercase());
    qb.push(" AND (");
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            qb.push(" OR ");
        }
        qb.push(format!("lower(COALESCE({column}, '')) LIKE "));
        qb.push_bind(pattern.clone());
    }
    qb.push(")");
}
