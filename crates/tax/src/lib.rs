//! Tax module (GST-style percentage and fixed-value taxes).
//!
//! Pure domain logic only: the tax master record and the arithmetic that turns
//! quantities, prices and taxes into line and document totals.

pub mod tax;
pub mod totals;

pub use tax::{NewTax, Tax, TaxComputation, TaxId, TaxPatch, TaxRule, TaxScope};
pub use totals::{DocumentTotals, LineAmounts};
