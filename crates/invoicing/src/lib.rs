//! Invoicing domain module.
//!
//! Priced document lines, customer invoices, vendor bills and the payments
//! registered against them. Pure domain logic only: no IO, no HTTP, no storage.

pub mod invoice;
pub mod line;
pub mod payment;

pub use invoice::{Invoice, InvoiceHeader, InvoiceHeaderPatch, InvoiceId, InvoiceKind, InvoiceStatus};
pub use line::{AppliedTax, DocumentLine, LineDraft};
pub use payment::{NewPayment, Payment, PaymentDirection, PaymentId, PaymentMethod};
