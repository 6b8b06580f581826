//! Parties module: the contact master (customers, vendors, or both).
//!
//! Pure domain logic only: no IO, no HTTP, no storage.

pub mod contact;

pub use contact::{Contact, ContactId, ContactInfo, ContactKind, ContactPatch, ContactStatus, NewContact};
