//! Accounting module (chart of accounts, double-entry journal, reports).
//!
//! Pure domain logic only: no IO, no HTTP, no persistence concerns.

pub mod account;
pub mod ledger;
pub mod posting;
pub mod reports;

pub use account::{codes, Account, AccountId, AccountKind, NewAccount};
pub use ledger::{EntryHeader, EntrySource, JournalEntry, JournalEntryId, JournalLine};
pub use posting::{invoice_entry, payment_entry};
pub use reports::{
    AccountBalance, BalanceSheet, PartnerLedger, PartnerLedgerLine, PartnerLedgerRow, ProfitAndLoss,
    ReportLine, ReportSection,
};
