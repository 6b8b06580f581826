use core::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use ledgerly_core::{DomainError, DomainResult, EntityId, Money};
use ledgerly_parties::ContactId;

ledgerly_core::entity_id!(JournalEntryId, "journal entry id");

/// What produced a journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntrySource {
    Manual,
    CustomerInvoice,
    VendorBill,
    Payment,
    Reversal,
}

impl EntrySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntrySource::Manual => "manual",
            EntrySource::CustomerInvoice => "customer_invoice",
            EntrySource::VendorBill => "vendor_bill",
            EntrySource::Payment => "payment",
            EntrySource::Reversal => "reversal",
        }
    }
}

impl FromStr for EntrySource {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(EntrySource::Manual),
            "customer_invoice" => Ok(EntrySource::CustomerInvoice),
            "vendor_bill" => Ok(EntrySource::VendorBill),
            "payment" => Ok(EntrySource::Payment),
            "reversal" => Ok(EntrySource::Reversal),
            other => Err(DomainError::invalid_id(format!("unknown entry source: {other}"))),
        }
    }
}

/// One side of a journal entry. Exactly one of `debit` / `credit` is positive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLine {
    pub account_code: String,
    #[serde(default)]
    pub partner_id: Option<ContactId>,
    #[serde(default)]
    pub debit: Money,
    #[serde(default)]
    pub credit: Money,
}

impl JournalLine {
    pub fn debit(account_code: &str, amount: Money) -> Self {
        Self {
            account_code: account_code.to_string(),
            partner_id: None,
            debit: amount,
            credit: Money::ZERO,
        }
    }

    pub fn credit(account_code: &str, amount: Money) -> Self {
        Self {
            account_code: account_code.to_string(),
            partner_id: None,
            debit: Money::ZERO,
            credit: amount,
        }
    }

    pub fn for_partner(mut self, partner_id: ContactId) -> Self {
        self.partner_id = Some(partner_id);
        self
    }

    fn swapped(&self) -> Self {
        Self {
            account_code: self.account_code.clone(),
            partner_id: self.partner_id,
            debit: self.credit,
            credit: self.debit,
        }
    }
}

/// Double-entry journal entry (immutable once posted).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JournalEntry {
    pub id: JournalEntryId,
    pub number: String,
    pub entry_date: NaiveDate,
    pub reference: Option<String>,
    pub description: Option<String>,
    pub source: EntrySource,
    /// Document (invoice, bill or payment) the entry was posted for.
    pub source_id: Option<EntityId>,
    pub lines: Vec<JournalLine>,
}

/// Header of an entry that is about to be posted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryHeader {
    pub id: JournalEntryId,
    pub number: String,
    pub entry_date: NaiveDate,
    pub reference: Option<String>,
    pub description: Option<String>,
}

impl JournalEntry {
    pub fn new(
        header: EntryHeader,
        source: EntrySource,
        source_id: Option<EntityId>,
        lines: Vec<JournalLine>,
    ) -> DomainResult<Self> {
        let entry = Self {
            id: header.id,
            number: header.number,
            entry_date: header.entry_date,
            reference: header.reference,
            description: header.description,
            source,
            source_id,
            lines,
        };
        entry.validate()?;
        Ok(entry)
    }

    pub fn total_debit(&self) -> Money {
        self.lines.iter().map(|l| l.debit).sum()
    }

    pub fn total_credit(&self) -> Money {
        self.lines.iter().map(|l| l.credit).sum()
    }

    /// Entry that cancels this one: same accounts, sides swapped.
    pub fn reversal(&self, header: EntryHeader) -> DomainResult<Self> {
        let description = header
            .description
            .or_else(|| Some(format!("Reversal of {}", self.number)));
        Self::new(
            EntryHeader { description, ..header },
            EntrySource::Reversal,
            self.source_id,
            self.lines.iter().map(JournalLine::swapped).collect(),
        )
    }

    fn validate(&self) -> DomainResult<()> {
        if self.lines.len() < 2 {
            return Err(DomainError::validation("journal entry needs at least two lines"));
        }

        for line in &self.lines {
            if line.account_code.trim().is_empty() {
                return Err(DomainError::validation("journal line needs an account code"));
            }
            if line.debit.is_negative() || line.credit.is_negative() {
                return Err(DomainError::validation("amount must be positive"));
            }
            if line.debit.is_positive() == line.credit.is_positive() {
                return Err(DomainError::validation(format!(
                    "line on {} must have exactly one of debit or credit",
                    line.account_code
                )));
            }
        }

        let debits = Money::checked_sum(self.lines.iter().map(|l| l.debit))?;
        let credits = Money::checked_sum(self.lines.iter().map(|l| l.credit))?;
        if debits != credits {
            return Err(DomainError::invariant("debits must equal credits"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::codes;
    use proptest::prelude::*;

    fn header(number: &str) -> EntryHeader {
        EntryHeader {
            id: JournalEntryId::generate(),
            number: number.to_string(),
            entry_date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            reference: None,
            description: None,
        }
    }

    #[test]
    fn balanced_entry_is_accepted() {
        let entry = JournalEntry::new(
            header("JE-00001"),
            EntrySource::Manual,
            None,
            vec![
                JournalLine::debit(codes::CASH, Money::from_minor(100)),
                JournalLine::credit(codes::OWNERS_EQUITY, Money::from_minor(100)),
            ],
        )
        .unwrap();
        assert_eq!(entry.total_debit(), entry.total_credit());
    }

    #[test]
    fn unbalanced_entry_is_rejected() {
        let err = JournalEntry::new(
            header("JE-00001"),
            EntrySource::Manual,
            None,
            vec![
                JournalLine::debit(codes::CASH, Money::from_minor(100)),
                JournalLine::credit(codes::ACCOUNTS_PAYABLE, Money::from_minor(90)),
            ],
        )
        .unwrap_err();
        match err {
            DomainError::InvariantViolation(msg) if msg.contains("debits must equal credits") => {}
            _ => panic!("Expected invariant violation for unbalanced entry"),
        }
    }

    #[test]
    fn lines_need_exactly_one_side() {
        let both = JournalLine {
            account_code: codes::CASH.to_string(),
            partner_id: None,
            debit: Money::from_minor(5),
            credit: Money::from_minor(5),
        };
        let err = JournalEntry::new(
            header("JE-00001"),
            EntrySource::Manual,
            None,
            vec![both.clone(), both],
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let single = vec![JournalLine::debit(codes::CASH, Money::from_minor(5))];
        assert!(JournalEntry::new(header("JE-00002"), EntrySource::Manual, None, single).is_err());
    }

    #[test]
    fn reversal_swaps_sides() {
        let partner = ContactId::generate();
        let entry = JournalEntry::new(
            header("JE-00001"),
            EntrySource::CustomerInvoice,
            Some(EntityId::new()),
            vec![
                JournalLine::debit(codes::ACCOUNTS_RECEIVABLE, Money::from_minor(118)).for_partner(partner),
                JournalLine::credit(codes::SALES_INCOME, Money::from_minor(100)),
                JournalLine::credit(codes::OUTPUT_TAX, Money::from_minor(18)),
            ],
        )
        .unwrap();

        let reversal = entry.reversal(header("JE-00002")).unwrap();
        assert_eq!(reversal.source, EntrySource::Reversal);
        assert_eq!(reversal.source_id, entry.source_id);
        assert_eq!(reversal.description.as_deref(), Some("Reversal of JE-00001"));
        assert_eq!(reversal.lines[0].credit, Money::from_minor(118));
        assert_eq!(reversal.lines[0].partner_id, Some(partner));
        assert_eq!(reversal.lines[1].debit, Money::from_minor(100));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: an entry and its reversal net every account to zero.
        #[test]
        fn entry_plus_reversal_nets_to_zero(
            amounts in prop::collection::vec(1i64..1_000_000i64, 1..10)
        ) {
            let mut lines: Vec<JournalLine> = amounts
                .iter()
                .map(|a| JournalLine::debit(codes::PURCHASE_EXPENSE, Money::from_minor(*a)))
                .collect();
            let total: Money = amounts.iter().copied().map(Money::from_minor).sum();
            lines.push(JournalLine::credit(codes::ACCOUNTS_PAYABLE, total));

            let entry = JournalEntry::new(header("JE-1"), EntrySource::VendorBill, None, lines).unwrap();
            let reversal = entry.reversal(header("JE-2")).unwrap();

            let net: i128 = entry
                .lines
                .iter()
                .chain(reversal.lines.iter())
                .map(|l| l.debit.minor() as i128 - l.credit.minor() as i128)
                .sum();
            prop_assert_eq!(net, 0);
            prop_assert_eq!(reversal.total_debit(), entry.total_credit());
        }
    }
}
