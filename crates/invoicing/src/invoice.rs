use core::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use ledgerly_core::{DomainError, DomainResult, EntityId, Money, PaymentStatus};
use ledgerly_parties::ContactId;
use ledgerly_products::TradeSide;
use ledgerly_tax::DocumentTotals;

use crate::line::DocumentLine;

ledgerly_core::entity_id!(InvoiceId, "invoice id");

/// Customer invoices and vendor bills share one document model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceKind {
    CustomerInvoice,
    VendorBill,
}

impl InvoiceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceKind::CustomerInvoice => "customer_invoice",
            InvoiceKind::VendorBill => "vendor_bill",
        }
    }

    pub fn side(&self) -> TradeSide {
        match self {
            InvoiceKind::CustomerInvoice => TradeSide::Sales,
            InvoiceKind::VendorBill => TradeSide::Purchase,
        }
    }

    /// Prefix of the human-readable document number.
    pub fn number_prefix(&self) -> &'static str {
        match self {
            InvoiceKind::CustomerInvoice => "INV",
            InvoiceKind::VendorBill => "BILL",
        }
    }
}

impl FromStr for InvoiceKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer_invoice" => Ok(InvoiceKind::CustomerInvoice),
            "vendor_bill" => Ok(InvoiceKind::VendorBill),
            other => Err(DomainError::invalid_id(format!("unknown invoice kind: {other}"))),
        }
    }
}

/// Invoice status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Draft,
    Confirmed,
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Confirmed => "confirmed",
            InvoiceStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for InvoiceStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "draft" => Ok(InvoiceStatus::Draft),
            "confirmed" => Ok(InvoiceStatus::Confirmed),
            "cancelled" => Ok(InvoiceStatus::Cancelled),
            other => Err(DomainError::invalid_id(format!("unknown invoice status: {other}"))),
        }
    }
}

/// Header fields supplied when drafting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceHeader {
    pub partner_id: ContactId,
    pub invoice_date: NaiveDate,
    /// Defaults to the invoice date.
    pub due_date: Option<NaiveDate>,
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvoiceHeaderPatch {
    pub partner_id: Option<ContactId>,
    pub invoice_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub reference: Option<String>,
}

/// Customer invoice or vendor bill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoice {
    pub id: InvoiceId,
    pub kind: InvoiceKind,
    pub number: String,
    pub partner_id: ContactId,
    /// Purchase or sales order this document was converted from.
    pub source_order_id: Option<EntityId>,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub reference: Option<String>,
    pub status: InvoiceStatus,
    pub payment_status: PaymentStatus,
    pub lines: Vec<DocumentLine>,
    pub totals: DocumentTotals,
    pub amount_paid: Money,
}

impl Invoice {
    pub fn draft(
        id: InvoiceId,
        kind: InvoiceKind,
        number: String,
        header: InvoiceHeader,
        lines: Vec<DocumentLine>,
        source_order_id: Option<EntityId>,
    ) -> DomainResult<Self> {
        let due_date = header.due_date.unwrap_or(header.invoice_date);
        let mut invoice = Self {
            id,
            kind,
            number,
            partner_id: header.partner_id,
            source_order_id,
            invoice_date: header.invoice_date,
            due_date,
            reference: clean(header.reference),
            status: InvoiceStatus::Draft,
            payment_status: PaymentStatus::Unpaid,
            lines: Vec::new(),
            totals: DocumentTotals::default(),
            amount_paid: Money::ZERO,
        };
        invoice.check_dates()?;
        invoice.set_lines(lines)?;
        Ok(invoice)
    }

    pub fn replace_lines(&mut self, lines: Vec<DocumentLine>) -> DomainResult<()> {
        self.ensure_draft("lines")?;
        self.set_lines(lines)
    }

    pub fn update_header(&mut self, patch: InvoiceHeaderPatch) -> DomainResult<()> {
        self.ensure_draft("header")?;

        let mut next = self.clone();
        if let Some(partner_id) = patch.partner_id {
            next.partner_id = partner_id;
        }
        if let Some(date) = patch.invoice_date {
            next.invoice_date = date;
        }
        if let Some(date) = patch.due_date {
            next.due_date = date;
        }
        if patch.reference.is_some() {
            next.reference = clean(patch.reference);
        }
        next.check_dates()?;

        *self = next;
        Ok(())
    }

    pub fn confirm(&mut self) -> DomainResult<()> {
        match self.status {
            InvoiceStatus::Draft => {}
            InvoiceStatus::Confirmed => {
                return Err(DomainError::conflict(format!("{} is already confirmed", self.number)));
            }
            InvoiceStatus::Cancelled => {
                return Err(DomainError::invariant(format!("{} is cancelled", self.number)));
            }
        }
        if self.lines.is_empty() {
            return Err(DomainError::validation("cannot confirm a document without lines"));
        }
        if !self.totals.total.is_positive() {
            return Err(DomainError::validation("document total must be positive"));
        }

        self.status = InvoiceStatus::Confirmed;
        Ok(())
    }

    /// Cancel a draft or an unpaid confirmed document.
    ///
    /// Returns `true` when the document had been posted and needs a reversing entry.
    pub fn cancel(&mut self) -> DomainResult<bool> {
        let was_posted = match self.status {
            InvoiceStatus::Draft => false,
            InvoiceStatus::Confirmed => true,
            InvoiceStatus::Cancelled => {
                return Err(DomainError::conflict(format!("{} is already cancelled", self.number)));
            }
        };
        if !self.amount_paid.is_zero() {
            return Err(DomainError::invariant(format!(
                "{} has payments registered and cannot be cancelled",
                self.number
            )));
        }

        self.status = InvoiceStatus::Cancelled;
        Ok(was_posted)
    }

    /// Apply a payment and return the new settlement state.
    pub fn register_payment(&mut self, amount: Money) -> DomainResult<PaymentStatus> {
        if self.status != InvoiceStatus::Confirmed {
            return Err(DomainError::invariant(format!(
                "payments can only be registered on confirmed documents ({} is {})",
                self.number,
                self.status.as_str()
            )));
        }
        if !amount.is_positive() {
            return Err(DomainError::validation("payment amount must be positive"));
        }
        if amount > self.outstanding() {
            return Err(DomainError::validation(format!(
                "payment {amount} exceeds outstanding amount {}",
                self.outstanding()
            )));
        }

        self.amount_paid += amount;
        self.payment_status = PaymentStatus::from_amounts(self.amount_paid, self.totals.total);
        Ok(self.payment_status)
    }

    pub fn outstanding(&self) -> Money {
        self.totals.total - self.amount_paid
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status == InvoiceStatus::Confirmed
            && self.payment_status != PaymentStatus::Paid
            && self.due_date < today
    }

    fn set_lines(&mut self, lines: Vec<DocumentLine>) -> DomainResult<()> {
        let totals = DocumentTotals::sum(lines.iter().map(|l| &l.amounts))?;
        self.lines = lines
            .iter()
            .enumerate()
            .map(|(i, line)| line.renumbered(i as u32 + 1))
            .collect();
        self.totals = totals;
        Ok(())
    }

    fn ensure_draft(&self, what: &str) -> DomainResult<()> {
        if self.status != InvoiceStatus::Draft {
            return Err(DomainError::invariant(format!(
                "{what} of {} cannot change once it is {}",
                self.number,
                self.status.as_str()
            )));
        }
        Ok(())
    }

    fn check_dates(&self) -> DomainResult<()> {
        if self.due_date < self.invoice_date {
            return Err(DomainError::validation("due date cannot be before the invoice date"));
        }
        Ok(())
    }
}

fn clean(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
