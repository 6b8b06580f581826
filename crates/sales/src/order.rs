use chrono::NaiveDate;

use ledgerly_core::{DomainError, DomainResult, OrderStatus};
use ledgerly_invoicing::{DocumentLine, Invoice, InvoiceHeader, InvoiceId, InvoiceKind};
use ledgerly_parties::{Contact, ContactId};
use ledgerly_tax::DocumentTotals;

ledgerly_core::entity_id!(SalesOrderId, "sales order id");

/// Sales order taken from a customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesOrder {
    pub id: SalesOrderId,
    pub number: String,
    pub customer_id: ContactId,
    pub order_date: NaiveDate,
    pub reference: Option<String>,
    pub status: OrderStatus,
    pub lines: Vec<DocumentLine>,
    pub totals: DocumentTotals,
    /// Customer invoice created by conversion.
    pub invoice_id: Option<InvoiceId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SalesOrderPatch {
    pub order_date: Option<NaiveDate>,
    pub reference: Option<String>,
    pub lines: Option<Vec<DocumentLine>>,
}

impl SalesOrder {
    pub fn new(
        id: SalesOrderId,
        number: String,
        customer: &Contact,
        order_date: NaiveDate,
        reference: Option<String>,
        lines: Vec<DocumentLine>,
    ) -> DomainResult<Self> {
        customer.ensure_customer()?;

        let mut order = Self {
            id,
            number,
            customer_id: customer.id,
            order_date,
            reference: reference.map(|r| r.trim().to_string()).filter(|r| !r.is_empty()),
            status: OrderStatus::Draft,
            lines: Vec::new(),
            totals: DocumentTotals::default(),
            invoice_id: None,
        };
        order.set_lines(lines)?;
        Ok(order)
    }

    pub fn update(&mut self, customer: Option<&Contact>, patch: SalesOrderPatch) -> DomainResult<()> {
        if !self.status.is_editable() {
            return Err(DomainError::invariant(format!(
                "{} is {} and can no longer be edited",
                self.number,
                self.status.as_str()
            )));
        }
        if let Some(customer) = customer {
            customer.ensure_customer()?;
        }
        if self.status == OrderStatus::Confirmed && patch.lines.as_ref().is_some_and(Vec::is_empty) {
            return Err(DomainError::validation("a confirmed order needs at least one line"));
        }

        // Lines first: totals can still fail, header edits cannot.
        if let Some(lines) = patch.lines {
            self.set_lines(lines)?;
        }
        if let Some(customer) = customer {
            self.customer_id = customer.id;
        }
        if let Some(date) = patch.order_date {
            self.order_date = date;
        }
        if let Some(reference) = patch.reference {
            let reference = reference.trim().to_string();
            self.reference = (!reference.is_empty()).then_some(reference);
        }
        Ok(())
    }

    pub fn confirm(&mut self) -> DomainResult<()> {
        if self.status == OrderStatus::Confirmed {
            return Err(DomainError::conflict(format!("{} is already confirmed", self.number)));
        }
        if self.status != OrderStatus::Draft {
            return Err(DomainError::invariant(format!(
                "{} is {} and cannot be confirmed",
                self.number,
                self.status.as_str()
            )));
        }
        if self.lines.is_empty() {
            return Err(DomainError::validation("cannot confirm an order without lines"));
        }

        self.status = OrderStatus::Confirmed;
        Ok(())
    }

    pub fn cancel(&mut self) -> DomainResult<()> {
        match self.status {
            OrderStatus::Draft | OrderStatus::Confirmed => {
                self.status = OrderStatus::Cancelled;
                Ok(())
            }
            OrderStatus::Cancelled => Err(DomainError::conflict(format!("{} is already cancelled", self.number))),
            OrderStatus::Converted => Err(DomainError::invariant(format!(
                "{} was invoiced and cannot be cancelled",
                self.number
            ))),
        }
    }

    /// Build the draft customer invoice for this order.
    pub fn to_customer_invoice(
        &self,
        invoice_id: InvoiceId,
        invoice_number: String,
        invoice_date: NaiveDate,
        due_date: Option<NaiveDate>,
    ) -> DomainResult<Invoice> {
        self.ensure_invoiceable()?;
        Invoice::draft(
            invoice_id,
            InvoiceKind::CustomerInvoice,
            invoice_number,
            InvoiceHeader {
                partner_id: self.customer_id,
                invoice_date,
                due_date,
                reference: Some(self.number.clone()),
            },
            self.lines.clone(),
            Some(self.id.0),
        )
    }

    pub fn convert(&mut self, invoice_id: InvoiceId) -> DomainResult<()> {
        self.ensure_invoiceable()?;
        self.status = OrderStatus::Converted;
        self.invoice_id = Some(invoice_id);
        Ok(())
    }

    fn ensure_invoiceable(&self) -> DomainResult<()> {
        match self.status {
            OrderStatus::Confirmed => Ok(()),
            OrderStatus::Converted => Err(DomainError::conflict(format!("{} is already invoiced", self.number))),
            other => Err(DomainError::invariant(format!(
                "only confirmed orders can be invoiced ({} is {})",
                self.number,
                other.as_str()
            ))),
        }
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
}
