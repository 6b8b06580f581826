use chrono::NaiveDate;

use ledgerly_core::{DomainError, DomainResult, OrderStatus};
use ledgerly_invoicing::{DocumentLine, Invoice, InvoiceHeader, InvoiceId, InvoiceKind};
use ledgerly_parties::{Contact, ContactId};
use ledgerly_tax::DocumentTotals;

ledgerly_core::entity_id!(PurchaseOrderId, "purchase order id");

/// Purchase order raised to a vendor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseOrder {
    pub id: PurchaseOrderId,
    pub number: String,
    pub vendor_id: ContactId,
    pub order_date: NaiveDate,
    pub reference: Option<String>,
    pub status: OrderStatus,
    pub lines: Vec<DocumentLine>,
    pub totals: DocumentTotals,
    /// Vendor bill created by conversion.
    pub bill_id: Option<InvoiceId>,
}

/// Replacement values for an editable order. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurchaseOrderPatch {
    pub order_date: Option<NaiveDate>,
    pub reference: Option<String>,
    pub lines: Option<Vec<DocumentLine>>,
}

impl PurchaseOrder {
    pub fn new(
        id: PurchaseOrderId,
        number: String,
        vendor: &Contact,
        order_date: NaiveDate,
        reference: Option<String>,
        lines: Vec<DocumentLine>,
    ) -> DomainResult<Self> {
        vendor.ensure_vendor()?;

        let mut order = Self {
            id,
            number,
            vendor_id: vendor.id,
            order_date,
            reference: clean(reference),
            status: OrderStatus::Draft,
            lines: Vec::new(),
            totals: DocumentTotals::default(),
            bill_id: None,
        };
        order.set_lines(lines)?;
        Ok(order)
    }

    /// Edit header and lines. Totals are recomputed from the new lines.
    pub fn update(&mut self, vendor: Option<&Contact>, patch: PurchaseOrderPatch) -> DomainResult<()> {
        if !self.status.is_editable() {
            return Err(DomainError::invariant(format!(
                "{} is {} and can no longer be edited",
                self.number,
                self.status.as_str()
            )));
        }
        if let Some(vendor) = vendor {
            vendor.ensure_vendor()?;
        }
        if self.status == OrderStatus::Confirmed && patch.lines.as_ref().is_some_and(Vec::is_empty) {
            return Err(DomainError::validation("a confirmed order needs at least one line"));
        }

        // Lines first: totals can still fail, header edits cannot.
        if let Some(lines) = patch.lines {
            self.set_lines(lines)?;
        }
        if let Some(vendor) = vendor {
            self.vendor_id = vendor.id;
        }
        if let Some(date) = patch.order_date {
            self.order_date = date;
        }
        if patch.reference.is_some() {
            self.reference = clean(patch.reference);
        }
        Ok(())
    }

    pub fn confirm(&mut self) -> DomainResult<()> {
        match self.status {
            OrderStatus::Draft => {}
            OrderStatus::Confirmed => {
                return Err(DomainError::conflict(format!("{} is already confirmed", self.number)));
            }
            other => {
                return Err(DomainError::invariant(format!(
                    "{} is {} and cannot be confirmed",
                    self.number,
                    other.as_str()
                )));
            }
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
                "{} was converted to a bill and cannot be cancelled",
                self.number
            ))),
        }
    }

    /// Build the draft vendor bill for this order. The order itself is not changed.
    pub fn to_vendor_bill(
        &self,
        bill_id: InvoiceId,
        bill_number: String,
        bill_date: NaiveDate,
        due_date: Option<NaiveDate>,
    ) -> DomainResult<Invoice> {
        self.ensure_convertible()?;
        Invoice::draft(
            bill_id,
            InvoiceKind::VendorBill,
            bill_number,
            InvoiceHeader {
                partner_id: self.vendor_id,
                invoice_date: bill_date,
                due_date,
                reference: Some(self.number.clone()),
            },
            self.lines.clone(),
            Some(self.id.0),
        )
    }

    /// Mark the order as converted into `bill_id`.
    pub fn convert(&mut self, bill_id: InvoiceId) -> DomainResult<()> {
        self.ensure_convertible()?;
        self.status = OrderStatus::Converted;
        self.bill_id = Some(bill_id);
        Ok(())
    }

    fn ensure_convertible(&self) -> DomainResult<()> {
        match self.status {
            OrderStatus::Confirmed => Ok(()),
            OrderStatus::Converted => Err(DomainError::conflict(format!("{} is already converted", self.number))),
            other => Err(DomainError::invariant(format!(
                "only confirmed orders can be converted ({} is {})",
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

fn clean(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
