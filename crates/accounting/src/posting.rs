//! Posting rules: which accounts a confirmed document or payment moves.

use ledgerly_core::{DomainError, DomainResult};
use ledgerly_invoicing::{Invoice, InvoiceKind, InvoiceStatus, Payment, PaymentDirection, PaymentMethod};

use crate::account::codes;
use crate::ledger::{EntryHeader, EntrySource, JournalEntry, JournalLine};

/// Journal entry for a confirmed customer invoice or vendor bill.
///
/// Customer invoice: Dr receivable / Cr sales income / Cr output tax.
/// Vendor bill: Dr purchase expense / Dr input tax / Cr payable.
pub fn invoice_entry(header: EntryHeader, invoice: &Invoice) -> DomainResult<JournalEntry> {
    if invoice.status != InvoiceStatus::Confirmed {
        return Err(DomainError::invariant(format!(
            "only confirmed documents are posted ({} is {})",
            invoice.number,
            invoice.status.as_str()
        )));
    }

    let totals = invoice.totals;
    let mut lines = Vec::with_capacity(3);
    let source = match invoice.kind {
        InvoiceKind::CustomerInvoice => {
            lines.push(JournalLine::debit(codes::ACCOUNTS_RECEIVABLE, totals.total).for_partner(invoice.partner_id));
            lines.push(JournalLine::credit(codes::SALES_INCOME, totals.subtotal));
            if totals.tax_total.is_positive() {
                lines.push(JournalLine::credit(codes::OUTPUT_TAX, totals.tax_total));
            }
            EntrySource::CustomerInvoice
        }
        InvoiceKind::VendorBill => {
            lines.push(JournalLine::debit(codes::PURCHASE_EXPENSE, totals.subtotal));
            if totals.tax_total.is_positive() {
                lines.push(JournalLine::debit(codes::INPUT_TAX, totals.tax_total));
            }
            lines.push(JournalLine::credit(codes::ACCOUNTS_PAYABLE, totals.total).for_partner(invoice.partner_id));
            EntrySource::VendorBill
        }
    };

    JournalEntry::new(
        EntryHeader {
            reference: header.reference.or_else(|| Some(invoice.number.clone())),
            ..header
        },
        source,
        Some(invoice.id.0),
        lines,
    )
}

/// Journal entry for a registered payment.
///
/// Inbound: Dr cash or bank / Cr receivable. Outbound: Dr payable / Cr cash or bank.
pub fn payment_entry(header: EntryHeader, payment: &Payment) -> DomainResult<JournalEntry> {
    let money_account = match payment.method {
        PaymentMethod::Cash => codes::CASH,
        PaymentMethod::Bank => codes::BANK,
    };

    let lines = match payment.direction {
        PaymentDirection::Inbound => vec![
            JournalLine::debit(money_account, payment.amount),
            JournalLine::credit(codes::ACCOUNTS_RECEIVABLE, payment.amount).for_partner(payment.partner_id),
        ],
        PaymentDirection::Outbound => vec![
            JournalLine::debit(codes::ACCOUNTS_PAYABLE, payment.amount).for_partner(payment.partner_id),
            JournalLine::credit(money_account, payment.amount),
        ],
    };

    JournalEntry::new(
        EntryHeader {
            reference: header.reference.or_else(|| Some(payment.number.clone())),
            ..header
        },
        EntrySource::Payment,
        Some(payment.id.0),
        lines,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ledgerly_core::Money;
    use ledgerly_invoicing::{
        DocumentLine, InvoiceHeader, InvoiceId, LineDraft, NewPayment, PaymentId,
    };
    use ledgerly_parties::ContactId;
    use ledgerly_products::{NewProduct, Product, ProductId, ProductKind};
    use ledgerly_tax::{NewTax, Tax, TaxComputation, TaxId};

    use crate::ledger::JournalEntryId;

    fn header() -> EntryHeader {
        EntryHeader {
            id: JournalEntryId::generate(),
            number: "JE-00001".to_string(),
            entry_date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            reference: None,
            description: None,
        }
    }

    fn confirmed(kind: InvoiceKind, with_tax: bool) -> Invoice {
        let product = Product::new(
            ProductId::generate(),
            NewProduct {
                name: "Cabinet".to_string(),
                kind: ProductKind::Goods,
                category: None,
                hsn_code: None,
                sales_price: Money::from_minor(10_000),
                purchase_price: Money::from_minor(10_000),
                sales_tax_id: None,
                purchase_tax_id: None,
            },
        )
        .unwrap();
        let tax = Tax::new(
            TaxId::generate(),
            NewTax {
                name: "GST 18%".to_string(),
                computation: TaxComputation::Percentage,
                value: 1800,
                scope: kind.side(),
            },
        )
        .unwrap();
        let draft = LineDraft {
            product_id: product.id,
            description: None,
            quantity: 1,
            unit_price: None,
            tax_id: None,
        };
        let line = DocumentLine::price(1, &draft, &product, kind.side(), with_tax.then_some(&tax)).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        let mut invoice = Invoice::draft(
            InvoiceId::generate(),
            kind,
            format!("{}-00001", kind.number_prefix()),
            InvoiceHeader {
                partner_id: ContactId::generate(),
                invoice_date: date,
                due_date: None,
                reference: None,
            },
            vec![line],
            None,
        )
        .unwrap();
        invoice.confirm().unwrap();
        invoice
    }

    fn amounts(entry: &JournalEntry) -> Vec<(&str, i64, i64)> {
        entry
            .lines
            .iter()
            .map(|l| (l.account_code.as_str(), l.debit.minor(), l.credit.minor()))
            .collect()
    }

    #[test]
    fn customer_invoice_posts_receivable_income_and_output_tax() {
        let invoice = confirmed(InvoiceKind::CustomerInvoice, true);
        let entry = invoice_entry(header(), &invoice).unwrap();

        assert_eq!(entry.source, EntrySource::CustomerInvoice);
        assert_eq!(entry.reference.as_deref(), Some("INV-00001"));
        assert_eq!(
            amounts(&entry),
            vec![("1100", 11_800, 0), ("4000", 0, 10_000), ("2100", 0, 1_800)]
        );
        assert_eq!(entry.lines[0].partner_id, Some(invoice.partner_id));
    }

    #[test]
    fn untaxed_vendor_bill_skips_input_tax() {
        let bill = confirmed(InvoiceKind::VendorBill, false);
        let entry = invoice_entry(header(), &bill).unwrap();
        assert_eq!(amounts(&entry), vec![("5000", 10_000, 0), ("2000", 0, 10_000)]);
    }

    #[test]
    fn vendor_bill_posts_input_tax() {
        let bill = confirmed(InvoiceKind::VendorBill, true);
        let entry = invoice_entry(header(), &bill).unwrap();
        assert_eq!(
            amounts(&entry),
            vec![("5000", 10_000, 0), ("1200", 1_800, 0), ("2000", 0, 11_800)]
        );
    }

    #[test]
    fn drafts_are_not_posted() {
        let mut invoice = confirmed(InvoiceKind::CustomerInvoice, true);
        invoice.status = InvoiceStatus::Draft;
        assert!(invoice_entry(header(), &invoice).is_err());
    }

    #[test]
    fn payments_move_money_against_partner_balances() {
        let mut bill = confirmed(InvoiceKind::VendorBill, false);
        let payment = Payment::register(
            PaymentId::generate(),
            "PAY-00001".to_string(),
            &mut bill,
            NewPayment {
                amount: Money::from_minor(4_000),
                method: PaymentMethod::Cash,
                payment_date: NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(),
                memo: None,
            },
        )
        .unwrap();

        let entry = payment_entry(header(), &payment).unwrap();
        assert_eq!(entry.source_id, Some(payment.id.0));
        assert_eq!(amounts(&entry), vec![("2000", 4_000, 0), ("1000", 0, 4_000)]);
        assert_eq!(entry.lines[0].partner_id, Some(bill.partner_id));
    }
}
