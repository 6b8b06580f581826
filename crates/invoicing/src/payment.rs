use core::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use ledgerly_core::{DomainError, DomainResult, Money};
use ledgerly_parties::ContactId;

use crate::invoice::{Invoice, InvoiceId, InvoiceKind};

ledgerly_core::entity_id!(PaymentId, "payment id");

/// Money received from customers (inbound) or paid to vendors (outbound).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentDirection {
    Inbound,
    Outbound,
}

impl PaymentDirection {
    pub fn for_kind(kind: InvoiceKind) -> Self {
        match kind {
            InvoiceKind::CustomerInvoice => PaymentDirection::Inbound,
            InvoiceKind::VendorBill => PaymentDirection::Outbound,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentDirection::Inbound => "inbound",
            PaymentDirection::Outbound => "outbound",
        }
    }
}

impl FromStr for PaymentDirection {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inbound" => Ok(PaymentDirection::Inbound),
            "outbound" => Ok(PaymentDirection::Outbound),
            other => Err(DomainError::invalid_id(format!("unknown payment direction: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Bank,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Bank => "bank",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "bank" => Ok(PaymentMethod::Bank),
            other => Err(DomainError::invalid_id(format!(
                "method must be cash or bank (got {other})"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payment {
    pub id: PaymentId,
    pub number: String,
    pub invoice_id: InvoiceId,
    pub partner_id: ContactId,
    pub direction: PaymentDirection,
    pub method: PaymentMethod,
    pub amount: Money,
    pub payment_date: NaiveDate,
    pub memo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewPayment {
    pub amount: Money,
    pub method: PaymentMethod,
    pub payment_date: NaiveDate,
    #[serde(default)]
    pub memo: Option<String>,
}

impl Payment {
    /// Settle (part of) `invoice` and record the payment against it.
    pub fn register(id: PaymentId, number: String, invoice: &mut Invoice, input: NewPayment) -> DomainResult<Self> {
        if input.payment_date < invoice.invoice_date {
            return Err(DomainError::validation("payment date cannot be before the invoice date"));
        }
        invoice.register_payment(input.amount)?;

        Ok(Self {
            id,
            number,
            invoice_id: invoice.id,
            partner_id: invoice.partner_id,
            direction: PaymentDirection::for_kind(invoice.kind),
            method: input.method,
            amount: input.amount,
            payment_date: input.payment_date,
            memo: input.memo.map(|m| m.trim().to_string()).filter(|m| !m.is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::tests::{customer_invoice, date};
    use ledgerly_core::PaymentStatus;

    fn bank(amount: i64) -> NewPayment {
        NewPayment {
            amount: Money::from_minor(amount),
            method: PaymentMethod::Bank,
            payment_date: date(2024, 4, 15),
            memo: Some("NEFT ref 8812".to_string()),
        }
    }

    #[test]
    fn customer_payments_are_inbound() {
        let mut inv = customer_invoice(1);
        inv.confirm().unwrap();

        let payment = Payment::register(PaymentId::generate(), "PAY-00001".into(), &mut inv, bank(1_180)).unwrap();
        assert_eq!(payment.direction, PaymentDirection::Inbound);
        assert_eq!(payment.partner_id, inv.partner_id);
        assert_eq!(inv.payment_status, PaymentStatus::Paid);
    }

    #[test]
    fn rejected_payment_leaves_invoice_untouched() {
        let mut inv = customer_invoice(1);
        inv.confirm().unwrap();

        assert!(Payment::register(PaymentId::generate(), "PAY-00001".into(), &mut inv, bank(5_000)).is_err());
        assert_eq!(inv.amount_paid, Money::ZERO);

        let mut early = bank(100);
        early.payment_date = date(2024, 3, 31);
        assert!(Payment::register(PaymentId::generate(), "PAY-00002".into(), &mut inv, early).is_err());
    }
}
