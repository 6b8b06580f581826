//! Status enums shared by orders, invoices and bills.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Lifecycle of purchase and sales orders.
///
/// `Draft → Confirmed → Converted`, with `Cancelled` reachable from the first two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Draft,
    Confirmed,
    Cancelled,
    Converted,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Draft => "draft",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Converted => "converted",
        }
    }

    /// Whether lines and header may still change.
    pub fn is_editable(&self) -> bool {
        matches!(self, OrderStatus::Draft | OrderStatus::Confirmed)
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "draft" => Ok(OrderStatus::Draft),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            "converted" => Ok(OrderStatus::Converted),
            other => Err(DomainError::invalid_id(format!("unknown order status: {other}"))),
        }
    }
}

/// Settlement state of an invoice or bill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Unpaid,
    Partial,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Partial => "partial",
            PaymentStatus::Paid => "paid",
        }
    }

    /// Derive the status from what has been paid against what is owed.
    pub fn from_amounts(paid: crate::Money, total: crate::Money) -> Self {
        if paid.is_zero() || paid.is_negative() {
            PaymentStatus::Unpaid
        } else if paid >= total {
            PaymentStatus::Paid
        } else {
            PaymentStatus::Partial
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unpaid" => Ok(PaymentStatus::Unpaid),
            "partial" => Ok(PaymentStatus::Partial),
            "paid" => Ok(PaymentStatus::Paid),
            other => Err(DomainError::invalid_id(format!("unknown payment status: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Money;

    #[test]
    fn payment_status_follows_amounts() {
        let total = Money::from_minor(1000);
        assert_eq!(PaymentStatus::from_amounts(Money::ZERO, total), PaymentStatus::Unpaid);
        assert_eq!(PaymentStatus::from_amounts(Money::from_minor(1), total), PaymentStatus::Partial);
        assert_eq!(PaymentStatus::from_amounts(total, total), PaymentStatus::Paid);
    }

    #[test]
    fn statuses_parse_case_insensitively() {
        assert_eq!("CONVERTED".parse::<OrderStatus>().unwrap(), OrderStatus::Converted);
        assert!("shipped".parse::<OrderStatus>().is_err());
        assert_eq!(OrderStatus::Cancelled.as_str(), "cancelled");
    }

    #[test]
    fn wire_names_match_the_stored_names() {
        for status in [OrderStatus::Draft, OrderStatus::Confirmed, OrderStatus::Converted, OrderStatus::Cancelled] {
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json, serde_json::Value::from(status.as_str()));
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert_eq!(serde_json::to_string(&PaymentStatus::Partial).unwrap(), "\"partial\"");
    }
}
