use core::str::FromStr;

use serde::{Deserialize, Serialize};

use ledgerly_core::DomainError;

use crate::permissions::{perms, Permission};

/// Role of an application user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Everything, including user management.
    Admin,
    /// Day-to-day bookkeeping: masters, orders, invoices, payments.
    InvoicingUser,
    /// Portal login bound to one contact; sees only that contact's invoices.
    Contact,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::InvoicingUser => "invoicing_user",
            Role::Contact => "contact",
        }
    }

    pub fn permissions(&self) -> Vec<Permission> {
        match self {
            Role::Admin => vec![perms::ALL],
            Role::InvoicingUser => vec![
                perms::CONTACTS_READ,
                perms::CONTACTS_WRITE,
                perms::PRODUCTS_READ,
                perms::PRODUCTS_WRITE,
                perms::TAXES_READ,
                perms::TAXES_WRITE,
                perms::ACCOUNTS_READ,
                perms::PURCHASES_READ,
                perms::PURCHASES_WRITE,
                perms::SALES_READ,
                perms::SALES_WRITE,
                perms::INVOICES_READ,
                perms::INVOICES_WRITE,
                perms::PAYMENTS_READ,
                perms::PAYMENTS_WRITE,
                perms::LEDGER_READ,
                perms::REPORTS_READ,
            ],
            Role::Contact => vec![perms::PORTAL_READ],
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "invoicing_user" => Ok(Role::InvoicingUser),
            "contact" => Ok(Role::Contact),
            other => Err(DomainError::invalid_id(format!(
                "role must be one of: admin, invoicing_user, contact (got {other})"
            ))),
        }
    }
}
