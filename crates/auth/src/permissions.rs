use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Permissions are modeled as opaque strings (e.g. "contacts.read").
/// The wildcard permission `"*"` allows everything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Every permission checked by the HTTP layer.
pub mod perms {
    use super::Permission;

    pub const ALL: Permission = Permission::from_static("*");

    pub const USERS_MANAGE: Permission = Permission::from_static("users.manage");
    pub const CONTACTS_READ: Permission = Permission::from_static("contacts.read");
    pub const CONTACTS_WRITE: Permission = Permission::from_static("contacts.write");
    pub const PRODUCTS_READ: Permission = Permission::from_static("products.read");
    pub const PRODUCTS_WRITE: Permission = Permission::from_static("products.write");
    pub const TAXES_READ: Permission = Permission::from_static("taxes.read");
    pub const TAXES_WRITE: Permission = Permission::from_static("taxes.write");
    pub const ACCOUNTS_READ: Permission = Permission::from_static("accounts.read");
    pub const ACCOUNTS_WRITE: Permission = Permission::from_static("accounts.write");
    pub const PURCHASES_READ: Permission = Permission::from_static("purchases.read");
    pub const PURCHASES_WRITE: Permission = Permission::from_static("purchases.write");
    pub const SALES_READ: Permission = Permission::from_static("sales.read");
    pub const SALES_WRITE: Permission = Permission::from_static("sales.write");
    pub const INVOICES_READ: Permission = Permission::from_static("invoices.read");
    pub const INVOICES_WRITE: Permission = Permission::from_static("invoices.write");
    pub const PAYMENTS_READ: Permission = Permission::from_static("payments.read");
    pub const PAYMENTS_WRITE: Permission = Permission::from_static("payments.write");
    pub const LEDGER_READ: Permission = Permission::from_static("ledger.read");
    pub const LEDGER_POST: Permission = Permission::from_static("ledger.post");
    pub const REPORTS_READ: Permission = Permission::from_static("reports.read");
    pub const PORTAL_READ: Permission = Permission::from_static("portal.read");
}
