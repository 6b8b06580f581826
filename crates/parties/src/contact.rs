use core::str::FromStr;
use serde::{Deserialize, Serialize};

use ledgerly_core::error::require_non_empty;
use ledgerly_core::{DomainError, DomainResult};

ledgerly_core::entity_id!(ContactId, "contact id");

/// Which side(s) of the business a contact trades on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactKind {
    Customer,
    Vendor,
    Both,
}

impl ContactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactKind::Customer => "customer",
            ContactKind::Vendor => "vendor",
            ContactKind::Both => "both",
        }
    }

    pub fn is_customer(&self) -> bool {
        matches!(self, ContactKind::Customer | ContactKind::Both)
    }

    pub fn is_vendor(&self) -> bool {
        matches!(self, ContactKind::Vendor | ContactKind::Both)
    }
}

impl FromStr for ContactKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "customer" => Ok(ContactKind::Customer),
            "vendor" => Ok(ContactKind::Vendor),
            "both" => Ok(ContactKind::Both),
            other => Err(DomainError::invalid_id(format!(
                "kind must be one of: customer, vendor, both (got {other})"
            ))),
        }
    }
}

/// Contact status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactStatus {
    Active,
    Archived,
}

impl ContactStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactStatus::Active => "active",
            ContactStatus::Archived => "archived",
        }
    }
}

impl FromStr for ContactStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ContactStatus::Active),
            "archived" => Ok(ContactStatus::Archived),
            other => Err(DomainError::invalid_id(format!("unknown contact status: {other}"))),
        }
    }
}

/// Reachability details for a contact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Contact master record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub id: ContactId,
    pub name: String,
    pub kind: ContactKind,
    pub info: ContactInfo,
    /// GST identification number.
    pub gstin: Option<String>,
    pub status: ContactStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewContact {
    pub name: String,
    pub kind: ContactKind,
    #[serde(default)]
    pub info: ContactInfo,
    pub gstin: Option<String>,
}

/// Partial update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ContactPatch {
    pub name: Option<String>,
    pub kind: Option<ContactKind>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub gstin: Option<String>,
}

impl Contact {
    pub fn new(id: ContactId, input: NewContact) -> DomainResult<Self> {
        let contact = Self {
            id,
            name: input.name.trim().to_string(),
            kind: input.kind,
            info: normalize_info(input.info),
            gstin: normalize_optional(input.gstin).map(|g| g.to_ascii_uppercase()),
            status: ContactStatus::Active,
        };
        contact.validate()?;
        Ok(contact)
    }

    pub fn update(&mut self, patch: ContactPatch) -> DomainResult<()> {
        if self.status == ContactStatus::Archived {
            return Err(DomainError::invariant("archived contacts cannot be edited"));
        }

        let mut next = self.clone();
        if let Some(name) = patch.name {
            next.name = name.trim().to_string();
        }
        if let Some(kind) = patch.kind {
            next.kind = kind;
        }
        if patch.email.is_some() {
            next.info.email = normalize_optional(patch.email).map(|e| e.to_ascii_lowercase());
        }
        if patch.phone.is_some() {
            next.info.phone = normalize_optional(patch.phone);
        }
        if patch.address.is_some() {
            next.info.address = normalize_optional(patch.address);
        }
        if patch.gstin.is_some() {
            next.gstin = normalize_optional(patch.gstin).map(|g| g.to_ascii_uppercase());
        }
        next.validate()?;

        *self = next;
        Ok(())
    }

    pub fn archive(&mut self) -> DomainResult<()> {
        if self.status == ContactStatus::Archived {
            return Err(DomainError::conflict("contact is already archived"));
        }
        self.status = ContactStatus::Archived;
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.status == ContactStatus::Active
    }

    /// Whether sales orders and customer invoices may be raised for this contact.
    pub fn can_sell_to(&self) -> bool {
        self.is_active() && self.kind.is_customer()
    }

    /// Whether purchase orders and vendor bills may be raised for this contact.
    pub fn can_buy_from(&self) -> bool {
        self.is_active() && self.kind.is_vendor()
    }

    pub fn ensure_customer(&self) -> DomainResult<()> {
        if !self.can_sell_to() {
            return Err(DomainError::validation(format!(
                "contact '{}' is not an active customer",
                self.name
            )));
        }
        Ok(())
    }

    pub fn ensure_vendor(&self) -> DomainResult<()> {
        if !self.can_buy_from() {
            return Err(DomainError::validation(format!(
                "contact '{}' is not an active vendor",
                self.name
            )));
        }
        Ok(())
    }

    fn validate(&self) -> DomainResult<()> {
        require_non_empty("contact name", &self.name)?;

        if let Some(email) = &self.info.email {
            let valid = email
                .split_once('@')
                .is_some_and(|(user, domain)| !user.is_empty() && domain.contains('.'));
            if !valid {
                return Err(DomainError::validation(format!("invalid email address: {email}")));
            }
        }

        if let Some(gstin) = &self.gstin {
            if gstin.len() != 15 || !gstin.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(DomainError::validation("GSTIN must be 15 alphanumeric characters"));
            }
        }

        Ok(())
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn normalize_info(info: ContactInfo) -> ContactInfo {
    ContactInfo {
        email: normalize_optional(info.email).map(|e| e.to_ascii_lowercase()),
        phone: normalize_optional(info.phone),
        address: normalize_optional(info.address),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_contact(kind: ContactKind) -> NewContact {
        NewContact {
            name: "Azure Interior".to_string(),
            kind,
            info: ContactInfo {
                email: Some(" Sales@Azure.example ".to_string()),
                phone: Some("+91 98765 43210".to_string()),
                address: None,
            },
            gstin: Some("27aapfu0939f1zv".to_string()),
        }
    }

    #[test]
    fn new_contact_normalizes_email_and_gstin() {
        let c = Contact::new(ContactId::generate(), new_contact(ContactKind::Customer)).unwrap();
        assert_eq!(c.info.email.as_deref(), Some("sales@azure.example"));
        assert_eq!(c.gstin.as_deref(), Some("27AAPFU0939F1ZV"));
        assert!(c.is_active());
    }

    #[test]
    fn rejects_invalid_email_and_gstin() {
        let mut input = new_contact(ContactKind::Vendor);
        input.info.email = Some("nobody".to_string());
        assert!(Contact::new(ContactId::generate(), input).is_err());

        let mut input = new_contact(ContactKind::Vendor);
        input.gstin = Some("SHORT".to_string());
        assert!(Contact::new(ContactId::generate(), input).is_err());
    }

    #[test]
    fn trade_sides_follow_kind() {
        let customer = Contact::new(ContactId::generate(), new_contact(ContactKind::Customer)).unwrap();
        let vendor = Contact::new(ContactId::generate(), new_contact(ContactKind::Vendor)).unwrap();
        let both = Contact::new(ContactId::generate(), new_contact(ContactKind::Both)).unwrap();

        assert!(customer.can_sell_to() && !customer.can_buy_from());
        assert!(vendor.can_buy_from() && !vendor.can_sell_to());
        assert!(both.can_buy_from() && both.can_sell_to());
    }

    #[test]
    fn archived_contacts_cannot_trade_or_change() {
        let mut c = Contact::new(ContactId::generate(), new_contact(ContactKind::Both)).unwrap();
        c.archive().unwrap();
        assert!(!c.can_sell_to());
        assert!(c.ensure_vendor().is_err());
        assert!(matches!(c.archive(), Err(DomainError::Conflict(_))));
        assert!(c.update(ContactPatch::default()).is_err());
    }

    #[test]
    fn patch_can_clear_optional_fields_with_blank_strings() {
        let mut c = Contact::new(ContactId::generate(), new_contact(ContactKind::Customer)).unwrap();
        c.update(ContactPatch {
            phone: Some(String::new()),
            name: Some("Azure Interior Pvt Ltd".to_string()),
            ..ContactPatch::default()
        })
        .unwrap();
        assert_eq!(c.info.phone, None);
        assert_eq!(c.name, "Azure Interior Pvt Ltd");
    }
}
