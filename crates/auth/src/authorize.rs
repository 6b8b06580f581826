use thiserror::Error;

use crate::{Permission, Principal};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

/// Authorize a principal for one permission.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize(principal: &Principal, required: &Permission) -> Result<(), AuthzError> {
    let granted = principal
        .permissions
        .iter()
        .any(|p| p.is_wildcard() || p == required);

    if granted {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{perms, Role};
    use ledgerly_core::UserId;
    use ledgerly_parties::ContactId;

    #[test]
    fn admin_wildcard_grants_everything() {
        let admin = Principal::new(UserId::new(), Role::Admin, None);
        assert!(authorize(&admin, &perms::USERS_MANAGE).is_ok());
        assert!(authorize(&admin, &perms::LEDGER_POST).is_ok());
    }

    #[test]
    fn invoicing_users_cannot_manage_users_or_post_manual_entries() {
        let clerk = Principal::new(UserId::new(), Role::InvoicingUser, None);
        assert!(authorize(&clerk, &perms::INVOICES_WRITE).is_ok());
        assert_eq!(
            authorize(&clerk, &perms::USERS_MANAGE),
            Err(AuthzError::Forbidden("users.manage".to_string()))
        );
        assert!(authorize(&clerk, &perms::LEDGER_POST).is_err());
    }

    #[test]
    fn portal_contacts_only_read_the_portal() {
        let portal = Principal::new(UserId::new(), Role::Contact, Some(ContactId::generate()));
        assert!(authorize(&portal, &perms::PORTAL_READ).is_ok());
        assert!(authorize(&portal, &perms::CONTACTS_READ).is_err());
    }
}
