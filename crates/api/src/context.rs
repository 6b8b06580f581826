use ledgerly_auth::{Principal, Role};
use ledgerly_core::UserId;
use ledgerly_parties::ContactId;

/// Principal context for a request (authenticated identity, role and permissions).
///
/// Inserted by the auth middleware; present on every protected route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: Principal,
}

impl PrincipalContext {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn user_id(&self) -> UserId {
        self.principal.user_id
    }

    pub fn role(&self) -> Role {
        self.principal.role
    }

    /// Contact a portal login is bound to.
    pub fn contact_id(&self) -> Option<ContactId> {
        self.principal.contact_id
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }
}
