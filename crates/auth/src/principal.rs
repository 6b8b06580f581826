use ledgerly_core::UserId;
use ledgerly_parties::ContactId;

use crate::{Permission, Role};

/// A fully resolved principal for authorization decisions.
///
/// Built from verified token claims; carries no storage handles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub role: Role,
    /// Set for portal users.
    pub contact_id: Option<ContactId>,
    pub permissions: Vec<Permission>,
}

impl Principal {
    pub fn new(user_id: UserId, role: Role, contact_id: Option<ContactId>) -> Self {
        Self {
            user_id,
            role,
            contact_id,
            permissions: role.permissions(),
        }
    }
}
