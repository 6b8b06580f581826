//! Application users.

use chrono::{DateTime, Utc};

use ledgerly_core::error::require_non_empty;
use ledgerly_core::{DomainError, DomainResult, UserId};
use ledgerly_parties::ContactId;

use crate::password::MIN_PASSWORD_LEN;
use crate::Role;

/// User account.
///
/// # Invariants
/// - Email is unique and stored lower-cased.
/// - Portal (`contact`) users are bound to exactly one contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub contact_id: Option<ContactId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub contact_id: Option<ContactId>,
}

impl User {
    /// Build a user from validated input and an already hashed password.
    pub fn new(id: UserId, input: NewUser, password_hash: String, created_at: DateTime<Utc>) -> DomainResult<Self> {
        require_non_empty("name", &input.name)?;
        let email = normalize_email(&input.email)?;

        match (input.role, input.contact_id) {
            (Role::Contact, None) => {
                return Err(DomainError::validation("portal users must be linked to a contact"));
            }
            (Role::Admin | Role::InvoicingUser, Some(_)) => {
                return Err(DomainError::validation("only portal users are linked to a contact"));
            }
            _ => {}
        }

        Ok(Self {
            id,
            name: input.name.trim().to_string(),
            email,
            password_hash,
            role: input.role,
            contact_id: input.contact_id,
            created_at,
        })
    }
}

/// Role of a self-registered user: the very first account administers the system.
pub fn self_registration_role(existing_users: u64) -> Role {
    if existing_users == 0 {
        Role::Admin
    } else {
        Role::InvoicingUser
    }
}

pub fn normalize_email(email: &str) -> DomainResult<String> {
    let email = email.trim().to_ascii_lowercase();
    let valid = email
        .split_once('@')
        .is_some_and(|(user, domain)| !user.is_empty() && domain.contains('.') && !domain.starts_with('.'));
    if !valid {
        return Err(DomainError::validation(format!("invalid email address: {email}")));
    }
    Ok(email)
}

pub fn validate_password(password: &str) -> DomainResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(DomainError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}
