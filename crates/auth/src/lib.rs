//! `ledgerly-auth` — authentication and authorization boundary.
//!
//! Roles, permissions, password hashing and JWT handling. No HTTP, no storage.

pub mod authorize;
pub mod error;
pub mod jwt;
pub mod password;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod user;

pub use authorize::{authorize, AuthzError};
pub use error::AuthError;
pub use jwt::{extract_bearer_token, Claims, JwtManager};
pub use password::{hash_password, verify_login, verify_password};
pub use permissions::{perms, Permission};
pub use principal::Principal;
pub use roles::Role;
pub use user::{normalize_email, self_registration_role, validate_password, NewUser, User};
