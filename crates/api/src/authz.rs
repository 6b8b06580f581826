//! API-side authorization guard.
//!
//! Handlers call [`require`] before touching services, keeping domain crates
//! and infra auth-agnostic.

use ledgerly_auth::{authorize, Permission};

use crate::app::errors::ApiError;
use crate::context::PrincipalContext;

/// Check that the current principal holds `permission`.
pub fn require(principal: &PrincipalContext, permission: &Permission) -> Result<(), ApiError> {
    authorize(principal.principal(), permission)?;
    Ok(())
}
