//! HS256 access tokens.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use ledgerly_core::UserId;
use ledgerly_parties::ContactId;

use crate::{AuthError, Principal, Role};

/// JWT claims structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id).
    pub sub: String,

    pub role: Role,

    /// Contact bound to a portal login.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_id: Option<String>,

    /// Issued at (Unix timestamp).
    pub iat: i64,

    /// Expiration (Unix timestamp).
    pub exp: i64,
}

impl Claims {
    /// Turn verified claims into an authorization principal.
    pub fn principal(&self) -> Result<Principal, AuthError> {
        let user_id: UserId = self
            .sub
            .parse()
            .map_err(|_| AuthError::InvalidToken("subject is not a user id".to_string()))?;
        let contact_id = self
            .contact_id
            .as_deref()
            .map(str::parse::<ContactId>)
            .transpose()
            .map_err(|_| AuthError::InvalidToken("contact_id is not a contact id".to_string()))?;
        Ok(Principal::new(user_id, self.role, contact_id))
    }
}

/// JWT token manager.
#[derive(Clone)]
pub struct JwtManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime_secs: i64,
}

impl JwtManager {
    pub fn new(secret: &str, lifetime_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            lifetime_secs,
        }
    }

    pub fn lifetime_secs(&self) -> i64 {
        self.lifetime_secs
    }

    /// Generate an access token.
    pub fn issue(&self, user_id: UserId, role: Role, contact_id: Option<ContactId>) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.lifetime_secs);

        let claims = Claims {
            sub: user_id.to_string(),
            role,
            contact_id: contact_id.map(|c| c.to_string()),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding).map_err(|e| AuthError::Issue(e.to_string()))
    }

    /// Validate signature and expiry, then decode.
    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::InvalidToken(e.to_string()),
            })
    }
}

impl core::fmt::Debug for JwtManager {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("JwtManager")
            .field("lifetime_secs", &self.lifetime_secs)
            .finish_non_exhaustive()
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jwt_roundtrip() {
        let manager = JwtManager::new("test-secret", 3600);
        let user = UserId::new();
        let contact = ContactId::generate();

        let token = manager.issue(user, Role::Contact, Some(contact)).unwrap();
        let claims = manager.validate(&token).unwrap();
        assert_eq!(claims.sub, user.to_string());
        assert_eq!(claims.exp - claims.iat, 3600);

        let principal = claims.principal().unwrap();
        assert_eq!(principal.user_id, user);
        assert_eq!(principal.role, Role::Contact);
        assert_eq!(principal.contact_id, Some(contact));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = JwtManager::new("secret-a", 3600)
            .issue(UserId::new(), Role::Admin, None)
            .unwrap();
        let err = JwtManager::new("secret-b", 3600).validate(&token).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = JwtManager::new("secret", -120)
            .issue(UserId::new(), Role::Admin, None)
            .unwrap();
        assert_eq!(JwtManager::new("secret", 60).validate(&token), Err(AuthError::Expired));
    }

    #[test]
    fn bearer_extraction() {
        assert_eq!(extract_bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
        assert_eq!(extract_bearer_token("Bearer "), None);
    }
}
