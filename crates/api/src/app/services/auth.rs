use chrono::Utc;
use tracing::info;

use ledgerly_auth::{
    hash_password, normalize_email, self_registration_role, validate_password, verify_login, AuthError,
    NewUser, User,
};
use ledgerly_core::{Page, PageRequest, UserId};
use ledgerly_infra::repo::{contacts, users};

use super::{referenced, AppServices};
use crate::app::dto::{CreateUserRequest, LoginRequest, RegisterRequest};
use crate::app::errors::ApiResult;

impl AppServices {
    /// Self-registration. The very first user becomes the administrator.
    pub async fn register(&self, req: RegisterRequest) -> ApiResult<(String, User)> {
        validate_password(&req.password)?;
        let password_hash = hash_password(&req.password)?;

        let mut tx = self.db.begin().await?;
        let existing = users::count(&mut tx).await?;
        let user = User::new(
            UserId::new(),
            NewUser {
                name: req.name,
                email: req.email,
                role: self_registration_role(existing),
                contact_id: None,
            },
            password_hash,
            Utc::now(),
        )?;
        users::insert(&mut tx, &user).await?;
        tx.commit().await?;

        info!(user_id = %user.id, role = user.role.as_str(), "user registered");
        let token = self.jwt.issue(user.id, user.role, user.contact_id)?;
        Ok((token, user))
    }

    pub async fn login(&self, req: LoginRequest) -> ApiResult<(String, User)> {
        let email = normalize_email(&req.email).map_err(|_| AuthError::InvalidCredentials)?;

        let mut conn = self.db.acquire().await?;
        let Some(user) = users::find_by_email(&mut conn, &email).await? else {
            verify_login(&req.password, None);
            return Err(AuthError::InvalidCredentials.into());
        };

        if !verify_login(&req.password, Some(&user.password_hash)) {
            info!(user_id = %user.id, "rejected login");
            return Err(AuthError::InvalidCredentials.into());
        }

        let token = self.jwt.issue(user.id, user.role, user.contact_id)?;
        Ok((token, user))
    }

    pub fn token_lifetime_secs(&self) -> i64 {
        self.jwt.lifetime_secs()
    }

    pub async fn get_user(&self, id: UserId) -> ApiResult<User> {
        let mut conn = self.db.acquire().await?;
        Ok(users::get(&mut conn, id).await?)
    }

    /// Admin-created account with an explicit role (portal logins are bound to a contact).
    pub async fn create_user(&self, req: CreateUserRequest) -> ApiResult<User> {
        validate_password(&req.password)?;
        let password_hash = hash_password(&req.password)?;

        let mut conn = self.db.acquire().await?;
        if let Some(contact_id) = req.contact_id {
            referenced(contacts::get(&mut conn, contact_id).await)?;
        }

        let user = User::new(
            UserId::new(),
            NewUser {
                name: req.name,
                email: req.email,
                role: req.role,
                contact_id: req.contact_id,
            },
            password_hash,
            Utc::now(),
        )?;
        users::insert(&mut conn, &user).await?;

        info!(user_id = %user.id, role = user.role.as_str(), "user created");
        Ok(user)
    }

    pub async fn list_users(&self, page: PageRequest) -> ApiResult<Page<User>> {
        let mut conn = self.db.acquire().await?;
        Ok(users::list(&mut conn, page).await?)
    }
}
