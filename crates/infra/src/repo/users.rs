use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection};
use tracing::instrument;

use ledgerly_auth::User;
use ledgerly_core::{Page, PageRequest, UserId};

use super::{parse, parse_opt};
use crate::error::{StoreError, StoreResult};

const COLUMNS: &str = "id, name, email, password_hash, role, contact_id, created_at";

#[derive(Debug, FromRow)]
struct UserRow {
    id: String,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    contact_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> StoreResult<Self> {
        Ok(User {
            id: parse(&row.id)?,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            role: parse(&row.role)?,
            contact_id: parse_opt(row.contact_id.as_deref())?,
            created_at: row.created_at,
        })
    }
}

pub async fn count(conn: &mut SqliteConnection) -> StoreResult<u64> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&mut *conn)
        .await?;
    Ok(total as u64)
}

/// Fails with `UniqueViolation("users.email")` when the email is taken.
#[instrument(skip(conn, user), fields(user_id = %user.id, role = %user.role), err)]
pub async fn insert(conn: &mut SqliteConnection, user: &User) -> StoreResult<()> {
    sqlx::query(&format!("INSERT INTO users ({COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?)"))
        .bind(user.id.to_string())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.contact_id.map(|id| id.to_string()))
        .bind(user.created_at)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// `email` must already be normalized.
pub async fn find_by_email(conn: &mut SqliteConnection, email: &str) -> StoreResult<Option<User>> {
    let row: Option<UserRow> = sqlx::query_as(&format!("SELECT {COLUMNS} FROM users WHERE email = ?"))
        .bind(email)
        .fetch_optional(&mut *conn)
        .await?;

    row.map(User::try_from).transpose()
}

pub async fn get(conn: &mut SqliteConnection, id: UserId) -> StoreResult<User> {
    let row: Option<UserRow> = sqlx::query_as(&format!("SELECT {COLUMNS} FROM users WHERE id = ?"))
        .bind(id.to_string())
        .fetch_optional(&mut *conn)
        .await?;

    row.ok_or_else(|| StoreError::not_found("user", id))?.try_into()
}

pub async fn list(conn: &mut SqliteConnection, page: PageRequest) -> StoreResult<Page<User>> {
    let total = count(conn).await?;
    let rows: Vec<UserRow> = sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM users ORDER BY created_at, id LIMIT ? OFFSET ?"
    ))
    .bind(page.limit as i64)
    .bind(page.offset())
    .fetch_all(&mut *conn)
    .await?;

    let items = rows.into_iter().map(User::try_from).collect::<StoreResult<Vec<_>>>()?;
    Ok(Page::new(items, page, total))
}
