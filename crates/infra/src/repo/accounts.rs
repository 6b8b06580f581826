use std::collections::BTreeSet;

use sqlx::{FromRow, SqliteConnection};
use tracing::instrument;

use ledgerly_accounting::{Account, AccountId};

use super::parse;
use crate::error::{StoreError, StoreResult};

#[derive(Debug, FromRow)]
struct AccountRow {
    id: String,
    code: String,
    name: String,
    kind: String,
    system: bool,
}

impl TryFrom<AccountRow> for Account {
    type Error = StoreError;

    fn try_from(row: AccountRow) -> StoreResult<Self> {
        Ok(Account {
            id: parse(&row.id)?,
            code: row.code,
            name: row.name,
            kind: parse(&row.kind)?,
            system: row.system,
        })
    }
}

/// Chart of accounts ordered by code.
pub async fn list(conn: &mut SqliteConnection) -> StoreResult<Vec<Account>> {
    let rows: Vec<AccountRow> = sqlx::query_as("SELECT id, code, name, kind, system FROM accounts ORDER BY code")
        .fetch_all(&mut *conn)
        .await?;
    rows.into_iter().map(Account::try_from).collect()
}

pub async fn get(conn: &mut SqliteConnection, id: AccountId) -> StoreResult<Account> {
    let row: Option<AccountRow> = sqlx::query_as("SELECT id, code, name, kind, system FROM accounts WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(&mut *conn)
        .await?;

    row.ok_or_else(|| StoreError::not_found("account", id))?.try_into()
}

pub async fn find_by_code(conn: &mut SqliteConnection, code: &str) -> StoreResult<Option<Account>> {
    let row: Option<AccountRow> =
        sqlx::query_as("SELECT id, code, name, kind, system FROM accounts WHERE code = ?")
            .bind(code)
            .fetch_optional(&mut *conn)
            .await?;

    row.map(Account::try_from).transpose()
}

/// Fails with `UniqueViolation("accounts.code")` when the code is taken.
#[instrument(skip(conn, account), fields(code = %account.code), err)]
pub async fn insert(conn: &mut SqliteConnection, account: &Account) -> StoreResult<()> {
    sqlx::query("INSERT INTO accounts (id, code, name, kind, system) VALUES (?, ?, ?, ?, ?)")
        .bind(account.id.to_string())
        .bind(&account.code)
        .bind(&account.name)
        .bind(account.kind.as_str())
        .bind(account.system)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Codes from `codes` that are not in the chart, sorted and deduplicated.
pub async fn missing_codes<'a>(
    conn: &mut SqliteConnection,
    codes: impl IntoIterator<Item = &'a str>,
) -> StoreResult<Vec<String>> {
    let known: BTreeSet<String> = sqlx::query_scalar("SELECT code FROM accounts")
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .collect();

    let missing: BTreeSet<&str> = codes.into_iter().filter(|code| !known.contains(*code)).collect();
    Ok(missing.into_iter().map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::memory_db;
    use ledgerly_accounting::{codes, AccountKind, NewAccount};

    #[tokio::test]
    async fn system_chart_is_seeded() {
        let db = memory_db().await;
        let mut conn = db.acquire().await.unwrap();

        let chart = list(&mut conn).await.unwrap();
        assert_eq!(chart.len(), 10);
        assert!(chart.iter().all(|a| a.system));

        let receivable = find_by_code(&mut conn, codes::ACCOUNTS_RECEIVABLE).await.unwrap().unwrap();
        assert_eq!(receivable.kind, AccountKind::Asset);
        assert_eq!(get(&mut conn, receivable.id).await.unwrap(), receivable);
    }

    #[tokio::test]
    async fn custom_accounts_need_unique_codes() {
        let db = memory_db().await;
        let mut conn = db.acquire().await.unwrap();

        let rent = Account::new(
            AccountId::generate(),
            NewAccount {
                code: "5100".to_string(),
                name: "Rent".to_string(),
                kind: AccountKind::Expense,
            },
        )
        .unwrap();
        insert(&mut conn, &rent).await.unwrap();

        let clash = Account::new(
            AccountId::generate(),
            NewAccount {
                code: codes::CASH.to_string(),
                name: "Petty cash".to_string(),
                kind: AccountKind::Asset,
            },
        )
        .unwrap();
        let err = insert(&mut conn, &clash).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(_)));
    }

    #[tokio::test]
    async fn reports_unknown_codes_once() {
        let db = memory_db().await;
        let mut conn = db.acquire().await.unwrap();

        let missing = missing_codes(&mut conn, ["1000", "9999", "9999", "4000", "8888"]).await.unwrap();
        assert_eq!(missing, vec!["8888".to_string(), "9999".to_string()]);
    }
}
