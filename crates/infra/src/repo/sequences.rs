//! Gap-free document numbering: `PO-00001`, `INV-00042`, ...

use sqlx::SqliteConnection;

use crate::error::StoreResult;

pub const PURCHASE_ORDER: &str = "PO";
pub const SALES_ORDER: &str = "SO";
pub const PAYMENT: &str = "PAY";
pub const JOURNAL_ENTRY: &str = "JE";

/// Reserve the next number for `prefix`.
///
/// Call inside the transaction that stores the document, so a rollback
/// releases the number again.
pub async fn next_number(conn: &mut SqliteConnection, prefix: &str) -> StoreResult<String> {
    let value: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO document_sequences (prefix, next_value) VALUES (?, 1)
        ON CONFLICT(prefix) DO UPDATE SET next_value = next_value + 1
        RETURNING next_value
        "#,
    )
    .bind(prefix)
    .fetch_one(&mut *conn)
    .await?;

    Ok(format!("{prefix}-{value:05}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::memory_db;

    #[tokio::test]
    async fn numbers_are_sequential_per_prefix() {
        let db = memory_db().await;
        let mut conn = db.acquire().await.unwrap();

        assert_eq!(next_number(&mut conn, PURCHASE_ORDER).await.unwrap(), "PO-00001");
        assert_eq!(next_number(&mut conn, PURCHASE_ORDER).await.unwrap(), "PO-00002");
        assert_eq!(next_number(&mut conn, "INV").await.unwrap(), "INV-00001");
    }

    #[tokio::test]
    async fn rolled_back_numbers_are_reused() {
        let db = memory_db().await;

        {
            let mut tx = db.begin().await.unwrap();
            assert_eq!(next_number(&mut tx, JOURNAL_ENTRY).await.unwrap(), "JE-00001");
            tx.rollback().await.unwrap();
        }

        let mut conn = db.acquire().await.unwrap();
        assert_eq!(next_number(&mut conn, JOURNAL_ENTRY).await.unwrap(), "JE-00001");
    }
}
