//! Journal entries and their lines. Entries are append-only.

use chrono::NaiveDate;
use sqlx::{FromRow, SqliteConnection};
use tracing::instrument;

use ledgerly_accounting::{EntrySource, JournalEntry, JournalEntryId, JournalLine};
use ledgerly_core::{EntityId, Money, Page, PageRequest};

use super::{parse, parse_opt};
use crate::error::{StoreError, StoreResult};

const COLUMNS: &str = "id, number, entry_date, reference, description, source, source_id";

#[derive(Debug, FromRow)]
struct EntryRow {
    id: String,
    number: String,
    entry_date: NaiveDate,
    reference: Option<String>,
    description: Option<String>,
    source: String,
    source_id: Option<String>,
}

#[derive(Debug, FromRow)]
struct LineRow {
    account_code: String,
    partner_id: Option<String>,
    debit: i64,
    credit: i64,
}

impl TryFrom<LineRow> for JournalLine {
    type Error = StoreError;

    fn try_from(row: LineRow) -> StoreResult<Self> {
        Ok(JournalLine {
            account_code: row.account_code,
            partner_id: parse_opt(row.partner_id.as_deref())?,
            debit: Money::from_minor(row.debit),
            credit: Money::from_minor(row.credit),
        })
    }
}

impl EntryRow {
    fn into_entry(self, lines: Vec<JournalLine>) -> StoreResult<JournalEntry> {
        Ok(JournalEntry {
            id: parse(&self.id)?,
            number: self.number,
            entry_date: self.entry_date,
            reference: self.reference,
            description: self.description,
            source: parse(&self.source)?,
            source_id: parse_opt(self.source_id.as_deref())?,
            lines,
        })
    }
}

/// Append a validated entry. Unknown account codes fail as foreign key violations.
#[instrument(skip(conn, entry), fields(number = %entry.number, source = entry.source.as_str()), err)]
pub async fn insert_entry(conn: &mut SqliteConnection, entry: &JournalEntry) -> StoreResult<()> {
    sqlx::query(&format!("INSERT INTO journal_entries ({COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?)"))
        .bind(entry.id.to_string())
        .bind(&entry.number)
        .bind(entry.entry_date)
        .bind(&entry.reference)
        .bind(&entry.description)
        .bind(entry.source.as_str())
        .bind(entry.source_id.map(|id| id.to_string()))
        .execute(&mut *conn)
        .await?;

    for (i, line) in entry.lines.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO journal_lines (entry_id, line_no, account_code, partner_id, debit, credit)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.id.to_string())
        .bind(i as i64 + 1)
        .bind(&line.account_code)
        .bind(line.partner_id.map(|id| id.to_string()))
        .bind(line.debit.minor())
        .bind(line.credit.minor())
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

pub async fn get(conn: &mut SqliteConnection, id: JournalEntryId) -> StoreResult<JournalEntry> {
    let row: Option<EntryRow> = sqlx::query_as(&format!("SELECT {COLUMNS} FROM journal_entries WHERE id = ?"))
        .bind(id.to_string())
        .fetch_optional(&mut *conn)
        .await?;

    let row = row.ok_or_else(|| StoreError::not_found("journal entry", id))?;
    let lines = load_lines(conn, id).await?;
    row.into_entry(lines)
}

/// Newest first.
pub async fn list(conn: &mut SqliteConnection, page: PageRequest) -> StoreResult<Page<JournalEntry>> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM journal_entries")
        .fetch_one(&mut *conn)
        .await?;

    let rows: Vec<EntryRow> = sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM journal_entries ORDER BY entry_date DESC, number DESC LIMIT ? OFFSET ?"
    ))
    .bind(page.limit as i64)
    .bind(page.offset())
    .fetch_all(&mut *conn)
    .await?;

    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        let id: JournalEntryId = parse(&row.id)?;
        let lines = load_lines(conn, id).await?;
        items.push(row.into_entry(lines)?);
    }
    Ok(Page::new(items, page, total as u64))
}

/// The entry a document was originally posted with (not its reversal).
pub async fn posting_for(
    conn: &mut SqliteConnection,
    source: EntrySource,
    source_id: EntityId,
) -> StoreResult<Option<JournalEntry>> {
    let row: Option<EntryRow> = sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM journal_entries WHERE source = ? AND source_id = ? ORDER BY number LIMIT 1"
    ))
    .bind(source.as_str())
    .bind(source_id.to_string())
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(row) => {
            let id: JournalEntryId = parse(&row.id)?;
            let lines = load_lines(conn, id).await?;
            Ok(Some(row.into_entry(lines)?))
        }
        None => Ok(None),
    }
}

async fn load_lines(conn: &mut SqliteConnection, entry_id: JournalEntryId) -> StoreResult<Vec<JournalLine>> {
    let rows: Vec<LineRow> = sqlx::query_as(
        "SELECT account_code, partner_id, debit, credit FROM journal_lines WHERE entry_id = ? ORDER BY line_no",
    )
    .bind(entry_id.to_string())
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter().map(JournalLine::try_from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{date, memory_db};
    use ledgerly_accounting::{codes, EntryHeader};

    fn header(number: &str, day: u32) -> EntryHeader {
        EntryHeader {
            id: JournalEntryId::generate(),
            number: number.to_string(),
            entry_date: date(2024, 4, day),
            reference: None,
            description: Some("Owner contribution".to_string()),
        }
    }

    fn capital(number: &str, day: u32, amount: i64) -> JournalEntry {
        JournalEntry::new(
            header(number, day),
            EntrySource::Manual,
            None,
            vec![
                JournalLine::debit(codes::BANK, Money::from_minor(amount)),
                JournalLine::credit(codes::OWNERS_EQUITY, Money::from_minor(amount)),
            ],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn entries_round_trip_with_lines() {
        let db = memory_db().await;
        let mut conn = db.acquire().await.unwrap();

        let entry = capital("JE-00001", 1, 50_000);
        insert_entry(&mut conn, &entry).await.unwrap();
        assert_eq!(get(&mut conn, entry.id).await.unwrap(), entry);
    }

    #[tokio::test]
    async fn unknown_account_is_rejected() {
        let db = memory_db().await;
        let mut conn = db.acquire().await.unwrap();

        let entry = JournalEntry::new(
            header("JE-00001", 1),
            EntrySource::Manual,
            None,
            vec![
                JournalLine::debit("9999", Money::from_minor(10)),
                JournalLine::credit(codes::CASH, Money::from_minor(10)),
            ],
        )
        .unwrap();
        let err = insert_entry(&mut conn, &entry).await.unwrap_err();
        assert!(matches!(err, StoreError::ForeignKeyViolation(_)));
    }

    #[tokio::test]
    async fn finds_original_posting_not_reversal() {
        let db = memory_db().await;
        let mut conn = db.acquire().await.unwrap();

        let document = EntityId::new();
        let original = JournalEntry::new(
            header("JE-00001", 3),
            EntrySource::CustomerInvoice,
            Some(document),
            vec![
                JournalLine::debit(codes::ACCOUNTS_RECEIVABLE, Money::from_minor(118)),
                JournalLine::credit(codes::SALES_INCOME, Money::from_minor(100)),
                JournalLine::credit(codes::OUTPUT_TAX, Money::from_minor(18)),
            ],
        )
        .unwrap();
        let reversal = original.reversal(header("JE-00002", 4)).unwrap();
        insert_entry(&mut conn, &original).await.unwrap();
        insert_entry(&mut conn, &reversal).await.unwrap();

        let found = posting_for(&mut conn, EntrySource::CustomerInvoice, document).await.unwrap();
        assert_eq!(found.map(|e| e.id), Some(original.id));
        assert!(posting_for(&mut conn, EntrySource::VendorBill, document).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_pages_newest_first() {
        let db = memory_db().await;
        let mut conn = db.acquire().await.unwrap();

        for (n, day) in [(1, 1), (2, 5), (3, 2)] {
            insert_entry(&mut conn, &capital(&format!("JE-0000{n}"), day, 100)).await.unwrap();
        }

        let page = list(&mut conn, PageRequest::new(Some(1), Some(2))).await.unwrap();
        let numbers: Vec<_> = page.items.iter().map(|e| e.number.as_str()).collect();
        assert_eq!(numbers, vec!["JE-00002", "JE-00003"]);
        assert_eq!(page.total_pages, 2);
    }
}
