//! Aggregations feeding the report builders in `ledgerly-accounting` and
//! `ledgerly-products`.

use chrono::NaiveDate;
use sqlx::{FromRow, SqliteConnection};

use ledgerly_accounting::{codes, AccountBalance, PartnerLedgerRow};
use ledgerly_core::Money;
use ledgerly_parties::ContactId;
use ledgerly_products::StockMovement;

use super::parse;
use crate::error::{StoreError, StoreResult};

#[derive(Debug, FromRow)]
struct BalanceRow {
    code: String,
    name: String,
    kind: String,
    debit: i64,
    credit: i64,
}

impl TryFrom<BalanceRow> for AccountBalance {
    type Error = StoreError;

    fn try_from(row: BalanceRow) -> StoreResult<Self> {
        Ok(AccountBalance {
            code: row.code,
            name: row.name,
            kind: parse(&row.kind)?,
            debit: Money::from_minor(row.debit),
            credit: Money::from_minor(row.credit),
        })
    }
}

/// Debit and credit sums per account for entries dated in `from..=to`
/// (`from = None` means since the beginning). Every account is returned.
pub async fn account_balances(
    conn: &mut SqliteConnection,
    from: Option<NaiveDate>,
    to: NaiveDate,
) -> StoreResult<Vec<AccountBalance>> {
    let rows: Vec<BalanceRow> = sqlx::query_as(
        r#"
        SELECT a.code, a.name, a.kind,
               COALESCE(SUM(t.debit), 0) AS debit,
               COALESCE(SUM(t.credit), 0) AS credit
        FROM accounts a
        LEFT JOIN (
            SELECT l.account_code, l.debit, l.credit
            FROM journal_lines l
            JOIN journal_entries e ON e.id = l.entry_id
            WHERE e.entry_date <= ?1 AND (?2 IS NULL OR e.entry_date >= ?2)
        ) t ON t.account_code = a.code
        GROUP BY a.code, a.name, a.kind
        ORDER BY a.code
        "#,
    )
    .bind(to)
    .bind(from)
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter().map(AccountBalance::try_from).collect()
}

#[derive(Debug, FromRow)]
struct PartnerRow {
    entry_date: NaiveDate,
    entry_number: String,
    reference: Option<String>,
    description: Option<String>,
    account_code: String,
    debit: i64,
    credit: i64,
}

/// Receivable and payable lines of `partner_id` dated in `from..=to`.
pub async fn partner_rows(
    conn: &mut SqliteConnection,
    partner_id: ContactId,
    from: NaiveDate,
    to: NaiveDate,
) -> StoreResult<Vec<PartnerLedgerRow>> {
    let rows: Vec<PartnerRow> = sqlx::query_as(
        r#"
        SELECT e.entry_date, e.number AS entry_number, e.reference, e.description,
               l.account_code, l.debit, l.credit
        FROM journal_lines l
        JOIN journal_entries e ON e.id = l.entry_id
        WHERE l.partner_id = ?1
          AND l.account_code IN (?2, ?3)
          AND e.entry_date BETWEEN ?4 AND ?5
        ORDER BY e.entry_date, e.number, l.line_no
        "#,
    )
    .bind(partner_id.to_string())
    .bind(codes::ACCOUNTS_RECEIVABLE)
    .bind(codes::ACCOUNTS_PAYABLE)
    .bind(from)
    .bind(to)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| PartnerLedgerRow {
            entry_date: row.entry_date,
            entry_number: row.entry_number,
            reference: row.reference,
            description: row.description,
            account_code: row.account_code,
            debit: Money::from_minor(row.debit),
            credit: Money::from_minor(row.credit),
        })
        .collect())
}

/// `debit - credit` on the partner's receivable and payable before `before`.
pub async fn partner_opening_balance(
    conn: &mut SqliteConnection,
    partner_id: ContactId,
    before: NaiveDate,
) -> StoreResult<Money> {
    let balance: i64 = sqlx::query_scalar(
        r#"
        SELECT COALESCE(SUM(l.debit - l.credit), 0)
        FROM journal_lines l
        JOIN journal_entries e ON e.id = l.entry_id
        WHERE l.partner_id = ?1
          AND l.account_code IN (?2, ?3)
          AND e.entry_date < ?4
        "#,
    )
    .bind(partner_id.to_string())
    .bind(codes::ACCOUNTS_RECEIVABLE)
    .bind(codes::ACCOUNTS_PAYABLE)
    .bind(before)
    .fetch_one(&mut *conn)
    .await?;

    Ok(Money::from_minor(balance))
}

#[derive(Debug, FromRow)]
struct MovementRow {
    product_id: String,
    quantity_in: i64,
    quantity_out: i64,
}

/// Quantities on confirmed vendor bills (in) and customer invoices (out).
pub async fn stock_movements(conn: &mut SqliteConnection) -> StoreResult<Vec<StockMovement>> {
    let rows: Vec<MovementRow> = sqlx::query_as(
        r#"
        SELECT dl.product_id,
               COALESCE(SUM(CASE WHEN i.kind = 'vendor_bill' THEN dl.quantity ELSE 0 END), 0) AS quantity_in,
               COALESCE(SUM(CASE WHEN i.kind = 'customer_invoice' THEN dl.quantity ELSE 0 END), 0) AS quantity_out
        FROM document_lines dl
        JOIN invoices i ON i.id = dl.document_id
        WHERE i.status = 'confirmed'
        GROUP BY dl.product_id
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter()
        .map(|row| {
            Ok(StockMovement {
                product_id: parse(&row.product_id)?,
                quantity_in: row.quantity_in,
                quantity_out: row.quantity_out,
            })
        })
        .collect()
}
