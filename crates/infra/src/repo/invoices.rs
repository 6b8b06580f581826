use chrono::NaiveDate;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection};
use tracing::instrument;

use ledgerly_core::{Money, Page, PageRequest};
use ledgerly_invoicing::{DocumentLine, Invoice, InvoiceId, InvoiceKind, InvoiceStatus};
use ledgerly_parties::ContactId;
use ledgerly_tax::DocumentTotals;

use super::{lines, parse, parse_opt};
use crate::error::{StoreError, StoreResult};

const COLUMNS: &str = "id, kind, number, partner_id, source_order_id, invoice_date, due_date, reference, \
                       status, payment_status, subtotal, tax_total, total, amount_paid";

#[derive(Debug, Clone, Copy, Default)]
pub struct InvoiceFilter {
    pub kind: Option<InvoiceKind>,
    pub status: Option<InvoiceStatus>,
    pub partner_id: Option<ContactId>,
}

#[derive(Debug, FromRow)]
struct InvoiceRow {
    id: String,
    kind: String,
    number: String,
    partner_id: String,
    source_order_id: Option<String>,
    invoice_date: NaiveDate,
    due_date: NaiveDate,
    reference: Option<String>,
    status: String,
    payment_status: String,
    subtotal: i64,
    tax_total: i64,
    total: i64,
    amount_paid: i64,
}

impl InvoiceRow {
    fn into_invoice(self, lines: Vec<DocumentLine>) -> StoreResult<Invoice> {
        Ok(Invoice {
            id: parse(&self.id)?,
            kind: parse(&self.kind)?,
            number: self.number,
            partner_id: parse(&self.partner_id)?,
            source_order_id: parse_opt(self.source_order_id.as_deref())?,
            invoice_date: self.invoice_date,
            due_date: self.due_date,
            reference: self.reference,
            status: parse(&self.status)?,
            payment_status: parse(&self.payment_status)?,
            lines,
            totals: DocumentTotals {
                subtotal: Money::from_minor(self.subtotal),
                tax_total: Money::from_minor(self.tax_total),
                total: Money::from_minor(self.total),
            },
            amount_paid: Money::from_minor(self.amount_paid),
        })
    }
}

/// Store a new invoice or bill together with its lines.
#[instrument(skip(conn, invoice), fields(number = %invoice.number, kind = invoice.kind.as_str()), err)]
pub async fn insert(conn: &mut SqliteConnection, invoice: &Invoice) -> StoreResult<()> {
    sqlx::query(&format!(
        "INSERT INTO invoices ({COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
    ))
    .bind(invoice.id.to_string())
    .bind(invoice.kind.as_str())
    .bind(&invoice.number)
    .bind(invoice.partner_id.to_string())
    .bind(invoice.source_order_id.map(|id| id.to_string()))
    .bind(invoice.invoice_date)
    .bind(invoice.due_date)
    .bind(&invoice.reference)
    .bind(invoice.status.as_str())
    .bind(invoice.payment_status.as_str())
    .bind(invoice.totals.subtotal.minor())
    .bind(invoice.totals.tax_total.minor())
    .bind(invoice.totals.total.minor())
    .bind(invoice.amount_paid.minor())
    .execute(&mut *conn)
    .await?;

    lines::replace(conn, invoice.id.0, &invoice.lines).await
}

/// Persist header, status, payment progress and lines.
#[instrument(skip(conn, invoice), fields(number = %invoice.number, status = invoice.status.as_str()), err)]
pub async fn update(conn: &mut SqliteConnection, invoice: &Invoice) -> StoreResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE invoices
        SET partner_id = ?, invoice_date = ?, due_date = ?, reference = ?, status = ?,
            payment_status = ?, subtotal = ?, tax_total = ?, total = ?, amount_paid = ?
        WHERE id = ?
        "#,
    )
    .bind(invoice.partner_id.to_string())
    .bind(invoice.invoice_date)
    .bind(invoice.due_date)
    .bind(&invoice.reference)
    .bind(invoice.status.as_str())
    .bind(invoice.payment_status.as_str())
    .bind(invoice.totals.subtotal.minor())
    .bind(invoice.totals.tax_total.minor())
    .bind(invoice.totals.total.minor())
    .bind(invoice.amount_paid.minor())
    .bind(invoice.id.to_string())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::not_found("invoice", invoice.id));
    }
    lines::replace(conn, invoice.id.0, &invoice.lines).await
}

pub async fn get(conn: &mut SqliteConnection, id: InvoiceId) -> StoreResult<Invoice> {
    let row: Option<InvoiceRow> = sqlx::query_as(&format!("SELECT {COLUMNS} FROM invoices WHERE id = ?"))
        .bind(id.to_string())
        .fetch_optional(&mut *conn)
        .await?;

    let row = row.ok_or_else(|| StoreError::not_found("invoice", id))?;
    let lines = lines::load(conn, id.0).await?;
    row.into_invoice(lines)
}

/// Newest first.
pub async fn list(conn: &mut SqliteConnection, filter: InvoiceFilter, page: PageRequest) -> StoreResult<Page<Invoice>> {
    let total: i64 = filtered("SELECT COUNT(*) FROM invoices", filter)
        .build_query_scalar()
        .fetch_one(&mut *conn)
        .await?;

    let mut qb = filtered(&format!("SELECT {COLUMNS} FROM invoices"), filter);
    qb.push(" ORDER BY invoice_date DESC, number DESC LIMIT ")
        .push_bind(page.limit as i64)
        .push(" OFFSET ")
        .push_bind(page.offset());
    let rows: Vec<InvoiceRow> = qb.build_query_as().fetch_all(&mut *conn).await?;

    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        let id: InvoiceId = parse(&row.id)?;
        let lines = lines::load(conn, id.0).await?;
        items.push(row.into_invoice(lines)?);
    }
    Ok(Page::new(items, page, total as u64))
}

fn filtered<'a>(select: &str, filter: InvoiceFilter) -> QueryBuilder<'a, Sqlite> {
    let mut qb = QueryBuilder::new(select);
    qb.push(" WHERE 1 = 1");
    if let Some(kind) = filter.kind {
        qb.push(" AND kind = ").push_bind(kind.as_str());
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(partner_id) = filter.partner_id {
        qb.push(" AND partner_id = ").push_bind(partner_id.to_string());
    }
    qb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{date, draft_invoice, memory_db, seed_masters};
    use ledgerly_core::PaymentStatus;

    #[tokio::test]
    async fn stores_lines_with_tax_snapshot() {
        let db = memory_db().await;
        let mut conn = db.acquire().await.unwrap();
        let masters = seed_masters(&mut conn).await;

        let invoice = draft_invoice(&masters, InvoiceKind::CustomerInvoice, "INV-00001", 2);
        insert(&mut conn, &invoice).await.unwrap();

        let loaded = get(&mut conn, invoice.id).await.unwrap();
        assert_eq!(loaded, invoice);
        assert_eq!(loaded.totals.total, Money::from_minor(2_360));
        assert_eq!(loaded.lines[0].tax.as_ref().map(|t| t.name.as_str()), Some("GST 18%"));
    }

    #[tokio::test]
    async fn update_persists_transitions() {
        let db = memory_db().await;
        let mut conn = db.acquire().await.unwrap();
        let masters = seed_masters(&mut conn).await;

        let mut invoice = draft_invoice(&masters, InvoiceKind::CustomerInvoice, "INV-00001", 1);
        insert(&mut conn, &invoice).await.unwrap();

        invoice.confirm().unwrap();
        invoice.register_payment(Money::from_minor(500)).unwrap();
        update(&mut conn, &invoice).await.unwrap();

        let loaded = get(&mut conn, invoice.id).await.unwrap();
        assert_eq!(loaded.status, InvoiceStatus::Confirmed);
        assert_eq!(loaded.payment_status, PaymentStatus::Partial);
        assert_eq!(loaded.outstanding(), Money::from_minor(680));
    }

    #[tokio::test]
    async fn duplicate_numbers_are_rejected() {
        let db = memory_db().await;
        let mut conn = db.acquire().await.unwrap();
        let masters = seed_masters(&mut conn).await;

        insert(&mut conn, &draft_invoice(&masters, InvoiceKind::CustomerInvoice, "INV-00001", 1))
            .await
            .unwrap();
        let err = insert(&mut conn, &draft_invoice(&masters, InvoiceKind::CustomerInvoice, "INV-00001", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(_)));
    }

    #[tokio::test]
    async fn list_filters_by_kind_status_and_partner() {
        let db = memory_db().await;
        let mut conn = db.acquire().await.unwrap();
        let masters = seed_masters(&mut conn).await;

        let mut first = draft_invoice(&masters, InvoiceKind::CustomerInvoice, "INV-00001", 1);
        first.confirm().unwrap();
        insert(&mut conn, &first).await.unwrap();

        let mut second = draft_invoice(&masters, InvoiceKind::CustomerInvoice, "INV-00002", 3);
        second.update_header(ledgerly_invoicing::InvoiceHeaderPatch {
            invoice_date: Some(date(2024, 4, 20)),
            due_date: Some(date(2024, 5, 20)),
            ..Default::default()
        })
        .unwrap();
        insert(&mut conn, &second).await.unwrap();

        insert(&mut conn, &draft_invoice(&masters, InvoiceKind::VendorBill, "BILL-00001", 1))
            .await
            .unwrap();

        let customer_invoices = InvoiceFilter {
            kind: Some(InvoiceKind::CustomerInvoice),
            ..InvoiceFilter::default()
        };
        let page = list(&mut conn, customer_invoices, PageRequest::default()).await.unwrap();
        let numbers: Vec<_> = page.items.iter().map(|i| i.number.as_str()).collect();
        assert_eq!(numbers, vec!["INV-00002", "INV-00001"]);
        assert_eq!(page.items[0].lines.len(), 1);

        let confirmed = InvoiceFilter {
            status: Some(InvoiceStatus::Confirmed),
            partner_id: Some(masters.customer.id),
            ..customer_invoices
        };
        let page = list(&mut conn, confirmed, PageRequest::default()).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, first.id);
    }
}
