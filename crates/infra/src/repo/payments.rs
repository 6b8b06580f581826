use chrono::NaiveDate;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection};
use tracing::instrument;

use ledgerly_core::{Money, Page, PageRequest};
use ledgerly_invoicing::{InvoiceId, Payment};
use ledgerly_parties::ContactId;

use super::parse;
use crate::error::{StoreError, StoreResult};

const COLUMNS: &str = "id, number, invoice_id, partner_id, direction, method, amount, payment_date, memo";

#[derive(Debug, FromRow)]
struct PaymentRow {
    id: String,
    number: String,
    invoice_id: String,
    partner_id: String,
    direction: String,
    method: String,
    amount: i64,
    payment_date: NaiveDate,
    memo: Option<String>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = StoreError;

    fn try_from(row: PaymentRow) -> StoreResult<Self> {
        Ok(Payment {
            id: parse(&row.id)?,
            number: row.number,
            invoice_id: parse(&row.invoice_id)?,
            partner_id: parse(&row.partner_id)?,
            direction: parse(&row.direction)?,
            method: parse(&row.method)?,
            amount: Money::from_minor(row.amount),
            payment_date: row.payment_date,
            memo: row.memo,
        })
    }
}

#[instrument(skip(conn, payment), fields(number = %payment.number, amount = payment.amount.minor()), err)]
pub async fn insert(conn: &mut SqliteConnection, payment: &Payment) -> StoreResult<()> {
    sqlx::query(&format!("INSERT INTO payments ({COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"))
        .bind(payment.id.to_string())
        .bind(&payment.number)
        .bind(payment.invoice_id.to_string())
        .bind(payment.partner_id.to_string())
        .bind(payment.direction.as_str())
        .bind(payment.method.as_str())
        .bind(payment.amount.minor())
        .bind(payment.payment_date)
        .bind(&payment.memo)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Payments registered against one invoice or bill, oldest first.
pub async fn list_for_invoice(conn: &mut SqliteConnection, invoice_id: InvoiceId) -> StoreResult<Vec<Payment>> {
    let rows: Vec<PaymentRow> = sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM payments WHERE invoice_id = ? ORDER BY payment_date, number"
    ))
    .bind(invoice_id.to_string())
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter().map(Payment::try_from).collect()
}

/// Newest first, optionally for one partner.
pub async fn list(
    conn: &mut SqliteConnection,
    partner_id: Option<ContactId>,
    page: PageRequest,
) -> StoreResult<Page<Payment>> {
    let total: i64 = filtered("SELECT COUNT(*) FROM payments", partner_id)
        .build_query_scalar()
        .fetch_one(&mut *conn)
        .await?;

    let mut qb = filtered(&format!("SELECT {COLUMNS} FROM payments"), partner_id);
    qb.push(" ORDER BY payment_date DESC, number DESC LIMIT ")
        .push_bind(page.limit as i64)
        .push(" OFFSET ")
        .push_bind(page.offset());
    let rows: Vec<PaymentRow> = qb.build_query_as().fetch_all(&mut *conn).await?;

    let items = rows.into_iter().map(Payment::try_from).collect::<StoreResult<Vec<_>>>()?;
    Ok(Page::new(items, page, total as u64))
}

fn filtered<'a>(select: &str, partner_id: Option<ContactId>) -> QueryBuilder<'a, Sqlite> {
    let mut qb = QueryBuilder::new(select);
    if let Some(partner_id) = partner_id {
        qb.push(" WHERE partner_id = ").push_bind(partner_id.to_string());
    }
    qb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::invoices;
    use crate::test_support::{date, draft_invoice, memory_db, seed_masters};
    use ledgerly_invoicing::{InvoiceKind, NewPayment, PaymentDirection, PaymentId, PaymentMethod};

    #[tokio::test]
    async fn payments_list_per_invoice_and_partner() {
        let db = memory_db().await;
        let mut conn = db.acquire().await.unwrap();
        let masters = seed_masters(&mut conn).await;

        let mut bill = draft_invoice(&masters, InvoiceKind::VendorBill, "BILL-00001", 2);
        bill.confirm().unwrap();
        invoices::insert(&mut conn, &bill).await.unwrap();

        for (n, amount) in [(1, 300), (2, 200)] {
            let payment = Payment::register(
                PaymentId::generate(),
                format!("PAY-0000{n}"),
                &mut bill,
                NewPayment {
                    amount: Money::from_minor(amount),
                    method: PaymentMethod::Bank,
                    payment_date: date(2024, 4, 10 + n),
                    memo: None,
                },
            )
            .unwrap();
            insert(&mut conn, &payment).await.unwrap();
        }

        let for_bill = list_for_invoice(&mut conn, bill.id).await.unwrap();
        assert_eq!(for_bill.len(), 2);
        assert_eq!(for_bill[0].number, "PAY-00001");
        assert_eq!(for_bill[0].direction, PaymentDirection::Outbound);

        let vendor_page = list(&mut conn, Some(masters.vendor.id), PageRequest::default()).await.unwrap();
        assert_eq!(vendor_page.total, 2);
        assert_eq!(vendor_page.items[0].number, "PAY-00002");

        let customer_page = list(&mut conn, Some(masters.customer.id), PageRequest::default()).await.unwrap();
        assert_eq!(customer_page.total, 0);
    }
}
