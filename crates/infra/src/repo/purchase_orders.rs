use chrono::NaiveDate;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection};
use tracing::instrument;

use ledgerly_core::{Money, OrderStatus, Page, PageRequest};
use ledgerly_invoicing::DocumentLine;
use ledgerly_purchasing::{PurchaseOrder, PurchaseOrderId};
use ledgerly_tax::DocumentTotals;

use super::{lines, parse, parse_opt};
use crate::error::{StoreError, StoreResult};

const COLUMNS: &str = "id, number, vendor_id, order_date, reference, status, subtotal, tax_total, total, bill_id";

#[derive(Debug, FromRow)]
struct PurchaseOrderRow {
    id: String,
    number: String,
    vendor_id: String,
    order_date: NaiveDate,
    reference: Option<String>,
    status: String,
    subtotal: i64,
    tax_total: i64,
    total: i64,
    bill_id: Option<String>,
}

impl PurchaseOrderRow {
    fn into_order(self, lines: Vec<DocumentLine>) -> StoreResult<PurchaseOrder> {
        Ok(PurchaseOrder {
            id: parse(&self.id)?,
            number: self.number,
            vendor_id: parse(&self.vendor_id)?,
            order_date: self.order_date,
            reference: self.reference,
            status: parse(&self.status)?,
            lines,
            totals: DocumentTotals {
                subtotal: Money::from_minor(self.subtotal),
                tax_total: Money::from_minor(self.tax_total),
                total: Money::from_minor(self.total),
            },
            bill_id: parse_opt(self.bill_id.as_deref())?,
        })
    }
}

#[instrument(skip(conn, order), fields(number = %order.number), err)]
pub async fn insert(conn: &mut SqliteConnection, order: &PurchaseOrder) -> StoreResult<()> {
    sqlx::query(&format!(
        "INSERT INTO purchase_orders ({COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
    ))
    .bind(order.id.to_string())
    .bind(&order.number)
    .bind(order.vendor_id.to_string())
    .bind(order.order_date)
    .bind(&order.reference)
    .bind(order.status.as_str())
    .bind(order.totals.subtotal.minor())
    .bind(order.totals.tax_total.minor())
    .bind(order.totals.total.minor())
    .bind(order.bill_id.map(|id| id.to_string()))
    .execute(&mut *conn)
    .await?;

    lines::replace(conn, order.id.0, &order.lines).await
}

/// Persist `order`, provided its stored status is still `prior`.
#[instrument(skip(conn, order), fields(number = %order.number, status = order.status.as_str()), err)]
pub async fn update(conn: &mut SqliteConnection, order: &PurchaseOrder, prior: OrderStatus) -> StoreResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE purchase_orders
        SET vendor_id = ?, order_date = ?, reference = ?, status = ?,
            subtotal = ?, tax_total = ?, total = ?, bill_id = ?
        WHERE id = ? AND status = ?
        "#,
    )
    .bind(order.vendor_id.to_string())
    .bind(order.order_date)
    .bind(&order.reference)
    .bind(order.status.as_str())
    .bind(order.totals.subtotal.minor())
    .bind(order.totals.tax_total.minor())
    .bind(order.totals.total.minor())
    .bind(order.bill_id.map(|id| id.to_string()))
    .bind(order.id.to_string())
    .bind(prior.as_str())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        let current: Option<String> = sqlx::query_scalar("SELECT status FROM purchase_orders WHERE id = ?")
            .bind(order.id.to_string())
            .fetch_optional(&mut *conn)
            .await?;
        return Err(match current {
            Some(status) => StoreError::StaleWrite(format!("{} is {status}, expected {}", order.number, prior.as_str())),
            None => StoreError::not_found("purchase order", order.id),
        });
    }
    lines::replace(conn, order.id.0, &order.lines).await
}

pub async fn get(conn: &mut SqliteConnection, id: PurchaseOrderId) -> StoreResult<PurchaseOrder> {
    let row: Option<PurchaseOrderRow> =
        sqlx::query_as(&format!("SELECT {COLUMNS} FROM purchase_orders WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&mut *conn)
            .await?;

    let row = row.ok_or_else(|| StoreError::not_found("purchase order", id))?;
    let lines = lines::load(conn, id.0).await?;
    row.into_order(lines)
}

/// Newest first.
pub async fn list(
    conn: &mut SqliteConnection,
    status: Option<OrderStatus>,
    page: PageRequest,
) -> StoreResult<Page<PurchaseOrder>> {
    let total: i64 = filtered("SELECT COUNT(*) FROM purchase_orders", status)
        .build_query_scalar()
        .fetch_one(&mut *conn)
        .await?;

    let mut qb = filtered(&format!("SELECT {COLUMNS} FROM purchase_orders"), status);
    qb.push(" ORDER BY order_date DESC, number DESC LIMIT ")
        .push_bind(page.limit as i64)
        .push(" OFFSET ")
        .push_bind(page.offset());
    let rows: Vec<PurchaseOrderRow> = qb.build_query_as().fetch_all(&mut *conn).await?;

    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        let id: PurchaseOrderId = parse(&row.id)?;
        let lines = lines::load(conn, id.0).await?;
        items.push(row.into_order(lines)?);
    }
    Ok(Page::new(items, page, total as u64))
}

fn filtered<'a>(select: &str, status: Option<OrderStatus>) -> QueryBuilder<'a, Sqlite> {
    let mut qb = QueryBuilder::new(select);
    if let Some(status) = status {
        qb.push(" WHERE status = ").push_bind(status.as_str());
    }
    qb
}
