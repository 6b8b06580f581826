use chrono::NaiveDate;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection};
use tracing::instrument;

use ledgerly_core::{Money, OrderStatus, Page, PageRequest};
use ledgerly_invoicing::DocumentLine;
use ledgerly_sales::{SalesOrder, SalesOrderId};
use ledgerly_tax::DocumentTotals;

use super::{lines, parse, parse_opt};
use crate::error::{StoreError, StoreResult};

const COLUMNS: &str = "id, number, customer_id, order_date, reference, status, subtotal, tax_total, total, invoice_id";

#[derive(Debug, FromRow)]
struct SalesOrderRow {
    id: String,
    number: String,
    customer_id: String,
    order_date: NaiveDate,
    reference: Option<String>,
    status: String,
    subtotal: i64,
    tax_total: i64,
    total: i64,
    invoice_id: Option<String>,
}

impl SalesOrderRow {
    fn into_order(self, lines: Vec<DocumentLine>) -> StoreResult<SalesOrder> {
        Ok(SalesOrder {
            id: parse(&self.id)?,
            number: self.number,
            customer_id: parse(&self.customer_id)?,
            order_date: self.order_date,
            reference: self.reference,
            status: parse(&self.status)?,
            lines,
            totals: DocumentTotals {
                subtotal: Money::from_minor(self.subtotal),
                tax_total: Money::from_minor(self.tax_total),
                total: Money::from_minor(self.total),
            },
            invoice_id: parse_opt(self.invoice_id.as_deref())?,
        })
    }
}

#[instrument(skip(conn, order), fields(number = %order.number), err)]
pub async fn insert(conn: &mut SqliteConnection, order: &SalesOrder) -> StoreResult<()> {
    sqlx::query(&format!(
        "INSERT INTO sales_orders ({COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
    ))
    .bind(order.id.to_string())
    .bind(&order.number)
    .bind(order.customer_id.to_string())
    .bind(order.order_date)
    .bind(&order.reference)
    .bind(order.status.as_str())
    .bind(order.totals.subtotal.minor())
    .bind(order.totals.tax_total.minor())
    .bind(order.totals.total.minor())
    .bind(order.invoice_id.map(|id| id.to_string()))
    .execute(&mut *conn)
    .await?;

    lines::replace(conn, order.id.0, &order.lines).await
}

/// Persist `order`, provided its stored status is still `prior`.
#[instrument(skip(conn, order), fields(number = %order.number, status = order.status.as_str()), err)]
pub async fn update(conn: &mut SqliteConnection, order: &SalesOrder, prior: OrderStatus) -> StoreResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE sales_orders
        SET customer_id = ?, order_date = ?, reference = ?, status = ?,
            subtotal = ?, tax_total = ?, total = ?, invoice_id = ?
        WHERE id = ? AND status = ?
        "#,
    )
    .bind(order.customer_id.to_string())
    .bind(order.order_date)
    .bind(&order.reference)
    .bind(order.status.as_str())
    .bind(order.totals.subtotal.minor())
    .bind(order.totals.tax_total.minor())
    .bind(order.totals.total.minor())
    .bind(order.invoice_id.map(|id| id.to_string()))
    .bind(order.id.to_string())
    .bind(prior.as_str())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        let current: Option<String> = sqlx::query_scalar("SELECT status FROM sales_orders WHERE id = ?")
            .bind(order.id.to_string())
            .fetch_optional(&mut *conn)
            .await?;
        return Err(match current {
            Some(status) => StoreError::StaleWrite(format!("{} is {status}, expected {}", order.number, prior.as_str())),
            None => StoreError::not_found("sales order", order.id),
        });
    }
    lines::replace(conn, order.id.0, &order.lines).await
}

pub async fn get(conn: &mut SqliteConnection, id: SalesOrderId) -> StoreResult<SalesOrder> {
    let row: Option<SalesOrderRow> =
        sqlx::query_as(&format!("SELECT {COLUMNS} FROM sales_orders WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&mut *conn)
            .await?;

    let row = row.ok_or_else(|| StoreError::not_found("sales order", id))?;
    let lines = lines::load(conn, id.0).await?;
    row.into_order(lines)
}

/// Newest first.
pub async fn list(
    conn: &mut SqliteConnection,
    status: Option<OrderStatus>,
    page: PageRequest,
) -> StoreResult<Page<SalesOrder>> {
    let total: i64 = filtered("SELECT COUNT(*) FROM sales_orders", status)
        .build_query_scalar()
        .fetch_one(&mut *conn)
        .await?;

    let mut qb = filtered(&format!("SELECT {COLUMNS} FROM sales_orders"), status);
    qb.push(" ORDER BY order_date DESC, number DESC LIMIT ")
        .push_bind(page.limit as i64)
        .push(" OFFSET ")
        .push_bind(page.offset());
    let rows: Vec<SalesOrderRow> = qb.build_query_as().fetch_all(&mut *conn).await?;

    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        let id: SalesOrderId = parse(&row.id)?;
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{date, memory_db, priced, seed_masters};
    use ledgerly_invoicing::InvoiceId;
    use ledgerly_products::TradeSide;

    fn order(masters: &crate::test_support::Masters, number: &str) -> SalesOrder {
        SalesOrder::new(
            SalesOrderId::generate(),
            number.to_string(),
            &masters.customer,
            date(2024, 4, 2),
            None,
            vec![priced(&masters.widget, 5, TradeSide::Sales, Some(&masters.sales_gst))],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn round_trips_with_lines() {
        let db = memory_db().await;
        let mut conn = db.acquire().await.unwrap();
        let masters = seed_masters(&mut conn).await;

        let so = order(&masters, "SO-00001");
        insert(&mut conn, &so).await.unwrap();
        assert_eq!(get(&mut conn, so.id).await.unwrap(), so);
    }

    #[tokio::test]
    async fn conversion_is_persisted_and_filterable() {
        let db = memory_db().await;
        let mut conn = db.acquire().await.unwrap();
        let masters = seed_masters(&mut conn).await;

        let mut so = order(&masters, "SO-00001");
        insert(&mut conn, &so).await.unwrap();
        insert(&mut conn, &order(&masters, "SO-00002")).await.unwrap();

        so.confirm().unwrap();
        let invoice_id = InvoiceId::generate();
        so.convert(invoice_id).unwrap();
        update(&mut conn, &so, OrderStatus::Draft).await.unwrap();

        let converted = list(&mut conn, Some(OrderStatus::Converted), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(converted.total, 1);
        assert_eq!(converted.items[0].invoice_id, Some(invoice_id));

        let all = list(&mut conn, None, PageRequest::default()).await.unwrap();
        assert_eq!(all.total, 2);
    }

    #[tokio::test]
    async fn cancel_based_on_a_draft_loses_to_a_confirm() {
        let db = memory_db().await;
        let mut conn = db.acquire().await.unwrap();
        let masters = seed_masters(&mut conn).await;

        let so = order(&masters, "SO-00001");
        insert(&mut conn, &so).await.unwrap();

        let mut confirming = so.clone();
        let mut cancelling = so.clone();
        confirming.confirm().unwrap();
        update(&mut conn, &confirming, OrderStatus::Draft).await.unwrap();

        cancelling.cancel().unwrap();
        let err = update(&mut conn, &cancelling, OrderStatus::Draft).await.unwrap_err();
        assert!(matches!(err, StoreError::StaleWrite(_)));
        assert_eq!(get(&mut conn, so.id).await.unwrap().status, OrderStatus::Confirmed);
    }

    #[tokio::test]
    async fn malformed_stored_ids_surface_as_corrupt() {
        let db = memory_db().await;
        let mut conn = db.acquire().await.unwrap();
        let masters = seed_masters(&mut conn).await;

        let so = order(&masters, "SO-00001");
        insert(&mut conn, &so).await.unwrap();
        sqlx::query("UPDATE sales_orders SET invoice_id = 'not-a-uuid' WHERE id = ?")
            .bind(so.id.to_string())
            .execute(&mut *conn)
            .await
            .unwrap();

        let err = get(&mut conn, so.id).await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }
}
