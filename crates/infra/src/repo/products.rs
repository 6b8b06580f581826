use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection};
use tracing::instrument;

use ledgerly_core::{Money, Page, PageRequest};
use ledgerly_products::{Product, ProductId, ProductKind};

use super::{parse, parse_opt, push_search};
use crate::error::{StoreError, StoreResult};

const COLUMNS: &str =
    "id, name, kind, category, hsn_code, sales_price, purchase_price, sales_tax_id, purchase_tax_id, status";

#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Matches name, category or HSN code.
    pub search: Option<String>,
    pub kind: Option<ProductKind>,
    pub include_archived: bool,
}

#[derive(Debug, FromRow)]
struct ProductRow {
    id: String,
    name: String,
    kind: String,
    category: Option<String>,
    hsn_code: Option<String>,
    sales_price: i64,
    purchase_price: i64,
    sales_tax_id: Option<String>,
    purchase_tax_id: Option<String>,
    status: String,
}

impl TryFrom<ProductRow> for Product {
    type Error = StoreError;

    fn try_from(row: ProductRow) -> StoreResult<Self> {
        Ok(Product {
            id: parse(&row.id)?,
            name: row.name,
            kind: parse(&row.kind)?,
            category: row.category,
            hsn_code: row.hsn_code,
            sales_price: Money::from_minor(row.sales_price),
            purchase_price: Money::from_minor(row.purchase_price),
            sales_tax_id: parse_opt(row.sales_tax_id.as_deref())?,
            purchase_tax_id: parse_opt(row.purchase_tax_id.as_deref())?,
            status: parse(&row.status)?,
        })
    }
}

#[instrument(skip(conn, product), fields(product_id = %product.id), err)]
pub async fn insert(conn: &mut SqliteConnection, product: &Product) -> StoreResult<()> {
    sqlx::query(&format!(
        "INSERT INTO products ({COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
    ))
    .bind(product.id.to_string())
    .bind(&product.name)
    .bind(product.kind.as_str())
    .bind(&product.category)
    .bind(&product.hsn_code)
    .bind(product.sales_price.minor())
    .bind(product.purchase_price.minor())
    .bind(product.sales_tax_id.map(|id| id.to_string()))
    .bind(product.purchase_tax_id.map(|id| id.to_string()))
    .bind(product.status.as_str())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

#[instrument(skip(conn, product), fields(product_id = %product.id), err)]
pub async fn update(conn: &mut SqliteConnection, product: &Product) -> StoreResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE products
        SET name = ?, kind = ?, category = ?, hsn_code = ?, sales_price = ?, purchase_price = ?,
            sales_tax_id = ?, purchase_tax_id = ?, status = ?
        WHERE id = ?
        "#,
    )
    .bind(&product.name)
    .bind(product.kind.as_str())
    .bind(&product.category)
    .bind(&product.hsn_code)
    .bind(product.sales_price.minor())
    .bind(product.purchase_price.minor())
    .bind(product.sales_tax_id.map(|id| id.to_string()))
    .bind(product.purchase_tax_id.map(|id| id.to_string()))
    .bind(product.status.as_str())
    .bind(product.id.to_string())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::not_found("product", product.id));
    }
    Ok(())
}

pub async fn get(conn: &mut SqliteConnection, id: ProductId) -> StoreResult<Product> {
    let row: Option<ProductRow> = sqlx::query_as(&format!("SELECT {COLUMNS} FROM products WHERE id = ?"))
        .bind(id.to_string())
        .fetch_optional(&mut *conn)
        .await?;

    row.ok_or_else(|| StoreError::not_found("product", id))?.try_into()
}

pub async fn list(conn: &mut SqliteConnection, filter: &ProductFilter, page: PageRequest) -> StoreResult<Page<Product>> {
    let total: i64 = filtered("SELECT COUNT(*) FROM products", filter)
        .build_query_scalar()
        .fetch_one(&mut *conn)
        .await?;

    let mut qb = filtered(&format!("SELECT {COLUMNS} FROM products"), filter);
    qb.push(" ORDER BY name COLLATE NOCASE, id LIMIT ")
        .push_bind(page.limit as i64)
        .push(" OFFSET ")
        .push_bind(page.offset());
    let rows: Vec<ProductRow> = qb.build_query_as().fetch_all(&mut *conn).await?;

    let items = rows.into_iter().map(Product::try_from).collect::<StoreResult<Vec<_>>>()?;
    Ok(Page::new(items, page, total as u64))
}

/// Every goods product, archived ones included (they may still hold stock).
pub async fn list_goods(conn: &mut SqliteConnection) -> StoreResult<Vec<Product>> {
    let rows: Vec<ProductRow> = sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM products WHERE kind = 'goods' ORDER BY name COLLATE NOCASE"
    ))
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter().map(Product::try_from).collect()
}

fn filtered<'a>(select: &str, filter: &'a ProductFilter) -> QueryBuilder<'a, Sqlite> {
    let mut qb = QueryBuilder::new(select);
    qb.push(" WHERE 1 = 1");
    if !filter.include_archived {
        qb.push(" AND status = 'active'");
    }
    if let Some(kind) = filter.kind {
        qb.push(" AND kind = ").push_bind(kind.as_str());
    }
    if let Some(term) = filter.search.as_deref().filter(|t| !t.trim().is_empty()) {
        push_search(&mut qb, &["name", "category", "hsn_code"], term);
    }
    qb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::taxes;
    use crate::test_support::{goods, memory_db, percent_tax};
    use ledgerly_products::ProductPatch;
    use ledgerly_tax::TaxScope;

    #[tokio::test]
    async fn round_trips_default_taxes() {
        let db = memory_db().await;
        let mut conn = db.acquire().await.unwrap();

        let gst = percent_tax("GST 18%", 1800, TaxScope::Sales);
        taxes::insert(&mut conn, &gst).await.unwrap();

        let mut chair = goods("Chair", 2_500);
        chair.sales_tax_id = Some(gst.id);
        insert(&mut conn, &chair).await.unwrap();
        assert_eq!(get(&mut conn, chair.id).await.unwrap(), chair);

        chair
            .update(ProductPatch {
                sales_tax_id: Some(None),
                ..ProductPatch::default()
            })
            .unwrap();
        update(&mut conn, &chair).await.unwrap();
        assert_eq!(get(&mut conn, chair.id).await.unwrap().sales_tax_id, None);
    }

    #[tokio::test]
    async fn unknown_tax_reference_is_rejected() {
        let db = memory_db().await;
        let mut conn = db.acquire().await.unwrap();

        let mut chair = goods("Chair", 2_500);
        chair.purchase_tax_id = Some(ledgerly_tax::TaxId::generate());
        let err = insert(&mut conn, &chair).await.unwrap_err();
        assert!(matches!(err, StoreError::ForeignKeyViolation(_)));
    }

    #[tokio::test]
    async fn list_searches_and_pages() {
        let db = memory_db().await;
        let mut conn = db.acquire().await.unwrap();

        for name in ["Desk", "Desk Lamp", "Chair"] {
            insert(&mut conn, &goods(name, 1_000)).await.unwrap();
        }

        let filter = ProductFilter {
            search: Some("desk".to_string()),
            ..ProductFilter::default()
        };
        let page = list(&mut conn, &filter, PageRequest::default()).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items[0].name, "Desk");

        assert_eq!(list_goods(&mut conn).await.unwrap().len(), 3);
    }
}
