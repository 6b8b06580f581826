use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection};
use tracing::instrument;

use ledgerly_tax::{Tax, TaxId, TaxRule, TaxScope};

use super::parse;
use crate::error::{StoreError, StoreResult};

#[derive(Debug, Clone, Copy, Default)]
pub struct TaxFilter {
    pub scope: Option<TaxScope>,
    pub include_archived: bool,
}

#[derive(Debug, FromRow)]
struct TaxRow {
    id: String,
    name: String,
    computation: String,
    value: i64,
    scope: String,
    active: bool,
}

impl TryFrom<TaxRow> for Tax {
    type Error = StoreError;

    fn try_from(row: TaxRow) -> StoreResult<Self> {
        Ok(Tax {
            id: parse(&row.id)?,
            name: row.name,
            rule: TaxRule {
                computation: parse(&row.computation)?,
                value: row.value,
            },
            scope: parse(&row.scope)?,
            active: row.active,
        })
    }
}

#[instrument(skip(conn, tax), fields(tax_id = %tax.id), err)]
pub async fn insert(conn: &mut SqliteConnection, tax: &Tax) -> StoreResult<()> {
    sqlx::query("INSERT INTO taxes (id, name, computation, value, scope, active) VALUES (?, ?, ?, ?, ?, ?)")
        .bind(tax.id.to_string())
        .bind(&tax.name)
        .bind(tax.rule.computation.as_str())
        .bind(tax.rule.value)
        .bind(tax.scope.as_str())
        .bind(tax.active)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

#[instrument(skip(conn, tax), fields(tax_id = %tax.id), err)]
pub async fn update(conn: &mut SqliteConnection, tax: &Tax) -> StoreResult<()> {
    let result = sqlx::query("UPDATE taxes SET name = ?, computation = ?, value = ?, scope = ?, active = ? WHERE id = ?")
        .bind(&tax.name)
        .bind(tax.rule.computation.as_str())
        .bind(tax.rule.value)
        .bind(tax.scope.as_str())
        .bind(tax.active)
        .bind(tax.id.to_string())
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::not_found("tax", tax.id));
    }
    Ok(())
}

pub async fn get(conn: &mut SqliteConnection, id: TaxId) -> StoreResult<Tax> {
    let row: Option<TaxRow> =
        sqlx::query_as("SELECT id, name, computation, value, scope, active FROM taxes WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&mut *conn)
            .await?;

    row.ok_or_else(|| StoreError::not_found("tax", id))?.try_into()
}

pub async fn list(conn: &mut SqliteConnection, filter: TaxFilter) -> StoreResult<Vec<Tax>> {
    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT id, name, computation, value, scope, active FROM taxes WHERE 1 = 1");
    if !filter.include_archived {
        qb.push(" AND active = 1");
    }
    if let Some(scope) = filter.scope {
        qb.push(" AND scope = ").push_bind(scope.as_str());
    }
    qb.push(" ORDER BY name COLLATE NOCASE, id");

    let rows: Vec<TaxRow> = qb.build_query_as().fetch_all(&mut *conn).await?;
    rows.into_iter().map(Tax::try_from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{memory_db, percent_tax};

    #[tokio::test]
    async fn round_trips_rule_and_scope() {
        let db = memory_db().await;
        let mut conn = db.acquire().await.unwrap();

        let gst = percent_tax("GST 18%", 1800, TaxScope::Sales);
        insert(&mut conn, &gst).await.unwrap();
        assert_eq!(get(&mut conn, gst.id).await.unwrap(), gst);
    }

    #[tokio::test]
    async fn list_hides_archived_and_filters_scope() {
        let db = memory_db().await;
        let mut conn = db.acquire().await.unwrap();

        let sales = percent_tax("GST 18%", 1800, TaxScope::Sales);
        let purchase = percent_tax("GST 12%", 1200, TaxScope::Purchase);
        let mut old = percent_tax("GST 28%", 2800, TaxScope::Sales);
        old.archive().unwrap();
        for tax in [&sales, &purchase, &old] {
            insert(&mut conn, tax).await.unwrap();
        }

        let only_sales = TaxFilter {
            scope: Some(TaxScope::Sales),
            include_archived: false,
        };
        let listed = list(&mut conn, only_sales).await.unwrap();
        assert_eq!(listed, vec![sales]);

        let everything = list(&mut conn, TaxFilter { include_archived: true, ..TaxFilter::default() })
            .await
            .unwrap();
        assert_eq!(everything.len(), 3);
    }
}
