//! Lines of orders, invoices and bills, keyed by the owning document id.

use sqlx::{FromRow, SqliteConnection};

use ledgerly_core::{EntityId, Money};
use ledgerly_invoicing::{AppliedTax, DocumentLine};
use ledgerly_tax::{LineAmounts, TaxRule};

use super::parse;
use crate::error::{StoreError, StoreResult};

#[derive(Debug, FromRow)]
struct LineRow {
    line_no: i64,
    product_id: String,
    description: String,
    quantity: i64,
    unit_price: i64,
    tax_id: Option<String>,
    tax_name: Option<String>,
    tax_computation: Option<String>,
    tax_value: Option<i64>,
    subtotal: i64,
    tax_amount: i64,
    total: i64,
}

impl TryFrom<LineRow> for DocumentLine {
    type Error = StoreError;

    fn try_from(row: LineRow) -> StoreResult<Self> {
        let tax = match (row.tax_id, row.tax_name, row.tax_computation, row.tax_value) {
            (Some(id), Some(name), Some(computation), Some(value)) => Some(AppliedTax {
                tax_id: parse(&id)?,
                name,
                rule: TaxRule {
                    computation: parse(&computation)?,
                    value,
                },
            }),
            (None, None, None, None) => None,
            _ => {
                return Err(StoreError::Corrupt(format!(
                    "line {} has a partial tax snapshot",
                    row.line_no
                )));
            }
        };

        Ok(DocumentLine {
            line_no: u32::try_from(row.line_no)
                .map_err(|_| StoreError::Corrupt(format!("invalid line number {}", row.line_no)))?,
            product_id: parse(&row.product_id)?,
            description: row.description,
            quantity: row.quantity,
            unit_price: Money::from_minor(row.unit_price),
            tax,
            amounts: LineAmounts {
                subtotal: Money::from_minor(row.subtotal),
                tax: Money::from_minor(row.tax_amount),
                total: Money::from_minor(row.total),
            },
        })
    }
}

/// Replace every line of `document_id` with `lines`.
pub async fn replace(conn: &mut SqliteConnection, document_id: EntityId, lines: &[DocumentLine]) -> StoreResult<()> {
    sqlx::query("DELETE FROM document_lines WHERE document_id = ?")
        .bind(document_id.to_string())
        .execute(&mut *conn)
        .await?;

    for line in lines {
        sqlx::query(
            r#"
            INSERT INTO document_lines (
                document_id, line_no, product_id, description, quantity, unit_price,
                tax_id, tax_name, tax_computation, tax_value, subtotal, tax_amount, total
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(document_id.to_string())
        .bind(line.line_no as i64)
        .bind(line.product_id.to_string())
        .bind(&line.description)
        .bind(line.quantity)
        .bind(line.unit_price.minor())
        .bind(line.tax.as_ref().map(|t| t.tax_id.to_string()))
        .bind(line.tax.as_ref().map(|t| t.name.clone()))
        .bind(line.tax.as_ref().map(|t| t.rule.computation.as_str()))
        .bind(line.tax.as_ref().map(|t| t.rule.value))
        .bind(line.amounts.subtotal.minor())
        .bind(line.amounts.tax.minor())
        .bind(line.amounts.total.minor())
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

pub async fn load(conn: &mut SqliteConnection, document_id: EntityId) -> StoreResult<Vec<DocumentLine>> {
    let rows: Vec<LineRow> = sqlx::query_as(
        r#"
        SELECT line_no, product_id, description, quantity, unit_price,
               tax_id, tax_name, tax_computation, tax_value, subtotal, tax_amount, total
        FROM document_lines
        WHERE document_id = ?
        ORDER BY line_no
        "#,
    )
    .bind(document_id.to_string())
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter().map(DocumentLine::try_from).collect()
}
