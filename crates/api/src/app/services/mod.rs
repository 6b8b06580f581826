//! Application services: one method per API operation.
//!
//! Services own the transaction boundary. Each write loads what it needs through
//! the repositories, lets the domain types decide, and persists the result
//! (document, lines, sequence number and journal entry) in a single transaction.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use sqlx::SqliteConnection;

use ledgerly_auth::JwtManager;
use ledgerly_core::DomainError;
use ledgerly_infra::repo::{products, taxes};
use ledgerly_infra::{Database, StoreError, StoreResult};
use ledgerly_invoicing::{DocumentLine, LineDraft};
use ledgerly_products::TradeSide;

use crate::app::errors::ApiResult;

mod auth;
mod documents;
mod ledger;
mod masters;

pub struct AppServices {
    db: Database,
    jwt: Arc<JwtManager>,
}

impl AppServices {
    pub fn new(db: Database, jwt: JwtManager) -> Self {
        Self { db, jwt: Arc::new(jwt) }
    }

    pub fn jwt(&self) -> Arc<JwtManager> {
        self.jwt.clone()
    }

    pub async fn ping(&self) -> ApiResult<()> {
        Ok(self.db.ping().await?)
    }
}

pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// January 1st of the year `date` falls in.
pub(crate) fn start_of_year(date: NaiveDate) -> NaiveDate {
    date.with_ordinal(1).unwrap_or(date)
}

/// A referenced row that does not exist is the caller's mistake, not a missing resource.
pub(crate) fn referenced<T>(result: StoreResult<T>) -> ApiResult<T> {
    match result {
        Err(StoreError::NotFound { entity, id }) => {
            Err(DomainError::validation(format!("{entity} {id} does not exist")).into())
        }
        other => Ok(other?),
    }
}

/// Resolve products and taxes for submitted lines and price them.
pub(crate) async fn price_lines(
    conn: &mut SqliteConnection,
    drafts: &[LineDraft],
    side: TradeSide,
) -> ApiResult<Vec<DocumentLine>> {
    let mut lines = Vec::with_capacity(drafts.len());
    for (idx, draft) in drafts.iter().enumerate() {
        let line_no = idx as u32 + 1;

        let product = match products::get(conn, draft.product_id).await {
            Err(StoreError::NotFound { .. }) => {
                return Err(DomainError::validation(format!(
                    "line {line_no}: product {} does not exist",
                    draft.product_id
                ))
                .into());
            }
            other => other?,
        };

        let tax = match draft.tax_to_apply(&product, side) {
            Some(tax_id) => Some(referenced(taxes::get(conn, tax_id).await)?),
            None => None,
        };

        lines.push(DocumentLine::price(line_no, draft, &product, side, tax.as_ref())?);
    }
    Ok(lines)
}
