use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use ledgerly_auth::perms;
use ledgerly_parties::ContactId;

use crate::app::dto;
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/balance-sheet", get(balance_sheet))
        .route("/profit-loss", get(profit_loss))
        .route("/stock-statement", get(stock_statement))
        .route("/partner-ledger", get(partner_ledger))
}

pub async fn balance_sheet(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::AsOfQuery>,
) -> ApiResult<Response> {
    authz::require(&principal, &perms::REPORTS_READ)?;
    let report = services.balance_sheet(query.as_of).await?;
    Ok(Json(report).into_response())
}

pub async fn profit_loss(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::RangeQuery>,
) -> ApiResult<Response> {
    authz::require(&principal, &perms::REPORTS_READ)?;
    let report = services.profit_and_loss(query.from, query.to).await?;
    Ok(Json(report).into_response())
}

pub async fn stock_statement(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> ApiResult<Response> {
    authz::require(&principal, &perms::REPORTS_READ)?;
    let report = services.stock_statement().await?;
    Ok(Json(report).into_response())
}

pub async fn partner_ledger(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::PartnerLedgerQuery>,
) -> ApiResult<Response> {
    authz::require(&principal, &perms::REPORTS_READ)?;
    let partner_id: ContactId = query.partner_id.parse()?;
    let report = services.partner_ledger(partner_id, query.from, query.to).await?;
    Ok(Json(report).into_response())
}
