use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use ledgerly_accounting::JournalEntryId;
use ledgerly_auth::perms;

use crate::app::dto;
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/balances", get(balances))
        .route("/journal", get(list_journal).post(post_manual_entry))
        .route("/journal/:id", get(get_journal_entry))
}

pub async fn balances(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::AsOfQuery>,
) -> ApiResult<Response> {
    authz::require(&principal, &perms::LEDGER_READ)?;
    let items = services.account_balances(query.as_of).await?;
    Ok(Json(json!({ "items": items })).into_response())
}

pub async fn list_journal(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::PageQuery>,
) -> ApiResult<Response> {
    authz::require(&principal, &perms::LEDGER_READ)?;
    let page = services.list_journal(query.page_request()).await?;
    Ok(Json(page).into_response())
}

pub async fn get_journal_entry(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    authz::require(&principal, &perms::LEDGER_READ)?;
    let entry = services.get_journal_entry(id.parse::<JournalEntryId>()?).await?;
    Ok(Json(entry).into_response())
}

pub async fn post_manual_entry(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::ManualEntryRequest>,
) -> ApiResult<Response> {
    authz::require(&principal, &perms::LEDGER_POST)?;
    let entry = services.post_manual_entry(body).await?;
    Ok((StatusCode::CREATED, Json(entry)).into_response())
}
