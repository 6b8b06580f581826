use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use ledgerly_auth::perms;

use crate::app::dto;
use crate::app::errors::ApiResult;
use crate::app::routes::common::parse_filter;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new().route("/", get(list_payments))
}

pub async fn list_payments(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::DocumentListQuery>,
) -> ApiResult<Response> {
    authz::require(&principal, &perms::PAYMENTS_READ)?;
    let partner_id = parse_filter(query.partner_id.as_deref())?;
    let page = services.list_payments(partner_id, query.page_request()).await?;
    Ok(Json(page.map(dto::payment_to_json)).into_response())
}
