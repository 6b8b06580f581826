use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use ledgerly_auth::{perms, AuthzError};

use crate::app::dto;
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new().route("/invoices", get(my_invoices))
}

/// Confirmed invoices and bills of the contact the caller is bound to.
pub async fn my_invoices(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::PageQuery>,
) -> ApiResult<Response> {
    authz::require(&principal, &perms::PORTAL_READ)?;
    // Admins hold `*` but have no contact to show.
    let contact_id = principal
        .contact_id()
        .ok_or_else(|| AuthzError::Forbidden(perms::PORTAL_READ.as_str().to_string()))?;

    let page = services.portal_invoices(contact_id, query.page_request()).await?;
    Ok(Json(page.map(dto::invoice_to_json)).into_response())
}
