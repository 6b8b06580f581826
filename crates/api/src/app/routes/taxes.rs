use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use ledgerly_auth::perms;
use ledgerly_infra::repo::taxes::TaxFilter;
use ledgerly_tax::{NewTax, TaxId, TaxPatch};

use crate::app::dto;
use crate::app::errors::ApiResult;
use crate::app::routes::common::parse_filter;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_taxes).post(create_tax))
        .route("/:id", get(get_tax).patch(update_tax).delete(archive_tax))
}

pub async fn list_taxes(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::TaxListQuery>,
) -> ApiResult<Response> {
    authz::require(&principal, &perms::TAXES_READ)?;

    let filter = TaxFilter {
        scope: parse_filter(query.scope.as_deref())?,
        include_archived: query.include_archived,
    };
    let items = services
        .list_taxes(filter)
        .await?
        .into_iter()
        .map(dto::tax_to_json)
        .collect::<Vec<_>>();
    Ok(Json(json!({ "items": items })).into_response())
}

pub async fn create_tax(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<NewTax>,
) -> ApiResult<Response> {
    authz::require(&principal, &perms::TAXES_WRITE)?;
    let tax = services.create_tax(body).await?;
    Ok((StatusCode::CREATED, Json(dto::tax_to_json(tax))).into_response())
}

pub async fn get_tax(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    authz::require(&principal, &perms::TAXES_READ)?;
    let tax = services.get_tax(id.parse::<TaxId>()?).await?;
    Ok(Json(dto::tax_to_json(tax)).into_response())
}

pub async fn update_tax(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<TaxPatch>,
) -> ApiResult<Response> {
    authz::require(&principal, &perms::TAXES_WRITE)?;
    let tax = services.update_tax(id.parse()?, body).await?;
    Ok(Json(dto::tax_to_json(tax)).into_response())
}

pub async fn archive_tax(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    authz::require(&principal, &perms::TAXES_WRITE)?;
    let tax = services.archive_tax(id.parse()?).await?;
    Ok(Json(dto::tax_to_json(tax)).into_response())
}
