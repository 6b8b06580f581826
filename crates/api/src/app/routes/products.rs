use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use ledgerly_auth::perms;
use ledgerly_infra::repo::products::ProductFilter;
use ledgerly_products::ProductId;

use crate::app::dto;
use crate::app::errors::ApiResult;
use crate::app::routes::common::parse_filter;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/:id", get(get_product).patch(update_product).delete(archive_product))
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::MasterListQuery>,
) -> ApiResult<Response> {
    authz::require(&principal, &perms::PRODUCTS_READ)?;

    let filter = ProductFilter {
        search: query.search.clone(),
        kind: parse_filter(query.kind.as_deref())?,
        include_archived: query.include_archived,
    };
    let page = services.list_products(&filter, query.page_request()).await?;
    Ok(Json(page.map(dto::product_to_json)).into_response())
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::CreateProductRequest>,
) -> ApiResult<Response> {
    authz::require(&principal, &perms::PRODUCTS_WRITE)?;
    let product = services.create_product(body.into()).await?;
    Ok((StatusCode::CREATED, Json(dto::product_to_json(product))).into_response())
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    authz::require(&principal, &perms::PRODUCTS_READ)?;
    let product = services.get_product(id.parse::<ProductId>()?).await?;
    Ok(Json(dto::product_to_json(product)).into_response())
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateProductRequest>,
) -> ApiResult<Response> {
    authz::require(&principal, &perms::PRODUCTS_WRITE)?;
    let product = services.update_product(id.parse()?, body.into()).await?;
    Ok(Json(dto::product_to_json(product)).into_response())
}

pub async fn archive_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    authz::require(&principal, &perms::PRODUCTS_WRITE)?;
    let product = services.archive_product(id.parse()?).await?;
    Ok(Json(dto::product_to_json(product)).into_response())
}
