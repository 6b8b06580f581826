use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use ledgerly_auth::perms;
use ledgerly_purchasing::PurchaseOrderId;

use crate::app::dto;
use crate::app::errors::ApiResult;
use crate::app::routes::common::parse_filter;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/:id", get(get_order).put(update_order))
        .route("/:id/confirm", post(confirm_order))
        .route("/:id/cancel", post(cancel_order))
        .route("/:id/convert", post(convert_order))
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::DocumentListQuery>,
) -> ApiResult<Response> {
    authz::require(&principal, &perms::PURCHASES_READ)?;
    let status = parse_filter(query.status.as_deref())?;
    let page = services.list_purchase_orders(status, query.page_request()).await?;
    Ok(Json(page.map(dto::purchase_order_to_json)).into_response())
}

pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::CreateOrderRequest>,
) -> ApiResult<Response> {
    authz::require(&principal, &perms::PURCHASES_WRITE)?;
    let order = services.create_purchase_order(body).await?;
    Ok((StatusCode::CREATED, Json(dto::purchase_order_to_json(order))).into_response())
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    authz::require(&principal, &perms::PURCHASES_READ)?;
    let order = services.get_purchase_order(id.parse::<PurchaseOrderId>()?).await?;
    Ok(Json(dto::purchase_order_to_json(order)).into_response())
}

pub async fn update_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateOrderRequest>,
) -> ApiResult<Response> {
    authz::require(&principal, &perms::PURCHASES_WRITE)?;
    let order = services.update_purchase_order(id.parse()?, body).await?;
    Ok(Json(dto::purchase_order_to_json(order)).into_response())
}

pub async fn confirm_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    authz::require(&principal, &perms::PURCHASES_WRITE)?;
    let order = services.confirm_purchase_order(id.parse()?).await?;
    Ok(Json(dto::purchase_order_to_json(order)).into_response())
}

pub async fn cancel_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    authz::require(&principal, &perms::PURCHASES_WRITE)?;
    let order = services.cancel_purchase_order(id.parse()?).await?;
    Ok(Json(dto::purchase_order_to_json(order)).into_response())
}

/// Body is optional; dates default to today.
pub async fn convert_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Option<Json<dto::ConvertRequest>>,
) -> ApiResult<Response> {
    authz::require(&principal, &perms::PURCHASES_WRITE)?;
    authz::require(&principal, &perms::INVOICES_WRITE)?;

    let req = body.map(|Json(b)| b).unwrap_or_default();
    let (order, bill) = services.convert_purchase_order(id.parse()?, req).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "order": dto::purchase_order_to_json(order),
            "bill": dto::invoice_to_json(bill),
        })),
    )
        .into_response())
}
