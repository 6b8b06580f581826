//! Customer invoices and vendor bills share one set of handlers; the router
//! is mounted twice with the document kind as an extension.

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
use ledgerly_infra::repo::invoices::InvoiceFilter;
use ledgerly_invoicing::{InvoiceId, InvoiceKind};

use crate::app::dto;
use crate::app::errors::ApiResult;
use crate::app::routes::common::parse_filter;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router(kind: InvoiceKind) -> Router {
    Router::new()
        .route("/", get(list_invoices).post(create_invoice))
        .route("/:id", get(get_invoice).put(update_invoice))
        .route("/:id/confirm", post(confirm_invoice))
        .route("/:id/cancel", post(cancel_invoice))
        .route("/:id/payments", get(list_payments).post(register_payment))
        .layer(Extension(kind))
}

pub async fn list_invoices(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Extension(kind): Extension<InvoiceKind>,
    Query(query): Query<dto::DocumentListQuery>,
) -> ApiResult<Response> {
    authz::require(&principal, &perms::INVOICES_READ)?;

    let filter = InvoiceFilter {
        kind: Some(kind),
        status: parse_filter(query.status.as_deref())?,
        partner_id: parse_filter(query.partner_id.as_deref())?,
    };
    let page = services.list_invoices(filter, query.page_request()).await?;
    Ok(Json(page.map(dto::invoice_to_json)).into_response())
}

pub async fn create_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Extension(kind): Extension<InvoiceKind>,
    Json(body): Json<dto::CreateInvoiceRequest>,
) -> ApiResult<Response> {
    authz::require(&principal, &perms::INVOICES_WRITE)?;
    let invoice = services.create_invoice(kind, body).await?;
    Ok((StatusCode::CREATED, Json(dto::invoice_to_json(invoice))).into_response())
}

pub async fn get_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Extension(kind): Extension<InvoiceKind>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    authz::require(&principal, &perms::INVOICES_READ)?;
    let invoice = services.get_invoice(kind, id.parse::<InvoiceId>()?).await?;
    Ok(Json(dto::invoice_to_json(invoice)).into_response())
}

pub async fn update_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Extension(kind): Extension<InvoiceKind>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateInvoiceRequest>,
) -> ApiResult<Response> {
    authz::require(&principal, &perms::INVOICES_WRITE)?;
    let invoice = services.update_invoice(kind, id.parse()?, body).await?;
    Ok(Json(dto::invoice_to_json(invoice)).into_response())
}

pub async fn confirm_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Extension(kind): Extension<InvoiceKind>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    authz::require(&principal, &perms::INVOICES_WRITE)?;
    let invoice = services.confirm_invoice(kind, id.parse()?).await?;
    Ok(Json(dto::invoice_to_json(invoice)).into_response())
}

pub async fn cancel_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Extension(kind): Extension<InvoiceKind>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    authz::require(&principal, &perms::INVOICES_WRITE)?;
    let invoice = services.cancel_invoice(kind, id.parse()?).await?;
    Ok(Json(dto::invoice_to_json(invoice)).into_response())
}

pub async fn list_payments(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Extension(kind): Extension<InvoiceKind>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    authz::require(&principal, &perms::PAYMENTS_READ)?;
    let items = services
        .list_invoice_payments(kind, id.parse()?)
        .await?
        .into_iter()
        .map(dto::payment_to_json)
        .collect::<Vec<_>>();
    Ok(Json(json!({ "items": items })).into_response())
}

pub async fn register_payment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Extension(kind): Extension<InvoiceKind>,
    Path(id): Path<String>,
    Json(body): Json<dto::RegisterPaymentRequest>,
) -> ApiResult<Response> {
    authz::require(&principal, &perms::PAYMENTS_WRITE)?;
    let (payment, invoice) = services.register_payment(kind, id.parse()?, body).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "payment": dto::payment_to_json(payment),
            "invoice": dto::invoice_to_json(invoice),
        })),
    )
        .into_response())
}
