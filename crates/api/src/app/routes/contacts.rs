use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use ledgerly_auth::perms;
use ledgerly_infra::repo::contacts::ContactFilter;
use ledgerly_parties::{ContactId, ContactPatch};

use crate::app::dto;
use crate::app::errors::ApiResult;
use crate::app::routes::common::parse_filter;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_contacts).post(create_contact))
        .route("/:id", get(get_contact).patch(update_contact).delete(archive_contact))
}

pub async fn list_contacts(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::MasterListQuery>,
) -> ApiResult<Response> {
    authz::require(&principal, &perms::CONTACTS_READ)?;

    let filter = ContactFilter {
        search: query.search.clone(),
        kind: parse_filter(query.kind.as_deref())?,
        include_archived: query.include_archived,
    };
    let page = services.list_contacts(&filter, query.page_request()).await?;
    Ok(Json(page.map(dto::contact_to_json)).into_response())
}

pub async fn create_contact(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::CreateContactRequest>,
) -> ApiResult<Response> {
    authz::require(&principal, &perms::CONTACTS_WRITE)?;
    let contact = services.create_contact(body.into()).await?;
    Ok((StatusCode::CREATED, Json(dto::contact_to_json(contact))).into_response())
}

pub async fn get_contact(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    authz::require(&principal, &perms::CONTACTS_READ)?;
    let contact = services.get_contact(id.parse::<ContactId>()?).await?;
    Ok(Json(dto::contact_to_json(contact)).into_response())
}

pub async fn update_contact(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<ContactPatch>,
) -> ApiResult<Response> {
    authz::require(&principal, &perms::CONTACTS_WRITE)?;
    let contact = services.update_contact(id.parse()?, body).await?;
    Ok(Json(dto::contact_to_json(contact)).into_response())
}

pub async fn archive_contact(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    authz::require(&principal, &perms::CONTACTS_WRITE)?;
    let contact = services.archive_contact(id.parse()?).await?;
    Ok(Json(dto::contact_to_json(contact)).into_response())
}
