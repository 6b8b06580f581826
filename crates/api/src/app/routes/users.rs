use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use ledgerly_auth::perms;

use crate::app::dto;
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new().route("/", get(list_users).post(create_user))
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::PageQuery>,
) -> ApiResult<Response> {
    authz::require(&principal, &perms::USERS_MANAGE)?;
    let page = services.list_users(query.page_request()).await?;
    Ok(Json(page.map(dto::user_to_json)).into_response())
}

pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::CreateUserRequest>,
) -> ApiResult<Response> {
    authz::require(&principal, &perms::USERS_MANAGE)?;
    let user = services.create_user(body).await?;
    Ok((StatusCode::CREATED, Json(dto::user_to_json(user))).into_response())
}
