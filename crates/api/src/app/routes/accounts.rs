use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use ledgerly_accounting::{AccountId, NewAccount};
use ledgerly_auth::perms;

use crate::app::errors::ApiResult;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_accounts).post(create_account))
        .route("/:id", get(get_account))
}

pub async fn list_accounts(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> ApiResult<Response> {
    authz::require(&principal, &perms::ACCOUNTS_READ)?;
    let items = services.list_accounts().await?;
    Ok(Json(json!({ "items": items })).into_response())
}

pub async fn create_account(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<NewAccount>,
) -> ApiResult<Response> {
    authz::require(&principal, &perms::ACCOUNTS_WRITE)?;
    let account = services.create_account(body).await?;
    Ok((StatusCode::CREATED, Json(account)).into_response())
}

pub async fn get_account(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    authz::require(&principal, &perms::ACCOUNTS_READ)?;
    let account = services.get_account(id.parse::<AccountId>()?).await?;
    Ok(Json(account).into_response())
}
