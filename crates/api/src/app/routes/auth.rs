use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, response::Response, Json};

use crate::app::errors::ApiResult;
use crate::app::services::AppServices;
use crate::app::dto;
use crate::context::PrincipalContext;

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::RegisterRequest>,
) -> ApiResult<Response> {
    let (token, user) = services.register(body).await?;
    let body = dto::token_to_json(token, services.token_lifetime_secs(), user);
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::LoginRequest>,
) -> ApiResult<Response> {
    let (token, user) = services.login(body).await?;
    let body = dto::token_to_json(token, services.token_lifetime_secs(), user);
    Ok(Json(body).into_response())
}

pub async fn me(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> ApiResult<Response> {
    let user = services.get_user(principal.user_id()).await?;
    let mut body = dto::user_to_json(user);
    body["permissions"] = principal
        .principal()
        .permissions
        .iter()
        .map(|p| p.as_str().to_string())
        .collect();
    Ok(Json(body).into_response())
}
