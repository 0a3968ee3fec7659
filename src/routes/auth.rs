use axum::{Json, Router, extract::State, routing::post};

use crate::{
    db::DbPool,
    dto::auth::{SignupRequest, SignupResponse, TokenRequest, TokenResponse},
    error::AppResult,
    services::auth_service,
};

pub fn router() -> Router<DbPool> {
    Router::new()
        .route("/signup", post(signup))
        .route("/token", post(token))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "Confirmation code sent", body = SignupResponse),
        (status = 400, description = "Validation error, keyed by field"),
    ),
    tag = "Auth"
)]
pub async fn signup(
    State(pool): State<DbPool>,
    Json(payload): Json<SignupRequest>,
) -> AppResult<Json<SignupResponse>> {
    let resp = auth_service::signup(&pool, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/token",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Bearer token issued", body = TokenResponse),
        (status = 400, description = "Invalid confirmation code"),
        (status = 404, description = "Unknown username"),
    ),
    tag = "Auth"
)]
pub async fn token(
    State(pool): State<DbPool>,
    Json(payload): Json<TokenRequest>,
) -> AppResult<Json<TokenResponse>> {
    let resp = auth_service::exchange_token(&pool, payload).await?;
    Ok(Json(resp))
}
