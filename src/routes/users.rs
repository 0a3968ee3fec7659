use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};

use crate::{
    db::DbPool,
    dto::users::{CreateUserRequest, UpdateUserRequest, UserOut},
    error::AppResult,
    middleware::auth::AuthUser,
    response::Paginated,
    routes::params::SearchQuery,
    services::user_service,
};

pub fn router() -> Router<DbPool> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/me", get(get_me).patch(patch_me))
        .route(
            "/{username}",
            get(get_user).patch(patch_user).delete(delete_user),
        )
}

#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("search" = Option<String>, Query, description = "Username prefix filter"),
    ),
    responses(
        (status = 200, description = "List users", body = Paginated<UserOut>),
        (status = 403, description = "Admin only"),
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn list_users(
    State(pool): State<DbPool>,
    user: AuthUser,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Paginated<UserOut>>> {
    let resp = user_service::list_users(&pool, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserOut),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Admin only"),
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn create_user(
    State(pool): State<DbPool>,
    user: AuthUser,
    Json(payload): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<UserOut>)> {
    let resp = user_service::create_user(&pool, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Caller's own profile", body = UserOut),
        (status = 401, description = "Authentication required"),
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn get_me(State(pool): State<DbPool>, user: AuthUser) -> AppResult<Json<UserOut>> {
    let resp = user_service::get_me(&pool, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/v1/users/me",
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserOut),
        (status = 400, description = "Validation error; includes any attempt to set role"),
        (status = 401, description = "Authentication required"),
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn patch_me(
    State(pool): State<DbPool>,
    user: AuthUser,
    Json(payload): Json<UpdateUserRequest>,
) -> AppResult<Json<UserOut>> {
    let resp = user_service::patch_me(&pool, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{username}",
    params(("username" = String, Path, description = "Username")),
    responses(
        (status = 200, description = "User", body = UserOut),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Unknown username"),
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn get_user(
    State(pool): State<DbPool>,
    user: AuthUser,
    Path(username): Path<String>,
) -> AppResult<Json<UserOut>> {
    let resp = user_service::get_user(&pool, &user, &username).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/v1/users/{username}",
    params(("username" = String, Path, description = "Username")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserOut),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Unknown username"),
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn patch_user(
    State(pool): State<DbPool>,
    user: AuthUser,
    Path(username): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> AppResult<Json<UserOut>> {
    let resp = user_service::patch_user(&pool, &user, &username, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/v1/users/{username}",
    params(("username" = String, Path, description = "Username")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Unknown username"),
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn delete_user(
    State(pool): State<DbPool>,
    user: AuthUser,
    Path(username): Path<String>,
) -> AppResult<StatusCode> {
    user_service::delete_user(&pool, &user, &username).await?;
    Ok(StatusCode::NO_CONTENT)
}
