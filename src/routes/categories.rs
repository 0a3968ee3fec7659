use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
};

use crate::{
    db::DbPool,
    dto::catalog::{CategoryOut, CategoryPayload},
    error::AppResult,
    middleware::auth::AuthUser,
    response::Paginated,
    routes::params::SearchQuery,
    services::catalog_service,
};

pub fn router() -> Router<DbPool> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route("/{slug}", delete(delete_category))
}

#[utoipa::path(
    get,
    path = "/api/v1/categories",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("search" = Option<String>, Query, description = "Name substring filter"),
    ),
    responses(
        (status = 200, description = "List categories", body = Paginated<CategoryOut>)
    ),
    tag = "Categories"
)]
pub async fn list_categories(
    State(pool): State<DbPool>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Paginated<CategoryOut>>> {
    let resp = catalog_service::list_categories(&pool, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/v1/categories",
    request_body = CategoryPayload,
    responses(
        (status = 201, description = "Category created", body = CategoryOut),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Admin only"),
    ),
    security(("bearer_auth" = [])),
    tag = "Categories"
)]
pub async fn create_category(
    State(pool): State<DbPool>,
    user: AuthUser,
    Json(payload): Json<CategoryPayload>,
) -> AppResult<(StatusCode, Json<CategoryOut>)> {
    let resp = catalog_service::create_category(&pool, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/categories/{slug}",
    params(("slug" = String, Path, description = "Category slug")),
    responses(
        (status = 204, description = "Category deleted; referencing titles keep a null category"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Unknown slug"),
    ),
    security(("bearer_auth" = [])),
    tag = "Categories"
)]
pub async fn delete_category(
    State(pool): State<DbPool>,
    user: AuthUser,
    Path(slug): Path<String>,
) -> AppResult<StatusCode> {
    catalog_service::delete_category(&pool, &user, &slug).await?;
    Ok(StatusCode::NO_CONTENT)
}
