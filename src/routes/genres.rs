use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
};

use crate::{
    db::DbPool,
    dto::catalog::{GenreOut, GenrePayload},
    error::AppResult,
    middleware::auth::AuthUser,
    response::Paginated,
    routes::params::SearchQuery,
    services::catalog_service,
};

pub fn router() -> Router<DbPool> {
    Router::new()
        .route("/", get(list_genres).post(create_genre))
        .route("/{slug}", delete(delete_genre))
}

#[utoipa::path(
    get,
    path = "/api/v1/genres",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("search" = Option<String>, Query, description = "Name substring filter"),
    ),
    responses(
        (status = 200, description = "List genres", body = Paginated<GenreOut>)
    ),
    tag = "Genres"
)]
pub async fn list_genres(
    State(pool): State<DbPool>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Paginated<GenreOut>>> {
    let resp = catalog_service::list_genres(&pool, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/v1/genres",
    request_body = GenrePayload,
    responses(
        (status = 201, description = "Genre created", body = GenreOut),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Admin only"),
    ),
    security(("bearer_auth" = [])),
    tag = "Genres"
)]
pub async fn create_genre(
    State(pool): State<DbPool>,
    user: AuthUser,
    Json(payload): Json<GenrePayload>,
) -> AppResult<(StatusCode, Json<GenreOut>)> {
    let resp = catalog_service::create_genre(&pool, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/genres/{slug}",
    params(("slug" = String, Path, description = "Genre slug")),
    responses(
        (status = 204, description = "Genre deleted"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Unknown slug"),
    ),
    security(("bearer_auth" = [])),
    tag = "Genres"
)]
pub async fn delete_genre(
    State(pool): State<DbPool>,
    user: AuthUser,
    Path(slug): Path<String>,
) -> AppResult<StatusCode> {
    catalog_service::delete_genre(&pool, &user, &slug).await?;
    Ok(StatusCode::NO_CONTENT)
}
