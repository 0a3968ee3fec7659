use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::titles::{TitleOut, TitlePatch, TitlePayload},
    error::AppResult,
    middleware::auth::AuthUser,
    response::Paginated,
    routes::{params::TitleListQuery, reviews},
    services::title_service,
};

pub fn router() -> Router<DbPool> {
    Router::new()
        .route("/", get(list_titles).post(create_title))
        .route(
            "/{id}",
            get(get_title).patch(patch_title).delete(delete_title),
        )
        .nest("/{title_id}/reviews", reviews::router())
}

#[utoipa::path(
    get,
    path = "/api/v1/titles",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("category" = Option<String>, Query, description = "Category slug"),
        ("genre" = Option<String>, Query, description = "Genre slug"),
        ("name" = Option<String>, Query, description = "Name substring"),
        ("year" = Option<i32>, Query, description = "Exact year"),
    ),
    responses(
        (status = 200, description = "List titles with computed rating", body = Paginated<TitleOut>)
    ),
    tag = "Titles"
)]
pub async fn list_titles(
    State(pool): State<DbPool>,
    Query(query): Query<TitleListQuery>,
) -> AppResult<Json<Paginated<TitleOut>>> {
    let resp = title_service::list_titles(&pool, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/v1/titles/{id}",
    params(("id" = Uuid, Path, description = "Title ID")),
    responses(
        (status = 200, description = "Title with nested category/genres and rating", body = TitleOut),
        (status = 404, description = "Unknown title"),
    ),
    tag = "Titles"
)]
pub async fn get_title(
    State(pool): State<DbPool>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<TitleOut>> {
    let resp = title_service::get_title(&pool, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/v1/titles",
    request_body = TitlePayload,
    responses(
        (status = 201, description = "Title created", body = TitleOut),
        (status = 400, description = "Validation error (unknown slug, future year)"),
        (status = 403, description = "Admin only"),
    ),
    security(("bearer_auth" = [])),
    tag = "Titles"
)]
pub async fn create_title(
    State(pool): State<DbPool>,
    user: AuthUser,
    Json(payload): Json<TitlePayload>,
) -> AppResult<(StatusCode, Json<TitleOut>)> {
    let resp = title_service::create_title(&pool, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/titles/{id}",
    params(("id" = Uuid, Path, description = "Title ID")),
    request_body = TitlePatch,
    responses(
        (status = 200, description = "Title updated", body = TitleOut),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Unknown title"),
    ),
    security(("bearer_auth" = [])),
    tag = "Titles"
)]
pub async fn patch_title(
    State(pool): State<DbPool>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<TitlePatch>,
) -> AppResult<Json<TitleOut>> {
    let resp = title_service::patch_title(&pool, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/v1/titles/{id}",
    params(("id" = Uuid, Path, description = "Title ID")),
    responses(
        (status = 204, description = "Title deleted; its reviews cascade"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Unknown title"),
    ),
    security(("bearer_auth" = [])),
    tag = "Titles"
)]
pub async fn delete_title(
    State(pool): State<DbPool>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    title_service::delete_title(&pool, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
