use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::reviews::{ReviewOut, ReviewPatch, ReviewPayload},
    error::AppResult,
    middleware::auth::AuthUser,
    response::Paginated,
    routes::{comments, params::Pagination},
    services::review_service,
};

pub fn router() -> Router<DbPool> {
    Router::new()
        .route("/", get(list_reviews).post(create_review))
        .route(
            "/{review_id}",
            get(get_review).patch(patch_review).delete(delete_review),
        )
        .nest("/{review_id}/comments", comments::router())
}

#[utoipa::path(
    get,
    path = "/api/v1/titles/{title_id}/reviews",
    params(
        ("title_id" = Uuid, Path, description = "Title ID"),
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
    ),
    responses(
        (status = 200, description = "List reviews for a title", body = Paginated<ReviewOut>),
        (status = 404, description = "Unknown title"),
    ),
    tag = "Reviews"
)]
pub async fn list_reviews(
    State(pool): State<DbPool>,
    Path(title_id): Path<Uuid>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<Paginated<ReviewOut>>> {
    let resp = review_service::list_reviews(&pool, title_id, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/v1/titles/{title_id}/reviews/{review_id}",
    params(
        ("title_id" = Uuid, Path, description = "Title ID"),
        ("review_id" = Uuid, Path, description = "Review ID"),
    ),
    responses(
        (status = 200, description = "Review", body = ReviewOut),
        (status = 404, description = "Unknown title or review"),
    ),
    tag = "Reviews"
)]
pub async fn get_review(
    State(pool): State<DbPool>,
    Path((title_id, review_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<ReviewOut>> {
    let resp = review_service::get_review(&pool, title_id, review_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/v1/titles/{title_id}/reviews",
    params(("title_id" = Uuid, Path, description = "Title ID")),
    request_body = ReviewPayload,
    responses(
        (status = 201, description = "Review created", body = ReviewOut),
        (status = 400, description = "Score out of range or duplicate review"),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Unknown title"),
    ),
    security(("bearer_auth" = [])),
    tag = "Reviews"
)]
pub async fn create_review(
    State(pool): State<DbPool>,
    user: AuthUser,
    Path(title_id): Path<Uuid>,
    Json(payload): Json<ReviewPayload>,
) -> AppResult<(StatusCode, Json<ReviewOut>)> {
    let resp = review_service::create_review(&pool, &user, title_id, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/titles/{title_id}/reviews/{review_id}",
    params(
        ("title_id" = Uuid, Path, description = "Title ID"),
        ("review_id" = Uuid, Path, description = "Review ID"),
    ),
    request_body = ReviewPatch,
    responses(
        (status = 200, description = "Review updated", body = ReviewOut),
        (status = 403, description = "Author or staff only"),
        (status = 404, description = "Unknown title or review"),
    ),
    security(("bearer_auth" = [])),
    tag = "Reviews"
)]
pub async fn patch_review(
    State(pool): State<DbPool>,
    user: AuthUser,
    Path((title_id, review_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<ReviewPatch>,
) -> AppResult<Json<ReviewOut>> {
    let resp = review_service::patch_review(&pool, &user, title_id, review_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/v1/titles/{title_id}/reviews/{review_id}",
    params(
        ("title_id" = Uuid, Path, description = "Title ID"),
        ("review_id" = Uuid, Path, description = "Review ID"),
    ),
    responses(
        (status = 204, description = "Review deleted; its comments cascade"),
        (status = 403, description = "Author or staff only"),
        (status = 404, description = "Unknown title or review"),
    ),
    security(("bearer_auth" = [])),
    tag = "Reviews"
)]
pub async fn delete_review(
    State(pool): State<DbPool>,
    user: AuthUser,
    Path((title_id, review_id)): Path<(Uuid, Uuid)>,
) -> AppResult<StatusCode> {
    review_service::delete_review(&pool, &user, title_id, review_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
