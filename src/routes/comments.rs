use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::reviews::{CommentOut, CommentPatch, CommentPayload},
    error::AppResult,
    middleware::auth::AuthUser,
    response::Paginated,
    routes::params::Pagination,
    services::comment_service,
};

pub fn router() -> Router<DbPool> {
    Router::new()
        .route("/", get(list_comments).post(create_comment))
        .route(
            "/{comment_id}",
            get(get_comment).patch(patch_comment).delete(delete_comment),
        )
}

#[utoipa::path(
    get,
    path = "/api/v1/titles/{title_id}/reviews/{review_id}/comments",
    params(
        ("title_id" = Uuid, Path, description = "Title ID"),
        ("review_id" = Uuid, Path, description = "Review ID"),
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
    ),
    responses(
        (status = 200, description = "List comments for a review", body = Paginated<CommentOut>),
        (status = 404, description = "Unknown title or review"),
    ),
    tag = "Comments"
)]
pub async fn list_comments(
    State(pool): State<DbPool>,
    Path((title_id, review_id)): Path<(Uuid, Uuid)>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<Paginated<CommentOut>>> {
    let resp = comment_service::list_comments(&pool, title_id, review_id, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/v1/titles/{title_id}/reviews/{review_id}/comments/{comment_id}",
    params(
        ("title_id" = Uuid, Path, description = "Title ID"),
        ("review_id" = Uuid, Path, description = "Review ID"),
        ("comment_id" = Uuid, Path, description = "Comment ID"),
    ),
    responses(
        (status = 200, description = "Comment", body = CommentOut),
        (status = 404, description = "Unknown title, review or comment"),
    ),
    tag = "Comments"
)]
pub async fn get_comment(
    State(pool): State<DbPool>,
    Path((title_id, review_id, comment_id)): Path<(Uuid, Uuid, Uuid)>,
) -> AppResult<Json<CommentOut>> {
    let resp = comment_service::get_comment(&pool, title_id, review_id, comment_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/v1/titles/{title_id}/reviews/{review_id}/comments",
    params(
        ("title_id" = Uuid, Path, description = "Title ID"),
        ("review_id" = Uuid, Path, description = "Review ID"),
    ),
    request_body = CommentPayload,
    responses(
        (status = 201, description = "Comment created", body = CommentOut),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Unknown title or review"),
    ),
    security(("bearer_auth" = [])),
    tag = "Comments"
)]
pub async fn create_comment(
    State(pool): State<DbPool>,
    user: AuthUser,
    Path((title_id, review_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<CommentPayload>,
) -> AppResult<(StatusCode, Json<CommentOut>)> {
    let resp =
        comment_service::create_comment(&pool, &user, title_id, review_id, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/titles/{title_id}/reviews/{review_id}/comments/{comment_id}",
    params(
        ("title_id" = Uuid, Path, description = "Title ID"),
        ("review_id" = Uuid, Path, description = "Review ID"),
        ("comment_id" = Uuid, Path, description = "Comment ID"),
    ),
    request_body = CommentPatch,
    responses(
        (status = 200, description = "Comment updated", body = CommentOut),
        (status = 403, description = "Author or staff only"),
        (status = 404, description = "Unknown title, review or comment"),
    ),
    security(("bearer_auth" = [])),
    tag = "Comments"
)]
pub async fn patch_comment(
    State(pool): State<DbPool>,
    user: AuthUser,
    Path((title_id, review_id, comment_id)): Path<(Uuid, Uuid, Uuid)>,
    Json(payload): Json<CommentPatch>,
) -> AppResult<Json<CommentOut>> {
    let resp =
        comment_service::patch_comment(&pool, &user, title_id, review_id, comment_id, payload)
            .await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/v1/titles/{title_id}/reviews/{review_id}/comments/{comment_id}",
    params(
        ("title_id" = Uuid, Path, description = "Title ID"),
        ("review_id" = Uuid, Path, description = "Review ID"),
        ("comment_id" = Uuid, Path, description = "Comment ID"),
    ),
    responses(
        (status = 204, description = "Comment deleted"),
        (status = 403, description = "Author or staff only"),
        (status = 404, description = "Unknown title, review or comment"),
    ),
    security(("bearer_auth" = [])),
    tag = "Comments"
)]
pub async fn delete_comment(
    State(pool): State<DbPool>,
    user: AuthUser,
    Path((title_id, review_id, comment_id)): Path<(Uuid, Uuid, Uuid)>,
) -> AppResult<StatusCode> {
    comment_service::delete_comment(&pool, &user, title_id, review_id, comment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
