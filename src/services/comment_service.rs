use uuid::Uuid;
use validator::Validate;

use crate::{
    db::DbPool,
    dto::reviews::{CommentOut, CommentPatch, CommentPayload},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_author_or_staff},
    models::Comment,
    response::{Meta, Paginated},
    routes::params::Pagination,
    services::review_service::fetch_review,
};

pub async fn list_comments(
    pool: &DbPool,
    title_id: Uuid,
    review_id: Uuid,
    pagination: Pagination,
) -> AppResult<Paginated<CommentOut>> {
    fetch_review(pool, title_id, review_id).await?;
    let (page, per_page, offset) = pagination.normalize();

    let items: Vec<CommentOut> = sqlx::query_as(
        r#"
        SELECT c.id, u.username AS author, c.text, c.pub_date
        FROM comments c
        JOIN users u ON u.id = c.author_id
        WHERE c.review_id = $1
        ORDER BY c.pub_date
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(review_id)
    .bind(per_page)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: (i64,) = sqlx::query_as("SELECT count(*) FROM comments WHERE review_id = $1")
        .bind(review_id)
        .fetch_one(pool)
        .await?;

    Ok(Paginated::new(items, Meta::new(page, per_page, total.0)))
}

pub async fn get_comment(
    pool: &DbPool,
    title_id: Uuid,
    review_id: Uuid,
    comment_id: Uuid,
) -> AppResult<CommentOut> {
    let comment = fetch_comment(pool, title_id, review_id, comment_id).await?;
    present(pool, comment).await
}

pub async fn create_comment(
    pool: &DbPool,
    user: &AuthUser,
    title_id: Uuid,
    review_id: Uuid,
    payload: CommentPayload,
) -> AppResult<CommentOut> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.into()))?;
    fetch_review(pool, title_id, review_id).await?;

    let comment = sqlx::query_as::<_, Comment>(
        r#"
        INSERT INTO comments (id, author_id, review_id, text)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .bind(review_id)
    .bind(&payload.text)
    .fetch_one(pool)
    .await?;

    Ok(CommentOut {
        id: comment.id,
        author: user.username.clone(),
        text: comment.text,
        pub_date: comment.pub_date,
    })
}

pub async fn patch_comment(
    pool: &DbPool,
    user: &AuthUser,
    title_id: Uuid,
    review_id: Uuid,
    comment_id: Uuid,
    payload: CommentPatch,
) -> AppResult<CommentOut> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.into()))?;
    let existing = fetch_comment(pool, title_id, review_id, comment_id).await?;
    ensure_author_or_staff(user, existing.author_id)?;

    let comment =
        sqlx::query_as::<_, Comment>("UPDATE comments SET text = $2 WHERE id = $1 RETURNING *")
            .bind(comment_id)
            .bind(payload.text.unwrap_or(existing.text))
            .fetch_one(pool)
            .await?;

    present(pool, comment).await
}

pub async fn delete_comment(
    pool: &DbPool,
    user: &AuthUser,
    title_id: Uuid,
    review_id: Uuid,
    comment_id: Uuid,
) -> AppResult<()> {
    let existing = fetch_comment(pool, title_id, review_id, comment_id).await?;
    ensure_author_or_staff(user, existing.author_id)?;

    sqlx::query("DELETE FROM comments WHERE id = $1")
        .bind(comment_id)
        .execute(pool)
        .await?;
    Ok(())
}

async fn fetch_comment(
    pool: &DbPool,
    title_id: Uuid,
    review_id: Uuid,
    comment_id: Uuid,
) -> AppResult<Comment> {
    // The review lookup also validates that the review belongs to the title.
    fetch_review(pool, title_id, review_id).await?;
    let comment: Option<Comment> =
        sqlx::query_as("SELECT * FROM comments WHERE id = $1 AND review_id = $2")
            .bind(comment_id)
            .bind(review_id)
            .fetch_optional(pool)
            .await?;
    comment.ok_or(AppError::NotFound)
}

async fn present(pool: &DbPool, comment: Comment) -> AppResult<CommentOut> {
    let author: (String,) = sqlx::query_as("SELECT username FROM users WHERE id = $1")
        .bind(comment.author_id)
        .fetch_one(pool)
        .await?;
    Ok(CommentOut {
        id: comment.id,
        author: author.0,
        text: comment.text,
        pub_date: comment.pub_date,
    })
}
