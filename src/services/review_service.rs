use uuid::Uuid;
use validator::Validate;

use crate::{
    db::DbPool,
    dto::reviews::{ReviewOut, ReviewPatch, ReviewPayload},
    error::{AppError, AppResult, is_unique_violation},
    middleware::auth::{AuthUser, ensure_author_or_staff},
    models::Review,
    response::{Meta, Paginated},
    routes::params::Pagination,
    services::title_service::fetch_title,
};

pub async fn list_reviews(
    pool: &DbPool,
    title_id: Uuid,
    pagination: Pagination,
) -> AppResult<Paginated<ReviewOut>> {
    fetch_title(pool, title_id).await?;
    let (page, per_page, offset) = pagination.normalize();

    let items: Vec<ReviewOut> = sqlx::query_as(
        r#"
        SELECT r.id, r.text, u.username AS author, r.score, r.pub_date
        FROM reviews r
        JOIN users u ON u.id = r.author_id
        WHERE r.title_id = $1
        ORDER BY r.pub_date
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(title_id)
    .bind(per_page)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: (i64,) = sqlx::query_as("SELECT count(*) FROM reviews WHERE title_id = $1")
        .bind(title_id)
        .fetch_one(pool)
        .await?;

    Ok(Paginated::new(items, Meta::new(page, per_page, total.0)))
}

pub async fn get_review(pool: &DbPool, title_id: Uuid, review_id: Uuid) -> AppResult<ReviewOut> {
    let review = fetch_review(pool, title_id, review_id).await?;
    present(pool, review).await
}

/// Author comes from the caller's identity, title from the URL path. The
/// UNIQUE (author_id, title_id) constraint closes the duplicate-review race;
/// a violation comes back as a field-keyed 400, never a 500.
pub async fn create_review(
    pool: &DbPool,
    user: &AuthUser,
    title_id: Uuid,
    payload: ReviewPayload,
) -> AppResult<ReviewOut> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.into()))?;
    fetch_title(pool, title_id).await?;

    let inserted = sqlx::query_as::<_, Review>(
        r#"
        INSERT INTO reviews (id, author_id, title_id, text, score)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .bind(title_id)
    .bind(&payload.text)
    .bind(payload.score)
    .fetch_one(pool)
    .await;

    match inserted {
        Ok(review) => Ok(ReviewOut {
            id: review.id,
            text: review.text,
            author: user.username.clone(),
            score: review.score,
            pub_date: review.pub_date,
        }),
        Err(err) if is_unique_violation(&err) => Err(AppError::field(
            "title",
            "you have already reviewed this title",
        )),
        Err(err) => Err(err.into()),
    }
}

pub async fn patch_review(
    pool: &DbPool,
    user: &AuthUser,
    title_id: Uuid,
    review_id: Uuid,
    payload: ReviewPatch,
) -> AppResult<ReviewOut> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.into()))?;
    let existing = fetch_review(pool, title_id, review_id).await?;
    ensure_author_or_staff(user, existing.author_id)?;

    let review = sqlx::query_as::<_, Review>(
        "UPDATE reviews SET text = $2, score = $3 WHERE id = $1 RETURNING *",
    )
    .bind(review_id)
    .bind(payload.text.unwrap_or(existing.text))
    .bind(payload.score.unwrap_or(existing.score))
    .fetch_one(pool)
    .await?;

    present(pool, review).await
}

pub async fn delete_review(
    pool: &DbPool,
    user: &AuthUser,
    title_id: Uuid,
    review_id: Uuid,
) -> AppResult<()> {
    let existing = fetch_review(pool, title_id, review_id).await?;
    ensure_author_or_staff(user, existing.author_id)?;

    sqlx::query("DELETE FROM reviews WHERE id = $1")
        .bind(review_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Lookup scoped to the title in the path; shared with the comment endpoints.
pub async fn fetch_review(pool: &DbPool, title_id: Uuid, review_id: Uuid) -> AppResult<Review> {
    let review: Option<Review> =
        sqlx::query_as("SELECT * FROM reviews WHERE id = $1 AND title_id = $2")
            .bind(review_id)
            .bind(title_id)
            .fetch_optional(pool)
            .await?;
    review.ok_or(AppError::NotFound)
}

async fn present(pool: &DbPool, review: Review) -> AppResult<ReviewOut> {
    let author: (String,) = sqlx::query_as("SELECT username FROM users WHERE id = $1")
        .bind(review.author_id)
        .fetch_one(pool)
        .await?;
    Ok(ReviewOut {
        id: review.id,
        text: review.text,
        author: author.0,
        score: review.score,
        pub_date: review.pub_date,
    })
}
