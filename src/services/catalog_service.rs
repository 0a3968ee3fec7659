use uuid::Uuid;
use validator::Validate;

use crate::{
    db::DbPool,
    dto::catalog::{CategoryOut, CategoryPayload, GenreOut, GenrePayload},
    error::{AppError, AppResult, is_unique_violation},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Category, Genre},
    response::{Meta, Paginated},
    routes::params::SearchQuery,
};

pub async fn list_categories(
    pool: &DbPool,
    query: SearchQuery,
) -> AppResult<Paginated<CategoryOut>> {
    let (page, per_page, offset) = query.pagination().normalize();
    let search = query.search_term();
    let rows: Vec<Category> = sqlx::query_as(
        r#"
        SELECT * FROM categories
        WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%')
        ORDER BY name
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(&search)
    .bind(per_page)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: (i64,) = sqlx::query_as(
        "SELECT count(*) FROM categories WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%')",
    )
    .bind(&search)
    .fetch_one(pool)
    .await?;

    let items = rows.into_iter().map(CategoryOut::from).collect();
    Ok(Paginated::new(items, Meta::new(page, per_page, total.0)))
}

pub async fn create_category(
    pool: &DbPool,
    user: &AuthUser,
    payload: CategoryPayload,
) -> AppResult<CategoryOut> {
    ensure_admin(user)?;
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.into()))?;
    if let Some(message) = validate_slug(&payload.slug) {
        return Err(AppError::field("slug", message));
    }

    let inserted = sqlx::query_as::<_, Category>(
        "INSERT INTO categories (id, name, slug) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(&payload.name)
    .bind(&payload.slug)
    .fetch_one(pool)
    .await;

    match inserted {
        Ok(category) => Ok(category.into()),
        Err(err) if is_unique_violation(&err) => Err(AppError::field(
            "slug",
            "a category with this slug already exists",
        )),
        Err(err) => Err(err.into()),
    }
}

pub async fn delete_category(pool: &DbPool, user: &AuthUser, slug: &str) -> AppResult<()> {
    ensure_admin(user)?;
    let result = sqlx::query("DELETE FROM categories WHERE slug = $1")
        .bind(slug)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

pub async fn list_genres(pool: &DbPool, query: SearchQuery) -> AppResult<Paginated<GenreOut>> {
    let (page, per_page, offset) = query.pagination().normalize();
    let search = query.search_term();
    let rows: Vec<Genre> = sqlx::query_as(
        r#"
        SELECT * FROM genres
        WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%')
        ORDER BY name
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(&search)
    .bind(per_page)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: (i64,) = sqlx::query_as(
        "SELECT count(*) FROM genres WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%')",
    )
    .bind(&search)
    .fetch_one(pool)
    .await?;

    let items = rows.into_iter().map(GenreOut::from).collect();
    Ok(Paginated::new(items, Meta::new(page, per_page, total.0)))
}

pub async fn create_genre(
    pool: &DbPool,
    user: &AuthUser,
    payload: GenrePayload,
) -> AppResult<GenreOut> {
    ensure_admin(user)?;
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.into()))?;
    if let Some(message) = validate_slug(&payload.slug) {
        return Err(AppError::field("slug", message));
    }

    let inserted = sqlx::query_as::<_, Genre>(
        "INSERT INTO genres (id, name, slug, description) VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(&payload.name)
    .bind(&payload.slug)
    .bind(&payload.description)
    .fetch_one(pool)
    .await;

    match inserted {
        Ok(genre) => Ok(genre.into()),
        Err(err) if is_unique_violation(&err) => Err(AppError::field(
            "slug",
            "a genre with this slug already exists",
        )),
        Err(err) => Err(err.into()),
    }
}

pub async fn delete_genre(pool: &DbPool, user: &AuthUser, slug: &str) -> AppResult<()> {
    ensure_admin(user)?;
    let result = sqlx::query("DELETE FROM genres WHERE slug = $1")
        .bind(slug)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

/// URL-safe alternate key: letters, digits, hyphen, underscore.
pub fn validate_slug(slug: &str) -> Option<&'static str> {
    if !slug
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Some("may contain only letters, digits, hyphens and underscores");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_charset() {
        assert!(validate_slug("film-noir_2").is_none());
        assert!(validate_slug("with space").is_some());
        assert!(validate_slug("cyrillic-ж").is_some());
        assert!(validate_slug("slash/y").is_some());
    }
}
