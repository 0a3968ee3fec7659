use chrono::{Datelike, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::DbPool,
    dto::titles::{TitleOut, TitlePatch, TitlePayload},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Category, Genre, Title},
    response::{Meta, Paginated},
    routes::params::TitleListQuery,
};

pub async fn list_titles(pool: &DbPool, query: TitleListQuery) -> AppResult<Paginated<TitleOut>> {
    let (page, per_page, offset) = query.pagination().normalize();
    let name = query.name_term();

    let filter = r#"
        FROM titles t
        LEFT JOIN categories c ON c.id = t.category_id
        WHERE ($1::text IS NULL OR c.slug = $1)
          AND ($2::text IS NULL OR EXISTS (
              SELECT 1 FROM title_genres tg
              JOIN genres g ON g.id = tg.genre_id
              WHERE tg.title_id = t.id AND g.slug = $2))
          AND ($3::text IS NULL OR t.name ILIKE '%' || $3 || '%')
          AND ($4::int IS NULL OR t.year = $4)
    "#;

    let rows: Vec<Title> = sqlx::query_as(&format!(
        "SELECT t.* {filter} ORDER BY t.name LIMIT $5 OFFSET $6"
    ))
    .bind(&query.category)
    .bind(&query.genre)
    .bind(&name)
    .bind(query.year)
    .bind(per_page)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: (i64,) = sqlx::query_as(&format!("SELECT count(*) {filter}"))
        .bind(&query.category)
        .bind(&query.genre)
        .bind(&name)
        .bind(query.year)
        .fetch_one(pool)
        .await?;

    let mut items = Vec::with_capacity(rows.len());
    for title in rows {
        items.push(load_title_out(pool, title).await?);
    }
    Ok(Paginated::new(items, Meta::new(page, per_page, total.0)))
}

pub async fn get_title(pool: &DbPool, id: Uuid) -> AppResult<TitleOut> {
    let title = fetch_title(pool, id).await?;
    load_title_out(pool, title).await
}

pub async fn create_title(
    pool: &DbPool,
    user: &AuthUser,
    payload: TitlePayload,
) -> AppResult<TitleOut> {
    ensure_admin(user)?;
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.into()))?;
    validate_year(payload.year)?;

    let category = resolve_category(pool, payload.category.as_deref()).await?;
    let genres = resolve_genres(pool, &payload.genre).await?;

    let mut tx = pool.begin().await?;
    let title = sqlx::query_as::<_, Title>(
        r#"
        INSERT INTO titles (id, name, year, description, category_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&payload.name)
    .bind(payload.year)
    .bind(payload.description.as_deref().unwrap_or(""))
    .bind(category.as_ref().map(|c| c.id))
    .fetch_one(&mut *tx)
    .await?;

    for genre in &genres {
        sqlx::query("INSERT INTO title_genres (title_id, genre_id) VALUES ($1, $2)")
            .bind(title.id)
            .bind(genre.id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    load_title_out(pool, title).await
}

pub async fn patch_title(
    pool: &DbPool,
    user: &AuthUser,
    id: Uuid,
    payload: TitlePatch,
) -> AppResult<TitleOut> {
    ensure_admin(user)?;
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.into()))?;
    let existing = fetch_title(pool, id).await?;

    let year = payload.year.unwrap_or(existing.year);
    validate_year(year)?;

    let category_id = match payload.category.as_deref() {
        Some(slug) => resolve_category(pool, Some(slug)).await?.map(|c| c.id),
        None => existing.category_id,
    };
    let genres = match &payload.genre {
        Some(slugs) => Some(resolve_genres(pool, slugs).await?),
        None => None,
    };

    let mut tx = pool.begin().await?;
    let title = sqlx::query_as::<_, Title>(
        r#"
        UPDATE titles
        SET name = $2, year = $3, description = $4, category_id = $5
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(payload.name.unwrap_or(existing.name))
    .bind(year)
    .bind(payload.description.unwrap_or(existing.description))
    .bind(category_id)
    .fetch_one(&mut *tx)
    .await?;

    if let Some(genres) = genres {
        sqlx::query("DELETE FROM title_genres WHERE title_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        for genre in &genres {
            sqlx::query("INSERT INTO title_genres (title_id, genre_id) VALUES ($1, $2)")
                .bind(id)
                .bind(genre.id)
                .execute(&mut *tx)
                .await?;
        }
    }
    tx.commit().await?;

    load_title_out(pool, title).await
}

pub async fn delete_title(pool: &DbPool, user: &AuthUser, id: Uuid) -> AppResult<()> {
    ensure_admin(user)?;
    let result = sqlx::query("DELETE FROM titles WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

/// Lookup shared with the nested review endpoints.
pub async fn fetch_title(pool: &DbPool, id: Uuid) -> AppResult<Title> {
    let title: Option<Title> = sqlx::query_as("SELECT * FROM titles WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    title.ok_or(AppError::NotFound)
}

/// Mean review score, recomputed on every read so it never goes stale.
pub async fn rating(pool: &DbPool, title_id: Uuid) -> AppResult<Option<f64>> {
    let avg: Option<f64> =
        sqlx::query_scalar("SELECT AVG(score)::float8 FROM reviews WHERE title_id = $1")
            .bind(title_id)
            .fetch_one(pool)
            .await?;
    Ok(avg.map(round1))
}

async fn load_title_out(pool: &DbPool, title: Title) -> AppResult<TitleOut> {
    let category: Option<Category> = match title.category_id {
        Some(category_id) => {
            sqlx::query_as("SELECT * FROM categories WHERE id = $1")
                .bind(category_id)
                .fetch_optional(pool)
                .await?
        }
        None => None,
    };

    let genres: Vec<Genre> = sqlx::query_as(
        r#"
        SELECT g.* FROM genres g
        JOIN title_genres tg ON tg.genre_id = g.id
        WHERE tg.title_id = $1
        ORDER BY g.name
        "#,
    )
    .bind(title.id)
    .fetch_all(pool)
    .await?;

    let rating = rating(pool, title.id).await?;

    Ok(TitleOut {
        id: title.id,
        name: title.name,
        year: title.year,
        description: title.description,
        genre: genres.into_iter().map(Into::into).collect(),
        category: category.map(Into::into),
        rating,
    })
}

async fn resolve_category(pool: &DbPool, slug: Option<&str>) -> AppResult<Option<Category>> {
    let Some(slug) = slug else {
        return Ok(None);
    };
    let category: Option<Category> = sqlx::query_as("SELECT * FROM categories WHERE slug = $1")
        .bind(slug)
        .fetch_optional(pool)
        .await?;
    match category {
        Some(category) => Ok(Some(category)),
        None => Err(AppError::field(
            "category",
            format!("category with slug \"{slug}\" does not exist"),
        )),
    }
}

async fn resolve_genres(pool: &DbPool, slugs: &[String]) -> AppResult<Vec<Genre>> {
    let mut genres = Vec::with_capacity(slugs.len());
    for slug in slugs {
        let genre: Option<Genre> = sqlx::query_as("SELECT * FROM genres WHERE slug = $1")
            .bind(slug)
            .fetch_optional(pool)
            .await?;
        match genre {
            Some(genre) => genres.push(genre),
            None => {
                return Err(AppError::field(
                    "genre",
                    format!("genre with slug \"{slug}\" does not exist"),
                ));
            }
        }
    }
    Ok(genres)
}

fn validate_year(year: i32) -> AppResult<()> {
    let current = Utc::now().year();
    if year > current {
        return Err(AppError::field(
            "year",
            format!("year must not be later than {current}"),
        ));
    }
    Ok(())
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_one_decimal() {
        assert_eq!(round1(7.0), 7.0);
        assert_eq!(round1(6.6666666), 6.7);
        assert_eq!(round1(8.25), 8.3);
        assert_eq!(round1(8.24), 8.2);
    }

    #[test]
    fn year_validation_tracks_current_year() {
        let current = Utc::now().year();
        assert!(validate_year(current).is_ok());
        assert!(validate_year(1898).is_ok());
        assert!(validate_year(current + 1).is_err());
    }
}
