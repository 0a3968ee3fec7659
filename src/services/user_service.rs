use uuid::Uuid;
use validator::Validate;

use crate::{
    db::DbPool,
    dto::users::{CreateUserRequest, UpdateUserRequest, UserOut},
    error::{AppError, AppResult, is_unique_violation},
    middleware::auth::{AuthUser, ensure_admin},
    models::User,
    response::{Meta, Paginated},
    routes::params::SearchQuery,
    services::auth_service::validate_username,
};

pub async fn list_users(
    pool: &DbPool,
    admin: &AuthUser,
    query: SearchQuery,
) -> AppResult<Paginated<UserOut>> {
    ensure_admin(admin)?;
    let (page, per_page, offset) = query.pagination().normalize();
    let search = query.search_term();

    let rows: Vec<User> = sqlx::query_as(
        r#"
        SELECT * FROM users
        WHERE ($1::text IS NULL OR username ILIKE $1 || '%')
        ORDER BY username
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(&search)
    .bind(per_page)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: (i64,) = sqlx::query_as(
        "SELECT count(*) FROM users WHERE ($1::text IS NULL OR username ILIKE $1 || '%')",
    )
    .bind(&search)
    .fetch_one(pool)
    .await?;

    let items = rows.into_iter().map(UserOut::from).collect();
    Ok(Paginated::new(items, Meta::new(page, per_page, total.0)))
}

/// Admin-created accounts are active immediately; they have no pending
/// confirmation code until the user goes through `/auth/signup`.
pub async fn create_user(
    pool: &DbPool,
    admin: &AuthUser,
    payload: CreateUserRequest,
) -> AppResult<UserOut> {
    ensure_admin(admin)?;
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.into()))?;
    if let Some(message) = validate_username(&payload.username) {
        return Err(AppError::field("username", message));
    }

    let inserted = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, username, email, first_name, last_name, bio, role, is_active)
        VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&payload.username)
    .bind(&payload.email)
    .bind(payload.first_name.as_deref().unwrap_or(""))
    .bind(payload.last_name.as_deref().unwrap_or(""))
    .bind(payload.bio.as_deref().unwrap_or(""))
    .bind(payload.role.unwrap_or_default())
    .fetch_one(pool)
    .await;

    match inserted {
        Ok(user) => Ok(user.into()),
        Err(err) if is_unique_violation(&err) => Err(AppError::field(
            "username",
            "a user with this username or email already exists",
        )),
        Err(err) => Err(err.into()),
    }
}

pub async fn get_user(pool: &DbPool, admin: &AuthUser, username: &str) -> AppResult<UserOut> {
    ensure_admin(admin)?;
    Ok(fetch_user(pool, username).await?.into())
}

pub async fn patch_user(
    pool: &DbPool,
    admin: &AuthUser,
    username: &str,
    payload: UpdateUserRequest,
) -> AppResult<UserOut> {
    ensure_admin(admin)?;
    let existing = fetch_user(pool, username).await?;
    apply_update(pool, existing, payload).await
}

pub async fn delete_user(pool: &DbPool, admin: &AuthUser, username: &str) -> AppResult<()> {
    ensure_admin(admin)?;
    let result = sqlx::query("DELETE FROM users WHERE username = $1")
        .bind(username)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

pub async fn get_me(pool: &DbPool, user: &AuthUser) -> AppResult<UserOut> {
    Ok(fetch_user_by_id(pool, user.user_id).await?.into())
}

/// Self-profile update. The `role` field is off limits here regardless of
/// tier; role changes go through the admin endpoint.
pub async fn patch_me(
    pool: &DbPool,
    user: &AuthUser,
    payload: UpdateUserRequest,
) -> AppResult<UserOut> {
    if payload.role.is_some() {
        return Err(AppError::field(
            "role",
            "role cannot be changed through this endpoint",
        ));
    }
    let existing = fetch_user_by_id(pool, user.user_id).await?;
    apply_update(pool, existing, payload).await
}

async fn apply_update(
    pool: &DbPool,
    existing: User,
    payload: UpdateUserRequest,
) -> AppResult<UserOut> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.into()))?;
    if let Some(username) = &payload.username
        && let Some(message) = validate_username(username)
    {
        return Err(AppError::field("username", message));
    }

    let updated = sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET username = $2, email = $3, first_name = $4, last_name = $5, bio = $6, role = $7
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(existing.id)
    .bind(payload.username.unwrap_or(existing.username))
    .bind(payload.email.unwrap_or(existing.email))
    .bind(payload.first_name.unwrap_or(existing.first_name))
    .bind(payload.last_name.unwrap_or(existing.last_name))
    .bind(payload.bio.unwrap_or(existing.bio))
    .bind(payload.role.unwrap_or(existing.role))
    .fetch_one(pool)
    .await;

    match updated {
        Ok(user) => Ok(user.into()),
        Err(err) if is_unique_violation(&err) => Err(AppError::field(
            "username",
            "a user with this username or email already exists",
        )),
        Err(err) => Err(err.into()),
    }
}

async fn fetch_user(pool: &DbPool, username: &str) -> AppResult<User> {
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await?;
    user.ok_or(AppError::NotFound)
}

async fn fetch_user_by_id(pool: &DbPool, id: Uuid) -> AppResult<User> {
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    user.ok_or(AppError::NotFound)
}
