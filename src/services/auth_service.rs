use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use rand::{Rng, distr::Alphanumeric};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::DbPool,
    dto::auth::{Claims, SignupRequest, SignupResponse, TokenRequest, TokenResponse},
    error::{AppError, AppResult, FieldErrors, is_unique_violation},
    mailer,
    models::User,
};

const CODE_LEN: usize = 32;

/// Request a confirmation code for a (username, email) pair.
///
/// An existing active account is rejected outright; an existing inactive
/// account with the same pair gets a fresh code. Binding the username or the
/// email to a different account is a field-level validation error. The unique
/// constraints on `users` are the authoritative guard against concurrent
/// duplicate signups; the pre-checks here only shape the error messages.
pub async fn signup(pool: &DbPool, payload: SignupRequest) -> AppResult<SignupResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.into()))?;
    if let Some(message) = validate_username(&payload.username) {
        return Err(AppError::field("username", message));
    }

    let matches: Vec<User> =
        sqlx::query_as("SELECT * FROM users WHERE username = $1 OR email = $2")
            .bind(&payload.username)
            .bind(&payload.email)
            .fetch_all(pool)
            .await?;

    let code = generate_code();
    let code_hash = hash_code(&code)?;

    let user = match classify(&matches, &payload)? {
        Some(existing) => {
            sqlx::query_as::<_, User>(
                "UPDATE users SET confirmation_code_hash = $1 WHERE id = $2 RETURNING *",
            )
            .bind(&code_hash)
            .bind(existing.id)
            .fetch_one(pool)
            .await?
        }
        None => {
            let inserted = sqlx::query_as::<_, User>(
                r#"
                INSERT INTO users (id, username, email, confirmation_code_hash)
                VALUES ($1, $2, $3, $4)
                RETURNING *
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(&payload.username)
            .bind(&payload.email)
            .bind(&code_hash)
            .fetch_one(pool)
            .await;
            match inserted {
                Ok(user) => user,
                // Lost a race with a concurrent signup for the same identity.
                Err(err) if is_unique_violation(&err) => {
                    return Err(AppError::field(
                        "username",
                        "a user with this username or email already exists",
                    ));
                }
                Err(err) => return Err(err.into()),
            }
        }
    };

    if let Err(err) = mailer::send_confirmation_code(&user.username, &user.email, &code).await {
        tracing::warn!(error = %err, username = %user.username, "confirmation mail failed");
    }

    Ok(SignupResponse {
        username: user.username,
        email: user.email,
    })
}

/// Exchange a pending confirmation code for a bearer token.
///
/// Unknown username is a 404; a wrong or spent code is a 400 keyed to
/// `confirmation_code`. A successful exchange activates the account and
/// clears the stored hash, making every code single use.
pub async fn exchange_token(pool: &DbPool, payload: TokenRequest) -> AppResult<TokenResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.into()))?;

    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE username = $1")
        .bind(&payload.username)
        .fetch_optional(pool)
        .await?;
    let user = user.ok_or(AppError::NotFound)?;

    let verified = user
        .confirmation_code_hash
        .as_deref()
        .is_some_and(|stored| verify_code(&payload.confirmation_code, stored));
    if !verified {
        return Err(AppError::field(
            "confirmation_code",
            "invalid confirmation code",
        ));
    }

    sqlx::query("UPDATE users SET is_active = TRUE, confirmation_code_hash = NULL WHERE id = $1")
        .bind(user.id)
        .execute(pool)
        .await?;

    let token = mint_token(&user)?;
    Ok(TokenResponse { token })
}

pub fn mint_token(user: &User) -> AppResult<String> {
    let secret = std::env::var("JWT_SECRET")
        .map_err(|_| AppError::Internal(anyhow::anyhow!("JWT_SECRET is not set")))?;

    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(24))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("failed to set expiration")))?;

    let claims = Claims {
        sub: user.id.to_string(),
        username: user.username.clone(),
        role: user.role,
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

/// Username rules shared with admin user management.
pub fn validate_username(username: &str) -> Option<&'static str> {
    if username == "me" {
        return Some("\"me\" is a reserved username");
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "@.+-_".contains(c))
    {
        return Some("may contain only letters, digits and @/./+/-/_ characters");
    }
    None
}

fn classify<'a>(matches: &'a [User], payload: &SignupRequest) -> AppResult<Option<&'a User>> {
    let mut errors = FieldErrors::default();
    let mut existing = None;
    for user in matches {
        if user.username == payload.username && user.email == payload.email {
            if user.is_active {
                errors.push("username", "a user with this username is already active");
            } else {
                existing = Some(user);
            }
        } else if user.username == payload.username {
            errors.push("username", "a user with this username already exists");
        } else {
            errors.push("email", "this email is already registered");
        }
    }
    if errors.is_empty() {
        Ok(existing)
    } else {
        Err(AppError::Validation(errors))
    }
}

fn generate_code() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(CODE_LEN)
        .map(char::from)
        .collect()
}

fn hash_code(code: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(code.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;
    Ok(hash.to_string())
}

fn verify_code(code: &str, stored: &str) -> bool {
    PasswordHash::new(stored).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(code.as_bytes(), &parsed)
            .is_ok()
    })
}
