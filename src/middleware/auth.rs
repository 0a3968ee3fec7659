use axum::{extract::FromRequestParts, http::header};
use jsonwebtoken::{DecodingKey, Validation, decode};
use uuid::Uuid;

use crate::{dto::auth::Claims, error::AppError, models::Role};

/// The authenticated caller, decoded from the bearer token.
///
/// Handlers for public read endpoints simply do not take this extractor;
/// everything else gets a 401 before the handler body runs.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    if !user.role.is_admin() {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

/// Mutations on reviews and comments: the author, a moderator, or an admin.
pub fn ensure_author_or_staff(user: &AuthUser, author_id: Uuid) -> Result<(), AppError> {
    if user.user_id != author_id && !user.role.is_staff() {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts.headers.get(header::AUTHORIZATION).ok_or_else(|| {
            AppError::Unauthorized("Authentication credentials were not provided.".into())
        })?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid Authorization header.".into()))?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("Invalid Authorization scheme.".into()))?
            .trim();

        let secret = std::env::var("JWT_SECRET")
            .map_err(|_| AppError::Internal(anyhow::anyhow!("JWT_SECRET is not set")))?;

        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| AppError::Unauthorized("Invalid or expired token.".into()))?;

        let user_id = Uuid::parse_str(&decoded.claims.sub)
            .map_err(|_| AppError::Unauthorized("Invalid user id in token.".into()))?;

        Ok(AuthUser {
            user_id,
            username: decoded.claims.username,
            role: decoded.claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(role: Role) -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            username: "caller".into(),
            role,
        }
    }

    #[test]
    fn admin_check_rejects_non_admins() {
        assert!(ensure_admin(&caller(Role::Admin)).is_ok());
        assert!(ensure_admin(&caller(Role::Moderator)).is_err());
        assert!(ensure_admin(&caller(Role::User)).is_err());
    }

    #[test]
    fn author_or_staff_allows_author() {
        let user = caller(Role::User);
        assert!(ensure_author_or_staff(&user, user.user_id).is_ok());
    }

    #[test]
    fn author_or_staff_allows_staff_on_foreign_resource() {
        let other = Uuid::new_v4();
        assert!(ensure_author_or_staff(&caller(Role::Moderator), other).is_ok());
        assert!(ensure_author_or_staff(&caller(Role::Admin), other).is_ok());
        assert!(ensure_author_or_staff(&caller(Role::User), other).is_err());
    }
}
