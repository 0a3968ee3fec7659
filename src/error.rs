use std::collections::BTreeMap;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Field-keyed validation messages, serialized as `{"field": ["msg", ...]}`.
#[derive(Debug, Default, Serialize)]
pub struct FieldErrors(pub BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<validator::ValidationErrors> for FieldErrors {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut out = Self::default();
        for (field, errs) in errors.field_errors() {
            for err in errs {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| err.code.to_string());
                out.push(field.to_string(), message);
            }
        }
        out
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    #[error("Validation failed")]
    Validation(FieldErrors),

    #[error("{0}")]
    Unauthorized(String),

    #[error("You do not have permission to perform this action")]
    Forbidden,

    #[error("Database error")]
    Db(#[from] sqlx::Error),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Shorthand for a single field-keyed validation error.
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation(FieldErrors::single(field, message))
    }
}

/// Whether a sqlx error is a storage-level unique-constraint violation.
///
/// The application pre-checks for duplicates are advisory only; the constraint
/// is the authoritative guard under concurrent writers, so callers translate
/// this case into a 400 instead of letting it surface as a 500.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

#[derive(Serialize)]
struct Detail {
    detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(fields) => {
                (StatusCode::BAD_REQUEST, Json(fields)).into_response()
            }
            AppError::NotFound => detail(StatusCode::NOT_FOUND, "Not found."),
            AppError::Unauthorized(message) => detail(StatusCode::UNAUTHORIZED, &message),
            AppError::Forbidden => detail(
                StatusCode::FORBIDDEN,
                "You do not have permission to perform this action.",
            ),
            AppError::Db(err) => {
                tracing::error!(error = %err, "database error");
                detail(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error.")
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "internal error");
                detail(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error.")
            }
        }
    }
}

fn detail(status: StatusCode, message: &str) -> Response {
    let body = Detail {
        detail: message.to_string(),
    };
    (status, Json(body)).into_response()
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_errors_accumulate_per_field() {
        let mut errors = FieldErrors::default();
        errors.push("username", "required");
        errors.push("username", "too long");
        errors.push("email", "invalid");
        assert_eq!(errors.0["username"], vec!["required", "too long"]);
        assert_eq!(errors.0["email"], vec!["invalid"]);
    }

    #[test]
    fn single_builds_one_entry() {
        let errors = FieldErrors::single("score", "must be between 1 and 10");
        assert_eq!(errors.0.len(), 1);
        assert!(!errors.is_empty());
    }
}
