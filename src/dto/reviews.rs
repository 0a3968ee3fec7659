use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReviewPayload {
    #[validate(length(min = 1, message = "this field may not be blank"))]
    pub text: String,
    #[validate(range(min = 1, max = 10, message = "score must be between 1 and 10"))]
    pub score: i16,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReviewPatch {
    #[validate(length(min = 1, message = "this field may not be blank"))]
    pub text: Option<String>,
    #[validate(range(min = 1, max = 10, message = "score must be between 1 and 10"))]
    pub score: Option<i16>,
}

/// Author is exposed by username, matching the wire contract.
#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct ReviewOut {
    pub id: Uuid,
    pub text: String,
    pub author: String,
    pub score: i16,
    pub pub_date: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CommentPayload {
    #[validate(length(min = 1, message = "this field may not be blank"))]
    pub text: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CommentPatch {
    #[validate(length(min = 1, message = "this field may not be blank"))]
    pub text: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct CommentOut {
    pub id: Uuid,
    pub author: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
}
