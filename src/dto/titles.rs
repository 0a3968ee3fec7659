use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::dto::catalog::{CategoryOut, GenreOut};

/// Write payload: genre and category are addressed by slug.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct TitlePayload {
    #[validate(length(min = 1, max = 256, message = "must be 1 to 256 characters"))]
    pub name: String,
    pub year: i32,
    pub description: Option<String>,
    #[serde(default)]
    pub genre: Vec<String>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct TitlePatch {
    #[validate(length(min = 1, max = 256, message = "must be 1 to 256 characters"))]
    pub name: Option<String>,
    pub year: Option<i32>,
    pub description: Option<String>,
    pub genre: Option<Vec<String>>,
    pub category: Option<String>,
}

/// Read payload: nested category/genre objects plus the computed rating.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TitleOut {
    pub id: Uuid,
    pub name: String,
    pub year: i32,
    pub description: String,
    pub genre: Vec<GenreOut>,
    pub category: Option<CategoryOut>,
    pub rating: Option<f64>,
}
