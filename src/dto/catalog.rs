use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{Category, Genre};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CategoryPayload {
    #[validate(length(min = 1, max = 256, message = "must be 1 to 256 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 50, message = "must be 1 to 50 characters"))]
    pub slug: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CategoryOut {
    pub name: String,
    pub slug: String,
}

impl From<Category> for CategoryOut {
    fn from(category: Category) -> Self {
        Self {
            name: category.name,
            slug: category.slug,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct GenrePayload {
    #[validate(length(min = 1, max = 200, message = "must be 1 to 200 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 50, message = "must be 1 to 50 characters"))]
    pub slug: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GenreOut {
    pub name: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<Genre> for GenreOut {
    fn from(genre: Genre) -> Self {
        Self {
            name: genre.name,
            slug: genre.slug,
            description: genre.description,
        }
    }
}
