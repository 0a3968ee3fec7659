use axum::Router;

use crate::db::DbPool;

pub mod auth;
pub mod categories;
pub mod comments;
pub mod doc;
pub mod genres;
pub mod health;
pub mod params;
pub mod reviews;
pub mod titles;
pub mod users;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<DbPool> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/categories", categories::router())
        .nest("/genres", genres::router())
        .nest("/titles", titles::router())
        .nest("/users", users::router())
}
