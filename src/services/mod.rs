pub mod auth_service;
pub mod catalog_service;
pub mod comment_service;
pub mod review_service;
pub mod title_service;
pub mod user_service;
