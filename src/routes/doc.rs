use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{SignupRequest, SignupResponse, TokenRequest, TokenResponse},
        catalog::{CategoryOut, CategoryPayload, GenreOut, GenrePayload},
        reviews::{CommentOut, CommentPatch, CommentPayload, ReviewOut, ReviewPatch, ReviewPayload},
        titles::{TitleOut, TitlePatch, TitlePayload},
        users::{CreateUserRequest, UpdateUserRequest, UserOut},
    },
    models::Role,
    response::{Meta, Paginated},
    routes::{auth, categories, comments, genres, health, params, reviews, titles, users},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::signup,
        auth::token,
        categories::list_categories,
        categories::create_category,
        categories::delete_category,
        genres::list_genres,
        genres::create_genre,
        genres::delete_genre,
        titles::list_titles,
        titles::get_title,
        titles::create_title,
        titles::patch_title,
        titles::delete_title,
        reviews::list_reviews,
        reviews::get_review,
        reviews::create_review,
        reviews::patch_review,
        reviews::delete_review,
        comments::list_comments,
        comments::get_comment,
        comments::create_comment,
        comments::patch_comment,
        comments::delete_comment,
        users::list_users,
        users::create_user,
        users::get_me,
        users::patch_me,
        users::get_user,
        users::patch_user,
        users::delete_user,
    ),
    components(
        schemas(
            Role,
            SignupRequest,
            SignupResponse,
            TokenRequest,
            TokenResponse,
            CategoryPayload,
            CategoryOut,
            GenrePayload,
            GenreOut,
            TitlePayload,
            TitlePatch,
            TitleOut,
            ReviewPayload,
            ReviewPatch,
            ReviewOut,
            CommentPayload,
            CommentPatch,
            CommentOut,
            CreateUserRequest,
            UpdateUserRequest,
            UserOut,
            params::Pagination,
            params::SearchQuery,
            params::TitleListQuery,
            Meta,
            Paginated<TitleOut>,
            Paginated<ReviewOut>,
            Paginated<CommentOut>,
            Paginated<CategoryOut>,
            Paginated<GenreOut>,
            Paginated<UserOut>,
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Signup and confirmation-code token exchange"),
        (name = "Categories", description = "Catalog categories"),
        (name = "Genres", description = "Catalog genres"),
        (name = "Titles", description = "Reviewable works"),
        (name = "Reviews", description = "Reviews nested under titles"),
        (name = "Comments", description = "Comments nested under reviews"),
        (name = "Users", description = "User management and self-profile"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
