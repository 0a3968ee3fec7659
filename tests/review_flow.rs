use axum::{extract::Query, http::Uri};
use chrono::{Datelike, Utc};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use yamdb_api::{
    db::{DbPool, create_pool},
    dto::{
        catalog::{CategoryPayload, GenrePayload},
        reviews::{CommentPatch, CommentPayload, ReviewPatch, ReviewPayload},
        titles::{TitlePatch, TitlePayload},
    },
    error::AppError,
    middleware::auth::AuthUser,
    models::Role,
    services::{catalog_service, comment_service, review_service, title_service},
};

// End-to-end catalog/review scenario: admin builds the catalog, two users
// review a title, the rating reflects the mean, duplicates and foreign
// mutations are rejected, staff may moderate.
#[tokio::test]
async fn catalog_reviews_and_permissions_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url =
        match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
            Ok(url) => url,
            Err(_) => {
                eprintln!(
                    "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
                );
                return Ok(());
            }
        };

    let pool = setup_pool(&database_url).await?;

    let admin = seed_user(&pool, "admin", Role::Admin).await?;
    let moderator = seed_user(&pool, "moderator", Role::Moderator).await?;
    let user_a = seed_user(&pool, "user_a", Role::User).await?;
    let user_b = seed_user(&pool, "user_b", Role::User).await?;

    // Catalog writes are admin only.
    let err = catalog_service::create_category(
        &pool,
        &user_a,
        CategoryPayload {
            name: "Drama".into(),
            slug: "drama".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    catalog_service::create_category(
        &pool,
        &admin,
        CategoryPayload {
            name: "Drama".into(),
            slug: "drama".into(),
        },
    )
    .await?;
    catalog_service::create_genre(
        &pool,
        &admin,
        GenrePayload {
            name: "Noir".into(),
            slug: "noir".into(),
            description: None,
        },
    )
    .await?;

    // Duplicate slug surfaces as a validation error, not a 500.
    let err = catalog_service::create_category(
        &pool,
        &admin,
        CategoryPayload {
            name: "Drama again".into(),
            slug: "drama".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // A future year is rejected.
    let err = title_service::create_title(
        &pool,
        &admin,
        title_payload("Chinatown", Utc::now().year() + 1),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // An unknown genre slug is rejected.
    let mut bad_genre = title_payload("Chinatown", 1974);
    bad_genre.genre = vec!["polka".into()];
    let err = title_service::create_title(&pool, &admin, bad_genre)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let title = title_service::create_title(&pool, &admin, title_payload("Chinatown", 1974)).await?;
    assert_eq!(title.rating, None);
    assert_eq!(title.category.as_ref().map(|c| c.slug.as_str()), Some("drama"));
    assert_eq!(title.genre.len(), 1);

    // Filtered listing finds it by category and genre; the query string goes
    // through the same extractor the handlers use.
    let listed =
        title_service::list_titles(&pool, query("category=drama&genre=noir&page=1&per_page=10")?)
            .await?;
    assert_eq!(listed.items.len(), 1);
    assert_eq!(listed.meta.total, 1);

    // A bare wildcard in the name filter matches literally, not everything.
    let listed = title_service::list_titles(&pool, query("name=%25")?).await?;
    assert_eq!(listed.meta.total, 0);

    // Two reviews average to 7.0.
    let review_a =
        review_service::create_review(&pool, &user_a, title.id, review_payload(8)).await?;
    review_service::create_review(&pool, &user_b, title.id, review_payload(6)).await?;
    let fetched = title_service::get_title(&pool, title.id).await?;
    assert_eq!(fetched.rating, Some(7.0));

    // Second review by the same author on the same title: 400, no second row.
    let err = review_service::create_review(&pool, &user_a, title.id, review_payload(10))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    let reviews = review_service::list_reviews(&pool, title.id, query("")?).await?;
    assert_eq!(reviews.meta.total, 2);

    // Score bounds are validated.
    let err = review_service::create_review(&pool, &moderator, title.id, review_payload(11))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // Only the author or staff may patch a review.
    let err = review_service::patch_review(
        &pool,
        &user_b,
        title.id,
        review_a.id,
        ReviewPatch {
            text: None,
            score: Some(9),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let patched = review_service::patch_review(
        &pool,
        &user_a,
        title.id,
        review_a.id,
        ReviewPatch {
            text: None,
            score: Some(9),
        },
    )
    .await?;
    assert_eq!(patched.score, 9);
    let fetched = title_service::get_title(&pool, title.id).await?;
    assert_eq!(fetched.rating, Some(7.5));

    // Comments: anyone authenticated may post, only author or staff may edit.
    let comment = comment_service::create_comment(
        &pool,
        &user_b,
        title.id,
        review_a.id,
        CommentPayload {
            text: "agreed".into(),
        },
    )
    .await?;
    let err = comment_service::patch_comment(
        &pool,
        &user_a,
        title.id,
        review_a.id,
        comment.id,
        CommentPatch {
            text: Some("edited".into()),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
    comment_service::patch_comment(
        &pool,
        &moderator,
        title.id,
        review_a.id,
        comment.id,
        CommentPatch {
            text: Some("moderated".into()),
        },
    )
    .await?;

    // A moderator may delete a foreign review; its comments cascade and the
    // rating drops to the remaining score.
    review_service::delete_review(&pool, &moderator, title.id, review_a.id).await?;
    let fetched = title_service::get_title(&pool, title.id).await?;
    assert_eq!(fetched.rating, Some(6.0));
    let err = comment_service::get_comment(&pool, title.id, review_a.id, comment.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    // Deleting the category nulls the title's category rather than cascading.
    catalog_service::delete_category(&pool, &admin, "drama").await?;
    let fetched = title_service::get_title(&pool, title.id).await?;
    assert!(fetched.category.is_none());

    // Patch keeps working after the category went away.
    let renamed = title_service::patch_title(
        &pool,
        &admin,
        title.id,
        TitlePatch {
            name: Some("Chinatown (1974)".into()),
            year: None,
            description: None,
            genre: None,
            category: None,
        },
    )
    .await?;
    assert_eq!(renamed.name, "Chinatown (1974)");

    // Deleting the title cascades to its remaining reviews.
    title_service::delete_title(&pool, &admin, title.id).await?;
    let err = review_service::list_reviews(&pool, title.id, query("")?)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    Ok(())
}

// Deserialize list parameters the way the handlers do, from the URI.
fn query<T: DeserializeOwned>(query_string: &str) -> anyhow::Result<T> {
    let uri: Uri = format!("/?{query_string}").parse()?;
    Ok(Query::<T>::try_from_uri(&uri)?.0)
}

fn title_payload(name: &str, year: i32) -> TitlePayload {
    TitlePayload {
        name: name.into(),
        year,
        description: Some("private eye in 1930s LA".into()),
        genre: vec!["noir".into()],
        category: Some("drama".into()),
    }
}

fn review_payload(score: i16) -> ReviewPayload {
    ReviewPayload {
        text: "worth watching".into(),
        score,
    }
}

async fn setup_pool(database_url: &str) -> anyhow::Result<DbPool> {
    let pool = create_pool(database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    sqlx::query(
        "TRUNCATE TABLE comments, reviews, title_genres, titles, genres, categories, users CASCADE",
    )
    .execute(&pool)
    .await?;
    Ok(pool)
}

async fn seed_user(pool: &DbPool, username: &str, role: Role) -> anyhow::Result<AuthUser> {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO users (id, username, email, role, is_active) VALUES ($1, $2, $3, $4, TRUE)",
    )
    .bind(id)
    .bind(username)
    .bind(format!("{username}@example.com"))
    .bind(role)
    .execute(pool)
    .await?;
    Ok(AuthUser {
        user_id: id,
        username: username.to_string(),
        role,
    })
}
