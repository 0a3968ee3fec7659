use jsonwebtoken::{DecodingKey, Validation, decode};
use uuid::Uuid;

use yamdb_api::{
    db::{DbPool, create_pool},
    dto::auth::{Claims, SignupRequest, TokenRequest},
    error::AppError,
    models::Role,
    services::auth_service,
};

// Signup issues a code through the outbox, the exchange turns it into a JWT,
// and every code is single use.
#[tokio::test]
async fn signup_and_token_exchange_flow() -> anyhow::Result<()> {
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

    let outbox = std::env::temp_dir().join(format!("yamdb-outbox-{}", Uuid::new_v4()));
    unsafe {
        std::env::set_var("EMAIL_OUTBOX_DIR", &outbox);
        std::env::set_var("JWT_SECRET", "integration-test-secret");
    }

    let pool = setup_pool(&database_url).await?;

    // Reserved username.
    let err = auth_service::signup(&pool, signup("me", "me@example.com"))
        .await
        .unwrap_err();
    assert_validation_on(err, "username");

    // Happy path: signup echoes the pair and drops a code in the outbox.
    let resp = auth_service::signup(&pool, signup("reader", "reader@example.com")).await?;
    assert_eq!(resp.username, "reader");
    assert_eq!(resp.email, "reader@example.com");
    let first_code = read_code_from_outbox(&outbox, "reader").await?;

    // Unknown username on exchange is a 404, wrong code a 400.
    let err = auth_service::exchange_token(&pool, token("nobody", &first_code))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));
    let err = auth_service::exchange_token(&pool, token("reader", "definitely-wrong"))
        .await
        .unwrap_err();
    assert_validation_on(err, "confirmation_code");

    // A second signup before activation rotates the code; only the fresh one works.
    auth_service::signup(&pool, signup("reader", "reader@example.com")).await?;
    let second_code = read_code_from_outbox(&outbox, "reader").await?;
    assert_ne!(first_code, second_code);
    let err = auth_service::exchange_token(&pool, token("reader", &first_code))
        .await
        .unwrap_err();
    assert_validation_on(err, "confirmation_code");

    let issued = auth_service::exchange_token(&pool, token("reader", &second_code)).await?;
    let decoded = decode::<Claims>(
        &issued.token,
        &DecodingKey::from_secret(b"integration-test-secret"),
        &Validation::default(),
    )?;
    assert_eq!(decoded.claims.username, "reader");
    assert_eq!(decoded.claims.role, Role::User);

    // Codes are single use: the spent one no longer verifies.
    let err = auth_service::exchange_token(&pool, token("reader", &second_code))
        .await
        .unwrap_err();
    assert_validation_on(err, "confirmation_code");

    // The account is now active: signup for the same pair is rejected outright,
    // and so is rebinding the username or the email separately.
    let err = auth_service::signup(&pool, signup("reader", "reader@example.com"))
        .await
        .unwrap_err();
    assert_validation_on(err, "username");
    let err = auth_service::signup(&pool, signup("reader", "other@example.com"))
        .await
        .unwrap_err();
    assert_validation_on(err, "username");
    let err = auth_service::signup(&pool, signup("other", "reader@example.com"))
        .await
        .unwrap_err();
    assert_validation_on(err, "email");

    Ok(())
}

fn signup(username: &str, email: &str) -> SignupRequest {
    SignupRequest {
        username: username.into(),
        email: email.into(),
    }
}

fn token(username: &str, code: &str) -> TokenRequest {
    TokenRequest {
        username: username.into(),
        confirmation_code: code.into(),
    }
}

fn assert_validation_on(err: AppError, field: &str) {
    match err {
        AppError::Validation(fields) => {
            assert!(
                fields.0.contains_key(field),
                "expected error keyed to {field:?}, got {:?}",
                fields.0
            );
        }
        other => panic!("expected validation error on {field:?}, got {other:?}"),
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

/// The outbox files are named `<timestamp>-<username>.txt`; take the newest
/// one for the user and pull the code out of the message body.
async fn read_code_from_outbox(outbox: &std::path::Path, username: &str) -> anyhow::Result<String> {
    let mut entries = tokio::fs::read_dir(outbox).await?;
    let mut newest: Option<String> = None;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(&format!("-{username}.txt"))
            && newest.as_deref().is_none_or(|current| name.as_str() > current)
        {
            newest = Some(name);
        }
    }
    let newest = newest.ok_or_else(|| anyhow::anyhow!("no outbox message for {username}"))?;
    let body = tokio::fs::read_to_string(outbox.join(newest)).await?;
    let code = body
        .rsplit_once(": ")
        .map(|(_, rest)| rest.trim().to_string())
        .ok_or_else(|| anyhow::anyhow!("confirmation code not found in message"))?;
    Ok(code)
}
