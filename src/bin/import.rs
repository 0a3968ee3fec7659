//! One-shot seed importer: loads the legacy CSV dump into the database in
//! referential order (categories/genres/users before titles, titles before
//! reviews, reviews before comments). The dump uses integer ids; fresh uuids
//! are minted and references resolved through in-memory maps. Refuses to run
//! against a database that already holds data.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use yamdb_api::{config::AppConfig, db::DbPool, db::create_pool, models::Role};

#[derive(Debug, Deserialize)]
struct CategoryRow {
    id: i64,
    name: String,
    slug: String,
}

#[derive(Debug, Deserialize)]
struct GenreRow {
    id: i64,
    name: String,
    slug: String,
}

#[derive(Debug, Deserialize)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    role: Role,
    #[serde(default)]
    bio: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
}

#[derive(Debug, Deserialize)]
struct TitleRow {
    id: i64,
    name: String,
    year: i32,
    category: i64,
}

#[derive(Debug, Deserialize)]
struct TitleGenreRow {
    title_id: i64,
    genre_id: i64,
}

#[derive(Debug, Deserialize)]
struct ReviewRow {
    id: i64,
    title_id: i64,
    text: String,
    author: i64,
    score: i16,
    pub_date: String,
}

#[derive(Debug, Deserialize)]
struct CommentRow {
    id: i64,
    review_id: i64,
    text: String,
    author: i64,
    pub_date: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    let pool = create_pool(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let dir = PathBuf::from(
        std::env::args()
            .nth(1)
            .unwrap_or_else(|| "static/data".to_string()),
    );

    for table in [
        "categories",
        "genres",
        "users",
        "titles",
        "title_genres",
        "reviews",
        "comments",
    ] {
        let count: (i64,) = sqlx::query_as(&format!("SELECT count(*) FROM {table}"))
            .fetch_one(&pool)
            .await?;
        if count.0 > 0 {
            bail!("table {table} already has {} rows, refusing to import", count.0);
        }
    }

    let categories = import_categories(&pool, &dir).await?;
    let genres = import_genres(&pool, &dir).await?;
    let users = import_users(&pool, &dir).await?;
    let titles = import_titles(&pool, &dir, &categories).await?;
    import_title_genres(&pool, &dir, &titles, &genres).await?;
    let reviews = import_reviews(&pool, &dir, &titles, &users).await?;
    import_comments(&pool, &dir, &reviews, &users).await?;

    println!("Import completed");
    Ok(())
}

async fn import_categories(pool: &DbPool, dir: &Path) -> Result<HashMap<i64, Uuid>> {
    let rows: Vec<CategoryRow> = read_rows(dir, "category.csv")?;
    let mut map = HashMap::new();
    for row in rows {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO categories (id, name, slug) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(&row.name)
            .bind(&row.slug)
            .execute(pool)
            .await?;
        map.insert(row.id, id);
    }
    println!("Imported {} categories", map.len());
    Ok(map)
}

async fn import_genres(pool: &DbPool, dir: &Path) -> Result<HashMap<i64, Uuid>> {
    let rows: Vec<GenreRow> = read_rows(dir, "genre.csv")?;
    let mut map = HashMap::new();
    for row in rows {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO genres (id, name, slug) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(&row.name)
            .bind(&row.slug)
            .execute(pool)
            .await?;
        map.insert(row.id, id);
    }
    println!("Imported {} genres", map.len());
    Ok(map)
}

async fn import_users(pool: &DbPool, dir: &Path) -> Result<HashMap<i64, Uuid>> {
    let rows: Vec<UserRow> = read_rows(dir, "users.csv")?;
    let mut map = HashMap::new();
    for row in rows {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, first_name, last_name, bio, role, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE)
            "#,
        )
        .bind(id)
        .bind(&row.username)
        .bind(&row.email)
        .bind(&row.first_name)
        .bind(&row.last_name)
        .bind(&row.bio)
        .bind(row.role)
        .execute(pool)
        .await?;
        map.insert(row.id, id);
    }
    println!("Imported {} users", map.len());
    Ok(map)
}

async fn import_titles(
    pool: &DbPool,
    dir: &Path,
    categories: &HashMap<i64, Uuid>,
) -> Result<HashMap<i64, Uuid>> {
    let rows: Vec<TitleRow> = read_rows(dir, "titles.csv")?;
    let mut map = HashMap::new();
    for row in rows {
        let category_id = categories
            .get(&row.category)
            .with_context(|| format!("title {} references unknown category {}", row.id, row.category))?;
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO titles (id, name, year, category_id) VALUES ($1, $2, $3, $4)")
            .bind(id)
            .bind(&row.name)
            .bind(row.year)
            .bind(category_id)
            .execute(pool)
            .await?;
        map.insert(row.id, id);
    }
    println!("Imported {} titles", map.len());
    Ok(map)
}

async fn import_title_genres(
    pool: &DbPool,
    dir: &Path,
    titles: &HashMap<i64, Uuid>,
    genres: &HashMap<i64, Uuid>,
) -> Result<()> {
    let rows: Vec<TitleGenreRow> = read_rows(dir, "genre_title.csv")?;
    let mut count = 0usize;
    for row in rows {
        let title_id = titles
            .get(&row.title_id)
            .with_context(|| format!("genre link references unknown title {}", row.title_id))?;
        let genre_id = genres
            .get(&row.genre_id)
            .with_context(|| format!("genre link references unknown genre {}", row.genre_id))?;
        sqlx::query("INSERT INTO title_genres (title_id, genre_id) VALUES ($1, $2)")
            .bind(title_id)
            .bind(genre_id)
            .execute(pool)
            .await?;
        count += 1;
    }
    println!("Imported {count} title-genre links");
    Ok(())
}

async fn import_reviews(
    pool: &DbPool,
    dir: &Path,
    titles: &HashMap<i64, Uuid>,
    users: &HashMap<i64, Uuid>,
) -> Result<HashMap<i64, Uuid>> {
    let rows: Vec<ReviewRow> = read_rows(dir, "review.csv")?;
    let mut map = HashMap::new();
    for row in rows {
        let title_id = titles
            .get(&row.title_id)
            .with_context(|| format!("review {} references unknown title {}", row.id, row.title_id))?;
        let author_id = users
            .get(&row.author)
            .with_context(|| format!("review {} references unknown user {}", row.id, row.author))?;
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO reviews (id, author_id, title_id, text, score, pub_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id)
        .bind(author_id)
        .bind(title_id)
        .bind(&row.text)
        .bind(row.score)
        .bind(parse_date(&row.pub_date)?)
        .execute(pool)
        .await?;
        map.insert(row.id, id);
    }
    println!("Imported {} reviews", map.len());
    Ok(map)
}

async fn import_comments(
    pool: &DbPool,
    dir: &Path,
    reviews: &HashMap<i64, Uuid>,
    users: &HashMap<i64, Uuid>,
) -> Result<()> {
    let rows: Vec<CommentRow> = read_rows(dir, "comments.csv")?;
    let mut count = 0usize;
    for row in rows {
        let review_id = reviews
            .get(&row.review_id)
            .with_context(|| format!("comment {} references unknown review {}", row.id, row.review_id))?;
        let author_id = users
            .get(&row.author)
            .with_context(|| format!("comment {} references unknown user {}", row.id, row.author))?;
        sqlx::query(
            r#"
            INSERT INTO comments (id, author_id, review_id, text, pub_date)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(author_id)
        .bind(review_id)
        .bind(&row.text)
        .bind(parse_date(&row.pub_date)?)
        .execute(pool)
        .await?;
        count += 1;
    }
    println!("Imported {count} comments");
    Ok(())
}

fn read_rows<T: DeserializeOwned>(dir: &Path, file: &str) -> Result<Vec<T>> {
    let path = dir.join(file);
    let mut reader =
        csv::Reader::from_path(&path).with_context(|| format!("open {}", path.display()))?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row.with_context(|| format!("parse {}", path.display()))?);
    }
    Ok(rows)
}

fn parse_date(raw: &str) -> Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("invalid timestamp {raw:?}"))?;
    Ok(parsed.with_timezone(&Utc))
}
