use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Opens the SQLite pool and brings the schema up to date.
///
/// `reset` deletes the database file first. In-memory URLs get a single
/// connection that never expires, otherwise each connection would see its own
/// empty database.
pub async fn create_pool(database_url: &str, reset: bool) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("Invalid database URL '{database_url}'"))?
        .create_if_missing(true);

    let in_memory = database_url.contains(":memory:");
    if let Some(path) = database_path(database_url).filter(|_| !in_memory) {
        if reset && path.exists() {
            warn!("Resetting database at {}", path.display());
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    info!("Opening SQLite database...");

    let pool = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?
    };

    init_schema(&pool).await?;

    info!("SQLite database ready");
    Ok(pool)
}

/// File path of a `sqlite:` URL, without scheme or query string.
fn database_path(database_url: &str) -> Option<PathBuf> {
    let rest = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or_default();
    (!path.is_empty()).then(|| PathBuf::from(path))
}

async fn init_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS configs (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            api_key TEXT,
            user_info TEXT,
            model_name TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;
    add_column_if_missing(pool, "configs", "model_name", "TEXT").await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS resumes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            filename TEXT NOT NULL,
            mime TEXT NOT NULL,
            content TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS profiles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS generations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            type TEXT NOT NULL,
            job_description TEXT NOT NULL,
            output TEXT NOT NULL,
            resume_id INTEGER REFERENCES resumes(id),
            profile_id INTEGER REFERENCES profiles(id),
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    add_column_if_missing(pool, "generations", "profile_id", "INTEGER").await?;

    Ok(())
}

/// Additive migration for databases created before a column existed.
async fn add_column_if_missing(
    pool: &SqlitePool,
    table: &str,
    column: &str,
    column_type: &str,
) -> Result<()> {
    let columns: Vec<String> =
        sqlx::query_scalar(&format!("SELECT name FROM pragma_table_info('{table}')"))
            .fetch_all(pool)
            .await?;

    if !columns.iter().any(|c| c == column) {
        info!("Adding column {table}.{column}");
        sqlx::query(&format!(
            "ALTER TABLE {table} ADD COLUMN {column} {column_type}"
        ))
        .execute(pool)
        .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_path_strips_scheme_and_query() {
        assert_eq!(
            database_path("sqlite:///home/u/.cvgenx/cvgenx.db?mode=rwc"),
            Some(PathBuf::from("/home/u/.cvgenx/cvgenx.db"))
        );
        assert_eq!(database_path("sqlite:data.db"), Some(PathBuf::from("data.db")));
        assert_eq!(database_path("postgres://x"), None);
    }

    #[tokio::test]
    async fn test_schema_is_idempotent() {
        let pool = create_pool("sqlite::memory:", false).await.unwrap();
        init_schema(&pool).await.unwrap();

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();
        assert_eq!(tables, vec!["configs", "generations", "profiles", "resumes"]);
    }

    #[tokio::test]
    async fn test_missing_column_is_added() {
        let pool = create_pool("sqlite::memory:", false).await.unwrap();
        sqlx::query("CREATE TABLE legacy (id INTEGER PRIMARY KEY)")
            .execute(&pool)
            .await
            .unwrap();

        add_column_if_missing(&pool, "legacy", "note", "TEXT")
            .await
            .unwrap();
        add_column_if_missing(&pool, "legacy", "note", "TEXT")
            .await
            .unwrap();

        let columns: Vec<String> =
            sqlx::query_scalar("SELECT name FROM pragma_table_info('legacy')")
                .fetch_all(&pool)
                .await
                .unwrap();
        assert_eq!(columns, vec!["id", "note"]);
    }

    #[tokio::test]
    async fn test_reset_removes_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cvgenx.db");
        let url = format!("sqlite://{}", path.display());

        let pool = create_pool(&url, false).await.unwrap();
        sqlx::query("INSERT INTO profiles (name, data, created_at) VALUES ('a', '{}', '2024-01-01T00:00:00Z')")
            .execute(&pool)
            .await
            .unwrap();
        pool.close().await;

        let pool = create_pool(&url, true).await.unwrap();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
