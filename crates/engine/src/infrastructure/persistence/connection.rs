//! SQLite connection management.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

/// Open (and create if missing) the quest database.
///
/// `database_url` is a sqlx sqlite URL, e.g. `sqlite://questforge.db` or
/// `sqlite::memory:` for tests.
pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    tracing::info!("Connected to sqlite at {}", database_url);
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_creates_missing_database_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("quests.db");
        let url = format!("sqlite://{}", path.display());

        let pool = connect(&url).await.expect("connect");
        sqlx::query("SELECT 1")
            .execute(&pool)
            .await
            .expect("query");
        assert!(path.exists());
    }
}
