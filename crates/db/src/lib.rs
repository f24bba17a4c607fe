use std::{str::FromStr, time::Duration};

use sqlx::{
    Error, Executor, Pool, Sqlite,
    migrate::MigrateError,
    sqlite::{
        SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqlitePoolOptions,
        SqliteSynchronous,
    },
};
use tracing::info;

pub mod models;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod validation;

// ============================================================================
// Connection Pool Configuration
// ============================================================================

/// Default maximum connections in the pool.
/// SQLite benefits from limited connections due to single-writer model.
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Minimum idle connections to maintain.
const DEFAULT_MIN_CONNECTIONS: u32 = 1;

/// Connection acquisition timeout in seconds.
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// Idle connection timeout in seconds (10 minutes).
const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;

/// Get max connections from environment or use default.
pub fn get_max_connections() -> u32 {
    parse_max_connections(std::env::var("KANBAN_SQLITE_MAX_CONNECTIONS").ok().as_deref())
}

fn parse_max_connections(raw: Option<&str>) -> u32 {
    raw.and_then(|s| s.trim().parse::<u32>().ok())
        .filter(|&n| n > 0 && n <= 100)
        .unwrap_or(DEFAULT_MAX_CONNECTIONS)
}

/// Apply per-connection pragmas.
///
/// `foreign_keys` must be on for every connection: the board relies on
/// `ON DELETE CASCADE` to remove tasks with their column and images with
/// their task.
async fn apply_connection_pragmas(conn: &mut SqliteConnection) -> Result<(), Error> {
    conn.execute("PRAGMA foreign_keys = ON").await?;

    // temp_store = MEMORY (2)
    conn.execute("PRAGMA temp_store = 2").await?;

    conn.execute("PRAGMA synchronous = NORMAL").await?;

    // cache_size = -16000 (16MB, negative means KB)
    conn.execute("PRAGMA cache_size = -16000").await?;

    Ok(())
}

/// Build connect options shared by the service pool and test pools.
pub fn connect_options(database_url: &str) -> Result<SqliteConnectOptions, Error> {
    Ok(SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS)))
}

/// Run the embedded board migrations.
pub async fn migrate(pool: &Pool<Sqlite>) -> Result<(), MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

#[derive(Clone)]
pub struct DBService {
    pub pool: Pool<Sqlite>,
}

impl DBService {
    /// Open the pool for `database_url` and bring the schema up to date.
    pub async fn new(database_url: &str) -> Result<DBService, Error> {
        let max_connections = get_max_connections();

        info!(
            max_connections = max_connections,
            min_connections = DEFAULT_MIN_CONNECTIONS,
            "Initializing SQLite connection pool"
        );

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .min_connections(DEFAULT_MIN_CONNECTIONS)
            .acquire_timeout(Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS))
            .idle_timeout(Some(Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS)))
            .after_connect(|conn, _meta| {
                Box::pin(async move { apply_connection_pragmas(conn).await })
            })
            .connect_with(connect_options(database_url)?)
            .await?;

        migrate(&pool).await.map_err(|e| Error::Migrate(Box::new(e)))?;
        info!("Database migrations applied");

        Ok(DBService { pool })
    }

    /// Wrap an already configured pool (used by tests).
    pub fn from_pool(pool: Pool<Sqlite>) -> DBService {
        DBService { pool }
    }

    /// Quick connectivity probe for health reporting.
    pub async fn is_ready(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_connections_default_when_unset() {
        assert_eq!(parse_max_connections(None), DEFAULT_MAX_CONNECTIONS);
    }

    #[test]
    fn test_max_connections_respects_valid_value() {
        assert_eq!(parse_max_connections(Some("25")), 25);
        assert_eq!(parse_max_connections(Some(" 4 ")), 4);
    }

    #[test]
    fn test_max_connections_rejects_out_of_range() {
        assert_eq!(parse_max_connections(Some("0")), DEFAULT_MAX_CONNECTIONS);
        assert_eq!(parse_max_connections(Some("101")), DEFAULT_MAX_CONNECTIONS);
        assert_eq!(parse_max_connections(Some("lots")), DEFAULT_MAX_CONNECTIONS);
    }

    #[tokio::test]
    async fn test_service_opens_and_migrates_fresh_database() {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let url = format!("sqlite://{}", temp_dir.path().join("board.db").display());

        let db = DBService::new(&url).await.expect("Failed to open database");
        assert!(db.is_ready().await);

        let fk: (i64,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(&db.pool)
            .await
            .expect("Failed to read foreign_keys pragma");
        assert_eq!(fk.0, 1, "foreign keys must be enforced for cascades");

        let columns: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM columns")
            .fetch_one(&db.pool)
            .await
            .expect("columns table should exist");
        assert_eq!(columns.0, 0);
    }
}
