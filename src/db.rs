//! Database connection pool and migration management.
//!
//! This module provides utilities for:
//! - Creating and managing a SQLite connection pool (WAL mode)
//! - Running database migrations automatically
//! - Retrying writes that hit a busy/locked database

use std::{future::Future, str::FromStr, time::Duration};

use sqlx::{
    Pool, Sqlite,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
};

/// Type alias for the SQLite connection pool.
pub type DbPool = Pool<Sqlite>;

/// Attempts made by [`retry_on_busy`] before giving up.
pub const MAX_QUERY_RETRIES: u32 = 3;

/// Base delay between attempts; grows linearly with each retry.
pub const QUERY_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Create a new SQLite connection pool.
///
/// # Configuration
///
/// - The database file is created if it does not exist
/// - WAL journal mode so readers never block the attendance writer
/// - `synchronous=NORMAL`, 64MB page cache, temp tables in memory
/// - 20 second busy timeout
/// - Foreign keys enforced (cascading deletes rely on it)
///
/// # Errors
///
/// Returns an error if the connection string is invalid or the file cannot be opened.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(20))
        .foreign_keys(true)
        .pragma("cache_size", "-64000")
        .pragma("temp_store", "MEMORY");

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
}

/// Create a pool over a private in-memory database.
///
/// Every connection to `sqlite::memory:` sees its own database, so the pool
/// is pinned to a single connection that never expires.
pub async fn create_memory_pool() -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
}

/// Run database migrations from the `migrations/` directory.
///
/// Migrations are tracked in the `_sqlx_migrations` table, so each migration runs only once.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    // The macro reads migrations at compile time from ./migrations directory
    sqlx::migrate!("./migrations").run(pool).await
}

/// Erase attendance, face data and employees. Admin accounts are kept.
pub async fn reset_employee_data(pool: &DbPool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM attendance").execute(&mut *tx).await?;
    sqlx::query("DELETE FROM facial_data").execute(&mut *tx).await?;
    sqlx::query("DELETE FROM employees").execute(&mut *tx).await?;
    sqlx::query(
        "DELETE FROM sqlite_sequence WHERE name IN ('attendance', 'facial_data', 'employees')",
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await
}

/// Run `op` again when SQLite reports the database as busy or locked.
///
/// Up to [`MAX_QUERY_RETRIES`] attempts are made, sleeping
/// `QUERY_RETRY_DELAY * attempt` between them. Any other error is returned
/// immediately. `op` must be safe to repeat.
pub async fn retry_on_busy<T, F, Fut>(mut op: F) -> Result<T, sqlx::Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, sqlx::Error>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Err(err) if is_busy(&err) && attempt < MAX_QUERY_RETRIES => {
                let wait = QUERY_RETRY_DELAY * attempt;
                tracing::debug!(
                    "Database busy, retrying in {:?} ({}/{})",
                    wait,
                    attempt,
                    MAX_QUERY_RETRIES
                );
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
            Err(err) => {
                if is_busy(&err) {
                    tracing::error!("Query failed after {} retries: {}", MAX_QUERY_RETRIES, err);
                }
                return Err(err);
            }
            Ok(value) => return Ok(value),
        }
    }
}

/// `SQLITE_BUSY` (5) or `SQLITE_LOCKED` (6), including extended codes.
fn is_busy(err: &sqlx::Error) -> bool {
    let sqlx::Error::Database(db) = err else {
        return false;
    };

    let primary = db
        .code()
        .and_then(|code| code.parse::<i32>().ok())
        .map(|code| code & 0xff);

    matches!(primary, Some(5) | Some(6)) || db.message().contains("database is locked")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    };

    #[tokio::test]
    async fn migrations_create_schema() {
        let pool = create_memory_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        for table in ["admin_sessions", "admins", "attendance", "employees", "facial_data"] {
            assert!(tables.iter().any(|t| t == table), "missing {table}");
        }
    }

    #[tokio::test]
    async fn retry_gives_up_on_non_busy_errors_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), _> = retry_on_busy(|| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(sqlx::Error::RowNotFound)
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    /// A database error carrying a raw SQLite result code.
    #[derive(Debug)]
    struct SqliteCode(&'static str);

    impl std::fmt::Display for SqliteCode {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "sqlite error code {}", self.0)
        }
    }

    impl std::error::Error for SqliteCode {}

    impl sqlx::error::DatabaseError for SqliteCode {
        fn message(&self) -> &str {
            "simulated failure"
        }

        fn code(&self) -> Option<std::borrow::Cow<'_, str>> {
            Some(self.0.into())
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::Other
        }
    }

    fn sqlite_error(code: &'static str) -> sqlx::Error {
        sqlx::Error::Database(Box::new(SqliteCode(code)))
    }

    #[test]
    fn busy_and_locked_codes_are_recognised() {
        // BUSY, LOCKED, BUSY_SNAPSHOT, LOCKED_SHAREDCACHE
        for code in ["5", "6", "517", "262"] {
            assert!(is_busy(&sqlite_error(code)), "code {code}");
        }
        // CONSTRAINT, CONSTRAINT_UNIQUE, IOERR
        for code in ["19", "2067", "10"] {
            assert!(!is_busy(&sqlite_error(code)), "code {code}");
        }
        assert!(!is_busy(&sqlx::Error::RowNotFound));
    }

    #[tokio::test]
    async fn retry_recovers_after_busy_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let value = retry_on_busy(|| {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(sqlite_error("5"))
                } else {
                    Ok(7)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(value, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retry_stops_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), _> = retry_on_busy(|| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(sqlite_error("517"))
            }
        })
        .await;

        assert!(matches!(result, Err(ref err) if is_busy(err)));
        assert_eq!(calls.load(Ordering::SeqCst), MAX_QUERY_RETRIES);
    }

    #[tokio::test]
    async fn retry_returns_success() {
        let value = retry_on_busy(|| async { Ok::<_, sqlx::Error>(42) })
            .await
            .unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn reset_keeps_admins() {
        let pool = create_memory_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();

        sqlx::query("INSERT INTO admins (username, password_hash, password_salt, name) VALUES ('a', 'h', 's', 'A')")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO employees (full_name, employee_code) VALUES ('Ann Lee', 'E-001')")
            .execute(&pool)
            .await
            .unwrap();

        reset_employee_data(&pool).await.unwrap();

        let employees: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM employees")
            .fetch_one(&pool)
            .await
            .unwrap();
        let admins: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admins")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(employees, 0);
        assert_eq!(admins, 1);
    }
}
