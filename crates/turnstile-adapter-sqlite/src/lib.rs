//! SQLite-backed [`TokenStore`].
//!
//! Sessions live in a single `sessions` table keyed by token. Each store
//! operation is one SQL statement bounded by a timeout, so refresh is an
//! atomic `UPDATE … RETURNING` and no in-process lock is held while the
//! database works.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::future::Future;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use turnstile_core::{Role, Session, StoreError, TokenStore};

#[derive(Debug, Clone, Copy)]
pub struct SqliteStoreOptions {
    /// Validity window applied by `find_valid`.
    pub ttl: Duration,
    /// Upper bound for a single database round-trip.
    pub op_timeout: Duration,
    pub max_connections: u32,
}

impl Default for SqliteStoreOptions {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(30),
            op_timeout: Duration::from_secs(2),
            max_connections: 5,
        }
    }
}

type SessionRow = (String, String, String, i64);

pub struct SqliteTokenStore {
    pool: SqlitePool,
    options: SqliteStoreOptions,
}

impl SqliteTokenStore {
    /// Connect to `url` (e.g. `sqlite://data/sessions.db` or
    /// `sqlite::memory:`), creating the database if needed, and run
    /// migrations.
    pub async fn connect(url: &str, options: SqliteStoreOptions) -> anyhow::Result<Self> {
        let connect = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(options.max_connections)
            // An in-memory database disappears with its last connection.
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(connect)
            .await?;
        Self::from_pool(pool, options).await
    }

    /// Open (or create) a database file, creating its parent directory.
    pub async fn open_file(path: &str, options: SqliteStoreOptions) -> anyhow::Result<Self> {
        ensure_parent_dir(path)?;
        Self::connect(&sqlite_url(path), options).await
    }

    pub async fn from_pool(pool: SqlitePool, options: SqliteStoreOptions) -> anyhow::Result<Self> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::debug!(ttl = ?options.ttl, op_timeout = ?options.op_timeout, "SQLite token store ready");
        Ok(Self { pool, options })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run `fut` under the per-operation timeout. A timeout is reported as
    /// [`sqlx::Error::PoolTimedOut`] and mapped to [`StoreError::Timeout`].
    ///
    /// Dropping the future does not cancel a statement the SQLite worker has
    /// already started. A timed-out `replace` may still commit, in which case
    /// a retry with the old token gets `NotFound`.
    async fn bounded<T, F>(&self, op: &'static str, fut: F) -> Result<T, sqlx::Error>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.options.op_timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(op, timeout = ?self.options.op_timeout, "SQLite operation timed out");
                Err(sqlx::Error::PoolTimedOut)
            }
        }
    }

    fn map_err(&self, op: &'static str, err: sqlx::Error) -> StoreError {
        match err {
            sqlx::Error::PoolTimedOut => StoreError::Timeout(self.options.op_timeout),
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::DuplicateKey,
            other => {
                tracing::error!(op, error = %other, "SQLite operation failed");
                StoreError::Unavailable(other.to_string())
            }
        }
    }
}

fn row_to_session((subject, role, token, issued_at_ms): SessionRow) -> Result<Session, StoreError> {
    let role = Role::from_str(&role).map_err(|e| StoreError::Unavailable(format!("corrupt session row: {e}")))?;
    let issued_at = DateTime::<Utc>::from_timestamp_millis(issued_at_ms)
        .ok_or_else(|| StoreError::Unavailable(format!("corrupt session row: issued_at_ms={issued_at_ms}")))?;
    Ok(Session {
        subject,
        role,
        token,
        issued_at,
    })
}

#[async_trait]
impl TokenStore for SqliteTokenStore {
    fn ttl(&self) -> Duration {
        self.options.ttl
    }

    async fn insert(&self, session: Session) -> Result<(), StoreError> {
        let query = sqlx::query("INSERT INTO sessions (token, subject, role, issued_at_ms) VALUES (?1, ?2, ?3, ?4)")
            .bind(&session.token)
            .bind(&session.subject)
            .bind(session.role.as_str())
            .bind(session.issued_at.timestamp_millis())
            .execute(&self.pool);

        self.bounded("insert", query)
            .await
            .map(|_| ())
            .map_err(|e| self.map_err("insert", e))
    }

    async fn replace(
        &self,
        old_token: &str,
        new_token: &str,
        new_issued_at: DateTime<Utc>,
    ) -> Result<Session, StoreError> {
        let query = sqlx::query_as::<_, SessionRow>(
            "UPDATE sessions SET token = ?1, issued_at_ms = ?2 WHERE token = ?3 \
             RETURNING subject, role, token, issued_at_ms",
        )
        .bind(new_token)
        .bind(new_issued_at.timestamp_millis())
        .bind(old_token)
        .fetch_optional(&self.pool);

        let row = self
            .bounded("replace", query)
            .await
            .map_err(|e| self.map_err("replace", e))?;
        row.map(row_to_session).transpose()?.ok_or(StoreError::NotFound)
    }

    async fn find_valid(&self, token: &str, now: DateTime<Utc>) -> Result<Option<Session>, StoreError> {
        Ok(self.find_any(token).await?.filter(|s| s.is_live(now, self.options.ttl)))
    }

    async fn find_any(&self, token: &str) -> Result<Option<Session>, StoreError> {
        let query = sqlx::query_as::<_, SessionRow>(
            "SELECT subject, role, token, issued_at_ms FROM sessions WHERE token = ?1",
        )
        .bind(token)
        .fetch_optional(&self.pool);

        let row = self
            .bounded("find", query)
            .await
            .map_err(|e| self.map_err("find", e))?;
        row.map(row_to_session).transpose()
    }

    async fn evict_issued_before(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        let query = sqlx::query("DELETE FROM sessions WHERE issued_at_ms < ?1")
            .bind(cutoff.timestamp_millis())
            .execute(&self.pool);

        let done = self
            .bounded("evict", query)
            .await
            .map_err(|e| self.map_err("evict", e))?;
        Ok(done.rows_affected() as usize)
    }

    async fn len(&self) -> Result<usize, StoreError> {
        let query = sqlx::query_as::<_, (i64,)>("SELECT COUNT(1) FROM sessions").fetch_one(&self.pool);
        let (count,) = self
            .bounded("count", query)
            .await
            .map_err(|e| self.map_err("count", e))?;
        Ok(count.max(0) as usize)
    }
}

fn sqlite_url(path: &str) -> String {
    // sqlx sqlite URL format: sqlite://relative/path.db (or sqlite:/abs/path.db)
    if Path::new(path).is_absolute() {
        format!("sqlite:{}", path)
    } else {
        format!("sqlite://{}", path)
    }
}

fn ensure_parent_dir(file_path: &str) -> anyhow::Result<()> {
    let p = Path::new(file_path);
    if let Some(parent) = p.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}
