//! # Database Store
//!
//! Connection pools, per-request sessions and repository implementations.
//!
//! The backend is chosen at runtime from [`DbType`], so pools and sessions are
//! enums over the two sqlx drivers. Repositories write one query text (with
//! `$n` placeholders, understood by both drivers) and run it through
//! [`on_conn!`], which expands to one arm per driver.

// region: --- Modules
pub mod access_token_repository;
pub mod models;
pub mod schema;
pub mod timestamps;
pub mod user_repository;
// endregion: --- Modules

// region: --- Re-exports
pub use access_token_repository::AccessTokenRepository;
pub use timestamps::Timestamps;
pub use user_repository::UserRepository;
// endregion: --- Re-exports

// region: --- Types and Functions
use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{ConnectOptions, PgPool, Postgres, Sqlite, SqlitePool, Transaction};
use tracing::{debug, info};

use crate::config::{DbType, Settings};
use crate::error::Result;

/// How long a sqlite session waits for the write lock before failing.
pub const SQLITE_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Sqlite sessions take the write lock up front. A deferred transaction that
/// reads first cannot be upgraded once another writer has committed, and
/// fails with `SQLITE_BUSY` regardless of the busy timeout.
const SQLITE_BEGIN: &str = "BEGIN IMMEDIATE";

/// Run `$body` against the live connection of a [`DbSession`].
///
/// `$conn` is bound to `&mut PgConnection` or `&mut SqliteConnection`; the
/// body is type-checked once per driver.
macro_rules! on_conn {
    ($session:expr, $conn:ident => $body:expr) => {
        match &mut $session.conn {
            $crate::model::store::SessionConn::Postgres(tx) => {
                let $conn = &mut **tx;
                $body
            }
            $crate::model::store::SessionConn::Sqlite(tx) => {
                let $conn = &mut **tx;
                $body
            }
        }
    };
}
pub(crate) use on_conn;

/// Connection pool for the configured backend.
#[derive(Clone, Debug)]
pub enum DbPool {
    Postgres(PgPool),
    Sqlite(SqlitePool),
}

impl DbPool {
    /// Build a lazy pool from resolved settings.
    ///
    /// No connection is opened here; the first session acquisition connects.
    pub fn connect_lazy(settings: &Settings) -> Result<Self> {
        let options = settings.engine_options();

        match settings.db_type {
            DbType::Postgres => {
                let mut connect = PgConnectOptions::new()
                    .host(&settings.db_host)
                    .port(settings.db_port)
                    .username(&settings.db_user)
                    .password(&settings.db_password)
                    .database(&settings.db_name);
                connect = if options.echo {
                    connect.log_statements(log::LevelFilter::Info)
                } else {
                    connect.disable_statement_logging()
                };

                let mut pool = PgPoolOptions::new();
                if let Some(tuning) = options.pool {
                    pool = pool
                        .max_connections(tuning.max_connections())
                        .acquire_timeout(Duration::from_secs(tuning.pool_timeout))
                        .max_lifetime(
                            (tuning.pool_recycle > 0)
                                .then(|| Duration::from_secs(tuning.pool_recycle.unsigned_abs())),
                        )
                        .test_before_acquire(tuning.pre_ping);
                }

                debug!("[DB] Lazy postgres pool for {}", settings.database_url_redacted());
                Ok(DbPool::Postgres(pool.connect_lazy_with(connect)))
            }
            DbType::Sqlite => {
                let mut connect = if settings.sqlite_path == ":memory:" {
                    SqliteConnectOptions::from_str("sqlite::memory:")?
                } else {
                    SqliteConnectOptions::new()
                        .filename(&settings.sqlite_path)
                        .create_if_missing(true)
                        .journal_mode(SqliteJournalMode::Wal)
                        .synchronous(SqliteSynchronous::Normal)
                };
                connect = connect.foreign_keys(true).busy_timeout(SQLITE_BUSY_TIMEOUT);
                connect = if options.echo {
                    connect.log_statements(log::LevelFilter::Info)
                } else {
                    connect.disable_statement_logging()
                };

                // An in-memory database lives and dies with its connection.
                let mut pool = SqlitePoolOptions::new();
                if settings.sqlite_path == ":memory:" {
                    pool = pool.max_connections(1).idle_timeout(None).max_lifetime(None);
                }

                debug!("[DB] Lazy sqlite pool for {}", settings.database_url());
                Ok(DbPool::Sqlite(pool.connect_lazy_with(connect)))
            }
        }
    }

    pub fn db_type(&self) -> DbType {
        match self {
            DbPool::Postgres(_) => DbType::Postgres,
            DbPool::Sqlite(_) => DbType::Sqlite,
        }
    }

    /// Connections currently open (idle or in use).
    pub fn size(&self) -> u32 {
        match self {
            DbPool::Postgres(pool) => pool.size(),
            DbPool::Sqlite(pool) => pool.size(),
        }
    }

    /// Close every pooled connection, waiting for checked-out ones to return.
    pub async fn close(&self) {
        match self {
            DbPool::Postgres(pool) => pool.close().await,
            DbPool::Sqlite(pool) => pool.close().await,
        }
        info!("[DB] Connection pool closed");
    }

    /// Begin a new session (transaction) on a pooled connection.
    ///
    /// On sqlite this waits up to [`SQLITE_BUSY_TIMEOUT`] for other writers.
    pub async fn begin(&self, timestamps: Timestamps) -> Result<DbSession> {
        let conn = match self {
            DbPool::Postgres(pool) => SessionConn::Postgres(pool.begin().await?),
            DbPool::Sqlite(pool) => SessionConn::Sqlite(pool.begin_with(SQLITE_BEGIN).await?),
        };

        Ok(DbSession { conn, timestamps })
    }
}

/// Transaction held by a [`DbSession`].
#[derive(Debug)]
pub enum SessionConn {
    Postgres(Transaction<'static, Postgres>),
    Sqlite(Transaction<'static, Sqlite>),
}

/// A unit of work owned by exactly one request.
///
/// The transaction begins when the session is acquired. [`commit`](Self::commit)
/// persists the work; dropping the session without committing rolls it back
/// and returns the connection to the pool.
#[derive(Debug)]
pub struct DbSession {
    pub(crate) conn: SessionConn,
    timestamps: Timestamps,
}

impl DbSession {
    /// Timestamp strategy of the engine this session came from.
    pub fn timestamps(&self) -> Timestamps {
        self.timestamps
    }

    pub fn db_type(&self) -> DbType {
        match self.conn {
            SessionConn::Postgres(_) => DbType::Postgres,
            SessionConn::Sqlite(_) => DbType::Sqlite,
        }
    }

    /// Commit the unit of work and release the connection.
    pub async fn commit(self) -> Result<()> {
        match self.conn {
            SessionConn::Postgres(tx) => tx.commit().await?,
            SessionConn::Sqlite(tx) => tx.commit().await?,
        }
        Ok(())
    }

    /// Roll back the unit of work and release the connection.
    pub async fn rollback(self) -> Result<()> {
        match self.conn {
            SessionConn::Postgres(tx) => tx.rollback().await?,
            SessionConn::Sqlite(tx) => tx.rollback().await?,
        }
        Ok(())
    }

    /// Connectivity check: `SELECT 1`.
    pub async fn ping(&mut self) -> Result<i32> {
        let (one,): (i32,) = on_conn!(self, conn => {
            sqlx::query_as("SELECT 1").fetch_one(conn).await?
        });
        Ok(one)
    }

    /// Execute a DDL statement inside this session.
    pub(crate) async fn execute_ddl(&mut self, statement: &str) -> Result<()> {
        on_conn!(self, conn => {
            sqlx::query(statement).execute(conn).await?;
        });
        Ok(())
    }
}
// endregion: --- Types and Functions
