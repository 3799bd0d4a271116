//! # Model Layer
//!
//! [`ModelManager`] owns the database engine for the lifetime of the
//! application and hands out one [`DbSession`] per unit of work.
//!
//! ## States
//!
//! ```text
//! Uninitialized --setup()--> Initialized --teardown()--> Uninitialized
//! ```
//!
//! `setup` while initialized and `teardown` while uninitialized are no-ops.
//! Sessions can only be acquired while initialized.
//!
//! ## Example
//!
//! ```rust,no_run
//! # use lib_core::{config::Settings, model::ModelManager};
//! # async fn example(settings: &Settings) -> lib_core::Result<()> {
//! let mm = ModelManager::new();
//! mm.setup(settings).await?;
//!
//! let mut session = mm.acquire_session().await?;
//! assert_eq!(session.ping().await?, 1);
//! session.commit().await?;
//!
//! mm.teardown().await;
//! # Ok(())
//! # }
//! ```

pub mod store;

use std::sync::Arc;

use futures_util::future::BoxFuture;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::{DbType, Settings};
use crate::error::{AppError, Result};
pub use store::{DbPool, DbSession, Timestamps};

#[derive(Debug)]
struct Engine {
    pool: DbPool,
    timestamps: Timestamps,
}

/// Shared handle to the database engine.
///
/// Cloning is cheap; all clones see the same engine.
#[derive(Clone, Debug, Default)]
pub struct ModelManager {
    engine: Arc<RwLock<Option<Engine>>>,
}

impl ModelManager {
    /// A manager with no engine. Call [`setup`](Self::setup) before use.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the engine from `settings`.
    ///
    /// The pool connects lazily, so an unreachable database is reported by
    /// the first session rather than here. Calling `setup` again while an
    /// engine exists leaves the existing engine in place.
    pub async fn setup(&self, settings: &Settings) -> Result<()> {
        let mut engine = self.engine.write().await;
        if engine.is_some() {
            debug!("[DB] setup() called while initialized; keeping existing engine");
            return Ok(());
        }

        let pool = DbPool::connect_lazy(settings)?;
        let timestamps = Timestamps::for_db_type(settings.db_type);
        *engine = Some(Engine { pool, timestamps });

        info!(
            "[DB] Engine ready: {} ({:?} timestamps)",
            settings.database_url_redacted(),
            timestamps
        );
        Ok(())
    }

    /// Dispose of the engine, closing every pooled connection.
    ///
    /// A no-op when there is no engine.
    pub async fn teardown(&self) {
        let engine = self.engine.write().await.take();
        match engine {
            Some(engine) => {
                engine.pool.close().await;
                info!("[DB] Engine disposed");
            }
            None => debug!("[DB] teardown() called while uninitialized"),
        }
    }

    pub async fn is_initialized(&self) -> bool {
        self.engine.read().await.is_some()
    }

    /// Backend of the current engine, if any.
    pub async fn db_type(&self) -> Option<DbType> {
        self.engine.read().await.as_ref().map(|e| e.pool.db_type())
    }

    /// Connections currently held by the pool; 0 when uninitialized.
    pub async fn open_connections(&self) -> u32 {
        self.engine.read().await.as_ref().map_or(0, |e| e.pool.size())
    }

    /// Begin a new session.
    ///
    /// # Errors
    ///
    /// * [`AppError::NotInitialized`] before `setup()` or after `teardown()`
    /// * [`AppError::Database`] when no connection can be obtained
    pub async fn acquire_session(&self) -> Result<DbSession> {
        let (pool, timestamps) = {
            let engine = self.engine.read().await;
            let engine = engine
                .as_ref()
                .ok_or(AppError::NotInitialized("database engine"))?;
            (engine.pool.clone(), engine.timestamps)
        };

        pool.begin(timestamps).await
    }

    /// Run `f` in a fresh session, committing on `Ok` and rolling back on `Err`.
    ///
    /// ```rust,no_run
    /// # use lib_core::model::{ModelManager, store::UserRepository};
    /// # async fn example(mm: &ModelManager) -> lib_core::Result<i64> {
    /// mm.with_session(|session| Box::pin(async move {
    ///     Ok(UserRepository::count(session).await?)
    /// }))
    /// .await
    /// # }
    /// ```
    pub async fn with_session<T, F>(&self, f: F) -> Result<T>
    where
        F: for<'s> FnOnce(&'s mut DbSession) -> BoxFuture<'s, Result<T>>,
    {
        let mut session = self.acquire_session().await?;

        match f(&mut session).await {
            Ok(value) => {
                session.commit().await?;
                Ok(value)
            }
            Err(err) => {
                session.rollback().await?;
                Err(err)
            }
        }
    }

    /// Create the `user` and `access_token` tables and their indexes if
    /// they do not exist. Development convenience, not a migration tool.
    pub async fn create_schema(&self) -> Result<()> {
        let mut session = self.acquire_session().await?;
        let db_type = session.db_type();

        for statement in store::schema::statements(db_type, session.timestamps()) {
            session.execute_ddl(&statement).await?;
        }
        session.commit().await?;

        info!("[DB] Schema ensured for {}", db_type);
        Ok(())
    }
}
