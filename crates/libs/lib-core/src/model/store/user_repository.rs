//! # User Repository
//!
//! Database access layer for user records.
//!
//! Every method runs inside the caller's [`DbSession`], so the caller decides
//! whether the work is committed or rolled back.
//!
//! ## Example
//!
//! ```rust,no_run
//! # use lib_core::model::ModelManager;
//! # use lib_core::model::store::{UserRepository, models::UserForCreate};
//! # async fn example(mm: &ModelManager) -> lib_core::Result<()> {
//! let mut session = mm.acquire_session().await?;
//! let user = UserRepository::create(
//!     &mut session,
//!     UserForCreate::new("alice@example.com".to_string(), "hashed".to_string()),
//! ).await?;
//! session.commit().await?;
//! # Ok(())
//! # }
//! ```

use uuid::Uuid;

use super::models::{User, UserForCreate, UserForUpdate};
use super::schema::USER_TABLE;
use super::{on_conn, DbSession};

const USER_COLUMNS: &str =
    "id, email, hashed_password, is_active, is_superuser, is_verified, created_at, updated_at";

/// User repository for database operations.
pub struct UserRepository;

impl UserRepository {
    /// Find a user by id.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(User))` - User found
    /// * `Ok(None)` - No user with that id
    /// * `Err(sqlx::Error)` - Database error occurred
    pub async fn get(session: &mut DbSession, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        let sql = format!("SELECT {USER_COLUMNS} FROM {USER_TABLE} WHERE id = $1");

        on_conn!(session, conn => {
            sqlx::query_as::<_, User>(&sql)
                .bind(id)
                .fetch_optional(conn)
                .await
        })
    }

    /// Find a user by e-mail, ignoring case.
    pub async fn find_by_email(session: &mut DbSession, email: &str) -> Result<Option<User>, sqlx::Error> {
        let sql = format!("SELECT {USER_COLUMNS} FROM {USER_TABLE} WHERE LOWER(email) = LOWER($1)");

        on_conn!(session, conn => {
            sqlx::query_as::<_, User>(&sql)
                .bind(email)
                .fetch_optional(conn)
                .await
        })
    }

    /// Create a new user with a freshly generated id.
    ///
    /// Timestamps follow the session's [`Timestamps`](super::Timestamps) strategy.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if the e-mail already exists (UNIQUE constraint
    /// violation) or the database is unreachable.
    pub async fn create(session: &mut DbSession, user_data: UserForCreate) -> Result<User, sqlx::Error> {
        let stamp = session.timestamps().stamp();
        let sql = format!(
            "INSERT INTO {USER_TABLE} (id, email, hashed_password, is_active, is_superuser, is_verified, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, CURRENT_TIMESTAMP), COALESCE($7, CURRENT_TIMESTAMP)) \
             RETURNING {USER_COLUMNS}"
        );

        on_conn!(session, conn => {
            sqlx::query_as::<_, User>(&sql)
                .bind(Uuid::new_v4())
                .bind(&user_data.email)
                .bind(&user_data.hashed_password)
                .bind(user_data.is_active)
                .bind(user_data.is_superuser)
                .bind(user_data.is_verified)
                .bind(stamp)
                .fetch_one(conn)
                .await
        })
    }

    /// Update an existing user using `UserForUpdate`.
    ///
    /// Only fields that are `Some` in `user_data` are written; `updated_at`
    /// is refreshed on every non-empty update.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(User))` - The updated user
    /// * `Ok(None)` - No user with that id
    pub async fn update(
        session: &mut DbSession,
        id: Uuid,
        user_data: UserForUpdate,
    ) -> Result<Option<User>, sqlx::Error> {
        if user_data.is_empty() {
            return Self::get(session, id).await;
        }

        // Build update query dynamically
        let mut updates = Vec::new();
        let mut next = 1;
        let mut placeholder = || {
            let p = format!("${next}");
            next += 1;
            p
        };

        if user_data.email.is_some() {
            updates.push(format!("email = {}", placeholder()));
        }
        if user_data.hashed_password.is_some() {
            updates.push(format!("hashed_password = {}", placeholder()));
        }
        if user_data.is_active.is_some() {
            updates.push(format!("is_active = {}", placeholder()));
        }
        if user_data.is_superuser.is_some() {
            updates.push(format!("is_superuser = {}", placeholder()));
        }
        if user_data.is_verified.is_some() {
            updates.push(format!("is_verified = {}", placeholder()));
        }
        updates.push(format!("updated_at = COALESCE({}, CURRENT_TIMESTAMP)", placeholder()));
        let id_placeholder = placeholder();

        let sql = format!(
            "UPDATE {USER_TABLE} SET {} WHERE id = {id_placeholder} RETURNING {USER_COLUMNS}",
            updates.join(", ")
        );
        let stamp = session.timestamps().stamp();

        on_conn!(session, conn => {
            let mut query = sqlx::query_as::<_, User>(&sql);

            if let Some(ref email) = user_data.email {
                query = query.bind(email);
            }
            if let Some(ref hashed_password) = user_data.hashed_password {
                query = query.bind(hashed_password);
            }
            if let Some(is_active) = user_data.is_active {
                query = query.bind(is_active);
            }
            if let Some(is_superuser) = user_data.is_superuser {
                query = query.bind(is_superuser);
            }
            if let Some(is_verified) = user_data.is_verified {
                query = query.bind(is_verified);
            }

            query.bind(stamp).bind(id).fetch_optional(conn).await
        })
    }

    /// Delete a user. Owned access tokens go with it (ON DELETE CASCADE).
    ///
    /// Returns `true` if a row was deleted.
    pub async fn delete(session: &mut DbSession, id: Uuid) -> Result<bool, sqlx::Error> {
        let sql = format!("DELETE FROM {USER_TABLE} WHERE id = $1");

        let rows = on_conn!(session, conn => {
            sqlx::query(&sql).bind(id).execute(conn).await?.rows_affected()
        });
        Ok(rows > 0)
    }

    /// Number of stored users.
    pub async fn count(session: &mut DbSession) -> Result<i64, sqlx::Error> {
        let sql = format!("SELECT COUNT(*) FROM {USER_TABLE}");

        let (count,): (i64,) = on_conn!(session, conn => {
            sqlx::query_as(&sql).fetch_one(conn).await?
        });
        Ok(count)
    }
}
