//! # Access Token Repository
//!
//! Storage for opaque bearer tokens. A token is valid while its row exists
//! and it is younger than the lifetime the caller checks against.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::models::AccessToken;
use super::schema::ACCESS_TOKEN_TABLE;
use super::{on_conn, DbSession};

const TOKEN_COLUMNS: &str = "token, user_id, created_at, updated_at";

pub struct AccessTokenRepository;

impl AccessTokenRepository {
    /// Store a newly issued token for `user_id`.
    pub async fn create(session: &mut DbSession, token: &str, user_id: Uuid) -> Result<AccessToken, sqlx::Error> {
        let stamp = session.timestamps().stamp();
        let sql = format!(
            "INSERT INTO {ACCESS_TOKEN_TABLE} (token, user_id, created_at, updated_at) \
             VALUES ($1, $2, COALESCE($3, CURRENT_TIMESTAMP), COALESCE($3, CURRENT_TIMESTAMP)) \
             RETURNING {TOKEN_COLUMNS}"
        );

        on_conn!(session, conn => {
            sqlx::query_as::<_, AccessToken>(&sql)
                .bind(token)
                .bind(user_id)
                .bind(stamp)
                .fetch_one(conn)
                .await
        })
    }

    /// Look up a token.
    ///
    /// When `issued_after` is set, tokens created before that instant are
    /// treated as absent. The comparison happens here rather than in SQL so
    /// that it behaves the same whether the row was stamped by the database
    /// or by the application.
    pub async fn get_by_token(
        session: &mut DbSession,
        token: &str,
        issued_after: Option<DateTime<Utc>>,
    ) -> Result<Option<AccessToken>, sqlx::Error> {
        let sql = format!("SELECT {TOKEN_COLUMNS} FROM {ACCESS_TOKEN_TABLE} WHERE token = $1");

        let found = on_conn!(session, conn => {
            sqlx::query_as::<_, AccessToken>(&sql)
                .bind(token)
                .fetch_optional(conn)
                .await?
        });

        Ok(found.filter(|t| issued_after.map_or(true, |cutoff| t.created_at >= cutoff)))
    }

    /// Delete a token. Returns `true` if it existed.
    pub async fn delete(session: &mut DbSession, token: &str) -> Result<bool, sqlx::Error> {
        let sql = format!("DELETE FROM {ACCESS_TOKEN_TABLE} WHERE token = $1");

        let rows = on_conn!(session, conn => {
            sqlx::query(&sql).bind(token).execute(conn).await?.rows_affected()
        });
        Ok(rows > 0)
    }
}
