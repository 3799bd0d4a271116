//! # Schema Creation
//!
//! `CREATE TABLE IF NOT EXISTS` statements for every record type, rendered
//! per backend. Development convenience only; this is not a migration tool.

use crate::config::DbType;

use super::timestamps::Timestamps;

/// Table holding [`super::models::User`] records.
pub const USER_TABLE: &str = "\"user\"";
/// Table holding [`super::models::AccessToken`] records.
pub const ACCESS_TOKEN_TABLE: &str = "access_token";

/// Ordered DDL statements for `db_type` with the given timestamp strategy.
pub fn statements(db_type: DbType, timestamps: Timestamps) -> Vec<String> {
    let (uuid, datetime) = match db_type {
        DbType::Postgres => ("UUID", "TIMESTAMPTZ"),
        DbType::Sqlite => ("BLOB", "DATETIME"),
    };
    let ts_default = timestamps.column_default();

    vec![
        format!(
            r#"CREATE TABLE IF NOT EXISTS {USER_TABLE} (
    id {uuid} PRIMARY KEY,
    email VARCHAR(320) NOT NULL,
    hashed_password VARCHAR(1024) NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    is_superuser BOOLEAN NOT NULL DEFAULT FALSE,
    is_verified BOOLEAN NOT NULL DEFAULT FALSE,
    created_at {datetime} NOT NULL{ts_default},
    updated_at {datetime} NOT NULL{ts_default}
)"#
        ),
        format!("CREATE UNIQUE INDEX IF NOT EXISTS ix_user_email ON {USER_TABLE} (email)"),
        format!("CREATE INDEX IF NOT EXISTS ix_user_created_at ON {USER_TABLE} (created_at)"),
        format!(
            r#"CREATE TABLE IF NOT EXISTS {ACCESS_TOKEN_TABLE} (
    token VARCHAR(43) PRIMARY KEY,
    user_id {uuid} NOT NULL REFERENCES {USER_TABLE} (id) ON DELETE CASCADE,
    created_at {datetime} NOT NULL{ts_default},
    updated_at {datetime} NOT NULL{ts_default}
)"#
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS ix_access_token_created_at ON {ACCESS_TOKEN_TABLE} (created_at)"
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS ix_access_token_user_id ON {ACCESS_TOKEN_TABLE} (user_id)"
        ),
    ]
}
