//! # Timestamp Strategy
//!
//! `created_at` / `updated_at` are either assigned by the database server or
//! by this process. The strategy is picked once from the backend when the
//! engine is built; every insert and update then goes through the same SQL:
//!
//! ```sql
//! created_at = COALESCE($n, CURRENT_TIMESTAMP)
//! ```
//!
//! [`Timestamps::stamp`] yields `None` for the server-assigned strategy (the
//! database fills in `CURRENT_TIMESTAMP`) and the current time for the
//! application-assigned one, so both produce the same observable columns.

use chrono::{DateTime, Utc};
use lib_utils::now_utc;

use crate::config::DbType;

/// Who assigns record timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamps {
    /// The database server assigns the time at insert and on every update.
    Database,
    /// The application assigns the time at insert and on every update.
    Application,
}

impl Timestamps {
    /// Strategy for a backend: the networked server keeps time itself, the
    /// embedded engine gets it from the application.
    pub fn for_db_type(db_type: DbType) -> Self {
        match db_type {
            DbType::Postgres => Timestamps::Database,
            DbType::Sqlite => Timestamps::Application,
        }
    }

    /// Value to bind for a timestamp column on insert or update.
    pub fn stamp(self) -> Option<DateTime<Utc>> {
        match self {
            Timestamps::Database => None,
            Timestamps::Application => Some(now_utc()),
        }
    }

    /// Column default clause used in DDL.
    pub(crate) fn column_default(self) -> &'static str {
        match self {
            Timestamps::Database => " DEFAULT CURRENT_TIMESTAMP",
            Timestamps::Application => "",
        }
    }
}
