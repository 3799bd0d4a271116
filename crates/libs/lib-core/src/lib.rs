//! # Core Library
//!
//! Settings, database engine and sessions, the user/token model and the
//! wire DTOs shared by the web layer and the maintenance tools.

pub mod config;
pub mod dto;
pub mod error;
pub mod model;

// Re-export commonly used types
pub use config::{init_settings, DbType, Settings};
pub use error::{AppError, Result};
pub use model::{DbSession, ModelManager};
