//! # Web Library
//!
//! HTTP surface of the authentication backend: the user manager and its
//! hooks, the bearer/database auth backend, request extractors, handlers,
//! the router and the lifecycle controller that brackets serving.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod lifecycle;
pub mod middleware;
pub mod server;

#[cfg(test)]
mod test_utils;

pub use error::{ApiError, ApiResult, ErrorCode};
pub use lifecycle::{Lifecycle, LifecycleState};
pub use server::{create_router, init_tracing, start_server, AppState, ServerConfig};
