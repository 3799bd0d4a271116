//! # Middleware
//!
//! Axum middleware and request extractors shared by all routes.
//!
//! ## Modules
//!
//! - **[`mw_auth`]**: Current-user extraction and trust-level checks
//! - **[`mw_req_stamp`]**: Request ID and timestamp stamping
//! - **[`mw_logging`]**: Request/response logging

// region: --- Modules
pub mod mw_auth;
pub mod mw_logging;
pub mod mw_req_stamp;
// endregion: --- Modules

// region: --- Re-exports
pub use mw_auth::{
    CurrentActiveUser, CurrentSuperuser, CurrentUser, CurrentVerifiedUser, RequiredTrust, TrustLevel,
};
pub use mw_logging::log_requests;
pub use mw_req_stamp::{stamp_req, RequestStamp};
// endregion: --- Re-exports
