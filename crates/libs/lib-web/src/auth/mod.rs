//! # Auth Wiring
//!
//! Everything the routes need to authenticate requests and manage accounts:
//!
//! - [`UserManager`]: account rules and purpose tokens, over
//!   [`UserRepository`](lib_core::model::store::UserRepository)
//! - [`AuthBackend`]: bearer transport + database token strategy, over
//!   [`AccessTokenRepository`](lib_core::model::store::AccessTokenRepository)
//! - [`UserEvents`]: hooks fired after account changes
//!
//! Trust-level checks live in [`crate::middleware::mw_auth`].

// region: --- Modules
pub mod backend;
pub mod events;
pub mod manager;
// endregion: --- Modules

// region: --- Re-exports
pub use backend::{AuthBackend, BearerTransport, DatabaseStrategy};
pub use events::{LoggingUserEvents, UserEvents};
pub use manager::{UserManager, UserManagerError};
// endregion: --- Re-exports
