//! # User Lifecycle Hooks
//!
//! [`UserManager`](super::UserManager) calls these after each state change has
//! been committed. A hook cannot veto or roll back the change, and a hook
//! failure is not reported to the client.

use async_trait::async_trait;
use lib_core::model::store::models::User;
use tracing::{debug, info};

/// Notification hooks fired by the user manager.
///
/// Every method defaults to doing nothing, so implementors only override
/// the events they care about.
#[async_trait]
pub trait UserEvents: Send + Sync {
    async fn on_after_register(&self, _user: &User) {}

    /// `token` is the password-reset token to deliver to the user.
    async fn on_after_forgot_password(&self, _user: &User, _token: &str) {}

    /// `token` is the e-mail verification token to deliver to the user.
    async fn on_after_request_verify(&self, _user: &User, _token: &str) {}

    async fn on_after_login(&self, _user: &User) {}

    /// `fields` names the columns that changed; never includes the password value.
    async fn on_after_update(&self, _user: &User, _fields: &[&'static str]) {}

    async fn on_after_reset_password(&self, _user: &User) {}

    async fn on_after_verify(&self, _user: &User) {}

    async fn on_after_delete(&self, _user: &User) {}
}

/// Surfaces every event through `tracing`.
///
/// Tokens are logged at DEBUG only.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingUserEvents;

#[async_trait]
impl UserEvents for LoggingUserEvents {
    async fn on_after_register(&self, user: &User) {
        info!("[USER] User {} has registered.", user.id);
    }

    async fn on_after_forgot_password(&self, user: &User, token: &str) {
        info!("[USER] User {} has forgot their password.", user.id);
        debug!("   Reset token: {}", token);
    }

    async fn on_after_request_verify(&self, user: &User, token: &str) {
        info!("[USER] Verification requested for user {}.", user.id);
        debug!("   Verification token: {}", token);
    }

    async fn on_after_login(&self, user: &User) {
        info!("[USER] User {} logged in.", user.id);
    }

    async fn on_after_update(&self, user: &User, fields: &[&'static str]) {
        info!("[USER] User {} updated: {}", user.id, fields.join(", "));
    }

    async fn on_after_reset_password(&self, user: &User) {
        info!("[USER] User {} has reset their password.", user.id);
    }

    async fn on_after_verify(&self, user: &User) {
        info!("[USER] User {} has been verified.", user.id);
    }

    async fn on_after_delete(&self, user: &User) {
        info!("[USER] User {} has been deleted.", user.id);
    }
}
