//! # User Manager
//!
//! Account rules shared by every route: registration, credential checks,
//! password reset, e-mail verification, updates and deletion.
//!
//! Each operation runs in its own session and commits before the matching
//! [`UserEvents`] hook fires.
//!
//! ## Tokens
//!
//! Reset and verification tokens are short-lived JWTs signed with separate
//! secrets and scoped by audience, so neither can stand in for the other.
//! A reset token also carries a fingerprint of the current password hash and
//! stops working as soon as the password changes.

use std::sync::Arc;

use lib_auth::{
    decode_token, encode_token, hash_password, validate_password, verify_password, Claims, TokenPurpose,
};
use lib_core::dto::{UserCreate, UserUpdate};
use lib_core::model::store::models::{User, UserForCreate, UserForUpdate};
use lib_core::model::store::UserRepository;
use lib_core::{AppError, ModelManager, Settings};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use super::events::UserEvents;

#[derive(Debug, Error)]
pub enum UserManagerError {
    #[error("User already exists")]
    UserAlreadyExists,

    #[error("User does not exist")]
    UserNotExists,

    #[error("User is inactive")]
    UserInactive,

    #[error("User is already verified")]
    UserAlreadyVerified,

    #[error("Invalid password: {0}")]
    InvalidPassword(String),

    #[error("Invalid reset password token")]
    InvalidResetPasswordToken,

    #[error("Invalid verify token")]
    InvalidVerifyToken,

    #[error(transparent)]
    Core(#[from] AppError),
}

impl From<sqlx::Error> for UserManagerError {
    fn from(err: sqlx::Error) -> Self {
        UserManagerError::Core(AppError::from(err))
    }
}

pub type Result<T> = std::result::Result<T, UserManagerError>;

/// A unique violation on the e-mail index means another request won the race.
fn map_unique(err: sqlx::Error) -> UserManagerError {
    let err = AppError::from(err);
    if err.is_unique_violation() {
        UserManagerError::UserAlreadyExists
    } else {
        UserManagerError::Core(err)
    }
}

/// E-mail addresses are stored and looked up without surrounding whitespace.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_string()
}

fn hash(password: &str) -> Result<String> {
    hash_password(password).map_err(|e| UserManagerError::Core(AppError::Internal(e)))
}

#[derive(Clone)]
pub struct UserManager {
    mm: ModelManager,
    reset_password_token_secret: String,
    verification_token_secret: String,
    events: Arc<dyn UserEvents>,
}

impl UserManager {
    pub fn new(mm: ModelManager, settings: &Settings, events: Arc<dyn UserEvents>) -> Self {
        Self {
            mm,
            reset_password_token_secret: settings.reset_password_token_secret.clone(),
            verification_token_secret: settings.verification_token_secret.clone(),
            events,
        }
    }

    pub fn model_manager(&self) -> &ModelManager {
        &self.mm
    }

    // region: --- Lookup

    pub async fn get(&self, id: Uuid) -> Result<User> {
        let mut session = self.mm.acquire_session().await?;
        UserRepository::get(&mut session, id)
            .await?
            .ok_or(UserManagerError::UserNotExists)
    }

    pub async fn get_by_email(&self, email: &str) -> Result<User> {
        let mut session = self.mm.acquire_session().await?;
        UserRepository::find_by_email(&mut session, &normalize_email(email))
            .await?
            .ok_or(UserManagerError::UserNotExists)
    }

    /// Check an e-mail/password pair.
    ///
    /// Returns `None` for an unknown e-mail or a wrong password. Inactive
    /// users are returned; the caller decides what to do with them.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Option<User>> {
        let user = match self.get_by_email(email).await {
            Ok(user) => user,
            Err(UserManagerError::UserNotExists) => {
                // Keep the unknown-user path as slow as the wrong-password path.
                let _ = hash_password(password);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        match verify_password(password, &user.hashed_password) {
            Ok(true) => Ok(Some(user)),
            Ok(false) => Ok(None),
            Err(e) => {
                warn!("[AUTH] Stored hash for user {} is unreadable: {}", user.id, e);
                Ok(None)
            }
        }
    }

    // endregion: --- Lookup

    // region: --- Registration

    /// Create a user.
    ///
    /// With `safe` set the privilege flags in `user_create` are ignored and
    /// the user starts active, unverified and unprivileged.
    pub async fn register(&self, user_create: UserCreate, safe: bool) -> Result<User> {
        let email = normalize_email(&user_create.email);
        validate_password(&user_create.password, &email).map_err(UserManagerError::InvalidPassword)?;
        let hashed_password = hash(&user_create.password)?;

        let mut session = self.mm.acquire_session().await?;
        if UserRepository::find_by_email(&mut session, &email).await?.is_some() {
            return Err(UserManagerError::UserAlreadyExists);
        }

        let mut data = UserForCreate::new(email, hashed_password);
        if !safe {
            if let Some(is_active) = user_create.is_active {
                data = data.active(is_active);
            }
            if let Some(is_superuser) = user_create.is_superuser {
                data = data.superuser(is_superuser);
            }
            if let Some(is_verified) = user_create.is_verified {
                data = data.verified(is_verified);
            }
        }

        let user = UserRepository::create(&mut session, data).await.map_err(map_unique)?;
        session.commit().await?;

        self.events.on_after_register(&user).await;
        Ok(user)
    }

    // endregion: --- Registration

    // region: --- Password reset

    /// Issue a reset token for `user` and hand it to the hook.
    pub async fn forgot_password(&self, user: &User) -> Result<()> {
        if !user.is_active {
            return Err(UserManagerError::UserInactive);
        }

        let claims = Claims::new(TokenPurpose::ResetPassword, user.id.to_string())
            .with_password_fgpt(hash(&user.hashed_password)?);
        let token = encode_token(&claims, &self.reset_password_token_secret)
            .map_err(|e| UserManagerError::Core(AppError::Internal(e)))?;

        self.events.on_after_forgot_password(user, &token).await;
        Ok(())
    }

    pub async fn reset_password(&self, token: &str, password: &str) -> Result<User> {
        let claims = decode_token(token, &self.reset_password_token_secret, TokenPurpose::ResetPassword)
            .map_err(|e| {
                debug!("[RESET] Token rejected: {}", e);
                UserManagerError::InvalidResetPasswordToken
            })?;
        let fingerprint = claims
            .password_fgpt
            .ok_or(UserManagerError::InvalidResetPasswordToken)?;
        let id = Uuid::parse_str(&claims.sub).map_err(|_| UserManagerError::InvalidResetPasswordToken)?;

        let user = self.get(id).await?;
        if !verify_password(&user.hashed_password, &fingerprint).unwrap_or(false) {
            return Err(UserManagerError::InvalidResetPasswordToken);
        }
        if !user.is_active {
            return Err(UserManagerError::UserInactive);
        }
        validate_password(password, &user.email).map_err(UserManagerError::InvalidPassword)?;
        let hashed_password = hash(password)?;

        // A concurrent reset may have spent the token since the read above.
        let mut session = self.mm.acquire_session().await?;
        let current = UserRepository::get(&mut session, id)
            .await?
            .ok_or(UserManagerError::UserNotExists)?;
        if current.hashed_password != user.hashed_password {
            return Err(UserManagerError::InvalidResetPasswordToken);
        }

        let update = UserForUpdate::new().hashed_password(hashed_password);
        let user = UserRepository::update(&mut session, id, update)
            .await?
            .ok_or(UserManagerError::UserNotExists)?;
        session.commit().await?;

        self.events.on_after_reset_password(&user).await;
        Ok(user)
    }

    // endregion: --- Password reset

    // region: --- Verification

    /// Issue a verification token for `user` and hand it to the hook.
    pub async fn request_verify(&self, user: &User) -> Result<()> {
        if !user.is_active {
            return Err(UserManagerError::UserInactive);
        }
        if user.is_verified {
            return Err(UserManagerError::UserAlreadyVerified);
        }

        let claims = Claims::new(TokenPurpose::Verify, user.id.to_string()).with_email(user.email.clone());
        let token = encode_token(&claims, &self.verification_token_secret)
            .map_err(|e| UserManagerError::Core(AppError::Internal(e)))?;

        self.events.on_after_request_verify(user, &token).await;
        Ok(())
    }

    pub async fn verify(&self, token: &str) -> Result<User> {
        let claims = decode_token(token, &self.verification_token_secret, TokenPurpose::Verify)
            .map_err(|e| {
                debug!("[VERIFY] Token rejected: {}", e);
                UserManagerError::InvalidVerifyToken
            })?;
        let email = claims
            .email
            .map(|e| normalize_email(&e))
            .ok_or(UserManagerError::InvalidVerifyToken)?;

        let mut session = self.mm.acquire_session().await?;
        let user = UserRepository::find_by_email(&mut session, &email)
            .await?
            .ok_or(UserManagerError::InvalidVerifyToken)?;

        let id = Uuid::parse_str(&claims.sub).map_err(|_| UserManagerError::InvalidVerifyToken)?;
        if id != user.id {
            return Err(UserManagerError::InvalidVerifyToken);
        }
        if user.is_verified {
            return Err(UserManagerError::UserAlreadyVerified);
        }

        let user = UserRepository::update(&mut session, user.id, UserForUpdate::new().is_verified(true))
            .await?
            .ok_or(UserManagerError::UserNotExists)?;
        session.commit().await?;

        self.events.on_after_verify(&user).await;
        Ok(user)
    }

    // endregion: --- Verification

    // region: --- Update / Delete

    /// Apply `update` to `user`.
    ///
    /// Changing the e-mail clears `is_verified`. With `safe` set the
    /// privilege flags in `update` are ignored.
    pub async fn update(&self, user: &User, update: UserUpdate, safe: bool) -> Result<User> {
        let mut data = UserForUpdate::new();
        let mut fields = Vec::new();

        let new_email = update
            .email
            .map(|e| normalize_email(&e))
            .filter(|e| *e != user.email);

        // Hash before taking a session so the write lock covers SQL only.
        if let Some(password) = update.password {
            let email_for_policy = new_email.as_deref().unwrap_or(&user.email);
            validate_password(&password, email_for_policy).map_err(UserManagerError::InvalidPassword)?;
            data = data.hashed_password(hash(&password)?);
            fields.push("password");
        }

        let mut session = self.mm.acquire_session().await?;

        if let Some(email) = new_email {
            if let Some(existing) = UserRepository::find_by_email(&mut session, &email).await? {
                if existing.id != user.id {
                    return Err(UserManagerError::UserAlreadyExists);
                }
            }
            data = data.email(email).is_verified(false);
            fields.extend(["email", "is_verified"]);
        }

        if !safe {
            if let Some(is_active) = update.is_active {
                data = data.is_active(is_active);
                fields.push("is_active");
            }
            if let Some(is_superuser) = update.is_superuser {
                data = data.is_superuser(is_superuser);
                fields.push("is_superuser");
            }
            if let Some(is_verified) = update.is_verified {
                data = data.is_verified(is_verified);
                if !fields.contains(&"is_verified") {
                    fields.push("is_verified");
                }
            }
        }

        let updated = UserRepository::update(&mut session, user.id, data)
            .await
            .map_err(map_unique)?
            .ok_or(UserManagerError::UserNotExists)?;
        session.commit().await?;

        if !fields.is_empty() {
            self.events.on_after_update(&updated, &fields).await;
        }
        Ok(updated)
    }

    /// Delete `user` and, through the foreign key, every token it owns.
    pub async fn delete(&self, user: &User) -> Result<()> {
        let mut session = self.mm.acquire_session().await?;
        if !UserRepository::delete(&mut session, user.id).await? {
            return Err(UserManagerError::UserNotExists);
        }
        session.commit().await?;

        self.events.on_after_delete(user).await;
        Ok(())
    }

    // endregion: --- Update / Delete

    pub async fn on_after_login(&self, user: &User) {
        self.events.on_after_login(user).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::sqlite_app_state;

    const PASSWORD: &str = "correct horse battery";

    async fn register(manager: &UserManager, email: &str) -> User {
        manager
            .register(UserCreate::new(email, PASSWORD), true)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_register_fires_hook_and_ignores_flags_when_safe() {
        let (_dir, state, events) = sqlite_app_state().await;

        let mut request = UserCreate::new("alice@example.com", PASSWORD);
        request.is_superuser = Some(true);
        request.is_verified = Some(true);
        let user = state.users.register(request, true).await.unwrap();

        assert!(user.is_active);
        assert!(!user.is_superuser);
        assert!(!user.is_verified);
        assert_eq!(events.registered(), vec![user.id]);
    }

    #[tokio::test]
    async fn test_register_unsafe_honours_flags() {
        let (_dir, state, _events) = sqlite_app_state().await;

        let mut request = UserCreate::new("root@example.com", PASSWORD);
        request.is_superuser = Some(true);
        let user = state.users.register(request, false).await.unwrap();

        assert!(user.is_superuser);
    }

    #[tokio::test]
    async fn test_register_duplicate_email_any_case() {
        let (_dir, state, _events) = sqlite_app_state().await;
        register(&state.users, "alice@example.com").await;

        let err = state
            .users
            .register(UserCreate::new("ALICE@example.com", PASSWORD), true)
            .await
            .unwrap_err();
        assert!(matches!(err, UserManagerError::UserAlreadyExists));
    }

    #[tokio::test]
    async fn test_register_trims_email() {
        let (_dir, state, _events) = sqlite_app_state().await;

        let user = register(&state.users, "  alice@example.com ").await;
        assert_eq!(user.email, "alice@example.com");

        let duplicate = state
            .users
            .register(UserCreate::new("alice@example.com", PASSWORD), true)
            .await;
        assert!(matches!(duplicate, Err(UserManagerError::UserAlreadyExists)));

        let found = state.users.get_by_email(" alice@example.com").await.unwrap();
        assert_eq!(found.id, user.id);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_registrations() {
        let (_dir, state, events) = sqlite_app_state().await;

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let users = state.users.clone();
                tokio::spawn(async move {
                    users
                        .register(UserCreate::new(&format!("user{i}@example.com"), PASSWORD), true)
                        .await
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(events.registered().len(), 16);
        let mut session = state.mm.acquire_session().await.unwrap();
        assert_eq!(UserRepository::count(&mut session).await.unwrap(), 16);
    }

    #[tokio::test]
    async fn test_register_rejects_weak_password() {
        let (_dir, state, events) = sqlite_app_state().await;

        let err = state
            .users
            .register(UserCreate::new("alice@example.com", "short"), true)
            .await
            .unwrap_err();
        assert!(matches!(err, UserManagerError::InvalidPassword(_)));
        assert!(events.registered().is_empty());
    }

    #[tokio::test]
    async fn test_authenticate() {
        let (_dir, state, _events) = sqlite_app_state().await;
        let user = register(&state.users, "alice@example.com").await;

        let ok = state.users.authenticate("alice@example.com", PASSWORD).await.unwrap();
        assert_eq!(ok.map(|u| u.id), Some(user.id));

        assert!(state
            .users
            .authenticate("alice@example.com", "wrong password")
            .await
            .unwrap()
            .is_none());
        assert!(state
            .users
            .authenticate("nobody@example.com", PASSWORD)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_reset_password_flow() {
        let (_dir, state, events) = sqlite_app_state().await;
        let user = register(&state.users, "alice@example.com").await;

        state.users.forgot_password(&user).await.unwrap();
        let token = events.last_reset_token().unwrap();

        state.users.reset_password(&token, "a brand new password").await.unwrap();
        assert!(state
            .users
            .authenticate("alice@example.com", "a brand new password")
            .await
            .unwrap()
            .is_some());

        // The fingerprint no longer matches once the password changed.
        let err = state
            .users
            .reset_password(&token, "yet another password")
            .await
            .unwrap_err();
        assert!(matches!(err, UserManagerError::InvalidResetPasswordToken));
    }

    #[tokio::test]
    async fn test_forgot_password_inactive_user() {
        let (_dir, state, events) = sqlite_app_state().await;
        let user = register(&state.users, "alice@example.com").await;
        let update = UserUpdate {
            is_active: Some(false),
            ..Default::default()
        };
        let user = state.users.update(&user, update, false).await.unwrap();

        let err = state.users.forgot_password(&user).await.unwrap_err();
        assert!(matches!(err, UserManagerError::UserInactive));
        assert!(events.last_reset_token().is_none());
    }

    #[tokio::test]
    async fn test_verification_token_cannot_reset_password() {
        let (_dir, state, events) = sqlite_app_state().await;
        let user = register(&state.users, "alice@example.com").await;

        state.users.request_verify(&user).await.unwrap();
        let verify_token = events.last_verify_token().unwrap();

        let err = state
            .users
            .reset_password(&verify_token, "a brand new password")
            .await
            .unwrap_err();
        assert!(matches!(err, UserManagerError::InvalidResetPasswordToken));
    }

    #[tokio::test]
    async fn test_verify_flow() {
        let (_dir, state, events) = sqlite_app_state().await;
        let user = register(&state.users, "alice@example.com").await;

        state.users.request_verify(&user).await.unwrap();
        let token = events.last_verify_token().unwrap();

        let verified = state.users.verify(&token).await.unwrap();
        assert!(verified.is_verified);

        let err = state.users.verify(&token).await.unwrap_err();
        assert!(matches!(err, UserManagerError::UserAlreadyVerified));
        let err = state.users.request_verify(&verified).await.unwrap_err();
        assert!(matches!(err, UserManagerError::UserAlreadyVerified));
    }

    #[tokio::test]
    async fn test_email_change_clears_verified() {
        let (_dir, state, events) = sqlite_app_state().await;
        let user = register(&state.users, "alice@example.com").await;
        let user = state
            .users
            .update(&user, UserUpdate { is_verified: Some(true), ..Default::default() }, false)
            .await
            .unwrap();
        assert!(user.is_verified);

        let update = UserUpdate {
            email: Some("alice@new.example.com".to_string()),
            ..Default::default()
        };
        let user = state.users.update(&user, update, true).await.unwrap();

        assert_eq!(user.email, "alice@new.example.com");
        assert!(!user.is_verified);
        assert_eq!(events.updated_fields().last().unwrap(), &vec!["email", "is_verified"]);
    }

    #[tokio::test]
    async fn test_safe_update_ignores_flags() {
        let (_dir, state, _events) = sqlite_app_state().await;
        let user = register(&state.users, "alice@example.com").await;

        let update = UserUpdate {
            is_superuser: Some(true),
            ..Default::default()
        };
        let user = state.users.update(&user, update, true).await.unwrap();
        assert!(!user.is_superuser);
    }

    #[tokio::test]
    async fn test_update_to_taken_email() {
        let (_dir, state, _events) = sqlite_app_state().await;
        register(&state.users, "alice@example.com").await;
        let bob = register(&state.users, "bob@example.com").await;

        let update = UserUpdate {
            email: Some("alice@example.com".to_string()),
            ..Default::default()
        };
        let err = state.users.update(&bob, update, true).await.unwrap_err();
        assert!(matches!(err, UserManagerError::UserAlreadyExists));
    }

    #[tokio::test]
    async fn test_delete_user() {
        let (_dir, state, events) = sqlite_app_state().await;
        let user = register(&state.users, "alice@example.com").await;

        state.users.delete(&user).await.unwrap();

        assert!(matches!(
            state.users.get(user.id).await.unwrap_err(),
            UserManagerError::UserNotExists
        ));
        assert_eq!(events.deleted(), vec![user.id]);
    }
}
