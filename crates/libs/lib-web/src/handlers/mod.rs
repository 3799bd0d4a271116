//! # HTTP Request Handlers
//!
//! Axum handlers organized by route group. Handlers stay thin: account rules
//! live in [`crate::auth::UserManager`], token handling in
//! [`crate::auth::AuthBackend`].
//!
//! ## Handler Modules
//!
//! - **[`auth`]**: login/logout, registration, password reset, verification
//!   - `POST /auth/jwt/login`, `POST /auth/jwt/logout`
//!   - `POST /auth/register`
//!   - `POST /auth/forgot-password`, `POST /auth/reset-password`
//!   - `POST /auth/request-verify-token`, `POST /auth/verify`
//!
//! - **[`users`]**: user self-service and administration
//!   - `GET|PATCH /users/me`
//!   - `GET|PATCH|DELETE /users/{id}`
//!
//! - **[`system`]**: health, configuration echo, database connectivity check
//!   - `GET /health`, `GET /`, `GET /db-check`, `GET /authenticated-route`

pub mod auth;
pub mod system;
pub mod users;
