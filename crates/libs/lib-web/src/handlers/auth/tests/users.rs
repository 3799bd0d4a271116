//! # User Route Tests

use super::*;
use uuid::Uuid;

async fn patch_me(app: &TestApp, token: &str, body: Value) -> (StatusCode, Value) {
    app.send(json_request(Method::PATCH, "/users/me", body, Some(token)))
        .await
}

// region: --- /users/me

#[tokio::test]
async fn test_get_me() {
    let app = TestApp::new().await;
    let user = app.create_user("alice@example.com", false, false).await;
    let token = app.token_for("alice@example.com").await;

    let (status, body) = app.send(empty_request(Method::GET, "/users/me", Some(&token))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], user.id.to_string());
    assert_eq!(body["email"], "alice@example.com");
}

#[tokio::test]
async fn test_get_me_requires_token() {
    let app = TestApp::new().await;

    let (missing, _) = app.send(empty_request(Method::GET, "/users/me", None)).await;
    let (unknown, _) = app
        .send(empty_request(Method::GET, "/users/me", Some("no-such-token")))
        .await;

    assert_eq!(missing, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_deactivated_user_token_is_rejected() {
    let app = TestApp::new().await;
    let user = app.create_user("alice@example.com", false, false).await;
    let token = app.token_for("alice@example.com").await;

    let update = lib_core::dto::UserUpdate { is_active: Some(false), ..Default::default() };
    app.state.users.update(&user, update, false).await.unwrap();

    let (status, _) = app.send(empty_request(Method::GET, "/users/me", Some(&token))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_patch_me_email_clears_verification() {
    // Arrange
    let app = TestApp::new().await;
    app.create_user("alice@example.com", false, true).await;
    let token = app.token_for("alice@example.com").await;

    // Act
    let (status, body) = patch_me(&app, &token, json!({ "email": "alice@work.example.com" })).await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "alice@work.example.com");
    assert_eq!(body["is_verified"], false);
    assert_eq!(app.events.updated_fields(), vec![vec!["email", "is_verified"]]);
}

#[tokio::test]
async fn test_patch_me_ignores_privilege_flags() {
    let app = TestApp::new().await;
    app.create_user("alice@example.com", false, false).await;
    let token = app.token_for("alice@example.com").await;

    let (status, body) = patch_me(&app, &token, json!({ "is_superuser": true, "is_verified": true })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_superuser"], false);
    assert_eq!(body["is_verified"], false);
    assert!(app.events.updated_fields().is_empty());
}

#[tokio::test]
async fn test_patch_me_password() {
    let app = TestApp::new().await;
    app.create_user("alice@example.com", false, false).await;
    let token = app.token_for("alice@example.com").await;

    let (status, _) = patch_me(&app, &token, json!({ "password": "a brand new passphrase" })).await;

    assert_eq!(status, StatusCode::OK);
    let (login, _) = app.login("alice@example.com", "a brand new passphrase").await;
    assert_eq!(login, StatusCode::OK);
}

#[tokio::test]
async fn test_patch_me_email_taken() {
    let app = TestApp::new().await;
    app.create_user("alice@example.com", false, false).await;
    app.create_user("bob@example.com", false, false).await;
    let token = app.token_for("alice@example.com").await;

    let (status, body) = patch_me(&app, &token, json!({ "email": "BOB@example.com" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(detail_code(&body), "UPDATE_USER_EMAIL_ALREADY_EXISTS");
}

#[tokio::test]
async fn test_patch_me_weak_password() {
    let app = TestApp::new().await;
    app.create_user("alice@example.com", false, false).await;
    let token = app.token_for("alice@example.com").await;

    let (status, body) = patch_me(&app, &token, json!({ "password": "short" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"]["code"], "UPDATE_USER_INVALID_PASSWORD");
}

#[tokio::test]
async fn test_patch_me_invalid_email() {
    let app = TestApp::new().await;
    app.create_user("alice@example.com", false, false).await;
    let token = app.token_for("alice@example.com").await;

    let (status, _) = patch_me(&app, &token, json!({ "email": "nope" })).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

// endregion: --- /users/me

// region: --- /users/{id}

#[tokio::test]
async fn test_regular_user_cannot_administer() {
    let app = TestApp::new().await;
    let bob = app.create_user("bob@example.com", false, true).await;
    app.create_user("alice@example.com", false, true).await;
    let token = app.token_for("alice@example.com").await;

    let uri = format!("/users/{}", bob.id);
    let (get, _) = app.send(empty_request(Method::GET, &uri, Some(&token))).await;
    let (delete, _) = app.send(empty_request(Method::DELETE, &uri, Some(&token))).await;

    assert_eq!(get, StatusCode::FORBIDDEN);
    assert_eq!(delete, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_routes_require_token() {
    let app = TestApp::new().await;
    let bob = app.create_user("bob@example.com", false, false).await;

    let (status, _) = app
        .send(empty_request(Method::GET, &format!("/users/{}", bob.id), None))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_superuser_get_user() {
    let app = TestApp::new().await;
    let bob = app.create_user("bob@example.com", false, false).await;
    app.create_user("admin@example.com", true, true).await;
    let token = app.token_for("admin@example.com").await;

    let (status, body) = app
        .send(empty_request(Method::GET, &format!("/users/{}", bob.id), Some(&token)))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "bob@example.com");
}

#[tokio::test]
async fn test_superuser_get_unknown_or_malformed_id() {
    let app = TestApp::new().await;
    app.create_user("admin@example.com", true, true).await;
    let token = app.token_for("admin@example.com").await;

    let (unknown, _) = app
        .send(empty_request(Method::GET, &format!("/users/{}", Uuid::new_v4()), Some(&token)))
        .await;
    let (malformed, _) = app
        .send(empty_request(Method::GET, "/users/not-a-uuid", Some(&token)))
        .await;

    assert_eq!(unknown, StatusCode::NOT_FOUND);
    assert_eq!(malformed, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_superuser_patch_user_flags() {
    let app = TestApp::new().await;
    let bob = app.create_user("bob@example.com", false, false).await;
    app.create_user("admin@example.com", true, true).await;
    let token = app.token_for("admin@example.com").await;

    let body = json!({ "is_superuser": true, "is_verified": true });
    let (status, body) = app
        .send(json_request(Method::PATCH, &format!("/users/{}", bob.id), body, Some(&token)))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_superuser"], true);
    assert_eq!(body["is_verified"], true);
}

#[tokio::test]
async fn test_superuser_delete_user() {
    // Arrange
    let app = TestApp::new().await;
    let bob = app.create_user("bob@example.com", false, false).await;
    let bob_token = app.token_for("bob@example.com").await;
    app.create_user("admin@example.com", true, true).await;
    let token = app.token_for("admin@example.com").await;
    let uri = format!("/users/{}", bob.id);

    // Act
    let (status, _) = app.send(empty_request(Method::DELETE, &uri, Some(&token))).await;

    // Assert
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(app.events.deleted(), vec![bob.id]);

    let (again, _) = app.send(empty_request(Method::GET, &uri, Some(&token))).await;
    assert_eq!(again, StatusCode::NOT_FOUND);

    let (bob_me, _) = app.send(empty_request(Method::GET, "/users/me", Some(&bob_token))).await;
    assert_eq!(bob_me, StatusCode::UNAUTHORIZED);
}

// endregion: --- /users/{id}

// region: --- Trust levels

#[tokio::test]
async fn test_verified_extractor_rejects_unverified_user() {
    use crate::middleware::{CurrentActiveUser, CurrentVerifiedUser};
    use axum::{routing::get, Router};
    use tower::ServiceExt;

    let app = TestApp::new().await;
    app.create_user("alice@example.com", false, false).await;
    let token = app.token_for("alice@example.com").await;

    let router = Router::new()
        .route("/active", get(|_user: CurrentActiveUser| async { StatusCode::OK }))
        .route("/verified", get(|_user: CurrentVerifiedUser| async { StatusCode::OK }))
        .with_state(app.state.clone());

    let active = router
        .clone()
        .oneshot(empty_request(Method::GET, "/active", Some(&token)))
        .await
        .unwrap();
    let verified = router
        .oneshot(empty_request(Method::GET, "/verified", Some(&token)))
        .await
        .unwrap();

    assert_eq!(active.status(), StatusCode::OK);
    assert_eq!(verified.status(), StatusCode::FORBIDDEN);
}

// endregion: --- Trust levels
