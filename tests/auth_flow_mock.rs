//! Auth session manager tests
//!
//! Exercises login, refresh, logout, and the password operations against a
//! mock HTTP server, verifying the session side effects (token store, cookie
//! mirror, cached user) and the fail-soft error policy.

use std::sync::Arc;
use strata_sdk::{
    AppContext, Auth, AuthenticationData, LoginOptions, SessionStatus, StaticTokenPolicy,
    StrataConfig, UserState,
};
use serde_json::json;
use wiremock::{
    matchers::{body_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

fn config(base_url: &str, cookie_transport: bool) -> Arc<StrataConfig> {
    let mut config = StrataConfig::new(base_url);
    config.auth.cookie_transport = cookie_transport;
    Arc::new(config)
}

fn auth_body() -> serde_json::Value {
    json!({
        "data": {
            "access_token": "access-1",
            "refresh_token": "refresh-1",
            "expires": 900000,
            "expires_at": 1900000000000i64
        }
    })
}

fn me_body() -> serde_json::Value {
    json!({
        "data": {
            "id": "user-1",
            "email": "admin@example.com",
            "first_name": "Ada",
            "role": "admin"
        }
    })
}

async fn mount_me(server: &MockServer, bearer: &str) {
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header("Authorization", format!("Bearer {}", bearer).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(me_body()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_login_success_side_effects() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({
            "email": "admin@example.com",
            "password": "hunter2",
            "mode": "json"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    // The profile fetch must carry the just-issued session token
    mount_me(&mock_server, "access-1").await;

    let ctx = AppContext::server(None);
    let auth = Auth::new(ctx.clone(), config(&mock_server.uri(), true));

    let result = auth.login("admin@example.com", "hunter2", None).await;

    // Returned value mirrors the four fields of the exchange response
    let data = result.expect("login should succeed");
    assert_eq!(data.access_token, Some("access-1".to_string()));
    assert_eq!(data.refresh_token, Some("refresh-1".to_string()));
    assert_eq!(data.expires, Some(900_000));
    assert_eq!(data.expires_at, Some(1_900_000_000_000));

    // Store holds the returned tokens
    let stored = auth.tokens().stored().expect("store should be populated");
    assert_eq!(stored.access_token, Some("access-1".to_string()));

    // Cookie transport mirrors the refresh token into the cookie
    assert_eq!(
        ctx.cookies().get("strata_refresh_token"),
        Some("refresh-1".to_string())
    );

    // Cached user populated from the profile fetch
    let user = auth.user();
    assert_eq!(user.user().map(|u| u.id.as_str()), Some("user-1"));
    assert_eq!(auth.status(), SessionStatus::Authenticated);
}

#[tokio::test]
async fn test_login_failure_leaves_state_untouched() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "errors": [{
                "message": "Invalid user credentials.",
                "extensions": {"code": "INVALID_CREDENTIALS"}
            }]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let ctx = AppContext::server(None);
    let auth = Auth::new(ctx, config(&mock_server.uri(), true));

    let result = auth.login("admin@example.com", "wrong", None).await;

    assert!(result.is_none());
    assert!(auth.tokens().stored().is_none());
    assert_eq!(auth.user(), UserState::Unresolved);
    assert_eq!(auth.status(), SessionStatus::Anonymous);
}

#[tokio::test]
async fn test_login_uses_caller_mode_over_default() {
    let mock_server = MockServer::start().await;

    // cookie_transport = true computes "json", but the caller forces "cookie"
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({
            "email": "admin@example.com",
            "password": "hunter2",
            "mode": "cookie"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "access_token": "access-1",
                "refresh_token": null,
                "expires": 900000,
                "expires_at": 1900000000000i64
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    mount_me(&mock_server, "access-1").await;

    let auth = Auth::new(AppContext::server(None), config(&mock_server.uri(), true));
    let options = LoginOptions {
        mode: Some(strata_sdk::AuthMode::Cookie),
        otp: None,
    };

    let result = auth.login("admin@example.com", "hunter2", Some(options)).await;
    assert!(result.is_some());
}

#[tokio::test]
async fn test_refresh_failure_is_idempotent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "errors": [{"message": "Invalid refresh token."}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let auth = Auth::new(AppContext::server(None), config(&mock_server.uri(), true));

    // No refresh token exists anywhere; the call must not corrupt anything
    let result = auth.refresh(None).await;

    assert!(result.is_none());
    assert!(auth.tokens().stored().is_none());
    assert_eq!(auth.user(), UserState::Unresolved);
    assert_eq!(auth.status(), SessionStatus::RefreshFailed);
}

#[tokio::test]
async fn test_refresh_uses_stored_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(body_json(json!({
            "refresh_token": "refresh-0",
            "mode": "json"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    mount_me(&mock_server, "access-1").await;

    let auth = Auth::new(AppContext::server(None), config(&mock_server.uri(), true));
    auth.tokens().set(Some(&AuthenticationData {
        access_token: Some("access-0".to_string()),
        refresh_token: Some("refresh-0".to_string()),
        expires_at: Some(1_900_000_000_000),
        expires: Some(900_000),
    }));

    let result = auth.refresh(None).await;

    let data = result.expect("refresh should succeed");
    assert_eq!(data.access_token, Some("access-1".to_string()));
    assert_eq!(
        auth.tokens().get(&StaticTokenPolicy::Never).refresh_token,
        Some("refresh-1".to_string())
    );
    assert_eq!(auth.status(), SessionStatus::Authenticated);
}

#[tokio::test]
async fn test_logout_marks_user_anonymous_but_keeps_store() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_body()))
        .mount(&mock_server)
        .await;
    mount_me(&mock_server, "access-1").await;
    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let auth = Auth::new(AppContext::server(None), config(&mock_server.uri(), true));
    auth.login("admin@example.com", "hunter2", None).await;

    auth.logout().await;

    // Explicit signed-out sentinel, not merely unresolved
    assert_eq!(auth.user(), UserState::Anonymous);
    assert_eq!(auth.status(), SessionStatus::Anonymous);
    // Pessimistic logout: the store is left for the server to invalidate
    assert!(auth.tokens().stored().is_some());
}

#[tokio::test]
async fn test_logout_failure_keeps_user_cache() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_body()))
        .mount(&mock_server)
        .await;
    mount_me(&mock_server, "access-1").await;
    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let auth = Auth::new(AppContext::server(None), config(&mock_server.uri(), true));
    auth.login("admin@example.com", "hunter2", None).await;

    auth.logout().await;

    assert!(auth.user().is_authenticated());
    assert_eq!(auth.status(), SessionStatus::Authenticated);
}

#[tokio::test]
async fn test_password_request_passthrough() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/password/request"))
        .and(body_json(json!({
            "email": "ada@example.com",
            "reset_url": "https://app.example.com/reset"
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let auth = Auth::new(AppContext::server(None), config(&mock_server.uri(), true));
    auth.password_request("ada@example.com", Some("https://app.example.com/reset"))
        .await;

    // No state is touched by the pass-through
    assert!(auth.tokens().stored().is_none());
    assert_eq!(auth.user(), UserState::Unresolved);
}

#[tokio::test]
async fn test_password_reset_failure_is_swallowed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/password/reset"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "errors": [{"message": "Invalid token."}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let auth = Auth::new(AppContext::server(None), config(&mock_server.uri(), true));
    // Must not panic or surface the failure
    auth.password_reset("stale-token", "new-password").await;
    assert_eq!(auth.user(), UserState::Unresolved);
}
