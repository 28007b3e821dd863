//! Strata SDK
//!
//! A Rust library for integrating applications with the Strata headless
//! content API across server-rendered and client-rendered execution
//! contexts.
//!
//! This SDK provides:
//! - A token store with a cookie-backed mirror for the refresh token and a
//!   three-state static-token selector
//! - An auth session manager (login, refresh, logout, password resets) that
//!   keeps a cached user profile in sync with the session
//! - A bootstrap gate that silently restores sessions at startup and a
//!   route-admission guard for protected navigation
//! - Fail-soft wrappers for the file CRUD endpoints
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use strata_sdk::{AppContext, AutoRefresh, RouteDecision, StrataConfig};
//!
//! # async fn example() {
//! let mut config = StrataConfig::new("https://content.example.com");
//! config.auto_refresh.enable_middleware = true;
//! config.auto_refresh.to = vec!["/dashboard".to_string()];
//! let config = Arc::new(config);
//!
//! // One context per server-rendered request
//! let ctx = AppContext::server(Some("strata_refresh_token=abc123"));
//! let gate = AutoRefresh::new(ctx, config);
//!
//! // Silently restore the session, then gate the navigation
//! gate.run().await;
//! match gate.route_guard("/dashboard") {
//!     RouteDecision::Allow => { /* render the page */ }
//!     RouteDecision::Redirect { to, .. } => { /* redirect to `to` */ }
//! }
//! # }
//! ```

pub mod context;
pub mod strata_api;

// Re-export commonly used types and functions
pub use context::{AppContext, CookieAttributes, CookieJar, ExecutionMode, SameSite};
pub use strata_api::{
    auth::Auth,
    bootstrap::{AutoRefresh, RouteDecision},
    client::StrataClient,
    config::{AuthConfig, AutoRefreshConfig, StrataConfig},
    files::{Files, FilesParams},
    tokens::{StaticTokenPolicy, TokenStorage},
    types::{
        ApiError, AuthMode, AuthenticationData, ErrorDetail, FilesQuery, LoginOptions,
        RefreshOptions, SessionStatus, StrataError, StrataFile, User, UserState,
    },
};
