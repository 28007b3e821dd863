/// Strata API integration module
///
/// This module provides the pieces of the Strata integration layer: the HTTP
/// client, the token store and accessor, the auth session manager, the file
/// operation wrappers, and the startup refresh gate.
///
/// ## Session restore flow
///
/// 1. A context is created for the server render of an incoming request (or
///    for a browser session)
/// 2. The bootstrap gate inspects the request's refresh cookie and attempts
///    a silent refresh against the Strata API
/// 3. On success the token pair is written into the context's token store
///    and the user profile is fetched and cached
/// 4. The route-admission guard reads the cached user to decide whether a
///    navigation is permitted
pub mod auth;
pub mod bootstrap;
pub mod client;
pub mod config;
pub mod files;
pub mod tokens;
pub mod types;

pub use auth::Auth;
pub use bootstrap::{AutoRefresh, RouteDecision};
pub use client::StrataClient;
pub use config::{AuthConfig, AutoRefreshConfig, StrataConfig};
pub use files::{Files, FilesParams};
pub use tokens::{StaticTokenPolicy, TokenStorage};
pub use types::{ApiError, AuthMode, AuthenticationData, ErrorDetail, StrataError};
