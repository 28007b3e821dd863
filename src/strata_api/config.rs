use crate::context::SameSite;

/// SDK configuration, resolved once at startup and immutable thereafter.
#[derive(Debug, Clone)]
pub struct StrataConfig {
    /// Base URL of the Strata API
    pub base_url: String,
    /// Fixed, configuration-supplied credential used in place of a session
    pub static_token: Option<String>,
    pub auth: AuthConfig,
    pub auto_refresh: AutoRefreshConfig,
}

impl StrataConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            static_token: None,
            auth: AuthConfig::default(),
            auto_refresh: AutoRefreshConfig::default(),
        }
    }
}

/// Authentication and token-transport configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Key of the shared auth state on the execution context
    pub state_name: String,
    /// Key of the cached user profile on the execution context
    pub user_state_name: String,
    /// When true the SDK mirrors the refresh token into a cookie it manages
    /// itself and the cookie is the source of truth for that token; when
    /// false the API server manages an httpOnly refresh cookie the
    /// application never reads.
    pub cookie_transport: bool,
    pub refresh_cookie_name: String,
    pub cookie_http_only: bool,
    pub cookie_same_site: SameSite,
    pub cookie_secure: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            state_name: "strata.auth".to_string(),
            user_state_name: "strata.user".to_string(),
            cookie_transport: true,
            refresh_cookie_name: "strata_refresh_token".to_string(),
            // The SDK-managed cookie must stay readable from page scripts
            cookie_http_only: false,
            cookie_same_site: SameSite::Lax,
            cookie_secure: false,
        }
    }
}

/// Configuration for the startup refresh hook and the route-admission guard.
#[derive(Debug, Clone)]
pub struct AutoRefreshConfig {
    /// Enables the route-admission guard
    pub enable_middleware: bool,
    /// Whether the host should register the guard on every route
    pub global: bool,
    /// Name the host registers the guard under
    pub middleware_name: String,
    /// Destination for unauthenticated visitors
    pub redirect_to: String,
    /// Paths the guard applies to; empty means all routes
    pub to: Vec<String>,
}

impl Default for AutoRefreshConfig {
    fn default() -> Self {
        Self {
            enable_middleware: false,
            global: true,
            middleware_name: "auth".to_string(),
            redirect_to: "/login".to_string(),
            to: Vec::new(),
        }
    }
}
