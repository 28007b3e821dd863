use crate::context::AppContext;
use crate::strata_api::client::StrataClient;
use crate::strata_api::config::StrataConfig;
use crate::strata_api::tokens::{StaticTokenPolicy, TokenStorage};
use crate::strata_api::types::{
    ApiError, AuthMode, AuthenticationData, LoginOptions, RefreshOptions, SessionStatus,
    StrataError, User, UserState,
};
use std::sync::Arc;

/// Auth session manager
///
/// Orchestrates login, refresh, and logout against the Strata API and keeps
/// the cached user profile in sync with the session. Every public operation
/// is fail soft: failures are logged and swallowed rather than surfaced to
/// the caller, so a broken silent refresh can never break page rendering.
/// The internal `try_*` counterparts propagate errors with `?`.
#[derive(Debug, Clone)]
pub struct Auth {
    ctx: Arc<AppContext>,
    config: Arc<StrataConfig>,
    client: StrataClient,
}

/// Log an API failure the way the session manager reports all of them:
/// structured error list when the API provided one, plain message otherwise.
pub(crate) fn log_failure(what: &str, err: &StrataError) {
    match err {
        StrataError::Api(ApiError::Http { errors, status, .. }) if !errors.is_empty() => {
            tracing::error!("{} (HTTP {}): {:?}", what, status, errors);
        }
        _ => tracing::error!("{}: {}", what, err),
    }
}

impl Auth {
    pub fn new(ctx: Arc<AppContext>, config: Arc<StrataConfig>) -> Self {
        let client = StrataClient::new(&config.base_url);
        Self {
            ctx,
            config,
            client,
        }
    }

    /// Token store accessor bound to the same context.
    pub fn tokens(&self) -> TokenStorage {
        TokenStorage::new(self.ctx.clone(), self.config.clone())
    }

    pub fn client(&self) -> &StrataClient {
        &self.client
    }

    /// Current session status; a context with no auth history is anonymous.
    pub fn status(&self) -> SessionStatus {
        self.ctx
            .state_get(&self.status_state_name())
            .unwrap_or(SessionStatus::Anonymous)
    }

    /// Cached user state for this context.
    pub fn user(&self) -> UserState {
        self.ctx
            .state_get(&self.config.auth.user_state_name)
            .unwrap_or(UserState::Unresolved)
    }

    fn status_state_name(&self) -> String {
        format!("{}.status", self.config.auth.state_name)
    }

    fn set_status(&self, status: SessionStatus) {
        self.ctx.state_set(&self.status_state_name(), Some(&status));
    }

    fn set_user(&self, user: &UserState) {
        self.ctx
            .state_set(&self.config.auth.user_state_name, Some(user));
    }

    /// Default transport mode: the SDK-managed cookie carries the refresh
    /// token under cookie transport, so the body must return it (`json`);
    /// otherwise the API manages the cookie itself (`cookie`).
    fn default_mode(&self) -> AuthMode {
        if self.config.auth.cookie_transport {
            AuthMode::Json
        } else {
            AuthMode::Cookie
        }
    }

    /// Exchange credentials for a session. Fail soft: on failure nothing is
    /// written to the store or the user cache and `None` is returned.
    pub async fn login(
        &self,
        identifier: &str,
        secret: &str,
        options: Option<LoginOptions>,
    ) -> Option<AuthenticationData> {
        match self.try_login(identifier, secret, options).await {
            Ok(data) => Some(data),
            Err(err) => {
                log_failure("Couldn't log in user", &err);
                self.set_status(SessionStatus::Anonymous);
                None
            }
        }
    }

    async fn try_login(
        &self,
        identifier: &str,
        secret: &str,
        options: Option<LoginOptions>,
    ) -> Result<AuthenticationData, StrataError> {
        self.set_status(SessionStatus::Authenticating);

        let options = options.unwrap_or_default();
        let mode = options.mode.unwrap_or_else(|| self.default_mode());

        let data = self
            .client
            .login(identifier, secret, mode, options.otp.as_deref())
            .await?;

        self.tokens().set(Some(&data));
        self.fetch_and_cache_user().await?;
        self.set_status(SessionStatus::Authenticated);

        tracing::info!("User session established");
        Ok(data)
    }

    /// Exchange an existing refresh token for a new pair. Safe to call with
    /// no token available: the failure is reported and nothing is mutated.
    pub async fn refresh(&self, options: Option<RefreshOptions>) -> Option<AuthenticationData> {
        match self.try_refresh(options).await {
            Ok(data) => Some(data),
            Err(err) => {
                log_failure("Couldn't refresh tokens", &err);
                self.set_status(SessionStatus::RefreshFailed);
                None
            }
        }
    }

    async fn try_refresh(
        &self,
        options: Option<RefreshOptions>,
    ) -> Result<AuthenticationData, StrataError> {
        self.set_status(SessionStatus::Authenticating);

        let options = options.unwrap_or_default();
        let mode = options.mode.unwrap_or_else(|| self.default_mode());

        // Explicit caller token first, then whatever the store/cookie holds.
        // When both are absent under cookie mode, the transport's own cookie
        // jar is expected to carry the token.
        let refresh_token = options.refresh_token.or_else(|| {
            self.tokens()
                .get(&StaticTokenPolicy::Never)
                .refresh_token
        });

        let data = self.client.refresh(refresh_token.as_deref(), mode).await?;

        self.tokens().set(Some(&data));
        self.fetch_and_cache_user().await?;
        self.set_status(SessionStatus::Authenticated);

        tracing::info!("User session refreshed");
        Ok(data)
    }

    async fn fetch_and_cache_user(&self) -> Result<User, StrataError> {
        // Static token forced off so the just-issued session token is used
        let token = self.tokens().get(&StaticTokenPolicy::Never).access_token;
        let user = self.client.read_me(token.as_deref()).await?;
        self.set_user(&UserState::Authenticated(user.clone()));
        Ok(user)
    }

    /// Fetch the current user's profile with the session token and cache it.
    pub async fn read_me(&self) -> Option<User> {
        match self.fetch_and_cache_user().await {
            Ok(user) => Some(user),
            Err(err) => {
                log_failure("Couldn't fetch current user", &err);
                None
            }
        }
    }

    /// Terminate the session and mark the cached user as signed out.
    ///
    /// The token store is intentionally not cleared here: the termination
    /// call itself may still need the current token, and the refresh cookie
    /// is invalidated server-side. When termination fails the user cache is
    /// left as-is.
    pub async fn logout(&self) {
        let refresh_token = self
            .tokens()
            .get(&StaticTokenPolicy::Never)
            .refresh_token;

        match self
            .client
            .logout(refresh_token.as_deref(), self.default_mode())
            .await
        {
            Ok(()) => {
                self.set_user(&UserState::Anonymous);
                self.set_status(SessionStatus::Anonymous);
                tracing::info!("User session terminated");
            }
            Err(err) => {
                log_failure("Couldn't log out user", &err);
            }
        }
    }

    /// Request a password-reset mail. Stateless pass-through, fail soft.
    pub async fn password_request(&self, email: &str, reset_url: Option<&str>) {
        let token = self.tokens().get(&StaticTokenPolicy::Prefer).access_token;
        if let Err(err) = self
            .client
            .password_request(email, reset_url, token.as_deref())
            .await
        {
            log_failure("Couldn't request password reset", &err);
        }
    }

    /// Complete a password reset. Stateless pass-through, fail soft.
    pub async fn password_reset(&self, reset_token: &str, password: &str) {
        let token = self.tokens().get(&StaticTokenPolicy::Prefer).access_token;
        if let Err(err) = self
            .client
            .password_reset(reset_token, password, token.as_deref())
            .await
        {
            log_failure("Couldn't reset password", &err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth(cookie_transport: bool) -> Auth {
        let mut config = StrataConfig::new("http://strata.test");
        config.auth.cookie_transport = cookie_transport;
        Auth::new(AppContext::server(None), Arc::new(config))
    }

    #[test]
    fn test_fresh_context_is_anonymous_and_unresolved() {
        let auth = auth(true);
        assert_eq!(auth.status(), SessionStatus::Anonymous);
        assert_eq!(auth.user(), UserState::Unresolved);
    }

    #[test]
    fn test_default_mode_follows_cookie_transport() {
        assert_eq!(auth(true).default_mode(), AuthMode::Json);
        assert_eq!(auth(false).default_mode(), AuthMode::Cookie);
    }

    #[test]
    fn test_caller_mode_overrides_computed_default() {
        let auth = auth(true);
        let options = LoginOptions {
            mode: Some(AuthMode::Cookie),
            otp: None,
        };
        assert_eq!(
            options.mode.unwrap_or_else(|| auth.default_mode()),
            AuthMode::Cookie
        );

        let options = LoginOptions::default();
        assert_eq!(
            options.mode.unwrap_or_else(|| auth.default_mode()),
            AuthMode::Json
        );
    }
}
