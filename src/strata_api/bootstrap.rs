use crate::context::{AppContext, ExecutionMode};
use crate::strata_api::auth::Auth;
use crate::strata_api::config::StrataConfig;
use crate::strata_api::tokens::StaticTokenPolicy;
use crate::strata_api::types::RefreshOptions;
use std::sync::Arc;

/// Outcome of the route-admission guard for one navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    Redirect {
        to: String,
        /// Also abort the in-flight navigation; set on the client after
        /// hydration so protected content never flashes before the redirect
        /// completes.
        abort_navigation: bool,
    },
}

/// Startup refresh hook and route-admission guard
///
/// Runs once per execution context: during server rendering it tries to
/// silently restore a session from the incoming request's refresh cookie;
/// on the client it defers a refresh attempt until after the application has
/// mounted, unless the session already survived hydration. All restore
/// failures are swallowed — an expired cookie must never break rendering.
/// [`route_guard`](Self::route_guard) must only be consulted after
/// [`run`](Self::run) completed on the same context.
#[derive(Debug, Clone)]
pub struct AutoRefresh {
    ctx: Arc<AppContext>,
    config: Arc<StrataConfig>,
    auth: Auth,
}

impl AutoRefresh {
    pub fn new(ctx: Arc<AppContext>, config: Arc<StrataConfig>) -> Self {
        let auth = Auth::new(ctx.clone(), config.clone());
        Self { ctx, config, auth }
    }

    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    /// Attempt the silent session restore for this context.
    pub async fn run(&self) {
        match self.ctx.mode() {
            ExecutionMode::Server => self.run_server().await,
            ExecutionMode::Client => self.run_client(),
        }
    }

    async fn run_server(&self) {
        if self.config.auth.cookie_transport {
            // The refresh token lives in an SDK-managed cookie we can read
            let refresh_token = self
                .ctx
                .cookies()
                .get(&self.config.auth.refresh_cookie_name);

            if let Some(refresh_token) = refresh_token {
                self.auth
                    .refresh(Some(RefreshOptions {
                        refresh_token: Some(refresh_token),
                        mode: None,
                    }))
                    .await;
            }
            return;
        }

        // The refresh token lives in an httpOnly cookie only the API can
        // read, so the visitor's raw Cookie header is forwarded over a fresh
        // outbound call and any rotated cookies are re-emitted verbatim on
        // the outgoing response.
        let Some(cookie_header) = self.ctx.raw_cookie_header() else {
            return;
        };

        match self
            .auth
            .client()
            .refresh_with_cookie_header(cookie_header)
            .await
        {
            Ok((data, set_cookies)) => {
                self.auth.tokens().set(Some(&data));
                for cookie in &set_cookies {
                    self.ctx.append_response_header("set-cookie", cookie);
                }
                self.auth.read_me().await;
            }
            Err(err) => {
                tracing::debug!("Silent session restore failed: {}", err);
            }
        }
    }

    fn run_client(&self) {
        let tokens = self.auth.tokens().get(&StaticTokenPolicy::Never);
        let survived_hydration =
            tokens.access_token.is_some() && self.auth.user().is_authenticated();

        if !survived_hydration {
            // Refreshing now would race the hydration pass; do it post-mount
            self.ctx.schedule_mount_refresh();
        }
    }

    /// Host hook, called once the client application has fully mounted.
    /// Performs the deferred refresh scheduled by [`run`](Self::run), if any,
    /// and ends the hydrating phase.
    pub async fn app_mounted(&self) {
        let pending = self.ctx.take_mount_refresh();
        self.ctx.finish_hydration();
        if pending {
            self.auth.refresh(None).await;
        }
    }

    /// Decide whether a navigation to `to` is admitted.
    pub fn route_guard(&self, to: &str) -> RouteDecision {
        if !self.config.auto_refresh.enable_middleware {
            return RouteDecision::Allow;
        }

        let auto_refresh = &self.config.auto_refresh;
        let restricted =
            auto_refresh.to.is_empty() || auto_refresh.to.iter().any(|path| path == to);

        if !self.auth.user().is_authenticated()
            && to != auto_refresh.redirect_to
            && restricted
        {
            let abort_navigation =
                self.ctx.mode() == ExecutionMode::Client && !self.ctx.is_hydrating();
            return RouteDecision::Redirect {
                to: auto_refresh.redirect_to.clone(),
                abort_navigation,
            };
        }

        RouteDecision::Allow
    }
}
