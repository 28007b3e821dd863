use crate::context::{AppContext, CookieAttributes};
use crate::strata_api::config::StrataConfig;
use crate::strata_api::types::AuthenticationData;
use std::sync::Arc;

/// Per-call selector for the configured static token.
///
/// `Prefer` (the default) falls back to the static token only when no
/// session token is stored. `Always` bypasses the session unconditionally.
/// `Never` forces the session token even when the store is empty, so a
/// caller can reach public resources without spending the privileged static
/// token. `Literal` behaves like `Prefer` but substitutes the given token
/// for the configured one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StaticTokenPolicy {
    #[default]
    Prefer,
    Always,
    Never,
    Literal(String),
}

/// Token store accessor bound to one execution context.
///
/// Reads and writes the authentication data held in the context state under
/// the configured state name. Under cookie transport the refresh token is
/// additionally mirrored into the configured cookie; the cookie, not the
/// in-memory copy, is the source of truth for that field.
#[derive(Debug, Clone)]
pub struct TokenStorage {
    ctx: Arc<AppContext>,
    config: Arc<StrataConfig>,
}

impl TokenStorage {
    pub fn new(ctx: Arc<AppContext>, config: Arc<StrataConfig>) -> Self {
        Self { ctx, config }
    }

    /// The raw stored value, without static-token or cookie resolution.
    pub fn stored(&self) -> Option<AuthenticationData> {
        self.ctx.state_get(&self.config.auth.state_name)
    }

    /// Compute the effective authentication data for an outgoing request.
    ///
    /// Returns a synthetic static-token record when the policy is `Always`,
    /// or when it is not `Never` and the store holds no access token.
    /// Otherwise returns the live store value, with the refresh token read
    /// from the cookie under cookie transport. Never fails; absent values
    /// resolve to `None`.
    pub fn get(&self, policy: &StaticTokenPolicy) -> AuthenticationData {
        let stored = self.stored();
        let has_session = stored
            .as_ref()
            .and_then(|data| data.access_token.as_ref())
            .is_some();

        let use_static = matches!(policy, StaticTokenPolicy::Always)
            || (!matches!(policy, StaticTokenPolicy::Never) && !has_session);

        if use_static {
            let access_token = match policy {
                StaticTokenPolicy::Literal(token) => Some(token.clone()),
                _ => self.config.static_token.clone(),
            };
            return AuthenticationData {
                access_token,
                ..Default::default()
            };
        }

        let mut data = stored.unwrap_or_default();
        if self.config.auth.cookie_transport {
            data.refresh_token = self
                .ctx
                .cookies()
                .get(&self.config.auth.refresh_cookie_name);
        }
        data
    }

    /// Overwrite the store. Under cookie transport the refresh token is
    /// written to (or cleared from) the cookie in the same operation, with
    /// the cookie max-age taken from `expires`.
    pub fn set(&self, value: Option<&AuthenticationData>) {
        self.ctx.state_set(&self.config.auth.state_name, value);

        if self.config.auth.cookie_transport {
            let name = &self.config.auth.refresh_cookie_name;
            match value.and_then(|data| data.refresh_token.as_deref()) {
                Some(refresh_token) => {
                    let attributes = self.cookie_attributes(value.and_then(|data| data.expires));
                    self.ctx.cookies().set(name, refresh_token, &attributes);
                }
                None => {
                    self.ctx.cookies().clear(name, &self.cookie_attributes(None));
                }
            }
        }
    }

    fn cookie_attributes(&self, max_age_ms: Option<i64>) -> CookieAttributes {
        CookieAttributes {
            max_age_ms,
            http_only: self.config.auth.cookie_http_only,
            same_site: self.config.auth.cookie_same_site,
            secure: self.config.auth.cookie_secure,
        }
    }
}
