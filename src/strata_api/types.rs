use serde::{Deserialize, Serialize};
use std::fmt;

/// Strata SDK error type
///
/// Represents all possible errors that can occur when interacting with the
/// Strata API or performing related operations.
#[derive(Debug)]
pub enum StrataError {
    /// API request failed (network, HTTP, or response parsing error)
    Api(ApiError),
    /// Configuration error
    Config(String),
}

impl fmt::Display for StrataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrataError::Api(err) => write!(f, "API error: {}", err),
            StrataError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for StrataError {}

impl From<ApiError> for StrataError {
    fn from(err: ApiError) -> Self {
        StrataError::Api(err)
    }
}

/// API-specific errors
#[derive(Debug)]
pub enum ApiError {
    /// Network error (connection, timeout, etc.)
    Network(String),
    /// HTTP error with status code and the structured error list from the
    /// response body, when the API provided one
    Http {
        status: u16,
        message: String,
        errors: Vec<ErrorDetail>,
    },
    /// Failed to parse response
    Parse(String),
    /// Request building failed
    Request(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(msg) => write!(f, "Network error: {}", msg),
            ApiError::Http {
                status, message, ..
            } => {
                write!(f, "HTTP {} error: {}", status, message)
            }
            ApiError::Parse(msg) => write!(f, "Parse error: {}", msg),
            ApiError::Request(msg) => write!(f, "Request error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Network("Request timeout".to_string())
        } else if err.is_connect() {
            ApiError::Network(format!("Connection failed: {}", err))
        } else if let Some(status) = err.status() {
            ApiError::Http {
                status: status.as_u16(),
                message: err.to_string(),
                errors: Vec::new(),
            }
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// One entry of the API's structured error list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
}

/// Authentication data for a Strata session
///
/// `expires_at` is an absolute expiry (milliseconds since the epoch);
/// `expires` is the relative lifetime in milliseconds, used as the max-age
/// of the refresh-token cookie. The API returns both; the SDK trusts them
/// to describe the same instant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticationData {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_at: Option<i64>,
    pub expires: Option<i64>,
}

impl AuthenticationData {
    /// Check whether the access token has expired. An absent expiry counts
    /// as expired.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(at) => at <= chrono::Utc::now().timestamp_millis(),
            None => true,
        }
    }
}

/// Token transport mode for credential and refresh exchange
///
/// `Json` returns both tokens in the response body (the SDK then mirrors the
/// refresh token into its own cookie); `Cookie` has the API set an httpOnly
/// refresh cookie and only returns the access token in the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    Json,
    Cookie,
}

/// Caller-supplied options for `login`. Explicitly set fields win over the
/// defaults computed from configuration.
#[derive(Debug, Clone, Default)]
pub struct LoginOptions {
    pub mode: Option<AuthMode>,
    pub otp: Option<String>,
}

/// Caller-supplied options for `refresh`.
#[derive(Debug, Clone, Default)]
pub struct RefreshOptions {
    /// Explicit refresh token, e.g. read from an incoming request cookie
    /// during server rendering. When absent the token is resolved from the
    /// store/cookie, falling back to the transport's own cookie jar.
    pub refresh_token: Option<String>,
    pub mode: Option<AuthMode>,
}

/// Session status tracked by the auth session manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Anonymous,
    Authenticating,
    Authenticated,
    RefreshFailed,
}

/// Authenticated user profile (subset of `/users/me`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Cached user state
///
/// `Anonymous` is an explicit signed-out sentinel (set by `logout`), distinct
/// from `Unresolved` which means no fetch has happened yet on this context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "user", rename_all = "snake_case")]
pub enum UserState {
    Unresolved,
    Anonymous,
    Authenticated(User),
}

impl UserState {
    pub fn user(&self) -> Option<&User> {
        match self {
            UserState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, UserState::Authenticated(_))
    }
}

/// Response envelope used by the Strata API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

/// File resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrataFile {
    pub id: String,
    #[serde(default)]
    pub storage: Option<String>,
    #[serde(default)]
    pub filename_disk: Option<String>,
    #[serde(default)]
    pub filename_download: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(rename = "type", default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub folder: Option<String>,
    #[serde(default)]
    pub filesize: Option<i64>,
    #[serde(default)]
    pub width: Option<i64>,
    #[serde(default)]
    pub height: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub uploaded_on: Option<String>,
}

/// Query parameters accepted by the file read/write operations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilesQuery {
    pub fields: Option<Vec<String>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub search: Option<String>,
    pub filter: Option<serde_json::Value>,
}

impl FilesQuery {
    pub(crate) fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(fields) = &self.fields {
            pairs.push(("fields", fields.join(",")));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(offset) = self.offset {
            pairs.push(("offset", offset.to_string()));
        }
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        if let Some(filter) = &self.filter {
            pairs.push(("filter", filter.to_string()));
        }
        pairs
    }
}
