use crate::strata_api::types::{
    ApiError, AuthMode, AuthenticationData, DataEnvelope, ErrorDetail, FilesQuery, StrataError,
    StrataFile, User,
};
use reqwest::header::SET_COOKIE;
use serde::{Deserialize, Serialize};

/// HTTP client for the Strata API
///
/// Thin typed wrappers over the auth, user, and file endpoints. All methods
/// return `Result`; the fail-soft policy lives one layer up, in the auth
/// session manager and the file wrappers. The underlying transport keeps a
/// cookie store so that API-managed session cookies are carried
/// automatically in browser-like contexts.
#[derive(Debug, Clone)]
pub struct StrataClient {
    /// Base URL for the Strata API
    base_url: String,
    /// HTTP client for making requests
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
    mode: AuthMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    otp: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_token: Option<&'a str>,
    mode: AuthMode,
}

#[derive(Debug, Serialize)]
struct PasswordRequestBody<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reset_url: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct PasswordResetBody<'a> {
    token: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct UpdateFilesRequest<'a> {
    keys: &'a [String],
    data: &'a serde_json::Value,
}

#[derive(Debug, Serialize)]
struct ImportFileRequest<'a> {
    url: &'a str,
    data: &'a serde_json::Value,
}

/// The file endpoints return a single object or an array depending on how
/// many files the operation touched.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> From<OneOrMany<T>> for Vec<T> {
    fn from(value: OneOrMany<T>) -> Self {
        match value {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    errors: Vec<RawError>,
}

#[derive(Debug, Deserialize)]
struct RawError {
    message: String,
    #[serde(default)]
    extensions: Option<RawErrorExtensions>,
}

#[derive(Debug, Deserialize)]
struct RawErrorExtensions {
    #[serde(default)]
    code: Option<String>,
}

fn parse_error_details(body: &str) -> Vec<ErrorDetail> {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| {
            envelope
                .errors
                .into_iter()
                .map(|e| ErrorDetail {
                    message: e.message,
                    code: e.extensions.and_then(|x| x.code),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn authorize(request: reqwest::RequestBuilder, token: Option<&str>) -> reqwest::RequestBuilder {
    match token {
        Some(token) => request.header("Authorization", format!("Bearer {}", token)),
        None => request,
    }
}

impl StrataClient {
    /// Create a new Strata API client
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        tracing::debug!("Creating StrataClient with base URL: {}", base_url);

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(
                    "Failed to build HTTP client with cookie store ({}), using defaults",
                    e
                );
                reqwest::Client::new()
            });

        Self { base_url, client }
    }

    /// Get the base URL for this client
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn check_status(
        response: reqwest::Response,
        what: &str,
    ) -> Result<reqwest::Response, StrataError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        tracing::error!("{} failed: HTTP {} - {}", what, status.as_u16(), error_body);

        Err(StrataError::Api(ApiError::Http {
            status: status.as_u16(),
            errors: parse_error_details(&error_body),
            message: error_body,
        }))
    }

    async fn parse_data<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        what: &str,
    ) -> Result<T, StrataError> {
        let envelope: DataEnvelope<T> = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse {} response: {}", what, e);
            StrataError::Api(ApiError::Parse(format!("Failed to parse response: {}", e)))
        })?;
        Ok(envelope.data)
    }

    /// Exchange credentials for a token pair
    ///
    /// With `AuthMode::Json` the response body carries both tokens; with
    /// `AuthMode::Cookie` the refresh token is set via a response cookie and
    /// only the access token appears in the body.
    pub async fn login(
        &self,
        identifier: &str,
        secret: &str,
        mode: AuthMode,
        otp: Option<&str>,
    ) -> Result<AuthenticationData, StrataError> {
        let url = format!("{}/auth/login", self.base_url);
        tracing::debug!("Sending login request to: {}", url);

        let payload = LoginRequest {
            email: identifier,
            password: secret,
            mode,
            otp,
        };

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send login request: {}", e);
                StrataError::Api(ApiError::from(e))
            })?;

        let response = Self::check_status(response, "Login").await?;
        Self::parse_data(response, "login").await
    }

    /// Exchange a refresh token for a new token pair
    ///
    /// When `refresh_token` is `None` under `AuthMode::Cookie`, the refresh
    /// token is expected to travel in the transport's cookie jar.
    pub async fn refresh(
        &self,
        refresh_token: Option<&str>,
        mode: AuthMode,
    ) -> Result<AuthenticationData, StrataError> {
        let url = format!("{}/auth/refresh", self.base_url);
        tracing::debug!("Sending refresh request to: {}", url);

        let payload = RefreshRequest {
            refresh_token,
            mode,
        };

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| StrataError::Api(ApiError::from(e)))?;

        let response = Self::check_status(response, "Refresh").await?;
        Self::parse_data(response, "refresh").await
    }

    /// Refresh a session on behalf of an incoming request by forwarding its
    /// raw `Cookie` header
    ///
    /// Used during server rendering when the in-process transport has no
    /// cookie jar for the visitor yet. Returns the token data together with
    /// every `set-cookie` response header verbatim, so rotated cookies can be
    /// re-emitted on the outgoing response.
    pub async fn refresh_with_cookie_header(
        &self,
        cookie_header: &str,
    ) -> Result<(AuthenticationData, Vec<String>), StrataError> {
        let url = format!("{}/auth/refresh", self.base_url);
        tracing::debug!("Forwarding cookie refresh to: {}", url);

        let payload = RefreshRequest {
            refresh_token: None,
            mode: AuthMode::Cookie,
        };

        let response = self
            .client
            .post(&url)
            .header("Cookie", cookie_header)
            .json(&payload)
            .send()
            .await
            .map_err(|e| StrataError::Api(ApiError::from(e)))?;

        let response = Self::check_status(response, "Cookie refresh").await?;

        let set_cookies: Vec<String> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok().map(str::to_string))
            .collect();

        let data = Self::parse_data(response, "refresh").await?;
        Ok((data, set_cookies))
    }

    /// Terminate the current session
    pub async fn logout(
        &self,
        refresh_token: Option<&str>,
        mode: AuthMode,
    ) -> Result<(), StrataError> {
        let url = format!("{}/auth/logout", self.base_url);
        tracing::debug!("Sending logout request to: {}", url);

        let payload = RefreshRequest {
            refresh_token,
            mode,
        };

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| StrataError::Api(ApiError::from(e)))?;

        Self::check_status(response, "Logout").await?;
        Ok(())
    }

    /// Fetch the profile of the user the bearer token belongs to
    pub async fn read_me(&self, token: Option<&str>) -> Result<User, StrataError> {
        let url = format!("{}/users/me", self.base_url);

        let response = authorize(self.client.get(&url), token)
            .send()
            .await
            .map_err(|e| StrataError::Api(ApiError::from(e)))?;

        let response = Self::check_status(response, "Read current user").await?;
        Self::parse_data(response, "current user").await
    }

    /// Request a password-reset mail for the given address
    pub async fn password_request(
        &self,
        email: &str,
        reset_url: Option<&str>,
        token: Option<&str>,
    ) -> Result<(), StrataError> {
        let url = format!("{}/auth/password/request", self.base_url);

        let payload = PasswordRequestBody { email, reset_url };

        let response = authorize(self.client.post(&url), token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| StrataError::Api(ApiError::from(e)))?;

        Self::check_status(response, "Password reset request").await?;
        Ok(())
    }

    /// Complete a password reset with the token from the reset mail
    pub async fn password_reset(
        &self,
        reset_token: &str,
        password: &str,
        token: Option<&str>,
    ) -> Result<(), StrataError> {
        let url = format!("{}/auth/password/reset", self.base_url);

        let payload = PasswordResetBody {
            token: reset_token,
            password,
        };

        let response = authorize(self.client.post(&url), token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| StrataError::Api(ApiError::from(e)))?;

        Self::check_status(response, "Password reset").await?;
        Ok(())
    }

    /// Upload one or more files as multipart form data
    pub async fn upload_files(
        &self,
        token: Option<&str>,
        form: reqwest::multipart::Form,
        query: Option<&FilesQuery>,
    ) -> Result<Vec<StrataFile>, StrataError> {
        let url = format!("{}/files", self.base_url);

        let mut request = authorize(self.client.post(&url), token).multipart(form);
        if let Some(query) = query {
            request = request.query(&query.to_pairs());
        }

        let response = request
            .send()
            .await
            .map_err(|e| StrataError::Api(ApiError::from(e)))?;

        let response = Self::check_status(response, "Upload files").await?;
        let data: OneOrMany<StrataFile> = Self::parse_data(response, "upload files").await?;
        Ok(data.into())
    }

    /// Import a file from a remote URL
    pub async fn import_file(
        &self,
        token: Option<&str>,
        file_url: &str,
        data: &serde_json::Value,
        query: Option<&FilesQuery>,
    ) -> Result<StrataFile, StrataError> {
        let url = format!("{}/files/import", self.base_url);

        let payload = ImportFileRequest {
            url: file_url,
            data,
        };

        let mut request = authorize(self.client.post(&url), token).json(&payload);
        if let Some(query) = query {
            request = request.query(&query.to_pairs());
        }

        let response = request
            .send()
            .await
            .map_err(|e| StrataError::Api(ApiError::from(e)))?;

        let response = Self::check_status(response, "Import file").await?;
        Self::parse_data(response, "import file").await
    }

    /// Read a single file by id
    pub async fn read_file(
        &self,
        token: Option<&str>,
        id: &str,
        query: Option<&FilesQuery>,
    ) -> Result<StrataFile, StrataError> {
        let url = format!("{}/files/{}", self.base_url, id);

        let mut request = authorize(self.client.get(&url), token);
        if let Some(query) = query {
            request = request.query(&query.to_pairs());
        }

        let response = request
            .send()
            .await
            .map_err(|e| StrataError::Api(ApiError::from(e)))?;

        let response = Self::check_status(response, "Read file").await?;
        Self::parse_data(response, "file").await
    }

    /// List files
    pub async fn read_files(
        &self,
        token: Option<&str>,
        query: Option<&FilesQuery>,
    ) -> Result<Vec<StrataFile>, StrataError> {
        let url = format!("{}/files", self.base_url);

        let mut request = authorize(self.client.get(&url), token);
        if let Some(query) = query {
            request = request.query(&query.to_pairs());
        }

        let response = request
            .send()
            .await
            .map_err(|e| StrataError::Api(ApiError::from(e)))?;

        let response = Self::check_status(response, "Read files").await?;
        Self::parse_data(response, "files").await
    }

    /// Update a single file's metadata
    pub async fn update_file(
        &self,
        token: Option<&str>,
        id: &str,
        data: &serde_json::Value,
        query: Option<&FilesQuery>,
    ) -> Result<StrataFile, StrataError> {
        let url = format!("{}/files/{}", self.base_url, id);

        let mut request = authorize(self.client.patch(&url), token).json(data);
        if let Some(query) = query {
            request = request.query(&query.to_pairs());
        }

        let response = request
            .send()
            .await
            .map_err(|e| StrataError::Api(ApiError::from(e)))?;

        let response = Self::check_status(response, "Update file").await?;
        Self::parse_data(response, "file").await
    }

    /// Apply the same metadata update to multiple files
    pub async fn update_files(
        &self,
        token: Option<&str>,
        ids: &[String],
        data: &serde_json::Value,
        query: Option<&FilesQuery>,
    ) -> Result<Vec<StrataFile>, StrataError> {
        let url = format!("{}/files", self.base_url);

        let payload = UpdateFilesRequest { keys: ids, data };

        let mut request = authorize(self.client.patch(&url), token).json(&payload);
        if let Some(query) = query {
            request = request.query(&query.to_pairs());
        }

        let response = request
            .send()
            .await
            .map_err(|e| StrataError::Api(ApiError::from(e)))?;

        let response = Self::check_status(response, "Update files").await?;
        let data: OneOrMany<StrataFile> = Self::parse_data(response, "files").await?;
        Ok(data.into())
    }

    /// Delete a single file
    pub async fn delete_file(&self, token: Option<&str>, id: &str) -> Result<(), StrataError> {
        let url = format!("{}/files/{}", self.base_url, id);

        let response = authorize(self.client.delete(&url), token)
            .send()
            .await
            .map_err(|e| StrataError::Api(ApiError::from(e)))?;

        Self::check_status(response, "Delete file").await?;
        Ok(())
    }

    /// Delete multiple files
    pub async fn delete_files(&self, token: Option<&str>, ids: &[String]) -> Result<(), StrataError> {
        let url = format!("{}/files", self.base_url);

        let response = authorize(self.client.delete(&url), token)
            .json(&ids)
            .send()
            .await
            .map_err(|e| StrataError::Api(ApiError::from(e)))?;

        Self::check_status(response, "Delete files").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = StrataClient::new("http://example.com");
        assert_eq!(client.base_url(), "http://example.com");
    }

    #[test]
    fn test_login_request_serialization() {
        let request = LoginRequest {
            email: "admin@example.com",
            password: "hunter2",
            mode: AuthMode::Json,
            otp: None,
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"email\":\"admin@example.com\""));
        assert!(json.contains("\"mode\":\"json\""));
        assert!(!json.contains("otp"));
    }

    #[test]
    fn test_refresh_request_omits_absent_token() {
        let request = RefreshRequest {
            refresh_token: None,
            mode: AuthMode::Cookie,
        };

        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(json, "{\"mode\":\"cookie\"}");

        let request = RefreshRequest {
            refresh_token: Some("rt123"),
            mode: AuthMode::Json,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"refresh_token\":\"rt123\""));
    }

    #[test]
    fn test_parse_error_details() {
        let body = r#"{"errors":[{"message":"Invalid user credentials.","extensions":{"code":"INVALID_CREDENTIALS"}}]}"#;
        let details = parse_error_details(body);
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].message, "Invalid user credentials.");
        assert_eq!(details[0].code, Some("INVALID_CREDENTIALS".to_string()));

        assert!(parse_error_details("not json").is_empty());
        assert!(parse_error_details("{}").is_empty());
    }

    #[test]
    fn test_one_or_many_deserialization() {
        let one: OneOrMany<StrataFile> =
            serde_json::from_str(r#"{"id":"f1"}"#).unwrap();
        let many: OneOrMany<StrataFile> =
            serde_json::from_str(r#"[{"id":"f1"},{"id":"f2"}]"#).unwrap();

        let one: Vec<StrataFile> = one.into();
        let many: Vec<StrataFile> = many.into();
        assert_eq!(one.len(), 1);
        assert_eq!(many.len(), 2);
        assert_eq!(many[1].id, "f2");
    }
}
