use crate::context::AppContext;
use crate::strata_api::auth::log_failure;
use crate::strata_api::client::StrataClient;
use crate::strata_api::config::StrataConfig;
use crate::strata_api::tokens::{StaticTokenPolicy, TokenStorage};
use crate::strata_api::types::{FilesQuery, StrataFile};
use std::sync::Arc;

/// Per-call parameters for the file operations.
#[derive(Debug, Clone, Default)]
pub struct FilesParams {
    /// Overrides the wrapper's default static-token policy for this call
    pub use_static_token: Option<StaticTokenPolicy>,
    pub query: Option<FilesQuery>,
}

/// File operation wrappers
///
/// Fail-soft forwarding to the client's file endpoints: the effective bearer
/// token is resolved through the token store (per-call policy override wins
/// over the constructor default), failures are logged and `None` is
/// returned, and no session state is mutated.
#[derive(Debug, Clone)]
pub struct Files {
    ctx: Arc<AppContext>,
    config: Arc<StrataConfig>,
    client: StrataClient,
    default_policy: StaticTokenPolicy,
}

impl Files {
    pub fn new(ctx: Arc<AppContext>, config: Arc<StrataConfig>) -> Self {
        Self::with_policy(ctx, config, StaticTokenPolicy::Prefer)
    }

    pub fn with_policy(
        ctx: Arc<AppContext>,
        config: Arc<StrataConfig>,
        default_policy: StaticTokenPolicy,
    ) -> Self {
        let client = StrataClient::new(&config.base_url);
        Self {
            ctx,
            config,
            client,
            default_policy,
        }
    }

    fn bearer(&self, params: Option<&FilesParams>) -> Option<String> {
        let policy = params
            .and_then(|p| p.use_static_token.as_ref())
            .unwrap_or(&self.default_policy);
        TokenStorage::new(self.ctx.clone(), self.config.clone())
            .get(policy)
            .access_token
    }

    fn query(params: Option<&FilesParams>) -> Option<&FilesQuery> {
        params.and_then(|p| p.query.as_ref())
    }

    pub async fn upload_files(
        &self,
        form: reqwest::multipart::Form,
        params: Option<FilesParams>,
    ) -> Option<Vec<StrataFile>> {
        let params = params.as_ref();
        match self
            .client
            .upload_files(self.bearer(params).as_deref(), form, Self::query(params))
            .await
        {
            Ok(files) => Some(files),
            Err(err) => {
                log_failure("Couldn't upload files", &err);
                None
            }
        }
    }

    pub async fn import_file(
        &self,
        url: &str,
        data: &serde_json::Value,
        params: Option<FilesParams>,
    ) -> Option<StrataFile> {
        let params = params.as_ref();
        match self
            .client
            .import_file(self.bearer(params).as_deref(), url, data, Self::query(params))
            .await
        {
            Ok(file) => Some(file),
            Err(err) => {
                log_failure("Couldn't import file", &err);
                None
            }
        }
    }

    pub async fn read_file(&self, id: &str, params: Option<FilesParams>) -> Option<StrataFile> {
        let params = params.as_ref();
        match self
            .client
            .read_file(self.bearer(params).as_deref(), id, Self::query(params))
            .await
        {
            Ok(file) => Some(file),
            Err(err) => {
                log_failure("Couldn't read file", &err);
                None
            }
        }
    }

    pub async fn read_files(&self, params: Option<FilesParams>) -> Option<Vec<StrataFile>> {
        let params = params.as_ref();
        match self
            .client
            .read_files(self.bearer(params).as_deref(), Self::query(params))
            .await
        {
            Ok(files) => Some(files),
            Err(err) => {
                log_failure("Couldn't read files", &err);
                None
            }
        }
    }

    pub async fn update_file(
        &self,
        id: &str,
        data: &serde_json::Value,
        params: Option<FilesParams>,
    ) -> Option<StrataFile> {
        let params = params.as_ref();
        match self
            .client
            .update_file(self.bearer(params).as_deref(), id, data, Self::query(params))
            .await
        {
            Ok(file) => Some(file),
            Err(err) => {
                log_failure("Couldn't update file", &err);
                None
            }
        }
    }

    pub async fn update_files(
        &self,
        ids: &[String],
        data: &serde_json::Value,
        params: Option<FilesParams>,
    ) -> Option<Vec<StrataFile>> {
        let params = params.as_ref();
        match self
            .client
            .update_files(self.bearer(params).as_deref(), ids, data, Self::query(params))
            .await
        {
            Ok(files) => Some(files),
            Err(err) => {
                log_failure("Couldn't update files", &err);
                None
            }
        }
    }

    pub async fn delete_file(&self, id: &str, params: Option<FilesParams>) -> Option<()> {
        let params = params.as_ref();
        match self
            .client
            .delete_file(self.bearer(params).as_deref(), id)
            .await
        {
            Ok(()) => Some(()),
            Err(err) => {
                log_failure("Couldn't delete file", &err);
                None
            }
        }
    }

    pub async fn delete_files(&self, ids: &[String], params: Option<FilesParams>) -> Option<()> {
        let params = params.as_ref();
        match self
            .client
            .delete_files(self.bearer(params).as_deref(), ids)
            .await
        {
            Ok(()) => Some(()),
            Err(err) => {
                log_failure("Couldn't delete files", &err);
                None
            }
        }
    }
}
