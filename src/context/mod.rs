//! Execution-context scoped state.
//!
//! Every execution context — one per server-rendered request, one per browser
//! session — gets its own [`AppContext`]. Session state (tokens, cached user)
//! lives in a string-keyed JSON map on the context, never in a process
//! global, so concurrent server renders cannot leak sessions into each other.
//! State is serialized through serde so values written during server
//! rendering can be revived on the client (`client_with_state`).

pub mod cookies;

pub use cookies::{CookieAttributes, CookieJar, SameSite};

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Where this context is executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Server-side rendering of a single incoming request.
    Server,
    /// A browser session.
    Client,
}

/// State container for one execution context.
#[derive(Debug)]
pub struct AppContext {
    mode: ExecutionMode,
    states: RwLock<HashMap<String, serde_json::Value>>,
    cookies: CookieJar,
    raw_cookie_header: Option<String>,
    response_headers: RwLock<Vec<(String, String)>>,
    hydrating: AtomicBool,
    pending_mount_refresh: AtomicBool,
}

impl AppContext {
    /// Context for server-side rendering of one request. The raw `Cookie`
    /// header is parsed into the jar and retained verbatim for forwarding.
    pub fn server(cookie_header: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            mode: ExecutionMode::Server,
            states: RwLock::new(HashMap::new()),
            cookies: cookie_header.map(CookieJar::from_header).unwrap_or_default(),
            raw_cookie_header: cookie_header.map(str::to_string),
            response_headers: RwLock::new(Vec::new()),
            hydrating: AtomicBool::new(false),
            pending_mount_refresh: AtomicBool::new(false),
        })
    }

    /// Fresh client context with no revived state.
    pub fn client() -> Arc<Self> {
        Self::client_with_state(HashMap::new())
    }

    /// Client context revived from a server-rendered state payload.
    pub fn client_with_state(states: HashMap<String, serde_json::Value>) -> Arc<Self> {
        Arc::new(Self {
            mode: ExecutionMode::Client,
            states: RwLock::new(states),
            cookies: CookieJar::new(),
            raw_cookie_header: None,
            response_headers: RwLock::new(Vec::new()),
            hydrating: AtomicBool::new(true),
            pending_mount_refresh: AtomicBool::new(false),
        })
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn cookies(&self) -> &CookieJar {
        &self.cookies
    }

    /// The unparsed `Cookie` header of the incoming request, if any.
    pub fn raw_cookie_header(&self) -> Option<&str> {
        self.raw_cookie_header.as_deref()
    }

    /// Read a named state entry, deserializing it into `T`. Absent or
    /// incompatible entries resolve to `None`.
    pub fn state_get<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let states = self.states.read().unwrap_or_else(PoisonError::into_inner);
        let value = states.get(name)?;
        serde_json::from_value(value.clone()).ok()
    }

    /// Write or remove a named state entry.
    pub fn state_set<T: Serialize>(&self, name: &str, value: Option<&T>) {
        let mut states = self.states.write().unwrap_or_else(PoisonError::into_inner);
        match value {
            Some(value) => match serde_json::to_value(value) {
                Ok(json) => {
                    states.insert(name.to_string(), json);
                }
                Err(e) => {
                    tracing::warn!("failed to serialize state '{}': {}", name, e);
                }
            },
            None => {
                states.remove(name);
            }
        }
    }

    /// Append a header to the outgoing server response.
    pub fn append_response_header(&self, name: &str, value: &str) {
        self.response_headers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((name.to_string(), value.to_string()));
    }

    /// Headers queued for the outgoing server response.
    pub fn response_headers(&self) -> Vec<(String, String)> {
        self.response_headers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether the client context is still replaying the server-rendered
    /// markup. Always false on the server.
    pub fn is_hydrating(&self) -> bool {
        self.hydrating.load(Ordering::Relaxed)
    }

    pub fn finish_hydration(&self) {
        self.hydrating.store(false, Ordering::Relaxed);
    }

    pub(crate) fn schedule_mount_refresh(&self) {
        self.pending_mount_refresh.store(true, Ordering::Relaxed);
    }

    /// Consume the deferred-refresh flag. Returns true at most once per
    /// scheduling, so only a single post-mount refresh attempt runs.
    pub(crate) fn take_mount_refresh(&self) -> bool {
        self.pending_mount_refresh.swap(false, Ordering::Relaxed)
    }
}
