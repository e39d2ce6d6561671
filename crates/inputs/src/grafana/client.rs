//! Minimal Grafana HTTP API client
//!
//! Covers the read-only endpoints the input needs: current org,
//! datasources, dashboard search and dashboard by uri.

use gde_core::PluginError;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors from the Grafana API
#[derive(Debug, Error)]
pub enum GrafanaError {
    /// Transport or decode failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Credentials rejected
    #[error("authentication failed for {path}: {status}")]
    AuthFailed {
        /// Request path
        path: String,
        /// Response status
        status: StatusCode,
    },

    /// Any other non-success status
    #[error("{path} returned {status}")]
    Status {
        /// Request path
        path: String,
        /// Response status
        status: StatusCode,
    },
}

impl From<GrafanaError> for PluginError {
    fn from(err: GrafanaError) -> Self {
        PluginError::request(err)
    }
}

type Result<T> = std::result::Result<T, GrafanaError>;

/// How requests authenticate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Auth {
    /// No credentials
    None,
    /// `user:pass` basic auth
    Basic {
        /// User name
        user: String,
        /// Password
        password: String,
    },
    /// API key or service account token
    Bearer(String),
}

impl Auth {
    /// Parse the `authorization` setting
    ///
    /// `user:pass` selects basic auth; anything else is a bearer token,
    /// with an optional leading `Bearer `.
    pub fn parse(authorization: &str) -> Self {
        let value = authorization.trim();
        if value.is_empty() {
            return Self::None;
        }
        if let Some(token) = value.strip_prefix("Bearer ") {
            return Self::Bearer(token.trim().to_string());
        }
        match value.split_once(':') {
            Some((user, password)) => Self::Basic {
                user: user.to_string(),
                password: password.to_string(),
            },
            None => Self::Bearer(value.to_string()),
        }
    }
}

/// Current organization
#[derive(Debug, Clone, Deserialize)]
pub struct Org {
    /// Org id
    #[serde(default)]
    pub id: i64,
    /// Org name
    pub name: String,
}

/// One dashboard search result
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SearchHit {
    /// Dashboard id
    pub id: i64,
    /// Dashboard uid
    pub uid: String,
    /// Dashboard title
    pub title: String,
    /// Legacy `db/<slug>` uri
    pub uri: String,
    /// Hit type (`dash-db`, `dash-folder`)
    #[serde(rename = "type")]
    pub kind: String,
}

impl SearchHit {
    /// Path below `/api/dashboards/` that fetches this dashboard
    ///
    /// Prefers the legacy uri and falls back to `uid/<uid>`.
    pub fn dashboard_path(&self) -> String {
        if self.uri.is_empty() {
            format!("uid/{}", self.uid)
        } else {
            self.uri.clone()
        }
    }
}

/// Dashboard with its metadata, as served by `/api/dashboards/...`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DashboardDocument {
    /// Server-side metadata
    #[serde(default)]
    pub meta: serde_json::Value,
    /// Dashboard model
    #[serde(default)]
    pub dashboard: serde_json::Map<String, serde_json::Value>,
}

/// Model keys that identify a dashboard on one server only
const INSTANCE_KEYS: &[&str] = &["id", "uid", "version"];

impl DashboardDocument {
    /// Remove server-specific identifiers from the model
    pub fn strip_instance_keys(&mut self) {
        for key in INSTANCE_KEYS {
            self.dashboard.remove(*key);
        }
    }

    /// Dashboard title from the model
    pub fn title(&self) -> Option<&str> {
        self.dashboard.get("title").and_then(|v| v.as_str())
    }
}

/// Grafana API client
#[derive(Debug, Clone)]
pub struct GrafanaClient {
    http: reqwest::Client,
    base_url: String,
    auth: Auth,
}

impl GrafanaClient {
    /// Create a client for `base_url`
    pub fn new(http: reqwest::Client, base_url: &str, auth: Auth) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
        }
    }

    /// Build a GET request with auth
    fn build_request(&self, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "grafana request");

        let request = self.http.get(url).header(reqwest::header::ACCEPT, "application/json");
        match &self.auth {
            Auth::None => request,
            Auth::Basic { user, password } => request.basic_auth(user, Some(password)),
            Auth::Bearer(token) => request.bearer_auth(token),
        }
    }

    /// GET `path` and decode the JSON body
    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let response = self.build_request(path).query(query).send().await?;

        match response.status() {
            status if status.is_success() => Ok(response.json().await?),
            status @ (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => {
                Err(GrafanaError::AuthFailed {
                    path: path.to_string(),
                    status,
                })
            }
            status => Err(GrafanaError::Status {
                path: path.to_string(),
                status,
            }),
        }
    }

    /// The organization the credentials belong to
    pub async fn current_org(&self) -> Result<Org> {
        self.get_json("/api/org", &[]).await
    }

    /// All datasources, as raw JSON objects
    pub async fn datasources(&self) -> Result<Vec<serde_json::Value>> {
        self.get_json("/api/datasources", &[]).await
    }

    /// Search dashboards or folders
    pub async fn search(&self, kind: &str, query: &str) -> Result<Vec<SearchHit>> {
        self.get_json("/api/search", &[("type", kind), ("query", query)])
            .await
    }

    /// Fetch one dashboard by its [`SearchHit::dashboard_path`]
    pub async fn dashboard(&self, path: &str) -> Result<DashboardDocument> {
        self.get_json(&format!("/api/dashboards/{}", path), &[]).await
    }
}
