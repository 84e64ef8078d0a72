//! Upstream resource types and the collaborator error set.

use serde::{Deserialize, Serialize};

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by `ConsoleApi` operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The upstream answered 404 for a non-cluster resource.
    #[error("resource not found")]
    NotFound,

    /// The upstream answered 401.
    #[error("unauthorized")]
    Unauthorized,

    /// The requested cluster does not exist.
    #[error("cluster not found: {0}")]
    ClusterNotFound(String),

    /// The principal list had no entry flagged `me`.
    #[error("no principal marked as the current user")]
    NoCurrentPrincipal,

    /// The HTTP request itself failed.
    #[error("API request failed: {0}")]
    Request(String),

    /// Any other non-success status.
    #[error("API response error: status {status}")]
    Response { status: u16, body: String },

    /// The response body could not be deserialized.
    #[error("API response parse failed: {0}")]
    Parse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ApiError {
    /// Classify a non-success status.
    #[must_use]
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 => Self::Unauthorized,
            404 => Self::NotFound,
            _ => Self::Response { status, body },
        }
    }

    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound => "E_NOT_FOUND",
            Self::Unauthorized => "E_UNAUTHORIZED",
            Self::ClusterNotFound(_) => "E_CLUSTER_NOT_FOUND",
            Self::NoCurrentPrincipal => "E_NO_CURRENT_PRINCIPAL",
            Self::Request(_) => "E_API_REQUEST",
            Self::Response { .. } => "E_API_RESPONSE",
            Self::Parse(_) => "E_API_PARSE",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }
}

// =============================================================================
// AUTH HINT
// =============================================================================

/// Auth state the upstream reports out of band on API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthHint {
    /// `none`: auth is disabled upstream.
    Disabled,
    /// `true`: the caller holds a valid session.
    LoggedIn,
    /// `false`: auth is enabled and the caller is anonymous.
    LoggedOut,
}

impl AuthHint {
    /// Parse a raw hint. Unrecognized values yield `None`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "none" => Some(Self::Disabled),
            "true" => Some(Self::LoggedIn),
            "false" => Some(Self::LoggedOut),
            _ => None,
        }
    }
}

// =============================================================================
// RESOURCES
// =============================================================================

/// A server setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setting {
    pub id: String,
    pub value: String,
    #[serde(default)]
    pub default: String,
}

impl Setting {
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.value == self.default
    }
}

/// Settings collection plus the auth hint that came with it, if any.
#[derive(Debug, Clone, Default)]
pub struct SettingsPage {
    pub settings: Vec<Setting>,
    pub auth_hint: Option<String>,
}

impl SettingsPage {
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Setting> {
        self.settings.iter().find(|s| s.id == id)
    }
}

/// Outcome of a local-provider login.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalLogin {
    pub status: u16,
    /// Raw `Set-Cookie` values the upstream issued with the response.
    pub set_cookies: Vec<String>,
}

impl LocalLogin {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.status == 200
    }
}

/// An identity record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub id: String,
    pub me: bool,
    pub name: Option<String>,
}

/// Cluster row from the management cluster list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterSummary {
    pub id: String,
    pub display_name: String,
    pub ready: bool,
}

/// Management-scoped data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManagementData {
    pub clusters: Vec<ClusterSummary>,
}

impl ManagementData {
    /// Preferred cluster when it is ready, otherwise the first ready cluster
    /// ordered by display name.
    #[must_use]
    pub fn default_cluster_id(&self, preferred: Option<&str>) -> Option<String> {
        let mut ready: Vec<&ClusterSummary> = self.clusters.iter().filter(|c| c.ready).collect();
        if let Some(preferred) = preferred {
            if ready.iter().any(|c| c.id == preferred) {
                return Some(preferred.to_owned());
            }
        }
        ready.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        ready.first().map(|c| c.id.clone())
    }
}

/// A namespace inside a cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    pub name: String,
    pub project_id: Option<String>,
}

/// Cluster-scoped data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterData {
    pub id: String,
    pub namespaces: Vec<Namespace>,
}

impl ClusterData {
    /// Whether any namespace belongs to a project.
    #[must_use]
    pub fn has_projects(&self) -> bool {
        self.namespaces.iter().any(|ns| ns.project_id.is_some())
    }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
