//! Collaborator layer — everything the gate needs from the upstream API.
//!
//! DESIGN
//! ======
//! The gate and the settings helpers talk to `ConsoleApi`, never to HTTP
//! directly. Failures come back as a closed set of `ApiError` variants so
//! callers pattern-match on meaning (`NotFound`, `Unauthorized`,
//! `ClusterNotFound`) instead of inspecting status codes.
//!
//! `ApiConnector` binds a `ConsoleApi` to one visitor's credentials; the
//! production connector is [`rancher::RancherClient`].

pub mod rancher;
pub mod types;

use std::sync::Arc;

pub use types::{
    ApiError, AuthHint, ClusterData, ClusterSummary, LocalLogin, ManagementData, Namespace, Principal, Setting,
    SettingsPage,
};

/// Username used for the first-run local login.
pub const SETUP_USERNAME: &str = "admin";

/// Upstream operations used by the console.
#[async_trait::async_trait]
pub trait ConsoleApi: Send + Sync {
    /// Settings collection. Public settings only for anonymous callers, all of
    /// them once authenticated; the upstream decides.
    async fn find_all_settings(&self) -> Result<SettingsPage, ApiError>;

    /// Single setting through the legacy `/v3/settings/<id>` endpoint.
    async fn find_legacy_setting(&self, id: &str) -> Result<Setting, ApiError>;

    /// Single setting through the settings collection.
    async fn find_setting(&self, id: &str) -> Result<Setting, ApiError>;

    /// Persist a setting that does not exist upstream yet.
    async fn create_setting(&self, setting: &Setting) -> Result<Setting, ApiError>;

    /// Persist changes to an existing setting.
    async fn save_setting(&self, setting: &Setting) -> Result<Setting, ApiError>;

    /// Principals visible to the caller. The current visitor carries `me = true`.
    async fn find_principals(&self) -> Result<Vec<Principal>, ApiError>;

    /// Local-provider login. Any status is returned as `Ok`; `200` is
    /// success and carries the upstream session cookies.
    async fn login_local(&self, username: &str, password: &str) -> Result<LocalLogin, ApiError>;

    /// Management-scoped data (cluster list).
    async fn load_management(&self) -> Result<ManagementData, ApiError>;

    /// Cluster-scoped data. Unknown clusters fail with `ApiError::ClusterNotFound`.
    async fn load_cluster(&self, cluster_id: &str) -> Result<ClusterData, ApiError>;
}

/// Produces a `ConsoleApi` bound to a visitor's forwarded cookies.
pub trait ApiConnector: Send + Sync {
    fn connect(&self, cookies: Option<&str>) -> Arc<dyn ConsoleApi>;
}

/// Find the principal flagged as the current visitor.
///
/// # Errors
///
/// Propagates the fetch error, or `ApiError::NoCurrentPrincipal` when no entry
/// carries `me = true`.
pub async fn find_me(api: &dyn ConsoleApi) -> Result<Principal, ApiError> {
    let principals = api.find_principals().await?;
    principals
        .into_iter()
        .find(|p| p.me)
        .ok_or(ApiError::NoCurrentPrincipal)
}

#[cfg(test)]
pub mod test_helpers;
