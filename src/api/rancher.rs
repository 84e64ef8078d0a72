//! HTTP client for the upstream cluster-management API.
//!
//! Thin `reqwest` wrapper. Response bodies are decoded by the pure `parse_*`
//! functions so wire handling is testable without a server.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{COOKIE, HeaderMap, SET_COOKIE};
use serde::Deserialize;
use serde_json::json;

use super::types::{
    ApiError, ClusterData, ClusterSummary, LocalLogin, ManagementData, Namespace, Principal, Setting, SettingsPage,
};
use super::{ApiConnector, ConsoleApi};
use crate::config::ApiTimeouts;

/// Resource type of management settings.
pub const SETTING_TYPE: &str = "management.cattle.io.setting";
/// Response header carrying the upstream auth state (`none`/`true`/`false`).
pub const AUTH_HINT_HEADER: &str = "x-api-auth-header";

const SETTINGS_PATH: &str = "/v1/management.cattle.io.settings";
const LEGACY_SETTINGS_PATH: &str = "/v3/settings";
const PRINCIPALS_PATH: &str = "/v3/principals";
const LOCAL_LOGIN_PATH: &str = "/v3-public/localProviders/local?action=login";
const CLUSTERS_PATH: &str = "/v1/management.cattle.io.clusters";
const PROJECT_LABEL: &str = "field.cattle.io/projectId";

// =============================================================================
// CLIENT
// =============================================================================

#[derive(Clone)]
pub struct RancherClient {
    http: reqwest::Client,
    base_url: Arc<str>,
    cookies: Option<String>,
}

impl RancherClient {
    /// Build a client for `base_url` with the given timeouts.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(base_url: &str, timeouts: ApiTimeouts) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').into(), cookies: None })
    }

    /// Same client, sending `cookies` on every request.
    #[must_use]
    pub fn with_cookies(&self, cookies: Option<&str>) -> Self {
        Self { http: self.http.clone(), base_url: self.base_url.clone(), cookies: cookies.map(str::to_owned) }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self
            .http
            .request(method, self.url(path))
            .header("Accept", "application/json");
        match &self.cookies {
            Some(cookies) => builder.header(COOKIE, cookies.as_str()),
            None => builder,
        }
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<(HeaderMap, String), ApiError> {
        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;

        if !(200..300).contains(&status) {
            return Err(ApiError::from_status(status, text));
        }
        Ok((headers, text))
    }

    async fn get(&self, path: &str) -> Result<(HeaderMap, String), ApiError> {
        self.send(self.request(reqwest::Method::GET, path))
            .await
    }
}

impl ApiConnector for RancherClient {
    fn connect(&self, cookies: Option<&str>) -> Arc<dyn ConsoleApi> {
        Arc::new(self.with_cookies(cookies))
    }
}

#[async_trait::async_trait]
impl ConsoleApi for RancherClient {
    async fn find_all_settings(&self) -> Result<SettingsPage, ApiError> {
        let (headers, body) = self.get(SETTINGS_PATH).await?;
        let auth_hint = headers
            .get(AUTH_HINT_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        Ok(SettingsPage { settings: parse_settings(&body)?, auth_hint })
    }

    async fn find_legacy_setting(&self, id: &str) -> Result<Setting, ApiError> {
        let (_, body) = self
            .get(&format!("{LEGACY_SETTINGS_PATH}/{id}"))
            .await?;
        parse_setting(&body)
    }

    async fn find_setting(&self, id: &str) -> Result<Setting, ApiError> {
        let (_, body) = self.get(&format!("{SETTINGS_PATH}/{id}")).await?;
        parse_setting(&body)
    }

    async fn create_setting(&self, setting: &Setting) -> Result<Setting, ApiError> {
        let builder = self
            .request(reqwest::Method::POST, SETTINGS_PATH)
            .json(&setting_body(setting));
        let (_, body) = self.send(builder).await?;
        parse_setting(&body)
    }

    async fn save_setting(&self, setting: &Setting) -> Result<Setting, ApiError> {
        let builder = self
            .request(reqwest::Method::PUT, &format!("{SETTINGS_PATH}/{}", setting.id))
            .json(&setting_body(setting));
        let (_, body) = self.send(builder).await?;
        parse_setting(&body)
    }

    async fn find_principals(&self) -> Result<Vec<Principal>, ApiError> {
        let (_, body) = self.get(PRINCIPALS_PATH).await?;
        parse_principals(&body)
    }

    async fn login_local(&self, username: &str, password: &str) -> Result<LocalLogin, ApiError> {
        let response = self
            .request(reqwest::Method::POST, LOCAL_LOGIN_PATH)
            .json(&json!({
                "description": "UI session",
                "responseType": "cookie",
                "username": username,
                "password": password,
            }))
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;
        Ok(LocalLogin { status: response.status().as_u16(), set_cookies: set_cookies(response.headers()) })
    }

    async fn load_management(&self) -> Result<ManagementData, ApiError> {
        let (_, body) = self.get(CLUSTERS_PATH).await?;
        Ok(ManagementData { clusters: parse_clusters(&body)? })
    }

    async fn load_cluster(&self, cluster_id: &str) -> Result<ClusterData, ApiError> {
        let path = format!("/k8s/clusters/{cluster_id}/v1/namespaces");
        let (_, body) = self.get(&path).await.map_err(|e| match e {
            ApiError::NotFound => ApiError::ClusterNotFound(cluster_id.to_owned()),
            other => other,
        })?;
        Ok(ClusterData { id: cluster_id.to_owned(), namespaces: parse_namespaces(&body)? })
    }
}

// =============================================================================
// WIRE FORMAT
// =============================================================================

#[derive(Deserialize)]
struct Collection<T> {
    data: Vec<T>,
}

#[derive(Deserialize)]
struct WireSetting {
    id: String,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    default: Option<String>,
}

impl From<WireSetting> for Setting {
    fn from(wire: WireSetting) -> Self {
        Self { id: wire.id, value: wire.value.unwrap_or_default(), default: wire.default.unwrap_or_default() }
    }
}

#[derive(Deserialize)]
struct WirePrincipal {
    id: String,
    #[serde(default)]
    me: bool,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Deserialize)]
struct WireCluster {
    id: String,
    #[serde(default)]
    spec: WireClusterSpec,
    #[serde(default)]
    status: WireClusterStatus,
}

#[derive(Default, Deserialize)]
struct WireClusterSpec {
    #[serde(rename = "displayName", default)]
    display_name: Option<String>,
}

#[derive(Default, Deserialize)]
struct WireClusterStatus {
    #[serde(default)]
    conditions: Vec<WireCondition>,
}

#[derive(Deserialize)]
struct WireCondition {
    #[serde(rename = "type")]
    kind: String,
    status: String,
}

#[derive(Deserialize)]
struct WireNamespace {
    id: String,
    #[serde(default)]
    metadata: WireMetadata,
}

#[derive(Default, Deserialize)]
struct WireMetadata {
    #[serde(default)]
    labels: HashMap<String, String>,
}

pub(crate) fn set_cookies(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_owned)
        .collect()
}

fn decode<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::Parse(e.to_string()))
}

fn setting_body(setting: &Setting) -> serde_json::Value {
    json!({
        "id": setting.id,
        "type": SETTING_TYPE,
        "metadata": { "name": setting.id },
        "value": setting.value,
        "default": setting.default,
    })
}

pub(crate) fn parse_setting(body: &str) -> Result<Setting, ApiError> {
    decode::<WireSetting>(body).map(Setting::from)
}

pub(crate) fn parse_settings(body: &str) -> Result<Vec<Setting>, ApiError> {
    let collection: Collection<WireSetting> = decode(body)?;
    Ok(collection.data.into_iter().map(Setting::from).collect())
}

pub(crate) fn parse_principals(body: &str) -> Result<Vec<Principal>, ApiError> {
    let collection: Collection<WirePrincipal> = decode(body)?;
    Ok(collection
        .data
        .into_iter()
        .map(|p| Principal { id: p.id, me: p.me, name: p.name })
        .collect())
}

pub(crate) fn parse_clusters(body: &str) -> Result<Vec<ClusterSummary>, ApiError> {
    let collection: Collection<WireCluster> = decode(body)?;
    Ok(collection
        .data
        .into_iter()
        .map(|c| {
            let ready = c
                .status
                .conditions
                .iter()
                .any(|cond| cond.kind == "Ready" && cond.status == "True");
            let display_name = c.spec.display_name.unwrap_or_else(|| c.id.clone());
            ClusterSummary { id: c.id, display_name, ready }
        })
        .collect())
}

pub(crate) fn parse_namespaces(body: &str) -> Result<Vec<Namespace>, ApiError> {
    let collection: Collection<WireNamespace> = decode(body)?;
    Ok(collection
        .data
        .into_iter()
        .map(|mut ns| Namespace { project_id: ns.metadata.labels.remove(PROJECT_LABEL), name: ns.id })
        .collect())
}

#[cfg(test)]
#[path = "rancher_test.rs"]
mod tests;
