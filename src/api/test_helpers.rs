//! Scripted `ConsoleApi` for gate, settings and route tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::Barrier;

use super::*;

pub struct MockApi {
    settings: Result<SettingsPage, ApiError>,
    legacy_setting: Result<Setting, ApiError>,
    stored: Mutex<HashMap<String, Setting>>,
    principals: Result<Vec<Principal>, ApiError>,
    login: Result<LocalLogin, ApiError>,
    management: Result<ManagementData, ApiError>,
    clusters: HashMap<String, ClusterData>,
    cluster_error: Option<ApiError>,
    load_barrier: Option<Arc<Barrier>>,
    calls: Mutex<Vec<String>>,
}

impl MockApi {
    /// Auth-enabled upstream with a logged-in admin, no first login, one
    /// ready cluster `local`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            settings: Ok(SettingsPage {
                settings: vec![setting("first-login", "false")],
                auth_hint: None,
            }),
            legacy_setting: Err(ApiError::NotFound),
            stored: Mutex::new(HashMap::new()),
            principals: Ok(vec![principal("local://u-admin", true), principal("local://u-other", false)]),
            login: Ok(LocalLogin { status: 401, set_cookies: Vec::new() }),
            management: Ok(ManagementData {
                clusters: vec![ClusterSummary { id: "local".into(), display_name: "local".into(), ready: true }],
            }),
            clusters: HashMap::from([("local".to_owned(), cluster_data("local"))]),
            cluster_error: None,
            load_barrier: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: Result<SettingsPage, ApiError>) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn with_first_login(self, value: &str) -> Self {
        self.with_settings(Ok(SettingsPage { settings: vec![setting("first-login", value)], auth_hint: None }))
    }

    #[must_use]
    pub fn with_auth_hint(mut self, hint: &str) -> Self {
        if let Ok(page) = &mut self.settings {
            page.auth_hint = Some(hint.to_owned());
        }
        self
    }

    #[must_use]
    pub fn with_legacy_setting(mut self, result: Result<Setting, ApiError>) -> Self {
        self.legacy_setting = result;
        self
    }

    #[must_use]
    pub fn with_stored_setting(self, stored: Setting) -> Self {
        self.stored
            .lock()
            .unwrap()
            .insert(stored.id.clone(), stored);
        self
    }

    #[must_use]
    pub fn with_principals(mut self, result: Result<Vec<Principal>, ApiError>) -> Self {
        self.principals = result;
        self
    }

    #[must_use]
    pub fn with_login_status(mut self, result: Result<u16, ApiError>) -> Self {
        self.login = result.map(|status| LocalLogin { status, set_cookies: Vec::new() });
        self
    }

    /// Successful login issuing `cookies`.
    #[must_use]
    pub fn with_login_cookies(mut self, cookies: &[&str]) -> Self {
        self.login = Ok(LocalLogin { status: 200, set_cookies: cookies.iter().map(|c| (*c).to_owned()).collect() });
        self
    }

    #[must_use]
    pub fn with_management(mut self, result: Result<ManagementData, ApiError>) -> Self {
        self.management = result;
        self
    }

    #[must_use]
    pub fn with_cluster(mut self, data: ClusterData) -> Self {
        self.clusters.insert(data.id.clone(), data);
        self
    }

    #[must_use]
    pub fn with_cluster_error(mut self, err: ApiError) -> Self {
        self.cluster_error = Some(err);
        self
    }

    /// Make management and cluster loads rendezvous, so they only complete
    /// when issued concurrently.
    #[must_use]
    pub fn with_load_barrier(mut self) -> Self {
        self.load_barrier = Some(Arc::new(Barrier::new(2)));
        self
    }

    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    #[must_use]
    pub fn called(&self, prefix: &str) -> bool {
        self.calls().iter().any(|c| c.starts_with(prefix))
    }

    #[must_use]
    pub fn stored(&self, id: &str) -> Option<Setting> {
        self.stored.lock().unwrap().get(id).cloned()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    async fn rendezvous(&self) {
        if let Some(barrier) = &self.load_barrier {
            barrier.wait().await;
        }
    }
}

impl Default for MockApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ConsoleApi for MockApi {
    async fn find_all_settings(&self) -> Result<SettingsPage, ApiError> {
        self.record("settings");
        self.settings.clone()
    }

    async fn find_legacy_setting(&self, id: &str) -> Result<Setting, ApiError> {
        self.record(format!("legacy_setting:{id}"));
        self.legacy_setting.clone()
    }

    async fn find_setting(&self, id: &str) -> Result<Setting, ApiError> {
        self.record(format!("find_setting:{id}"));
        self.stored(id).ok_or(ApiError::NotFound)
    }

    async fn create_setting(&self, new: &Setting) -> Result<Setting, ApiError> {
        self.record(format!("create_setting:{}", new.id));
        self.stored
            .lock()
            .unwrap()
            .insert(new.id.clone(), new.clone());
        Ok(new.clone())
    }

    async fn save_setting(&self, changed: &Setting) -> Result<Setting, ApiError> {
        self.record(format!("save_setting:{}", changed.id));
        let mut stored = self.stored.lock().unwrap();
        if !stored.contains_key(&changed.id) {
            return Err(ApiError::NotFound);
        }
        stored.insert(changed.id.clone(), changed.clone());
        Ok(changed.clone())
    }

    async fn find_principals(&self) -> Result<Vec<Principal>, ApiError> {
        self.record("principals");
        self.principals.clone()
    }

    async fn login_local(&self, username: &str, password: &str) -> Result<LocalLogin, ApiError> {
        self.record(format!("login:{username}:{password}"));
        self.login.clone()
    }

    async fn load_management(&self) -> Result<ManagementData, ApiError> {
        self.record("management");
        self.rendezvous().await;
        self.management.clone()
    }

    async fn load_cluster(&self, cluster_id: &str) -> Result<ClusterData, ApiError> {
        self.record(format!("cluster:{cluster_id}"));
        self.rendezvous().await;
        if let Some(err) = &self.cluster_error {
            return Err(err.clone());
        }
        self.clusters
            .get(cluster_id)
            .cloned()
            .ok_or_else(|| ApiError::ClusterNotFound(cluster_id.to_owned()))
    }
}

/// Connector handing out one shared `MockApi`, recording forwarded cookies.
pub struct MockConnector {
    pub api: Arc<MockApi>,
    pub cookies: Mutex<Vec<Option<String>>>,
}

impl MockConnector {
    #[must_use]
    pub fn new(api: MockApi) -> Self {
        Self { api: Arc::new(api), cookies: Mutex::new(Vec::new()) }
    }
}

impl ApiConnector for MockConnector {
    fn connect(&self, cookies: Option<&str>) -> Arc<dyn ConsoleApi> {
        self.cookies
            .lock()
            .unwrap()
            .push(cookies.map(str::to_owned));
        self.api.clone()
    }
}

#[must_use]
pub fn setting(id: &str, value: &str) -> Setting {
    Setting { id: id.into(), value: value.into(), default: value.into() }
}

#[must_use]
pub fn principal(id: &str, me: bool) -> Principal {
    Principal { id: id.into(), me, name: None }
}

#[must_use]
pub fn cluster_data(id: &str) -> ClusterData {
    ClusterData { id: id.into(), namespaces: vec![Namespace { name: "default".into(), project_id: None }] }
}
