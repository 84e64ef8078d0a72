//! Shared application state.
//!
//! DESIGN
//! ======
//! `ConsoleState` is one visitor's application state: auth status, the
//! applied products, the selected product, loaded management/cluster data and
//! the last recorded error. The gate is its only writer.
//!
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the upstream connector, the product registry, the product tracker
//! built once at startup, and the map of visitor sessions. Sessions idle past
//! `session_idle_secs` are pruned whenever the map is written.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::api::{ApiConnector, ApiError, ClusterData, ManagementData};
use crate::config::ConsoleConfig;
use crate::gate::product::ProductTracker;
use crate::product::{DataStore, Product, ProductRegistry};

// =============================================================================
// AUTH STATE
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    /// `None` until the gate has determined it; treated as enabled.
    pub enabled: Option<bool>,
    pub logged_in: bool,
    pub principal_id: Option<String>,
    /// Raw auth hint last reported by the upstream.
    pub from_header: Option<String>,
}

impl AuthState {
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled != Some(false)
    }

    pub fn has_auth(&mut self, enabled: bool) {
        self.enabled = Some(enabled);
    }

    pub fn logged_in_as(&mut self, principal_id: String) {
        self.enabled = Some(true);
        self.logged_in = true;
        self.principal_id = Some(principal_id);
    }

    pub fn logged_out(&mut self) {
        self.enabled = Some(true);
        self.logged_in = false;
        self.principal_id = None;
    }
}

// =============================================================================
// CATALOG
// =============================================================================

/// Invalidation counter for the installable-application catalog. Catalog
/// consumers refetch whenever `generation` moves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Catalog {
    pub generation: u64,
}

impl Catalog {
    pub fn reset(&mut self) {
        self.generation += 1;
    }
}

// =============================================================================
// CONSOLE ERROR
// =============================================================================

/// Global error recorded when a navigation cannot complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsoleError {
    pub code: &'static str,
    pub message: String,
}

impl From<&ApiError> for ConsoleError {
    fn from(err: &ApiError) -> Self {
        Self { code: err.error_code(), message: err.to_string() }
    }
}

// =============================================================================
// CONSOLE STATE
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct ConsoleState {
    pub auth: AuthState,
    pub features: BTreeSet<String>,
    /// Products applied for this visitor, heaviest first.
    pub products: Vec<Product>,
    pub product_id: Option<String>,
    pub catalog: Catalog,
    pub management: Option<ManagementData>,
    pub clusters: HashMap<String, ClusterData>,
    pub current_cluster: Option<String>,
    pub preferred_cluster: Option<String>,
    pub error: Option<ConsoleError>,
}

impl ConsoleState {
    #[must_use]
    pub fn new(features: &[String], preferred_cluster: Option<String>) -> Self {
        Self {
            features: features.iter().cloned().collect(),
            preferred_cluster,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn feature_enabled(&self, feature: &str) -> bool {
        self.features.contains(feature)
    }

    #[must_use]
    pub fn current_product(&self) -> Option<&Product> {
        let id = self.product_id.as_deref()?;
        self.products.iter().find(|p| p.name == id)
    }

    /// Data store of the selected product, if it is applied.
    #[must_use]
    pub fn current_store(&self) -> Option<DataStore> {
        self.current_product().map(|p| p.in_store)
    }

    pub fn set_product(&mut self, product_id: &str) {
        self.product_id = Some(product_id.to_owned());
    }

    pub fn set_error(&mut self, err: ConsoleError) {
        self.error = Some(err);
    }

    pub fn commit_management(&mut self, data: ManagementData) {
        self.management = Some(data);
    }

    pub fn commit_cluster(&mut self, data: ClusterData) {
        self.current_cluster = Some(data.id.clone());
        self.clusters.insert(data.id.clone(), data);
    }

    /// Cluster to load when the route names none. Needs management data.
    #[must_use]
    pub fn default_cluster_id(&self) -> Option<String> {
        self.management
            .as_ref()?
            .default_cluster_id(self.preferred_cluster.as_deref())
    }

    /// Whether the current cluster has any project-owned namespace.
    #[must_use]
    pub fn has_project(&self) -> bool {
        self.current_cluster
            .as_ref()
            .and_then(|id| self.clusters.get(id))
            .is_some_and(ClusterData::has_projects)
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            auth_enabled: self.auth.is_enabled(),
            logged_in: self.auth.logged_in,
            principal_id: self.auth.principal_id.clone(),
            product: self.product_id.clone(),
            store: self.current_store(),
            cluster: self.current_cluster.clone(),
            cluster_count: self
                .management
                .as_ref()
                .map_or(0, |m| m.clusters.len()),
            error: self.error.clone(),
        }
    }
}

/// Serializable view of a visitor's state returned on allowed navigations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub auth_enabled: bool,
    pub logged_in: bool,
    pub principal_id: Option<String>,
    pub product: Option<String>,
    pub store: Option<DataStore>,
    pub cluster: Option<String>,
    pub cluster_count: usize,
    pub error: Option<ConsoleError>,
}

// =============================================================================
// APP STATE
// =============================================================================

/// One visitor's state plus when it was last used.
pub struct SessionEntry {
    pub state: Arc<Mutex<ConsoleState>>,
    pub last_seen: Instant,
}

/// Shared application state, injected into Axum handlers via State extractor.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ConsoleConfig>,
    pub api: Arc<dyn ApiConnector>,
    pub registry: Arc<ProductRegistry>,
    pub tracker: Arc<ProductTracker>,
    pub sessions: Arc<RwLock<HashMap<Uuid, SessionEntry>>>,
}

impl AppState {
    #[must_use]
    pub fn new(
        config: ConsoleConfig,
        api: Arc<dyn ApiConnector>,
        registry: ProductRegistry,
        tracker: ProductTracker,
    ) -> Self {
        Self {
            config: Arc::new(config),
            api,
            registry: Arc::new(registry),
            tracker: Arc::new(tracker),
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Look up a visitor's state, creating a fresh session when `id` is
    /// absent, unknown or expired.
    pub async fn session(&self, id: Option<Uuid>) -> (Uuid, Arc<Mutex<ConsoleState>>) {
        self.session_at(id, Instant::now()).await
    }

    /// Internal: session lookup with explicit timestamp (for testing).
    async fn session_at(&self, id: Option<Uuid>, now: Instant) -> (Uuid, Arc<Mutex<ConsoleState>>) {
        let idle = Duration::from_secs(self.config.session_idle_secs);
        let mut sessions = self.sessions.write().await;
        prune_idle(&mut sessions, now, idle);

        if let Some(id) = id {
            if let Some(entry) = sessions.get_mut(&id) {
                entry.last_seen = now;
                return (id, entry.state.clone());
            }
        }

        let id = Uuid::new_v4();
        let fresh = Arc::new(Mutex::new(ConsoleState::new(
            &self.config.features,
            self.config.preferred_cluster.clone(),
        )));
        sessions.insert(id, SessionEntry { state: fresh.clone(), last_seen: now });
        (id, fresh)
    }

    /// Existing visitor state, without creating or refreshing a session.
    pub async fn existing_session(&self, id: Option<Uuid>) -> Option<Arc<Mutex<ConsoleState>>> {
        let id = id?;
        self.sessions
            .read()
            .await
            .get(&id)
            .map(|entry| entry.state.clone())
    }
}

fn prune_idle(sessions: &mut HashMap<Uuid, SessionEntry>, now: Instant, idle: Duration) {
    sessions.retain(|_, entry| now.saturating_duration_since(entry.last_seen) < idle);
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
