//! Session bootstrap gate — runs on every navigation.
//!
//! DESIGN
//! ======
//! A strictly ordered decision sequence over upstream calls:
//!
//! 1. skip dev-reload, failure and auth pages untouched;
//! 2. detect a first-run install through the `first-login` setting;
//! 3. on first run, try the initial admin login and send the visitor to setup
//!    (with the upstream session cookies) or login;
//! 4. establish auth status from the upstream hint or a principal lookup;
//! 5. apply registered products;
//! 6. select the route's product;
//! 7. load management data and the route's (or default) cluster.
//!
//! Each step may end the evaluation with a redirect. No error escapes: every
//! failure becomes a redirect or a `ConsoleError` recorded on the state.
//!
//! TRADE-OFFS
//! ==========
//! First-login detection fails open: if neither settings lookup answers, the
//! visitor proceeds to the normal auth check rather than the setup flow.

pub mod product;

use tracing::{debug, error, warn};

use crate::api::{self, ApiError, AuthHint, ConsoleApi, SETUP_USERNAME};
use crate::product::ProductRegistry;
use crate::route::{INDEX, Redirect, RedirectTarget, Route, SETUP};
use crate::settings::FIRST_LOGIN;
use crate::state::{ConsoleError, ConsoleState};
use product::ProductTracker;

/// Password tried for the first-run login when the route supplies none.
pub const DEFAULT_SETUP_PASSWORD: &str = "admin";
/// Message shown on the login page when the initial login fails.
pub const DEFAULT_PASSWORD_ERROR: &str =
    "Unable to log in with the default admin password. Log in with the password you set during installation.";

const DEV_RELOAD_PREFIX: &str = "/__webpack_hmr/";
const FAIL_WHALE_PREFIX: &str = "/fail-whale";

// =============================================================================
// OUTCOME
// =============================================================================

/// Result of one gate evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// Path is never gated; nothing was touched.
    Excluded,
    /// Navigation may proceed; product and cluster data are loaded.
    Ready,
    Redirect(Redirect),
    /// A global error was recorded; navigation stops without a redirect.
    Aborted,
}

impl GateOutcome {
    #[must_use]
    pub fn redirect_target(&self) -> Option<RedirectTarget> {
        match self {
            Self::Redirect(r) => Some(r.target),
            _ => None,
        }
    }
}

/// Evaluation stages, logged as the gate moves through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Excluded,
    CheckingFirstLogin,
    InitialSetup,
    CheckingAuth,
    NotAuthed,
    AuthedNoProduct,
    ProductSelected,
    LoadingClusterData,
    Ready,
    Failed,
}

impl Stage {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Excluded => "excluded",
            Self::CheckingFirstLogin => "checking-first-login",
            Self::InitialSetup => "initial-setup",
            Self::CheckingAuth => "checking-auth",
            Self::NotAuthed => "not-authed",
            Self::AuthedNoProduct => "authed-no-product",
            Self::ProductSelected => "product-selected",
            Self::LoadingClusterData => "loading-cluster-data",
            Self::Ready => "ready",
            Self::Failed => "failed",
        }
    }
}

// =============================================================================
// GATE
// =============================================================================

pub struct Gate<'a> {
    api: &'a dyn ConsoleApi,
    registry: &'a ProductRegistry,
    tracker: &'a ProductTracker,
}

impl<'a> Gate<'a> {
    #[must_use]
    pub fn new(api: &'a dyn ConsoleApi, registry: &'a ProductRegistry, tracker: &'a ProductTracker) -> Self {
        Self { api, registry, tracker }
    }

    /// Run the full decision sequence for `route` against `state`.
    pub async fn evaluate(&self, route: &Route, state: &mut ConsoleState) -> GateOutcome {
        if is_ungated(route) {
            enter(Stage::Excluded, route);
            return GateOutcome::Excluded;
        }

        enter(Stage::CheckingFirstLogin, route);
        if self.detect_first_login(state).await {
            enter(Stage::InitialSetup, route);
            return self.initial_setup(route).await;
        }

        enter(Stage::CheckingAuth, route);
        if let Some(outcome) = self.check_auth(route, state).await {
            return outcome;
        }

        enter(Stage::AuthedNoProduct, route);
        self.registry.apply_products(state);
        self.tracker.track(route, state);

        enter(Stage::ProductSelected, route);
        enter(Stage::LoadingClusterData, route);
        match self.load_cluster_data(route, state).await {
            Ok(()) => {
                enter(Stage::Ready, route);
                GateOutcome::Ready
            }
            Err(ApiError::ClusterNotFound(id)) => {
                warn!(cluster = %id, "cluster not found, sending to cluster list");
                GateOutcome::Redirect(Redirect::to(RedirectTarget::Clusters))
            }
            Err(e) => {
                enter(Stage::Failed, route);
                error!(error = %e, path = %route.path, "failed to load console data");
                state.set_error(ConsoleError::from(&e));
                GateOutcome::Redirect(Redirect::to(RedirectTarget::FailWhale))
            }
        }
    }

    /// `true` only when a lookup returns `first-login` with value `"true"`.
    async fn detect_first_login(&self, state: &mut ConsoleState) -> bool {
        match self.api.find_all_settings().await {
            Ok(page) => {
                if let Some(hint) = &page.auth_hint {
                    state.auth.from_header = Some(hint.clone());
                }
                if let Some(setting) = page.get(FIRST_LOGIN) {
                    return setting.value == "true";
                }
                debug!("first-login missing from settings collection, trying legacy endpoint");
            }
            Err(e) => debug!(error = %e, "settings collection lookup failed, trying legacy endpoint"),
        }

        match self.api.find_legacy_setting(FIRST_LOGIN).await {
            Ok(setting) => setting.value == "true",
            Err(e) => {
                debug!(error = %e, "legacy first-login lookup failed, assuming not first login");
                false
            }
        }
    }

    async fn initial_setup(&self, route: &Route) -> GateOutcome {
        let supplied = route.query_value(SETUP);
        let password = supplied.unwrap_or(DEFAULT_SETUP_PASSWORD);

        match self.api.login_local(SETUP_USERNAME, password).await {
            Ok(login) if login.succeeded() => {
                GateOutcome::Redirect(Redirect::setup(supplied).with_cookies(login.set_cookies))
            }
            Ok(login) => {
                warn!(status = login.status, "initial setup login rejected");
                GateOutcome::Redirect(Redirect::login_error(DEFAULT_PASSWORD_ERROR))
            }
            Err(e) => {
                error!(error = %e, "error trying initial setup");
                GateOutcome::Redirect(Redirect::login_error(DEFAULT_PASSWORD_ERROR))
            }
        }
    }

    /// `Some` ends the evaluation.
    async fn check_auth(&self, route: &Route, state: &mut ConsoleState) -> Option<GateOutcome> {
        if !state.auth.is_enabled() || state.auth.logged_in {
            return None;
        }

        let hint = state
            .auth
            .from_header
            .as_deref()
            .and_then(AuthHint::parse);

        match hint {
            Some(AuthHint::Disabled) => {
                state.auth.has_auth(false);
                None
            }
            Some(AuthHint::LoggedOut) => Some(not_logged_in(route, state)),
            Some(AuthHint::LoggedIn) | None => match api::find_me(self.api).await {
                Ok(me) => {
                    debug!(principal = %me.id, "logged in");
                    state.auth.logged_in_as(me.id);
                    None
                }
                Err(ApiError::NotFound) => {
                    debug!("principals endpoint not found, auth disabled");
                    state.auth.has_auth(false);
                    None
                }
                Err(ApiError::Unauthorized) => Some(not_logged_in(route, state)),
                Err(e) => {
                    error!(error = %e, "principal lookup failed");
                    state.set_error(ConsoleError::from(&e));
                    Some(GateOutcome::Aborted)
                }
            },
        }
    }

    async fn load_cluster_data(&self, route: &Route, state: &mut ConsoleState) -> Result<(), ApiError> {
        if let Some(cluster_id) = route.param("cluster") {
            let (management, cluster) =
                tokio::try_join!(self.api.load_management(), self.api.load_cluster(cluster_id))?;
            state.commit_management(management);
            state.commit_cluster(cluster);
            return Ok(());
        }

        let management = self.api.load_management().await?;
        state.commit_management(management);

        // Needs the cluster list, so it cannot run alongside the management load.
        if let Some(cluster_id) = state.default_cluster_id() {
            let cluster = self.api.load_cluster(&cluster_id).await?;
            state.commit_cluster(cluster);
        }
        Ok(())
    }
}

/// Routes the gate never evaluates: dev reload, the failure page, and the
/// auth pages it redirects to.
#[must_use]
pub fn is_ungated(route: &Route) -> bool {
    route.path.starts_with(DEV_RELOAD_PREFIX)
        || route.path.starts_with(FAIL_WHALE_PREFIX)
        || [RedirectTarget::AuthLogin, RedirectTarget::AuthSetup]
            .iter()
            .any(|target| target.name() == route.name)
}

fn not_logged_in(route: &Route, state: &mut ConsoleState) -> GateOutcome {
    enter(Stage::NotAuthed, route);
    state.auth.logged_out();
    GateOutcome::Redirect(Redirect::login(route.name != INDEX))
}

fn enter(stage: Stage, route: &Route) {
    debug!(stage = stage.as_str(), path = %route.path, route = %route.name, "gate stage");
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
