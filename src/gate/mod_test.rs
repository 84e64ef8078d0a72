use std::time::Duration;

use super::*;
use crate::api::test_helpers::{MockApi, cluster_data, principal, setting};
use crate::api::{ClusterSummary, ManagementData, SettingsPage};
use crate::gate::product::ClusterRoutePrefix;
use crate::route::{ERR, TIMED_OUT};
use crate::state::test_helpers::console_state;

fn route(path: &str, query: Option<&str>) -> Route {
    let registry = ProductRegistry::builtin();
    Route::resolve(path, query, |name| registry.contains(name))
}

async fn evaluate(api: &MockApi, path: &str, query: Option<&str>, state: &mut ConsoleState) -> GateOutcome {
    let registry = ProductRegistry::builtin();
    let tracker = ProductTracker::new(Box::new(ClusterRoutePrefix));
    Gate::new(api, &registry, &tracker)
        .evaluate(&route(path, query), state)
        .await
}

fn fresh_state() -> ConsoleState {
    ConsoleState::new(&["legacy".to_owned()], None)
}

fn redirect(outcome: GateOutcome) -> Redirect {
    match outcome {
        GateOutcome::Redirect(r) => r,
        other => panic!("expected redirect, got {other:?}"),
    }
}

// =============================================================================
// exclusions
// =============================================================================

#[tokio::test]
async fn excluded_paths_touch_nothing() {
    for path in ["/__webpack_hmr/client", "/fail-whale", "/fail-whale/details"] {
        let api = MockApi::new();
        let mut state = fresh_state();
        let before = state.snapshot();

        let outcome = evaluate(&api, path, None, &mut state).await;
        assert_eq!(outcome, GateOutcome::Excluded, "{path}");
        assert_eq!(state.snapshot(), before, "{path}");
        assert!(state.products.is_empty());
        assert!(api.calls().is_empty(), "{path}: {:?}", api.calls());
    }
}

#[tokio::test]
async fn dev_reload_prefix_needs_trailing_slash() {
    let api = MockApi::new();
    let mut state = fresh_state();
    let outcome = evaluate(&api, "/__webpack_hmr", None, &mut state).await;
    assert_eq!(outcome, GateOutcome::Ready);
}

#[tokio::test]
async fn login_page_is_not_gated_for_logged_out_visitor() {
    let api = MockApi::new().with_auth_hint("false");
    let mut state = fresh_state();

    let outcome = evaluate(&api, "/auth/login", Some("timed-out"), &mut state).await;
    assert_eq!(outcome, GateOutcome::Excluded);
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn setup_page_is_not_gated_on_first_login() {
    let api = MockApi::new()
        .with_first_login("true")
        .with_login_status(Ok(200));
    let mut state = fresh_state();

    let outcome = evaluate(&api, "/auth/setup", Some("setup=s3cret"), &mut state).await;
    assert_eq!(outcome, GateOutcome::Excluded);
    assert!(!api.called("login"));
}

#[test]
fn ungated_routes() {
    assert!(is_ungated(&route("/auth/login", None)));
    assert!(is_ungated(&route("/auth/setup", None)));
    assert!(is_ungated(&route("/fail-whale", None)));
    assert!(!is_ungated(&route("/auth/logout", None)));
    assert!(!is_ungated(&route("/", None)));
}

// =============================================================================
// first login
// =============================================================================

#[tokio::test]
async fn first_login_runs_setup_before_auth() {
    let api = MockApi::new()
        .with_first_login("true")
        .with_login_status(Ok(200));
    let mut state = fresh_state();

    let r = redirect(evaluate(&api, "/c/local/explorer", None, &mut state).await);
    assert_eq!(r.target, RedirectTarget::AuthSetup);
    assert!(!r.has_query(SETUP));
    assert_eq!(api.calls(), vec!["settings".to_owned(), "login:admin:admin".to_owned()]);
    assert!(!api.called("principals"));
    assert!(state.products.is_empty());
}

#[tokio::test]
async fn setup_redirect_carries_upstream_session_cookies() {
    let api = MockApi::new()
        .with_first_login("true")
        .with_login_cookies(&["R_SESS=token-abc; Path=/; HttpOnly"]);
    let mut state = fresh_state();

    let r = redirect(evaluate(&api, "/", None, &mut state).await);
    assert_eq!(r.target, RedirectTarget::AuthSetup);
    assert_eq!(r.set_cookies, vec!["R_SESS=token-abc; Path=/; HttpOnly".to_owned()]);
}

#[tokio::test]
async fn rejected_setup_login_sets_no_cookies() {
    let api = MockApi::new()
        .with_first_login("true")
        .with_login_status(Ok(401));
    let mut state = fresh_state();

    let r = redirect(evaluate(&api, "/", None, &mut state).await);
    assert_eq!(r.target, RedirectTarget::AuthLogin);
    assert!(r.set_cookies.is_empty());
}

#[tokio::test]
async fn setup_forwards_supplied_password() {
    let api = MockApi::new()
        .with_first_login("true")
        .with_login_status(Ok(200));
    let mut state = fresh_state();

    let r = redirect(evaluate(&api, "/", Some("setup=s3cret%21"), &mut state).await);
    assert_eq!(r.target, RedirectTarget::AuthSetup);
    assert_eq!(r.query_value(SETUP), Some("s3cret!"));
    assert!(api.called("login:admin:s3cret!"));
}

#[tokio::test]
async fn empty_setup_param_uses_default_password() {
    let api = MockApi::new()
        .with_first_login("true")
        .with_login_status(Ok(200));
    let mut state = fresh_state();

    let r = redirect(evaluate(&api, "/", Some("setup="), &mut state).await);
    assert!(!r.has_query(SETUP));
    assert!(api.called("login:admin:admin"));
}

#[tokio::test]
async fn wrong_setup_password_sends_to_login_with_error() {
    let api = MockApi::new()
        .with_first_login("true")
        .with_login_status(Ok(401));
    let mut state = fresh_state();

    let r = redirect(evaluate(&api, "/", None, &mut state).await);
    assert_eq!(r.target, RedirectTarget::AuthLogin);
    assert!(r.query_value(ERR).is_some_and(|m| !m.is_empty()));
    assert!(!r.has_query(TIMED_OUT));
    assert!(!api.called("principals"));
}

#[tokio::test]
async fn setup_login_error_sends_to_login_with_error() {
    let api = MockApi::new()
        .with_first_login("true")
        .with_login_status(Err(ApiError::Request("connection refused".into())));
    let mut state = fresh_state();

    let r = redirect(evaluate(&api, "/", None, &mut state).await);
    assert_eq!(r.target, RedirectTarget::AuthLogin);
    assert_eq!(r.query_value(ERR), Some(DEFAULT_PASSWORD_ERROR));
}

#[tokio::test]
async fn first_login_value_must_be_exactly_true() {
    for value in ["True", "1", "yes", ""] {
        let api = MockApi::new().with_first_login(value);
        let mut state = fresh_state();
        let outcome = evaluate(&api, "/", None, &mut state).await;
        assert_eq!(outcome, GateOutcome::Ready, "{value:?}");
        assert!(!api.called("login"), "{value:?}");
    }
}

#[tokio::test]
async fn first_login_falls_back_to_legacy_setting() {
    let api = MockApi::new()
        .with_settings(Err(ApiError::Unauthorized))
        .with_legacy_setting(Ok(setting(FIRST_LOGIN, "true")))
        .with_login_status(Ok(200));
    let mut state = fresh_state();

    let r = redirect(evaluate(&api, "/", None, &mut state).await);
    assert_eq!(r.target, RedirectTarget::AuthSetup);
    assert!(api.called("legacy_setting:first-login"));
}

#[tokio::test]
async fn missing_first_login_setting_uses_legacy_endpoint() {
    let api = MockApi::new()
        .with_settings(Ok(SettingsPage { settings: vec![setting("ui-pl", "rancher")], auth_hint: None }))
        .with_legacy_setting(Ok(setting(FIRST_LOGIN, "false")));
    let mut state = fresh_state();

    assert_eq!(evaluate(&api, "/", None, &mut state).await, GateOutcome::Ready);
    assert!(api.called("legacy_setting:first-login"));
}

#[tokio::test]
async fn first_login_fails_open_when_both_lookups_fail() {
    let api = MockApi::new()
        .with_settings(Err(ApiError::Request("timeout".into())))
        .with_legacy_setting(Err(ApiError::NotFound));
    let mut state = fresh_state();

    assert_eq!(evaluate(&api, "/", None, &mut state).await, GateOutcome::Ready);
    assert!(!api.called("login"));
    assert!(api.called("principals"));
}

// =============================================================================
// auth
// =============================================================================

#[tokio::test]
async fn logged_out_hint_on_index_has_no_timed_out_flag() {
    let api = MockApi::new().with_auth_hint("false");
    let mut state = fresh_state();

    let r = redirect(evaluate(&api, "/", None, &mut state).await);
    assert_eq!(r.target, RedirectTarget::AuthLogin);
    assert!(!r.has_query(TIMED_OUT));
    assert_eq!(r.location(), "/auth/login");
    assert!(!api.called("principals"));
    assert!(state.auth.is_enabled());
    assert!(!state.auth.logged_in);
}

#[tokio::test]
async fn logged_out_hint_elsewhere_sets_timed_out() {
    for path in ["/c/local/explorer", "/clusters", "/account/api-keys"] {
        let api = MockApi::new().with_auth_hint("false");
        let mut state = fresh_state();
        let r = redirect(evaluate(&api, path, None, &mut state).await);
        assert!(r.has_query(TIMED_OUT), "{path}");
        assert_eq!(r.location(), "/auth/login?timed-out");
    }
}

#[tokio::test]
async fn disabled_hint_skips_principal_lookup() {
    let api = MockApi::new().with_auth_hint("none");
    let mut state = fresh_state();

    assert_eq!(evaluate(&api, "/", None, &mut state).await, GateOutcome::Ready);
    assert!(!api.called("principals"));
    assert_eq!(state.auth.enabled, Some(false));
}

#[tokio::test]
async fn logged_in_hint_records_principal() {
    let api = MockApi::new().with_auth_hint("true");
    let mut state = fresh_state();

    assert_eq!(evaluate(&api, "/", None, &mut state).await, GateOutcome::Ready);
    assert!(state.auth.logged_in);
    assert_eq!(state.auth.principal_id.as_deref(), Some("local://u-admin"));
    assert_eq!(state.auth.from_header.as_deref(), Some("true"));
}

#[tokio::test]
async fn principal_not_found_disables_auth() {
    let api = MockApi::new().with_principals(Err(ApiError::NotFound));
    let mut state = fresh_state();

    assert_eq!(evaluate(&api, "/", None, &mut state).await, GateOutcome::Ready);
    assert_eq!(state.auth.enabled, Some(false));
    assert!(!state.auth.logged_in);
}

#[tokio::test]
async fn principal_unauthorized_redirects_to_login() {
    let api = MockApi::new().with_principals(Err(ApiError::Unauthorized));
    let mut state = fresh_state();

    let r = redirect(evaluate(&api, "/c/local/explorer", None, &mut state).await);
    assert_eq!(r.target, RedirectTarget::AuthLogin);
    assert!(r.has_query(TIMED_OUT));
    assert!(!api.called("management"));
}

#[tokio::test]
async fn principal_failure_aborts_with_error() {
    let api = MockApi::new().with_principals(Err(ApiError::Response { status: 500, body: "boom".into() }));
    let mut state = fresh_state();

    assert_eq!(evaluate(&api, "/", None, &mut state).await, GateOutcome::Aborted);
    assert_eq!(state.error.as_ref().map(|e| e.code), Some("E_API_RESPONSE"));
    assert!(state.products.is_empty());
    assert!(!api.called("management"));
}

#[tokio::test]
async fn no_me_principal_aborts() {
    let api = MockApi::new().with_principals(Ok(vec![principal("local://u-other", false)]));
    let mut state = fresh_state();

    assert_eq!(evaluate(&api, "/", None, &mut state).await, GateOutcome::Aborted);
    assert!(state.error.is_some());
}

#[tokio::test]
async fn logged_in_session_skips_auth_check() {
    let api = MockApi::new();
    let mut state = fresh_state();
    state.auth.logged_in_as("local://u-admin".into());

    assert_eq!(evaluate(&api, "/", None, &mut state).await, GateOutcome::Ready);
    assert!(!api.called("principals"));
}

// =============================================================================
// products
// =============================================================================

#[tokio::test]
async fn ready_navigation_applies_products_and_selects_fallback() {
    let api = MockApi::new();
    let mut state = fresh_state();

    assert_eq!(evaluate(&api, "/", None, &mut state).await, GateOutcome::Ready);
    let names: Vec<&str> = state.products.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["explorer", "manager", "legacy"]);
    assert_eq!(state.product_id.as_deref(), Some("explorer"));
}

#[tokio::test]
async fn cluster_to_management_store_resets_catalog_once() {
    let api = MockApi::new();
    let mut state = console_state();
    state.set_product("explorer");

    assert_eq!(evaluate(&api, "/c/local/manager", None, &mut state).await, GateOutcome::Ready);
    assert_eq!(state.product_id.as_deref(), Some("manager"));
    assert_eq!(state.catalog.generation, 1);
}

#[tokio::test]
async fn same_store_product_switch_keeps_catalog() {
    let api = MockApi::new();
    let mut state = console_state();
    state.set_product("explorer");

    assert_eq!(
        evaluate(&api, "/c/local/legacy/pages/alerts", None, &mut state).await,
        GateOutcome::Ready
    );
    assert_eq!(state.product_id.as_deref(), Some("legacy"));
    assert_eq!(state.catalog.generation, 0);
}

// =============================================================================
// cluster data
// =============================================================================

#[tokio::test]
async fn route_cluster_loads_management_and_cluster_concurrently() {
    let api = MockApi::new()
        .with_cluster(cluster_data("c-123"))
        .with_load_barrier();
    let mut state = fresh_state();

    // Both loads wait on a two-party barrier, so this only completes when
    // they are in flight together.
    let outcome = tokio::time::timeout(
        Duration::from_secs(5),
        evaluate(&api, "/c/c-123/explorer", None, &mut state),
    )
    .await
    .expect("management and cluster loads were not concurrent");

    assert_eq!(outcome, GateOutcome::Ready);
    assert!(api.called("management"));
    assert!(api.called("cluster:c-123"));
    assert_eq!(state.current_cluster.as_deref(), Some("c-123"));
    assert!(state.management.is_some());
}

#[tokio::test]
async fn no_route_cluster_loads_default_cluster() {
    let api = MockApi::new();
    let mut state = fresh_state();

    assert_eq!(evaluate(&api, "/", None, &mut state).await, GateOutcome::Ready);
    let loads: Vec<String> = api
        .calls()
        .into_iter()
        .filter(|c| c == "management" || c.starts_with("cluster:"))
        .collect();
    assert_eq!(loads, vec!["management".to_owned(), "cluster:local".to_owned()]);
    assert_eq!(state.current_cluster.as_deref(), Some("local"));
}

#[tokio::test]
async fn no_default_cluster_skips_cluster_load() {
    let api = MockApi::new().with_management(Ok(ManagementData {
        clusters: vec![ClusterSummary { id: "c-down".into(), display_name: "down".into(), ready: false }],
    }));
    let mut state = fresh_state();

    assert_eq!(evaluate(&api, "/", None, &mut state).await, GateOutcome::Ready);
    assert!(api.called("management"));
    assert!(!api.called("cluster:"));
    assert!(state.current_cluster.is_none());
}

#[tokio::test]
async fn unknown_cluster_redirects_to_cluster_list() {
    let api = MockApi::new();
    let mut state = fresh_state();

    let outcome = evaluate(&api, "/c/c-missing/explorer", None, &mut state).await;
    assert_eq!(outcome.redirect_target(), Some(RedirectTarget::Clusters));
    assert!(state.error.is_none());
}

#[tokio::test]
async fn load_failure_records_error_and_redirects_to_fail_whale() {
    let api = MockApi::new().with_cluster_error(ApiError::Response { status: 503, body: "unavailable".into() });
    let mut state = fresh_state();

    let outcome = evaluate(&api, "/c/local/explorer", None, &mut state).await;
    assert_eq!(outcome.redirect_target(), Some(RedirectTarget::FailWhale));
    assert_eq!(state.error.as_ref().map(|e| e.code), Some("E_API_RESPONSE"));
}

#[tokio::test]
async fn management_failure_redirects_to_fail_whale() {
    let api = MockApi::new().with_management(Err(ApiError::Parse("bad json".into())));
    let mut state = fresh_state();

    let outcome = evaluate(&api, "/", None, &mut state).await;
    assert_eq!(outcome.redirect_target(), Some(RedirectTarget::FailWhale));
    assert!(!api.called("cluster:"));
    assert!(state.error.is_some());
}

#[test]
fn stage_names() {
    assert_eq!(Stage::CheckingFirstLogin.as_str(), "checking-first-login");
    assert_eq!(Stage::LoadingClusterData.as_str(), "loading-cluster-data");
}
