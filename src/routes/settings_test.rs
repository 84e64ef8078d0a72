use super::*;
use crate::api::test_helpers::{MockApi, setting};
use crate::settings::{BRAND, CA_CERTS, FIRST_LOGIN, TELEMETRY};
use crate::state::test_helpers::test_app_state;

fn body(value: &str) -> Json<SettingValueBody> {
    Json(SettingValueBody { value: value.to_owned() })
}

#[test]
fn setting_error_to_status_maps_variants() {
    assert_eq!(setting_error_to_status(SettingError::ReadOnly("cacerts".into())), StatusCode::FORBIDDEN);
    assert_eq!(
        setting_error_to_status(SettingError::InvalidValue { id: "x".into(), reason: "y".into() }),
        StatusCode::UNPROCESSABLE_ENTITY
    );
    assert_eq!(setting_error_to_status(ApiError::Unauthorized.into()), StatusCode::UNAUTHORIZED);
    assert_eq!(
        setting_error_to_status(ApiError::Request("refused".into()).into()),
        StatusCode::BAD_GATEWAY
    );
}

#[tokio::test]
async fn update_writes_valid_value() {
    let (state, connector) = test_app_state(MockApi::new().with_stored_setting(setting(TELEMETRY, "prompt")));

    let Json(saved) = update_setting(State(state), CookieJar::new(), Path(TELEMETRY.to_owned()), body("out"))
        .await
        .unwrap();
    assert_eq!(saved.value, "out");
    assert_eq!(connector.api.stored(TELEMETRY).map(|s| s.value), Some("out".into()));
}

#[tokio::test]
async fn update_rejects_before_calling_upstream() {
    let (state, connector) = test_app_state(MockApi::new());

    let invalid = update_setting(State(state.clone()), CookieJar::new(), Path(TELEMETRY.to_owned()), body("maybe")).await;
    assert_eq!(invalid.unwrap_err(), StatusCode::UNPROCESSABLE_ENTITY);

    let read_only = update_setting(State(state.clone()), CookieJar::new(), Path(CA_CERTS.to_owned()), body("pem")).await;
    assert_eq!(read_only.unwrap_err(), StatusCode::FORBIDDEN);

    let not_editable = update_setting(State(state), CookieJar::new(), Path(FIRST_LOGIN.to_owned()), body("true")).await;
    assert_eq!(not_editable.unwrap_err(), StatusCode::FORBIDDEN);

    assert!(connector.api.calls().is_empty());
}

#[tokio::test]
async fn ensure_creates_missing_setting() {
    let (state, connector) = test_app_state(MockApi::new());

    let Json(created) = ensure_setting(State(state), CookieJar::new(), Path(BRAND.to_owned()), body("suse"))
        .await
        .unwrap();
    assert_eq!(created.default, "suse");
    assert!(connector.api.called("create_setting:ui-brand"));
}
