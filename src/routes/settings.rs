//! Server setting routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use crate::api::{ApiError, Setting};
use crate::routes::navigate::upstream_cookies;
use crate::settings::{self, SettingError};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SettingValueBody {
    pub value: String,
}

/// `PUT /api/settings/:id` — validate and assign an editable setting.
pub async fn update_setting(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<String>,
    Json(body): Json<SettingValueBody>,
) -> Result<Json<Setting>, StatusCode> {
    settings::validate_setting_value(&id, &body.value).map_err(setting_error_to_status)?;

    let api = state.api.connect(upstream_cookies(&jar).as_deref());
    let saved = settings::set_setting(api.as_ref(), &id, &body.value)
        .await
        .map_err(|e| setting_error_to_status(e.into()))?;
    tracing::info!(setting = %id, "setting updated");
    Ok(Json(saved))
}

/// `POST /api/settings/:id` — fetch a setting, creating it with `value` as its
/// default when it does not exist.
pub async fn ensure_setting(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<String>,
    Json(body): Json<SettingValueBody>,
) -> Result<Json<Setting>, StatusCode> {
    let api = state.api.connect(upstream_cookies(&jar).as_deref());
    let setting = settings::fetch_or_create_setting(api.as_ref(), &id, &body.value, true)
        .await
        .map_err(|e| setting_error_to_status(e.into()))?;
    Ok(Json(setting))
}

pub(crate) fn setting_error_to_status(err: SettingError) -> StatusCode {
    match err {
        SettingError::NotEditable(_) | SettingError::ReadOnly(_) => StatusCode::FORBIDDEN,
        SettingError::InvalidValue { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        SettingError::Api(ApiError::Unauthorized) => StatusCode::UNAUTHORIZED,
        SettingError::Api(ApiError::NotFound) => StatusCode::NOT_FOUND,
        SettingError::Api(e) => {
            tracing::warn!(error = %e, "setting write failed upstream");
            StatusCode::BAD_GATEWAY
        }
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
