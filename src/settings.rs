//! Server setting ids, the editable-settings table, and write helpers.
//!
//! DESIGN
//! ======
//! Setting ids are plain string constants matching upstream resource names.
//! `ALLOWED_SETTINGS` lists the settings the console lets an operator edit and
//! the kind of value each takes; `validate_setting_value` enforces it before
//! `set_setting` writes upstream.

use crate::api::{ApiError, ConsoleApi, Setting};

// =============================================================================
// SETTING IDS
// =============================================================================

pub const VERSION_RANCHER: &str = "server-version";
pub const VERSION_CLI: &str = "cli-version";
pub const VERSION_MACHINE: &str = "machine-version";
pub const VERSION_HELM: &str = "helm-version";
pub const CLI_URL_DARWIN: &str = "cli-url-darwin";
pub const CLI_URL_WINDOWS: &str = "cli-url-windows";
pub const CLI_URL_LINUX: &str = "cli-url-linux";
pub const CA_CERTS: &str = "cacerts";
pub const AUTH_TOKEN_MAX_TTL_MINUTES: &str = "auth-token-max-ttl-minutes";
pub const KUBECONFIG_GENERATE_TOKEN: &str = "kubeconfig-generate-token";
pub const KUBECONFIG_TOKEN_TTL_MINUTES: &str = "kubeconfig-token-ttl-minutes";
pub const ENGINE_URL: &str = "engine-install-url";
pub const ENGINE_ISO_URL: &str = "engine-iso-url";
pub const FIRST_LOGIN: &str = "first-login";
pub const INGRESS_IP_DOMAIN: &str = "ingress-ip-domain";
pub const SERVER_URL: &str = "server-url";
pub const RKE_METADATA_CONFIG: &str = "rke-metadata-config";
pub const TELEMETRY: &str = "telemetry-opt";
pub const EULA_AGREED: &str = "eula-agreed";
pub const AUTH_USER_INFO_MAX_AGE_SECONDS: &str = "auth-user-info-max-age-seconds";
pub const AUTH_USER_SESSION_TTL_MINUTES: &str = "auth-user-session-ttl-minutes";
pub const AUTH_USER_INFO_RESYNC_CRON: &str = "auth-user-info-resync-cron";
pub const AUTH_LOCAL_VALIDATE_DESC: &str = "auth-password-requirements-description";
pub const CLUSTER_TEMPLATE_ENFORCEMENT: &str = "cluster-template-enforcement";
pub const UI_INDEX: &str = "ui-index";
pub const UI_DASHBOARD_INDEX: &str = "ui-dashboard-index";
pub const UI_OFFLINE_PREFERRED: &str = "ui-offline-preferred";
pub const SYSTEM_DEFAULT_REGISTRY: &str = "system-default-registry";
pub const UI_ISSUES: &str = "ui-issues";
pub const PL: &str = "ui-pl";
pub const PL_RANCHER_VALUE: &str = "rancher";
pub const SUPPORTED: &str = "has-support";
pub const BANNERS: &str = "ui-banners";
pub const BRAND: &str = "ui-brand";
pub const LOGO_LIGHT: &str = "ui-logo-light";
pub const LOGO_DARK: &str = "ui-logo-dark";
pub const PRIMARY_COLOR: &str = "ui-primary-color";

// =============================================================================
// EDITABLE SETTINGS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKind {
    Plain,
    Multiline,
    Boolean,
    Url,
    Json,
    Enum(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllowedSetting {
    pub kind: SettingKind,
    pub read_only: bool,
}

const fn editable(kind: SettingKind) -> AllowedSetting {
    AllowedSetting { kind, read_only: false }
}

pub const ALLOWED_SETTINGS: &[(&str, AllowedSetting)] = &[
    (CA_CERTS, AllowedSetting { kind: SettingKind::Multiline, read_only: true }),
    (ENGINE_URL, editable(SettingKind::Plain)),
    (ENGINE_ISO_URL, editable(SettingKind::Plain)),
    (INGRESS_IP_DOMAIN, editable(SettingKind::Plain)),
    (AUTH_USER_INFO_MAX_AGE_SECONDS, editable(SettingKind::Plain)),
    (AUTH_USER_SESSION_TTL_MINUTES, editable(SettingKind::Plain)),
    (AUTH_TOKEN_MAX_TTL_MINUTES, editable(SettingKind::Plain)),
    (KUBECONFIG_GENERATE_TOKEN, editable(SettingKind::Boolean)),
    (KUBECONFIG_TOKEN_TTL_MINUTES, editable(SettingKind::Plain)),
    (AUTH_USER_INFO_RESYNC_CRON, editable(SettingKind::Plain)),
    (SERVER_URL, editable(SettingKind::Url)),
    (RKE_METADATA_CONFIG, editable(SettingKind::Json)),
    (SYSTEM_DEFAULT_REGISTRY, editable(SettingKind::Plain)),
    (UI_INDEX, editable(SettingKind::Plain)),
    (UI_DASHBOARD_INDEX, editable(SettingKind::Plain)),
    (UI_OFFLINE_PREFERRED, editable(SettingKind::Enum(&["dynamic", "true", "false"]))),
    (BRAND, editable(SettingKind::Plain)),
    (CLUSTER_TEMPLATE_ENFORCEMENT, editable(SettingKind::Boolean)),
    (TELEMETRY, editable(SettingKind::Enum(&["prompt", "in", "out"]))),
];

#[must_use]
pub fn allowed_setting(id: &str) -> Option<AllowedSetting> {
    ALLOWED_SETTINGS
        .iter()
        .find(|(allowed, _)| *allowed == id)
        .map(|(_, meta)| *meta)
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SettingError {
    #[error("setting {0} is not editable")]
    NotEditable(String),
    #[error("setting {0} is read-only")]
    ReadOnly(String),
    #[error("invalid value for {id}: {reason}")]
    InvalidValue { id: String, reason: String },
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Check `value` against the editable-settings table.
///
/// # Errors
///
/// Returns an error when the setting is not editable, is read-only, or the
/// value does not fit the setting's kind.
pub fn validate_setting_value(id: &str, value: &str) -> Result<(), SettingError> {
    let meta = allowed_setting(id).ok_or_else(|| SettingError::NotEditable(id.to_owned()))?;
    if meta.read_only {
        return Err(SettingError::ReadOnly(id.to_owned()));
    }

    let invalid = |reason: String| SettingError::InvalidValue { id: id.to_owned(), reason };
    match meta.kind {
        SettingKind::Plain | SettingKind::Multiline => Ok(()),
        SettingKind::Boolean => match value {
            "true" | "false" => Ok(()),
            _ => Err(invalid("expected true or false".into())),
        },
        SettingKind::Url => {
            if value.is_empty() || value.starts_with("http://") || value.starts_with("https://") {
                Ok(())
            } else {
                Err(invalid("expected an http(s) URL".into()))
            }
        }
        SettingKind::Json => {
            if value.is_empty() {
                return Ok(());
            }
            serde_json::from_str::<serde_json::Value>(value)
                .map(|_| ())
                .map_err(|e| invalid(e.to_string()))
        }
        SettingKind::Enum(options) => {
            if options.contains(&value) {
                Ok(())
            } else {
                Err(invalid(format!("expected one of {}", options.join(", "))))
            }
        }
    }
}

// =============================================================================
// FETCH / CREATE / SET
// =============================================================================

/// Fetch a setting, or build it with `value` as both value and default when
/// the lookup fails. A built setting is persisted when `save` is set.
///
/// # Errors
///
/// Returns an error only when persisting a newly built setting fails.
pub async fn fetch_or_create_setting(
    api: &dyn ConsoleApi,
    id: &str,
    value: &str,
    save: bool,
) -> Result<Setting, ApiError> {
    let (setting, existing) = find_or_build(api, id, value).await;
    if existing || !save {
        return Ok(setting);
    }
    api.create_setting(&setting).await
}

/// Assign `value` to a setting, creating it upstream when missing.
///
/// # Errors
///
/// Returns an error when the upstream write fails.
pub async fn set_setting(api: &dyn ConsoleApi, id: &str, value: &str) -> Result<Setting, ApiError> {
    let (mut setting, existing) = find_or_build(api, id, value).await;
    setting.value = value.to_owned();
    if existing {
        api.save_setting(&setting).await
    } else {
        api.create_setting(&setting).await
    }
}

async fn find_or_build(api: &dyn ConsoleApi, id: &str, value: &str) -> (Setting, bool) {
    match api.find_setting(id).await {
        Ok(setting) => (setting, true),
        Err(e) => {
            tracing::debug!(setting = id, error = %e, "setting lookup failed, building a new one");
            (Setting { id: id.to_owned(), value: value.to_owned(), default: value.to_owned() }, false)
        }
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
