//! Console configuration parsed from environment variables.

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_FEATURES: &str = "legacy";
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 3600;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required env var {var}")]
    Missing { var: &'static str },
    #[error("invalid value for {var}: {value}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for ApiTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Base URL of the upstream cluster-management API.
    pub api_url: String,
    pub port: u16,
    pub timeouts: ApiTimeouts,
    /// Enabled feature flags; products gated on other features stay hidden.
    pub features: Vec<String>,
    /// Cluster to land on when a route names none.
    pub preferred_cluster: Option<String>,
    pub cookie_secure: bool,
    /// Visitor sessions unused for this long are dropped.
    pub session_idle_secs: u64,
}

impl ConsoleConfig {
    /// Build typed config from environment variables.
    ///
    /// Required:
    /// - `CONSOLE_API_URL`
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `CONSOLE_REQUEST_TIMEOUT_SECS`: default 30
    /// - `CONSOLE_CONNECT_TIMEOUT_SECS`: default 10
    /// - `CONSOLE_FEATURES`: comma-separated, default `legacy`
    /// - `CONSOLE_PREFERRED_CLUSTER`
    /// - `COOKIE_SECURE`: defaults to whether `CONSOLE_API_URL` is https
    /// - `CONSOLE_SESSION_IDLE_SECS`: default 3600
    ///
    /// # Errors
    ///
    /// Returns an error if the API URL is missing or a value fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// See [`ConsoleConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = lookup("CONSOLE_API_URL")
            .map(|v| v.trim().trim_end_matches('/').to_owned())
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing { var: "CONSOLE_API_URL" })?;
        if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
            return Err(ConfigError::Invalid { var: "CONSOLE_API_URL", value: api_url });
        }

        let port = parse_or("PORT", lookup("PORT"), DEFAULT_PORT)?;
        let timeouts = ApiTimeouts {
            request_secs: parse_or(
                "CONSOLE_REQUEST_TIMEOUT_SECS",
                lookup("CONSOLE_REQUEST_TIMEOUT_SECS"),
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?,
            connect_secs: parse_or(
                "CONSOLE_CONNECT_TIMEOUT_SECS",
                lookup("CONSOLE_CONNECT_TIMEOUT_SECS"),
                DEFAULT_CONNECT_TIMEOUT_SECS,
            )?,
        };
        let features = parse_features(lookup("CONSOLE_FEATURES").as_deref());
        let preferred_cluster = lookup("CONSOLE_PREFERRED_CLUSTER")
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty());
        let cookie_secure = match lookup("COOKIE_SECURE") {
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::Invalid { var: "COOKIE_SECURE", value: raw })?,
            None => api_url.starts_with("https://"),
        };

        let session_idle_secs = parse_or(
            "CONSOLE_SESSION_IDLE_SECS",
            lookup("CONSOLE_SESSION_IDLE_SECS"),
            DEFAULT_SESSION_IDLE_SECS,
        )?;

        Ok(Self { api_url, port, timeouts, features, preferred_cluster, cookie_secure, session_idle_secs })
    }
}

fn parse_or<T: std::str::FromStr>(var: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub(crate) fn parse_features(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or(DEFAULT_FEATURES)
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
