//! Navigation targets and redirects.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every page request is resolved to a `Route` (name, params, query) before
//! it reaches the gate; the gate answers with a `Redirect` to one of the
//! fixed console pages when navigation cannot continue.

use std::borrow::Cow;
use std::collections::BTreeMap;

/// Query parameter carrying an initial admin password.
pub const SETUP: &str = "setup";
/// Query flag telling the login page the session timed out.
pub const TIMED_OUT: &str = "timed-out";
/// Query parameter carrying an error message for the login page.
pub const ERR: &str = "err";

pub const INDEX: &str = "index";

// =============================================================================
// ROUTE
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Route {
    pub path: String,
    pub name: String,
    pub params: BTreeMap<String, String>,
    pub query: BTreeMap<String, String>,
}

impl Route {
    /// Resolve a request path and raw query string. `is_product` tells which
    /// path segments under `/c/<cluster>/` name a product with its own pages.
    #[must_use]
    pub fn resolve(path: &str, query: Option<&str>, is_product: impl Fn(&str) -> bool) -> Self {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = BTreeMap::new();

        let name = match segments.as_slice() {
            [] => INDEX.to_owned(),
            ["auth", "login"] => "auth-login".to_owned(),
            ["auth", "setup"] => "auth-setup".to_owned(),
            ["c", cluster] => {
                params.insert("cluster".to_owned(), (*cluster).to_owned());
                "c-cluster".to_owned()
            }
            ["c", cluster, product] => {
                params.insert("cluster".to_owned(), (*cluster).to_owned());
                params.insert("product".to_owned(), (*product).to_owned());
                "c-cluster-product".to_owned()
            }
            ["c", cluster, product, rest @ ..] if is_product(product) => {
                params.insert("cluster".to_owned(), (*cluster).to_owned());
                format!("c-cluster-{product}-{}", rest.join("-"))
            }
            ["c", cluster, product, resource, rest @ ..] => {
                params.insert("cluster".to_owned(), (*cluster).to_owned());
                params.insert("product".to_owned(), (*product).to_owned());
                params.insert("resource".to_owned(), (*resource).to_owned());
                match rest.first() {
                    Some(id) => {
                        params.insert("id".to_owned(), (*id).to_owned());
                        "c-cluster-product-resource-id".to_owned()
                    }
                    None => "c-cluster-product-resource".to_owned(),
                }
            }
            other => other.join("-"),
        };

        Self { path: path.to_owned(), name, params, query: parse_query(query) }
    }

    /// Non-empty route parameter.
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Non-empty query value.
    #[must_use]
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

fn parse_query(raw: Option<&str>) -> BTreeMap<String, String> {
    raw.unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode(key), decode(value))
        })
        .collect()
}

fn decode(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| spaced.clone())
}

// =============================================================================
// REDIRECT
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectTarget {
    AuthSetup,
    AuthLogin,
    Clusters,
    FailWhale,
}

impl RedirectTarget {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::AuthSetup => "auth-setup",
            Self::AuthLogin => "auth-login",
            Self::Clusters => "clusters",
            Self::FailWhale => "fail-whale",
        }
    }

    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::AuthSetup => "/auth/setup",
            Self::AuthLogin => "/auth/login",
            Self::Clusters => "/clusters",
            Self::FailWhale => "/fail-whale",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub target: RedirectTarget,
    /// Query entries in order; `None` renders a bare flag.
    pub query: Vec<(String, Option<String>)>,
    /// Upstream `Set-Cookie` values to hand to the browser with the redirect.
    pub set_cookies: Vec<String>,
}

impl Redirect {
    #[must_use]
    pub fn to(target: RedirectTarget) -> Self {
        Self { target, query: Vec::new(), set_cookies: Vec::new() }
    }

    /// Setup page, forwarding the initial password when one was given.
    #[must_use]
    pub fn setup(password: Option<&str>) -> Self {
        let mut redirect = Self::to(RedirectTarget::AuthSetup);
        if let Some(password) = password {
            redirect
                .query
                .push((SETUP.to_owned(), Some(password.to_owned())));
        }
        redirect
    }

    #[must_use]
    pub fn login(timed_out: bool) -> Self {
        let mut redirect = Self::to(RedirectTarget::AuthLogin);
        if timed_out {
            redirect.query.push((TIMED_OUT.to_owned(), None));
        }
        redirect
    }

    #[must_use]
    pub fn login_error(message: &str) -> Self {
        let mut redirect = Self::to(RedirectTarget::AuthLogin);
        redirect
            .query
            .push((ERR.to_owned(), Some(message.to_owned())));
        redirect
    }

    #[must_use]
    pub fn with_cookies(mut self, set_cookies: Vec<String>) -> Self {
        self.set_cookies = set_cookies;
        self
    }

    #[must_use]
    pub fn has_query(&self, key: &str) -> bool {
        self.query.iter().any(|(k, _)| k == key)
    }

    #[must_use]
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    /// Path plus percent-encoded query string.
    #[must_use]
    pub fn location(&self) -> String {
        let mut location = self.target.path().to_owned();
        for (i, (key, value)) in self.query.iter().enumerate() {
            location.push(if i == 0 { '?' } else { '&' });
            location.push_str(&urlencoding::encode(key));
            if let Some(value) = value {
                location.push('=');
                location.push_str(&urlencoding::encode(value));
            }
        }
        location
    }
}

#[cfg(test)]
#[path = "route_test.rs"]
mod tests;
