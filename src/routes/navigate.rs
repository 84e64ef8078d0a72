//! Navigation handler — resolves the page route and runs the gate.
//!
//! DESIGN
//! ======
//! Visitors are keyed by the `console_session` cookie. Every other cookie the
//! browser sent is forwarded to the upstream API, so upstream auth follows the
//! visitor. The visitor's state lock is held for the whole evaluation.
//!
//! Ungated pages never create a session or set the cookie; they answer with
//! the existing visitor's snapshot, or an empty one.

use axum::extract::State;
use axum::http::{HeaderValue, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Json, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use uuid::Uuid;

use crate::gate::{self, Gate, GateOutcome};
use crate::route::Route;
use crate::state::{AppState, ConsoleState};

pub(crate) const SESSION_COOKIE: &str = "console_session";

/// Visitor session id carried by the session cookie, if well-formed.
pub(crate) fn session_id(jar: &CookieJar) -> Option<Uuid> {
    jar.get(SESSION_COOKIE)
        .and_then(|c| Uuid::parse_str(c.value()).ok())
}

/// `Cookie` header value for the upstream: everything but the session cookie.
pub(crate) fn upstream_cookies(jar: &CookieJar) -> Option<String> {
    let joined = jar
        .iter()
        .filter(|c| c.name() != SESSION_COOKIE)
        .map(|c| format!("{}={}", c.name(), c.value()))
        .collect::<Vec<_>>()
        .join("; ");
    (!joined.is_empty()).then_some(joined)
}

fn session_cookie(id: Uuid, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

/// Fallback handler — any `GET` not claimed by another route.
pub async fn navigate(State(state): State<AppState>, method: Method, uri: Uri, jar: CookieJar) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let route = Route::resolve(uri.path(), uri.query(), |name| state.registry.contains(name));
    if gate::is_ungated(&route) {
        let snapshot = match state.existing_session(session_id(&jar)).await {
            Some(session) => session.lock().await.snapshot(),
            None => ConsoleState::default().snapshot(),
        };
        return Json(snapshot).into_response();
    }

    let (id, session) = state.session(session_id(&jar)).await;
    let api = state.api.connect(upstream_cookies(&jar).as_deref());

    let mut console = session.lock().await;
    let outcome = Gate::new(api.as_ref(), &state.registry, &state.tracker)
        .evaluate(&route, &mut console)
        .await;
    tracing::debug!(session = %id, path = %route.path, ?outcome, "navigation evaluated");

    let jar = jar.add(session_cookie(id, state.config.cookie_secure));
    (jar, outcome_response(&outcome, &console)).into_response()
}

pub(crate) fn outcome_response(outcome: &GateOutcome, console: &ConsoleState) -> Response {
    match outcome {
        GateOutcome::Redirect(redirect) => {
            let mut response = (StatusCode::FOUND, [(header::LOCATION, redirect.location())]).into_response();
            for cookie in &redirect.set_cookies {
                match HeaderValue::from_str(cookie) {
                    Ok(value) => {
                        response.headers_mut().append(header::SET_COOKIE, value);
                    }
                    Err(e) => tracing::warn!(error = %e, "dropping malformed upstream cookie"),
                }
            }
            response
        }
        GateOutcome::Ready | GateOutcome::Excluded => Json(console.snapshot()).into_response(),
        GateOutcome::Aborted => (StatusCode::INTERNAL_SERVER_ERROR, Json(console.snapshot())).into_response(),
    }
}

#[cfg(test)]
#[path = "navigate_test.rs"]
mod tests;
