//! Per-request route gate. Classifies the path, resolves the session and
//! either admits the request (attaching the principal and tenant binding
//! to request extensions) or answers with a redirect. API paths are always
//! admitted; their handlers answer 401/403 themselves so clients get JSON
//! instead of a redirect chain.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};

use crate::app::AppState;
use crate::session::{self, Principal};

pub const LOGIN_PATH: &str = "/login";
pub const ONBOARDING_PATH: &str = "/onboarding";
pub const TENANT_HOME_PATH: &str = "/dashboard";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Admitted unconditionally, session never resolved.
    Public,
    /// Login and registration pages.
    Auth,
    /// The onboarding flow, reachable only while no tenant is bound.
    Onboarding,
    /// Tenant-scoped pages, the default for anything unclassified.
    Protected,
    /// Programmatic surface; admitted with the principal attached.
    Api,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Admit,
    Redirect(&'static str),
}

const ASSET_EXTENSIONS: &[&str] = &[".svg", ".png", ".jpg", ".jpeg", ".gif", ".webp", ".ico"];

fn is_asset(path: &str) -> bool {
    ASSET_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Prefix match on whole path segments, so `/visit` covers `/visit/x`
/// but not `/visiting`.
fn has_prefix(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

pub fn classify(path: &str) -> RouteClass {
    if path == "/" || is_asset(path) {
        return RouteClass::Public;
    }
    if has_prefix(path, "/health") || has_prefix(path, "/visit") || has_prefix(path, "/auth") {
        return RouteClass::Public;
    }
    if has_prefix(path, LOGIN_PATH) || has_prefix(path, "/register") {
        return RouteClass::Auth;
    }
    if has_prefix(path, ONBOARDING_PATH) {
        return RouteClass::Onboarding;
    }
    if has_prefix(path, "/api") {
        return RouteClass::Api;
    }
    RouteClass::Protected
}

/// The gate's state machine. Pure so the whole table is testable without
/// a server.
pub fn decide(class: RouteClass, principal: &Principal) -> GateDecision {
    let bound = principal.binding().is_some();
    match class {
        RouteClass::Public | RouteClass::Api => GateDecision::Admit,
        RouteClass::Auth => {
            if principal.is_authenticated() {
                GateDecision::Redirect(TENANT_HOME_PATH)
            } else {
                GateDecision::Admit
            }
        }
        RouteClass::Onboarding => {
            if !principal.is_authenticated() {
                GateDecision::Redirect(LOGIN_PATH)
            } else if bound {
                GateDecision::Redirect(TENANT_HOME_PATH)
            } else {
                GateDecision::Admit
            }
        }
        RouteClass::Protected => {
            if !principal.is_authenticated() {
                GateDecision::Redirect(LOGIN_PATH)
            } else if !bound {
                GateDecision::Redirect(ONBOARDING_PATH)
            } else {
                GateDecision::Admit
            }
        }
    }
}

pub async fn gate_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let class = classify(request.uri().path());
    if class == RouteClass::Public {
        return next.run(request).await;
    }

    let token = session::token_from_headers(request.headers());
    let principal = session::resolve(state.store.as_ref(), token.as_deref()).await;

    match decide(class, &principal) {
        GateDecision::Redirect(to) => Redirect::temporary(to).into_response(),
        GateDecision::Admit => {
            if let Some(binding) = principal.binding().copied() {
                request.extensions_mut().insert(binding);
            }
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
    }
}
