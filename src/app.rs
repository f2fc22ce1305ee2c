use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::gate;
use crate::handlers::{auth, church, onboarding, people, public};
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

/// Builds the full router. The gate middleware wraps everything,
/// including the fallback, so even unrouted paths get classified and
/// redirected before they 404.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .merge(public_routes())
        .merge(page_routes())
        .merge(api_routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            gate::gate_middleware,
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route(
            "/visit/:slug",
            get(public::visit_info).post(public::register_visit),
        )
}

fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(church::tenant_home))
        .route("/onboarding", get(onboarding::status))
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/onboarding", post(onboarding::submit))
        .route("/api/auth/whoami", get(auth::whoami))
        .route(
            "/api/church",
            get(church::get_church).put(church::update_church),
        )
        .route("/api/ministries", get(church::list_ministries))
        .route(
            "/api/members",
            get(people::list_members).post(people::create_member),
        )
        .route(
            "/api/visitors",
            get(people::list_visitors).post(people::create_visitor),
        )
        .route(
            "/api/visitors/:id",
            get(people::get_visitor).put(people::set_visitor_status),
        )
        .route("/api/visitors/:id/notes", post(people::add_follow_up_note))
}
