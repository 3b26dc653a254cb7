//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{header::CONTENT_TYPE, Method},
    routing::get,
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::domains::expiration::ExpirationFormBinding;
use crate::kernel::ServerDeps;
use crate::server::routes::{get_expiration_handler, health_handler, save_expiration_handler};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub server_deps: Arc<ServerDeps>,
    pub forms: ExpirationFormBinding,
}

impl AppState {
    pub fn new(server_deps: Arc<ServerDeps>) -> Self {
        let forms = server_deps.form_binding();
        Self { server_deps, forms }
    }
}

pub fn build_app(server_deps: Arc<ServerDeps>) -> Router {
    let app_state = AppState::new(server_deps);

    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/posts/:id/expiration",
            get(get_expiration_handler).post(save_expiration_handler),
        )
        .layer(Extension(app_state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
