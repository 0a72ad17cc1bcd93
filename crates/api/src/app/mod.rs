//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: storage and service construction
//! - `routes/`: HTTP routes + handlers (one file per entity)
//! - `dto.rs`: request DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;
use std::time::Duration;

use axum::{BoxError, Extension, Router, error_handling::HandleErrorLayer, http::StatusCode, routing::get};
use tower::ServiceBuilder;

use crate::config::ApiConfig;
use crate::middleware;
use crate::token::Hs256JwtValidator;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(config: &ApiConfig) -> Router {
    build_app_with(config, Arc::new(services::build_services()))
}

/// Same router, over caller-provided services.
pub fn build_app_with(config: &ApiConfig, services: Arc<services::AppServices>) -> Router {
    let jwt = Arc::new(Hs256JwtValidator::new(config.jwt_secret.as_bytes()));
    let auth_state = middleware::AuthState {
        jwt,
        services: services.clone(),
    };

    // Protected routes: require a verified principal.
    let protected = routes::router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(auth_state, middleware::auth_middleware));

    let app = Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected);

    with_request_timeout(app, config.request_timeout)
}

/// Abort handlers that run longer than `timeout` with `408`.
fn with_request_timeout(router: Router, timeout: Duration) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(handle_middleware_error))
            .timeout(timeout),
    )
}

async fn handle_middleware_error(err: BoxError) -> axum::response::Response {
    if err.is::<tower::timeout::error::Elapsed>() {
        tracing::warn!("request timed out");
        return errors::json_error(StatusCode::REQUEST_TIMEOUT, "timeout", "request timed out");
    }
    tracing::error!(error = %err, "middleware failure");
    errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal error")
}
