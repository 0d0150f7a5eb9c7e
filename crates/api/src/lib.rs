//! HTTP API layer for followers-rs.
//!
//! This crate provides the REST API:
//!
//! - **Endpoints**: follow edges under `/followers/`, profiles under `/profiles/`
//! - **Extractors**: Authentication, validated JSON bodies
//! - **Middleware**: Bearer token authentication
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

use axum::{Router, extract::DefaultBodyLimit};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub use endpoints::router;
pub use middleware::AppState;

/// Maximum accepted request body size.
pub const BODY_LIMIT: usize = 64 * 1024;

/// Build the full application: API routes plus the middleware stack.
pub fn app(state: AppState) -> Router {
    router()
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                )
                .layer(DefaultBodyLimit::max(BODY_LIMIT)),
        )
        .with_state(state)
}
