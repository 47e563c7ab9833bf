//! kkojil/crates/kj-api/src/middleware.rs Middleware
//!
//! Request tracing and CORS for the API.

use std::time::Duration;

use axum::http::{header::CONTENT_TYPE, Method};
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// One span per request, with method, URI, status and latency.
pub fn standard_middleware() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
    TraceLayer::new_for_http()
}

// Any origin may call the API; it carries no credentials.
pub fn cors_policy(max_age: Duration) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(max_age)
}
