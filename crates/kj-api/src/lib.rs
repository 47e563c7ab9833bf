//! # kj-api
//!
//! The HTTP routing and orchestration layer for kkojil.

pub mod error;
pub mod handlers;
pub mod middleware;

use std::time::Duration;

use axum::{
    routing::{get, post, put},
    Router,
};

pub use error::ApiError;
pub use handlers::AppState;

/// Builds the full router with tracing and CORS applied.
///
/// # Developer Note
/// Everything lives under `/api` except the health probe, so a front end can
/// be served from the same origin later without route clashes.
pub fn router(state: AppState, cors_max_age: Duration) -> Router {
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .nest("/api", api_routes())
        .layer(middleware::cors_policy(cors_max_age))
        .layer(middleware::standard_middleware())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ai-question", post(handlers::ai_question))
        .route(
            "/questions",
            get(handlers::list_questions).post(handlers::create_question),
        )
        .route("/questions/{id}", get(handlers::get_question))
        .route("/questions/{id}/chain", post(handlers::append_chain))
        .route("/trending", get(handlers::trending))
        .route("/categories", get(handlers::category_stats))
        .route("/recent", get(handlers::recent))
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route("/auth/logout", post(handlers::logout))
        .route("/auth/me", get(handlers::me))
        .route("/users/availability", get(handlers::username_availability))
        .route("/users/{username}", get(handlers::get_user))
        .route("/profile", put(handlers::update_profile))
}
