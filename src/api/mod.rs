mod handlers;
pub mod middleware;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::db::Database;
use middleware::{auth_middleware, SecurityConfig};

/// Router with authentication disabled, for local use and tests.
pub fn create_router(db: Database) -> Router {
    create_router_with_security(db, SecurityConfig::disabled())
}

pub fn create_router_with_security(db: Database, security: SecurityConfig) -> Router {
    let protected = Router::new()
        // Concepts
        .route(
            "/concepts",
            get(handlers::list_concepts).post(handlers::create_concept),
        )
        // Calendar
        .route("/calendar", get(handlers::calendar))
        // Days
        .route(
            "/days/{year}/{month}/{day}",
            get(handlers::get_day).put(handlers::update_day),
        )
        .route("/days/{year}/{month}/{day}/slots", post(handlers::save_slots))
        .route_layer(from_fn_with_state(security.clone(), auth_middleware));

    // Health stays reachable without a key.
    let api = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected);

    Router::new()
        .nest("/api/v1", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(security.cors_layer()),
        )
        .with_state(db)
}
