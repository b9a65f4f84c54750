//! # secunda-api: Axum API for the Organization Directory
//!
//! HTTP surface over [`secunda_core`]: CRUD for activities, buildings and
//! organizations, plus the organization lookups (activity subtree search,
//! predicate filter, radius and box).
//!
//! ## API Surface
//!
//! | Prefix                        | Module                      | Auth |
//! |-------------------------------|-----------------------------|------|
//! | `/api/v1/activities/*`        | [`routes::activities`]      | yes  |
//! | `/api/v1/buildings/*`         | [`routes::buildings`]       | yes  |
//! | `/api/v1/organizations/*`     | [`routes::organizations`]   | yes  |
//! | `/health/*`                   | health checks               | no   |
//! | `/openapi.json`               | [`openapi`]                 | no   |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! CORS → TraceLayer → AuthMiddleware (/api/v1 only) → Handler
//! ```

pub mod auth;
pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod seed;
pub mod services;
pub mod state;

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::routing::get;
use axum::Router;

use crate::auth::AuthConfig;
use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
///
/// Health checks and the OpenAPI document are mounted outside the auth
/// middleware so they remain accessible without credentials.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        api_key: state.config.api_key.clone(),
    };

    let api = routes::router()
        .layer(from_fn(auth::auth_middleware))
        .layer(axum::Extension(auth_config));

    let health = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness));

    let cors = middleware::cors::layer(&state.config.cors_origins);

    Router::new()
        .nest("/api/v1", api)
        .merge(health)
        .merge(openapi::router())
        .layer(middleware::tracing_layer::layer())
        .layer(cors)
        .with_state(state)
}

/// Liveness check: always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness check: 200 when the store answers, 503 otherwise.
async fn readiness(State(state): State<AppState>) -> (StatusCode, &'static str) {
    match state.db.ping().await {
        Ok(()) => (StatusCode::OK, "ready"),
        Err(err) => {
            tracing::warn!(
                backend = state.db.backend_name(),
                error = %err,
                "readiness check failed"
            );
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    }
}
