pub mod middleware;
pub mod protocol;
pub mod rest;
pub mod state;

pub use rest::{agent_handler, copilot_handler, health_handler, update_content_handler};

use axum::{
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::web::state::AppState;

/// Builds the complete HTTP application: API routes, the OpenAPI document,
/// request tracing and, when configured, CORS.
pub fn router(app_state: Arc<AppState>) -> Router {
    let cors_origin = app_state.config.cors_origin.clone();

    let api_router = Router::new()
        .route("/copilot", post(copilot_handler))
        .route("/agent", post(agent_handler))
        .route("/update_content", post(update_content_handler))
        .route("/health", get(health_handler))
        .with_state(app_state);

    let mut app = Router::new().merge(api_router).merge(docs_router());

    if let Some(origin) = cors_origin {
        match origin.parse::<HeaderValue>() {
            Ok(origin) => {
                app = app.layer(
                    CorsLayer::new()
                        .allow_origin(origin)
                        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                        .allow_headers([CONTENT_TYPE, ACCEPT]),
                );
            }
            Err(e) => warn!("Ignoring invalid CORS_ORIGIN '{}': {}", origin, e),
        }
    }

    app.layer(axum_middleware::from_fn(middleware::trace_requests))
}

#[cfg(feature = "swagger-ui")]
fn docs_router() -> Router {
    use utoipa::OpenApi;
    use utoipa_swagger_ui::SwaggerUi;

    Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", rest::ApiDoc::openapi()))
}

#[cfg(not(feature = "swagger-ui"))]
fn docs_router() -> Router {
    Router::new().route("/api-docs/openapi.json", get(rest::openapi_handler))
}

#[cfg(test)]
mod tests;
