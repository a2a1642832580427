//! HTTP service boundary
//!
//! A thin axum layer over [`Orchestrator`]: one enhance endpoint, a
//! liveness probe, an index and the OpenAPI document.

use crate::{Orchestrator, Result};
use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod auth;
pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router
///
/// # Routes
///
/// - `POST /enhance-script/` (and `/enhance-script`) - Enhance and voice a script
/// - `GET /health` - Liveness probe
/// - `GET /` - Service name and endpoint index
/// - `GET /openapi.json` - OpenAPI specification
/// - `GET /swagger-ui` - Interactive documentation (if enabled)
pub fn create_router(orchestrator: Arc<Orchestrator>) -> Router {
    let api = orchestrator.config().api.clone();
    let state = AppState::new(orchestrator);

    let router = Router::new()
        .route("/enhance-script/", post(routes::enhance_script))
        .route("/enhance-script", post(routes::enhance_script))
        .route("/health", get(routes::health_check))
        .route("/", get(routes::index))
        .route("/openapi.json", get(routes::openapi_spec));

    // Swagger UI serves its own copy of the document so it cannot collide with /openapi.json
    let router = if api.swagger_ui {
        router.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
    } else {
        router
    };

    let router = router.with_state(state);

    let router = match api.api_key {
        Some(key) => router.layer(middleware::from_fn_with_state(
            Some(key.expose().to_string()),
            auth::require_api_key,
        )),
        None => router,
    };

    let router = router.layer(TraceLayer::new_for_http());

    if api.cors_enabled {
        router.layer(build_cors_layer(&api.cors_origins))
    } else {
        router
    }
}

/// Build a CORS layer; `"*"` or an empty list allows any origin
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.is_empty() || origins.iter().any(|o| o == "*");

    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if allow_any {
        layer.allow_origin(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        layer.allow_origin(AllowOrigin::list(allowed))
    }
}

/// Serve the API on the configured bind address until `shutdown` resolves
///
/// In-flight requests are allowed to finish after `shutdown` resolves.
///
/// # Example
///
/// ```no_run
/// use script_voice_relay::{Config, Orchestrator};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let orchestrator = Arc::new(Orchestrator::new(Config::from_env()?)?);
/// script_voice_relay::api::start_api_server(orchestrator, script_voice_relay::shutdown_signal()).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server<F>(orchestrator: Arc<Orchestrator>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let bind_address = orchestrator.config().api.bind_address;
    let app = create_router(orchestrator);

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(address = %bind_address, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
