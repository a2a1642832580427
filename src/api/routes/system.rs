//! System handlers: health, index, OpenAPI.

use axum::{Json, response::IntoResponse};
use serde_json::json;

const SERVICE_NAME: &str = env!("CARGO_PKG_NAME");

/// GET /health - Health check
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses(
        (status = 200, description = "Service is running")
    )
)]
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "message": format!("{SERVICE_NAME} is running"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// GET / - Service name and endpoint index
#[utoipa::path(
    get,
    path = "/",
    tag = "system",
    responses(
        (status = 200, description = "Service name and available endpoints")
    )
)]
pub async fn index() -> impl IntoResponse {
    Json(json!({
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "enhance_script": "POST /enhance-script/",
            "health": "GET /health",
            "openapi": "GET /openapi.json",
            "docs": "GET /swagger-ui"
        }
    }))
}

/// GET /openapi.json - OpenAPI specification
#[utoipa::path(
    get,
    path = "/openapi.json",
    tag = "system",
    responses(
        (status = 200, description = "OpenAPI 3 specification in JSON format")
    )
)]
pub async fn openapi_spec() -> impl IntoResponse {
    use crate::api::openapi::ApiDoc;
    use utoipa::OpenApi;

    Json(ApiDoc::openapi())
}
