//! OpenAPI documentation and schema generation

use utoipa::OpenApi;

/// OpenAPI documentation for the script-voice-relay service
///
/// Served at `/openapi.json`, and to Swagger UI (when enabled) at
/// `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "script-voice-relay API",
        version = "0.1.0",
        description = "Enhances a script and voices it through a remote browser agent, then publishes the audio to object storage"
    ),
    servers(
        (url = "http://localhost:8000", description = "Local development server")
    ),
    paths(
        crate::api::routes::enhance_script,
        crate::api::routes::health_check,
        crate::api::routes::index,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        crate::types::EnhanceRequest,
        crate::types::EnhanceResponse,
        crate::types::ResolutionMethod,
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "enhance", description = "Script enhancement and speech generation"),
        (name = "system", description = "Health, index and OpenAPI document"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Declares the `X-Api-Key` header scheme
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = &mut openapi.components {
            components.add_security_scheme(
                "api_key",
                utoipa::openapi::security::SecurityScheme::ApiKey(
                    utoipa::openapi::security::ApiKey::Header(
                        utoipa::openapi::security::ApiKeyValue::new("X-Api-Key"),
                    ),
                ),
            );
        }
    }
}
