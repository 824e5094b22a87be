#![allow(clippy::needless_for_each)]

use axum::Json;

use super::schemas::{ErrorResponse, HealthResponse, MetricsResponse, SubmissionBody};

#[derive(utoipa::OpenApi)]
#[openapi(
    info(
        title = "Dropgate API",
        version = "0.1.0",
        description = "HTTP API for Dropgate. Record one-time download grants from form submissions and monitor service health.",
        license(name = "Apache-2.0")
    ),
    tags(
        (name = "Health", description = "Service health and metrics"),
        (name = "Submissions", description = "Form submissions that grant one-time downloads")
    ),
    paths(
        super::health::health,
        super::health::metrics,
        super::submissions::submit,
    ),
    components(schemas(
        HealthResponse,
        MetricsResponse,
        SubmissionBody,
        ErrorResponse,
    ))
)]
pub struct ApiDoc;

/// `GET /api-doc/openapi.json` -- the generated OpenAPI document.
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(<ApiDoc as utoipa::OpenApi>::openapi())
}
