pub mod health;
pub mod openapi;
pub mod schemas;
pub mod submissions;

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::handler::HandlerWithoutStateExt;
use axum::response::Response;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use dropgate_gateway::Gateway;

use crate::delivery::NotFoundPage;
use crate::intercept::InterceptLayer;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The gateway instance.
    pub gateway: Arc<Gateway>,
    /// Body of not-found responses on claimed paths and unknown routes.
    pub not_found: NotFoundPage,
    /// Optional static site served for paths nothing else handles.
    pub site_root: Option<PathBuf>,
}

async fn fallback_not_found(State(state): State<AppState>) -> Response {
    state.not_found.response()
}

/// Build the application router.
///
/// Every request first passes the interception layer, which answers claimed
/// download paths itself. The rest reach the API routes, then the static
/// site (if configured), then the not-found page.
pub fn router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(health::health))
        .route("/metrics", get(health::metrics))
        .route("/v1/submissions", post(submissions::submit))
        .route("/api-doc/openapi.json", get(openapi::openapi_json));

    match state.site_root.as_ref() {
        Some(root) if root.is_dir() => {
            let page = state.not_found.clone();
            let not_found = (move || {
                let page = page.clone();
                async move { page.response() }
            })
            .into_service();
            router = router.fallback_service(ServeDir::new(root).not_found_service(not_found));
        }
        Some(root) => {
            tracing::warn!(
                path = %root.display(),
                "site directory not found, site will not be served"
            );
            router = router.fallback(fallback_not_found);
        }
        None => router = router.fallback(fallback_not_found),
    }

    let intercept = InterceptLayer::new(Arc::clone(&state.gateway), state.not_found.clone());

    router
        .with_state(state)
        .layer(intercept)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
