//! Version introspection endpoint.

use axum::{extract::State, routing::get, Extension, Json, Router};
use verso_core::RequestVersionContext;

use crate::json::VersionsResponse;
use crate::AppState;

/// Version routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/versions", get(list_versions))
}

async fn list_versions(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestVersionContext>,
) -> Json<VersionsResponse> {
    let registry = state.resolver.registry();
    Json(VersionsResponse {
        current: registry.current_version(),
        supported: registry.known_versions(),
        resolved: ctx.client_version,
    })
}
