//! Version resolution and payload migration middleware.
//!
//! For every request: resolve the client version, store the
//! [`RequestVersionContext`] in the request extensions, migrate a JSON
//! request body up to the canonical version, run the handler, migrate a
//! JSON response body back down and echo the resolved version header.

use axum::{
    body::{to_bytes, Body, Bytes},
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use serde_json::Value;
use tracing::{debug, warn};
use verso_core::{MigrationRegistry, RequestVersionContext};

use crate::error::AppError;
use crate::extract::declared_version;
use crate::AppState;

/// Versioning middleware, installed with `axum::middleware::from_fn_with_state`.
pub async fn versioning(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let declared = declared_version(
        request.headers(),
        &state.version_header,
        state.config.host_versioning,
    );
    let ctx = state
        .resolver
        .resolve_context(declared.as_deref())
        .inspect_err(|err| {
            warn!(declared = ?declared, error = %err, "Rejected API version");
        })?;

    let registry = state.resolver.registry();
    let limit = state.config.max_body_bytes;

    let (mut parts, body) = request.into_parts();
    parts.extensions.insert(ctx);

    let body = if ctx.needs_migration() && is_json(&parts.headers) {
        let migrator = ctx.request_migrator(registry)?;
        let bytes = to_bytes(body, limit)
            .await
            .map_err(|e| AppError::PayloadTooLarge(format!("request body exceeds {} bytes: {}", limit, e)))?;
        let migrated = migrate_bytes(bytes, |payload| migrator.migrate_request(payload))?;
        parts.headers.remove(header::CONTENT_LENGTH);
        Body::from(migrated)
    } else {
        body
    };

    let response = next.run(Request::from_parts(parts, body)).await;
    let mut response = if ctx.needs_migration() && is_json(response.headers()) {
        migrate_response(response, &ctx, registry, limit).await?
    } else {
        response
    };

    let version = HeaderValue::from_str(&ctx.client_version.to_string())
        .map_err(|e| AppError::Internal(e.to_string()))?;
    response
        .headers_mut()
        .insert(state.version_header.clone(), version);
    Ok(response)
}

async fn migrate_response(
    response: Response,
    ctx: &RequestVersionContext,
    registry: &MigrationRegistry,
    limit: usize,
) -> Result<Response, AppError> {
    let migrator = ctx.response_migrator(registry)?;
    let (mut parts, body) = response.into_parts();
    // The client sent nothing wrong; an unreadable response is our fault.
    let bytes = to_bytes(body, limit)
        .await
        .map_err(|e| AppError::Internal(format!("response body exceeds {} bytes: {}", limit, e)))?;
    let migrated = migrate_bytes(bytes, |payload| migrator.migrate_response(payload))?;
    parts.headers.remove(header::CONTENT_LENGTH);
    Ok(Response::from_parts(parts, Body::from(migrated)))
}

/// Run `migrate` over a JSON body. Empty or unparseable bodies are passed
/// through untouched; the handler decides what to do with them.
fn migrate_bytes<F>(bytes: Bytes, migrate: F) -> Result<Bytes, AppError>
where
    F: FnOnce(Value) -> verso_core::Result<Value>,
{
    if bytes.is_empty() {
        return Ok(bytes);
    }
    let Ok(payload) = serde_json::from_slice::<Value>(&bytes) else {
        debug!("Body is not valid JSON, skipping migration");
        return Ok(bytes);
    };

    let migrated = migrate(payload)?;
    Ok(Bytes::from(serde_json::to_vec(&migrated)?))
}

/// Whether `headers` declare a JSON body (`application/json` or `*+json`).
pub(crate) fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            let mime = value.split(';').next().unwrap_or_default().trim();
            mime.eq_ignore_ascii_case("application/json")
                || mime.to_ascii_lowercase().ends_with("+json")
        })
        .unwrap_or(false)
}
