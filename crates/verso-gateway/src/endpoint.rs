//! Endpoints with per-version handler variants.

use std::future::Future;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::{on, MethodFilter, MethodRouter},
    Extension, Json,
};
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use tracing::debug;
use verso_core::{MigrationRegistry, RequestVersionContext, RouteVariants, VersionConstraint, VersionError};

use crate::error::AppError;
use crate::middleware::is_json;
use crate::AppState;

/// A handler variant. It receives the canonical-shape request payload
/// (`Null` for an empty body) and returns a canonical-shape response.
/// Non-empty bodies must be declared JSON; others are refused with 415.
pub type VariantHandler =
    Arc<dyn Fn(AppState, Value) -> BoxFuture<'static, Result<Value, AppError>> + Send + Sync>;

/// One logical endpoint and its version variants.
pub struct VersionedEndpoint {
    name: &'static str,
    variants: RouteVariants<VariantHandler>,
}

impl VersionedEndpoint {
    /// Create an endpoint with no variants.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            variants: RouteVariants::new(),
        }
    }

    /// Add a variant. Variants are tried in declaration order.
    pub fn variant<F, Fut>(mut self, constraint: VersionConstraint, handler: F) -> Self
    where
        F: Fn(AppState, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, AppError>> + Send + 'static,
    {
        let handler: VariantHandler =
            Arc::new(move |state: AppState, payload: Value| handler(state, payload).boxed());
        self.variants = self.variants.with(constraint, handler);
        self
    }

    /// Endpoint name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Check that every known version reaches a variant.
    pub fn validate(&self, registry: &MigrationRegistry) -> Result<(), VersionError> {
        self.variants.validate(registry)
    }

    /// Run the variant selected for the request's client version.
    pub async fn dispatch(
        &self,
        state: AppState,
        ctx: RequestVersionContext,
        payload: Value,
    ) -> Result<Value, AppError> {
        let handler = self.variants.select(ctx.client_version)?;
        debug!(
            endpoint = self.name,
            client_version = %ctx.client_version,
            "Dispatching versioned endpoint"
        );
        handler(state, payload).await
    }

    /// Turn the endpoint into a method router for `method`.
    pub fn into_route(self, method: MethodFilter) -> MethodRouter<AppState> {
        let endpoint = Arc::new(self);
        on(
            method,
            move |State(state): State<AppState>,
                  Extension(ctx): Extension<RequestVersionContext>,
                  headers: HeaderMap,
                  body: Bytes| {
                let endpoint = Arc::clone(&endpoint);
                async move {
                    let payload = if body.is_empty() {
                        Value::Null
                    } else if is_json(&headers) {
                        serde_json::from_slice(&body)?
                    } else {
                        // Only JSON bodies are migrated, so anything else
                        // would reach the handler in the client's shape.
                        return Err(AppError::UnsupportedMediaType(
                            "request body must be JSON".to_string(),
                        ));
                    };
                    let response = endpoint.dispatch(state, ctx, payload).await?;
                    Ok::<_, AppError>(Json(response))
                }
            },
        )
    }
}
