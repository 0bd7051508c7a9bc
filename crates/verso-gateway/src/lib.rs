//! Verso HTTP Gateway.
//!
//! Plugs [`verso_core`] into an axum router: a middleware resolves the
//! client's API version and migrates JSON bodies, and versioned endpoints
//! dispatch to the handler variant matching that version.

pub mod config;
pub mod demo;
pub mod endpoint;
pub mod error;
pub mod extract;
pub mod json;
pub mod middleware;
pub mod routes;

pub use config::{Args, GatewayConfig};
pub use endpoint::VersionedEndpoint;
pub use error::AppError;

use std::sync::Arc;

use axum::http::header::{HeaderName, InvalidHeaderName};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use verso_core::{Manifest, MigrationRegistry, SemanticVersion, VersionError, VersionResolver};

/// Application state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    /// Version resolver over the frozen migration registry.
    pub resolver: VersionResolver,
    /// Gateway configuration.
    pub config: GatewayConfig,
    /// Parsed version header name.
    pub version_header: HeaderName,
}

impl AppState {
    /// Create new application state.
    pub fn new(
        registry: Arc<MigrationRegistry>,
        config: GatewayConfig,
    ) -> Result<Self, InvalidHeaderName> {
        Ok(Self {
            resolver: VersionResolver::new(registry),
            version_header: config.version_header_name()?,
            config,
        })
    }
}

/// Build and freeze the migration registry described by the configuration.
///
/// A manifest, when configured, replaces the built-in demo migrations.
pub fn build_registry(config: &GatewayConfig) -> Result<Arc<MigrationRegistry>, VersionError> {
    let current = SemanticVersion::parse(&config.current_version)?;
    let mut registry = MigrationRegistry::new(current);

    match &config.manifest_path {
        Some(path) => {
            info!(manifest = %path.display(), "Loading migration manifest");
            Manifest::from_file(path)?.apply(&mut registry)?;
        }
        None => demo::register_demo_migrations(&mut registry)?,
    }

    Ok(registry.freeze())
}

/// Create the router with all routes.
///
/// Fails when a versioned endpoint has no variant for some known version.
pub fn create_router(state: AppState) -> Result<Router, VersionError> {
    let keys = routes::keys::endpoint();
    keys.validate(state.resolver.registry())?;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Ok(Router::new()
        .merge(routes::health::routes())
        .merge(routes::versions::routes())
        .merge(routes::keys::routes())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::versioning,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state))
}
