//! Gateway configuration.

use std::path::PathBuf;

use axum::http::header::{HeaderName, InvalidHeaderName};
use clap::Parser;

/// Default header carrying the client's API version.
pub const DEFAULT_VERSION_HEADER: &str = "Api-Version";

/// Default canonical API version.
pub const DEFAULT_CURRENT_VERSION: &str = "1.2";

/// Default limit for bodies buffered for migration (2 MB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Verso gateway command line arguments.
#[derive(Debug, Parser)]
#[command(name = "verso-gateway")]
#[command(about = "Versioned HTTP gateway with request/response payload migration")]
pub struct Args {
    /// Address to listen on for HTTP requests.
    #[arg(short, long, default_value = "0.0.0.0:8080")]
    pub listen: String,

    /// Canonical API version implemented by the handlers.
    #[arg(short, long, default_value = DEFAULT_CURRENT_VERSION)]
    pub current_version: String,

    /// Request header carrying the client's API version.
    #[arg(long, default_value = DEFAULT_VERSION_HEADER)]
    pub version_header: String,

    /// Also accept versions from a `v<major>-<minor>.` host prefix.
    #[arg(long)]
    pub host_versioning: bool,

    /// Maximum body size (bytes) buffered for migration.
    #[arg(long, default_value_t = DEFAULT_MAX_BODY_BYTES)]
    pub max_body_bytes: usize,

    /// JSON migration manifest replacing the built-in migrations.
    #[arg(short, long)]
    pub manifest: Option<PathBuf>,
}

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Address to listen on for HTTP requests.
    pub listen_addr: String,
    /// Canonical API version string.
    pub current_version: String,
    /// Request header carrying the client's API version.
    pub version_header: String,
    /// Whether a `v<major>-<minor>.` host prefix declares a version.
    pub host_versioning: bool,
    /// Maximum body size buffered for migration.
    pub max_body_bytes: usize,
    /// Optional migration manifest.
    pub manifest_path: Option<PathBuf>,
}

impl GatewayConfig {
    /// Set the canonical version.
    pub fn with_current_version(mut self, version: impl Into<String>) -> Self {
        self.current_version = version.into();
        self
    }

    /// Set the version header name.
    pub fn with_version_header(mut self, header: impl Into<String>) -> Self {
        self.version_header = header.into();
        self
    }

    /// Enable or disable host-prefix versioning.
    pub fn with_host_versioning(mut self, enabled: bool) -> Self {
        self.host_versioning = enabled;
        self
    }

    /// Set the body size limit.
    pub fn with_max_body_bytes(mut self, bytes: usize) -> Self {
        self.max_body_bytes = bytes;
        self
    }

    /// Load migrations from a manifest file.
    pub fn with_manifest(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest_path = Some(path.into());
        self
    }

    /// The version header as an HTTP header name.
    pub fn version_header_name(&self) -> Result<HeaderName, InvalidHeaderName> {
        HeaderName::from_bytes(self.version_header.as_bytes())
    }
}

impl From<&Args> for GatewayConfig {
    fn from(args: &Args) -> Self {
        Self {
            listen_addr: args.listen.clone(),
            current_version: args.current_version.clone(),
            version_header: args.version_header.clone(),
            host_versioning: args.host_versioning,
            max_body_bytes: args.max_body_bytes,
            manifest_path: args.manifest.clone(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            current_version: DEFAULT_CURRENT_VERSION.to_string(),
            version_header: DEFAULT_VERSION_HEADER.to_string(),
            host_versioning: false,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            manifest_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["verso-gateway"]);
        let config = GatewayConfig::from(&args);
        assert_eq!(config.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.current_version, DEFAULT_CURRENT_VERSION);
        assert_eq!(config.version_header, DEFAULT_VERSION_HEADER);
        assert!(!config.host_versioning);
        assert!(config.manifest_path.is_none());
    }

    #[test]
    fn test_args_overrides() {
        let args = Args::parse_from([
            "verso-gateway",
            "--current-version",
            "2.0",
            "--version-header",
            "X-Api-Version",
            "--host-versioning",
            "--manifest",
            "/etc/verso/migrations.json",
        ]);
        let config = GatewayConfig::from(&args);
        assert_eq!(config.current_version, "2.0");
        assert_eq!(config.version_header, "X-Api-Version");
        assert!(config.host_versioning);
        assert_eq!(
            config.manifest_path,
            Some(PathBuf::from("/etc/verso/migrations.json"))
        );
    }

    #[test]
    fn test_header_name() {
        let config = GatewayConfig::default();
        assert_eq!(config.version_header_name().unwrap().as_str(), "api-version");
        assert!(config.with_version_header("bad header").version_header_name().is_err());
    }
}
