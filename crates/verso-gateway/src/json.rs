//! JSON response types for the HTTP gateway.

use serde::Serialize;
use verso_core::SemanticVersion;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Health status.
    pub status: String,
    /// Gateway version.
    pub version: String,
    /// Canonical API version.
    pub api_version: SemanticVersion,
}

/// Supported API versions.
#[derive(Debug, Serialize)]
pub struct VersionsResponse {
    /// Canonical API version.
    pub current: SemanticVersion,
    /// Every version a client may declare, ascending.
    pub supported: Vec<SemanticVersion>,
    /// The version resolved for this request.
    pub resolved: SemanticVersion,
}
