//! Core error types.

use thiserror::Error;

use crate::registry::Direction;
use crate::version::SemanticVersion;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, VersionError>;

/// Errors raised by version resolution and payload migration.
///
/// Transform-level problems (missing keys, unexpected shapes) are never
/// reported here; transforms leave such payloads untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    /// The input is not of the form `<major>.<minor>`.
    #[error("invalid version format: {input:?}")]
    InvalidVersionFormat {
        /// The rejected input.
        input: String,
    },

    /// The client asked for a version this server cannot serve.
    #[error("unsupported version {requested:?} (current version is {current})")]
    UnsupportedVersion {
        /// The version string the client declared.
        requested: String,
        /// The canonical version of the server.
        current: SemanticVersion,
    },

    /// No route variant accepts the client version.
    #[error("no route variant matches version {version}")]
    NoMatchingVariant {
        /// The client version that was not matched.
        version: SemanticVersion,
    },

    /// The same anchor version was registered twice.
    #[error("migrations for version {version} are already registered")]
    DuplicateVersionRegistration {
        /// The duplicated anchor version.
        version: SemanticVersion,
    },

    /// The registry was mutated after it was frozen.
    #[error("migration registry is frozen and cannot be modified")]
    ConfigurationFrozen,

    /// A migrator endpoint is neither registered nor canonical.
    #[error("unknown version {version}")]
    UnknownVersion {
        /// The unknown endpoint.
        version: SemanticVersion,
    },

    /// A migrator was driven in the wrong direction for its chain.
    #[error("cannot migrate {direction} payloads from {from} to {to}")]
    DirectionMismatch {
        /// Chain start.
        from: SemanticVersion,
        /// Chain end.
        to: SemanticVersion,
        /// The direction that was requested.
        direction: Direction,
    },

    /// A migration manifest could not be loaded.
    #[error("invalid migration manifest: {0}")]
    InvalidManifest(String),
}

impl VersionError {
    /// Whether the error was caused by client input rather than server
    /// configuration.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            VersionError::InvalidVersionFormat { .. } | VersionError::UnsupportedVersion { .. }
        )
    }

    /// Stable machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            VersionError::InvalidVersionFormat { .. } => "INVALID_VERSION_FORMAT",
            VersionError::UnsupportedVersion { .. } => "UNSUPPORTED_VERSION",
            VersionError::NoMatchingVariant { .. } => "NO_MATCHING_VARIANT",
            VersionError::DuplicateVersionRegistration { .. } => "DUPLICATE_VERSION_REGISTRATION",
            VersionError::ConfigurationFrozen => "CONFIGURATION_FROZEN",
            VersionError::UnknownVersion { .. } => "UNKNOWN_VERSION",
            VersionError::DirectionMismatch { .. } => "DIRECTION_MISMATCH",
            VersionError::InvalidManifest(_) => "INVALID_MANIFEST",
        }
    }
}

impl From<serde_json::Error> for VersionError {
    fn from(err: serde_json::Error) -> Self {
        VersionError::InvalidManifest(err.to_string())
    }
}
