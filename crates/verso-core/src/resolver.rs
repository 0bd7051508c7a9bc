//! Client version resolution and route variant selection.

use std::sync::Arc;

use tracing::debug;

use crate::error::{Result, VersionError};
use crate::migrator::Migrator;
use crate::registry::MigrationRegistry;
use crate::version::{SemanticVersion, VersionConstraint};

/// Versions in effect for a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestVersionContext {
    /// The version the client targets.
    pub client_version: SemanticVersion,
    /// The version the handlers implement.
    pub canonical_version: SemanticVersion,
}

impl RequestVersionContext {
    /// Whether payloads need migrating at all.
    pub fn needs_migration(&self) -> bool {
        self.client_version != self.canonical_version
    }

    /// Migrator for request bodies (client up to canonical).
    pub fn request_migrator(&self, registry: &MigrationRegistry) -> Result<Migrator> {
        Migrator::new(registry, self.client_version, self.canonical_version)
    }

    /// Migrator for response bodies (canonical down to client).
    pub fn response_migrator(&self, registry: &MigrationRegistry) -> Result<Migrator> {
        Migrator::new(registry, self.canonical_version, self.client_version)
    }
}

/// Resolves the version a request targets.
#[derive(Debug, Clone)]
pub struct VersionResolver {
    registry: Arc<MigrationRegistry>,
}

impl VersionResolver {
    /// Create a resolver over a frozen registry.
    pub fn new(registry: Arc<MigrationRegistry>) -> Self {
        Self { registry }
    }

    /// The registry used for resolution.
    pub fn registry(&self) -> &Arc<MigrationRegistry> {
        &self.registry
    }

    /// Resolve the client's declared version, defaulting to the canonical
    /// version when nothing was declared.
    ///
    /// Declarations that do not parse, are newer than the canonical version,
    /// or were never registered all fail with `UnsupportedVersion`.
    pub fn resolve(&self, declared: Option<&str>) -> Result<SemanticVersion> {
        let current = self.registry.current_version();
        let Some(declared) = declared.map(str::trim) else {
            return Ok(current);
        };

        let unsupported = || VersionError::UnsupportedVersion {
            requested: declared.to_string(),
            current,
        };
        let version = SemanticVersion::parse(declared).map_err(|_| unsupported())?;
        if version > current || !self.registry.is_known(&version) {
            return Err(unsupported());
        }

        debug!(%version, %current, "Resolved client version");
        Ok(version)
    }

    /// Resolve and wrap the result in a request context.
    pub fn resolve_context(&self, declared: Option<&str>) -> Result<RequestVersionContext> {
        Ok(RequestVersionContext {
            client_version: self.resolve(declared)?,
            canonical_version: self.registry.current_version(),
        })
    }

    /// Pick the first variant whose constraint accepts `client_version`.
    pub fn select_variant<'a, H>(
        &self,
        variants: &'a RouteVariants<H>,
        client_version: SemanticVersion,
    ) -> Result<&'a H> {
        variants.select(client_version)
    }
}

/// Ordered `(constraint, handler)` pairs for one logical endpoint.
///
/// Selection is first-match in declaration order, so overlapping ranges
/// resolve to whichever variant was declared first.
#[derive(Debug, Clone)]
pub struct RouteVariants<H> {
    variants: Vec<(VersionConstraint, H)>,
}

impl<H> Default for RouteVariants<H> {
    fn default() -> Self {
        Self { variants: Vec::new() }
    }
}

impl<H> RouteVariants<H> {
    /// Create an empty variant list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a variant.
    pub fn with(mut self, constraint: VersionConstraint, handler: H) -> Self {
        self.variants.push((constraint, handler));
        self
    }

    /// Number of variants.
    pub fn len(&self) -> usize {
        self.variants.len()
    }

    /// Whether no variants are declared.
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// The first handler whose constraint accepts `version`.
    pub fn select(&self, version: SemanticVersion) -> Result<&H> {
        self.variants
            .iter()
            .find(|(constraint, _)| constraint.matches(&version))
            .map(|(_, handler)| handler)
            .ok_or(VersionError::NoMatchingVariant { version })
    }

    /// Check that every version the registry knows selects some variant.
    pub fn validate(&self, registry: &MigrationRegistry) -> Result<()> {
        registry
            .known_versions()
            .into_iter()
            .try_for_each(|version| self.select(version).map(|_| ()))
    }
}

impl<H> FromIterator<(VersionConstraint, H)> for RouteVariants<H> {
    fn from_iter<I: IntoIterator<Item = (VersionConstraint, H)>>(iter: I) -> Self {
        Self {
            variants: iter.into_iter().collect(),
        }
    }
}
