//! Applies a migration chain to payloads.

use serde_json::Value;
use tracing::debug;

use crate::error::{Result, VersionError};
use crate::registry::{Direction, MigrationChain, MigrationRegistry};
use crate::version::SemanticVersion;

/// Migrates payloads along one precomputed chain.
///
/// Construct one per request and direction: `(client, canonical)` for
/// request bodies, `(canonical, client)` for response bodies.
#[derive(Debug, Clone)]
pub struct Migrator {
    chain: MigrationChain,
}

impl Migrator {
    /// Precompute the chain from `from` to `to`.
    pub fn new(registry: &MigrationRegistry, from: SemanticVersion, to: SemanticVersion) -> Result<Self> {
        for version in [from, to] {
            if !registry.is_known(&version) {
                return Err(VersionError::UnknownVersion { version });
            }
        }
        Ok(Self {
            chain: registry.chain_between(from, to),
        })
    }

    /// The chain this migrator applies.
    pub fn chain(&self) -> &MigrationChain {
        &self.chain
    }

    /// Whether migrating is a no-op.
    pub fn is_identity(&self) -> bool {
        self.chain.is_empty()
    }

    /// Run each step's request transform over the payload, oldest first.
    ///
    /// Only valid for chains that move to a newer version (or stay put).
    pub fn migrate_request(&self, payload: Value) -> Result<Value> {
        if self.chain.is_backward() {
            return Err(self.mismatch(Direction::Request));
        }
        Ok(self.fold(Direction::Request, payload))
    }

    /// Run each step's response transform over the payload, newest first.
    ///
    /// Only valid for chains that move to an older version (or stay put).
    pub fn migrate_response(&self, payload: Value) -> Result<Value> {
        if self.chain.is_forward() {
            return Err(self.mismatch(Direction::Response));
        }
        Ok(self.fold(Direction::Response, payload))
    }

    fn fold(&self, direction: Direction, payload: Value) -> Value {
        self.chain.links().iter().fold(payload, |payload, link| {
            if !link.step.handles(direction) {
                return payload;
            }
            debug!(
                anchor = %link.anchor,
                step = link.step.name(),
                %direction,
                "Applying migration step"
            );
            link.step.apply(direction, payload)
        })
    }

    fn mismatch(&self, direction: Direction) -> VersionError {
        VersionError::DirectionMismatch {
            from: self.chain.from_version(),
            to: self.chain.to_version(),
            direction,
        }
    }
}
