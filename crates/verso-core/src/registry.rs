//! Migration registry and chain building.
//!
//! The registry is built once at startup, frozen, and then shared behind an
//! `Arc`. A frozen registry is never mutated, so lookups need no locking.
//!
//! # Chains
//!
//! A step anchored at `V` encodes the breaking change introduced going into
//! `V`. Moving from `from` to `to`:
//!
//! | Case | Steps included | Order |
//! |------|----------------|-------|
//! | `from == to` | none | - |
//! | `from < to` | `from < anchor <= to` | anchor ascending |
//! | `from > to` | `to < anchor <= from` | anchor descending |

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Result, VersionError};
use crate::step::MigrationStep;
use crate::version::SemanticVersion;

/// Which payload a transform applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Client request bodies, migrated up to the canonical version.
    Request,
    /// Server response bodies, migrated down to the client version.
    Response,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Request => write!(f, "request"),
            Direction::Response => write!(f, "response"),
        }
    }
}

/// A step together with the version it was registered under.
#[derive(Debug, Clone)]
pub struct ChainLink {
    /// Anchor version of the step.
    pub anchor: SemanticVersion,
    /// The step itself.
    pub step: Arc<MigrationStep>,
}

/// An ordered, immutable sequence of steps between two versions.
#[derive(Debug, Clone)]
pub struct MigrationChain {
    from: SemanticVersion,
    to: SemanticVersion,
    links: Vec<ChainLink>,
}

impl MigrationChain {
    /// Chain start.
    pub fn from_version(&self) -> SemanticVersion {
        self.from
    }

    /// Chain end.
    pub fn to_version(&self) -> SemanticVersion {
        self.to
    }

    /// Whether the chain moves to a newer version.
    pub fn is_forward(&self) -> bool {
        self.from < self.to
    }

    /// Whether the chain moves to an older version.
    pub fn is_backward(&self) -> bool {
        self.from > self.to
    }

    /// Whether the chain is the identity.
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Number of steps in the chain.
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Steps in application order.
    pub fn links(&self) -> &[ChainLink] {
        &self.links
    }

    /// Step names in application order.
    pub fn step_names(&self) -> Vec<&str> {
        self.links.iter().map(|link| link.step.name()).collect()
    }
}

/// Catalog of migration steps keyed by anchor version.
#[derive(Debug)]
pub struct MigrationRegistry {
    current: SemanticVersion,
    versions: BTreeMap<SemanticVersion, Vec<Arc<MigrationStep>>>,
    frozen: bool,
}

impl MigrationRegistry {
    /// Create an empty registry for the given canonical version.
    pub fn new(current: SemanticVersion) -> Self {
        Self {
            current,
            versions: BTreeMap::new(),
            frozen: false,
        }
    }

    /// The canonical version the server implements.
    pub fn current_version(&self) -> SemanticVersion {
        self.current
    }

    /// Register the steps introduced at `version`.
    ///
    /// An empty step list is allowed; it declares a version clients may pin
    /// to that carries no breaking change of its own.
    pub fn register(&mut self, version: SemanticVersion, steps: Vec<MigrationStep>) -> Result<()> {
        if self.frozen {
            return Err(VersionError::ConfigurationFrozen);
        }
        if self.versions.contains_key(&version) {
            return Err(VersionError::DuplicateVersionRegistration { version });
        }

        debug!(%version, steps = steps.len(), "Registering migrations");
        self.versions
            .insert(version, steps.into_iter().map(Arc::new).collect());
        Ok(())
    }

    /// Register steps under a version string.
    pub fn register_str(&mut self, version: &str, steps: Vec<MigrationStep>) -> Result<()> {
        self.register(SemanticVersion::parse(version)?, steps)
    }

    /// Stop accepting registrations and share the registry.
    pub fn freeze(mut self) -> Arc<Self> {
        self.frozen = true;

        for version in self.versions.keys().filter(|v| **v > self.current) {
            warn!(
                %version,
                current = %self.current,
                "Migrations registered beyond the current version are unreachable"
            );
        }
        info!(
            current = %self.current,
            versions = self.versions.len(),
            steps = self.versions.values().map(Vec::len).sum::<usize>(),
            "Migration registry frozen"
        );

        Arc::new(self)
    }

    /// Whether the registry has been frozen.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Whether `version` is registered or canonical.
    pub fn is_known(&self, version: &SemanticVersion) -> bool {
        *version == self.current || self.versions.contains_key(version)
    }

    /// Registered versions plus the canonical version, ascending.
    pub fn known_versions(&self) -> Vec<SemanticVersion> {
        let mut known: Vec<_> = self.versions.keys().copied().collect();
        if !self.versions.contains_key(&self.current) {
            known.push(self.current);
            known.sort();
        }
        known
    }

    /// Steps registered at exactly `version`.
    pub fn steps_at(&self, version: &SemanticVersion) -> Option<&[Arc<MigrationStep>]> {
        self.versions.get(version).map(Vec::as_slice)
    }

    /// Build the chain of steps crossed when moving from `from` to `to`.
    pub fn chain_between(&self, from: SemanticVersion, to: SemanticVersion) -> MigrationChain {
        let links = if from < to {
            self.links_in(from, to).collect()
        } else if from > to {
            // Undo newest changes first; steps sharing an anchor unwind in
            // reverse registration order.
            let mut links: Vec<_> = self.links_in(to, from).collect();
            links.reverse();
            links
        } else {
            Vec::new()
        };

        debug!(%from, %to, steps = links.len(), "Built migration chain");
        MigrationChain { from, to, links }
    }

    /// Links anchored in `(low, high]`, ascending.
    fn links_in(
        &self,
        low: SemanticVersion,
        high: SemanticVersion,
    ) -> impl Iterator<Item = ChainLink> + '_ {
        use std::ops::Bound::{Excluded, Included};

        self.versions
            .range((Excluded(low), Included(high)))
            .flat_map(|(anchor, steps)| {
                steps.iter().map(move |step| ChainLink {
                    anchor: *anchor,
                    step: Arc::clone(step),
                })
            })
    }
}
