//! Verso Core - API version resolution and payload migration.
//!
//! Clients pinned to an older API version keep working while handlers only
//! understand the current (canonical) schema:
//!
//! 1. [`VersionResolver`] works out which version a request targets and
//!    picks the matching route variant.
//! 2. A [`Migrator`] moves the request body up from the client version to
//!    the canonical version.
//! 3. The handler runs against the canonical shape.
//! 4. A second [`Migrator`] moves the response body back down.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use verso_core::{MigrationRegistry, MigrationStep, SemanticVersion, VersionResolver};
//!
//! let mut registry = MigrationRegistry::new(SemanticVersion::new(1, 1));
//! registry.register(SemanticVersion::new(1, 0), vec![]).unwrap();
//! registry
//!     .register(
//!         SemanticVersion::new(1, 1),
//!         vec![MigrationStep::rename("validation-code", "meta.constant", "meta.code")],
//!     )
//!     .unwrap();
//!
//! let resolver = VersionResolver::new(registry.freeze());
//! let ctx = resolver.resolve_context(Some("1.0")).unwrap();
//!
//! let response = json!({"meta": {"code": "VALID"}});
//! let migrator = ctx.response_migrator(resolver.registry()).unwrap();
//! assert_eq!(
//!     migrator.migrate_response(response).unwrap(),
//!     json!({"meta": {"constant": "VALID"}})
//! );
//! ```

pub mod error;
pub mod manifest;
pub mod migrator;
pub mod path;
pub mod registry;
pub mod resolver;
pub mod step;
pub mod transform;
pub mod version;

pub use error::{Result, VersionError};
pub use manifest::{Manifest, StepDirection, StepKind, StepSpec, VersionEntry};
pub use migrator::Migrator;
pub use path::KeyPath;
pub use registry::{ChainLink, Direction, MigrationChain, MigrationRegistry};
pub use resolver::{RequestVersionContext, RouteVariants, VersionResolver};
pub use step::MigrationStep;
pub use transform::{Each, InsertDefault, RemoveKey, RenameKey, Transform};
pub use version::{SemanticVersion, VersionConstraint};
