//! Declarative migration manifests.
//!
//! A manifest describes structural migrations as JSON so they can be
//! configured without code:
//!
//! ```json
//! {
//!   "versions": [
//!     { "version": "1.0", "steps": [] },
//!     {
//!       "version": "1.1",
//!       "steps": [
//!         { "name": "validation-code", "kind": "rename_key",
//!           "from": "meta.constant", "to": "meta.code" }
//!       ]
//!     }
//!   ]
//! }
//! ```

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Result, VersionError};
use crate::registry::MigrationRegistry;
use crate::step::MigrationStep;
use crate::transform::{Each, InsertDefault, RemoveKey, RenameKey, Transform};

/// Top-level manifest document.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Versions in any order.
    pub versions: Vec<VersionEntry>,
}

/// Steps introduced at one version.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VersionEntry {
    /// Anchor version string.
    pub version: String,
    /// Steps in application order.
    #[serde(default)]
    pub steps: Vec<StepSpec>,
}

/// Which transforms a manifest step produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepDirection {
    /// Only a request transform.
    Request,
    /// Only a response transform.
    Response,
    /// A request transform and its inverse as the response transform.
    #[default]
    Both,
}

/// One step in a manifest.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawStep")]
pub struct StepSpec {
    /// Step name.
    pub name: String,
    /// Transform kind.
    pub kind: StepKind,
    /// Apply under each element at this path.
    pub scope: Option<String>,
    /// Direction(s) the step applies to.
    pub direction: StepDirection,
}

/// Structural transform kinds.
///
/// The request transform applies the change going into the step's version;
/// the response transform undoes it. `rename_key` moves `from` to `to` and
/// back, `insert_default` inserts on requests and removes the key from
/// responses. `remove_key` has no inverse and removes in both directions.
#[derive(Debug, Clone, PartialEq)]
pub enum StepKind {
    /// Move a key.
    RenameKey {
        /// Old path.
        from: String,
        /// New path.
        to: String,
    },
    /// Drop a key.
    RemoveKey {
        /// Path to drop.
        path: String,
    },
    /// Insert a value if absent.
    InsertDefault {
        /// Target path.
        path: String,
        /// Inserted value.
        value: Value,
    },
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum RawKind {
    RenameKey,
    RemoveKey,
    InsertDefault,
}

/// Wire form of a step; every kind's fields are optional here and checked
/// when converting.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawStep {
    name: String,
    kind: RawKind,
    #[serde(default)]
    from: Option<String>,
    #[serde(default)]
    to: Option<String>,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    value: Option<Value>,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    direction: StepDirection,
}

impl TryFrom<RawStep> for StepSpec {
    type Error = String;

    fn try_from(raw: RawStep) -> std::result::Result<Self, String> {
        let name = raw.name;
        let require = |field: Option<String>, label: &str| {
            field.ok_or_else(|| format!("step {:?} requires `{}`", name, label))
        };
        let reject = |present: bool, label: &str| {
            if present {
                Err(format!("step {:?} does not accept `{}`", name, label))
            } else {
                Ok(())
            }
        };

        let kind = match raw.kind {
            RawKind::RenameKey => {
                reject(raw.path.is_some(), "path")?;
                reject(raw.value.is_some(), "value")?;
                StepKind::RenameKey {
                    from: require(raw.from, "from")?,
                    to: require(raw.to, "to")?,
                }
            }
            RawKind::RemoveKey => {
                reject(raw.from.is_some(), "from")?;
                reject(raw.to.is_some(), "to")?;
                reject(raw.value.is_some(), "value")?;
                StepKind::RemoveKey {
                    path: require(raw.path, "path")?,
                }
            }
            RawKind::InsertDefault => {
                reject(raw.from.is_some(), "from")?;
                reject(raw.to.is_some(), "to")?;
                StepKind::InsertDefault {
                    path: require(raw.path, "path")?,
                    // A JSON `null` deserializes as absent; both insert null.
                    value: raw.value.unwrap_or(Value::Null),
                }
            }
        };

        Ok(StepSpec {
            name,
            kind,
            scope: raw.scope,
            direction: raw.direction,
        })
    }
}

impl Manifest {
    /// Parse a manifest from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read and parse a manifest file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| VersionError::InvalidManifest(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }

    /// Register every version in the manifest.
    pub fn apply(&self, registry: &mut MigrationRegistry) -> Result<()> {
        for entry in &self.versions {
            let steps = entry.steps.iter().map(StepSpec::build).collect();
            registry.register_str(&entry.version, steps)?;
        }
        Ok(())
    }
}

impl StepSpec {
    /// Build the migration step described by this entry.
    pub fn build(&self) -> MigrationStep {
        let forward = Structural::from_kind(&self.kind);
        let backward = forward.inverse();
        let scope = self.scope.as_deref();

        let step = MigrationStep::new(self.name.clone());
        match self.direction {
            StepDirection::Request => step.with_request(Scoped::new(scope, forward)),
            StepDirection::Response => step.with_response(Scoped::new(scope, backward)),
            StepDirection::Both => step
                .with_request(Scoped::new(scope, forward))
                .with_response(Scoped::new(scope, backward)),
        }
    }
}

/// The built-in transform behind a manifest step.
#[derive(Debug, Clone)]
enum Structural {
    Rename(RenameKey),
    Remove(RemoveKey),
    Insert(InsertDefault),
}

impl Structural {
    fn from_kind(kind: &StepKind) -> Self {
        match kind {
            StepKind::RenameKey { from, to } => {
                Structural::Rename(RenameKey::new(from.as_str(), to.as_str()))
            }
            StepKind::RemoveKey { path } => Structural::Remove(RemoveKey::new(path.as_str())),
            StepKind::InsertDefault { path, value } => {
                Structural::Insert(InsertDefault::new(path.as_str(), value.clone()))
            }
        }
    }

    fn inverse(&self) -> Self {
        match self {
            Structural::Rename(rename) => Structural::Rename(rename.reversed()),
            Structural::Insert(insert) => Structural::Remove(RemoveKey(insert.path.clone())),
            Structural::Remove(remove) => Structural::Remove(remove.clone()),
        }
    }
}

impl Transform for Structural {
    fn apply(&self, payload: Value) -> Value {
        match self {
            Structural::Rename(t) => t.apply(payload),
            Structural::Remove(t) => t.apply(payload),
            Structural::Insert(t) => t.apply(payload),
        }
    }
}

/// A structural transform, optionally applied under a scope.
#[derive(Debug)]
enum Scoped {
    Plain(Structural),
    Each(Each),
}

impl Scoped {
    fn new(scope: Option<&str>, transform: Structural) -> Self {
        match scope {
            Some(scope) => Scoped::Each(Each::new(scope, transform)),
            None => Scoped::Plain(transform),
        }
    }
}

impl Transform for Scoped {
    fn apply(&self, payload: Value) -> Value {
        match self {
            Scoped::Plain(t) => t.apply(payload),
            Scoped::Each(t) => t.apply(payload),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrator::Migrator;
    use crate::registry::Direction;
    use crate::version::SemanticVersion;
    use serde_json::json;

    const MANIFEST: &str = r#"{
        "versions": [
            { "version": "1.1", "steps": [
                { "name": "code", "kind": "rename_key", "from": "meta.code", "to": "meta.constant" }
            ]},
            { "version": "1.0" },
            { "version": "1.2", "steps": [
                { "name": "fingerprint", "kind": "rename_key",
                  "from": "attributes.key", "to": "attributes.fingerprint", "scope": "data" },
                { "name": "scope-default", "kind": "insert_default",
                  "path": "meta.scope", "value": "account", "direction": "request" }
            ]}
        ]
    }"#;

    fn v(s: &str) -> SemanticVersion {
        SemanticVersion::parse(s).unwrap()
    }

    #[test]
    fn test_manifest_registers_versions() {
        let manifest = Manifest::from_json(MANIFEST).unwrap();
        let mut registry = MigrationRegistry::new(v("1.2"));
        manifest.apply(&mut registry).unwrap();

        assert_eq!(registry.known_versions(), vec![v("1.0"), v("1.1"), v("1.2")]);
        let chain = registry.chain_between(v("1.0"), v("1.2"));
        assert_eq!(chain.step_names(), vec!["code", "fingerprint", "scope-default"]);
    }

    #[test]
    fn test_manifest_step_directions() {
        let manifest = Manifest::from_json(MANIFEST).unwrap();
        let insert = manifest.versions[2].steps[1].build();
        assert!(insert.handles(Direction::Request));
        assert!(!insert.handles(Direction::Response));

        let scoped = manifest.versions[2].steps[0].build();
        let up = scoped.apply_request(json!({"data": [{"attributes": {"key": "k"}}]}));
        assert_eq!(up, json!({"data": [{"attributes": {"fingerprint": "k"}}]}));
        let down = scoped.apply_response(up);
        assert_eq!(down, json!({"data": [{"attributes": {"key": "k"}}]}));
    }

    #[test]
    fn test_manifest_duplicate_version() {
        let manifest = Manifest::from_json(
            r#"{"versions": [{"version": "1.0"}, {"version": "1.0"}]}"#,
        )
        .unwrap();
        let mut registry = MigrationRegistry::new(v("1.0"));
        assert_eq!(
            manifest.apply(&mut registry).unwrap_err(),
            crate::VersionError::DuplicateVersionRegistration { version: v("1.0") }
        );
    }

    #[test]
    fn test_manifest_invalid() {
        assert!(matches!(
            Manifest::from_json(r#"{"versions": [{"version": "1.0", "steps": [{"name": "x", "kind": "explode"}]}]}"#),
            Err(VersionError::InvalidManifest(_))
        ));
        assert!(matches!(
            Manifest::from_file("/nonexistent/verso-manifest.json"),
            Err(VersionError::InvalidManifest(_))
        ));

        let manifest = Manifest::from_json(r#"{"versions": [{"version": "v1"}]}"#).unwrap();
        let mut registry = MigrationRegistry::new(v("1.0"));
        assert!(matches!(
            manifest.apply(&mut registry),
            Err(VersionError::InvalidVersionFormat { .. })
        ));
    }

    #[test]
    fn test_insert_default_removed_from_responses() {
        let manifest = Manifest::from_json(
            r#"{"versions": [
                {"version": "1.0"},
                {"version": "1.1", "steps": [
                    {"name": "scope-default", "kind": "insert_default",
                     "path": "meta.scope", "value": "account"}
                ]}
            ]}"#,
        )
        .unwrap();
        let mut registry = MigrationRegistry::new(v("1.1"));
        manifest.apply(&mut registry).unwrap();

        let down = Migrator::new(&registry, v("1.1"), v("1.0")).unwrap();
        let body = down
            .migrate_response(json!({"meta": {"code": "VALID", "scope": "account"}}))
            .unwrap();
        assert_eq!(body, json!({"meta": {"code": "VALID"}}));

        let up = Migrator::new(&registry, v("1.0"), v("1.1")).unwrap();
        let body = up.migrate_request(json!({"meta": {"key": "k"}})).unwrap();
        assert_eq!(body, json!({"meta": {"key": "k", "scope": "account"}}));
    }

    #[test]
    fn test_manifest_rejects_unknown_step_fields() {
        let misspelled = r#"{"versions": [{"version": "1.1", "steps": [
            {"name": "code", "kind": "rename_key", "from": "a", "to": "b", "directon": "request"}
        ]}]}"#;
        assert!(matches!(
            Manifest::from_json(misspelled),
            Err(VersionError::InvalidManifest(_))
        ));

        let missing = r#"{"versions": [{"version": "1.1", "steps": [
            {"name": "code", "kind": "rename_key", "from": "a"}
        ]}]}"#;
        assert!(matches!(
            Manifest::from_json(missing),
            Err(VersionError::InvalidManifest(_))
        ));

        let stray = r#"{"versions": [{"version": "1.1", "steps": [
            {"name": "gone", "kind": "remove_key", "path": "a", "value": 1}
        ]}]}"#;
        assert!(matches!(
            Manifest::from_json(stray),
            Err(VersionError::InvalidManifest(_))
        ));
    }
}
