//! Built-in demonstration migrations.
//!
//! | Version | Breaking change |
//! |---------|-----------------|
//! | 1.0 | baseline |
//! | 1.1 | validation `meta.constant` renamed to `meta.code` |
//! | 1.2 | `meta.fingerprint` moved under `meta.scope.fingerprint` |

use verso_core::{MigrationRegistry, MigrationStep, SemanticVersion, VersionError};

/// Register the demonstration migrations.
pub fn register_demo_migrations(registry: &mut MigrationRegistry) -> Result<(), VersionError> {
    registry.register(SemanticVersion::new(1, 0), vec![])?;
    registry.register(
        SemanticVersion::new(1, 1),
        vec![MigrationStep::rename(
            "validation-code",
            "meta.constant",
            "meta.code",
        )],
    )?;
    registry.register(
        SemanticVersion::new(1, 2),
        vec![MigrationStep::rename(
            "scoped-fingerprint",
            "meta.fingerprint",
            "meta.scope.fingerprint",
        )],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use verso_core::Migrator;

    #[test]
    fn test_demo_chain() {
        let mut registry = MigrationRegistry::new(SemanticVersion::new(1, 2));
        register_demo_migrations(&mut registry).unwrap();

        let migrator =
            Migrator::new(&registry, SemanticVersion::new(1, 0), SemanticVersion::new(1, 2)).unwrap();
        assert_eq!(
            migrator.chain().step_names(),
            vec!["validation-code", "scoped-fingerprint"]
        );

        let out = migrator
            .migrate_request(json!({"meta": {"key": "k", "fingerprint": "f"}}))
            .unwrap();
        assert_eq!(out, json!({"meta": {"key": "k", "scope": {"fingerprint": "f"}}}));
    }
}
