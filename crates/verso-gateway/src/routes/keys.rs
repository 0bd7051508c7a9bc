//! Key validation endpoint, with a legacy variant for 1.0 clients.
//!
//! Handlers only see the canonical shape:
//!
//! ```json
//! {"meta": {"key": "...", "scope": {"fingerprint": "..."}}}
//! ```

use axum::{routing::MethodFilter, Router};
use serde_json::{json, Map, Value};
use verso_core::{SemanticVersion, VersionConstraint};

use crate::endpoint::VersionedEndpoint;
use crate::error::AppError;
use crate::AppState;

/// The validate-key endpoint and its variants.
pub fn endpoint() -> VersionedEndpoint {
    VersionedEndpoint::new("validate-key")
        .variant(
            VersionConstraint::LessOrEqual(SemanticVersion::new(1, 0)),
            |_state, payload| async move {
                Ok::<_, AppError>(validate(&payload, "NOT_FOUND", "does not exist"))
            },
        )
        .variant(VersionConstraint::Any, |_state, payload| async move {
            Ok::<_, AppError>(validate(&payload, "KEY_REQUIRED", "key is required"))
        })
}

/// Key routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/keys/validate", endpoint().into_route(MethodFilter::POST))
}

fn validate(payload: &Value, missing_code: &str, missing_detail: &str) -> Value {
    let meta = payload.get("meta");
    let key = meta.and_then(|m| m.get("key")).and_then(Value::as_str);

    let (valid, code, detail) = match key {
        None | Some("") => (false, missing_code, missing_detail),
        Some(k) if k.starts_with("revoked") => (false, "REVOKED", "is revoked"),
        Some(_) => (true, "VALID", "is valid"),
    };

    let mut out = Map::new();
    out.insert("code".to_string(), json!(code));
    out.insert("detail".to_string(), json!(detail));
    out.insert("valid".to_string(), json!(valid));
    if let Some(scope) = meta.and_then(|m| m.get("scope")) {
        out.insert("scope".to_string(), scope.clone());
    }
    let mut root = Map::new();
    root.insert("meta".to_string(), Value::Object(out));
    Value::Object(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_current() {
        let out = validate(&json!({"meta": {"key": "abc"}}), "KEY_REQUIRED", "key is required");
        assert_eq!(out, json!({"meta": {"code": "VALID", "detail": "is valid", "valid": true}}));

        let out = validate(&json!({}), "KEY_REQUIRED", "key is required");
        assert_eq!(out["meta"]["code"], json!("KEY_REQUIRED"));

        let out = validate(&json!({"meta": {"key": "revoked-1"}}), "KEY_REQUIRED", "key is required");
        assert_eq!(out["meta"]["valid"], json!(false));
    }

    #[test]
    fn test_validate_echoes_scope() {
        let out = validate(
            &json!({"meta": {"key": "abc", "scope": {"fingerprint": "f"}}}),
            "KEY_REQUIRED",
            "key is required",
        );
        assert_eq!(out["meta"]["scope"], json!({"fingerprint": "f"}));
    }
}
