//! Migration steps.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::path::KeyPath;
use crate::registry::Direction;
use crate::transform::{RenameKey, Transform};

/// One breaking change, expressed as optional request and response
/// transforms.
///
/// Request transforms move an older payload up towards the step's anchor
/// version; response transforms move a newer payload back down. A missing
/// transform is the identity.
#[derive(Clone)]
pub struct MigrationStep {
    name: String,
    request: Option<Arc<dyn Transform>>,
    response: Option<Arc<dyn Transform>>,
}

impl MigrationStep {
    /// Create a step with no transforms.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            request: None,
            response: None,
        }
    }

    /// A key rename between versions: requests move `old` to `new`,
    /// responses move `new` back to `old`.
    pub fn rename(
        name: impl Into<String>,
        old: impl Into<KeyPath>,
        new: impl Into<KeyPath>,
    ) -> Self {
        let forward = RenameKey::new(old, new);
        let backward = forward.reversed();
        Self::new(name).with_request(forward).with_response(backward)
    }

    /// Set the request transform.
    pub fn with_request(mut self, transform: impl Transform + 'static) -> Self {
        self.request = Some(Arc::new(transform));
        self
    }

    /// Set the response transform.
    pub fn with_response(mut self, transform: impl Transform + 'static) -> Self {
        self.response = Some(Arc::new(transform));
        self
    }

    /// Step name, used in logs and chain inspection.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the step transforms payloads in the given direction.
    pub fn handles(&self, direction: Direction) -> bool {
        match direction {
            Direction::Request => self.request.is_some(),
            Direction::Response => self.response.is_some(),
        }
    }

    /// Apply the request transform, or return the payload unchanged.
    pub fn apply_request(&self, payload: Value) -> Value {
        match &self.request {
            Some(transform) => transform.apply(payload),
            None => payload,
        }
    }

    /// Apply the response transform, or return the payload unchanged.
    pub fn apply_response(&self, payload: Value) -> Value {
        match &self.response {
            Some(transform) => transform.apply(payload),
            None => payload,
        }
    }

    /// Apply the transform for `direction`.
    pub fn apply(&self, direction: Direction, payload: Value) -> Value {
        match direction {
            Direction::Request => self.apply_request(payload),
            Direction::Response => self.apply_response(payload),
        }
    }
}

impl fmt::Debug for MigrationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationStep")
            .field("name", &self.name)
            .field("request", &self.request.is_some())
            .field("response", &self.response.is_some())
            .finish()
    }
}
