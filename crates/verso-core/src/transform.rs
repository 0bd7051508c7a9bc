//! Payload transforms.
//!
//! A transform is a pure mapping from one JSON payload to another. Built-in
//! transforms are structural reshapes that treat an unexpected payload shape
//! as "nothing to do".

use serde_json::Value;

use crate::path::KeyPath;

/// A payload transform applied by a migration step.
pub trait Transform: Send + Sync {
    /// Transform an owned payload.
    fn apply(&self, payload: Value) -> Value;
}

impl<F> Transform for F
where
    F: Fn(Value) -> Value + Send + Sync,
{
    fn apply(&self, payload: Value) -> Value {
        self(payload)
    }
}

/// Move the value at `from` to `to`, if present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameKey {
    /// Source path.
    pub from: KeyPath,
    /// Destination path.
    pub to: KeyPath,
}

impl RenameKey {
    /// Create a rename between two dotted paths.
    pub fn new(from: impl Into<KeyPath>, to: impl Into<KeyPath>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// The same rename in the opposite direction.
    pub fn reversed(&self) -> Self {
        Self {
            from: self.to.clone(),
            to: self.from.clone(),
        }
    }
}

impl Transform for RenameKey {
    fn apply(&self, mut payload: Value) -> Value {
        self.from.move_to(&self.to, &mut payload);
        payload
    }
}

/// Drop the value at a path, if present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveKey(pub KeyPath);

impl RemoveKey {
    /// Create a removal for a dotted path.
    pub fn new(path: impl Into<KeyPath>) -> Self {
        Self(path.into())
    }
}

impl Transform for RemoveKey {
    fn apply(&self, mut payload: Value) -> Value {
        self.0.take(&mut payload);
        payload
    }
}

/// Insert a value at a path only when nothing is there yet.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertDefault {
    /// Target path.
    pub path: KeyPath,
    /// Value inserted when the path is absent.
    pub value: Value,
}

impl InsertDefault {
    /// Create a default insertion.
    pub fn new(path: impl Into<KeyPath>, value: Value) -> Self {
        Self {
            path: path.into(),
            value,
        }
    }
}

impl Transform for InsertDefault {
    fn apply(&self, mut payload: Value) -> Value {
        if !self.path.exists(&payload) {
            self.path.put(&mut payload, self.value.clone());
        }
        payload
    }
}

/// Apply a transform to the value at `scope`, or to each of its elements
/// when that value is an array.
///
/// Handy for envelopes like `{"data": {...}}` versus `{"data": [...]}`.
pub struct Each {
    scope: KeyPath,
    inner: Box<dyn Transform>,
}

impl Each {
    /// Scope `inner` under a dotted path.
    pub fn new(scope: impl Into<KeyPath>, inner: impl Transform + 'static) -> Self {
        Self {
            scope: scope.into(),
            inner: Box::new(inner),
        }
    }
}

impl std::fmt::Debug for Each {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Each").field("scope", &self.scope).finish_non_exhaustive()
    }
}

impl Transform for Each {
    fn apply(&self, payload: Value) -> Value {
        apply_each(&self.scope, self.inner.as_ref(), payload)
    }
}

/// Apply `inner` at `scope`, element-wise when the scoped value is an array.
pub fn apply_each(scope: &KeyPath, inner: &dyn Transform, mut payload: Value) -> Value {
    let Some(target) = scope.get_mut(&mut payload) else {
        return payload;
    };

    match target {
        Value::Array(items) => {
            for item in items.iter_mut() {
                let owned = std::mem::take(item);
                *item = inner.apply(owned);
            }
        }
        other => {
            let owned = std::mem::take(other);
            *other = inner.apply(owned);
        }
    }
    payload
}
