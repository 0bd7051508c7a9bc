//! Dotted key paths over JSON payloads.
//!
//! Every accessor tolerates missing keys and non-object intermediates by
//! reporting absence rather than failing.

use std::fmt;

use serde_json::{Map, Value};

/// A path of object keys, written as `meta.code`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPath {
    segments: Vec<String>,
}

impl KeyPath {
    /// Build a path from a dotted string. Empty segments are skipped, so
    /// `""` is the root path.
    pub fn new(path: &str) -> Self {
        Self {
            segments: path
                .split('.')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// Build a path from explicit segments, allowing keys that contain dots.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether this is the root path.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// The path segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Split into parent segments and the final key.
    fn split_last(&self) -> Option<(&[String], &String)> {
        self.segments
            .split_last()
            .map(|(last, parent)| (parent, last))
    }

    /// Look up the value at this path.
    pub fn get<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.segments
            .iter()
            .try_fold(root, |node, key| node.as_object()?.get(key))
    }

    /// Whether a value exists at this path.
    pub fn exists(&self, root: &Value) -> bool {
        self.get(root).is_some()
    }

    /// Mutable lookup of the value at this path.
    pub fn get_mut<'a>(&self, root: &'a mut Value) -> Option<&'a mut Value> {
        self.segments
            .iter()
            .try_fold(root, |node, key| node.as_object_mut()?.get_mut(key))
    }

    /// Remove and return the value at this path. The root is never removed.
    ///
    /// Sibling keys keep their relative order.
    pub fn take(&self, root: &mut Value) -> Option<Value> {
        let (parent, key) = self.split_last()?;
        let parent = object_at_mut(root, parent)?;
        parent.shift_remove(key)
    }

    /// Whether `put` would succeed: every existing intermediate is an object.
    pub fn can_put(&self, root: &Value) -> bool {
        let Some((parent, _)) = self.split_last() else {
            return false;
        };

        let mut node = root;
        for key in parent {
            let Some(map) = node.as_object() else {
                return false;
            };
            match map.get(key) {
                Some(next) => node = next,
                None => return true,
            }
        }
        node.is_object()
    }

    /// Store a value at this path, creating missing intermediate objects.
    ///
    /// Returns `false`, leaving the payload unchanged, when an intermediate
    /// exists but is not an object or when the path is the root.
    pub fn put(&self, root: &mut Value, value: Value) -> bool {
        if !self.can_put(root) {
            return false;
        }
        let Some((parent, key)) = self.split_last() else {
            return false;
        };

        let mut node = root;
        for segment in parent {
            let Some(map) = node.as_object_mut() else {
                return false;
            };
            node = map
                .entry(segment.clone())
                .or_insert_with(|| Value::Object(Map::new()));
        }
        match node.as_object_mut() {
            Some(map) => {
                map.insert(key.clone(), value);
                true
            }
            None => false,
        }
    }

    /// Move the value at this path to `dest`. Returns whether anything moved.
    ///
    /// When both paths share a parent the key is renamed in place and keeps
    /// its position; an existing key at `dest` is overwritten.
    pub fn move_to(&self, dest: &KeyPath, root: &mut Value) -> bool {
        if self == dest || !self.exists(root) {
            return false;
        }
        let (Some((src_parent, src_key)), Some((dst_parent, dst_key))) =
            (self.split_last(), dest.split_last())
        else {
            return false;
        };

        if src_parent == dst_parent {
            let Some(map) = object_at_mut(root, src_parent) else {
                return false;
            };
            rename_in_place(map, src_key, dst_key);
            return true;
        }

        // Moving a value under itself has no sensible shape.
        if dest.segments.starts_with(&self.segments) {
            return false;
        }
        // Check the destination before taking, so a blocked move is a no-op.
        if !dest.can_put(root) {
            return false;
        }
        let Some(value) = self.take(root) else {
            return false;
        };
        if !dest.put(root, value) {
            return false;
        }
        let shared = src_parent
            .iter()
            .zip(dst_parent)
            .take_while(|(a, b)| a == b)
            .count();
        prune_empty(root, src_parent, shared);
        true
    }
}

/// Drop objects along `segments` left empty by a move, deepest first,
/// stopping at depth `keep`.
fn prune_empty(root: &mut Value, segments: &[String], keep: usize) {
    for depth in (keep + 1..=segments.len()).rev() {
        let emptied = object_at_mut(root, &segments[..depth]).is_some_and(|map| map.is_empty());
        if !emptied {
            return;
        }
        if let Some(parent) = object_at_mut(root, &segments[..depth - 1]) {
            parent.shift_remove(&segments[depth - 1]);
        }
    }
}

fn object_at_mut<'a>(root: &'a mut Value, segments: &[String]) -> Option<&'a mut Map<String, Value>> {
    segments
        .iter()
        .try_fold(root, |node, key| node.as_object_mut()?.get_mut(key))?
        .as_object_mut()
}

fn rename_in_place(map: &mut Map<String, Value>, from: &str, to: &str) {
    let entries = std::mem::take(map);
    for (key, value) in entries {
        if key == from {
            map.insert(to.to_string(), value);
        } else if key != to {
            map.insert(key, value);
        }
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

impl From<&str> for KeyPath {
    fn from(path: &str) -> Self {
        KeyPath::new(path)
    }
}
