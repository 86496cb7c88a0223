//! Field projection of command payloads.
//!
//! Callers name the parts of a response they care about as dot-delimited
//! paths (`fields.status.name`). Projection keeps only those parts, walking
//! into every element when a path crosses a sequence. Paths that match
//! nothing are dropped without complaint; paths that resolve to `null` keep
//! the `null` so callers can tell "no such field" from "field with no value".

use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// Prefix tree of requested paths.
#[derive(Debug, Default)]
struct PathTree {
    children: BTreeMap<String, PathTree>,
    terminal: bool,
}

impl PathTree {
    fn from_paths(paths: &[String]) -> Self {
        let mut root = Self::default();
        for path in paths {
            let trimmed = path.trim();
            if trimmed.is_empty() || trimmed.split('.').any(str::is_empty) {
                continue;
            }
            root.insert(trimmed.split('.'));
        }
        root
    }

    fn insert<'a>(&mut self, segments: impl Iterator<Item = &'a str>) {
        let mut node = self;
        for segment in segments {
            if node.terminal {
                return;
            }
            node = node.children.entry(segment.to_owned()).or_default();
        }
        node.terminal = true;
        node.children.clear();
    }

    fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// Projects `raw` down to `field_paths`.
///
/// An empty path list, or one containing only unusable paths, returns `raw`
/// unchanged. Scalars at the top level are returned unchanged as well since
/// they have no fields to select. `raw` is never mutated and projecting an
/// already-projected value with the same paths yields the same value.
#[must_use]
pub fn project(raw: &Value, field_paths: &[String]) -> Value {
    let tree = PathTree::from_paths(field_paths);
    if tree.is_empty() {
        return raw.clone();
    }
    match raw {
        Value::Object(_) => project_node(raw, &tree).unwrap_or_else(|| Value::Object(Map::new())),
        Value::Array(items) => Value::Array(project_elements(items, &tree)),
        _ => raw.clone(),
    }
}

/// Projects one node; `None` means nothing under it matched.
fn project_node(value: &Value, tree: &PathTree) -> Option<Value> {
    match value {
        Value::Object(object) => {
            let mut projected = Map::new();
            for (key, subtree) in &tree.children {
                let Some(child) = object.get(key) else {
                    continue;
                };
                if subtree.terminal {
                    projected.insert(key.clone(), child.clone());
                } else if let Some(inner) = project_node(child, subtree) {
                    projected.insert(key.clone(), inner);
                }
            }
            (!projected.is_empty()).then_some(Value::Object(projected))
        }
        Value::Array(items) => {
            let matched = items.iter().any(|item| project_node(item, tree).is_some());
            matched.then(|| Value::Array(project_elements(items, tree)))
        }
        _ => None,
    }
}

/// Element positions are preserved; unmatched elements become `{}`.
fn project_elements(items: &[Value], tree: &PathTree) -> Vec<Value> {
    items
        .iter()
        .map(|item| project_node(item, tree).unwrap_or_else(|| Value::Object(Map::new())))
        .collect()
}
