//! Structural diff and patch application over JSON values.
//!
//! Objects are compared key by key, arrays index by index with additions and
//! removals at the tail, anything else by replacement. The inverse list is the
//! per-operation inverses in reverse order, so applying it to the new value
//! walks the changes back.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

// =============================================================================
// Types
// =============================================================================

/// One step of a path into a value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathKey {
    Index(usize),
    Key(String),
}

impl From<usize> for PathKey {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<&str> for PathKey {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

/// A single patch operation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOp {
    /// Insert an object key or an array element (shifting later elements).
    Add { path: Vec<PathKey>, value: Value },
    /// Delete an object key or an array element.
    Remove { path: Vec<PathKey> },
    /// Overwrite the value at `path`.
    Replace { path: Vec<PathKey>, value: Value },
}

impl PatchOp {
    pub fn path(&self) -> &[PathKey] {
        match self {
            PatchOp::Add { path, .. } | PatchOp::Remove { path } | PatchOp::Replace { path, .. } => path,
        }
    }
}

/// Render a path as a JSON pointer (`/items/0/title`).
pub fn pointer(path: &[PathKey]) -> String {
    if path.is_empty() {
        return String::from("/");
    }
    path.iter()
        .map(|key| match key {
            PathKey::Index(index) => format!("/{index}"),
            PathKey::Key(key) => format!("/{}", key.replace('~', "~0").replace('/', "~1")),
        })
        .collect()
}

// =============================================================================
// Diff
// =============================================================================

/// Compute the forward and inverse operation lists turning `old` into `new`.
///
/// Both lists are empty when the values are equal.
pub fn diff(old: &Value, new: &Value) -> (Vec<PatchOp>, Vec<PatchOp>) {
    let mut forward = Vec::new();
    let mut inverse = Vec::new();
    let mut path = Vec::new();
    diff_into(old, new, &mut path, &mut forward, &mut inverse);
    inverse.reverse();
    (forward, inverse)
}

fn diff_into(
    old: &Value,
    new: &Value,
    path: &mut Vec<PathKey>,
    forward: &mut Vec<PatchOp>,
    inverse: &mut Vec<PatchOp>,
) {
    if old == new {
        return;
    }

    match (old, new) {
        (Value::Object(before), Value::Object(after)) => {
            for (key, old_value) in before {
                path.push(PathKey::Key(key.clone()));
                match after.get(key) {
                    Some(new_value) => diff_into(old_value, new_value, path, forward, inverse),
                    None => {
                        forward.push(PatchOp::Remove { path: path.clone() });
                        inverse.push(PatchOp::Add {
                            path: path.clone(),
                            value: old_value.clone(),
                        });
                    }
                }
                path.pop();
            }
            for (key, new_value) in after {
                if before.contains_key(key) {
                    continue;
                }
                path.push(PathKey::Key(key.clone()));
                forward.push(PatchOp::Add {
                    path: path.clone(),
                    value: new_value.clone(),
                });
                inverse.push(PatchOp::Remove { path: path.clone() });
                path.pop();
            }
        }
        (Value::Array(before), Value::Array(after)) => {
            let common = before.len().min(after.len());
            for index in 0..common {
                path.push(PathKey::Index(index));
                diff_into(&before[index], &after[index], path, forward, inverse);
                path.pop();
            }

            // Growth appends ascending; shrinking removes from the end so
            // earlier indices stay valid while the list is applied.
            if after.len() > before.len() {
                for (index, value) in after.iter().enumerate().skip(common) {
                    path.push(PathKey::Index(index));
                    forward.push(PatchOp::Add {
                        path: path.clone(),
                        value: value.clone(),
                    });
                    inverse.push(PatchOp::Remove { path: path.clone() });
                    path.pop();
                }
            } else {
                for index in (common..before.len()).rev() {
                    path.push(PathKey::Index(index));
                    forward.push(PatchOp::Remove { path: path.clone() });
                    inverse.push(PatchOp::Add {
                        path: path.clone(),
                        value: before[index].clone(),
                    });
                    path.pop();
                }
            }
        }
        _ => {
            forward.push(PatchOp::Replace {
                path: path.clone(),
                value: new.clone(),
            });
            inverse.push(PatchOp::Replace {
                path: path.clone(),
                value: old.clone(),
            });
        }
    }
}

// =============================================================================
// Apply
// =============================================================================

/// Apply `patches` in order to a copy of `base`.
pub fn apply_patches(base: &Value, patches: &[PatchOp]) -> Result<Value> {
    let mut target = base.clone();
    for patch in patches {
        apply_patch(&mut target, patch)?;
    }
    Ok(target)
}

fn apply_patch(target: &mut Value, patch: &PatchOp) -> Result<()> {
    let Some((last, parent_path)) = patch.path().split_last() else {
        // Root operation
        *target = match patch {
            PatchOp::Add { value, .. } | PatchOp::Replace { value, .. } => value.clone(),
            PatchOp::Remove { .. } => Value::Null,
        };
        return Ok(());
    };

    let parent = resolve_mut(target, parent_path)
        .ok_or_else(|| patch_error(patch, "parent path does not exist"))?;

    match (parent, last, patch) {
        (
            Value::Object(map),
            PathKey::Key(key),
            PatchOp::Add { value, .. } | PatchOp::Replace { value, .. },
        ) => {
            map.insert(key.clone(), value.clone());
        }
        (Value::Object(map), PathKey::Key(key), PatchOp::Remove { .. }) => {
            if map.remove(key).is_none() {
                return Err(patch_error(patch, "key does not exist"));
            }
        }
        (Value::Array(items), PathKey::Index(index), PatchOp::Add { value, .. }) => {
            if *index > items.len() {
                return Err(patch_error(patch, "index out of bounds"));
            }
            items.insert(*index, value.clone());
        }
        (Value::Array(items), PathKey::Index(index), PatchOp::Replace { value, .. }) => {
            let slot = items
                .get_mut(*index)
                .ok_or_else(|| patch_error(patch, "index out of bounds"))?;
            *slot = value.clone();
        }
        (Value::Array(items), PathKey::Index(index), PatchOp::Remove { .. }) => {
            if *index >= items.len() {
                return Err(patch_error(patch, "index out of bounds"));
            }
            items.remove(*index);
        }
        _ => return Err(patch_error(patch, "path does not match the container type")),
    }
    Ok(())
}

fn resolve_mut<'a>(value: &'a mut Value, path: &[PathKey]) -> Option<&'a mut Value> {
    let mut current = value;
    for key in path {
        current = match (current, key) {
            (Value::Object(map), PathKey::Key(key)) => map.get_mut(key)?,
            (Value::Array(items), PathKey::Index(index)) => items.get_mut(*index)?,
            _ => return None,
        };
    }
    Some(current)
}

fn patch_error(patch: &PatchOp, reason: &str) -> Error {
    Error::Patch {
        path: pointer(patch.path()),
        reason: reason.to_string(),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn assert_symmetric(old: Value, new: Value) {
        let (forward, inverse) = diff(&old, &new);
        assert_eq!(apply_patches(&old, &forward).unwrap(), new, "forward: {forward:?}");
        assert_eq!(apply_patches(&new, &inverse).unwrap(), old, "inverse: {inverse:?}");
    }

    #[test]
    fn test_equal_values_produce_no_ops() {
        let value = json!({ "a": [1, 2, { "b": null }] });
        let (forward, inverse) = diff(&value, &value.clone());
        assert!(forward.is_empty());
        assert!(inverse.is_empty());
    }

    #[test]
    fn test_object_key_changes() {
        let old = json!({ "title": "Intro", "level": 1, "stale": true });
        let new = json!({ "title": "Overview", "level": 1, "anchor": "top" });

        let (forward, _) = diff(&old, &new);
        assert_eq!(forward.len(), 3);
        assert!(forward.contains(&PatchOp::Replace {
            path: vec!["title".into()],
            value: json!("Overview"),
        }));
        assert!(forward.contains(&PatchOp::Remove { path: vec!["stale".into()] }));

        assert_symmetric(old, new);
    }

    #[test]
    fn test_array_growth_and_shrink() {
        assert_symmetric(json!([1, 2]), json!([1, 2, 3, 4]));
        assert_symmetric(json!([1, 2, 3, 4]), json!([9]));
        assert_symmetric(json!({ "rows": [[1], [2, 3]] }), json!({ "rows": [[1, 5]] }));
    }

    #[test]
    fn test_shrink_removes_from_the_end() {
        let (forward, inverse) = diff(&json!(["a", "b", "c"]), &json!(["a"]));
        assert_eq!(
            forward,
            vec![
                PatchOp::Remove { path: vec![2.into()] },
                PatchOp::Remove { path: vec![1.into()] },
            ]
        );
        assert_eq!(
            inverse,
            vec![
                PatchOp::Add { path: vec![1.into()], value: json!("b") },
                PatchOp::Add { path: vec![2.into()], value: json!("c") },
            ]
        );
    }

    #[test]
    fn test_type_change_replaces() {
        let (forward, _) = diff(&json!({ "a": [1] }), &json!({ "a": { "x": 1 } }));
        assert_eq!(
            forward,
            vec![PatchOp::Replace { path: vec!["a".into()], value: json!({ "x": 1 }) }]
        );
        assert_symmetric(Value::Null, json!({ "fresh": true }));
        assert_symmetric(json!("text"), json!(42));
    }

    #[test]
    fn test_nested_document_state() {
        let old = json!({
            "type": "table",
            "cells": [{ "colspan": 1 }, { "colspan": 2, "rowspan": 1 }],
            "meta": { "caption": null }
        });
        let new = json!({
            "type": "table",
            "cells": [{ "colspan": 3 }, { "rowspan": 1 }, { "colspan": 1 }],
            "meta": { "caption": "Totals", "border": true }
        });
        assert_symmetric(old, new);
    }

    #[test]
    fn test_apply_rejects_missing_path() {
        let err = apply_patches(
            &json!({ "a": 1 }),
            &[PatchOp::Remove { path: vec!["b".into()] }],
        )
        .unwrap_err();
        assert!(matches!(err, Error::Patch { ref path, .. } if path == "/b"));

        let err = apply_patches(
            &json!([1]),
            &[PatchOp::Replace { path: vec!["x".into(), 0.into()], value: json!(1) }],
        )
        .unwrap_err();
        assert!(matches!(err, Error::Patch { .. }));
    }

    #[test]
    fn test_pointer_escapes_keys() {
        assert_eq!(pointer(&[]), "/");
        assert_eq!(pointer(&["a/b".into(), 0.into(), "c~d".into()]), "/a~1b/0/c~0d");
    }

    #[test]
    fn test_patch_serializes_as_json_patch() {
        let op = PatchOp::Add { path: vec!["items".into(), 0.into()], value: json!("x") };
        assert_eq!(
            serde_json::to_value(&op).unwrap(),
            json!({ "op": "add", "path": ["items", 0], "value": "x" })
        );
    }
}
