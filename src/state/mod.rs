//! State Engine - immutable snapshots and reversible transitions.
//!
//! A component's state is an `Rc<Value>` that is replaced on every change and
//! never mutated in place. [`produce`] runs a mutation against a draft copy,
//! diffs the draft against the base and returns a [`PatchPair`] describing the
//! transition in both directions. An empty diff produces nothing, which lets
//! callers skip notifications and hand back the original snapshot.
//!
//! ```ignore
//! use serde_json::json;
//! use std::rc::Rc;
//!
//! let base = Rc::new(json!({ "checked": false }));
//! let pair = state::produce(&base, |draft| draft["checked"] = json!(true), true).unwrap();
//!
//! assert_eq!(state::apply_patches(&base, &pair.patches).unwrap(), *pair.value);
//! assert_eq!(state::apply_patches(&pair.value, &pair.inverse_patches).unwrap(), *base);
//! ```

mod patch;

pub use patch::*;

use std::convert::Infallible;
use std::rc::Rc;

use serde_json::Value;

// =============================================================================
// Types
// =============================================================================

/// The result of one non-empty state transition.
#[derive(Clone, Debug, PartialEq)]
pub struct PatchPair {
    /// Operations turning `previous` into `value`.
    pub patches: Vec<PatchOp>,
    /// Operations turning `value` back into `previous`.
    pub inverse_patches: Vec<PatchOp>,
    /// The new snapshot.
    pub value: Rc<Value>,
    /// The snapshot the transition started from.
    pub previous: Rc<Value>,
    /// Whether undo history should record this transition.
    pub record: bool,
}

/// Notification delivered to state-change subscribers.
#[derive(Clone, Debug, PartialEq)]
pub struct StateChange {
    pub old_state: Rc<Value>,
    pub new_state: Rc<Value>,
    pub record: bool,
}

// =============================================================================
// Produce
// =============================================================================

/// Run `recipe` against a draft of `base`.
///
/// Returns `None` when the draft ends up equal to `base`.
pub fn produce(
    base: &Rc<Value>,
    recipe: impl FnOnce(&mut Value),
    record: bool,
) -> Option<PatchPair> {
    let result: Result<Option<PatchPair>, Infallible> = try_produce(
        base,
        |draft| {
            recipe(draft);
            Ok(())
        },
        record,
    );
    match result {
        Ok(pair) => pair,
        Err(never) => match never {},
    }
}

/// Fallible [`produce`]. When `recipe` fails the draft is discarded.
pub fn try_produce<E>(
    base: &Rc<Value>,
    recipe: impl FnOnce(&mut Value) -> Result<(), E>,
    record: bool,
) -> Result<Option<PatchPair>, E> {
    let mut draft = Value::clone(base);
    recipe(&mut draft)?;

    let (patches, inverse_patches) = diff(base, &draft);
    if patches.is_empty() && inverse_patches.is_empty() {
        return Ok(None);
    }

    Ok(Some(PatchPair {
        patches,
        inverse_patches,
        value: Rc::new(draft),
        previous: base.clone(),
        record,
    }))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_noop_recipe_produces_nothing() {
        let base = Rc::new(json!({ "level": 2 }));

        assert!(produce(&base, |_| {}, true).is_none());
        // Writing the same value back is still a no-op
        assert!(produce(&base, |draft| draft["level"] = json!(2), false).is_none());
    }

    #[test]
    fn test_produce_pair_is_symmetric() {
        let cases: [(Value, fn(&mut Value)); 3] = [
            (json!(null), |d: &mut Value| *d = json!({ "open": true })),
            (json!({ "items": [1, 2, 3] }), |d: &mut Value| {
                d["items"].as_array_mut().unwrap().truncate(1)
            }),
            (json!({ "lang": "rust", "lines": 3 }), |d: &mut Value| {
                d.as_object_mut().unwrap().remove("lang");
                d["lines"] = json!(4);
                d["theme"] = json!("dark");
            }),
        ];

        for (initial, recipe) in cases {
            let base = Rc::new(initial);
            let pair = produce(&base, recipe, false).expect("transition");

            assert!(Rc::ptr_eq(&pair.previous, &base));
            assert_eq!(apply_patches(&base, &pair.patches).unwrap(), *pair.value);
            assert_eq!(apply_patches(&pair.value, &pair.inverse_patches).unwrap(), *base);
        }
    }

    #[test]
    fn test_failed_recipe_leaves_base_untouched() {
        let base = Rc::new(json!({ "count": 1 }));

        let result: Result<Option<PatchPair>, &str> = try_produce(
            &base,
            |draft| {
                draft["count"] = json!(99);
                Err("rejected")
            },
            true,
        );

        assert_eq!(result, Err("rejected"));
        assert_eq!(*base, json!({ "count": 1 }));
    }

    #[test]
    fn test_record_flag_is_carried() {
        let base = Rc::new(json!(1));
        let pair = produce(&base, |d| *d = json!(2), true).unwrap();
        assert!(pair.record);
        assert_eq!(pair.patches, vec![PatchOp::Replace { path: vec![], value: json!(2) }]);
    }
}
