//! Change records emitted by components and slots.
//!
//! An [`Operation`] pairs the actions that perform a change with the actions
//! that revert it. `path` locates the changed node from the emitter downwards:
//! each container that forwards an operation prepends its own index.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::state::PatchOp;
use crate::types::{SlotContentLiteral, SlotLiteral};

/// A single step of an operation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Action {
    /// Move the cursor to `offset`.
    Retain { offset: usize },
    /// Insert content at the cursor.
    Insert { content: SlotContentLiteral },
    /// Delete `count` units after the cursor.
    Delete { count: usize },
    /// Insert a slot at the cursor of a slot list.
    InsertSlot { slot: SlotLiteral },
    /// Apply state patches; `value` is the state they produce.
    Apply {
        patches: Vec<PatchOp>,
        value: Value,
        record: bool,
    },
}

/// A reversible change record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub path: Vec<usize>,
    pub apply: Vec<Action>,
    #[serde(rename = "unApply")]
    pub unapply: Vec<Action>,
}

impl Operation {
    /// Copy of this operation with `index` prepended to its path.
    pub fn with_prefix(&self, index: usize) -> Self {
        let mut path = Vec::with_capacity(self.path.len() + 1);
        path.push(index);
        path.extend_from_slice(&self.path);
        Self {
            path,
            apply: self.apply.clone(),
            unapply: self.unapply.clone(),
        }
    }

    /// False when a state action in this operation opted out of undo history.
    pub fn is_recorded(&self) -> bool {
        self.apply.iter().all(|action| match action {
            Action::Apply { record, .. } => *record,
            _ => true,
        })
    }
}

/// Whether a change happened in the emitter itself or below it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    /// The emitter's own content or state changed.
    Dirty,
    /// A descendant changed.
    Changed,
}

/// An operation tagged with its [`ChangeKind`].
#[derive(Clone, Debug, PartialEq)]
pub struct Change {
    pub kind: ChangeKind,
    pub operation: Operation,
}
