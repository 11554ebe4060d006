//! Core types shared across the engine.
//!
//! - [`ContentType`] - how a component sits inside its parent slot
//! - Literals - plain serializable snapshots of components and slots
//! - Shortcuts - keymap descriptors registered by components at setup

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// Content Type
// =============================================================================

/// Kind of content a slot accepts or a component represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    /// Plain text runs.
    #[default]
    Text,
    /// A component that flows inline with text.
    InlineComponent,
    /// A component that occupies its own block.
    BlockComponent,
}

// =============================================================================
// Literals
// =============================================================================

/// Serializable snapshot of a component.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComponentLiteral {
    pub name: String,
    /// `null` when the component never had state.
    pub state: Value,
    pub slots: Vec<SlotLiteral>,
}

/// Serializable snapshot of a slot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SlotLiteral {
    pub schema: Vec<ContentType>,
    pub content: Vec<SlotContentLiteral>,
}

/// One entry of [`SlotLiteral::content`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SlotContentLiteral {
    Text(String),
    Component(ComponentLiteral),
}

// =============================================================================
// Shortcuts
// =============================================================================

bitflags::bitflags! {
    /// Modifier keys a keymap requires.
    ///
    /// Combine with bitwise OR: `Modifiers::CTRL | Modifiers::SHIFT`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const CTRL = 1 << 0;
        const SHIFT = 1 << 1;
        const ALT = 1 << 2;
        const META = 1 << 3;
    }
}

/// Key combination a shortcut responds to.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Keymap {
    /// Accepted key names (e.g. `"Enter"`, `"b"`); any one of them matches.
    pub keys: Vec<String>,
    pub modifiers: Modifiers,
}

impl Keymap {
    /// Keymap for a single key without modifiers.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            keys: vec![key.into()],
            modifiers: Modifiers::empty(),
        }
    }

    /// Keymap for a single key with modifiers.
    pub fn with_modifiers(key: impl Into<String>, modifiers: Modifiers) -> Self {
        Self {
            keys: vec![key.into()],
            modifiers,
        }
    }

    /// Keymap accepting any of `keys`.
    pub fn any_of<I, S>(keys: I, modifiers: Modifiers) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            modifiers,
        }
    }
}

/// Action run for a shortcut. Receives the key name; return true to consume.
pub type ShortcutAction = Rc<dyn Fn(&str) -> bool>;

/// A keymap bound to an action.
#[derive(Clone)]
pub struct Shortcut {
    pub keymap: Keymap,
    pub action: ShortcutAction,
}

impl Shortcut {
    pub fn new(keymap: Keymap, action: impl Fn(&str) -> bool + 'static) -> Self {
        Self {
            keymap,
            action: Rc::new(action),
        }
    }
}

impl fmt::Debug for Shortcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shortcut")
            .field("keymap", &self.keymap)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_content_type_names() {
        assert_eq!(serde_json::to_value(ContentType::InlineComponent).unwrap(), json!("inline_component"));
        assert_eq!(ContentType::default(), ContentType::Text);
    }

    #[test]
    fn test_slot_content_literal_is_untagged() {
        let literal = SlotLiteral {
            schema: vec![ContentType::Text, ContentType::InlineComponent],
            content: vec![
                SlotContentLiteral::Text("Hi ".into()),
                SlotContentLiteral::Component(ComponentLiteral {
                    name: "mention".into(),
                    state: json!({ "user": "ana" }),
                    slots: vec![],
                }),
            ],
        };

        let value = serde_json::to_value(&literal).unwrap();
        assert_eq!(
            value,
            json!({
                "schema": ["text", "inline_component"],
                "content": ["Hi ", { "name": "mention", "state": { "user": "ana" }, "slots": [] }]
            })
        );

        let back: SlotLiteral = serde_json::from_value(value).unwrap();
        assert_eq!(back, literal);
    }

    #[test]
    fn test_keymap_constructors() {
        let save = Keymap::with_modifiers("s", Modifiers::CTRL);
        assert_eq!(save.keys, vec!["s".to_string()]);
        assert!(save.modifiers.contains(Modifiers::CTRL));

        let arrows = Keymap::any_of(["ArrowUp", "ArrowDown"], Modifiers::ALT | Modifiers::SHIFT);
        assert_eq!(arrows.keys.len(), 2);
        assert!(!arrows.modifiers.contains(Modifiers::CTRL));
    }

    #[test]
    fn test_shortcut_action() {
        let shortcut = Shortcut::new(Keymap::new("Enter"), |key| key == "Enter");
        assert!((shortcut.action)("Enter"));
        assert!(!(shortcut.action)("Tab"));
    }
}
