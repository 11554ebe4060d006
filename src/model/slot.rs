//! Slots - child content containers of a component.
//!
//! A [`Slot`] holds text runs and embedded components. It is the only place
//! that sets or clears a component's `parent` back-reference: inserting a
//! component attaches it, removing it detaches it.
//!
//! Change flow:
//!
//! ```text
//! child ChangeMarker ──(Changed, +offset)──► Slot ──(+slot index)──► Slots ──► owner ChangeMarker
//!                       Slot edits (Dirty) ──┘
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::component::{ComponentInstance, ComponentRef};
use crate::model::{Action, Change, ChangeKind, Operation};
use crate::subscription::{Emitter, Subscription};
use crate::types::{ContentType, SlotContentLiteral, SlotLiteral};

// =============================================================================
// Slot
// =============================================================================

enum Entry {
    Text(String),
    Component {
        component: ComponentRef,
        subscription: Subscription,
    },
}

impl Entry {
    fn length(&self) -> usize {
        match self {
            Entry::Text(text) => text.chars().count(),
            Entry::Component { .. } => 1,
        }
    }
}

/// Ordered text and component content accepted according to a schema.
pub struct Slot {
    this: Weak<Slot>,
    schema: Vec<ContentType>,
    content: RefCell<Vec<Entry>>,
    parent: RefCell<Weak<ComponentInstance>>,
    changes: Emitter<Change>,
}

impl Slot {
    /// Create an empty slot accepting `schema`.
    pub fn new(schema: Vec<ContentType>) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            this: this.clone(),
            schema,
            content: RefCell::new(Vec::new()),
            parent: RefCell::new(Weak::new()),
            changes: Emitter::new(),
        })
    }

    pub fn schema(&self) -> &[ContentType] {
        &self.schema
    }

    /// Length in content units: one per character, one per component.
    pub fn length(&self) -> usize {
        self.content.borrow().iter().map(Entry::length).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.length() == 0
    }

    /// The component whose [`Slots`] contain this slot.
    pub fn parent(&self) -> Option<ComponentRef> {
        self.parent.borrow().upgrade()
    }

    pub(crate) fn set_parent(&self, owner: Weak<ComponentInstance>) {
        *self.parent.borrow_mut() = owner;
    }

    /// Components embedded in this slot, in content order.
    pub fn components(&self) -> Vec<ComponentRef> {
        self.content
            .borrow()
            .iter()
            .filter_map(|entry| match entry {
                Entry::Component { component, .. } => Some(component.clone()),
                Entry::Text(_) => None,
            })
            .collect()
    }

    /// Offset of `component` inside this slot.
    pub fn index_of(&self, component: &ComponentRef) -> Option<usize> {
        let mut offset = 0;
        for entry in self.content.borrow().iter() {
            if let Entry::Component { component: current, .. } = entry {
                if Rc::ptr_eq(current, component) {
                    return Some(offset);
                }
            }
            offset += entry.length();
        }
        None
    }

    /// Append `text`. Returns false when the schema does not accept text.
    pub fn insert_text(&self, text: &str) -> bool {
        if text.is_empty() || !self.schema.contains(&ContentType::Text) {
            return false;
        }

        let offset = self.length();
        {
            let mut content = self.content.borrow_mut();
            match content.last_mut() {
                Some(Entry::Text(last)) => last.push_str(text),
                _ => content.push(Entry::Text(text.to_string())),
            }
        }

        self.emit_dirty(Operation {
            path: Vec::new(),
            apply: vec![
                Action::Retain { offset },
                Action::Insert { content: SlotContentLiteral::Text(text.to_string()) },
            ],
            unapply: vec![
                Action::Retain { offset },
                Action::Delete { count: text.chars().count() },
            ],
        });
        true
    }

    /// Append `component`, moving it out of any slot it was attached to.
    ///
    /// Returns false when the schema does not accept the component's content type.
    pub fn insert_component(&self, component: &ComponentRef) -> bool {
        if !self.schema.contains(&component.content_type()) {
            return false;
        }
        if let Some(previous) = component.parent() {
            previous.remove_component(component);
        }

        let slot = self.this.clone();
        let child = Rc::downgrade(component);
        let subscription = component.change_marker().on_change(move |operation| {
            let (Some(slot), Some(child)) = (slot.upgrade(), child.upgrade()) else {
                return;
            };
            if let Some(index) = slot.index_of(&child) {
                slot.changes.emit(&Change {
                    kind: ChangeKind::Changed,
                    operation: operation.with_prefix(index),
                });
            }
        });

        let offset = self.length();
        self.content.borrow_mut().push(Entry::Component {
            component: component.clone(),
            subscription,
        });
        component.set_parent(self.this.clone());

        let literal = SlotContentLiteral::Component(component.to_json());
        self.emit_dirty(Operation {
            path: Vec::new(),
            apply: vec![Action::Retain { offset }, Action::Insert { content: literal }],
            unapply: vec![Action::Retain { offset }, Action::Delete { count: 1 }],
        });
        true
    }

    /// Remove `component` and clear its back-reference.
    pub fn remove_component(&self, component: &ComponentRef) -> bool {
        let Some(offset) = self.index_of(component) else {
            return false;
        };

        let removed = {
            let mut content = self.content.borrow_mut();
            let position = content.iter().position(|entry| {
                matches!(entry, Entry::Component { component: current, .. } if Rc::ptr_eq(current, component))
            });
            position.map(|position| content.remove(position))
        };
        if let Some(Entry::Component { mut subscription, .. }) = removed {
            subscription.unsubscribe();
        }
        component.set_parent(Weak::new());

        let literal = SlotContentLiteral::Component(component.to_json());
        self.emit_dirty(Operation {
            path: Vec::new(),
            apply: vec![Action::Retain { offset }, Action::Delete { count: 1 }],
            unapply: vec![Action::Retain { offset }, Action::Insert { content: literal }],
        });
        true
    }

    /// Subscribe to changes of this slot and of the components inside it.
    pub fn on_change(&self, listener: impl Fn(&Change) + 'static) -> Subscription {
        self.changes.subscribe(listener)
    }

    pub fn to_json(&self) -> SlotLiteral {
        let content = self
            .content
            .borrow()
            .iter()
            .map(|entry| match entry {
                Entry::Text(text) => SlotContentLiteral::Text(text.clone()),
                Entry::Component { component, .. } => {
                    SlotContentLiteral::Component(component.to_json())
                }
            })
            .collect();
        SlotLiteral {
            schema: self.schema.clone(),
            content,
        }
    }

    fn emit_dirty(&self, operation: Operation) {
        self.changes.emit(&Change {
            kind: ChangeKind::Dirty,
            operation,
        });
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in self.content.borrow().iter() {
            match entry {
                Entry::Text(text) => f.write_str(text)?,
                Entry::Component { component, .. } => write!(f, "{component}")?,
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("schema", &self.schema)
            .field("length", &self.length())
            .finish()
    }
}

// =============================================================================
// Slots
// =============================================================================

/// The slot list owned by one component.
pub struct Slots {
    this: Weak<Slots>,
    owner: Weak<ComponentInstance>,
    items: RefCell<Vec<(Rc<Slot>, Subscription)>>,
    changes: Emitter<Change>,
}

impl Slots {
    /// Take ownership of `slots` on behalf of `owner`.
    pub fn new(owner: Weak<ComponentInstance>, slots: Vec<Rc<Slot>>) -> Rc<Self> {
        Rc::new_cyclic(|this: &Weak<Slots>| {
            let items = slots
                .into_iter()
                .map(|slot| {
                    slot.set_parent(owner.clone());
                    let subscription = Self::forward(this, &slot);
                    (slot, subscription)
                })
                .collect();
            Self {
                this: this.clone(),
                owner,
                items: RefCell::new(items),
                changes: Emitter::new(),
            }
        })
    }

    fn forward(this: &Weak<Slots>, slot: &Rc<Slot>) -> Subscription {
        let slots = this.clone();
        let child = Rc::downgrade(slot);
        slot.on_change(move |change| {
            let (Some(slots), Some(slot)) = (slots.upgrade(), child.upgrade()) else {
                return;
            };
            if let Some(index) = slots.index_of(&slot) {
                slots.changes.emit(&Change {
                    kind: change.kind,
                    operation: change.operation.with_prefix(index),
                });
            }
        })
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Rc<Slot>> {
        self.items.borrow().get(index).map(|(slot, _)| slot.clone())
    }

    pub fn to_vec(&self) -> Vec<Rc<Slot>> {
        self.items.borrow().iter().map(|(slot, _)| slot.clone()).collect()
    }

    pub fn index_of(&self, slot: &Rc<Slot>) -> Option<usize> {
        self.items
            .borrow()
            .iter()
            .position(|(current, _)| Rc::ptr_eq(current, slot))
    }

    /// Append `slot`. Returns false if it is already part of this list.
    pub fn push(&self, slot: Rc<Slot>) -> bool {
        if self.index_of(&slot).is_some() {
            return false;
        }

        let offset = self.len();
        slot.set_parent(self.owner.clone());
        let subscription = Self::forward(&self.this, &slot);
        let literal = slot.to_json();
        self.items.borrow_mut().push((slot, subscription));

        self.changes.emit(&Change {
            kind: ChangeKind::Dirty,
            operation: Operation {
                path: Vec::new(),
                apply: vec![Action::Retain { offset }, Action::InsertSlot { slot: literal }],
                unapply: vec![Action::Retain { offset }, Action::Delete { count: 1 }],
            },
        });
        true
    }

    /// Remove `slot` and clear its owner back-reference.
    pub fn remove(&self, slot: &Rc<Slot>) -> bool {
        let Some(offset) = self.index_of(slot) else {
            return false;
        };

        let (_, mut subscription) = self.items.borrow_mut().remove(offset);
        subscription.unsubscribe();
        slot.set_parent(Weak::new());

        self.changes.emit(&Change {
            kind: ChangeKind::Dirty,
            operation: Operation {
                path: Vec::new(),
                apply: vec![Action::Retain { offset }, Action::Delete { count: 1 }],
                unapply: vec![
                    Action::Retain { offset },
                    Action::InsertSlot { slot: slot.to_json() },
                ],
            },
        });
        true
    }

    /// Subscribe to operations of the list and of every slot in it.
    pub fn on_change(&self, listener: impl Fn(&Change) + 'static) -> Subscription {
        self.changes.subscribe(listener)
    }

    pub fn to_json(&self) -> Vec<SlotLiteral> {
        self.items.borrow().iter().map(|(slot, _)| slot.to_json()).collect()
    }
}

impl fmt::Display for Slots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (slot, _) in self.items.borrow().iter() {
            write!(f, "{slot}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Slots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.items.borrow().iter().map(|(slot, _)| slot))
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
