//! Event values passed to component hooks.
//!
//! - [`Event`] - target, payload and a `prevented` flag
//! - [`ContextMenuEvent`] - collects menu groups while propagating upwards
//! - [`GetRangesEvent`] - collects slot ranges from a single component
//!
//! Collecting events let any number of hooks contribute results during one
//! dispatch; the dispatcher reads them back afterwards.

use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::component::ComponentRef;
use crate::model::Slot;

// =============================================================================
// Event
// =============================================================================

/// What an event was fired on.
#[derive(Clone, Debug)]
pub enum EventTarget {
    Component(ComponentRef),
    Slot(Rc<Slot>),
}

/// A dispatched occurrence with payload `D`.
#[derive(Debug)]
pub struct Event<D = ()> {
    target: EventTarget,
    data: D,
    prevented: bool,
}

impl<D> Event<D> {
    pub fn new(target: EventTarget, data: D) -> Self {
        Self {
            target,
            data,
            prevented: false,
        }
    }

    pub fn target(&self) -> &EventTarget {
        &self.target
    }

    pub fn data(&self) -> &D {
        &self.data
    }

    /// Ask the caller to skip its default behavior.
    pub fn prevent_default(&mut self) {
        self.prevented = true;
    }

    pub fn is_prevented(&self) -> bool {
        self.prevented
    }
}

// =============================================================================
// Payloads
// =============================================================================

/// Content about to be (or just) inserted into a slot.
#[derive(Clone, Debug)]
pub enum InsertContent {
    Text(String),
    Component(ComponentRef),
}

#[derive(Clone, Debug)]
pub struct InsertEventData {
    pub index: usize,
    pub content: InsertContent,
    /// Format name and value pairs applied to the inserted content.
    pub formats: Vec<(String, Value)>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeleteEventData {
    pub index: usize,
    pub count: usize,
    /// True for forward deletion, false for backspace.
    pub to_end: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BreakEventData {
    pub index: usize,
}

#[derive(Clone, Debug)]
pub struct PasteEventData {
    pub index: usize,
    /// Pasted content parsed into a detached slot.
    pub data: Rc<Slot>,
    /// Plain-text rendition of the pasted content.
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompositionStartEventData {
    pub index: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompositionUpdateEventData {
    pub index: usize,
    pub data: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompositionEndEventData {
    pub index: usize,
    pub data: String,
}

// =============================================================================
// Context Menu
// =============================================================================

/// What a menu entry does when chosen.
#[derive(Clone)]
pub enum MenuAction {
    Click(Rc<dyn Fn()>),
    Submenu(Vec<MenuItem>),
}

/// One entry of a context menu.
#[derive(Clone)]
pub struct MenuItem {
    pub label: String,
    pub icon: Option<String>,
    pub disabled: bool,
    pub action: MenuAction,
}

impl MenuItem {
    pub fn new(label: impl Into<String>, on_click: impl Fn() + 'static) -> Self {
        Self {
            label: label.into(),
            icon: None,
            disabled: false,
            action: MenuAction::Click(Rc::new(on_click)),
        }
    }

    pub fn submenu(label: impl Into<String>, items: Vec<MenuItem>) -> Self {
        Self {
            label: label.into(),
            icon: None,
            disabled: false,
            action: MenuAction::Submenu(items),
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    /// Run the click action. Disabled entries and submenus do nothing.
    pub fn click(&self) {
        if self.disabled {
            return;
        }
        if let MenuAction::Click(on_click) = &self.action {
            on_click();
        }
    }
}

impl fmt::Debug for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut item = f.debug_struct("MenuItem");
        item.field("label", &self.label)
            .field("icon", &self.icon)
            .field("disabled", &self.disabled);
        if let MenuAction::Submenu(items) = &self.action {
            item.field("submenu", items);
        }
        item.finish()
    }
}

/// Fired on each component from the right-clicked one up to the root.
#[derive(Debug)]
pub struct ContextMenuEvent {
    target: ComponentRef,
    menus: Vec<Vec<MenuItem>>,
    stopped: bool,
    prevented: bool,
}

impl ContextMenuEvent {
    pub fn new(target: ComponentRef) -> Self {
        Self {
            target,
            menus: Vec::new(),
            stopped: false,
            prevented: false,
        }
    }

    pub fn target(&self) -> &ComponentRef {
        &self.target
    }

    /// Contribute one group of menu entries.
    pub fn use_menu(&mut self, items: Vec<MenuItem>) {
        self.menus.push(items);
    }

    /// Do not visit ancestors after the current component.
    pub fn stop_propagation(&mut self) {
        self.stopped = true;
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn prevent_default(&mut self) {
        self.prevented = true;
    }

    pub fn is_prevented(&self) -> bool {
        self.prevented
    }

    pub fn into_menus(self) -> Vec<Vec<MenuItem>> {
        self.menus
    }
}

// =============================================================================
// Ranges
// =============================================================================

/// A `[start_index, end_index)` span inside a slot.
#[derive(Clone, Debug)]
pub struct SlotRange {
    pub slot: Rc<Slot>,
    pub start_index: usize,
    pub end_index: usize,
}

impl SlotRange {
    pub fn new(slot: Rc<Slot>, start_index: usize, end_index: usize) -> Self {
        Self {
            slot,
            start_index,
            end_index,
        }
    }
}

/// Asks a component which slot ranges a selection spanning it covers.
#[derive(Debug)]
pub struct GetRangesEvent {
    target: ComponentRef,
    ranges: Vec<SlotRange>,
}

impl GetRangesEvent {
    pub fn new(target: ComponentRef) -> Self {
        Self {
            target,
            ranges: Vec::new(),
        }
    }

    pub fn target(&self) -> &ComponentRef {
        &self.target
    }

    /// Contribute ranges; calls accumulate in order.
    pub fn use_ranges(&mut self, ranges: Vec<SlotRange>) {
        self.ranges.extend(ranges);
    }

    pub fn into_ranges(self) -> Vec<SlotRange> {
        self.ranges
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ContentType;
    use std::cell::Cell;

    #[test]
    fn test_prevent_default() {
        let slot = Slot::new(vec![ContentType::Text]);
        let mut event = Event::new(EventTarget::Slot(slot), BreakEventData { index: 3 });

        assert!(!event.is_prevented());
        event.prevent_default();
        assert!(event.is_prevented());
        assert_eq!(event.data().index, 3);
    }

    #[test]
    fn test_menu_item_click() {
        let clicks = Rc::new(Cell::new(0));

        let counter = clicks.clone();
        let item = MenuItem::new("Copy", move || counter.set(counter.get() + 1)).with_icon("copy");
        item.click();
        item.clone().disabled().click();
        MenuItem::submenu("More", vec![item.clone()]).click();

        assert_eq!(clicks.get(), 1);
        assert_eq!(item.icon.as_deref(), Some("copy"));
    }
}
