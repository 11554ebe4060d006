//! Hook Table - per-instance registry of event callbacks.
//!
//! Callbacks receive the dispatch payload as `&mut dyn Any`. The typed
//! registration functions in [`context`](super::context) downcast it to the
//! payload type documented on each [`EventKind`].

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

// =============================================================================
// Event Kinds
// =============================================================================

/// Every event a component can hook into.
///
/// The payload type passed to [`invoke`](super::invoke) for each kind is
/// listed next to it; kinds without one are dispatched with `()`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    // Lifecycle
    ViewInit,
    ViewChecked,
    Destroy,
    ParentSlotUpdated,
    Detach,

    // Selection
    Selected,
    Unselect,
    Focus,
    Blur,
    FocusIn,
    FocusOut,
    /// `Event<()>` targeting the component
    SelectionFromFront,
    /// `Event<()>` targeting the component
    SelectionFromEnd,
    /// `GetRangesEvent`
    GetRanges,

    // Input
    /// `Event<BreakEventData>`
    Break,
    /// `Event<PasteEventData>`
    Paste,
    /// `Event<InsertEventData>`
    ContentInsert,
    /// `Event<InsertEventData>`
    ContentInserted,
    /// `Event<DeleteEventData>`
    ContentDelete,
    /// `Event<()>` targeting the slot
    ContentDeleted,
    /// `Event<()>` targeting the slot
    SlotRemove,
    /// `Event<()>` targeting the slot
    SlotRemoved,

    // Menu
    /// `ContextMenuEvent`
    ContextMenu,

    // Composition
    /// `Event<CompositionStartEventData>`
    CompositionStart,
    /// `Event<CompositionUpdateEventData>`
    CompositionUpdate,
    /// `Event<CompositionEndEventData>`
    CompositionEnd,
}

impl EventKind {
    pub const ALL: [EventKind; 26] = [
        EventKind::ViewInit,
        EventKind::ViewChecked,
        EventKind::Destroy,
        EventKind::ParentSlotUpdated,
        EventKind::Detach,
        EventKind::Selected,
        EventKind::Unselect,
        EventKind::Focus,
        EventKind::Blur,
        EventKind::FocusIn,
        EventKind::FocusOut,
        EventKind::SelectionFromFront,
        EventKind::SelectionFromEnd,
        EventKind::GetRanges,
        EventKind::Break,
        EventKind::Paste,
        EventKind::ContentInsert,
        EventKind::ContentInserted,
        EventKind::ContentDelete,
        EventKind::ContentDeleted,
        EventKind::SlotRemove,
        EventKind::SlotRemoved,
        EventKind::ContextMenu,
        EventKind::CompositionStart,
        EventKind::CompositionUpdate,
        EventKind::CompositionEnd,
    ];

    /// Hook name, e.g. `"onPaste"`.
    pub fn name(self) -> &'static str {
        match self {
            EventKind::ViewInit => "onViewInit",
            EventKind::ViewChecked => "onViewChecked",
            EventKind::Destroy => "onDestroy",
            EventKind::ParentSlotUpdated => "onParentSlotUpdated",
            EventKind::Detach => "onDetach",
            EventKind::Selected => "onSelected",
            EventKind::Unselect => "onUnselect",
            EventKind::Focus => "onFocus",
            EventKind::Blur => "onBlur",
            EventKind::FocusIn => "onFocusIn",
            EventKind::FocusOut => "onFocusOut",
            EventKind::SelectionFromFront => "onSelectionFromFront",
            EventKind::SelectionFromEnd => "onSelectionFromEnd",
            EventKind::GetRanges => "onGetRanges",
            EventKind::Break => "onBreak",
            EventKind::Paste => "onPaste",
            EventKind::ContentInsert => "onContentInsert",
            EventKind::ContentInserted => "onContentInserted",
            EventKind::ContentDelete => "onContentDelete",
            EventKind::ContentDeleted => "onContentDeleted",
            EventKind::SlotRemove => "onSlotRemove",
            EventKind::SlotRemoved => "onSlotRemoved",
            EventKind::ContextMenu => "onContextMenu",
            EventKind::CompositionStart => "onCompositionStart",
            EventKind::CompositionUpdate => "onCompositionUpdate",
            EventKind::CompositionEnd => "onCompositionEnd",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Hook Table
// =============================================================================

/// Type-erased dispatch payload.
pub type Payload = dyn Any;

/// A registered hook.
pub type HookCallback = Rc<dyn Fn(&mut Payload)>;

/// Callbacks per event kind, in registration order.
#[derive(Default)]
pub struct HookTable {
    hooks: HashMap<EventKind, Vec<HookCallback>>,
}

impl HookTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, kind: EventKind, callback: HookCallback) {
        self.hooks.entry(kind).or_default().push(callback);
    }

    /// Snapshot of the callbacks for `kind`.
    pub fn callbacks(&self, kind: EventKind) -> Vec<HookCallback> {
        self.hooks.get(&kind).cloned().unwrap_or_default()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.hooks.get(&kind).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.values().all(Vec::is_empty)
    }

    pub fn clear(&mut self) {
        self.hooks.clear();
    }
}

impl fmt::Debug for HookTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.hooks.iter().map(|(kind, hooks)| (kind.name(), hooks.len())))
            .finish()
    }
}
