//! # spark-text
//!
//! Component state and event engine for rich-text documents.
//!
//! ## Architecture
//!
//! A document is a tree of components and slots. Each component holds an
//! immutable JSON state snapshot, a list of slots with its child content,
//! and a table of hooks registered while its setup ran:
//!
//! ```text
//! ComponentDefinition ─create_instance─► ComponentInstance
//!                                          ├─ state: Rc<Value> ──update──► PatchPair ─► ChangeMarker
//!                                          ├─ slots: Slots ─► Slot ─► child ComponentInstance
//!                                          └─ hooks: HookTable ◄─ on_*() during setup
//! ```
//!
//! State changes and slot edits flow upwards as reversible [`Operation`]s;
//! events flow into hooks through [`invoke`] or, for context menus, up the
//! tree through [`collect_context_menus`].
//!
//! ## Modules
//!
//! - [`component`] - definitions, instances, registry
//! - [`engine`] - construction context, hook registration, dispatch
//! - [`state`] - snapshot diffing and patch application
//! - [`model`] - slots, change marker, injector, operations
//! - [`events`] - event payloads passed to hooks
//! - [`types`] - content types, literals, shortcuts

pub mod component;
pub mod engine;
pub mod error;
pub mod events;
pub mod model;
pub mod state;
pub mod subscription;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use error::{Error, Result};

pub use component::{
    define_component, ComponentDefinition, ComponentInstance, ComponentOptions, ComponentRef,
    ComponentRegistry, InitData, Lifecycle, Named, Registry, StateController,
};

pub use engine::{
    collect_context_menus, collect_ranges, invoke, trigger, EventKind,
    // Setup accessors
    use_context, use_context_or, use_context_with, use_dynamic_shortcut, use_injector,
    use_self, use_slots, use_state,
    // Hook registration
    on_blur, on_break, on_composition_end, on_composition_start, on_composition_update,
    on_content_delete, on_content_deleted, on_content_insert, on_content_inserted,
    on_context_menu, on_destroy, on_detach, on_focus, on_focus_in, on_focus_out,
    on_get_ranges, on_parent_slot_updated, on_paste, on_selected, on_selection_from_end,
    on_selection_from_front, on_slot_remove, on_slot_removed, on_unselect, on_view_checked,
    on_view_init, register_hook,
};

pub use events::{
    ContextMenuEvent, Event, EventTarget, GetRangesEvent, MenuAction, MenuItem, SlotRange,
};

pub use model::{ChangeMarker, InjectFlags, Injector, Operation, Slot, Slots};

pub use state::{PatchOp, PatchPair, StateChange};

pub use subscription::{Emitter, Subscription};
