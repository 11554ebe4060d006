//! Construction Context - dynamic scope for component setup.
//!
//! While a component's setup runs, a [`ContextRecord`] for it sits on top of
//! a thread-local stack. The hook registration functions and `use_*`
//! accessors read the top record, so setup code never passes the component
//! around explicitly:
//!
//! ```ignore
//! ComponentOptions {
//!     name: "todo".into(),
//!     setup: Some(Box::new(|| {
//!         let state = use_state()?;
//!         on_break(move |event| {
//!             event.prevent_default();
//!             state.update(|draft| draft["done"] = true.into(), true);
//!         })?;
//!         Ok(())
//!     })),
//!     ..Default::default()
//! }
//! ```
//!
//! Construction is strictly nested: a child created inside a parent's setup
//! pushes its own record and pops it before control returns. Calling any of
//! these functions with an empty stack fails with [`Error::OutsideSetup`].

use std::any::{type_name, Any};
use std::cell::RefCell;
use std::rc::Rc;

use crate::component::{ComponentRef, StateController};
use crate::engine::hooks::{EventKind, HookCallback, Payload};
use crate::error::{Error, Result};
use crate::events::{
    BreakEventData, CompositionEndEventData, CompositionStartEventData,
    CompositionUpdateEventData, ContextMenuEvent, DeleteEventData, Event, GetRangesEvent,
    InsertEventData, PasteEventData,
};
use crate::model::{InjectFlags, Injector, Slots};
use crate::types::Shortcut;

// =============================================================================
// Context Stack
// =============================================================================

/// The construction context of one component.
#[derive(Clone, Debug)]
pub struct ContextRecord {
    pub instance: ComponentRef,
    pub injector: Rc<Injector>,
}

thread_local! {
    /// Records of the components currently running setup, innermost last.
    static CONTEXT_STACK: RefCell<Vec<ContextRecord>> = const { RefCell::new(Vec::new()) };
}

/// Push a construction context.
pub fn push_context(record: ContextRecord) {
    CONTEXT_STACK.with(|stack| {
        stack.borrow_mut().push(record);
    })
}

/// Pop the innermost construction context.
pub fn pop_context() -> Option<ContextRecord> {
    CONTEXT_STACK.with(|stack| stack.borrow_mut().pop())
}

/// The innermost construction context, if any.
pub fn current_context() -> Option<ContextRecord> {
    CONTEXT_STACK.with(|stack| stack.borrow().last().cloned())
}

/// Number of components currently being constructed.
pub fn context_depth() -> usize {
    CONTEXT_STACK.with(|stack| stack.borrow().len())
}

/// Clear the stack (for testing).
pub fn reset_context_stack() {
    CONTEXT_STACK.with(|stack| stack.borrow_mut().clear());
}

/// Keeps a context pushed for its lifetime; pops on drop, including unwinding.
pub(crate) struct ContextGuard;

impl ContextGuard {
    pub(crate) fn enter(record: ContextRecord) -> Self {
        push_context(record);
        ContextGuard
    }
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        pop_context();
    }
}

fn with_current<T>(call: &'static str, f: impl FnOnce(&ContextRecord) -> T) -> Result<T> {
    // Clone out so `f` may construct children (which push) without a live borrow
    let record = current_context().ok_or(Error::OutsideSetup(call))?;
    Ok(f(&record))
}

// =============================================================================
// Setup Accessors
// =============================================================================

/// The component under construction.
pub fn use_self() -> Result<ComponentRef> {
    with_current("use_self", |record| record.instance.clone())
}

/// The injector passed to `create_instance`.
pub fn use_injector() -> Result<Rc<Injector>> {
    with_current("use_injector", |record| record.injector.clone())
}

/// Resolve `T` through the active injector.
pub fn use_context<T: Any>() -> Result<Rc<T>> {
    use_injector()?.get::<T>()
}

/// Resolve `T` honoring `flags`, returning `None` when it is optional and missing.
pub fn use_context_with<T: Any>(flags: InjectFlags) -> Result<Option<Rc<T>>> {
    use_injector()?.get_with::<T>(flags)
}

/// Resolve `T`, falling back to `not_found` when nothing provides it.
pub fn use_context_or<T: Any>(not_found: Rc<T>, flags: InjectFlags) -> Result<Rc<T>> {
    let found = use_injector()?.get_with::<T>(flags | InjectFlags::OPTIONAL)?;
    Ok(found.unwrap_or(not_found))
}

/// State façade of the component under construction.
pub fn use_state() -> Result<StateController> {
    with_current("use_state", |record| StateController::new(&record.instance))
}

/// Slot list of the component under construction.
pub fn use_slots() -> Result<Rc<Slots>> {
    with_current("use_slots", |record| record.instance.slots().clone())
}

/// Add a shortcut to the component under construction.
pub fn use_dynamic_shortcut(shortcut: Shortcut) -> Result<()> {
    with_current("use_dynamic_shortcut", |record| record.instance.add_shortcut(shortcut))
}

// =============================================================================
// Hook Registration
// =============================================================================

/// Register a raw callback for `kind` on the component under construction.
pub fn register_hook(kind: EventKind, hook: impl Fn(&mut Payload) + 'static) -> Result<()> {
    add_hook("register_hook", kind, Rc::new(hook))
}

fn add_hook(call: &'static str, kind: EventKind, hook: HookCallback) -> Result<()> {
    with_current(call, |record| record.instance.add_hook(kind, hook))
}

fn add_lifecycle_hook(call: &'static str, kind: EventKind, hook: impl Fn() + 'static) -> Result<()> {
    add_hook(call, kind, Rc::new(move |_: &mut Payload| hook()))
}

fn add_event_hook<P: Any>(
    call: &'static str,
    kind: EventKind,
    hook: impl Fn(&mut P) + 'static,
) -> Result<()> {
    add_hook(
        call,
        kind,
        Rc::new(move |payload: &mut Payload| match payload.downcast_mut::<P>() {
            Some(payload) => hook(payload),
            None => log::warn!("`{kind}` hook skipped: expected a `{}` payload", type_name::<P>()),
        }),
    )
}

macro_rules! lifecycle_hooks {
    ($($(#[$doc:meta])* $name:ident => $kind:ident;)*) => {$(
        $(#[$doc])*
        pub fn $name(hook: impl Fn() + 'static) -> Result<()> {
            add_lifecycle_hook(stringify!($name), EventKind::$kind, hook)
        }
    )*};
}

macro_rules! event_hooks {
    ($($(#[$doc:meta])* $name:ident => $kind:ident($payload:ty);)*) => {$(
        $(#[$doc])*
        pub fn $name(hook: impl Fn(&mut $payload) + 'static) -> Result<()> {
            add_event_hook::<$payload>(stringify!($name), EventKind::$kind, hook)
        }
    )*};
}

lifecycle_hooks! {
    /// After the component's view is created.
    on_view_init => ViewInit;
    /// After every render of the component's view.
    on_view_checked => ViewChecked;
    /// When the component is destroyed. Runs once; all hooks are dropped afterwards.
    on_destroy => Destroy;
    /// When the slot containing the component changed.
    on_parent_slot_updated => ParentSlotUpdated;
    /// When the component is taken out of the document.
    on_detach => Detach;
    /// When the whole component becomes selected.
    on_selected => Selected;
    /// When the whole component stops being selected.
    on_unselect => Unselect;
    /// When the selection moves into one of the component's slots.
    on_focus => Focus;
    /// When the selection leaves the component's slots.
    on_blur => Blur;
    /// When the selection moves into the component or a descendant.
    on_focus_in => FocusIn;
    /// When the selection leaves the component and its descendants.
    on_focus_out => FocusOut;
}

event_hooks! {
    /// When the cursor enters the component from before it.
    on_selection_from_front => SelectionFromFront(Event);
    /// When the cursor enters the component from after it.
    on_selection_from_end => SelectionFromEnd(Event);
    /// When a selection spanning several slots asks which ranges it covers.
    on_get_ranges => GetRanges(GetRangesEvent);
    /// Enter pressed inside one of the component's slots.
    on_break => Break(Event<BreakEventData>);
    on_paste => Paste(Event<PasteEventData>);
    /// Before content is inserted; prevent to cancel.
    on_content_insert => ContentInsert(Event<InsertEventData>);
    on_content_inserted => ContentInserted(Event<InsertEventData>);
    /// Before content is deleted; prevent to cancel.
    on_content_delete => ContentDelete(Event<DeleteEventData>);
    on_content_deleted => ContentDeleted(Event);
    on_slot_remove => SlotRemove(Event);
    on_slot_removed => SlotRemoved(Event);
    /// Right click. See [`collect_context_menus`](super::collect_context_menus).
    on_context_menu => ContextMenu(ContextMenuEvent);
    on_composition_start => CompositionStart(Event<CompositionStartEventData>);
    on_composition_update => CompositionUpdate(Event<CompositionUpdateEventData>);
    on_composition_end => CompositionEnd(Event<CompositionEndEventData>);
}

// =============================================================================
// Tests
// =============================================================================
