//! Component Instance - the runtime aggregate created from a definition.
//!
//! An instance owns its state snapshot, its slot list and its hook table.
//! Its position in the document is known only through back-references:
//!
//! ```text
//! ComponentInstance ──parent──► Slot ──parent──► ComponentInstance
//!        │ owns                                         (parent_component)
//!        ▼
//!      Slots ──► Slot ──► child ComponentInstance
//! ```
//!
//! Back-references are `Weak` and are only written by the slot collaborator.
//!
//! # Lifecycle
//!
//! `Constructing` while setup runs, `Active` once construction finished,
//! `Destroyed` after the destroy event was dispatched. A destroyed instance
//! ignores dispatch and state updates.

use std::cell::{Cell, RefCell};
use std::convert::Infallible;
use std::fmt;
use std::rc::{Rc, Weak};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::component::ComponentDefinition;
use crate::engine::{EventKind, HookCallback, HookTable, Payload};
use crate::error::{Error, Result};
use crate::model::{Action, ChangeKind, ChangeMarker, Operation, Slot, Slots};
use crate::state::{self, StateChange};
use crate::subscription::{Emitter, Subscription};
use crate::types::{ComponentLiteral, ContentType, Shortcut};

/// Shared handle to a live component.
pub type ComponentRef = Rc<ComponentInstance>;

thread_local! {
    static ID_COUNTER: Cell<usize> = const { Cell::new(0) };
}

fn next_id() -> String {
    ID_COUNTER.with(|counter| {
        let id = counter.get();
        counter.set(id + 1);
        format!("c{id}")
    })
}

// =============================================================================
// Lifecycle
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    Constructing,
    Active,
    Destroyed,
}

// =============================================================================
// Component Instance
// =============================================================================

pub struct ComponentInstance {
    id: String,
    definition: Rc<ComponentDefinition>,
    state: RefCell<Rc<Value>>,
    slots: Rc<Slots>,
    parent: RefCell<Weak<Slot>>,
    hooks: RefCell<HookTable>,
    shortcuts: RefCell<Vec<Shortcut>>,
    change_marker: ChangeMarker,
    state_changes: Emitter<StateChange>,
    slots_subscription: RefCell<Subscription>,
    lifecycle: Cell<Lifecycle>,
}

impl ComponentInstance {
    pub(crate) fn new(
        definition: Rc<ComponentDefinition>,
        state: Value,
        slots: Vec<Rc<Slot>>,
    ) -> ComponentRef {
        Rc::new_cyclic(|this| Self {
            id: next_id(),
            definition,
            state: RefCell::new(Rc::new(state)),
            slots: Slots::new(this.clone(), slots),
            parent: RefCell::new(Weak::new()),
            hooks: RefCell::new(HookTable::new()),
            shortcuts: RefCell::new(Vec::new()),
            change_marker: ChangeMarker::new(),
            state_changes: Emitter::new(),
            slots_subscription: RefCell::new(Subscription::empty()),
            lifecycle: Cell::new(Lifecycle::Constructing),
        })
    }

    /// Wire slot changes into the change marker and leave `Constructing`.
    pub(crate) fn activate(self: &Rc<Self>) {
        let this = Rc::downgrade(self);
        let subscription = self.slots.on_change(move |change| {
            let Some(instance) = this.upgrade() else { return };
            match change.kind {
                ChangeKind::Dirty => instance.change_marker.mark_as_dirtied(change.operation.clone()),
                ChangeKind::Changed => instance.change_marker.mark_as_changed(change.operation.clone()),
            }
        });
        *self.slots_subscription.borrow_mut() = subscription;

        let this = Rc::downgrade(self);
        self.add_hook(
            EventKind::Destroy,
            Rc::new(move |_: &mut Payload| {
                if let Some(instance) = this.upgrade() {
                    instance.slots_subscription.borrow_mut().unsubscribe();
                }
            }),
        );

        self.lifecycle.set(Lifecycle::Active);
    }

    /// Drop everything setup registered after it failed.
    pub(crate) fn abort(&self) {
        self.hooks.borrow_mut().clear();
        self.shortcuts.borrow_mut().clear();
        self.lifecycle.set(Lifecycle::Destroyed);
    }

    pub(crate) fn finish_destroy(&self) {
        self.lifecycle.set(Lifecycle::Destroyed);
        self.hooks.borrow_mut().clear();
        log::debug!("destroyed component {} ({})", self.id, self.name());
    }

    // -------------------------------------------------------------------------
    // Identity
    // -------------------------------------------------------------------------

    /// Per-thread unique id, e.g. `"c12"`.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        self.definition.name()
    }

    pub fn definition(&self) -> &Rc<ComponentDefinition> {
        &self.definition
    }

    pub fn content_type(&self) -> ContentType {
        self.definition.content_type()
    }

    pub fn separable(&self) -> bool {
        self.definition.separable()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.get()
    }

    pub fn is_destroyed(&self) -> bool {
        self.lifecycle.get() == Lifecycle::Destroyed
    }

    // -------------------------------------------------------------------------
    // State
    // -------------------------------------------------------------------------

    /// The current snapshot.
    pub fn state(&self) -> Rc<Value> {
        self.state.borrow().clone()
    }

    /// Deserialize the current snapshot into `T`.
    pub fn state_as<T: DeserializeOwned>(&self) -> Result<T> {
        let state = self.state();
        Ok(T::deserialize(&*state)?)
    }

    /// Replace the state with the result of running `recipe` on a draft.
    ///
    /// Returns the snapshot held afterwards. When the draft equals the current
    /// state nothing is emitted and the same `Rc` comes back.
    pub fn update_state(&self, recipe: impl FnOnce(&mut Value), record: bool) -> Rc<Value> {
        let result: std::result::Result<Rc<Value>, Infallible> = self.try_update_state(
            |draft| {
                recipe(draft);
                Ok(())
            },
            record,
        );
        match result {
            Ok(state) => state,
            Err(never) => match never {},
        }
    }

    /// Fallible [`update_state`](Self::update_state). On error the state is untouched.
    pub fn try_update_state<E>(
        &self,
        recipe: impl FnOnce(&mut Value) -> std::result::Result<(), E>,
        record: bool,
    ) -> std::result::Result<Rc<Value>, E> {
        let base = self.state();
        if self.is_destroyed() {
            log::warn!("state update ignored: component {} is destroyed", self.id);
            return Ok(base);
        }

        let Some(pair) = state::try_produce(&base, recipe, record)? else {
            return Ok(base);
        };
        log::trace!("component {} state updated ({} patches)", self.id, pair.patches.len());

        *self.state.borrow_mut() = pair.value.clone();

        self.change_marker.mark_as_dirtied(Operation {
            path: Vec::new(),
            apply: vec![Action::Apply {
                patches: pair.patches,
                value: Value::clone(&pair.value),
                record,
            }],
            unapply: vec![Action::Apply {
                patches: pair.inverse_patches,
                value: Value::clone(&pair.previous),
                record,
            }],
        });
        self.state_changes.emit(&StateChange {
            old_state: pair.previous,
            new_state: pair.value.clone(),
            record,
        });

        Ok(pair.value)
    }

    /// Update through a typed view of the state.
    pub fn update_typed<T>(&self, recipe: impl FnOnce(&mut T), record: bool) -> Result<Rc<Value>>
    where
        T: Serialize + DeserializeOwned,
    {
        self.try_update_state::<Error>(
            |draft| {
                let mut typed = T::deserialize(&*draft)?;
                recipe(&mut typed);
                *draft = serde_json::to_value(typed)?;
                Ok(())
            },
            record,
        )
    }

    /// Subscribe to state transitions.
    pub fn on_state_change(&self, listener: impl Fn(&StateChange) + 'static) -> Subscription {
        self.state_changes.subscribe(listener)
    }

    // -------------------------------------------------------------------------
    // Tree
    // -------------------------------------------------------------------------

    pub fn slots(&self) -> &Rc<Slots> {
        &self.slots
    }

    /// The slot this component is embedded in.
    pub fn parent(&self) -> Option<Rc<Slot>> {
        self.parent.borrow().upgrade()
    }

    pub(crate) fn set_parent(&self, slot: Weak<Slot>) {
        *self.parent.borrow_mut() = slot;
    }

    /// Owner of the slot this component is embedded in.
    pub fn parent_component(&self) -> Option<ComponentRef> {
        self.parent().and_then(|slot| slot.parent())
    }

    pub fn change_marker(&self) -> &ChangeMarker {
        &self.change_marker
    }

    // -------------------------------------------------------------------------
    // Hooks & Shortcuts
    // -------------------------------------------------------------------------

    pub(crate) fn add_hook(&self, kind: EventKind, hook: HookCallback) {
        self.hooks.borrow_mut().add(kind, hook);
    }

    pub(crate) fn hooks_for(&self, kind: EventKind) -> Vec<HookCallback> {
        self.hooks.borrow().callbacks(kind)
    }

    pub fn hook_count(&self, kind: EventKind) -> usize {
        self.hooks.borrow().count(kind)
    }

    pub(crate) fn add_shortcut(&self, shortcut: Shortcut) {
        self.shortcuts.borrow_mut().push(shortcut);
    }

    /// Shortcuts registered during setup, in registration order.
    pub fn shortcuts(&self) -> Vec<Shortcut> {
        self.shortcuts.borrow().clone()
    }

    // -------------------------------------------------------------------------
    // Output
    // -------------------------------------------------------------------------

    pub fn to_json(&self) -> ComponentLiteral {
        ComponentLiteral {
            name: self.name().to_string(),
            state: Value::clone(&self.state()),
            slots: self.slots.to_json(),
        }
    }
}

impl fmt::Display for ComponentInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slots)
    }
}

impl fmt::Debug for ComponentInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInstance")
            .field("id", &self.id)
            .field("name", &self.name())
            .field("lifecycle", &self.lifecycle.get())
            .field("state", &self.state.borrow())
            .field("slots", &self.slots)
            .finish()
    }
}

// =============================================================================
// State Controller
// =============================================================================

/// State façade handed out by `use_state()`.
///
/// Holds the instance weakly so hooks may capture it without keeping the
/// component alive. Every call is a no-op once the instance is gone.
#[derive(Clone, Debug)]
pub struct StateController {
    instance: Weak<ComponentInstance>,
}

impl StateController {
    pub fn new(instance: &ComponentRef) -> Self {
        Self {
            instance: Rc::downgrade(instance),
        }
    }

    pub fn get(&self) -> Option<Rc<Value>> {
        self.instance.upgrade().map(|instance| instance.state())
    }

    pub fn update(&self, recipe: impl FnOnce(&mut Value), record: bool) -> Option<Rc<Value>> {
        self.instance
            .upgrade()
            .map(|instance| instance.update_state(recipe, record))
    }

    pub fn try_update<E>(
        &self,
        recipe: impl FnOnce(&mut Value) -> std::result::Result<(), E>,
        record: bool,
    ) -> std::result::Result<Option<Rc<Value>>, E> {
        match self.instance.upgrade() {
            Some(instance) => instance.try_update_state(recipe, record).map(Some),
            None => Ok(None),
        }
    }

    pub fn subscribe(&self, listener: impl Fn(&StateChange) + 'static) -> Subscription {
        match self.instance.upgrade() {
            Some(instance) => instance.on_state_change(listener),
            None => Subscription::empty(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentOptions, InitData};
    use crate::engine::{reset_context_stack, trigger};
    use crate::model::Injector;
    use serde::Deserialize;
    use serde_json::json;

    fn setup() {
        reset_context_stack();
    }

    fn create(name: &str, init: Option<InitData>) -> ComponentRef {
        ComponentDefinition::new(ComponentOptions {
            name: name.into(),
            ..Default::default()
        })
        .create_instance(&Rc::new(Injector::new()), init)
        .unwrap()
    }

    fn count_operations(instance: &ComponentRef) -> (Rc<RefCell<Vec<Operation>>>, Subscription) {
        let operations = Rc::new(RefCell::new(Vec::new()));
        let sink = operations.clone();
        let sub = instance
            .change_marker()
            .on_change(move |op| sink.borrow_mut().push(op.clone()));
        (operations, sub)
    }

    #[test]
    fn test_ids_are_unique() {
        setup();
        let a = create("a", None);
        let b = create("b", None);
        assert_ne!(a.id(), b.id());
        assert!(a.id().starts_with('c'));
        assert_eq!(a.lifecycle(), Lifecycle::Active);
    }

    #[test]
    fn test_update_emits_one_reversible_operation() {
        setup();
        let instance = create("todo", Some(InitData::default().with_state(json!({ "done": false }))));
        let (operations, _sub) = count_operations(&instance);

        let changes = Rc::new(Cell::new(0));
        let counter = changes.clone();
        let _state_sub = instance.on_state_change(move |change| {
            assert_eq!(*change.old_state, json!({ "done": false }));
            counter.set(counter.get() + 1);
        });

        let new_state = instance.update_state(|draft| draft["done"] = json!(true), true);

        assert_eq!(*new_state, json!({ "done": true }));
        assert_eq!(changes.get(), 1);
        assert!(instance.change_marker().is_dirty());

        let operations = operations.borrow();
        assert_eq!(operations.len(), 1);
        let Action::Apply { patches, value, record } = &operations[0].unapply[0] else {
            panic!("expected an apply action");
        };
        assert!(*record);
        assert_eq!(*value, json!({ "done": false }));
        assert_eq!(state::apply_patches(&new_state, patches).unwrap(), json!({ "done": false }));
    }

    #[test]
    fn test_noop_update_returns_same_snapshot() {
        setup();
        let instance = create("todo", Some(InitData::default().with_state(json!({ "done": true }))));
        let (operations, _sub) = count_operations(&instance);

        let before = instance.state();
        let after = instance.update_state(|draft| draft["done"] = json!(true), true);

        assert!(Rc::ptr_eq(&before, &after));
        assert!(operations.borrow().is_empty());
        assert!(!instance.change_marker().is_dirty());
    }

    #[test]
    fn test_failed_update_keeps_state() {
        setup();
        let instance = create("counter", Some(InitData::default().with_state(json!({ "n": 1 }))));

        let result = instance.try_update_state(
            |draft| {
                draft["n"] = json!(2);
                Err("rejected")
            },
            true,
        );

        assert_eq!(result.unwrap_err(), "rejected");
        assert_eq!(*instance.state(), json!({ "n": 1 }));
    }

    #[derive(Serialize, Deserialize)]
    struct Heading {
        level: u8,
    }

    #[test]
    fn test_typed_state() {
        setup();
        let instance = create("heading", Some(InitData::default().with_state(json!({ "level": 1 }))));

        instance.update_typed(|heading: &mut Heading| heading.level += 1, false).unwrap();
        assert_eq!(instance.state_as::<Heading>().unwrap().level, 2);

        let err = instance.update_typed(|_: &mut Vec<u8>| {}, false).unwrap_err();
        assert!(matches!(err, Error::State(_)));
    }

    #[test]
    fn test_update_after_destroy_is_ignored() {
        setup();
        let instance = create("gone", None);
        trigger(Some(&instance), EventKind::Destroy);

        let state = instance.update_state(|draft| *draft = json!(1), true);
        assert_eq!(*state, Value::Null);
        assert!(instance.is_destroyed());
    }

    #[test]
    fn test_slot_edits_mark_owner_dirty() {
        setup();
        let slot = Slot::new(vec![ContentType::Text]);
        let instance = create("paragraph", Some(InitData::default().with_slots(vec![slot.clone()])));
        let (operations, _sub) = count_operations(&instance);

        slot.insert_text("hi");

        assert!(instance.change_marker().is_dirty());
        assert_eq!(operations.borrow()[0].path, vec![0]);
        assert_eq!(instance.to_string(), "hi");
        assert!(Rc::ptr_eq(&slot.parent().unwrap(), &instance));
    }

    #[test]
    fn test_destroy_stops_slot_forwarding() {
        setup();
        let slot = Slot::new(vec![ContentType::Text]);
        let instance = create("paragraph", Some(InitData::default().with_slots(vec![slot.clone()])));
        let (operations, _sub) = count_operations(&instance);

        trigger(Some(&instance), EventKind::Destroy);
        slot.insert_text("late");

        assert!(operations.borrow().is_empty());
    }

    #[test]
    fn test_state_controller_outlives_instance() {
        setup();
        let instance = create("temp", None);
        let controller = StateController::new(&instance);

        controller.update(|draft| *draft = json!("x"), true);
        assert_eq!(*controller.get().unwrap(), json!("x"));

        drop(instance);
        assert!(controller.get().is_none());
        assert!(controller.update(|_| {}, true).is_none());
        assert!(!controller.subscribe(|_| {}).is_active());
    }
}
