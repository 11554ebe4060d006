//! Dispatcher - invoking hooks and propagating collecting events.
//!
//! # Propagation
//!
//! Context menus walk from the clicked component to the root through each
//! component's parent slot and that slot's owner:
//!
//! ```text
//! C ──parent slot──► B ──parent slot──► A (root)
//! menus: [C's groups, B's groups, A's groups]
//! ```
//!
//! A hook calling `stop_propagation()` ends the walk after its own level.

use std::any::Any;

use crate::component::ComponentRef;
use crate::engine::hooks::EventKind;
use crate::events::{ContextMenuEvent, GetRangesEvent, MenuItem, SlotRange};

// =============================================================================
// Invoke
// =============================================================================

/// Run every `kind` hook of `target` with `payload`, in registration order.
///
/// A missing target or a destroyed component makes this a no-op. Panics in
/// hooks propagate to the caller and skip the remaining hooks. Dispatching
/// [`EventKind::Destroy`] marks the component destroyed and drops the whole
/// hook table before the destroy hooks run.
pub fn invoke<P: Any>(target: Option<&ComponentRef>, kind: EventKind, payload: &mut P) {
    let Some(instance) = target else { return };
    if instance.is_destroyed() {
        log::trace!("`{kind}` ignored: component {} is destroyed", instance.id());
        return;
    }

    let hooks = instance.hooks_for(kind);
    log::trace!("dispatching `{kind}` to {} ({} hooks)", instance.id(), hooks.len());

    // Destroyed before the hooks run, so a nested destroy is a no-op
    if kind == EventKind::Destroy {
        instance.finish_destroy();
    }

    for hook in hooks {
        hook(&mut *payload);
    }
}

/// [`invoke`] for kinds without a payload.
pub fn trigger(target: Option<&ComponentRef>, kind: EventKind) {
    invoke(target, kind, &mut ());
}

// =============================================================================
// Collecting Events
// =============================================================================

/// Gather context menu groups from `start` and its ancestors.
pub fn collect_context_menus(start: &ComponentRef) -> Vec<Vec<MenuItem>> {
    let mut menus = Vec::new();
    let mut current = Some(start.clone());

    while let Some(component) = current {
        let mut event = ContextMenuEvent::new(component.clone());
        invoke(Some(&component), EventKind::ContextMenu, &mut event);

        let stopped = event.is_stopped();
        menus.extend(event.into_menus());
        if stopped {
            break;
        }
        current = component.parent_component();
    }

    menus
}

/// Ask `instance` which slot ranges a selection spanning it covers.
pub fn collect_ranges(instance: &ComponentRef) -> Vec<SlotRange> {
    let mut event = GetRangesEvent::new(instance.clone());
    invoke(Some(instance), EventKind::GetRanges, &mut event);
    event.into_ranges()
}

// =============================================================================
// Tests
// =============================================================================
