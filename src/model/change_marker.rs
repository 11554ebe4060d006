//! Change Marker - dirty tracking for one component.
//!
//! A component is *dirty* when its own state or slot content changed and
//! *changed* when anything at or below it changed. Renderers clear both with
//! [`ChangeMarker::rendered`]; history consumers listen via
//! [`ChangeMarker::on_change`].

use std::cell::Cell;

use crate::model::Operation;
use crate::subscription::{Emitter, Subscription};

#[derive(Debug, Default)]
pub struct ChangeMarker {
    dirty: Cell<bool>,
    changed: Cell<bool>,
    changes: Emitter<Operation>,
}

impl ChangeMarker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    pub fn is_changed(&self) -> bool {
        self.changed.get()
    }

    /// Record a change of the component itself.
    pub fn mark_as_dirtied(&self, operation: Operation) {
        self.dirty.set(true);
        self.changed.set(true);
        log::trace!("marked dirty at {:?}", operation.path);
        self.changes.emit(&operation);
    }

    /// Record a change somewhere below the component.
    pub fn mark_as_changed(&self, operation: Operation) {
        self.changed.set(true);
        log::trace!("marked changed at {:?}", operation.path);
        self.changes.emit(&operation);
    }

    /// Clear both flags once the component has been rendered.
    pub fn rendered(&self) {
        self.dirty.set(false);
        self.changed.set(false);
    }

    /// Subscribe to every operation passed to this marker.
    pub fn on_change(&self, listener: impl Fn(&Operation) + 'static) -> Subscription {
        self.changes.subscribe(listener)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_dirty_and_changed_flags() {
        let marker = ChangeMarker::new();
        assert!(!marker.is_dirty());
        assert!(!marker.is_changed());

        marker.mark_as_changed(Operation::default());
        assert!(!marker.is_dirty());
        assert!(marker.is_changed());

        marker.mark_as_dirtied(Operation::default());
        assert!(marker.is_dirty());

        marker.rendered();
        assert!(!marker.is_dirty());
        assert!(!marker.is_changed());
    }

    #[test]
    fn test_on_change_receives_operations() {
        let marker = ChangeMarker::new();
        let paths = Rc::new(RefCell::new(Vec::new()));

        let seen = paths.clone();
        let mut sub = marker.on_change(move |op| seen.borrow_mut().push(op.path.clone()));

        marker.mark_as_dirtied(Operation { path: vec![1], ..Default::default() });
        marker.mark_as_changed(Operation { path: vec![0, 2], ..Default::default() });
        sub.unsubscribe();
        marker.mark_as_dirtied(Operation::default());

        assert_eq!(*paths.borrow(), vec![vec![1], vec![0, 2]]);
    }
}
