//! Subscriptions - listener lists with explicit cleanup handles.
//!
//! Every change stream in the engine (state changes, slot operations, change
//! marker notifications) is an [`Emitter`]. Subscribing returns a
//! [`Subscription`] that must be cancelled explicitly; dropping it leaves the
//! listener registered.
//!
//! Listeners are snapshotted before each emit, so a listener may subscribe or
//! unsubscribe while being notified.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

// =============================================================================
// Subscription
// =============================================================================

/// Cleanup handle returned by [`Emitter::subscribe`].
pub struct Subscription {
    cleanup: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Wrap a cleanup function.
    pub fn new(cleanup: impl FnOnce() + 'static) -> Self {
        Self {
            cleanup: Some(Box::new(cleanup)),
        }
    }

    /// A subscription with nothing to clean up.
    pub fn empty() -> Self {
        Self { cleanup: None }
    }

    /// Remove the listener. Calling this more than once is harmless.
    pub fn unsubscribe(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
    }

    /// Whether [`unsubscribe`](Self::unsubscribe) has not run yet.
    pub fn is_active(&self) -> bool {
        self.cleanup.is_some()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

// =============================================================================
// Emitter
// =============================================================================

type Listener<T> = Rc<dyn Fn(&T)>;
type ListenerList<T> = Rc<RefCell<Vec<(usize, Listener<T>)>>>;

/// Synchronous push stream of `T` values.
pub struct Emitter<T: 'static> {
    listeners: ListenerList<T>,
    next_id: Cell<usize>,
}

impl<T: 'static> Emitter<T> {
    pub fn new() -> Self {
        Self {
            listeners: Rc::new(RefCell::new(Vec::new())),
            next_id: Cell::new(0),
        }
    }

    /// Register `listener`; it is called for every subsequent [`emit`](Self::emit).
    pub fn subscribe(&self, listener: impl Fn(&T) + 'static) -> Subscription {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.listeners.borrow_mut().push((id, Rc::new(listener)));

        let listeners: Weak<RefCell<Vec<(usize, Listener<T>)>>> = Rc::downgrade(&self.listeners);
        Subscription::new(move || {
            if let Some(listeners) = listeners.upgrade() {
                listeners.borrow_mut().retain(|(listener_id, _)| *listener_id != id);
            }
        })
    }

    /// Deliver `value` to every listener in subscription order.
    pub fn emit(&self, value: &T) {
        let snapshot: Vec<Listener<T>> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in snapshot {
            listener(value);
        }
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

impl<T: 'static> Default for Emitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> fmt::Debug for Emitter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_in_subscription_order() {
        let emitter = Emitter::<u32>::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let first = seen.clone();
        let _a = emitter.subscribe(move |v| first.borrow_mut().push(("a", *v)));
        let second = seen.clone();
        let _b = emitter.subscribe(move |v| second.borrow_mut().push(("b", *v)));

        emitter.emit(&7);

        assert_eq!(*seen.borrow(), vec![("a", 7), ("b", 7)]);
    }

    #[test]
    fn test_unsubscribe_removes_listener() {
        let emitter = Emitter::<u32>::new();
        let count = Rc::new(Cell::new(0));

        let counter = count.clone();
        let mut sub = emitter.subscribe(move |_| counter.set(counter.get() + 1));

        emitter.emit(&1);
        sub.unsubscribe();
        emitter.emit(&2);

        assert_eq!(count.get(), 1);
        assert!(!sub.is_active());
        assert_eq!(emitter.listener_count(), 0);

        // Second call is a no-op
        sub.unsubscribe();
    }

    #[test]
    fn test_listener_may_unsubscribe_itself() {
        let emitter = Rc::new(Emitter::<u32>::new());
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let count = Rc::new(Cell::new(0));

        let slot_clone = slot.clone();
        let counter = count.clone();
        let sub = emitter.subscribe(move |_| {
            counter.set(counter.get() + 1);
            if let Some(mut sub) = slot_clone.borrow_mut().take() {
                sub.unsubscribe();
            }
        });
        *slot.borrow_mut() = Some(sub);

        emitter.emit(&1);
        emitter.emit(&2);

        assert_eq!(count.get(), 1);
    }
}
