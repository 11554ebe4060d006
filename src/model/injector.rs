//! Injector - type-keyed service container.
//!
//! Components resolve shared services (history, selection, configuration)
//! through the injector active during their setup. Injectors form a chain:
//! lookups fall through to the parent unless [`InjectFlags::SELF`] is given.

use std::any::{type_name, Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::error::{Error, Result};

bitflags::bitflags! {
    /// Lookup modifiers for [`Injector::get_with`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct InjectFlags: u8 {
        /// Only look at the injector itself.
        const SELF = 1 << 0;
        /// Start the lookup at the parent.
        const SKIP_SELF = 1 << 1;
        /// Return `None` instead of failing when nothing is found.
        const OPTIONAL = 1 << 2;
    }
}

#[derive(Default)]
pub struct Injector {
    parent: Option<Rc<Injector>>,
    providers: RefCell<HashMap<TypeId, Rc<dyn Any>>>,
}

impl Injector {
    /// A root injector.
    pub fn new() -> Self {
        Self::default()
    }

    /// A child injector that falls back to `parent`.
    pub fn with_parent(parent: Rc<Injector>) -> Self {
        Self {
            parent: Some(parent),
            providers: RefCell::new(HashMap::new()),
        }
    }

    pub fn parent(&self) -> Option<&Rc<Injector>> {
        self.parent.as_ref()
    }

    /// Register `value` as the provider for `T`, replacing any previous one.
    pub fn provide<T: Any>(&self, value: T) -> Rc<T> {
        let value = Rc::new(value);
        self.provide_rc(value.clone());
        value
    }

    /// Register an already shared provider for `T`.
    pub fn provide_rc<T: Any>(&self, value: Rc<T>) {
        self.providers.borrow_mut().insert(TypeId::of::<T>(), value);
    }

    /// Whether this injector itself provides `T`.
    pub fn has<T: Any>(&self) -> bool {
        self.providers.borrow().contains_key(&TypeId::of::<T>())
    }

    /// Resolve `T` through the chain.
    pub fn get<T: Any>(&self) -> Result<Rc<T>> {
        self.get_with::<T>(InjectFlags::empty())?
            .ok_or(Error::NoProvider(type_name::<T>()))
    }

    /// Resolve `T` honoring `flags`.
    pub fn get_with<T: Any>(&self, flags: InjectFlags) -> Result<Option<Rc<T>>> {
        let mut current = if flags.contains(InjectFlags::SKIP_SELF) {
            self.parent.as_deref()
        } else {
            Some(self)
        };

        while let Some(injector) = current {
            if let Some(found) = injector.local::<T>() {
                return Ok(Some(found));
            }
            if flags.contains(InjectFlags::SELF) {
                break;
            }
            current = injector.parent.as_deref();
        }

        if flags.contains(InjectFlags::OPTIONAL) {
            Ok(None)
        } else {
            Err(Error::NoProvider(type_name::<T>()))
        }
    }

    fn local<T: Any>(&self) -> Option<Rc<T>> {
        let provider = self.providers.borrow().get(&TypeId::of::<T>())?.clone();
        provider.downcast::<T>().ok()
    }
}

impl fmt::Debug for Injector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injector")
            .field("providers", &self.providers.borrow().len())
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Locale(&'static str);

    #[derive(Debug, PartialEq)]
    struct TabSize(u8);

    #[test]
    fn test_get_falls_through_to_parent() {
        let root = Rc::new(Injector::new());
        root.provide(Locale("en"));

        let child = Injector::with_parent(root.clone());
        child.provide(TabSize(4));

        assert_eq!(*child.get::<Locale>().unwrap(), Locale("en"));
        assert_eq!(*child.get::<TabSize>().unwrap(), TabSize(4));
        assert!(matches!(root.get::<TabSize>(), Err(Error::NoProvider(_))));
    }

    #[test]
    fn test_flags() {
        let root = Rc::new(Injector::new());
        root.provide(Locale("en"));
        let child = Injector::with_parent(root.clone());
        child.provide(Locale("nl"));

        let own = child.get_with::<Locale>(InjectFlags::SELF).unwrap();
        assert_eq!(own.as_deref(), Some(&Locale("nl")));

        let inherited = child.get_with::<Locale>(InjectFlags::SKIP_SELF).unwrap();
        assert_eq!(inherited.as_deref(), Some(&Locale("en")));

        let missing = child
            .get_with::<TabSize>(InjectFlags::SELF | InjectFlags::OPTIONAL)
            .unwrap();
        assert!(missing.is_none());

        assert!(child.get_with::<TabSize>(InjectFlags::SELF).is_err());
    }

    #[test]
    fn test_provide_replaces() {
        let injector = Injector::new();
        injector.provide(TabSize(2));
        injector.provide(TabSize(8));
        assert!(injector.has::<TabSize>());
        assert_eq!(*injector.get::<TabSize>().unwrap(), TabSize(8));
    }
}
