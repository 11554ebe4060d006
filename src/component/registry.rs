//! Component Registry - name to definition resolution.
//!
//! Built from an ordered list; when several entries share a name the one
//! registered last wins. A fallback resolver handles names the table misses,
//! e.g. to map legacy names onto current definitions.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::component::{ComponentDefinition, ComponentRef, InitData};
use crate::error::{Error, Result};
use crate::model::{Injector, Slot};
use crate::types::{ComponentLiteral, SlotContentLiteral, SlotLiteral};

/// Anything resolvable by name.
pub trait Named {
    fn name(&self) -> &str;
}

impl Named for ComponentDefinition {
    fn name(&self) -> &str {
        ComponentDefinition::name(self)
    }
}

/// Resolver consulted when a name is not registered.
pub type Fallback<T> = Box<dyn Fn(&str) -> Option<Rc<T>>>;

pub struct Registry<T: Named> {
    entries: RefCell<HashMap<String, Rc<T>>>,
    fallback: Option<Fallback<T>>,
}

impl<T: Named> Registry<T> {
    pub fn new(entries: Vec<Rc<T>>) -> Self {
        Self::with_fallback(entries, None)
    }

    pub fn with_fallback(entries: Vec<Rc<T>>, fallback: Option<Fallback<T>>) -> Self {
        let mut map = HashMap::new();
        for entry in entries.into_iter().rev() {
            map.entry(entry.name().to_string()).or_insert(entry);
        }
        Self {
            entries: RefCell::new(map),
            fallback,
        }
    }

    /// Add `entry`, shadowing any entry with the same name.
    pub fn register(&self, entry: Rc<T>) {
        self.entries
            .borrow_mut()
            .insert(entry.name().to_string(), entry);
    }

    pub fn get(&self, name: &str) -> Option<Rc<T>> {
        if let Some(entry) = self.entries.borrow().get(name) {
            return Some(entry.clone());
        }
        self.fallback.as_ref().and_then(|fallback| fallback(name))
    }

    /// Whether `name` is registered, ignoring the fallback.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.borrow().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl<T: Named> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self.entries.borrow().keys().cloned().collect();
        names.sort();
        f.debug_struct("Registry")
            .field("names", &names)
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

pub type ComponentRegistry = Registry<ComponentDefinition>;

impl Registry<ComponentDefinition> {
    /// Rebuild a component tree from its literal snapshot.
    pub fn create_from_literal(
        &self,
        literal: &ComponentLiteral,
        injector: &Rc<Injector>,
    ) -> Result<ComponentRef> {
        let definition = self
            .get(&literal.name)
            .ok_or_else(|| Error::UnknownComponent(literal.name.clone()))?;

        let slots = literal
            .slots
            .iter()
            .map(|slot| self.create_slot(slot, injector))
            .collect::<Result<Vec<_>>>()?;

        let state = match &literal.state {
            serde_json::Value::Null => None,
            state => Some(state.clone()),
        };
        definition.create_instance(injector, Some(InitData { state, slots }))
    }

    fn create_slot(&self, literal: &SlotLiteral, injector: &Rc<Injector>) -> Result<Rc<Slot>> {
        let slot = Slot::new(literal.schema.clone());
        for content in &literal.content {
            let accepted = match content {
                SlotContentLiteral::Text(text) => slot.insert_text(text),
                SlotContentLiteral::Component(child) => {
                    let child = self.create_from_literal(child, injector)?;
                    slot.insert_component(&child)
                }
            };
            if !accepted {
                log::warn!("slot schema {:?} rejected literal content", literal.schema);
            }
        }
        Ok(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{define_component, ComponentOptions};
    use crate::engine::reset_context_stack;
    use crate::types::ContentType;
    use serde_json::json;

    fn setup() {
        reset_context_stack();
    }

    fn named(name: &str, content_type: ContentType) -> Rc<ComponentDefinition> {
        define_component(ComponentOptions {
            name: name.into(),
            content_type,
            ..Default::default()
        })
    }

    #[test]
    fn test_last_registered_wins() {
        let first = named("paragraph", ContentType::BlockComponent);
        let second = named("paragraph", ContentType::InlineComponent);
        let registry = ComponentRegistry::new(vec![first, second.clone()]);

        assert_eq!(registry.len(), 1);
        assert!(Rc::ptr_eq(&registry.get("paragraph").unwrap(), &second));

        let third = named("paragraph", ContentType::Text);
        registry.register(third.clone());
        assert!(Rc::ptr_eq(&registry.get("paragraph").unwrap(), &third));
    }

    #[test]
    fn test_fallback() {
        let paragraph = named("paragraph", ContentType::BlockComponent);
        let target = paragraph.clone();
        let registry = ComponentRegistry::with_fallback(
            vec![paragraph],
            Some(Box::new(move |name| (name == "p").then(|| target.clone()))),
        );

        assert!(registry.get("p").is_some());
        assert!(!registry.contains("p"));
        assert!(registry.get("table").is_none());
    }

    #[test]
    fn test_create_from_literal() {
        setup();

        let registry = ComponentRegistry::new(vec![
            named("root", ContentType::BlockComponent),
            named("paragraph", ContentType::BlockComponent),
        ]);
        let literal: ComponentLiteral = serde_json::from_value(json!({
            "name": "root",
            "state": null,
            "slots": [{
                "schema": ["block_component"],
                "content": [{
                    "name": "paragraph",
                    "state": { "align": "left" },
                    "slots": [{ "schema": ["text"], "content": ["Hello"] }]
                }]
            }]
        }))
        .unwrap();

        let root = registry
            .create_from_literal(&literal, &Rc::new(Injector::new()))
            .unwrap();

        assert_eq!(root.to_string(), "Hello");
        assert_eq!(root.to_json(), literal);

        let child = &root.slots().get(0).unwrap().components()[0];
        assert!(Rc::ptr_eq(&child.parent_component().unwrap(), &root));
    }

    #[test]
    fn test_unknown_component() {
        setup();

        let registry = ComponentRegistry::new(Vec::new());
        let literal = ComponentLiteral {
            name: "missing".into(),
            state: serde_json::Value::Null,
            slots: Vec::new(),
        };

        let err = registry
            .create_from_literal(&literal, &Rc::new(Injector::new()))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownComponent(name) if name == "missing"));
    }
}
