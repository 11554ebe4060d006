//! Component Definition - immutable blueprint for a kind of component.
//!
//! # Example
//!
//! ```ignore
//! let todo = define_component(ComponentOptions {
//!     name: "todo".into(),
//!     content_type: ContentType::BlockComponent,
//!     validate: Some(Box::new(|init| {
//!         if init.slots.is_empty() {
//!             return Err(Error::validation("todo", "needs a text slot"));
//!         }
//!         Ok(init)
//!     })),
//!     setup: Some(Box::new(|| {
//!         let state = use_state()?;
//!         on_break(move |event| {
//!             event.prevent_default();
//!             state.update(|draft| draft["done"] = true.into(), true);
//!         })
//!     })),
//!     ..Default::default()
//! });
//!
//! let instance = todo.create_instance(&injector, Some(InitData::default().with_slots(slots)))?;
//! ```

use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::component::{ComponentInstance, ComponentRef};
use crate::engine::context::{ContextGuard, ContextRecord};
use crate::error::Result;
use crate::model::{Injector, Slot};
use crate::types::ContentType;

/// Rewrites (or rejects) the init data before construction.
pub type ValidateFn = Box<dyn Fn(InitData) -> Result<InitData>>;

/// Runs inside the construction context of every new instance.
pub type SetupFn = Box<dyn Fn() -> Result<()>>;

// =============================================================================
// Options
// =============================================================================

#[derive(Default)]
pub struct ComponentOptions {
    pub name: String,
    pub content_type: ContentType,
    /// Whether the component may be split across a selection boundary.
    pub separable: bool,
    pub validate: Option<ValidateFn>,
    pub setup: Option<SetupFn>,
}

/// Initial state and slots for a new instance.
#[derive(Default, Debug)]
pub struct InitData {
    pub state: Option<Value>,
    pub slots: Vec<Rc<Slot>>,
}

impl InitData {
    pub fn with_state(mut self, state: Value) -> Self {
        self.state = Some(state);
        self
    }

    pub fn with_slots(mut self, slots: Vec<Rc<Slot>>) -> Self {
        self.slots = slots;
        self
    }
}

// =============================================================================
// Definition
// =============================================================================

pub struct ComponentDefinition {
    name: String,
    content_type: ContentType,
    separable: bool,
    validate: Option<ValidateFn>,
    setup: Option<SetupFn>,
}

impl ComponentDefinition {
    pub fn new(options: ComponentOptions) -> Rc<Self> {
        Rc::new(Self {
            name: options.name,
            content_type: options.content_type,
            separable: options.separable,
            validate: options.validate,
            setup: options.setup,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    pub fn separable(&self) -> bool {
        self.separable
    }

    /// Build a new instance.
    ///
    /// `validate` runs first and its output is what the instance is built
    /// from. `setup` runs with this instance as the construction context;
    /// an error from either is returned unchanged and no instance survives.
    pub fn create_instance(
        self: &Rc<Self>,
        injector: &Rc<Injector>,
        init: Option<InitData>,
    ) -> Result<ComponentRef> {
        let init = init.unwrap_or_default();
        let init = match &self.validate {
            Some(validate) => validate(init)?,
            None => init,
        };

        let instance =
            ComponentInstance::new(self.clone(), init.state.unwrap_or(Value::Null), init.slots);

        if let Some(setup) = &self.setup {
            let _guard = ContextGuard::enter(ContextRecord {
                instance: instance.clone(),
                injector: injector.clone(),
            });
            if let Err(err) = setup() {
                log::debug!("setup of `{}` failed: {err}", self.name);
                instance.abort();
                return Err(err);
            }
        }

        instance.activate();
        log::debug!("created component {} ({})", instance.id(), self.name);
        Ok(instance)
    }
}

impl fmt::Debug for ComponentDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDefinition")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("separable", &self.separable)
            .field("validate", &self.validate.is_some())
            .field("setup", &self.setup.is_some())
            .finish()
    }
}

/// Shorthand for [`ComponentDefinition::new`].
pub fn define_component(options: ComponentOptions) -> Rc<ComponentDefinition> {
    ComponentDefinition::new(options)
}
