//! Error types shared by the component engine.

use thiserror::Error;

/// Errors surfaced by construction, resolution and state operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A construction-only accessor was called while no component was being set up.
    #[error("`{0}` can only be called during component setup")]
    OutsideSetup(&'static str),

    /// A component validator refused its init data.
    #[error("component `{component}` rejected its init data: {reason}")]
    Validation { component: String, reason: String },

    /// No provider was found for a requested service type.
    #[error("no provider registered for `{0}`")]
    NoProvider(&'static str),

    /// A literal named a component the registry cannot resolve.
    #[error("unknown component `{0}`")]
    UnknownComponent(String),

    /// A state patch referenced a path that does not exist in the target value.
    #[error("cannot apply patch at `{path}`: {reason}")]
    Patch { path: String, reason: String },

    /// Typed state could not be converted to or from its JSON snapshot.
    #[error("state conversion failed: {0}")]
    State(#[from] serde_json::Error),
}

impl Error {
    /// Build a validation error for `component`.
    pub fn validation(component: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            component: component.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
