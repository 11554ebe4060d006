//! Component Engine - construction context, hook tables and dispatch.
//!
//! - Context: thread-local stack of components currently running setup
//! - Hooks: per-instance callback tables keyed by [`EventKind`]
//! - Dispatch: invoking hooks and walking the component tree
//!
//! # Architecture
//!
//! Hooks are registered without a component handle. Setup code runs while
//! its component sits on top of the context stack, and every `on_*`
//! function appends to that component's table:
//!
//! ```text
//! create_instance ─► push ─► setup() ─► on_paste(..) ─► top.hooks[Paste].push(..)
//!                                   └─► pop (also on error)
//!
//! invoke(target, Paste, &mut event) ─► target.hooks[Paste] in order
//! ```

pub mod context;
pub mod dispatch;
pub mod hooks;

pub use context::*;
pub use dispatch::*;
pub use hooks::*;
