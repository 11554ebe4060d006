//! Document model collaborators.
//!
//! The component engine consumes these through narrow contracts:
//! - [`Slot`] / [`Slots`] - child content and its change stream
//! - [`ChangeMarker`] - dirty tracking sink
//! - [`Injector`] - service resolution during setup
//! - [`Operation`] - reversible change records

mod change_marker;
mod injector;
mod operation;
mod slot;

pub use change_marker::*;
pub use injector::*;
pub use operation::*;
pub use slot::*;
