//! Components - definitions, live instances and name resolution.

mod definition;
mod instance;
mod registry;

pub use definition::*;
pub use instance::*;
pub use registry::*;
