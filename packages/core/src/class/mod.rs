//! Class definitions, composition and the registry.

mod definition;
mod member;
mod operation;
mod registry;

pub use definition::{ClassDefinition, ResolvedClass};
pub use member::{Member, Members};
pub use operation::{Call, Operation};
pub use registry::ClassRegistry;
