//! Hearth core: classes, events and base objects
//!
//! The layer every other Hearth crate builds on:
//! - `Name`: validated dotted logical name (`MyApp.view.Index`)
//! - `Value`: dynamically-typed tree carried by fields, events and stores
//! - `ClassRegistry`: named class definitions with parent composition
//! - `EventBus`: named-channel publish/subscribe, global or per object
//! - `Instance`: a constructed object with its own id and local bus
//!
//! # Example
//!
//! ```rust
//! use hearth_core::{name, ClassDefinition, ClassRegistry, Value};
//!
//! let registry = ClassRegistry::new();
//! registry
//!     .register(
//!         ClassDefinition::new(name!("App.Counter"))
//!             .extends(name!("hearth.class.Base"))
//!             .field("count", 0i64)
//!             .operation("increment", |call| {
//!                 let next = call.instance().get("count").and_then(Value::as_i64).unwrap_or(0) + 1;
//!                 call.instance_mut().set("count", next)?;
//!                 Ok(Value::Integer(next))
//!             }),
//!     )
//!     .unwrap();
//!
//! let mut counter = registry.instantiate(&name!("App.Counter"), None).unwrap();
//! assert_eq!(counter.call("increment", &[]).unwrap(), Value::Integer(1));
//! ```

pub mod class;
mod error;
pub mod event;
mod id;
mod name;
mod object;
mod value;

pub use class::{Call, ClassDefinition, ClassRegistry, Member, Members, Operation, ResolvedClass};
pub use error::{BatchSubscribeError, ClassError, EventError};
pub use event::{Event, EventBus, Listener};
pub use id::{ObjectId, SubscriptionId};
pub use name::{IntoName, Name, NameError};
pub use object::{base_definition, Instance, BASE_CLASS, INIT, READY_EVENT_FIELD};
pub use value::Value;
