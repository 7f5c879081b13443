//! Dual event system: one `EventBus` type backs both the process-wide bus
//! and each object's local bus.

mod bus;
mod listener;

pub use bus::EventBus;
pub use listener::{Event, Listener};
