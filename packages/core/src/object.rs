//! Instances of composed classes, and the root base class.

use std::fmt;
use std::sync::OnceLock;

use parking_lot::Mutex;

use crate::class::{ClassDefinition, Member, Members};
use crate::error::ClassError;
use crate::event::EventBus;
use crate::id::ObjectId;
use crate::name::Name;
use crate::value::Value;

/// Name of the root class every framework class derives from.
pub const BASE_CLASS: &str = "hearth.class.Base";

/// Name of the constructor operation.
pub const INIT: &str = "init";

/// Field naming the channel fired when construction completes.
pub const READY_EVENT_FIELD: &str = "readyEvent";

/// The root base class.
///
/// Its `init` publishes the instance's ready channel (the `readyEvent`
/// field, `"ready"` unless a subclass says otherwise) on the instance's own
/// bus, with the instance id as the only argument.
pub fn base_definition() -> ClassDefinition {
    ClassDefinition::new(Name::from_static(BASE_CLASS))
        .field(READY_EVENT_FIELD, "ready")
        .operation(INIT, |call| {
            let instance = call.instance();
            let channel = instance.ready_channel().to_string();
            instance.fire(&channel, &[Value::from(instance.id().to_string())]);
            Ok(Value::Null)
        })
}

/// A live object built from a resolved class.
///
/// The id and the local event bus are created lazily, on first use.
pub struct Instance {
    class: Name,
    lineage: Vec<Name>,
    members: Members,
    id: OnceLock<ObjectId>,
    events: OnceLock<EventBus>,
    deferred: Mutex<Option<Vec<(String, Vec<Value>)>>>,
    constructed: bool,
}

impl Instance {
    pub(crate) fn new(class: Name, lineage: Vec<Name>, members: Members) -> Self {
        Self {
            class,
            lineage,
            members,
            id: OnceLock::new(),
            events: OnceLock::new(),
            deferred: Mutex::new(None),
            constructed: false,
        }
    }

    pub fn id(&self) -> ObjectId {
        *self.id.get_or_init(ObjectId::new)
    }

    pub fn class_name(&self) -> &Name {
        &self.class
    }

    pub fn lineage(&self) -> &[Name] {
        &self.lineage
    }

    pub fn is_a(&self, class: &Name) -> bool {
        self.lineage.contains(class)
    }

    /// The instance's own event bus.
    pub fn events(&self) -> &EventBus {
        self.events.get_or_init(|| EventBus::scoped(self.id()))
    }

    /// Publish on the instance's own bus.
    ///
    /// While events are deferred the event is queued instead and `0` is
    /// returned.
    pub fn fire(&self, channel: &str, args: &[Value]) -> usize {
        {
            let mut deferred = self.deferred.lock();
            if let Some(queue) = deferred.as_mut() {
                queue.push((channel.to_string(), args.to_vec()));
                return 0;
            }
        }
        self.events().publish(channel, args)
    }

    /// Queue events fired from now on until [`Instance::take_deferred`].
    ///
    /// Owners that keep the instance behind a lock use this so listeners
    /// run after the lock is released and may touch the instance again.
    pub fn defer_events(&self) {
        let mut deferred = self.deferred.lock();
        if deferred.is_none() {
            *deferred = Some(Vec::new());
        }
    }

    /// Stop deferring and return the queued events in firing order.
    pub fn take_deferred(&self) -> Vec<(String, Vec<Value>)> {
        self.deferred.lock().take().unwrap_or_default()
    }

    pub fn members(&self) -> &Members {
        &self.members
    }

    pub fn is_constructed(&self) -> bool {
        self.constructed
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.members.get(field).and_then(Member::as_field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    /// Set a field, returning its previous value.
    ///
    /// Fails if the name is taken by an operation.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> Result<Option<Value>, ClassError> {
        match self.members.get_mut(field) {
            Some(Member::Field(current)) => Ok(Some(std::mem::replace(current, value.into()))),
            Some(Member::Operation(_)) => Err(ClassError::NotAField(field.to_string())),
            None => {
                self.members
                    .insert(field.to_string(), Member::Field(value.into()));
                Ok(None)
            }
        }
    }

    pub fn has_operation(&self, name: &str) -> bool {
        matches!(self.members.get(name), Some(Member::Operation(_)))
    }

    /// Invoke an operation.
    pub fn call(&mut self, name: &str, args: &[Value]) -> Result<Value, ClassError> {
        let operation = match self.members.get(name) {
            Some(Member::Operation(op)) => op.clone(),
            Some(Member::Field(_)) => return Err(ClassError::NotAnOperation(name.to_string())),
            None => return Err(ClassError::OperationNotFound(name.to_string())),
        };
        operation.invoke(name, self, args)
    }

    /// Channel fired once construction completes.
    pub fn ready_channel(&self) -> &str {
        self.get_str(READY_EVENT_FIELD).unwrap_or("ready")
    }

    /// Wire declared listeners and run the constructor, once.
    ///
    /// Returns `false` if the instance was already constructed. If `init`
    /// fails the instance stays unconstructed.
    pub fn construct(&mut self) -> Result<bool, ClassError> {
        if self.constructed {
            return Ok(false);
        }

        let scope = Some(self.id());
        for (channel, listener) in self.members.listeners() {
            if let Err(e) = self.events().subscribe(channel, listener, scope) {
                tracing::warn!(class = %self.class, channel = %channel, error = %e, "skipping declared listener");
            }
        }

        if self.has_operation(INIT) {
            self.call(INIT, &[])?;
        }
        self.constructed = true;
        tracing::trace!(class = %self.class, id = %self.id(), "instance constructed");
        Ok(true)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("class", &self.class.to_string())
            .field("id", &self.id.get())
            .field("constructed", &self.constructed)
            .field("members", &self.members)
            .finish()
    }
}
