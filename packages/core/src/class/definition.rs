//! Class definitions and their resolved (composed) form.

use std::sync::OnceLock;

use crate::class::member::{Member, Members};
use crate::class::operation::{Call, Operation};
use crate::error::ClassError;
use crate::event::Listener;
use crate::id::ObjectId;
use crate::name::Name;
use crate::value::Value;

/// A named class: an optional parent plus its own members.
///
/// # Example
///
/// ```rust
/// use hearth_core::{name, ClassDefinition, Value};
///
/// let shape = ClassDefinition::new(name!("App.Shape"))
///     .field("color", "red")
///     .operation("area", |_| Ok(Value::Float(0.0)));
/// assert!(shape.members().contains("area"));
/// ```
#[derive(Clone, Debug)]
pub struct ClassDefinition {
    name: Name,
    parent: Option<Name>,
    members: Members,
    class_id: OnceLock<ObjectId>,
}

impl ClassDefinition {
    pub fn new(name: Name) -> Self {
        Self {
            name,
            parent: None,
            members: Members::new(),
            class_id: OnceLock::new(),
        }
    }

    /// Derive from `parent`.
    pub fn extends(mut self, parent: Name) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.members = self.members.field(name, value);
        self
    }

    pub fn operation<F>(mut self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut Call<'_>) -> Result<Value, ClassError> + Send + Sync + 'static,
    {
        self.members = self.members.operation(name, body);
        self
    }

    pub fn listener(mut self, channel: impl Into<String>, listener: Listener) -> Self {
        self.members = self.members.listener(channel, listener);
        self
    }

    /// Replace all own members at once.
    pub fn with_members(mut self, members: Members) -> Self {
        self.members = members;
        self
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn parent(&self) -> Option<&Name> {
        self.parent.as_ref()
    }

    pub fn members(&self) -> &Members {
        &self.members
    }

    /// Identifier of this definition, assigned on first request.
    pub fn class_id(&self) -> ObjectId {
        *self.class_id.get_or_init(ObjectId::new)
    }

    /// Fold a re-registration into this definition. Existing members win.
    pub(crate) fn patch(&mut self, incoming: &ClassDefinition) -> Result<(), ClassError> {
        self.members.patch(&self.name, &incoming.members)?;
        if self.parent.is_none() {
            self.parent = incoming.parent.clone();
        }
        Ok(())
    }
}

/// A class with its full parent chain composed.
#[derive(Clone, Debug)]
pub struct ResolvedClass {
    pub(crate) name: Name,
    pub(crate) lineage: Vec<Name>,
    pub(crate) members: Members,
    pub(crate) missing_parent: Option<Name>,
}

impl ResolvedClass {
    pub fn name(&self) -> &Name {
        &self.name
    }

    /// The class followed by its ancestors, nearest first.
    pub fn lineage(&self) -> &[Name] {
        &self.lineage
    }

    pub fn members(&self) -> &Members {
        &self.members
    }

    pub fn is_a(&self, name: &Name) -> bool {
        self.lineage.contains(name)
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.members.get(name).and_then(Member::as_field)
    }

    pub fn operation(&self, name: &str) -> Option<&Operation> {
        self.members.get(name).and_then(Member::as_operation)
    }

    /// Length of the override chain behind an operation.
    pub fn operation_depth(&self, name: &str) -> Option<usize> {
        self.operation(name).map(Operation::depth)
    }

    /// An ancestor named in the chain that was not registered when this
    /// class was resolved.
    pub fn missing_parent(&self) -> Option<&Name> {
        self.missing_parent.as_ref()
    }

    /// Whether registering `name` could change this resolution.
    pub(crate) fn depends_on(&self, name: &Name) -> bool {
        self.lineage.contains(name) || self.missing_parent.as_ref() == Some(name)
    }
}
