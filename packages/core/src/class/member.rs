//! Member sets and the two ways they combine.
//!
//! - Composition (`compose`) builds a child's effective members over its
//!   parent's: the child wins, and an overriding operation is chained to the
//!   parent version.
//! - Patching (`patch`) folds a re-registration into an existing definition:
//!   existing members win, new names are added.

use std::collections::BTreeMap;
use std::fmt;

use crate::class::operation::{Call, Operation};
use crate::error::ClassError;
use crate::event::Listener;
use crate::name::Name;
use crate::value::Value;

/// One named member of a class.
#[derive(Clone, Debug)]
pub enum Member {
    Field(Value),
    Operation(Operation),
}

impl Member {
    pub fn kind(&self) -> &'static str {
        match self {
            Member::Field(_) => "field",
            Member::Operation(_) => "operation",
        }
    }

    pub fn as_field(&self) -> Option<&Value> {
        match self {
            Member::Field(v) => Some(v),
            Member::Operation(_) => None,
        }
    }

    pub fn as_operation(&self) -> Option<&Operation> {
        match self {
            Member::Operation(op) => Some(op),
            Member::Field(_) => None,
        }
    }
}

/// Named members plus declared listeners.
///
/// Used both as the own members of a class definition and as the
/// anonymous overrides passed at instantiation.
#[derive(Clone, Default)]
pub struct Members {
    entries: BTreeMap<String, Member>,
    listeners: Vec<(String, Listener)>,
}

impl Members {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a data field.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries
            .insert(name.into(), Member::Field(value.into()));
        self
    }

    /// Add an operation.
    pub fn operation<F>(mut self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut Call<'_>) -> Result<Value, ClassError> + Send + Sync + 'static,
    {
        self.entries
            .insert(name.into(), Member::Operation(Operation::new(body)));
        self
    }

    /// Declare a listener, wired to the instance's own bus at construction.
    pub fn listener(mut self, channel: impl Into<String>, listener: Listener) -> Self {
        self.listeners.push((channel.into(), listener));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Member> {
        self.entries.get(name)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut Member> {
        self.entries.get_mut(name)
    }

    pub(crate) fn insert(&mut self, name: String, member: Member) -> Option<Member> {
        self.entries.insert(name, member)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.listeners.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Member)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn listeners(&self) -> &[(String, Listener)] {
        &self.listeners
    }

    /// Effective members of `own` layered over `parent`.
    ///
    /// Own members replace parent members of the same name. An own operation
    /// that replaces a parent operation is chained to it. Listeners are
    /// concatenated, parent first.
    pub fn compose(own: &Members, parent: &Members) -> Members {
        let mut entries = parent.entries.clone();
        for (name, member) in &own.entries {
            let effective = match (member, parent.entries.get(name)) {
                (Member::Operation(op), Some(Member::Operation(base))) => {
                    Member::Operation(op.chained(base))
                }
                _ => member.clone(),
            };
            entries.insert(name.clone(), effective);
        }

        let mut listeners = parent.listeners.clone();
        listeners.extend(own.listeners.iter().cloned());

        Members { entries, listeners }
    }

    /// Fold `incoming` into these members without overwriting.
    ///
    /// Names not yet present are added. A name present in both keeps the
    /// existing member, unless the kinds differ, which is a conflict.
    pub(crate) fn patch(&mut self, class: &Name, incoming: &Members) -> Result<(), ClassError> {
        for (name, member) in &incoming.entries {
            if let Some(existing) = self.entries.get(name) {
                if existing.kind() != member.kind() {
                    return Err(ClassError::DuplicateDefinitionConflict {
                        class: class.clone(),
                        member: name.clone(),
                        existing: existing.kind(),
                        incoming: member.kind(),
                    });
                }
            }
        }

        for (name, member) in &incoming.entries {
            self.entries
                .entry(name.clone())
                .or_insert_with(|| member.clone());
        }
        for (channel, listener) in &incoming.listeners {
            let known = self
                .listeners
                .iter()
                .any(|(c, l)| c == channel && l.same(listener));
            if !known {
                self.listeners.push((channel.clone(), listener.clone()));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Members {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, v)| (k, v.kind())))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name;

    #[test]
    fn compose_child_wins_and_chains() {
        let parent = Members::new()
            .field("color", "red")
            .field("sides", 0i64)
            .operation("area", |_| Ok(Value::Float(0.0)));
        let child = Members::new()
            .field("color", "blue")
            .operation("area", |_| Ok(Value::Float(1.0)));

        let composed = Members::compose(&child, &parent);
        assert_eq!(composed.get("color").unwrap().as_field(), Some(&Value::from("blue")));
        assert_eq!(composed.get("sides").unwrap().as_field(), Some(&Value::Integer(0)));
        assert_eq!(composed.get("area").unwrap().as_operation().unwrap().depth(), 2);
    }

    #[test]
    fn compose_field_over_operation_replaces() {
        let parent = Members::new().operation("label", |_| Ok(Value::Null));
        let child = Members::new().field("label", "static");
        let composed = Members::compose(&child, &parent);
        assert_eq!(composed.get("label").unwrap().kind(), "field");
    }

    #[test]
    fn compose_concatenates_listeners_parent_first() {
        let parent = Members::new().listener("ready", Listener::new(|_, _| {}));
        let child = Members::new().listener("state", Listener::new(|_, _| {}));
        let composed = Members::compose(&child, &parent);
        let channels: Vec<_> = composed.listeners().iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(channels, vec!["ready", "state"]);
    }

    #[test]
    fn patch_keeps_existing_and_adds_new() {
        let mut members = Members::new().field("url", "/a");
        members
            .patch(&name!("App.Store"), &Members::new().field("url", "/b").field("autoLoad", true))
            .unwrap();
        assert_eq!(members.get("url").unwrap().as_field(), Some(&Value::from("/a")));
        assert_eq!(members.get("autoLoad").unwrap().as_field(), Some(&Value::Bool(true)));
    }

    #[test]
    fn patch_rejects_kind_mismatch() {
        let mut members = Members::new().operation("area", |_| Ok(Value::Null));
        let err = members
            .patch(&name!("App.Shape"), &Members::new().field("area", 1i64))
            .unwrap_err();
        assert!(matches!(
            err,
            ClassError::DuplicateDefinitionConflict { existing: "operation", incoming: "field", .. }
        ));
        assert_eq!(members.get("area").unwrap().kind(), "operation");
    }

    #[test]
    fn patch_skips_known_listener() {
        let listener = Listener::new(|_, _| {});
        let mut members = Members::new().listener("ready", listener.clone());
        members
            .patch(&name!("App.View"), &Members::new().listener("ready", listener))
            .unwrap();
        assert_eq!(members.listeners().len(), 1);
    }
}
