//! The class registry: registration, memoized resolution, instantiation.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::class::definition::{ClassDefinition, ResolvedClass};
use crate::class::member::Members;
use crate::error::ClassError;
use crate::id::ObjectId;
use crate::name::Name;
use crate::object::{base_definition, Instance};

struct Entry {
    definition: Arc<ClassDefinition>,
    resolved: Option<Arc<ResolvedClass>>,
}

impl Entry {
    fn new(definition: Arc<ClassDefinition>) -> Self {
        Self {
            definition,
            resolved: None,
        }
    }
}

/// Name-keyed store of class definitions.
///
/// Resolution composes a class over its ancestors once and caches the
/// result. Registering or replacing a class drops the cached resolution of
/// every class that depends on it, so the next resolve recomposes from the
/// unmodified own members and never wraps an operation twice.
///
/// # Example
///
/// ```rust
/// use hearth_core::{name, ClassDefinition, ClassRegistry, Value};
///
/// let registry = ClassRegistry::new();
/// registry
///     .register(
///         ClassDefinition::new(name!("App.Shape"))
///             .extends(name!("hearth.class.Base"))
///             .operation("area", |_| Ok(Value::Float(0.0))),
///     )
///     .unwrap();
///
/// let mut shape = registry.instantiate(&name!("App.Shape"), None).unwrap();
/// assert_eq!(shape.call("area", &[]).unwrap(), Value::Float(0.0));
/// ```
pub struct ClassRegistry {
    entries: RwLock<BTreeMap<Name, Entry>>,
}

impl ClassRegistry {
    /// A registry holding the root base class.
    pub fn new() -> Self {
        let registry = Self::empty();
        registry.replace(base_definition());
        registry
    }

    /// A registry with no classes at all.
    pub fn empty() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    /// Register a class, merging with any existing definition of that name.
    ///
    /// Members already defined win over incoming ones of the same name; new
    /// names are added. Merging a field over an operation (or the reverse)
    /// fails with [`ClassError::DuplicateDefinitionConflict`] and leaves the
    /// stored definition untouched.
    pub fn register(&self, definition: ClassDefinition) -> Result<Arc<ClassDefinition>, ClassError> {
        let name = definition.name().clone();
        let mut entries = self.entries.write();

        let stored = match entries.get(&name) {
            Some(entry) => {
                // Pin the id so the merged copy keeps it.
                entry.definition.class_id();
                let mut merged = (*entry.definition).clone();
                merged.patch(&definition)?;
                tracing::debug!(class = %name, "merged class definition");
                Arc::new(merged)
            }
            None => {
                tracing::debug!(class = %name, "registered class");
                Arc::new(definition)
            }
        };

        entries.insert(name.clone(), Entry::new(Arc::clone(&stored)));
        invalidate(&mut entries, &name);
        Ok(stored)
    }

    /// Register a class, discarding any existing definition of that name.
    pub fn replace(&self, definition: ClassDefinition) -> Arc<ClassDefinition> {
        let name = definition.name().clone();
        let stored = Arc::new(definition);
        let mut entries = self.entries.write();
        if entries
            .insert(name.clone(), Entry::new(Arc::clone(&stored)))
            .is_some()
        {
            tracing::debug!(class = %name, "replaced class definition");
        }
        invalidate(&mut entries, &name);
        stored
    }

    pub fn get(&self, name: &Name) -> Option<Arc<ClassDefinition>> {
        self.entries
            .read()
            .get(name)
            .map(|e| Arc::clone(&e.definition))
    }

    pub fn contains(&self, name: &Name) -> bool {
        self.entries.read().contains_key(name)
    }

    pub fn names(&self) -> Vec<Name> {
        self.entries.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Find the definition carrying a given class id.
    pub fn find_by_class_id(&self, id: ObjectId) -> Option<Arc<ClassDefinition>> {
        self.entries
            .read()
            .values()
            .find(|e| e.definition.class_id() == id)
            .map(|e| Arc::clone(&e.definition))
    }

    /// Compose a class with its ancestors.
    ///
    /// Results are cached per class; resolving again without an
    /// intervening registration returns the same `Arc`. A parent that is
    /// not registered is skipped with a warning.
    pub fn resolve(&self, name: &Name) -> Result<Arc<ResolvedClass>, ClassError> {
        let mut visiting = Vec::new();
        self.resolve_inner(name, &mut visiting)
    }

    fn resolve_inner(
        &self,
        name: &Name,
        visiting: &mut Vec<Name>,
    ) -> Result<Arc<ResolvedClass>, ClassError> {
        if let Some(pos) = visiting.iter().position(|n| n == name) {
            let mut cycle = visiting[pos..].to_vec();
            cycle.push(name.clone());
            return Err(ClassError::InheritanceCycle(cycle));
        }

        let definition = {
            let entries = self.entries.read();
            let entry = entries
                .get(name)
                .ok_or_else(|| ClassError::ClassNotFound(name.clone()))?;
            if let Some(resolved) = &entry.resolved {
                return Ok(Arc::clone(resolved));
            }
            Arc::clone(&entry.definition)
        };

        visiting.push(name.clone());
        let resolved = match definition.parent() {
            Some(parent) if self.contains(parent) => {
                let parent = self.resolve_inner(parent, visiting)?;
                let mut lineage = Vec::with_capacity(parent.lineage.len() + 1);
                lineage.push(name.clone());
                lineage.extend(parent.lineage.iter().cloned());
                ResolvedClass {
                    name: name.clone(),
                    lineage,
                    members: Members::compose(definition.members(), &parent.members),
                    missing_parent: parent.missing_parent.clone(),
                }
            }
            Some(parent) => {
                tracing::warn!(
                    class = %name,
                    parent = %parent,
                    "parent class not found, composing without it"
                );
                ResolvedClass {
                    name: name.clone(),
                    lineage: vec![name.clone()],
                    members: definition.members().clone(),
                    missing_parent: Some(parent.clone()),
                }
            }
            None => ResolvedClass {
                name: name.clone(),
                lineage: vec![name.clone()],
                members: definition.members().clone(),
                missing_parent: None,
            },
        };
        visiting.pop();

        let resolved = Arc::new(resolved);
        let mut entries = self.entries.write();
        if let Some(entry) = entries.get_mut(name) {
            // Only cache against the definition we composed from.
            if Arc::ptr_eq(&entry.definition, &definition) {
                if let Some(existing) = &entry.resolved {
                    return Ok(Arc::clone(existing));
                }
                entry.resolved = Some(Arc::clone(&resolved));
            }
        }
        Ok(resolved)
    }

    /// Build an instance without running its constructor.
    ///
    /// `overrides` are composed over the resolved class as an anonymous
    /// child, so overriding operations can still reach the class version
    /// through [`Call::call_parent`](crate::Call::call_parent).
    pub fn prepare(&self, name: &Name, overrides: Option<Members>) -> Result<Instance, ClassError> {
        let resolved = self.resolve(name)?;
        let members = match overrides {
            Some(overrides) if !overrides.is_empty() => {
                Members::compose(&overrides, resolved.members())
            }
            _ => resolved.members().clone(),
        };
        Ok(Instance::new(
            resolved.name().clone(),
            resolved.lineage().to_vec(),
            members,
        ))
    }

    /// Build and construct an instance.
    pub fn instantiate(
        &self,
        name: &Name,
        overrides: Option<Members>,
    ) -> Result<Instance, ClassError> {
        let mut instance = self.prepare(name, overrides)?;
        instance.construct()?;
        Ok(instance)
    }
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn invalidate(entries: &mut BTreeMap<Name, Entry>, name: &Name) {
    for entry in entries.values_mut() {
        if entry.resolved.as_ref().is_some_and(|r| r.depends_on(name)) {
            entry.resolved = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name;
    use crate::value::Value;

    fn shapes() -> ClassRegistry {
        let registry = ClassRegistry::empty();
        registry
            .register(
                ClassDefinition::new(name!("App.Shape"))
                    .field("color", "red")
                    .operation("area", |_| Ok(Value::Float(0.0))),
            )
            .unwrap();
        registry
            .register(
                ClassDefinition::new(name!("App.Circle"))
                    .extends(name!("App.Shape"))
                    .field("radius", 1.0)
                    .operation("area", |call| {
                        let r = call.instance().get("radius").and_then(Value::as_f64).unwrap_or(0.0);
                        Ok(Value::Float(std::f64::consts::PI * r * r))
                    }),
            )
            .unwrap();
        registry
    }

    #[test]
    fn resolve_is_memoized() {
        let registry = shapes();
        let first = registry.resolve(&name!("App.Circle")).unwrap();
        let second = registry.resolve(&name!("App.Circle")).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.lineage(), &[name!("App.Circle"), name!("App.Shape")]);
        assert_eq!(first.operation_depth("area"), Some(2));
    }

    #[test]
    fn recomposition_does_not_double_wrap() {
        let registry = shapes();
        let before = registry.resolve(&name!("App.Circle")).unwrap();

        // Re-registering the parent drops the child's cached resolution.
        registry
            .register(ClassDefinition::new(name!("App.Shape")).field("sides", 0i64))
            .unwrap();
        let after = registry.resolve(&name!("App.Circle")).unwrap();

        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(after.operation_depth("area"), Some(2));
        assert_eq!(after.field("sides"), Some(&Value::Integer(0)));
    }

    #[test]
    fn unrelated_registration_keeps_cache() {
        let registry = shapes();
        let before = registry.resolve(&name!("App.Circle")).unwrap();
        registry
            .register(ClassDefinition::new(name!("App.Other")))
            .unwrap();
        let after = registry.resolve(&name!("App.Circle")).unwrap();
        assert!(Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn register_conflict_leaves_definition_untouched() {
        let registry = shapes();
        let err = registry
            .register(ClassDefinition::new(name!("App.Shape")).field("area", 3i64))
            .unwrap_err();
        assert!(matches!(err, ClassError::DuplicateDefinitionConflict { .. }));
        let def = registry.get(&name!("App.Shape")).unwrap();
        assert_eq!(def.members().get("area").unwrap().kind(), "operation");
    }

    #[test]
    fn replace_discards_existing_members() {
        let registry = shapes();
        registry.replace(ClassDefinition::new(name!("App.Shape")).field("sides", 4i64));
        let shape = registry.resolve(&name!("App.Shape")).unwrap();
        assert!(shape.operation("area").is_none());

        let circle = registry.resolve(&name!("App.Circle")).unwrap();
        assert_eq!(circle.operation_depth("area"), Some(1));
    }

    #[test]
    fn missing_parent_composes_child_alone() {
        let registry = ClassRegistry::empty();
        registry
            .register(
                ClassDefinition::new(name!("App.Orphan"))
                    .extends(name!("App.Missing"))
                    .field("x", 1i64),
            )
            .unwrap();

        let resolved = registry.resolve(&name!("App.Orphan")).unwrap();
        assert_eq!(resolved.lineage(), &[name!("App.Orphan")]);
        assert_eq!(resolved.missing_parent(), Some(&name!("App.Missing")));

        // Registering the parent later is picked up.
        registry
            .register(ClassDefinition::new(name!("App.Missing")).field("y", 2i64))
            .unwrap();
        let resolved = registry.resolve(&name!("App.Orphan")).unwrap();
        assert_eq!(resolved.field("y"), Some(&Value::Integer(2)));
        assert_eq!(resolved.missing_parent(), None);
    }

    #[test]
    fn missing_grandparent_invalidates_grandchild() {
        let registry = ClassRegistry::empty();
        registry
            .register(ClassDefinition::new(name!("B")).extends(name!("A")))
            .unwrap();
        registry
            .register(ClassDefinition::new(name!("C")).extends(name!("B")))
            .unwrap();
        assert_eq!(registry.resolve(&name!("C")).unwrap().lineage().len(), 2);

        registry.register(ClassDefinition::new(name!("A"))).unwrap();
        assert_eq!(registry.resolve(&name!("C")).unwrap().lineage().len(), 3);
    }

    #[test]
    fn cycle_is_reported() {
        let registry = ClassRegistry::empty();
        registry
            .register(ClassDefinition::new(name!("A")).extends(name!("B")))
            .unwrap();
        registry
            .register(ClassDefinition::new(name!("B")).extends(name!("A")))
            .unwrap();

        let err = registry.resolve(&name!("A")).unwrap_err();
        match err {
            ClassError::InheritanceCycle(names) => {
                assert_eq!(names, vec![name!("A"), name!("B"), name!("A")]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_class() {
        let registry = ClassRegistry::empty();
        assert!(matches!(
            registry.resolve(&name!("Nope")),
            Err(ClassError::ClassNotFound(_))
        ));
    }

    #[test]
    fn find_by_class_id() {
        let registry = shapes();
        let id = registry.get(&name!("App.Circle")).unwrap().class_id();
        let found = registry.find_by_class_id(id).unwrap();
        assert_eq!(found.name(), &name!("App.Circle"));
        assert!(registry.find_by_class_id(ObjectId::new()).is_none());
    }

    #[test]
    fn merge_keeps_class_id() {
        let registry = shapes();
        let before = registry.get(&name!("App.Shape")).unwrap();

        registry
            .register(ClassDefinition::new(name!("App.Shape")).field("border", 1i64))
            .unwrap();

        let id = before.class_id();
        let merged = registry.find_by_class_id(id).unwrap();
        assert!(merged.members().contains("border"));
        assert_eq!(registry.get(&name!("App.Shape")).unwrap().class_id(), id);
    }

    #[test]
    fn new_registry_holds_base() {
        let registry = ClassRegistry::new();
        assert!(registry.contains(&name!("hearth.class.Base")));
        assert_eq!(registry.len(), 1);
    }
}
