//! Bound data: the live, shared representation of a store's payload.

use std::fmt;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard};

use hearth_core::Value;

/// A shared, in-place updatable data tree.
///
/// Binders hold clones of the handle and observe updates made through any
/// of them. Identity is the allocation, not the content: two handles are
/// the same binding only if they were cloned from one another.
#[derive(Clone, Default)]
pub struct BoundData {
    inner: Arc<RwLock<Value>>,
}

impl BoundData {
    pub fn new(value: Value) -> Self {
        Self {
            inner: Arc::new(RwLock::new(value)),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Value> {
        self.inner.read()
    }

    /// Clone of the current value.
    pub fn snapshot(&self) -> Value {
        self.inner.read().clone()
    }

    /// Merge `value` into the bound tree in place.
    pub fn merge(&self, value: Value) {
        self.inner.write().merge(value);
    }

    /// Replace a single top-level key.
    pub fn set(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.inner.write().insert(key, value)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Whether both handles share one binding.
    pub fn same_binding(&self, other: &BoundData) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for BoundData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BoundData").field(&*self.inner.read()).finish()
    }
}

/// Data handed to [`Store::set_data`](crate::Store::set_data).
#[derive(Debug, Clone)]
pub enum StoreData {
    /// Plain data, bound on first use and merged afterwards.
    Plain(Value),
    /// An existing binding, adopted as-is on first use.
    Bound(BoundData),
}

impl From<Value> for StoreData {
    fn from(value: Value) -> Self {
        StoreData::Plain(value)
    }
}

impl From<serde_json::Value> for StoreData {
    fn from(value: serde_json::Value) -> Self {
        StoreData::Plain(value.into())
    }
}

impl From<BoundData> for StoreData {
    fn from(data: BoundData) -> Self {
        StoreData::Bound(data)
    }
}
