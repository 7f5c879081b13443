//! Process-unique identifiers.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

/// Opaque identifier for class definitions and instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(Uuid);

impl ObjectId {
    /// Create a new random ObjectId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an ObjectId from a UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Parse the `hb-<uuid>` display form back into an id.
    pub fn parse(s: &str) -> Option<Self> {
        let raw = s.strip_prefix("hb-")?;
        Uuid::parse_str(raw).ok().map(Self)
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hb-{}", self.0)
    }
}

static NEXT_SUBSCRIPTION: AtomicU64 = AtomicU64::new(0);

/// Stable identity of an event listener.
///
/// Assigned once, the first time a listener is subscribed, and used for
/// every later removal lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Allocate the next id from the process-wide counter.
    pub fn next() -> Self {
        Self(NEXT_SUBSCRIPTION.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_id_display() {
        let id = ObjectId::new();
        let s = id.to_string();
        assert!(s.starts_with("hb-"));
        assert_eq!(s.len(), 39); // prefix + UUID format
    }

    #[test]
    fn object_id_unique() {
        assert_ne!(ObjectId::default(), ObjectId::default());
    }

    #[test]
    fn object_id_parse_round_trip() {
        let id = ObjectId::new();
        assert_eq!(ObjectId::parse(&id.to_string()), Some(id));
        assert_eq!(ObjectId::parse("fb-nope"), None);
        assert_eq!(ObjectId::parse("hb-nope"), None);
    }

    #[test]
    fn subscription_ids_increase() {
        let a = SubscriptionId::next();
        let b = SubscriptionId::next();
        assert!(b > a);
        assert!(a.to_string().starts_with("sub-"));
    }
}
