//! Listeners and the per-dispatch event descriptor.

use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use crate::id::{ObjectId, SubscriptionId};
use crate::value::Value;

type Handler = dyn Fn(&Event<'_>, &[Value]) + Send + Sync;

/// A subscribable callback with a stable identity.
///
/// Cloning a `Listener` clones the handle, not the callback: every clone
/// shares the same subscription id. The id is assigned the first time the
/// listener is subscribed to any bus and never changes afterwards.
///
/// # Example
///
/// ```rust
/// use hearth_core::{EventBus, Listener};
///
/// let bus = EventBus::global();
/// let listener = Listener::new(|event, args| {
///     println!("{} fired with {} args", event.channel(), args.len());
/// });
/// let id = bus.subscribe("saved", &listener, None).unwrap();
/// assert_eq!(listener.id(), Some(id));
/// ```
#[derive(Clone)]
pub struct Listener {
    inner: Arc<ListenerInner>,
}

struct ListenerInner {
    id: OnceLock<SubscriptionId>,
    handler: Box<Handler>,
}

impl Listener {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&Event<'_>, &[Value]) + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(ListenerInner {
                id: OnceLock::new(),
                handler: Box::new(handler),
            }),
        }
    }

    /// The subscription id, once the listener has been subscribed.
    pub fn id(&self) -> Option<SubscriptionId> {
        self.inner.id.get().copied()
    }

    /// Whether both handles refer to the same callback.
    pub fn same(&self, other: &Listener) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn assign_id(&self) -> SubscriptionId {
        *self.inner.id.get_or_init(SubscriptionId::next)
    }

    pub(crate) fn call(&self, event: &Event<'_>, args: &[Value]) {
        (self.inner.handler)(event, args)
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener").field("id", &self.id()).finish()
    }
}

/// Removal requests collected while a dispatch pass runs.
#[derive(Default)]
pub(crate) struct DispatchPass {
    removals: Mutex<Vec<SubscriptionId>>,
}

impl DispatchPass {
    pub(crate) fn take_removals(&self) -> Vec<SubscriptionId> {
        std::mem::take(&mut *self.removals.lock())
    }
}

/// Descriptor handed to each listener as it is invoked.
///
/// Immutable. Removal requests made through it are queued and applied once
/// the current dispatch pass has invoked every listener in its snapshot.
pub struct Event<'a> {
    channel: &'a str,
    subscription: SubscriptionId,
    scope: Option<ObjectId>,
    source: Option<ObjectId>,
    pass: &'a DispatchPass,
}

impl<'a> Event<'a> {
    pub(crate) fn new(
        channel: &'a str,
        subscription: SubscriptionId,
        scope: Option<ObjectId>,
        source: Option<ObjectId>,
        pass: &'a DispatchPass,
    ) -> Self {
        Self {
            channel,
            subscription,
            scope,
            source,
            pass,
        }
    }

    /// Name of the channel being published.
    pub fn channel(&self) -> &str {
        self.channel
    }

    /// Id of the subscription being invoked.
    pub fn subscription(&self) -> SubscriptionId {
        self.subscription
    }

    /// Scope recorded when the listener was subscribed.
    pub fn scope(&self) -> Option<ObjectId> {
        self.scope
    }

    /// Owner of the bus (`None` on the global bus).
    pub fn source(&self) -> Option<ObjectId> {
        self.source
    }

    /// Unsubscribe the listener currently being invoked.
    pub fn remove_self(&self) {
        self.remove(self.subscription);
    }

    /// Unsubscribe another listener of this channel.
    pub fn remove(&self, id: SubscriptionId) {
        self.pass.removals.lock().push(id);
    }
}

impl fmt::Debug for Event<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("channel", &self.channel)
            .field("subscription", &self.subscription)
            .field("scope", &self.scope)
            .field("source", &self.source)
            .finish()
    }
}
