//! Named-channel publish/subscribe.
//!
//! One type serves both tiers: the process-wide bus created by the runtime
//! and the per-instance bus each object owns. They differ only in the owner
//! id reported to listeners as the event source.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{BatchSubscribeError, EventError};
use crate::event::listener::{DispatchPass, Event, Listener};
use crate::id::{ObjectId, SubscriptionId};
use crate::value::Value;

#[derive(Clone)]
struct Subscription {
    id: SubscriptionId,
    listener: Listener,
    scope: Option<ObjectId>,
}

struct BusInner {
    owner: Option<ObjectId>,
    channels: Mutex<BTreeMap<String, Vec<Subscription>>>,
}

/// A publish/subscribe registry keyed by channel name.
///
/// Cloning an `EventBus` yields another handle to the same registry.
///
/// # Dispatch guarantees
///
/// - Listeners of a channel run in subscription order, synchronously.
/// - `publish` iterates a snapshot taken when it starts: listeners
///   subscribed during the pass are not invoked by it, and listeners removed
///   during the pass do not disturb it.
/// - The registry lock is never held while a listener runs, so listeners
///   may publish, subscribe and unsubscribe freely.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    /// A bus with no owner, used as the process-wide bus.
    pub fn global() -> Self {
        Self::with_owner(None)
    }

    /// A bus private to one object.
    pub fn scoped(owner: ObjectId) -> Self {
        Self::with_owner(Some(owner))
    }

    fn with_owner(owner: Option<ObjectId>) -> Self {
        Self {
            inner: Arc::new(BusInner {
                owner,
                channels: Mutex::new(BTreeMap::new()),
            }),
        }
    }

    /// The object this bus belongs to, if any.
    pub fn owner(&self) -> Option<ObjectId> {
        self.inner.owner
    }

    /// Subscribe a listener to a channel.
    ///
    /// The listener's id is assigned on its first subscription and reused
    /// afterwards. Subscribing the same listener to the same channel again
    /// is a no-op that returns the existing id; the recorded scope is left
    /// unchanged.
    pub fn subscribe(
        &self,
        channel: &str,
        listener: &Listener,
        scope: Option<ObjectId>,
    ) -> Result<SubscriptionId, EventError> {
        if channel.is_empty() {
            return Err(EventError::EmptyChannel);
        }

        let id = listener.assign_id();
        let mut channels = self.inner.channels.lock();
        let subscriptions = channels.entry(channel.to_string()).or_default();

        if subscriptions.iter().any(|s| s.id == id) {
            tracing::debug!(channel, %id, "listener already subscribed");
            return Ok(id);
        }

        subscriptions.push(Subscription {
            id,
            listener: listener.clone(),
            scope,
        });
        tracing::debug!(channel, %id, "listener subscribed");
        Ok(id)
    }

    /// Subscribe a closure, wrapping it in a fresh `Listener`.
    pub fn on<F>(&self, channel: &str, handler: F) -> Result<SubscriptionId, EventError>
    where
        F: Fn(&Event<'_>, &[Value]) + Send + Sync + 'static,
    {
        self.subscribe(channel, &Listener::new(handler), None)
    }

    /// Subscribe several listeners sharing one scope.
    ///
    /// Registration is sequential. On failure the listeners registered so
    /// far stay subscribed and are reported in the error.
    pub fn subscribe_all<I, S>(
        &self,
        listeners: I,
        scope: Option<ObjectId>,
    ) -> Result<Vec<(String, SubscriptionId)>, BatchSubscribeError>
    where
        I: IntoIterator<Item = (S, Listener)>,
        S: Into<String>,
    {
        let mut registered = Vec::new();
        for (channel, listener) in listeners {
            let channel = channel.into();
            match self.subscribe(&channel, &listener, scope) {
                Ok(id) => registered.push((channel, id)),
                Err(error) => {
                    tracing::warn!(
                        %error,
                        registered = registered.len(),
                        "batch subscription stopped part way"
                    );
                    return Err(BatchSubscribeError { registered, error });
                }
            }
        }
        Ok(registered)
    }

    /// Remove a subscription by id.
    ///
    /// Unknown channels and ids are logged and otherwise ignored. Removing
    /// the last subscription of a channel prunes the channel.
    ///
    /// Returns whether a subscription was removed.
    pub fn unsubscribe(&self, channel: &str, id: SubscriptionId) -> bool {
        let mut channels = self.inner.channels.lock();
        let Some(subscriptions) = channels.get_mut(channel) else {
            tracing::warn!(channel, %id, "unable to remove listener: no listeners on channel");
            return false;
        };

        let Some(position) = subscriptions.iter().position(|s| s.id == id) else {
            tracing::warn!(channel, %id, "unable to remove listener: unknown subscription");
            return false;
        };

        subscriptions.remove(position);
        if subscriptions.is_empty() {
            channels.remove(channel);
        }
        tracing::debug!(channel, %id, "listener removed");
        true
    }

    /// Remove a listener using the id it was given on subscription.
    pub fn unsubscribe_listener(&self, channel: &str, listener: &Listener) -> bool {
        match listener.id() {
            Some(id) => self.unsubscribe(channel, id),
            None => {
                tracing::warn!(channel, "unable to remove listener: it was never subscribed");
                false
            }
        }
    }

    /// Publish to a channel.
    ///
    /// Each listener receives its own `Event` descriptor and the same
    /// arguments. Publishing to a channel nobody listens on is a no-op.
    ///
    /// Returns the number of listeners invoked.
    pub fn publish(&self, channel: &str, args: &[Value]) -> usize {
        let snapshot = match self.inner.channels.lock().get(channel) {
            Some(subscriptions) => subscriptions.clone(),
            None => return 0,
        };

        let pass = DispatchPass::default();
        for subscription in &snapshot {
            let event = Event::new(
                channel,
                subscription.id,
                subscription.scope,
                self.inner.owner,
                &pass,
            );
            subscription.listener.call(&event, args);
        }

        for id in pass.take_removals() {
            self.unsubscribe(channel, id);
        }

        snapshot.len()
    }

    /// Number of listeners on a channel.
    pub fn listener_count(&self, channel: &str) -> usize {
        self.inner
            .channels
            .lock()
            .get(channel)
            .map_or(0, Vec::len)
    }

    /// Whether any listener is subscribed to the channel.
    pub fn has_listeners(&self, channel: &str) -> bool {
        self.listener_count(channel) > 0
    }

    /// Channels with at least one listener, in name order.
    pub fn channels(&self) -> Vec<String> {
        self.inner.channels.lock().keys().cloned().collect()
    }

    /// Drop every subscription.
    pub fn clear(&self) {
        self.inner.channels.lock().clear();
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("owner", &self.inner.owner)
            .field("channels", &self.channels())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn recorder(log: &Arc<Mutex<Vec<String>>>, tag: &str) -> Listener {
        let log = Arc::clone(log);
        let tag = tag.to_string();
        Listener::new(move |_, _| log.lock().push(tag.clone()))
    }

    #[test]
    fn publish_without_listeners_is_noop() {
        let bus = EventBus::global();
        assert_eq!(bus.publish("nothing", &[Value::from(1i64)]), 0);
        assert!(bus.channels().is_empty());
    }

    #[test]
    fn dispatch_follows_subscription_order() {
        let bus = EventBus::global();
        let log = Arc::new(Mutex::new(Vec::new()));
        for tag in ["s1", "s2", "s3"] {
            bus.subscribe("ch", &recorder(&log, tag), None).unwrap();
        }

        assert_eq!(bus.publish("ch", &[]), 3);
        assert_eq!(*log.lock(), vec!["s1", "s2", "s3"]);
    }

    #[test]
    fn every_listener_gets_same_args_and_own_descriptor() {
        let bus = EventBus::global();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let mut ids = Vec::new();
        for _ in 0..2 {
            let seen = Arc::clone(&seen);
            let id = bus
                .on("ch", move |event, args| {
                    seen.lock()
                        .push((event.subscription(), event.channel().to_string(), args.to_vec()));
                })
                .unwrap();
            ids.push(id);
        }

        bus.publish("ch", &[Value::from("a"), Value::from(2i64)]);

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        for (i, (sub, channel, args)) in seen.iter().enumerate() {
            assert_eq!(*sub, ids[i]);
            assert_eq!(channel, "ch");
            assert_eq!(args, &vec![Value::from("a"), Value::from(2i64)]);
        }
    }

    #[test]
    fn duplicate_subscription_reuses_id() {
        let bus = EventBus::global();
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let listener = Listener::new(move |_, _| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        let first = bus.subscribe("ch", &listener, None).unwrap();
        let second = bus.subscribe("ch", &listener, None).unwrap();
        assert_eq!(first, second);
        assert_eq!(bus.listener_count("ch"), 1);

        bus.publish("ch", &[]);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn same_listener_keeps_id_across_channels() {
        let bus = EventBus::global();
        let listener = Listener::new(|_, _| {});
        let a = bus.subscribe("a", &listener, None).unwrap();
        let b = bus.subscribe("b", &listener, None).unwrap();
        assert_eq!(a, b);
        assert!(bus.unsubscribe("a", a));
        assert_eq!(bus.listener_count("b"), 1);
    }

    #[test]
    fn unsubscribe_prunes_empty_channels() {
        let bus = EventBus::global();
        let id = bus.on("ch", |_, _| {}).unwrap();
        assert_eq!(bus.channels(), vec!["ch".to_string()]);
        assert!(bus.unsubscribe("ch", id));
        assert!(bus.channels().is_empty());
    }

    #[test]
    fn unsubscribe_unknown_is_soft() {
        let bus = EventBus::global();
        assert!(!bus.unsubscribe("missing", SubscriptionId::next()));
        bus.on("ch", |_, _| {}).unwrap();
        assert!(!bus.unsubscribe("ch", SubscriptionId::next()));
        assert_eq!(bus.listener_count("ch"), 1);
    }

    #[test]
    fn never_subscribed_listener_cannot_be_removed() {
        let bus = EventBus::global();
        assert!(!bus.unsubscribe_listener("ch", &Listener::new(|_, _| {})));
    }

    #[test]
    fn remove_self_mid_dispatch_keeps_pass_intact() {
        let bus = EventBus::global();
        let log = Arc::new(Mutex::new(Vec::new()));

        bus.subscribe("ch", &recorder(&log, "s1"), None).unwrap();
        let l = Arc::clone(&log);
        bus.on("ch", move |event, _| {
            l.lock().push("once".to_string());
            event.remove_self();
        })
        .unwrap();
        bus.subscribe("ch", &recorder(&log, "s3"), None).unwrap();

        bus.publish("ch", &[]);
        assert_eq!(*log.lock(), vec!["s1", "once", "s3"]);
        assert_eq!(bus.listener_count("ch"), 2);

        bus.publish("ch", &[]);
        assert_eq!(*log.lock(), vec!["s1", "once", "s3", "s1", "s3"]);
    }

    #[test]
    fn removing_a_later_listener_does_not_skip_it_this_pass() {
        let bus = EventBus::global();
        let log = Arc::new(Mutex::new(Vec::new()));
        let victim = recorder(&log, "victim");

        let victim_id = {
            // subscribe the remover first so it runs before the victim
            let l = Arc::clone(&log);
            let victim_handle = victim.clone();
            bus.on("ch", move |event, _| {
                l.lock().push("remover".to_string());
                if let Some(id) = victim_handle.id() {
                    event.remove(id);
                }
            })
            .unwrap();
            bus.subscribe("ch", &victim, None).unwrap()
        };

        bus.publish("ch", &[]);
        assert_eq!(*log.lock(), vec!["remover", "victim"]);
        assert!(!bus.unsubscribe("ch", victim_id));

        bus.publish("ch", &[]);
        assert_eq!(*log.lock(), vec!["remover", "victim", "remover"]);
    }

    #[test]
    fn direct_unsubscribe_during_dispatch_is_safe() {
        let bus = EventBus::global();
        let log = Arc::new(Mutex::new(Vec::new()));
        let second = recorder(&log, "second");

        let handle = bus.clone();
        let second_handle = second.clone();
        let l = Arc::clone(&log);
        bus.on("ch", move |_, _| {
            l.lock().push("first".to_string());
            handle.unsubscribe_listener("ch", &second_handle);
        })
        .unwrap();
        bus.subscribe("ch", &second, None).unwrap();

        bus.publish("ch", &[]);
        assert_eq!(*log.lock(), vec!["first", "second"]);
        assert_eq!(bus.listener_count("ch"), 1);
    }

    #[test]
    fn listener_added_during_dispatch_waits_for_next_pass() {
        let bus = EventBus::global();
        let count = Arc::new(AtomicUsize::new(0));

        let handle = bus.clone();
        let c = Arc::clone(&count);
        bus.on("ch", move |event, _| {
            let c = Arc::clone(&c);
            handle
                .on("ch", move |_, _| {
                    c.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
            event.remove_self();
        })
        .unwrap();

        assert_eq!(bus.publish("ch", &[]), 1);
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(bus.publish("ch", &[]), 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn nested_publish_from_listener() {
        let bus = EventBus::global();
        let log = Arc::new(Mutex::new(Vec::new()));
        bus.subscribe("inner", &recorder(&log, "inner"), None).unwrap();

        let handle = bus.clone();
        let l = Arc::clone(&log);
        bus.on("outer", move |_, _| {
            l.lock().push("outer".to_string());
            handle.publish("inner", &[]);
        })
        .unwrap();

        bus.publish("outer", &[]);
        assert_eq!(*log.lock(), vec!["outer", "inner"]);
    }

    #[test]
    fn scope_and_source_reach_the_descriptor() {
        let owner = ObjectId::new();
        let scope = ObjectId::new();
        let bus = EventBus::scoped(owner);
        let seen = Arc::new(Mutex::new(None));

        let s = Arc::clone(&seen);
        let listener = Listener::new(move |event, _| {
            *s.lock() = Some((event.scope(), event.source()));
        });
        bus.subscribe("ch", &listener, Some(scope)).unwrap();
        bus.publish("ch", &[]);

        assert_eq!(*seen.lock(), Some((Some(scope), Some(owner))));
    }

    #[test]
    fn empty_channel_rejected() {
        let bus = EventBus::global();
        assert_eq!(bus.on("", |_, _| {}), Err(EventError::EmptyChannel));
    }

    #[test]
    fn batch_subscription_reports_partial_registration() {
        let bus = EventBus::global();
        let scope = ObjectId::new();

        let ok = bus
            .subscribe_all(
                vec![
                    ("a", Listener::new(|_, _| {})),
                    ("b", Listener::new(|_, _| {})),
                ],
                Some(scope),
            )
            .unwrap();
        assert_eq!(ok.len(), 2);
        assert_eq!(bus.channels(), vec!["a".to_string(), "b".to_string()]);

        let err = bus
            .subscribe_all(
                vec![
                    ("c", Listener::new(|_, _| {})),
                    ("", Listener::new(|_, _| {})),
                    ("d", Listener::new(|_, _| {})),
                ],
                None,
            )
            .unwrap_err();
        assert_eq!(err.registered.len(), 1);
        assert_eq!(err.registered[0].0, "c");
        assert!(bus.has_listeners("c"));
        assert!(!bus.has_listeners("d"));
    }

    #[test]
    fn clones_share_registry() {
        let bus = EventBus::global();
        let other = bus.clone();
        bus.on("ch", |_, _| {}).unwrap();
        assert_eq!(other.listener_count("ch"), 1);
        other.clear();
        assert_eq!(bus.listener_count("ch"), 0);
    }
}
