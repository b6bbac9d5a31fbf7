//! Observer List
//!
//! Ordered publish/subscribe list used by the registry to deliver change
//! notifications synchronously, in subscription order.

use std::fmt;

use super::events::NodeEvent;

/// Receiver of registry change notifications
///
/// Implemented for any `Fn(&NodeEvent) + Send + Sync` closure. Observers only
/// see the event; they re-query the registry once the mutating call returns.
pub trait NodeObserver: Send + Sync {
    fn on_node_event(&self, event: &NodeEvent);
}

impl<F> NodeObserver for F
where
    F: Fn(&NodeEvent) + Send + Sync,
{
    fn on_node_event(&self, event: &NodeEvent) {
        self(event)
    }
}

/// Handle returned by subscribe, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Subscribers in the order they were added
#[derive(Default)]
pub struct ObserverList {
    observers: Vec<(SubscriptionId, Box<dyn NodeObserver>)>,
    next_id: u64,
}

impl fmt::Debug for ObserverList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverList")
            .field("subscribers", &self.observers.len())
            .finish()
    }
}

impl ObserverList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an observer; it receives every event emitted from now on
    pub fn subscribe(&mut self, observer: impl NodeObserver + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Remove an observer, returning false if the handle was unknown
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sub, _)| *sub != id);
        self.observers.len() != before
    }

    /// Deliver an event to every observer in subscription order
    pub fn notify(&self, event: &NodeEvent) {
        for (_, observer) in &self.observers {
            observer.on_node_event(event);
        }
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}
