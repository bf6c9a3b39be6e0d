use crate::EdgeDescriptor;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Named channels carried by the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Channel {
    /// Toolbar asks the editor to create a node
    ActivateAddNode,
    /// Toolbar or gesture flow hands over a finished edge
    EdgeAddReady,
    /// Editor announces its node count
    NodesLength,
}

impl Channel {
    pub fn name(self) -> &'static str {
        match self {
            Channel::ActivateAddNode => "activate-add-node",
            Channel::EdgeAddReady => "edge-add-ready",
            Channel::NodesLength => "nodes-length",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Payload of `activate-add-node`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddNodeRequest {
    pub requested: bool,
}

/// Payload of `nodes-length`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodesLength {
    pub length: usize,
}

/// A message with its channel-specific payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "channel", content = "payload", rename_all = "kebab-case")]
pub enum Message {
    ActivateAddNode(AddNodeRequest),
    EdgeAddReady(EdgeDescriptor),
    NodesLength(NodesLength),
}

impl Message {
    pub fn channel(&self) -> Channel {
        match self {
            Message::ActivateAddNode(_) => Channel::ActivateAddNode,
            Message::EdgeAddReady(_) => Channel::EdgeAddReady,
            Message::NodesLength(_) => Channel::NodesLength,
        }
    }
}

type Handler = Rc<RefCell<dyn FnMut(&Message)>>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: Vec<Entry>,
}

struct Entry {
    id: u64,
    channel: Channel,
    handler: Handler,
}

/// In-process publish/subscribe channels scoped to one editor.
///
/// Cloning yields another handle onto the same subscriber set. Delivery is
/// synchronous: `publish` returns after every current subscriber of the
/// channel has run. Nothing is queued, so a message with no subscriber is
/// dropped.
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Rc<RefCell<Registry>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` on `channel`. The handler stays registered until
    /// the returned [`Subscription`] is dropped or unsubscribed.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, channel: Channel, handler: F) -> Subscription
    where
        F: FnMut(&Message) + 'static,
    {
        let mut registry = self.registry.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.entries.push(Entry {
            id,
            channel,
            handler: Rc::new(RefCell::new(handler)),
        });

        debug!("bus: subscription {} on {}", id, channel);

        Subscription {
            id,
            channel,
            registry: Rc::downgrade(&self.registry),
        }
    }

    /// Deliver `message` to every subscriber of its channel.
    ///
    /// Returns the number of handlers that ran. A handler still running
    /// further up the stack is skipped and not counted. Handlers may publish
    /// or unsubscribe; the subscriber list is fixed when delivery starts.
    pub fn publish(&self, message: Message) -> usize {
        let channel = message.channel();
        let handlers: Vec<Handler> = self
            .registry
            .borrow()
            .entries
            .iter()
            .filter(|entry| entry.channel == channel)
            .map(|entry| Rc::clone(&entry.handler))
            .collect();

        if handlers.is_empty() {
            warn!("bus: {} published with no subscriber, dropped", channel);
            return 0;
        }

        let mut delivered = 0;
        for handler in &handlers {
            match handler.try_borrow_mut() {
                Ok(mut handler) => {
                    (&mut *handler)(&message);
                    delivered += 1;
                }
                Err(_) => warn!("bus: skipped re-entrant delivery on {}", channel),
            }
        }

        debug!(
            "bus: {} delivered to {} of {} subscriber(s)",
            channel,
            delivered,
            handlers.len()
        );
        delivered
    }

    /// Number of live subscriptions on `channel`
    pub fn subscriber_count(&self, channel: Channel) -> usize {
        self.registry
            .borrow()
            .entries
            .iter()
            .filter(|entry| entry.channel == channel)
            .count()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.borrow();
        f.debug_struct("EventBus")
            .field("subscriptions", &registry.entries.len())
            .finish()
    }
}

/// Handle to a registered handler; unsubscribes on drop.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    channel: Channel,
    registry: Weak<RefCell<Registry>>,
}

impl Subscription {
    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Release the subscription now
    pub fn unsubscribe(self) {
        drop(self);
    }

    fn release(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        // Handlers are dropped after the registry borrow ends; a handler may own
        // subscriptions of its own.
        let removed: Vec<Entry> = {
            let mut registry = registry.borrow_mut();
            let (removed, kept): (Vec<Entry>, Vec<Entry>) = std::mem::take(&mut registry.entries)
                .into_iter()
                .partition(|entry| entry.id == self.id);
            registry.entries = kept;
            removed
        };
        if !removed.is_empty() {
            debug!("bus: released subscription {} on {}", self.id, self.channel);
        }
        self.registry = Weak::new();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NodeId;
    use std::cell::Cell;

    fn length(length: usize) -> Message {
        Message::NodesLength(NodesLength { length })
    }

    #[test]
    fn test_publish_reaches_all_subscribers() {
        let bus = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let a = {
            let seen = Rc::clone(&seen);
            bus.subscribe(Channel::NodesLength, move |msg| {
                seen.borrow_mut().push(("a", msg.clone()))
            })
        };
        let b = {
            let seen = Rc::clone(&seen);
            bus.subscribe(Channel::NodesLength, move |msg| {
                seen.borrow_mut().push(("b", msg.clone()))
            })
        };

        assert_eq!(bus.publish(length(3)), 2);
        assert_eq!(*seen.borrow(), vec![("a", length(3)), ("b", length(3))]);

        drop((a, b));
    }

    #[test]
    fn test_channels_are_isolated() {
        let bus = EventBus::new();
        let hits = Rc::new(Cell::new(0));

        let hits_in = Rc::clone(&hits);
        let _sub = bus.subscribe(Channel::EdgeAddReady, move |_| hits_in.set(hits_in.get() + 1));

        bus.publish(length(1));
        bus.publish(Message::ActivateAddNode(AddNodeRequest { requested: true }));
        assert_eq!(hits.get(), 0);

        bus.publish(Message::EdgeAddReady(EdgeDescriptor::new(NodeId(0), NodeId(1))));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_publish_without_subscriber_is_lost() {
        let bus = EventBus::new();
        assert_eq!(bus.publish(length(1)), 0);

        let hits = Rc::new(Cell::new(0));
        let hits_in = Rc::clone(&hits);
        let _sub = bus.subscribe(Channel::NodesLength, move |_| hits_in.set(hits_in.get() + 1));

        // Earlier message is not replayed
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_drop_releases_subscription() {
        let bus = EventBus::new();
        let sub = bus.subscribe(Channel::NodesLength, |_| {});
        assert_eq!(bus.subscriber_count(Channel::NodesLength), 1);

        drop(sub);
        assert_eq!(bus.subscriber_count(Channel::NodesLength), 0);

        let sub = bus.subscribe(Channel::NodesLength, |_| {});
        sub.unsubscribe();
        assert_eq!(bus.subscriber_count(Channel::NodesLength), 0);
    }

    #[test]
    fn test_subscription_outlives_bus() {
        let bus = EventBus::new();
        let sub = bus.subscribe(Channel::NodesLength, |_| {});
        drop(bus);
        drop(sub);
    }

    #[test]
    fn test_reentrant_publish() {
        let bus = EventBus::new();
        let lengths = Rc::new(RefCell::new(Vec::new()));

        let inner_bus = bus.clone();
        let _forward = bus.subscribe(Channel::ActivateAddNode, move |_| {
            inner_bus.publish(length(7));
        });
        let lengths_in = Rc::clone(&lengths);
        let _listen = bus.subscribe(Channel::NodesLength, move |msg| {
            if let Message::NodesLength(NodesLength { length }) = msg {
                lengths_in.borrow_mut().push(*length);
            }
        });

        bus.publish(Message::ActivateAddNode(AddNodeRequest { requested: true }));
        assert_eq!(*lengths.borrow(), vec![7]);
    }

    #[test]
    fn test_self_publish_not_counted() {
        let bus = EventBus::new();
        let inner_count = Rc::new(Cell::new(None));
        let calls = Rc::new(Cell::new(0));

        let inner_bus = bus.clone();
        let inner_count_in = Rc::clone(&inner_count);
        let calls_in = Rc::clone(&calls);
        let _echo = bus.subscribe(Channel::NodesLength, move |_| {
            calls_in.set(calls_in.get() + 1);
            if calls_in.get() == 1 {
                inner_count_in.set(Some(inner_bus.publish(length(2))));
            }
        });

        assert_eq!(bus.publish(length(1)), 1);
        // The only subscriber was busy, so the nested publish reached nobody
        assert_eq!(inner_count.get(), Some(0));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_message_wire_format() {
        let json = serde_json::to_string(&length(2)).unwrap();
        assert_eq!(json, r#"{"channel":"nodes-length","payload":{"length":2}}"#);

        let msg: Message =
            serde_json::from_str(r#"{"channel":"activate-add-node","payload":{"requested":true}}"#)
                .unwrap();
        assert_eq!(msg.channel(), Channel::ActivateAddNode);
        assert_eq!(msg.channel().name(), "activate-add-node");
    }
}
