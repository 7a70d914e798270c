//! Batched, typed message bus.
//!
//! Producers call [`MessageBus::send`] or [`MessageBus::send_to`] at any point
//! in a frame. Nothing is delivered until [`MessageBus::flush`], which the
//! engine runs once per frame after every system has updated. Handlers receive
//! mutable access to the component store, which is safe at that point because
//! no query is in flight.
//!
//! ## Routing
//!
//! A receiver registered with target `None` sees every message of its type.
//! A receiver registered with `Some(entity)` sees only messages sent to that
//! entity with [`send_to`](MessageBus::send_to).

use std::any::{Any, TypeId};
use std::collections::HashMap;

use neo_component::{ComponentStore, Entity};
use tracing::debug;

use crate::messages::Message;

type Handler = Box<dyn FnMut(&dyn Any, &mut ComponentStore)>;

/// Handle returned by [`MessageBus::add_receiver`].
///
/// The subscriber keeps it and hands it back to
/// [`MessageBus::remove_receiver`] when it goes away.
#[derive(Debug, PartialEq, Eq, Hash)]
#[must_use = "a receiver can only be removed through its subscription"]
pub struct Subscription {
    id: u64,
    message: TypeId,
}

impl Subscription {
    /// The bus-unique receiver id.
    pub fn id(&self) -> u64 {
        self.id
    }
}

struct Receiver {
    id: u64,
    target: Option<Entity>,
    handler: Handler,
}

struct Envelope {
    message: TypeId,
    name: &'static str,
    target: Option<Entity>,
    payload: Box<dyn Any>,
}

/// Routes typed messages from producers to registered receivers.
#[derive(Default)]
pub struct MessageBus {
    next_id: u64,
    receivers: HashMap<TypeId, Vec<Receiver>>,
    queue: Vec<Envelope>,
}

impl MessageBus {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for messages of type `M`.
    ///
    /// With `target: None` the handler receives every `M`; with
    /// `Some(entity)` only messages addressed to that entity.
    pub fn add_receiver<M, F>(&mut self, target: Option<Entity>, mut handler: F) -> Subscription
    where
        M: Message,
        F: FnMut(&M, &mut ComponentStore) + 'static,
    {
        self.next_id += 1;
        let id = self.next_id;
        let message = TypeId::of::<M>();

        let erased: Handler = Box::new(move |payload: &dyn Any, store: &mut ComponentStore| {
            if let Some(msg) = payload.downcast_ref::<M>() {
                handler(msg, store);
            }
        });

        self.receivers.entry(message).or_default().push(Receiver {
            id,
            target,
            handler: erased,
        });
        debug!(message = M::message_name(), id, ?target, "receiver added");

        Subscription { id, message }
    }

    /// Unregister a receiver. Returns `false` if it was already gone.
    pub fn remove_receiver(&mut self, subscription: Subscription) -> bool {
        let Some(list) = self.receivers.get_mut(&subscription.message) else {
            return false;
        };
        let before = list.len();
        list.retain(|r| r.id != subscription.id);
        before != list.len()
    }

    /// Drop every receiver targeted at `entity`. Returns how many were removed.
    ///
    /// Broadcast receivers are untouched.
    pub fn remove_receivers_for(&mut self, entity: Entity) -> usize {
        let mut removed = 0;
        for list in self.receivers.values_mut() {
            let before = list.len();
            list.retain(|r| r.target != Some(entity));
            removed += before - list.len();
        }
        if removed > 0 {
            debug!(%entity, removed, "targeted receivers removed");
        }
        removed
    }

    /// Queue a broadcast message for the next flush.
    pub fn send<M: Message>(&mut self, msg: M) {
        self.enqueue(None, msg);
    }

    /// Queue a message addressed to `entity` for the next flush.
    ///
    /// Broadcast receivers of `M` see it as well.
    pub fn send_to<M: Message>(&mut self, entity: Entity, msg: M) {
        self.enqueue(Some(entity), msg);
    }

    fn enqueue<M: Message>(&mut self, target: Option<Entity>, msg: M) {
        self.queue.push(Envelope {
            message: TypeId::of::<M>(),
            name: M::message_name(),
            target,
            payload: Box::new(msg),
        });
    }

    /// Deliver every queued message, in send order.
    ///
    /// For each message, matching receivers run in registration order.
    /// Receivers targeted at an entity that is no longer alive in `store` are
    /// skipped and then dropped. Returns the number of handler invocations.
    pub fn flush(&mut self, store: &mut ComponentStore) -> usize {
        if self.queue.is_empty() {
            return 0;
        }

        let queue = std::mem::take(&mut self.queue);
        let messages = queue.len();
        let mut delivered = 0;

        for envelope in queue {
            let before = delivered;
            if let Some(list) = self.receivers.get_mut(&envelope.message) {
                for receiver in list.iter_mut() {
                    let matches = match receiver.target {
                        None => true,
                        Some(target) => envelope.target == Some(target) && store.is_alive(target),
                    };
                    if matches {
                        (receiver.handler)(envelope.payload.as_ref(), store);
                        delivered += 1;
                    }
                }
            }
            if delivered == before {
                debug!(message = envelope.name, "message had no receivers");
            }
        }

        let pruned = self.prune_dead_targets(store);
        debug!(messages, delivered, pruned, "message bus flushed");
        delivered
    }

    /// Drop receivers whose target entity is not alive in `store`.
    fn prune_dead_targets(&mut self, store: &ComponentStore) -> usize {
        let mut pruned = 0;
        for list in self.receivers.values_mut() {
            let before = list.len();
            list.retain(|r| r.target.is_none_or(|t| store.is_alive(t)));
            pruned += before - list.len();
        }
        pruned
    }

    /// Number of messages waiting for the next flush.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Number of receivers registered for `M`.
    #[must_use]
    pub fn receiver_count<M: Message>(&self) -> usize {
        self.receivers.get(&TypeId::of::<M>()).map_or(0, Vec::len)
    }

    /// Drop every queued message without delivering it.
    pub fn clear_pending(&mut self) -> usize {
        let dropped = self.queue.len();
        self.queue.clear();
        dropped
    }
}

impl std::fmt::Debug for MessageBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageBus")
            .field("receivers", &self.receivers.values().map(Vec::len).sum::<usize>())
            .field("pending", &self.queue.len())
            .finish()
    }
}
