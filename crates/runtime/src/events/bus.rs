//! Topic-based event bus implementation.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use super::types::{CollectorEvent, DispatchEvent};

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Collector lifecycle (opened, reacted, rejected, ended)
    Collector,
    /// Generic handler dispatch
    Dispatch,
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    Collector(CollectorEvent),
    Dispatch(DispatchEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Collector(_) => Topic::Collector,
            Event::Dispatch(_) => Topic::Dispatch,
        }
    }
}

impl From<CollectorEvent> for Event {
    fn from(event: CollectorEvent) -> Self {
        Event::Collector(event)
    }
}

impl From<DispatchEvent> for Event {
    fn from(event: DispatchEvent) -> Self {
        Event::Dispatch(event)
    }
}

struct Channels {
    collector: broadcast::Sender<Event>,
    dispatch: broadcast::Sender<Event>,
}

impl Channels {
    fn sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Collector => &self.collector,
            Topic::Dispatch => &self.dispatch,
        }
    }
}

/// Topic-based event bus
///
/// Observers subscribe to the topics they care about. Publishing is
/// best-effort: events sent while nobody listens are dropped, and slow
/// subscribers see `Lagged` instead of blocking publishers.
#[derive(Clone)]
pub struct EventBus {
    channels: Arc<Channels>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Arc::new(Channels {
                collector: broadcast::channel(capacity).0,
                dispatch: broadcast::channel(capacity).0,
            }),
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: impl Into<Event>) {
        let event = event.into();
        let topic = event.topic();

        if self.channels.sender(topic).send(event).is_err() {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    /// Subscribe to a specific topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.channels.sender(topic).subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
