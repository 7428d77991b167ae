//! Cloneable façade over a built runtime.
//!
//! [`RuntimeHandle`] is what front-end readers and game logic hold: it feeds
//! inbound wire messages through routing and dispatch, opens collectors, and
//! streams events from specific topics.
use std::sync::Arc;

use tokio::sync::broadcast;

use protocol_core::{Envelope, FrontEndId, NodeId, PacketFactory};
use protocol_wire::WireMessage;

use super::errors::Result;
use crate::blocking::BlockingCoordinator;
use crate::collectors::CollectorRuntime;
use crate::dispatch::{DispatchOutcome, Dispatcher};
use crate::events::{Event, EventBus, Topic};
use crate::routing::{Egress, NodeRouter};

/// Client-facing handle to interact with the runtime
#[derive(Clone)]
pub struct RuntimeHandle {
    router: Arc<NodeRouter>,
    dispatcher: Arc<Dispatcher>,
    collectors: CollectorRuntime,
    blocking: Arc<BlockingCoordinator>,
    factory: PacketFactory,
    event_bus: EventBus,
}

impl RuntimeHandle {
    pub(crate) fn new(
        router: Arc<NodeRouter>,
        dispatcher: Arc<Dispatcher>,
        collectors: CollectorRuntime,
        blocking: Arc<BlockingCoordinator>,
        factory: PacketFactory,
        event_bus: EventBus,
    ) -> Self {
        Self {
            router,
            dispatcher,
            collectors,
            blocking,
            factory,
            event_bus,
        }
    }

    /// Decodes, routes, and dispatches one message received from `front_end`.
    pub async fn receive(&self, front_end: &FrontEndId, message: &WireMessage) -> Result<DispatchOutcome> {
        let envelope = self.router.accept(front_end, message)?;
        self.dispatcher.dispatch(envelope).await
    }

    /// Sends a server packet outside of any handler.
    pub async fn send(&self, envelope: Envelope) -> Result<()> {
        self.router.send(envelope).await
    }

    pub fn node(&self) -> &NodeId {
        self.router.node()
    }

    pub fn collectors(&self) -> &CollectorRuntime {
        &self.collectors
    }

    pub fn blocking(&self) -> &Arc<BlockingCoordinator> {
        &self.blocking
    }

    pub fn factory(&self) -> &PacketFactory {
        &self.factory
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Collector` - collector opened / reacted / rejected / ended
    /// - `Topic::Dispatch` - handler failures and unhandled packets
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }
}
