//! Routes inbound envelopes to the collector runtime or to packet handlers.

use std::sync::Arc;

use tracing::{debug, error, warn};

use protocol_core::{
    Envelope, PacketFactory, ReactionCollectorReactPacket, ReactionCollectorStopPacket,
};

use super::registry::HandlerRegistry;
use crate::api::{HandlerContext, HandlerCriticality, PacketHandler, ResponseSink, Result};
use crate::blocking::BlockingCoordinator;
use crate::collectors::{CollectorRuntime, ReactOutcome};
use crate::events::{DispatchEvent, EventBus};
use crate::routing::Egress;

const TARGET: &str = "runtime::dispatch";

/// What happened to a dispatched envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A react went to its collector.
    Reaction(ReactOutcome),
    /// A stop request went to its collector; `true` if it ended it.
    Stop(bool),
    /// Generic handlers ran.
    Handled { succeeded: usize, failed: usize },
    /// No handler is registered for the packet.
    Unhandled,
}

pub struct Dispatcher {
    handlers: Arc<HandlerRegistry>,
    collectors: CollectorRuntime,
    blocking: Arc<BlockingCoordinator>,
    factory: PacketFactory,
    egress: Arc<dyn Egress>,
    events: EventBus,
}

impl Dispatcher {
    pub fn new(
        handlers: Arc<HandlerRegistry>,
        collectors: CollectorRuntime,
        blocking: Arc<BlockingCoordinator>,
        factory: PacketFactory,
        egress: Arc<dyn Egress>,
        events: EventBus,
    ) -> Self {
        Self {
            handlers,
            collectors,
            blocking,
            factory,
            egress,
            events,
        }
    }

    /// Dispatches one inbound envelope.
    ///
    /// React and stop packets take the fixed system route to the collector
    /// runtime. Everything else fans out to the registered handlers, each in
    /// its own task; a failing or panicking handler is logged and does not
    /// affect its siblings.
    ///
    /// # Errors
    ///
    /// Only if a react or stop body does not decode, which a validated
    /// translator never lets through.
    pub async fn dispatch(&self, envelope: Envelope) -> Result<DispatchOutcome> {
        if envelope.packet.is::<ReactionCollectorReactPacket>() {
            let react: ReactionCollectorReactPacket = envelope.packet.decode()?;
            let outcome = self.collectors.react(&envelope.context, react).await;
            return Ok(DispatchOutcome::Reaction(outcome));
        }
        if envelope.packet.is::<ReactionCollectorStopPacket>() {
            let stop: ReactionCollectorStopPacket = envelope.packet.decode()?;
            let stopped = self.collectors.stop_requested(&envelope.context, stop).await;
            return Ok(DispatchOutcome::Stop(stopped));
        }

        let handlers = self.handlers.handlers(envelope.name());
        if handlers.is_empty() {
            debug!(target: TARGET, packet = envelope.name(), "no handler registered");
            self.events.publish(DispatchEvent::Unhandled {
                packet: envelope.name().to_owned(),
            });
            return Ok(DispatchOutcome::Unhandled);
        }

        let packet = envelope.name().to_owned();
        let context = Arc::new(HandlerContext {
            envelope,
            collectors: self.collectors.clone(),
            blocking: Arc::clone(&self.blocking),
            factory: self.factory.clone(),
        });

        let tasks: Vec<_> = handlers
            .iter()
            .map(|handler| {
                let worker = Arc::clone(handler);
                let context = Arc::clone(&context);
                let task = tokio::spawn(async move {
                    let mut sink = ResponseSink::new(context.envelope.context.clone());
                    let result = worker.handle(&context, &mut sink).await;
                    (result, sink)
                });
                (Arc::clone(handler), task)
            })
            .collect();

        let (mut succeeded, mut failed) = (0, 0);
        for (handler, task) in tasks {
            match task.await {
                Ok((Ok(()), sink)) => {
                    succeeded += 1;
                    for envelope in sink.into_envelopes() {
                        self.send(envelope).await;
                    }
                }
                Ok((Err(err), _)) => {
                    failed += 1;
                    self.handler_failed(&packet, handler.as_ref(), format!("{err:#}"));
                }
                Err(err) => {
                    failed += 1;
                    self.handler_failed(&packet, handler.as_ref(), err.to_string());
                }
            }
        }

        Ok(DispatchOutcome::Handled { succeeded, failed })
    }

    fn handler_failed(&self, packet: &str, handler: &dyn PacketHandler, error: String) {
        match handler.criticality() {
            HandlerCriticality::Important => error!(
                target: TARGET,
                packet,
                handler = handler.name(),
                criticality = handler.criticality().as_str(),
                error = %error,
                "Handler failed, continuing"
            ),
            HandlerCriticality::Optional => debug!(
                target: TARGET,
                packet,
                handler = handler.name(),
                criticality = handler.criticality().as_str(),
                error = %error,
                "Optional handler failed"
            ),
        }
        self.events.publish(DispatchEvent::HandlerFailed {
            packet: packet.to_owned(),
            handler: handler.name().to_owned(),
            error,
        });
    }

    async fn send(&self, envelope: Envelope) {
        let packet = envelope.name().to_owned();
        if let Err(err) = self.egress.send(envelope).await {
            warn!(target: TARGET, packet = %packet, error = %err, "egress failed");
        }
    }
}
