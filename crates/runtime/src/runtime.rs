//! High-level runtime orchestrator.
//!
//! The runtime owns the front-end reader tasks, wires registries, routing,
//! collectors, and dispatch together, and exposes a builder-based API for
//! the hosting process.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use protocol_core::{FieldResolver, FrontEndId, NodeId, Packet, PacketFactory, PacketRegistry, RegistryError};
use protocol_wire::{Translator, TranslatorRegistry, WireEncoding, WireMessage};

use crate::api::{PacketHandler, Result, RuntimeError, RuntimeHandle};
use crate::blocking::BlockingCoordinator;
use crate::collectors::CollectorRuntime;
use crate::dispatch::{Dispatcher, HandlerRegistry};
use crate::events::EventBus;
use crate::routing::{ChannelOutbound, Egress, NodeRouter, Outbound};

/// Runtime configuration shared across routing, collectors, and dispatch.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub node_id: NodeId,
    pub event_buffer_size: usize,
    /// Capacity of channel-backed front-end links.
    pub outbound_buffer_size: usize,
    /// Collector timeout when the opener does not choose one.
    pub default_timeout: Duration,
    /// Extra lifetime of collector-owned blocks past the collector timeout.
    pub block_grace: Duration,
    /// Encodings every registered packet must be translatable to, in
    /// addition to those of the linked front-ends.
    pub encodings: Vec<WireEncoding>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            node_id: NodeId::from("node-0"),
            event_buffer_size: 100,
            outbound_buffer_size: 64,
            default_timeout: Duration::from_secs(60),
            block_grace: Duration::from_secs(5),
            encodings: vec![WireEncoding::Json, WireEncoding::Binary],
        }
    }
}

/// Main runtime hosting one relay node
///
/// Design: Runtime owns the reader tasks; [`RuntimeHandle`] provides a
/// cloneable façade for game logic and front-end glue.
pub struct Runtime {
    handle: RuntimeHandle,
    config: RuntimeConfig,
    workers: Vec<JoinHandle<()>>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime
    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Reads messages from `front_end` until the channel closes.
    ///
    /// Each message is dispatched in its own task, so a slow handler never
    /// stalls the link; reacts for the same collector are still serialized
    /// by the collector runtime.
    pub fn serve(&mut self, front_end: FrontEndId, mut inbound: mpsc::Receiver<WireMessage>) {
        let handle = self.handle.clone();
        let worker = tokio::spawn(async move {
            debug!(target: "runtime::routing", front_end = %front_end, "reader started");
            while let Some(message) = inbound.recv().await {
                let handle = handle.clone();
                let front_end = front_end.clone();
                tokio::spawn(async move {
                    match handle.receive(&front_end, &message).await {
                        Ok(outcome) => {
                            debug!(target: "runtime::dispatch", front_end = %front_end, outcome = ?outcome, "dispatched");
                        }
                        Err(err @ RuntimeError::Misrouted { .. }) => {
                            debug!(target: "runtime::routing", front_end = %front_end, error = %err, "misrouted message dropped");
                        }
                        Err(err) => {
                            warn!(target: "runtime::routing", front_end = %front_end, error = %err, "inbound message dropped");
                        }
                    }
                });
            }
            debug!(target: "runtime::routing", front_end = %front_end, "reader stopped");
        });
        self.workers.push(worker);
    }

    /// Shutdown the runtime gracefully
    ///
    /// Stops every active collector (their end hooks run), stops the readers,
    /// and clears all blocks.
    pub async fn shutdown(self) -> Result<()> {
        self.handle.collectors().shutdown().await;

        for worker in self.workers {
            worker.abort();
            if let Err(err) = worker.await
                && !err.is_cancelled()
            {
                return Err(RuntimeError::TaskJoin(err));
            }
        }

        self.handle.blocking().clear();
        info!(target: "runtime", node = %self.config.node_id, "runtime stopped");
        Ok(())
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    packets: PacketRegistry,
    translators: TranslatorRegistry,
    handlers: HandlerRegistry,
    links: Vec<(FrontEndId, WireEncoding, Arc<dyn Outbound>)>,
    blocking: Option<Arc<BlockingCoordinator>>,
    resolver: Option<Arc<dyn FieldResolver>>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            packets: PacketRegistry::with_core_packets(),
            translators: TranslatorRegistry::with_core_packets(),
            handlers: HandlerRegistry::new(),
            links: Vec::new(),
            blocking: None,
            resolver: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers a feature packet with the default JSON and binary translators.
    pub fn packet<P: Packet>(mut self) -> Result<Self> {
        self.packets.register::<P>()?;
        self.translators.register_packet::<P>();
        Ok(self)
    }

    /// Registers a custom translator, replacing the default for its pair.
    pub fn translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translators.register(translator);
        self
    }

    /// Adds a handler for a registered client packet.
    pub fn handler<P: Packet>(mut self, handler: Arc<dyn PacketHandler>) -> Result<Self> {
        if !self.packets.contains(P::NAME) {
            return Err(RegistryError::UnknownPacket(P::NAME.to_owned()).into());
        }
        self.handlers.register::<P>(handler)?;
        Ok(self)
    }

    /// Links a front-end reachable through `outbound`.
    pub fn link(
        mut self,
        front_end: impl Into<FrontEndId>,
        encoding: WireEncoding,
        outbound: Arc<dyn Outbound>,
    ) -> Self {
        self.links.push((front_end.into(), encoding, outbound));
        self
    }

    /// Links a front-end through a bounded channel sized by
    /// `outbound_buffer_size`; call after [`config`](Self::config).
    pub fn channel_link(
        self,
        front_end: impl Into<FrontEndId>,
        encoding: WireEncoding,
    ) -> (Self, mpsc::Receiver<WireMessage>) {
        let (outbound, rx) = ChannelOutbound::channel(self.config.outbound_buffer_size);
        (self.link(front_end, encoding, Arc::new(outbound)), rx)
    }

    /// Injects a blocking coordinator shared with other services.
    pub fn blocking(mut self, blocking: Arc<BlockingCoordinator>) -> Self {
        self.blocking = Some(blocking);
        self
    }

    /// Resolver for deferred packet fields.
    pub fn resolver(mut self, resolver: Arc<dyn FieldResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Build the runtime
    ///
    /// # Errors
    ///
    /// [`RuntimeError::Config`] if a registered packet lacks a translator for
    /// a configured or linked encoding.
    pub fn build(self) -> Result<Runtime> {
        let encodings: Vec<WireEncoding> = self
            .config
            .encodings
            .iter()
            .copied()
            .chain(self.links.iter().map(|(_, encoding, _)| *encoding))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        self.translators.validate(&self.packets, &encodings)?;

        let node = self.config.node_id.clone();
        let packets = Arc::new(self.packets);
        let mut router = NodeRouter::new(node.clone(), Arc::clone(&packets), Arc::new(self.translators));
        let links = self.links.len();
        for (front_end, encoding, outbound) in self.links {
            router.link(front_end, encoding, outbound);
        }
        let router = Arc::new(router);
        let egress: Arc<dyn Egress> = router.clone();

        let events = EventBus::with_capacity(self.config.event_buffer_size);
        let blocking = self.blocking.unwrap_or_default();
        let collectors = CollectorRuntime::new(
            node.clone(),
            self.config.default_timeout,
            self.config.block_grace,
            Arc::clone(&blocking),
            Arc::clone(&egress),
            events.clone(),
        );

        let mut factory = PacketFactory::new(packets);
        if let Some(resolver) = self.resolver {
            factory = factory.with_resolver(resolver);
        }

        let handlers = self.handlers.len();
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::new(self.handlers),
            collectors.clone(),
            Arc::clone(&blocking),
            factory.clone(),
            egress,
            events.clone(),
        ));

        info!(target: "runtime", node = %node, links, handlers, "runtime built");

        Ok(Runtime {
            handle: RuntimeHandle::new(router, dispatcher, collectors, blocking, factory, events),
            config: self.config,
            workers: Vec::new(),
        })
    }
}
