//! Extension points for game logic.
//!
//! Two kinds of code plug into the runtime:
//! - [`PacketHandler`] reacts to a client packet type routed by the dispatcher
//! - [`CollectorHandler`] is attached to one collector and sees its reactions
//!   and its end
//!
//! Both return `anyhow::Result`; failures are logged at the boundary and never
//! propagate to sibling handlers or block a collector from ending.
use std::sync::Arc;

use async_trait::async_trait;

use protocol_core::{Envelope, Packet, PacketError, PacketFactory};

use super::sink::ResponseSink;
use crate::blocking::BlockingCoordinator;
use crate::collectors::{CollectorRuntime, CollectorView, EndedCollector, ReceivedReaction};

/// How loudly a handler failure is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandlerCriticality {
    /// Logged at `error`.
    #[default]
    Important,
    /// Logged at `debug`.
    Optional,
}

impl HandlerCriticality {
    pub fn as_str(self) -> &'static str {
        match self {
            HandlerCriticality::Important => "important",
            HandlerCriticality::Optional => "optional",
        }
    }
}

/// Everything a packet handler may touch while handling one envelope.
#[derive(Clone)]
pub struct HandlerContext {
    pub envelope: Envelope,
    pub collectors: CollectorRuntime,
    pub blocking: Arc<BlockingCoordinator>,
    pub factory: PacketFactory,
}

impl HandlerContext {
    /// Decodes the inbound packet as `P`.
    pub fn packet<P: Packet>(&self) -> Result<P, PacketError> {
        self.envelope.packet.decode()
    }
}

/// Handler for one client packet type.
#[async_trait]
pub trait PacketHandler: Send + Sync {
    /// Name used in logs and dispatch events.
    fn name(&self) -> &'static str;

    fn criticality(&self) -> HandlerCriticality {
        HandlerCriticality::Important
    }

    async fn handle(&self, context: &HandlerContext, sink: &mut ResponseSink) -> anyhow::Result<()>;
}

/// Game-side callbacks bound to a single collector.
///
/// `on_end` runs exactly once per collector, after the termination claim and
/// outside any runtime lock, regardless of how the collector ended.
#[async_trait]
pub trait CollectorHandler: Send + Sync {
    /// Called for every accepted reaction, in order.
    async fn on_reaction(
        &self,
        _view: CollectorView,
        _reaction: ReceivedReaction,
        _sink: &mut ResponseSink,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    async fn on_end(&self, ended: EndedCollector, sink: &mut ResponseSink) -> anyhow::Result<()>;
}
