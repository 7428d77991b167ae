//! Node-sticky routing between front-end links and canonical envelopes.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use protocol_core::{
    Direction, Envelope, FrontEndId, NodeId, PacketRegistry, ReactionCollectorReactPacket,
    ReactionCollectorStopPacket,
};
use protocol_wire::{TranslatorRegistry, WireEncoding, WireError, WireMessage};

use super::outbound::{Egress, Outbound};
use crate::api::{Result, RuntimeError};

const TARGET: &str = "runtime::routing";

struct Link {
    encoding: WireEncoding,
    outbound: Arc<dyn Outbound>,
}

/// Translates between front-end links and canonical envelopes for one node.
///
/// Every outbound envelope is stamped with this node's id; collector-bound
/// packets (react, stop) that come back naming another node are refused.
pub struct NodeRouter {
    node: NodeId,
    packets: Arc<PacketRegistry>,
    translators: Arc<TranslatorRegistry>,
    links: HashMap<FrontEndId, Link>,
}

impl NodeRouter {
    pub fn new(node: NodeId, packets: Arc<PacketRegistry>, translators: Arc<TranslatorRegistry>) -> Self {
        Self {
            node,
            packets,
            translators,
            links: HashMap::new(),
        }
    }

    /// Attaches a front-end speaking `encoding`. Replaces an existing link.
    pub fn link(&mut self, front_end: FrontEndId, encoding: WireEncoding, outbound: Arc<dyn Outbound>) {
        debug!(target: TARGET, front_end = %front_end, encoding = %encoding, "front-end linked");
        self.links.insert(front_end, Link { encoding, outbound });
    }

    pub fn node(&self) -> &NodeId {
        &self.node
    }

    /// Encodings spoken by at least one linked front-end.
    pub fn encodings(&self) -> BTreeSet<WireEncoding> {
        self.links.values().map(|link| link.encoding).collect()
    }

    pub fn is_linked(&self, front_end: &FrontEndId) -> bool {
        self.links.contains_key(front_end)
    }

    fn link_for(&self, front_end: &FrontEndId) -> Result<&Link> {
        self.links
            .get(front_end)
            .ok_or_else(|| RuntimeError::UnknownFrontEnd(front_end.clone()))
    }

    /// Decodes a message received from `front_end`.
    ///
    /// # Errors
    ///
    /// - [`RuntimeError::UnknownFrontEnd`] if no link exists
    /// - [`RuntimeError::Wire`] for malformed frames or the wrong encoding
    /// - [`RuntimeError::Registry`] for unregistered packets
    /// - [`RuntimeError::WrongDirection`] for server-to-client packets
    /// - [`RuntimeError::Misrouted`] for a react or stop owned by another node
    pub fn accept(&self, front_end: &FrontEndId, message: &WireMessage) -> Result<Envelope> {
        let link = self.link_for(front_end)?;
        if message.encoding() != link.encoding {
            return Err(WireError::EncodingMismatch {
                expected: link.encoding,
                found: message.encoding(),
            }
            .into());
        }

        let mut envelope = self.translators.decode(message)?;
        self.packets.check(&envelope.packet)?;
        if envelope.packet.direction() != Direction::ClientToServer {
            return Err(RuntimeError::WrongDirection {
                packet: envelope.name().to_owned(),
                found: envelope.packet.direction(),
            });
        }

        let collector_bound = envelope.packet.is::<ReactionCollectorReactPacket>()
            || envelope.packet.is::<ReactionCollectorStopPacket>();
        if collector_bound && envelope.context.node != self.node {
            warn!(
                target: TARGET,
                packet = envelope.name(),
                owner = %envelope.context.node,
                node = %self.node,
                "collector packet routed to the wrong node, dropped"
            );
            return Err(RuntimeError::Misrouted {
                packet: envelope.name().to_owned(),
                expected: self.node.clone(),
                found: envelope.context.node,
            });
        }

        // The link, not the frame, is authoritative for the sender.
        envelope.context.front_end = front_end.clone();
        Ok(envelope)
    }
}

#[async_trait]
impl Egress for NodeRouter {
    async fn send(&self, mut envelope: Envelope) -> Result<()> {
        self.packets.check(&envelope.packet)?;
        if envelope.packet.direction() != Direction::ServerToClient {
            return Err(RuntimeError::WrongDirection {
                packet: envelope.name().to_owned(),
                found: envelope.packet.direction(),
            });
        }

        let link = self.link_for(&envelope.context.front_end)?;
        envelope.context.node = self.node.clone();
        let message = self.translators.encode(link.encoding, &envelope)?;
        debug!(
            target: TARGET,
            packet = envelope.name(),
            front_end = %envelope.context.front_end,
            subject = %envelope.context.subject,
            bytes = message.len(),
            "egress"
        );
        link.outbound.send(message).await
    }
}
