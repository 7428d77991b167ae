//! Routing envelope carried alongside every packet.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::PacketError;
use crate::ids::{FrontEndId, NodeId, SubjectId};
use crate::packet::{CanonicalPacket, Packet};

/// Platform addressing handles (message, interaction, channel ids, ...).
///
/// Opaque to the relay: front-ends put whatever they need to find the
/// original message again and get it back untouched on every reply.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlatformHandles(BTreeMap<String, String>);

impl PlatformHandles {
    pub const MESSAGE: &'static str = "message";
    pub const INTERACTION: &'static str = "interaction";
    pub const CHANNEL: &'static str = "channel";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Addressing and identity metadata accompanying a packet.
///
/// `node` names the relay node that owns any collector referenced by the
/// packet. Front-ends must echo it back unchanged so reacts are routed to
/// the node holding the collector state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingContext {
    /// Subject that originated (or is addressed by) the packet.
    pub subject: SubjectId,
    /// Front-end process on the other end of the link.
    pub front_end: FrontEndId,
    /// Relay node owning the interaction.
    pub node: NodeId,
    /// Display language requested by the subject.
    pub language: String,
    pub handles: PlatformHandles,
}

impl RoutingContext {
    pub const DEFAULT_LANGUAGE: &'static str = "en";

    pub fn new(subject: impl Into<SubjectId>, front_end: impl Into<FrontEndId>, node: impl Into<NodeId>) -> Self {
        Self {
            subject: subject.into(),
            front_end: front_end.into(),
            node: node.into(),
            language: Self::DEFAULT_LANGUAGE.to_owned(),
            handles: PlatformHandles::new(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_handle(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.handles.insert(key, value);
        self
    }

    /// Same context, owned by `node`.
    pub fn on_node(mut self, node: NodeId) -> Self {
        self.node = node;
        self
    }

    /// Context addressing another subject through the same front-end and
    /// platform location.
    pub fn for_subject(&self, subject: SubjectId) -> Self {
        Self {
            subject,
            ..self.clone()
        }
    }
}

/// A canonical packet together with its routing context.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub context: RoutingContext,
    pub packet: CanonicalPacket,
}

impl Envelope {
    pub fn new(context: RoutingContext, packet: CanonicalPacket) -> Self {
        Self { context, packet }
    }

    /// Wraps a typed packet.
    pub fn from_packet<P: Packet>(context: RoutingContext, packet: &P) -> Result<Self, PacketError> {
        Ok(Self {
            context,
            packet: CanonicalPacket::from_packet(packet)?,
        })
    }

    pub fn name(&self) -> &str {
        self.packet.name()
    }
}
