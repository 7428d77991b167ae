//! Translator lookup by (packet name, encoding).

use std::collections::HashMap;
use std::sync::Arc;

use protocol_core::{
    Envelope, InteractionNoticePacket, Packet, PacketRegistry, ReactionCollectorCreationPacket,
    ReactionCollectorEndedPacket, ReactionCollectorReactPacket, ReactionCollectorStopPacket,
};

use crate::encoding::{WireEncoding, WireMessage};
use crate::error::{ConfigError, WireError};
use crate::frame::{self, Frame};
use crate::translator::{BinaryTranslator, JsonTranslator, Translator};

/// Every translator known to this process.
///
/// Filled at start-up next to the [`PacketRegistry`], then checked with
/// [`TranslatorRegistry::validate`] before any link is opened.
#[derive(Clone, Default)]
pub struct TranslatorRegistry {
    translators: HashMap<(String, WireEncoding), Arc<dyn Translator>>,
}

impl TranslatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with JSON and binary translators for the collector packets.
    pub fn with_core_packets() -> Self {
        let mut registry = Self::new();
        registry.register_packet::<ReactionCollectorCreationPacket>();
        registry.register_packet::<ReactionCollectorReactPacket>();
        registry.register_packet::<ReactionCollectorStopPacket>();
        registry.register_packet::<ReactionCollectorEndedPacket>();
        registry.register_packet::<InteractionNoticePacket>();
        registry
    }

    /// Adds a translator, replacing any previous one for the same pair.
    pub fn register(&mut self, translator: Arc<dyn Translator>) {
        let key = (translator.packet().to_owned(), translator.encoding());
        if self.translators.insert(key, translator).is_some() {
            tracing::debug!(target: "wire::translators", "replaced existing translator");
        }
    }

    /// Registers the default JSON and binary translators for `P`.
    pub fn register_packet<P: Packet>(&mut self) {
        self.register(Arc::new(JsonTranslator::<P>::new()));
        self.register(Arc::new(BinaryTranslator::<P>::new()));
    }

    pub fn get(&self, packet: &str, encoding: WireEncoding) -> Option<&Arc<dyn Translator>> {
        self.translators.get(&(packet.to_owned(), encoding))
    }

    pub fn contains(&self, packet: &str, encoding: WireEncoding) -> bool {
        self.get(packet, encoding).is_some()
    }

    pub fn len(&self) -> usize {
        self.translators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.translators.is_empty()
    }

    fn lookup(&self, packet: &str, encoding: WireEncoding) -> Result<&Arc<dyn Translator>, WireError> {
        self.get(packet, encoding)
            .ok_or_else(|| WireError::UnknownTranslator {
                packet: packet.to_owned(),
                encoding,
            })
    }

    /// Encodes an envelope for a front-end speaking `encoding`.
    pub fn encode(&self, encoding: WireEncoding, envelope: &Envelope) -> Result<WireMessage, WireError> {
        let translator = self.lookup(envelope.name(), encoding)?;
        let body = translator.egress(&envelope.context, &envelope.packet)?;
        frame::join(Frame {
            packet: envelope.name().to_owned(),
            context: envelope.context.clone(),
            body,
        })
    }

    /// Decodes a raw message into a canonical envelope.
    pub fn decode(&self, message: &WireMessage) -> Result<Envelope, WireError> {
        let frame = frame::split(message)?;
        let translator = self.lookup(&frame.packet, message.encoding())?;
        let packet = translator.ingress(&frame.context, frame.body)?;
        Ok(Envelope::new(frame.context, packet))
    }

    /// Checks that every registered packet has a translator for every
    /// encoding in use.
    ///
    /// # Errors
    ///
    /// [`ConfigError::MissingTranslators`] listing each missing pair, sorted.
    pub fn validate(&self, packets: &PacketRegistry, encodings: &[WireEncoding]) -> Result<(), ConfigError> {
        let mut missing: Vec<(String, WireEncoding)> = packets
            .names()
            .flat_map(|name| encodings.iter().map(move |encoding| (name, *encoding)))
            .filter(|(name, encoding)| !self.contains(name, *encoding))
            .map(|(name, encoding)| (name.to_owned(), encoding))
            .collect();

        if missing.is_empty() {
            tracing::debug!(
                target: "wire::translators",
                packets = packets.len(),
                translators = self.len(),
                "translator coverage complete"
            );
            return Ok(());
        }

        missing.sort();
        missing.dedup();
        Err(ConfigError::MissingTranslators(missing))
    }
}
