//! Per-packet translators.

use std::marker::PhantomData;

use protocol_core::{CanonicalPacket, Packet, RoutingContext};

use crate::encoding::WireEncoding;
use crate::error::WireError;
use crate::frame::WireBody;

/// Converts one canonical packet type to and from one wire encoding.
///
/// `ingress(ctx, egress(ctx, p)) == p` must hold for every valid packet.
pub trait Translator: Send + Sync {
    /// Name of the canonical packet this translator handles.
    fn packet(&self) -> &'static str;

    fn encoding(&self) -> WireEncoding;

    /// Wire body → canonical packet.
    fn ingress(&self, context: &RoutingContext, body: WireBody) -> Result<CanonicalPacket, WireError>;

    /// Canonical packet → wire body.
    fn egress(&self, context: &RoutingContext, packet: &CanonicalPacket) -> Result<WireBody, WireError>;
}

fn mismatch(expected: WireEncoding, body: &WireBody) -> WireError {
    WireError::EncodingMismatch {
        expected,
        found: body.encoding(),
    }
}

/// JSON translator for packet type `P`.
///
/// The body is validated against `P` on the way in, so malformed input from
/// the chat bot is rejected at the link instead of deep in dispatch.
pub struct JsonTranslator<P>(PhantomData<fn() -> P>);

impl<P: Packet> JsonTranslator<P> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<P: Packet> Default for JsonTranslator<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Packet> Translator for JsonTranslator<P> {
    fn packet(&self) -> &'static str {
        P::NAME
    }

    fn encoding(&self) -> WireEncoding {
        WireEncoding::Json
    }

    fn ingress(&self, _context: &RoutingContext, body: WireBody) -> Result<CanonicalPacket, WireError> {
        let WireBody::Json(value) = body else {
            return Err(mismatch(WireEncoding::Json, &body));
        };
        let packet: P = serde_json::from_value(value)?;
        Ok(CanonicalPacket::from_packet(&packet)?)
    }

    fn egress(&self, _context: &RoutingContext, packet: &CanonicalPacket) -> Result<WireBody, WireError> {
        let packet: P = packet.decode()?;
        Ok(WireBody::Json(serde_json::to_value(&packet)?))
    }
}

/// bincode translator for packet type `P`.
pub struct BinaryTranslator<P>(PhantomData<fn() -> P>);

impl<P: Packet> BinaryTranslator<P> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<P: Packet> Default for BinaryTranslator<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Packet> Translator for BinaryTranslator<P> {
    fn packet(&self) -> &'static str {
        P::NAME
    }

    fn encoding(&self) -> WireEncoding {
        WireEncoding::Binary
    }

    fn ingress(&self, _context: &RoutingContext, body: WireBody) -> Result<CanonicalPacket, WireError> {
        let WireBody::Binary(bytes) = body else {
            return Err(mismatch(WireEncoding::Binary, &body));
        };
        let packet: P = bincode::deserialize(&bytes)?;
        Ok(CanonicalPacket::from_packet(&packet)?)
    }

    fn egress(&self, _context: &RoutingContext, packet: &CanonicalPacket) -> Result<WireBody, WireError> {
        let packet: P = packet.decode()?;
        Ok(WireBody::Binary(bincode::serialize(&packet)?))
    }
}

#[cfg(test)]
mod tests {
    use protocol_core::{ReactionCollectorReactPacket, ReactionCollectorStopPacket};

    use super::*;

    fn ctx() -> RoutingContext {
        RoutingContext::new("u-1", "bot", "node-a")
    }

    #[test]
    fn json_translator_rejects_binary_bodies() {
        let translator = JsonTranslator::<ReactionCollectorStopPacket>::new();
        let err = translator
            .ingress(&ctx(), WireBody::Binary(vec![0]))
            .unwrap_err();
        assert!(matches!(
            err,
            WireError::EncodingMismatch {
                expected: WireEncoding::Json,
                found: WireEncoding::Binary
            }
        ));
    }

    #[test]
    fn egress_refuses_a_different_packet_type() {
        let translator = BinaryTranslator::<ReactionCollectorReactPacket>::new();
        let stop = CanonicalPacket::from_packet(&ReactionCollectorStopPacket { id: "c".into() }).unwrap();
        assert!(matches!(
            translator.egress(&ctx(), &stop),
            Err(WireError::Packet(_))
        ));
    }
}
