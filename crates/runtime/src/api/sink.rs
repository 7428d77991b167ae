//! Outbound buffer handed to handlers and collector hooks.

use protocol_core::{
    CanonicalPacket, CollectorId, Envelope, InteractionNoticePacket, Notice, Packet, PacketError,
    RoutingContext,
};

/// Collects the packets a handler wants to send.
///
/// Handlers never talk to links directly; the runtime drains the sink after
/// the handler returns and routes every envelope through egress. A handler
/// that fails has its sink discarded.
#[derive(Debug)]
pub struct ResponseSink {
    context: RoutingContext,
    envelopes: Vec<Envelope>,
}

impl ResponseSink {
    /// Sink replying to `context` by default.
    pub fn new(context: RoutingContext) -> Self {
        Self {
            context,
            envelopes: Vec::new(),
        }
    }

    /// Context replies are addressed to.
    pub fn context(&self) -> &RoutingContext {
        &self.context
    }

    /// Sends `packet` back to the originating subject.
    pub fn reply<P: Packet>(&mut self, packet: &P) -> Result<(), PacketError> {
        let envelope = Envelope::from_packet(self.context.clone(), packet)?;
        self.envelopes.push(envelope);
        Ok(())
    }

    /// Sends `packet` to an explicit destination.
    pub fn send_to<P: Packet>(&mut self, context: RoutingContext, packet: &P) -> Result<(), PacketError> {
        let envelope = Envelope::from_packet(context, packet)?;
        self.envelopes.push(envelope);
        Ok(())
    }

    /// Sends an already canonical packet (e.g. from the packet factory).
    pub fn send_canonical(&mut self, context: RoutingContext, packet: CanonicalPacket) {
        self.envelopes.push(Envelope::new(context, packet));
    }

    /// Soft notice to the originating subject.
    pub fn notice(&mut self, collector_id: Option<CollectorId>, notice: Notice) -> Result<(), PacketError> {
        self.reply(&InteractionNoticePacket {
            collector_id,
            notice,
        })
    }

    pub fn len(&self) -> usize {
        self.envelopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.envelopes.is_empty()
    }

    pub fn into_envelopes(self) -> Vec<Envelope> {
        self.envelopes
    }
}

#[cfg(test)]
mod tests {
    use protocol_core::{BlockReason, ReactionCollectorEndedPacket, SubjectId};

    use super::*;

    #[test]
    fn replies_and_explicit_sends_keep_order() {
        let ctx = RoutingContext::new("u-1", "bot", "node-a");
        let mut sink = ResponseSink::new(ctx.clone());

        sink.notice(
            None,
            Notice::Blocked {
                reasons: vec![BlockReason::Fight],
            },
        )
        .unwrap();
        sink.send_to(
            ctx.for_subject(SubjectId::from("u-2")),
            &ReactionCollectorEndedPacket {
                id: "c-1".into(),
                reason: protocol_core::EndReason::Stopped,
            },
        )
        .unwrap();

        let envelopes = sink.into_envelopes();
        assert_eq!(envelopes.len(), 2);
        assert_eq!(envelopes[0].name(), InteractionNoticePacket::NAME);
        assert_eq!(envelopes[0].context.subject, SubjectId::from("u-1"));
        assert_eq!(envelopes[1].context.subject, SubjectId::from("u-2"));
    }
}
