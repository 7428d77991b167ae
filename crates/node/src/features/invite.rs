//! Group invitations.
//!
//! `/invite <subject>` opens an accept/refuse prompt only the invitee may
//! answer (the inviter may still withdraw by refusing). Both subjects hold a
//! [`BlockReason::GroupInvite`] block until the prompt ends, and the inviter
//! learns the outcome through [`InviteResultPacket`].
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use protocol_core::{
    AcceptRefusePrompt, BlockReason, CollectorData, Direction, FieldSet, Lookup, Notice, Packet,
    PacketFactory, SubjectId, variants,
};
use runtime::{
    CollectorHandler, CollectorSettings, EndedCollector, HandlerContext, PacketHandler,
    ResponseSink, RuntimeError,
};

/// Shared data discriminant of invitation prompts.
pub const INVITE_DATA: &str = "group_invite";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteCommandPacket {
    pub invitee: SubjectId,
}

impl Packet for InviteCommandPacket {
    const NAME: &'static str = "InviteCommandPacket";
    const DIRECTION: Direction = Direction::ClientToServer;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteResultPacket {
    pub invitee: SubjectId,
    pub invitee_name: String,
    pub accepted: bool,
}

impl Packet for InviteResultPacket {
    const NAME: &'static str = "InviteResultPacket";
    const DIRECTION: Direction = Direction::ServerToClient;
}

/// Handles [`InviteCommandPacket`].
pub struct InviteHandler;

#[async_trait]
impl PacketHandler for InviteHandler {
    fn name(&self) -> &'static str {
        "invite"
    }

    async fn handle(&self, context: &HandlerContext, sink: &mut ResponseSink) -> anyhow::Result<()> {
        let command: InviteCommandPacket = context.packet()?;
        let origin = &context.envelope.context;
        let inviter = origin.subject.clone();

        let data = CollectorData::new(
            INVITE_DATA,
            json!({ "inviter": inviter, "invitee": command.invitee }),
        );
        let settings = CollectorSettings::new()
            .allow(command.invitee.clone())
            .block(inviter.clone(), BlockReason::GroupInvite)
            .block(command.invitee.clone(), BlockReason::GroupInvite)
            .exclusive();
        let outcome = Arc::new(InviteOutcome {
            factory: context.factory.clone(),
            invitee: command.invitee.clone(),
        });

        let opened = context
            .collectors
            .open(origin.clone(), &AcceptRefusePrompt::new(data), settings, outcome)
            .await;
        match opened {
            Ok(_) => Ok(()),
            Err(RuntimeError::Blocked { reasons }) => {
                debug!(
                    target: "node::invite",
                    inviter = %inviter,
                    invitee = %command.invitee,
                    reasons = ?reasons,
                    "invite refused, subject busy"
                );
                sink.notice(
                    None,
                    Notice::Blocked {
                        reasons: reasons.into_iter().collect(),
                    },
                )?;
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// End hook of one invitation: reports the answer to the inviter.
struct InviteOutcome {
    factory: PacketFactory,
    invitee: SubjectId,
}

#[async_trait]
impl CollectorHandler for InviteOutcome {
    async fn on_end(&self, ended: EndedCollector, sink: &mut ResponseSink) -> anyhow::Result<()> {
        let accepted = ended.first_is(variants::ACCEPT);
        debug!(
            target: "node::invite",
            collector = %ended.id(),
            invitee = %self.invitee,
            accepted,
            reason = ?ended.reason,
            "invite settled"
        );

        let fields = FieldSet::new()
            .with("invitee", self.invitee.as_str())
            .deferred("invitee_name", Lookup::display_name(self.invitee.as_str()))
            .with("accepted", accepted);
        let result = self
            .factory
            .create(InviteResultPacket::NAME, &ended.context, fields)
            .await?;
        sink.send_canonical(ended.context.clone(), result);
        Ok(())
    }
}
