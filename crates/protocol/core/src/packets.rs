//! Packets spoken by the collector protocol itself.
//!
//! Feature packets (commands, results) are defined by game code and
//! registered next to these at start-up.

use serde::{Deserialize, Serialize};

use crate::blocking::BlockReason;
use crate::collector::{CollectorData, ReactionOption};
use crate::ids::{CollectorId, EpochMillis, SubjectId};
use crate::packet::{Direction, Packet};
use crate::registry::PacketSpec;

fn default_reaction_limit() -> u32 {
    1
}

/// Asks a front-end to render a prompt.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReactionCollectorCreationPacket {
    pub id: CollectorId,
    /// Absolute deadline in epoch milliseconds.
    pub end_time: EpochMillis,
    /// Order is significant: react packets refer to options by index.
    pub options: Vec<ReactionOption>,
    pub shared_data: CollectorData,
    pub main_replacement: bool,
    #[serde(default = "default_reaction_limit")]
    pub reaction_limit: u32,
    #[serde(default)]
    pub allowed_reactor_ids: Vec<SubjectId>,
}

impl Packet for ReactionCollectorCreationPacket {
    const NAME: &'static str = "ReactionCollectorCreationPacket";
    const DIRECTION: Direction = Direction::ServerToClient;
}

/// A subject selected an option.
///
/// `reaction_index` is the position in the options array exactly as it was
/// sent in the creation packet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionCollectorReactPacket {
    pub id: CollectorId,
    pub reactor_id: SubjectId,
    pub reaction_index: u32,
}

impl Packet for ReactionCollectorReactPacket {
    const NAME: &'static str = "ReactionCollectorReactPacket";
    const DIRECTION: Direction = Direction::ClientToServer;
}

/// A front-end abandons a pending collector (e.g. the session closed).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionCollectorStopPacket {
    pub id: CollectorId,
}

impl Packet for ReactionCollectorStopPacket {
    const NAME: &'static str = "ReactionCollectorStopPacket";
    const DIRECTION: Direction = Direction::ClientToServer;
}

/// Why a collector reached its terminal state.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EndReason {
    /// The deadline passed.
    Timeout,
    /// The reaction limit was reached.
    LimitReached,
    /// Explicitly stopped by game logic or by the front-end.
    Stopped,
}

/// Tells the front-end that a prompt is closed and must stop accepting input.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionCollectorEndedPacket {
    pub id: CollectorId,
    pub reason: EndReason,
}

impl Packet for ReactionCollectorEndedPacket {
    const NAME: &'static str = "ReactionCollectorEndedPacket";
    const DIRECTION: Direction = Direction::ServerToClient;
}

/// Soft notice shown to a subject whose input was not taken into account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Notice {
    /// The prompt no longer exists (ended, or never owned by this node).
    StaleInteraction,
    /// The prompt is reserved for someone else.
    NotForYou,
    /// The selected option does not exist.
    InvalidReaction,
    /// The subject is busy with another interaction.
    Blocked { reasons: Vec<BlockReason> },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionNoticePacket {
    pub collector_id: Option<CollectorId>,
    pub notice: Notice,
}

impl Packet for InteractionNoticePacket {
    const NAME: &'static str = "InteractionNoticePacket";
    const DIRECTION: Direction = Direction::ServerToClient;
}

/// Registration records of every packet defined in this module.
pub(crate) fn core_specs() -> [PacketSpec; 5] {
    [
        PacketSpec::of::<ReactionCollectorCreationPacket>(),
        PacketSpec::of::<ReactionCollectorReactPacket>(),
        PacketSpec::of::<ReactionCollectorStopPacket>(),
        PacketSpec::of::<ReactionCollectorEndedPacket>(),
        PacketSpec::of::<InteractionNoticePacket>(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creation_packet_defaults_optional_fields() {
        let packet: ReactionCollectorCreationPacket = serde_json::from_value(serde_json::json!({
            "id": "c-1",
            "end_time": 10,
            "options": [{ "type": "accept", "payload": null }],
            "shared_data": { "type": "none", "payload": null },
            "main_replacement": false
        }))
        .unwrap();

        assert_eq!(packet.reaction_limit, 1);
        assert!(packet.allowed_reactor_ids.is_empty());
    }

    #[test]
    fn notices_use_snake_case_tags() {
        let notice = serde_json::to_value(Notice::NotForYou).unwrap();
        assert_eq!(notice, serde_json::json!("not_for_you"));

        let blocked = serde_json::to_value(Notice::Blocked {
            reasons: vec![BlockReason::Fight],
        })
        .unwrap();
        assert_eq!(
            blocked,
            serde_json::json!({ "blocked": { "reasons": ["fight"] } })
        );
    }
}
