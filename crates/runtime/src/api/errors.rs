//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from packet construction, translation, routing, and
//! start-up configuration so callers can bubble them up with consistent
//! context. Rejected reacts are not errors; see
//! [`ReactOutcome`](crate::collectors::ReactOutcome).
use std::collections::BTreeSet;

use thiserror::Error;

use protocol_core::{
    BlockReason, DescriptorError, Direction, FrontEndId, NodeId, PacketError, RegistryError,
};
use protocol_wire::{ConfigError, WireError};

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Packet(#[from] PacketError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error("invalid start-up configuration")]
    Config(#[from] ConfigError),

    #[error("invalid collector descriptor")]
    Descriptor(#[from] DescriptorError),

    #[error("subjects are busy: {reasons:?}")]
    Blocked { reasons: BTreeSet<BlockReason> },

    #[error("no link to front-end `{0}`")]
    UnknownFrontEnd(FrontEndId),

    #[error("packet `{packet}` addressed to node `{found}`, this is `{expected}`")]
    Misrouted {
        packet: String,
        expected: NodeId,
        found: NodeId,
    },

    #[error("packet `{packet}` cannot travel {found}")]
    WrongDirection { packet: String, found: Direction },

    #[error("packet `{0}` is routed to the collector runtime and cannot take handlers")]
    ReservedRoute(String),

    #[error("outbound link closed")]
    OutboundClosed,

    #[error("background task join failed")]
    TaskJoin(#[source] tokio::task::JoinError),
}
