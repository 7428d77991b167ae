//! Canonical interaction protocol shared across the relay and its front-ends.
//!
//! `protocol-core` defines the packet model (typed packets with a stable name
//! and a fixed [`Direction`]), the [`RoutingContext`] envelope that travels with
//! every packet, and the collector descriptors game logic uses to describe a
//! timed multi-choice prompt. Wire encodings live in `protocol-wire`; the
//! stateful collector runtime lives in `runtime`.
//!
//! Modules are organized by responsibility:
//! - [`ids`] newtype identifiers and the epoch-millisecond clock
//! - [`packet`] the [`Packet`] trait and the type-erased [`CanonicalPacket`]
//! - [`context`] routing envelope and opaque platform handles
//! - [`registry`] and [`factory`] start-up registration and field-set construction
//! - [`packets`] the packets the collector protocol itself speaks
//! - [`collector`] descriptors, tagged reaction variants, and prompt builders
pub mod blocking;
pub mod collector;
pub mod context;
pub mod error;
pub mod factory;
pub mod ids;
pub mod packet;
pub mod packets;
pub mod registry;

pub use blocking::BlockReason;
pub use collector::{
    AcceptRefusePrompt, AmountTierPrompt, CollectorData, CollectorDescriptor, CollectorPrompt,
    NamedOptionsPrompt, NumberedChoicePrompt, Payload, ReactionOption, variants,
};
pub use context::{Envelope, PlatformHandles, RoutingContext};
pub use error::{DescriptorError, PacketError, RegistryError};
pub use factory::{FieldResolver, FieldSet, FieldValue, Lookup, LookupKind, PacketFactory};
pub use ids::{CollectorId, EpochMillis, FrontEndId, NodeId, SubjectId, now_millis};
pub use packet::{CanonicalPacket, Direction, Packet};
pub use packets::{
    EndReason, InteractionNoticePacket, Notice, ReactionCollectorCreationPacket,
    ReactionCollectorEndedPacket, ReactionCollectorReactPacket, ReactionCollectorStopPacket,
};
pub use registry::{PacketRegistry, PacketSpec};
