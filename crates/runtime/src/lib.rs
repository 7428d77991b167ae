//! Runtime orchestration for a relay node.
//!
//! This crate wires the canonical protocol to live front-end links: it keeps
//! the node's collectors, serializes conflicting interactions per subject,
//! and routes every inbound packet either to its collector or to the game
//! handlers registered for it. Hosting processes embed [`Runtime`] and hand
//! [`RuntimeHandle`] to game logic.
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types game code interacts with
//! - [`collectors`] owns collector state and the termination claim
//! - [`blocking`] tracks per-subject interaction blocks
//! - [`dispatch`] routes inbound envelopes to collectors or handlers
//! - [`routing`] translates between front-end links and envelopes
//! - [`events`] provides topic-based event bus for observers
pub mod api;
pub mod blocking;
pub mod collectors;
pub mod dispatch;
pub mod events;
pub mod routing;
pub mod runtime;

pub use api::{
    CollectorHandler, HandlerContext, HandlerCriticality, PacketHandler, ResponseSink, Result,
    RuntimeError, RuntimeHandle,
};
pub use blocking::BlockingCoordinator;
pub use collectors::{
    CollectorRuntime, CollectorSettings, CollectorSlot, CollectorStatus, CollectorView,
    EndedCollector, ReactOutcome, ReceivedReaction, Rejection,
};
pub use dispatch::{DispatchOutcome, Dispatcher, HandlerRegistry};
pub use events::{CollectorEvent, DispatchEvent, Event, EventBus, Topic};
pub use routing::{ChannelOutbound, Egress, NodeRouter, Outbound};
pub use runtime::{Runtime, RuntimeBuilder, RuntimeConfig};
