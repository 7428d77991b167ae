//! Packet-name to handler table.

use std::collections::HashMap;
use std::sync::Arc;

use protocol_core::{
    Direction, Packet, ReactionCollectorReactPacket, ReactionCollectorStopPacket,
};

use crate::api::{PacketHandler, Result, RuntimeError};

/// Packets that always go to the collector runtime.
pub const SYSTEM_ROUTES: [&str; 2] = [
    ReactionCollectorReactPacket::NAME,
    ReactionCollectorStopPacket::NAME,
];

/// Handlers for client packets, filled at start-up.
///
/// Several handlers may listen to one packet; they run concurrently and
/// independently.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<&'static str, Vec<Arc<dyn PacketHandler>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `handler` for packet type `P`.
    ///
    /// # Errors
    ///
    /// - [`RuntimeError::ReservedRoute`] for react and stop packets
    /// - [`RuntimeError::WrongDirection`] for server-to-client packets
    pub fn register<P: Packet>(&mut self, handler: Arc<dyn PacketHandler>) -> Result<()> {
        if SYSTEM_ROUTES.contains(&P::NAME) {
            return Err(RuntimeError::ReservedRoute(P::NAME.to_owned()));
        }
        if P::DIRECTION != Direction::ClientToServer {
            return Err(RuntimeError::WrongDirection {
                packet: P::NAME.to_owned(),
                found: P::DIRECTION,
            });
        }
        self.handlers.entry(P::NAME).or_default().push(handler);
        Ok(())
    }

    /// Handlers for `packet`, in registration order.
    pub fn handlers(&self, packet: &str) -> &[Arc<dyn PacketHandler>] {
        self.handlers.get(packet).map(Vec::as_slice).unwrap_or_default()
    }

    /// Packet names with at least one handler.
    pub fn packets(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.handlers.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.handlers.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
