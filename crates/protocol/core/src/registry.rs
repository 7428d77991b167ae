//! Start-up registry of packet types.
//!
//! The [`PacketRegistry`] is the single place a packet name is bound to a
//! direction and a concrete type. It is filled once while the node boots and
//! shared read-only afterwards.
//!
//! # Invariants
//!
//! - A name maps to exactly one Rust type and one [`Direction`].
//! - Registering the same type twice is a no-op.

use std::any::TypeId;
use std::collections::HashMap;

use crate::error::{PacketError, RegistryError};
use crate::packet::{CanonicalPacket, Direction, Packet};
use crate::packets;

/// Validates a JSON body against a packet type and returns the normalized body.
type Validator = fn(serde_json::Value) -> Result<serde_json::Value, serde_json::Error>;

fn validate_as<P: Packet>(body: serde_json::Value) -> Result<serde_json::Value, serde_json::Error> {
    let packet: P = serde_json::from_value(body)?;
    serde_json::to_value(&packet)
}

/// Registration record for one packet type.
#[derive(Clone, Copy, Debug)]
pub struct PacketSpec {
    name: &'static str,
    direction: Direction,
    type_id: TypeId,
    validate: Validator,
}

impl PacketSpec {
    pub(crate) fn of<P: Packet>() -> Self {
        Self {
            name: P::NAME,
            direction: P::DIRECTION,
            type_id: TypeId::of::<P>(),
            validate: validate_as::<P>,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Validates `body` as this packet type and wraps it canonically.
    pub fn build(&self, body: serde_json::Value) -> Result<CanonicalPacket, PacketError> {
        let body =
            (self.validate)(body).map_err(|source| PacketError::from_validation(self.name, source))?;
        Ok(CanonicalPacket::from_parts(self.name, self.direction, body))
    }
}

/// Registry of every packet type known to this process.
#[derive(Clone, Debug, Default)]
pub struct PacketRegistry {
    specs: HashMap<&'static str, PacketSpec>,
}

impl PacketRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-filled with the collector protocol's own packets.
    pub fn with_core_packets() -> Self {
        let specs = packets::core_specs()
            .into_iter()
            .map(|spec| (spec.name, spec))
            .collect();
        Self { specs }
    }

    /// Registers packet type `P`.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::DirectionConflict`] if the name is already bound to
    ///   the opposite direction
    /// - [`RegistryError::DuplicateName`] if another type already uses the name
    pub fn register<P: Packet>(&mut self) -> Result<(), RegistryError> {
        let spec = PacketSpec::of::<P>();
        match self.specs.get(P::NAME) {
            None => {
                self.specs.insert(P::NAME, spec);
                Ok(())
            }
            Some(existing) if existing.direction != spec.direction => {
                Err(RegistryError::DirectionConflict {
                    name: P::NAME,
                    registered: existing.direction,
                    requested: spec.direction,
                })
            }
            Some(existing) if existing.type_id != spec.type_id => {
                Err(RegistryError::DuplicateName { name: P::NAME })
            }
            Some(_) => Ok(()),
        }
    }

    pub fn get(&self, name: &str) -> Option<&PacketSpec> {
        self.specs.get(name)
    }

    pub fn direction(&self, name: &str) -> Option<Direction> {
        self.specs.get(name).map(PacketSpec::direction)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.specs.contains_key(name)
    }

    /// Checks that `packet` is registered and travels in its declared direction.
    pub fn check(&self, packet: &CanonicalPacket) -> Result<(), RegistryError> {
        let spec = self
            .specs
            .get(packet.name())
            .ok_or_else(|| RegistryError::UnknownPacket(packet.name().to_owned()))?;
        if spec.direction != packet.direction() {
            return Err(RegistryError::DirectionMismatch {
                name: packet.name().to_owned(),
                expected: spec.direction,
                found: packet.direction(),
            });
        }
        Ok(())
    }

    /// Registered packet names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.specs.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::packets::ReactionCollectorReactPacket;

    #[derive(Clone, Debug, Serialize, Deserialize)]
    struct ForgedReact {
        id: String,
    }

    impl Packet for ForgedReact {
        const NAME: &'static str = ReactionCollectorReactPacket::NAME;
        const DIRECTION: Direction = Direction::ServerToClient;
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    struct Impostor {
        id: String,
    }

    impl Packet for Impostor {
        const NAME: &'static str = ReactionCollectorReactPacket::NAME;
        const DIRECTION: Direction = Direction::ClientToServer;
    }

    #[test]
    fn core_packets_are_registered() {
        let registry = PacketRegistry::with_core_packets();
        assert_eq!(
            registry.direction(ReactionCollectorReactPacket::NAME),
            Some(Direction::ClientToServer)
        );
        assert!(registry.len() >= 5);
    }

    #[test]
    fn same_type_twice_is_idempotent() {
        let mut registry = PacketRegistry::new();
        registry.register::<ReactionCollectorReactPacket>().unwrap();
        registry.register::<ReactionCollectorReactPacket>().unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn flipped_direction_is_rejected() {
        let mut registry = PacketRegistry::with_core_packets();
        let err = registry.register::<ForgedReact>().unwrap_err();
        assert!(matches!(err, RegistryError::DirectionConflict { .. }));
    }

    #[test]
    fn name_reuse_by_other_type_is_rejected() {
        let mut registry = PacketRegistry::with_core_packets();
        let err = registry.register::<Impostor>().unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateName { .. }));
    }

    #[test]
    fn spec_build_reports_missing_fields() {
        let registry = PacketRegistry::with_core_packets();
        let spec = registry.get(ReactionCollectorReactPacket::NAME).unwrap();

        let err = spec
            .build(serde_json::json!({ "id": "c-1", "reactor_id": "u-1" }))
            .unwrap_err();

        match err {
            PacketError::MissingField { field, .. } => assert_eq!(field, "reaction_index"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
