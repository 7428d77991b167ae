//! Typed packets and their type-erased canonical form.
//!
//! A [`Packet`] is a plain serde struct that declares its wire name and its
//! [`Direction`] as associated constants. Native type identity does not survive
//! a process boundary, so everything that crosses one (registries,
//! translators, dispatch) works on [`CanonicalPacket`]: the stable name, the
//! direction, and a JSON body.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::PacketError;

/// Which way a packet travels relative to the relay node.
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
#[strum(serialize_all = "snake_case")]
pub enum Direction {
    /// Front-end → relay (user input).
    ClientToServer,
    /// Relay → front-end (prompts, results, notices).
    ServerToClient,
}

/// A typed protocol message.
///
/// `NAME` is the wire discriminant and must be globally stable; renaming a
/// packet or flipping its `DIRECTION` is a breaking change for every
/// independently deployed front-end.
pub trait Packet: Serialize + DeserializeOwned + Clone + fmt::Debug + Send + Sync + 'static {
    const NAME: &'static str;
    const DIRECTION: Direction;
}

/// Type-erased packet: stable name, direction, and canonical JSON body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CanonicalPacket {
    name: String,
    direction: Direction,
    body: serde_json::Value,
}

impl CanonicalPacket {
    /// Erases a typed packet into its canonical form.
    pub fn from_packet<P: Packet>(packet: &P) -> Result<Self, PacketError> {
        let body = serde_json::to_value(packet).map_err(|source| PacketError::Encode {
            packet: P::NAME,
            source,
        })?;
        Ok(Self {
            name: P::NAME.to_owned(),
            direction: P::DIRECTION,
            body,
        })
    }

    /// Recovers the typed packet, checking the name first.
    pub fn decode<P: Packet>(&self) -> Result<P, PacketError> {
        if self.name != P::NAME {
            return Err(PacketError::NameMismatch {
                expected: P::NAME,
                found: self.name.clone(),
            });
        }
        serde_json::from_value(self.body.clone())
            .map_err(|source| PacketError::from_validation(&self.name, source))
    }

    /// Builds a canonical packet from an already validated body.
    pub(crate) fn from_parts(
        name: impl Into<String>,
        direction: Direction,
        body: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            direction,
            body,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn body(&self) -> &serde_json::Value {
        &self.body
    }

    /// Returns true if this packet carries type `P`.
    pub fn is<P: Packet>(&self) -> bool {
        self.name == P::NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packets::{ReactionCollectorReactPacket, ReactionCollectorStopPacket};

    #[test]
    fn decode_recovers_typed_packet() {
        let react = ReactionCollectorReactPacket {
            id: "c-1".into(),
            reactor_id: "u-1".into(),
            reaction_index: 2,
        };
        let canonical = CanonicalPacket::from_packet(&react).unwrap();

        assert_eq!(canonical.name(), ReactionCollectorReactPacket::NAME);
        assert_eq!(canonical.direction(), Direction::ClientToServer);
        assert!(canonical.is::<ReactionCollectorReactPacket>());
        assert_eq!(canonical.decode::<ReactionCollectorReactPacket>().unwrap(), react);
    }

    #[test]
    fn decode_rejects_other_packet_names() {
        let stop = ReactionCollectorStopPacket { id: "c-1".into() };
        let canonical = CanonicalPacket::from_packet(&stop).unwrap();

        let err = canonical
            .decode::<ReactionCollectorReactPacket>()
            .unwrap_err();
        assert!(matches!(err, PacketError::NameMismatch { .. }));
    }

    #[test]
    fn direction_uses_snake_case_names() {
        assert_eq!(Direction::ClientToServer.to_string(), "client_to_server");
        assert_eq!(
            "server_to_client".parse::<Direction>().unwrap(),
            Direction::ServerToClient
        );
    }
}
