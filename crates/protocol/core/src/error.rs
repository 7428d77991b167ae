//! Error types for packet construction, registration, and collector descriptors.
//!
//! All of these indicate programming or configuration mistakes: a packet
//! missing a required field, a type registered twice with conflicting
//! directions, a descriptor whose deadline precedes its creation. None of them
//! is produced by ordinary user input.

use thiserror::Error;

use crate::ids::{CollectorId, EpochMillis};
use crate::packet::Direction;

#[derive(Debug, Error)]
pub enum PacketError {
    #[error("packet `{packet}` is missing required field `{field}`")]
    MissingField { packet: String, field: String },

    #[error("packet `{packet}` has invalid fields")]
    InvalidFields {
        packet: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode packet `{packet}`")]
    Encode {
        packet: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("expected packet `{expected}`, found `{found}`")]
    NameMismatch {
        expected: &'static str,
        found: String,
    },

    #[error("packet `{0}` is not registered")]
    UnknownPacket(String),

    #[error("field `{field}` of packet `{packet}` requires an asynchronous lookup")]
    UnresolvedField { packet: String, field: String },

    #[error("lookup for field `{field}` of packet `{packet}` failed")]
    Resolve {
        packet: String,
        field: String,
        #[source]
        source: anyhow::Error,
    },
}

impl PacketError {
    /// Maps a serde validation error onto the packet it was validating.
    ///
    /// serde reports absent fields as ``missing field `name` ``; those become
    /// [`PacketError::MissingField`] so callers can tell them apart from type
    /// mismatches.
    pub(crate) fn from_validation(packet: &str, source: serde_json::Error) -> Self {
        let message = source.to_string();
        if let Some(rest) = message.strip_prefix("missing field `")
            && let Some(end) = rest.find('`')
        {
            return Self::MissingField {
                packet: packet.to_owned(),
                field: rest[..end].to_owned(),
            };
        }
        Self::InvalidFields {
            packet: packet.to_owned(),
            source,
        }
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("packet `{name}` is already registered as {registered}, cannot register as {requested}")]
    DirectionConflict {
        name: &'static str,
        registered: Direction,
        requested: Direction,
    },

    #[error("packet name `{name}` is already used by a different type")]
    DuplicateName { name: &'static str },

    #[error("packet `{0}` is not registered")]
    UnknownPacket(String),

    #[error("packet `{name}` travels {expected}, but was seen travelling {found}")]
    DirectionMismatch {
        name: String,
        expected: Direction,
        found: Direction,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("collector {id} ends at {end_time} which is not after its creation at {created_at}")]
    EndBeforeCreation {
        id: CollectorId,
        created_at: EpochMillis,
        end_time: EpochMillis,
    },

    #[error("collector {id} has no reaction options")]
    NoOptions { id: CollectorId },

    #[error("collector {id} must accept at least one reaction")]
    ZeroReactionLimit { id: CollectorId },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, serde::Deserialize)]
    #[allow(dead_code)]
    struct Sample {
        id: String,
        count: u32,
    }

    #[test]
    fn missing_field_is_reported_by_name() {
        let err = serde_json::from_value::<Sample>(serde_json::json!({ "id": "x" })).unwrap_err();
        match PacketError::from_validation("sample", err) {
            PacketError::MissingField { packet, field } => {
                assert_eq!(packet, "sample");
                assert_eq!(field, "count");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn type_mismatch_is_invalid_fields() {
        let err = serde_json::from_value::<Sample>(serde_json::json!({ "id": "x", "count": "many" }))
            .unwrap_err();
        assert!(matches!(
            PacketError::from_validation("sample", err),
            PacketError::InvalidFields { .. }
        ));
    }
}
