use std::collections::BTreeSet;
use std::fmt;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::variants;
use crate::error::DescriptorError;
use crate::ids::{CollectorId, EpochMillis, SubjectId, now_millis};
use crate::packets::ReactionCollectorCreationPacket;

/// Free-form payload attached to an option or to a collector's shared data.
///
/// Human-readable encodings carry the JSON value as-is. Compact binary
/// encodings cannot describe arbitrary JSON, so there the payload travels as
/// its JSON text instead.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Payload(pub Value);

impl Payload {
    pub fn null() -> Self {
        Self(Value::Null)
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            self.0.serialize(serializer)
        } else {
            let text = serde_json::to_string(&self.0).map_err(serde::ser::Error::custom)?;
            serializer.serialize_str(&text)
        }
    }
}

impl<'de> Deserialize<'de> for Payload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            Value::deserialize(deserializer).map(Self)
        } else {
            struct JsonText;

            impl de::Visitor<'_> for JsonText {
                type Value = Value;

                fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str("a JSON document encoded as a string")
                }

                fn visit_str<E: de::Error>(self, text: &str) -> Result<Value, E> {
                    serde_json::from_str(text).map_err(E::custom)
                }
            }

            deserializer.deserialize_str(JsonText).map(Self)
        }
    }
}

/// One selectable option of a collector: a discriminant plus its payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReactionOption {
    #[serde(rename = "type")]
    pub kind: String,
    pub payload: Payload,
}

impl ReactionOption {
    pub fn new(kind: impl Into<String>, payload: impl Into<Payload>) -> Self {
        Self {
            kind: kind.into(),
            payload: payload.into(),
        }
    }

    pub fn is(&self, kind: &str) -> bool {
        self.kind == kind
    }

    /// Whether this is the designated refusal option.
    pub fn is_refusal(&self) -> bool {
        self.is(variants::REFUSE)
    }
}

/// Data shared by every option of a collector (what is being asked about).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CollectorData {
    #[serde(rename = "type")]
    pub kind: String,
    pub payload: Payload,
}

impl CollectorData {
    pub fn new(kind: impl Into<String>, payload: impl Into<Payload>) -> Self {
        Self {
            kind: kind.into(),
            payload: payload.into(),
        }
    }
}

impl Default for CollectorData {
    fn default() -> Self {
        Self::new(variants::NONE, Payload::null())
    }
}

/// Snapshot of a prompt as it is sent to front-ends.
#[derive(Clone, Debug, PartialEq)]
pub struct CollectorDescriptor {
    pub id: CollectorId,
    pub created_at: EpochMillis,
    pub end_time: EpochMillis,
    pub options: Vec<ReactionOption>,
    pub shared_data: CollectorData,
    /// Whether the prompt replaces the front-end's main message instead of
    /// being posted as a new one.
    pub main_replacement: bool,
    pub reaction_limit: u32,
    /// Empty means anyone may react.
    pub allowed_reactor_ids: BTreeSet<SubjectId>,
}

impl CollectorDescriptor {
    /// Descriptor created now, accepting one reaction from anyone.
    pub fn new(
        id: CollectorId,
        end_time: EpochMillis,
        main_replacement: bool,
        options: Vec<ReactionOption>,
        shared_data: CollectorData,
    ) -> Self {
        Self {
            id,
            created_at: now_millis(),
            end_time,
            options,
            shared_data,
            main_replacement,
            reaction_limit: 1,
            allowed_reactor_ids: BTreeSet::new(),
        }
    }

    pub fn with_reaction_limit(mut self, limit: u32) -> Self {
        self.reaction_limit = limit;
        self
    }

    pub fn with_allowed_reactors(mut self, reactors: impl IntoIterator<Item = SubjectId>) -> Self {
        self.allowed_reactor_ids = reactors.into_iter().collect();
        self
    }

    pub fn validate(&self) -> Result<(), DescriptorError> {
        if self.end_time <= self.created_at {
            return Err(DescriptorError::EndBeforeCreation {
                id: self.id.clone(),
                created_at: self.created_at,
                end_time: self.end_time,
            });
        }
        if self.options.is_empty() {
            return Err(DescriptorError::NoOptions {
                id: self.id.clone(),
            });
        }
        if self.reaction_limit == 0 {
            return Err(DescriptorError::ZeroReactionLimit {
                id: self.id.clone(),
            });
        }
        Ok(())
    }

    pub fn option(&self, index: u32) -> Option<&ReactionOption> {
        self.options.get(usize::try_from(index).ok()?)
    }

    /// Index of the designated refusal option, if the prompt has one.
    pub fn refuse_index(&self) -> Option<u32> {
        self.options
            .iter()
            .position(ReactionOption::is_refusal)
            .and_then(|index| u32::try_from(index).ok())
    }

    pub fn is_restricted(&self) -> bool {
        !self.allowed_reactor_ids.is_empty()
    }

    pub fn is_allowed(&self, reactor: &SubjectId) -> bool {
        !self.is_restricted() || self.allowed_reactor_ids.contains(reactor)
    }

    /// Wire form of this descriptor.
    pub fn creation_packet(&self) -> ReactionCollectorCreationPacket {
        ReactionCollectorCreationPacket {
            id: self.id.clone(),
            end_time: self.end_time,
            options: self.options.clone(),
            shared_data: self.shared_data.clone(),
            main_replacement: self.main_replacement,
            reaction_limit: self.reaction_limit,
            allowed_reactor_ids: self.allowed_reactor_ids.iter().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> CollectorDescriptor {
        let mut descriptor = CollectorDescriptor::new(
            "c-1".into(),
            2_000,
            false,
            vec![
                ReactionOption::new(variants::ACCEPT, Payload::null()),
                ReactionOption::new(variants::REFUSE, Payload::null()),
            ],
            CollectorData::default(),
        );
        descriptor.created_at = 1_000;
        descriptor
    }

    #[test]
    fn validate_accepts_well_formed_descriptor() {
        assert_eq!(descriptor().validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_deadline_before_creation() {
        let mut d = descriptor();
        d.end_time = d.created_at;
        assert!(matches!(
            d.validate(),
            Err(DescriptorError::EndBeforeCreation { .. })
        ));
    }

    #[test]
    fn validate_rejects_zero_limit() {
        let d = descriptor().with_reaction_limit(0);
        assert!(matches!(
            d.validate(),
            Err(DescriptorError::ZeroReactionLimit { .. })
        ));
    }

    #[test]
    fn empty_allow_list_admits_everyone() {
        let d = descriptor();
        assert!(d.is_allowed(&"anyone".into()));

        let d = d.with_allowed_reactors(["u-1".into()]);
        assert!(d.is_allowed(&"u-1".into()));
        assert!(!d.is_allowed(&"u-2".into()));
    }

    #[test]
    fn refuse_index_points_at_refusal() {
        assert_eq!(descriptor().refuse_index(), Some(1));
        assert_eq!(descriptor().option(5), None);
    }

    #[test]
    fn payload_is_plain_json_in_text_encodings() {
        let option = ReactionOption::new(variants::AMOUNT, serde_json::json!({ "amount": 50 }));
        let text = serde_json::to_value(&option).unwrap();
        assert_eq!(
            text,
            serde_json::json!({ "type": "amount", "payload": { "amount": 50 } })
        );
    }
}
