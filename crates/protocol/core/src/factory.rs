//! Packet construction from loosely typed field sets.
//!
//! Game features that assemble packets dynamically (or need a value that only
//! an external service knows, such as a display name) describe the packet as
//! a [`FieldSet`]. [`PacketFactory::create`] resolves any deferred lookups,
//! then validates the result against the registered type, so a missing
//! required field fails at construction time rather than at the wire.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::RoutingContext;
use crate::error::PacketError;
use crate::packet::CanonicalPacket;
use crate::registry::PacketRegistry;

/// Kind of external value a deferred field needs.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
pub enum LookupKind {
    /// Human-readable name of a subject.
    DisplayName,
    /// Name of the group (guild, team) a subject belongs to.
    GroupName,
}

/// A deferred field: resolved asynchronously right before construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lookup {
    pub kind: LookupKind,
    pub key: String,
}

impl Lookup {
    pub fn new(kind: LookupKind, key: impl Into<String>) -> Self {
        Self {
            kind,
            key: key.into(),
        }
    }

    pub fn display_name(key: impl Into<String>) -> Self {
        Self::new(LookupKind::DisplayName, key)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Ready(Value),
    Deferred(Lookup),
}

/// Named fields of a packet under construction.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldSet {
    fields: BTreeMap<String, FieldValue>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field whose value is already known.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), FieldValue::Ready(value.into()));
        self
    }

    /// Adds a field resolved through the factory's [`FieldResolver`].
    pub fn deferred(mut self, name: impl Into<String>, lookup: Lookup) -> Self {
        self.fields.insert(name.into(), FieldValue::Deferred(lookup));
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn has_deferred(&self) -> bool {
        self.fields
            .values()
            .any(|value| matches!(value, FieldValue::Deferred(_)))
    }
}

/// Resolves deferred packet fields (display names, group names, ...).
#[async_trait]
pub trait FieldResolver: Send + Sync {
    async fn resolve(&self, lookup: &Lookup, context: &RoutingContext) -> anyhow::Result<Value>;
}

/// Instantiates registered packets from field sets.
#[derive(Clone)]
pub struct PacketFactory {
    registry: Arc<PacketRegistry>,
    resolver: Option<Arc<dyn FieldResolver>>,
}

impl PacketFactory {
    pub fn new(registry: Arc<PacketRegistry>) -> Self {
        Self {
            registry,
            resolver: None,
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn FieldResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn registry(&self) -> &PacketRegistry {
        &self.registry
    }

    /// Builds packet `name` from `fields`, resolving deferred fields first.
    ///
    /// # Errors
    ///
    /// - [`PacketError::UnknownPacket`] if `name` was never registered
    /// - [`PacketError::UnresolvedField`] if a deferred field exists but no
    ///   resolver is configured
    /// - [`PacketError::Resolve`] if the resolver fails
    /// - [`PacketError::MissingField`] / [`PacketError::InvalidFields`] if the
    ///   resolved fields do not form a valid packet
    pub async fn create(
        &self,
        name: &str,
        context: &RoutingContext,
        fields: FieldSet,
    ) -> Result<CanonicalPacket, PacketError> {
        let spec = self
            .registry
            .get(name)
            .ok_or_else(|| PacketError::UnknownPacket(name.to_owned()))?;

        let mut body = serde_json::Map::with_capacity(fields.len());
        for (field, value) in fields.fields {
            let value = match value {
                FieldValue::Ready(value) => value,
                FieldValue::Deferred(lookup) => {
                    let resolver =
                        self.resolver
                            .as_ref()
                            .ok_or_else(|| PacketError::UnresolvedField {
                                packet: name.to_owned(),
                                field: field.clone(),
                            })?;
                    resolver
                        .resolve(&lookup, context)
                        .await
                        .map_err(|source| PacketError::Resolve {
                            packet: name.to_owned(),
                            field: field.clone(),
                            source,
                        })?
                }
            };
            body.insert(field, value);
        }

        spec.build(Value::Object(body))
    }

    /// Synchronous variant for field sets without deferred lookups.
    pub fn create_ready(&self, name: &str, fields: FieldSet) -> Result<CanonicalPacket, PacketError> {
        let spec = self
            .registry
            .get(name)
            .ok_or_else(|| PacketError::UnknownPacket(name.to_owned()))?;

        let mut body = serde_json::Map::with_capacity(fields.len());
        for (field, value) in fields.fields {
            match value {
                FieldValue::Ready(value) => {
                    body.insert(field, value);
                }
                FieldValue::Deferred(_) => {
                    return Err(PacketError::UnresolvedField {
                        packet: name.to_owned(),
                        field,
                    });
                }
            }
        }

        spec.build(Value::Object(body))
    }
}
