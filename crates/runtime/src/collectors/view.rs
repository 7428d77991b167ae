//! Snapshots of collector state handed to hooks.

use std::sync::Arc;

use protocol_core::{
    CollectorDescriptor, CollectorId, EndReason, EpochMillis, ReactionOption, RoutingContext,
    SubjectId,
};

/// One accepted reaction, in arrival order.
#[derive(Clone, Debug, PartialEq)]
pub struct ReceivedReaction {
    pub reactor: SubjectId,
    pub index: u32,
    pub option: ReactionOption,
    pub received_at: EpochMillis,
}

/// Read-only state of an active collector, passed to per-reaction hooks.
#[derive(Clone, Debug)]
pub struct CollectorView {
    pub descriptor: Arc<CollectorDescriptor>,
    /// Context of the subject that opened the collector.
    pub context: RoutingContext,
    /// Reactions so far, including the one being reported.
    pub reactions: Vec<ReceivedReaction>,
}

impl CollectorView {
    pub fn id(&self) -> &CollectorId {
        &self.descriptor.id
    }
}

/// Final state of a collector, passed to the end hook exactly once.
#[derive(Clone, Debug)]
pub struct EndedCollector {
    pub descriptor: Arc<CollectorDescriptor>,
    pub context: RoutingContext,
    pub reason: EndReason,
    pub reactions: Vec<ReceivedReaction>,
}

impl EndedCollector {
    pub fn id(&self) -> &CollectorId {
        &self.descriptor.id
    }

    pub fn initiator(&self) -> &SubjectId {
        &self.context.subject
    }

    /// First reaction, if any.
    pub fn first(&self) -> Option<&ReceivedReaction> {
        self.reactions.first()
    }

    /// True when the first reaction selected an option of `kind`.
    pub fn first_is(&self, kind: &str) -> bool {
        self.first().is_some_and(|reaction| reaction.option.is(kind))
    }
}
