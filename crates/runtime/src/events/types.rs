//! Event payloads published on the bus.

use serde::{Deserialize, Serialize};

use protocol_core::{CollectorId, EndReason, EpochMillis, SubjectId};

use crate::collectors::Rejection;

/// Collector lifecycle events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CollectorEvent {
    Opened {
        id: CollectorId,
        initiator: SubjectId,
        end_time: EpochMillis,
        options: usize,
    },
    Reacted {
        id: CollectorId,
        reactor: SubjectId,
        index: u32,
    },
    Rejected {
        id: CollectorId,
        reactor: SubjectId,
        rejection: Rejection,
    },
    Ended {
        id: CollectorId,
        reason: EndReason,
        reactions: usize,
    },
}

/// Generic dispatch events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DispatchEvent {
    /// A handler returned an error or panicked.
    HandlerFailed {
        packet: String,
        handler: String,
        error: String,
    },
    /// No handler is registered for the packet.
    Unhandled { packet: String },
}
