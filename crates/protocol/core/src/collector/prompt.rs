use serde_json::Value;

use super::descriptor::{CollectorData, CollectorDescriptor, ReactionOption};
use crate::ids::{CollectorId, EpochMillis};

/// A kind of interactive prompt.
///
/// Implementors provide exactly one method, [`creation_packet`], which
/// snapshots the prompt into a [`CollectorDescriptor`]. The runtime fills in
/// the reaction limit, the allowed reactors, and the creation time afterwards.
///
/// The two helpers stamp an explicit discriminant onto a payload so the
/// variant survives the trip to a front-end.
///
/// [`creation_packet`]: CollectorPrompt::creation_packet
pub trait CollectorPrompt: Send + Sync {
    fn creation_packet(
        &self,
        id: CollectorId,
        end_time: EpochMillis,
        main_replacement: bool,
    ) -> CollectorDescriptor;

    fn build_reaction(&self, variant: &str, payload: Value) -> ReactionOption {
        ReactionOption::new(variant, payload)
    }

    fn build_data(&self, variant: &str, payload: Value) -> CollectorData {
        CollectorData::new(variant, payload)
    }
}
