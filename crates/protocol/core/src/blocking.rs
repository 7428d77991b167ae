//! Reason codes for per-subject interaction blocks.

use serde::{Deserialize, Serialize};

/// Why a subject is currently prevented from starting a new interaction.
///
/// Blocks are keyed by (subject, reason); reasons are independent, so
/// releasing one never lifts another.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum BlockReason {
    /// Waiting on a fight challenge or an ongoing fight.
    Fight,
    /// Exploring / reporting on a travel destination.
    Report,
    /// Choosing the next travel destination.
    ChooseDestination,
    /// Browsing a shop.
    Shop,
    /// Browsing the mission shop.
    MissionShop,
    /// Answering a group invitation.
    GroupInvite,
    /// Creating a group.
    GroupCreate,
    /// Confirming a trade or sale.
    Trade,
    /// Confirming a destructive account action.
    Confirmation,
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn reason_codes_round_trip_through_strings() {
        for reason in BlockReason::iter() {
            let parsed: BlockReason = reason.as_ref().parse().unwrap();
            assert_eq!(parsed, reason);
        }
        assert_eq!(BlockReason::MissionShop.to_string(), "mission_shop");
    }
}
