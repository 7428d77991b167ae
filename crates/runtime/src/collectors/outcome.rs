use serde::{Deserialize, Serialize};

use protocol_core::Notice;

/// Why an inbound react was dropped.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Rejection {
    /// No collector with this id lives on this node.
    UnknownCollector,
    /// The collector already reached its terminal state.
    Ended,
    /// The reactor is outside a non-empty allow list.
    NotAllowed,
    /// The index does not address an option.
    InvalidIndex,
}

impl Rejection {
    /// Notice shown to the reactor.
    pub fn notice(self) -> Notice {
        match self {
            Rejection::UnknownCollector | Rejection::Ended => Notice::StaleInteraction,
            Rejection::NotAllowed => Notice::NotForYou,
            Rejection::InvalidIndex => Notice::InvalidReaction,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReactOutcome {
    /// The reaction was recorded. `ended` is set when it claimed termination.
    Accepted { ended: bool },
    Rejected(Rejection),
}

impl ReactOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ReactOutcome::Accepted { .. })
    }

    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            ReactOutcome::Rejected(rejection) => Some(*rejection),
            ReactOutcome::Accepted { .. } => None,
        }
    }
}
