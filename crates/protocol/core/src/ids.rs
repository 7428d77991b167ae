//! Identifier newtypes and the wall clock used for collector deadlines.
//!
//! Every identifier crossing a process boundary is a string on the wire, so
//! the newtypes are `#[serde(transparent)]` wrappers around `String`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Absolute wall-clock time in milliseconds since the Unix epoch.
pub type EpochMillis = u64;

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> EpochMillis {
    // Clocks before 1970 clamp to zero instead of wrapping.
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id! {
    /// Identity of the human (or bot account) interacting with a prompt.
    SubjectId
}

string_id! {
    /// Capability token naming one collector for its whole lifetime.
    ///
    /// Front-ends echo it verbatim; the owning node resolves collector state
    /// by this id alone.
    CollectorId
}

string_id! {
    /// Relay node (shard) that owns collector state.
    NodeId
}

string_id! {
    /// Front-end process a packet came from or is addressed to
    /// (e.g. the chat bot or the mobile gateway).
    FrontEndId
}

impl CollectorId {
    /// Generates a fresh, globally unique collector id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}
