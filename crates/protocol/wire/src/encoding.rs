//! Supported wire encodings and the raw messages they produce.

use serde::{Deserialize, Serialize};

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum WireEncoding {
    /// UTF-8 JSON text frames (chat bot front-end).
    Json,
    /// bincode frames (mobile / web gateway).
    Binary,
}

/// A raw message as it travels over a front-end link.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WireMessage {
    Text(String),
    Binary(Vec<u8>),
}

impl WireMessage {
    pub fn encoding(&self) -> WireEncoding {
        match self {
            WireMessage::Text(_) => WireEncoding::Json,
            WireMessage::Binary(_) => WireEncoding::Binary,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            WireMessage::Text(text) => text.len(),
            WireMessage::Binary(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
