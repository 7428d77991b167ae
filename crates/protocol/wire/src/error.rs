//! Wire-level error types.
use thiserror::Error;

use protocol_core::PacketError;

use crate::encoding::WireEncoding;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("malformed JSON frame")]
    Json(#[from] serde_json::Error),

    #[error("malformed binary frame")]
    Binary(#[from] bincode::Error),

    #[error(transparent)]
    Packet(#[from] PacketError),

    #[error("no {encoding} translator registered for packet `{packet}`")]
    UnknownTranslator {
        packet: String,
        encoding: WireEncoding,
    },

    #[error("expected a {expected} body, found {found}")]
    EncodingMismatch {
        expected: WireEncoding,
        found: WireEncoding,
    },

    #[error("unsupported frame version {found} (expected {expected})")]
    UnsupportedVersion { expected: u8, found: u8 },
}

/// Start-up configuration failures. These abort node boot.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing translators: {}", format_missing(.0))]
    MissingTranslators(Vec<(String, WireEncoding)>),
}

fn format_missing(missing: &[(String, WireEncoding)]) -> String {
    missing
        .iter()
        .map(|(packet, encoding)| format!("{packet}/{encoding}"))
        .collect::<Vec<_>>()
        .join(", ")
}
