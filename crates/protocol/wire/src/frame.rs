//! Frame layouts shared by every packet of an encoding.
//!
//! A frame carries the packet name (the discriminant used for translator
//! lookup), the routing context, and an encoding-specific body produced by
//! the packet's translator.
//!
//! JSON: `{"v":1,"packet":"<name>","context":{..},"body":{..}}`
//!
//! Binary: bincode of `(version: u8, packet: String, context, body: Vec<u8>)`

use serde::{Deserialize, Serialize};

use protocol_core::RoutingContext;

use crate::encoding::{WireEncoding, WireMessage};
use crate::error::WireError;

/// Frame layout version. Bump on any incompatible layout change.
pub const FRAME_VERSION: u8 = 1;

/// Packet body in a specific encoding, before or after translation.
#[derive(Clone, Debug, PartialEq)]
pub enum WireBody {
    Json(serde_json::Value),
    Binary(Vec<u8>),
}

impl WireBody {
    pub fn encoding(&self) -> WireEncoding {
        match self {
            WireBody::Json(_) => WireEncoding::Json,
            WireBody::Binary(_) => WireEncoding::Binary,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct JsonFrame {
    #[serde(rename = "v")]
    version: u8,
    packet: String,
    context: RoutingContext,
    body: serde_json::Value,
}

#[derive(Serialize, Deserialize)]
struct BinaryFrame {
    version: u8,
    packet: String,
    context: RoutingContext,
    body: Vec<u8>,
}

/// A frame split into its parts.
pub(crate) struct Frame {
    pub packet: String,
    pub context: RoutingContext,
    pub body: WireBody,
}

fn check_version(found: u8) -> Result<(), WireError> {
    if found != FRAME_VERSION {
        return Err(WireError::UnsupportedVersion {
            expected: FRAME_VERSION,
            found,
        });
    }
    Ok(())
}

pub(crate) fn split(message: &WireMessage) -> Result<Frame, WireError> {
    match message {
        WireMessage::Text(text) => {
            let frame: JsonFrame = serde_json::from_str(text)?;
            check_version(frame.version)?;
            Ok(Frame {
                packet: frame.packet,
                context: frame.context,
                body: WireBody::Json(frame.body),
            })
        }
        WireMessage::Binary(bytes) => {
            let frame: BinaryFrame = bincode::deserialize(bytes)?;
            check_version(frame.version)?;
            Ok(Frame {
                packet: frame.packet,
                context: frame.context,
                body: WireBody::Binary(frame.body),
            })
        }
    }
}

pub(crate) fn join(frame: Frame) -> Result<WireMessage, WireError> {
    match frame.body {
        WireBody::Json(body) => {
            let text = serde_json::to_string(&JsonFrame {
                version: FRAME_VERSION,
                packet: frame.packet,
                context: frame.context,
                body,
            })?;
            Ok(WireMessage::Text(text))
        }
        WireBody::Binary(body) => {
            let bytes = bincode::serialize(&BinaryFrame {
                version: FRAME_VERSION,
                packet: frame.packet,
                context: frame.context,
                body,
            })?;
            Ok(WireMessage::Binary(bytes))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unknown_frame_version() {
        let text = serde_json::json!({
            "v": 9,
            "packet": "X",
            "context": RoutingContext::new("u", "bot", "n"),
            "body": {}
        })
        .to_string();

        let err = split(&WireMessage::Text(text)).err().unwrap();
        assert!(matches!(err, WireError::UnsupportedVersion { found: 9, .. }));
    }

    #[test]
    fn binary_frames_survive_a_split_join_cycle() {
        let frame = Frame {
            packet: "X".into(),
            context: RoutingContext::new("u", "gateway", "n").with_handle("message", "m-1"),
            body: WireBody::Binary(vec![1, 2, 3]),
        };

        let message = join(frame).unwrap();
        let back = split(&message).unwrap();

        assert_eq!(back.packet, "X");
        assert_eq!(back.context.handles.get("message"), Some("m-1"));
        assert_eq!(back.body, WireBody::Binary(vec![1, 2, 3]));
    }
}
