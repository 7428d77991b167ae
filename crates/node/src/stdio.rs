//! Line-framed front-end link over stdin/stdout.
//!
//! One frame per line: JSON text as-is, binary frames hex-encoded.
use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use protocol_wire::{WireEncoding, WireMessage};

const TARGET: &str = "node::stdio";

/// Parses one input line into a frame of `encoding`.
pub fn decode_line(encoding: WireEncoding, line: &str) -> Result<WireMessage> {
    match encoding {
        WireEncoding::Json => Ok(WireMessage::Text(line.to_owned())),
        WireEncoding::Binary => {
            let bytes = hex::decode(line).context("binary frame is not valid hex")?;
            Ok(WireMessage::Binary(bytes))
        }
    }
}

/// Renders a frame as one output line, without the terminator.
pub fn encode_line(message: &WireMessage) -> String {
    match message {
        WireMessage::Text(text) => text.replace('\n', " "),
        WireMessage::Binary(bytes) => hex::encode(bytes),
    }
}

/// Forwards input lines to `inbound` until EOF or until the runtime stops
/// reading. Blank and malformed lines are skipped.
pub async fn read_frames<R>(reader: R, encoding: WireEncoding, inbound: mpsc::Sender<WireMessage>) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match decode_line(encoding, line) {
            Ok(message) => {
                if inbound.send(message).await.is_err() {
                    debug!(target: TARGET, "runtime stopped reading");
                    break;
                }
            }
            Err(err) => warn!(target: TARGET, error = %err, "malformed input line skipped"),
        }
    }
    Ok(())
}

/// Writes every outbound frame as one line until the link closes.
pub async fn write_frames<W>(mut writer: W, mut outbound: mpsc::Receiver<WireMessage>) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(message) = outbound.recv().await {
        let mut line = encode_line(&message);
        line.push('\n');
        writer
            .write_all(line.as_bytes())
            .await
            .context("failed to write stdout")?;
        writer.flush().await.context("failed to flush stdout")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_lines_are_hex() {
        let message = WireMessage::Binary(vec![0x01, 0xab, 0xff]);
        let line = encode_line(&message);
        assert_eq!(line, "01abff");
        assert_eq!(decode_line(WireEncoding::Binary, &line).unwrap(), message);
        assert!(decode_line(WireEncoding::Binary, "zz").is_err());
    }

    #[test]
    fn text_frames_stay_on_one_line() {
        let message = WireMessage::Text("{\"a\":\n1}".into());
        assert_eq!(encode_line(&message), "{\"a\": 1}");
    }

    #[tokio::test]
    async fn reader_skips_blank_and_malformed_lines() {
        let input: &[u8] = b"00ff\n\nnot-hex\n  0a0b  \n";
        let (tx, mut rx) = mpsc::channel(4);

        read_frames(input, WireEncoding::Binary, tx).await.unwrap();

        assert_eq!(rx.recv().await, Some(WireMessage::Binary(vec![0x00, 0xff])));
        assert_eq!(rx.recv().await, Some(WireMessage::Binary(vec![0x0a, 0x0b])));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn writer_emits_one_line_per_frame() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(WireMessage::Text("{}".into())).await.unwrap();
        tx.send(WireMessage::Binary(vec![0x10])).await.unwrap();
        drop(tx);

        let mut output = Vec::new();
        write_frames(&mut output, rx).await.unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "{}\n10\n");
    }
}
