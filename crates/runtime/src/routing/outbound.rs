//! Outbound seams: raw links to front-ends and canonical egress.

use async_trait::async_trait;
use tokio::sync::mpsc;

use protocol_core::Envelope;
use protocol_wire::WireMessage;

use crate::api::{Result, RuntimeError};

/// A link carrying encoded messages to one front-end process.
#[async_trait]
pub trait Outbound: Send + Sync {
    async fn send(&self, message: WireMessage) -> Result<()>;
}

/// Sends canonical envelopes towards the front-end named in their context.
///
/// Implemented by [`NodeRouter`](super::NodeRouter); the collector runtime
/// and the dispatcher only ever see this trait.
#[async_trait]
pub trait Egress: Send + Sync {
    async fn send(&self, envelope: Envelope) -> Result<()>;
}

/// [`Outbound`] backed by a bounded tokio channel.
#[derive(Clone, Debug)]
pub struct ChannelOutbound {
    tx: mpsc::Sender<WireMessage>,
}

impl ChannelOutbound {
    pub fn new(tx: mpsc::Sender<WireMessage>) -> Self {
        Self { tx }
    }

    /// Link plus the receiving end a writer task drains.
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<WireMessage>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl Outbound for ChannelOutbound {
    async fn send(&self, message: WireMessage) -> Result<()> {
        self.tx
            .send(message)
            .await
            .map_err(|_| RuntimeError::OutboundClosed)
    }
}
