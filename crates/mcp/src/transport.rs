//! MCP transport layer.
//!
//! The protocol server reads and writes whole JSON-RPC messages through
//! `McpTransport`. The SSE front end feeds it through `ChannelTransport`:
//! posted messages go in one channel, responses come out the other and are
//! written to the event stream.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::McpError;

#[async_trait]
pub trait McpTransport: Send + Sync {
    /// Read the next JSON-RPC message from the transport.
    /// Returns `None` when the transport is closed. Must be cancel-safe: the
    /// server polls it alongside in-flight requests.
    async fn receive(&mut self) -> Result<Option<String>, McpError>;

    /// Write a JSON-RPC message to the transport.
    async fn send(&mut self, message: &str) -> Result<(), McpError>;
}

/// In-memory transport backed by a pair of mpsc channels.
pub struct ChannelTransport {
    rx: mpsc::Receiver<String>,
    tx: mpsc::Sender<String>,
}

impl ChannelTransport {
    /// Build from an inbound receiver and an outbound sender.
    pub fn new(rx: mpsc::Receiver<String>, tx: mpsc::Sender<String>) -> Self {
        Self { rx, tx }
    }

    /// Create a pair of connected transports.
    ///
    /// Messages sent on one transport are received by the other.
    pub fn pair() -> (Self, Self) {
        let (tx_a, rx_b) = mpsc::channel(32);
        let (tx_b, rx_a) = mpsc::channel(32);
        (Self::new(rx_a, tx_a), Self::new(rx_b, tx_b))
    }
}

#[async_trait]
impl McpTransport for ChannelTransport {
    async fn receive(&mut self) -> Result<Option<String>, McpError> {
        Ok(self.rx.recv().await)
    }

    async fn send(&mut self, message: &str) -> Result<(), McpError> {
        self.tx
            .send(message.to_string())
            .await
            .map_err(|e| McpError::Transport(std::io::Error::new(std::io::ErrorKind::BrokenPipe, e)))?;
        Ok(())
    }
}
