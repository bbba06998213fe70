use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur while moving HCI frames.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("frame too large")]
    FrameTooLarge,
    #[error("invalid frame")]
    InvalidFrame,
    #[error("transport closed")]
    Closed,
}

/// Async trait for sending and receiving raw HCI frames.
///
/// A frame starts with its packet-type tag: `0x01` for commands written to
/// the controller, `0x04` for events read back. Implementors include
/// [`ReplayTransport`](crate::ReplayTransport) for recorded traffic and
/// [`CapturingTransport`](crate::CapturingTransport) for PCAP logging.
pub trait HciTransport: Send + Sync {
    /// Writes one command frame.
    async fn send(&self, frame: &[u8]) -> Result<(), TransportError>;

    /// Reads one event frame into `buf`, returning its length.
    async fn recv(&self, buf: &mut [u8]) -> Result<usize, TransportError>;
}

impl<T: HciTransport> HciTransport for Arc<T> {
    async fn send(&self, frame: &[u8]) -> Result<(), TransportError> {
        self.as_ref().send(frame).await
    }

    async fn recv(&self, buf: &mut [u8]) -> Result<usize, TransportError> {
        self.as_ref().recv(buf).await
    }
}
