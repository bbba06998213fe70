//! Replays recorded HCI traffic from hex text.
//!
//! Each non-blank line that does not start with `#` holds one event frame as
//! hex octets, with or without separating whitespace. Lines that fail to
//! parse are logged and skipped so one bad capture line does not end a
//! session.

use crate::{HciTransport, TransportError};
use std::path::Path;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::sync::Mutex;

struct Source<R> {
    lines: Lines<R>,
    line_no: usize,
}

pub struct ReplayTransport<R> {
    source: Mutex<Source<R>>,
    sent: Mutex<Vec<Vec<u8>>>,
}

impl<R: AsyncBufRead + Unpin + Send> ReplayTransport<R> {
    pub fn new(reader: R) -> Self {
        Self {
            source: Mutex::new(Source {
                lines: reader.lines(),
                line_no: 0,
            }),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Every frame written through [`HciTransport::send`], in order.
    pub async fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.lock().await.clone()
    }

    /// Next frame from the source, or `None` at end of input.
    pub async fn next_frame(&self) -> Result<Option<Vec<u8>>, TransportError> {
        let mut source = self.source.lock().await;
        while let Some(line) = source.lines.next_line().await? {
            source.line_no += 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let digits: String = trimmed.split_whitespace().collect();
            match hex::decode(&digits) {
                Ok(frame) if !frame.is_empty() => return Ok(Some(frame)),
                Ok(_) => {}
                Err(e) => log::warn!("skipping replay line {}: {e}", source.line_no),
            }
        }
        Ok(None)
    }
}

impl ReplayTransport<BufReader<tokio::fs::File>> {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, TransportError> {
        let file = tokio::fs::File::open(path).await?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: AsyncBufRead + Unpin + Send> HciTransport for ReplayTransport<R> {
    async fn send(&self, frame: &[u8]) -> Result<(), TransportError> {
        log::trace!("replay transport swallowing {} byte command", frame.len());
        self.sent.lock().await.push(frame.to_vec());
        Ok(())
    }

    async fn recv(&self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let frame = self.next_frame().await?.ok_or(TransportError::Closed)?;
        let out = buf
            .get_mut(..frame.len())
            .ok_or(TransportError::FrameTooLarge)?;
        out.copy_from_slice(&frame);
        Ok(frame.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECORDING: &str = "\
# two events and some noise
04 0e 04 01 0c 20 00

not hex at all
043e0302aabb
";

    #[tokio::test]
    async fn replays_frames_and_skips_noise() {
        let transport = ReplayTransport::new(RECORDING.as_bytes());
        let mut buf = [0u8; 64];

        let n = transport.recv(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], &[0x04, 0x0e, 0x04, 0x01, 0x0c, 0x20, 0x00]);
        let n = transport.recv(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], &[0x04, 0x3e, 0x03, 0x02, 0xaa, 0xbb]);
        assert!(matches!(
            transport.recv(&mut buf).await,
            Err(TransportError::Closed)
        ));
    }

    #[tokio::test]
    async fn records_sent_commands() {
        let transport = ReplayTransport::new(&b""[..]);
        transport.send(&[0x01, 0x0c, 0x20, 0x02, 0x01, 0x00]).await.unwrap();
        transport.send(&[0x01, 0x0c, 0x20, 0x02, 0x00, 0x00]).await.unwrap();
        let sent = transport.sent().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1][4], 0x00);
    }

    #[tokio::test]
    async fn small_buffers_are_rejected() {
        let transport = ReplayTransport::new("04 0e 04 01 0c 20 00\n".as_bytes());
        let mut buf = [0u8; 4];
        assert!(matches!(
            transport.recv(&mut buf).await,
            Err(TransportError::FrameTooLarge)
        ));
    }
}
