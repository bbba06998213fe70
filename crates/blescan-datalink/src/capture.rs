//! PCAP packet capture via an [`HciTransport`](crate::HciTransport) wrapper.
//!
//! [`CapturingTransport`] wraps any transport and writes every sent and
//! received frame to a PCAP stream that Wireshark dissects as Bluetooth HCI.

use crate::{HciTransport, TransportError};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;

/// `LINKTYPE_BLUETOOTH_HCI_H4_WITH_PHDR`: H4 frames behind a 4-byte
/// big-endian direction word.
const PCAP_LINK_TYPE_HCI_H4_WITH_PHDR: u32 = 201;
const PCAP_MAGIC: u32 = 0xa1b2c3d4;
const PCAP_VERSION_MAJOR: u16 = 2;
const PCAP_VERSION_MINOR: u16 = 4;
const PCAP_MAX_SNAPLEN: u32 = 65535;
const PHDR_LEN: u32 = 4;

/// Direction of a captured packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Host to controller.
    Sent,
    /// Controller to host.
    Received,
}

impl Direction {
    const fn phdr(self) -> u32 {
        match self {
            Self::Sent => 0,
            Self::Received => 1,
        }
    }
}

/// Writes the global header once and appends packet records.
struct PcapWriter<W: Write + Send> {
    inner: W,
}

impl<W: Write + Send> PcapWriter<W> {
    fn new(mut writer: W) -> io::Result<Self> {
        writer.write_all(&PCAP_MAGIC.to_le_bytes())?;
        writer.write_all(&PCAP_VERSION_MAJOR.to_le_bytes())?;
        writer.write_all(&PCAP_VERSION_MINOR.to_le_bytes())?;
        writer.write_all(&0i32.to_le_bytes())?; // thiszone
        writer.write_all(&0u32.to_le_bytes())?; // sigfigs
        writer.write_all(&PCAP_MAX_SNAPLEN.to_le_bytes())?;
        writer.write_all(&PCAP_LINK_TYPE_HCI_H4_WITH_PHDR.to_le_bytes())?;
        writer.flush()?;
        Ok(Self { inner: writer })
    }

    fn write_packet(&mut self, direction: Direction, data: &[u8]) -> io::Result<()> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        let len = u32::try_from(data.len())
            .ok()
            .and_then(|n| n.checked_add(PHDR_LEN))
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "frame too large"))?;

        self.inner.write_all(&(now.as_secs() as u32).to_le_bytes())?;
        self.inner.write_all(&now.subsec_micros().to_le_bytes())?;
        self.inner.write_all(&len.to_le_bytes())?; // incl_len
        self.inner.write_all(&len.to_le_bytes())?; // orig_len
        self.inner.write_all(&direction.phdr().to_be_bytes())?;
        self.inner.write_all(data)?;
        self.inner.flush()
    }
}

/// An [`HciTransport`] wrapper that captures all frames as PCAP.
///
/// ```no_run
/// # use blescan_datalink::{CapturingTransport, ReplayTransport};
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let replay = ReplayTransport::open("session.hex").await?;
/// let capturing = CapturingTransport::to_file(replay, "session.pcap")?;
/// // use `capturing` as the scanner transport; every frame is logged
/// # Ok(())
/// # }
/// ```
pub struct CapturingTransport<T: HciTransport, W: Write + Send = BufWriter<File>> {
    inner: T,
    writer: Mutex<PcapWriter<W>>,
}

impl<T: HciTransport> CapturingTransport<T> {
    /// Creates a capturing wrapper that writes frames to the file at `path`.
    pub fn to_file(inner: T, path: impl AsRef<Path>) -> io::Result<Self> {
        Self::new(inner, BufWriter::new(File::create(path)?))
    }
}

impl<T: HciTransport, W: Write + Send> CapturingTransport<T, W> {
    pub fn new(inner: T, writer: W) -> io::Result<Self> {
        Ok(Self {
            inner,
            writer: Mutex::new(PcapWriter::new(writer)?),
        })
    }

    pub fn into_parts(self) -> (T, W) {
        (self.inner, self.writer.into_inner().inner)
    }

    async fn record(&self, direction: Direction, frame: &[u8]) {
        let mut w = self.writer.lock().await;
        if let Err(e) = w.write_packet(direction, frame) {
            log::warn!("pcap capture failed: {e}");
        }
    }
}

impl<T: HciTransport, W: Write + Send> HciTransport for CapturingTransport<T, W> {
    async fn send(&self, frame: &[u8]) -> Result<(), TransportError> {
        self.record(Direction::Sent, frame).await;
        self.inner.send(frame).await
    }

    async fn recv(&self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let n = self.inner.recv(buf).await?;
        self.record(Direction::Received, &buf[..n]).await;
        Ok(n)
    }
}
