//! Long-running async beacon listener.
//!
//! Reads events from a transport, runs them through the configured
//! recognizers and dispatches what it finds through an unbounded channel.

use crate::ListenerConfig;
use blescan_core::beacons::{expand_eddystone, peer, recognize_any, BeaconRecord, Recognition};
use blescan_core::hci::EventDecoder;
use blescan_core::packet::Packet;
use blescan_datalink::{HciTransport, TransportError};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Something the listener saw.
#[derive(Debug, Clone, PartialEq)]
pub enum Sighting {
    Beacon(BeaconRecord),
    /// An advertisement that claimed a known format but could not be read.
    Malformed {
        reason: &'static str,
        event: Packet,
    },
    /// A decoded event no recognizer claimed, forwarded on request.
    Raw(Packet),
}

/// A receiver for sightings dispatched by a listener loop.
pub struct BeaconListener {
    rx: mpsc::UnboundedReceiver<Sighting>,
}

impl BeaconListener {
    /// Receive the next sighting; `None` once the driver has stopped.
    pub async fn recv(&mut self) -> Option<Sighting> {
        self.rx.recv().await
    }
}

/// Create a beacon listener and the async driver loop.
///
/// Returns `(listener, driver)` where `driver` is a future that must be
/// polled (e.g. via `tokio::spawn`) for sightings to be received. The driver
/// runs until the transport closes or the [`BeaconListener`] is dropped.
///
/// # Example
///
/// ```ignore
/// let (mut listener, driver) = create_beacon_listener(transport, ListenerConfig::default());
/// tokio::spawn(driver);
/// while let Some(sighting) = listener.recv().await {
///     // handle sighting
/// }
/// ```
pub fn create_beacon_listener<T: HciTransport + 'static>(
    transport: Arc<T>,
    config: ListenerConfig,
) -> (BeaconListener, impl std::future::Future<Output = ()>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let driver = async move {
        let decoder = EventDecoder::new(config.trailing_byte);
        let mut buf = [0u8; 258];
        loop {
            let n = match transport.recv(&mut buf).await {
                Ok(n) => n,
                Err(TransportError::Closed) => break,
                Err(TransportError::Io(e)) => {
                    log::warn!("beacon listener stopping: {e}");
                    break;
                }
                Err(e) => {
                    log::debug!("skipping frame: {e}");
                    continue;
                }
            };
            let event = match decoder.decode_frame(&buf[..n]) {
                Ok(event) => event,
                Err(e) => {
                    log::debug!("dropping undecodable event ({n} bytes): {e}");
                    continue;
                }
            };
            if let Some(sighting) = classify(event, &config) {
                if tx.send(sighting).is_err() {
                    break; // receiver dropped
                }
            }
        }
    };

    (BeaconListener { rx }, driver)
}

fn classify(mut event: Packet, config: &ListenerConfig) -> Option<Sighting> {
    if !config.accepts(peer(&event)) {
        return None;
    }
    if config.kinds.is_empty() {
        return Some(Sighting::Raw(event));
    }
    if config.expand_eddystone {
        // a malformed Eddystone frame is reported by the recognizer below
        let _ = expand_eddystone(&mut event);
    }
    match recognize_any(&event, &config.kinds) {
        Recognition::Matched(record) => Some(Sighting::Beacon(record)),
        Recognition::Malformed(reason) => Some(Sighting::Malformed { reason, event }),
        Recognition::NotThisFormat if config.include_unrecognized => Some(Sighting::Raw(event)),
        Recognition::NotThisFormat => None,
    }
}
