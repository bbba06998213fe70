use crate::{ClientError, ScannerConfig};
use blescan_core::beacons::eddystone::EddystoneFrame;
use blescan_core::beacons::{recognize_any, BeaconKind, BeaconRecord, Recognition};
use blescan_core::hci::{
    AdvertisingParameters, EventDecoder, HciCommand, LeSetAdvertiseEnable, LeSetAdvertisingData,
    LeSetScanEnable, ScanParameters,
};
use blescan_core::packet::{Packet, PacketKind};
use blescan_datalink::{HciTransport, TransportError};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{timeout, Instant};

/// Largest HCI event: tag, code, length and 255 parameter bytes.
const MAX_EVENT_LEN: usize = 258;

/// Drives an LE controller through an [`HciTransport`].
///
/// Commands are written one at a time; a sequence such as the four-command
/// advertising setup holds the write lock throughout so another task cannot
/// interleave its own commands.
#[derive(Debug)]
pub struct Scanner<T: HciTransport> {
    transport: T,
    command_lock: Mutex<()>,
    decoder: EventDecoder,
    response_timeout: Duration,
}

impl<T: HciTransport> Scanner<T> {
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, &ScannerConfig::default())
    }

    pub fn with_config(transport: T, config: &ScannerConfig) -> Self {
        Self {
            transport,
            command_lock: Mutex::new(()),
            decoder: EventDecoder::new(config.trailing_byte),
            response_timeout: config.response_timeout(),
        }
    }

    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout.max(Duration::from_millis(1));
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    async fn write<C: HciCommand>(&self, command: &C) -> Result<(), ClientError> {
        let frame = command.to_vec()?;
        log::debug!("sending {} ({} bytes)", C::NAME, frame.len());
        if let Err(e) = self.transport.send(&frame).await {
            log::warn!("failed to send {}: {e}", C::NAME);
            return Err(e.into());
        }
        Ok(())
    }

    /// Writes one command without waiting for its completion event.
    pub async fn send_command<C: HciCommand>(&self, command: &C) -> Result<(), ClientError> {
        let _guard = self.command_lock.lock().await;
        self.write(command).await
    }

    /// Writes one command and waits for the matching Command Complete.
    ///
    /// Events that arrive in between are discarded.
    pub async fn execute<C: HciCommand>(&self, command: &C) -> Result<(), ClientError> {
        let _guard = self.command_lock.lock().await;
        self.write(command).await?;
        let deadline = Instant::now() + self.response_timeout;
        loop {
            let event = self.recv_event_until(deadline).await?;
            let Some(cc) = event.packets(PacketKind::CommandComplete).into_iter().next() else {
                continue;
            };
            if cc.first_field("cmd").and_then(|f| f.as_opcode()) != Some(C::OPCODE) {
                continue;
            }
            let status = cc
                .first_field("resp code")
                .and_then(|f| f.as_bytes())
                .and_then(|b| b.first().copied())
                .unwrap_or(0);
            if status != 0 {
                return Err(ClientError::CommandFailed {
                    opcode: C::OPCODE.raw(),
                    status,
                });
            }
            return Ok(());
        }
    }

    /// Sets the scan parameters, then enables scanning.
    pub async fn start_scan(
        &self,
        params: &ScanParameters,
        filter_duplicates: bool,
    ) -> Result<(), ClientError> {
        let _guard = self.command_lock.lock().await;
        self.write(params).await?;
        self.write(&LeSetScanEnable {
            enable: true,
            filter_duplicates,
        })
        .await
    }

    pub async fn stop_scan(&self) -> Result<(), ClientError> {
        self.send_command(&LeSetScanEnable::stop()).await
    }

    /// Disables advertising, sets parameters and data, then re-enables it.
    pub async fn start_advertising(
        &self,
        params: &AdvertisingParameters,
        data: &[u8],
    ) -> Result<(), ClientError> {
        let data = LeSetAdvertisingData::new(data);
        // validate before touching the controller
        data.to_packet()?;
        let _guard = self.command_lock.lock().await;
        self.write(&LeSetAdvertiseEnable { enable: false }).await?;
        self.write(params).await?;
        self.write(&data).await?;
        self.write(&LeSetAdvertiseEnable { enable: true }).await
    }

    pub async fn stop_advertising(&self) -> Result<(), ClientError> {
        self.send_command(&LeSetAdvertiseEnable { enable: false })
            .await
    }

    /// Advertises `frame` as an Eddystone beacon every `interval_ms`.
    pub async fn advertise_eddystone(
        &self,
        frame: &EddystoneFrame,
        interval_ms: f64,
    ) -> Result<(), ClientError> {
        let data = frame.to_advertising_data()?;
        self.start_advertising(&AdvertisingParameters::with_interval(interval_ms), &data)
            .await
    }

    /// Waits for the next event that decodes.
    ///
    /// Undecodable frames are logged and skipped; the whole wait is bounded
    /// by the response timeout.
    pub async fn recv_event(&self) -> Result<Packet, ClientError> {
        self.recv_event_until(Instant::now() + self.response_timeout)
            .await
    }

    async fn recv_event_until(&self, deadline: Instant) -> Result<Packet, ClientError> {
        let mut rx = [0u8; MAX_EVENT_LEN];
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(ClientError::Timeout);
            }
            let n = match timeout(remaining, self.transport.recv(&mut rx)).await {
                Err(_) => return Err(ClientError::Timeout),
                Ok(Err(TransportError::InvalidFrame)) => continue,
                Ok(Err(e)) => return Err(e.into()),
                Ok(Ok(n)) => n,
            };
            match self.decoder.decode_frame(&rx[..n]) {
                Ok(event) => return Ok(event),
                Err(e) => log::debug!("dropping undecodable event ({n} bytes): {e}"),
            }
        }
    }

    /// Waits for the next advertisement one of `kinds` recognizes.
    pub async fn recv_beacon(&self, kinds: &[BeaconKind]) -> Result<BeaconRecord, ClientError> {
        let deadline = Instant::now() + self.response_timeout;
        loop {
            let event = self.recv_event_until(deadline).await?;
            if let Recognition::Matched(record) = recognize_any(&event, kinds) {
                return Ok(record);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blescan_core::hci::AdvertisingType;
    use blescan_datalink::ReplayTransport;

    fn replay_scanner(recording: &'static str) -> Scanner<ReplayTransport<&'static [u8]>> {
        Scanner::new(ReplayTransport::new(recording.as_bytes()))
            .with_response_timeout(Duration::from_secs(1))
    }

    #[tokio::test]
    async fn start_and_stop_scan_write_expected_frames() {
        let scanner = replay_scanner("");
        let params = ScanParameters {
            interval_ms: 100.0,
            window_ms: 50.0,
            ..ScanParameters::default()
        };
        scanner.start_scan(&params, true).await.unwrap();
        scanner.stop_scan().await.unwrap();

        let sent = scanner.transport().sent().await;
        assert_eq!(
            sent,
            vec![
                vec![0x01, 0x0b, 0x20, 0x07, 0x00, 0xa0, 0x00, 0x50, 0x00, 0x00, 0x00],
                vec![0x01, 0x0c, 0x20, 0x02, 0x01, 0x01],
                vec![0x01, 0x0c, 0x20, 0x02, 0x00, 0x00],
            ]
        );
    }

    #[tokio::test]
    async fn advertising_sequence_order() {
        let scanner = replay_scanner("");
        let params = AdvertisingParameters {
            advertising_type: AdvertisingType::AdvNonconnInd,
            ..AdvertisingParameters::with_interval(100.0)
        };
        scanner
            .start_advertising(&params, &[0x02, 0x01, 0x1a])
            .await
            .unwrap();

        let sent = scanner.transport().sent().await;
        let opcodes: Vec<[u8; 2]> = sent.iter().map(|f| [f[1], f[2]]).collect();
        assert_eq!(
            opcodes,
            vec![[0x0a, 0x20], [0x06, 0x20], [0x08, 0x20], [0x0a, 0x20]]
        );
        assert_eq!(sent[0][4], 0x00);
        assert_eq!(sent[3][4], 0x01);
        assert_eq!(&sent[2][4..8], &[0x03, 0x02, 0x01, 0x1a]);
    }

    #[tokio::test]
    async fn oversized_advertising_data_sends_nothing() {
        let scanner = replay_scanner("");
        let err = scanner
            .start_advertising(&AdvertisingParameters::default(), &[0u8; 32])
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Encode(_)));
        assert!(scanner.transport().sent().await.is_empty());
    }

    #[tokio::test]
    async fn eddystone_advertising() {
        let scanner = replay_scanner("");
        let frame = EddystoneFrame::Url {
            tx_power: -10,
            url: "https://makecode.com/#about".to_owned(),
        };
        scanner.advertise_eddystone(&frame, 100.0).await.unwrap();
        let sent = scanner.transport().sent().await;
        assert_eq!(sent.len(), 4);
        assert_eq!(sent[2][4], 29);
    }

    #[tokio::test]
    async fn recv_event_skips_garbage_and_reports_close() {
        let scanner = replay_scanner("04 3e\n04 0e 04 01 0c 20 00\n");
        let event = scanner.recv_event().await.unwrap();
        assert_eq!(event.packets(PacketKind::CommandComplete).len(), 1);
        assert!(matches!(
            scanner.recv_event().await,
            Err(ClientError::Transport(TransportError::Closed))
        ));
    }

    #[tokio::test]
    async fn execute_checks_command_status() {
        let scanner = replay_scanner("04 0e 04 01 0c 20 00\n");
        scanner.execute(&LeSetScanEnable::start()).await.unwrap();

        // a completion for another command, then a failed scan enable
        let scanner = replay_scanner("04 0e 04 01 0b 20 00\n04 0e 04 01 0c 20 0c\n");
        let err = scanner.execute(&LeSetScanEnable::start()).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::CommandFailed {
                opcode: 0x200c,
                status: 0x0c
            }
        ));
    }

    #[tokio::test]
    async fn recv_beacon_skips_unrelated_events() {
        let scanner = replay_scanner(
            "04 0e 04 01 0c 20 00\n\
             04 3e 1d 02 01 00 00 38 52 40 38 c1 a4 11 10 16 1a 18 a4 c1 38 40 52 38 00 f3 25 55 0b 9f de db\n",
        );
        let record = scanner.recv_beacon(&BeaconKind::ALL).await.unwrap();
        assert_eq!(record.kind(), BeaconKind::Atc);
    }
}
