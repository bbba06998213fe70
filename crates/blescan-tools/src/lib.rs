use blescan_core::adv::TrailingBytePolicy;
use blescan_core::beacons::eddystone::EddystoneFrame;
use blescan_core::beacons::thermobeacon::ThermoBeaconReading;
use blescan_core::beacons::{BeaconKind, BeaconRecord};
use blescan_core::types::MacAddress;
use clap::ValueEnum;
use std::fmt::Write as _;

/// Per-format selection flags shared by the scanning tools.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct FormatArgs {
    /// Look for Eddystone advertisements.
    #[arg(short, long)]
    pub eddy: bool,
    /// Look for Ruuvi tag advertisements.
    #[arg(short, long)]
    pub ruuvi: bool,
    /// Look for ATC_MiThermometer advertisements.
    #[arg(short = 'A', long)]
    pub atcmi: bool,
    /// Look for ThermoBeacon advertisements.
    #[arg(short = 'T', long)]
    pub thermobeacon: bool,
    #[arg(long)]
    pub tilt: bool,
    #[arg(long)]
    pub bluemaestro: bool,
}

impl FormatArgs {
    /// The selected formats, in recognition order. Empty when no flag is set.
    pub fn kinds(&self) -> Vec<BeaconKind> {
        let selected = [
            (self.eddy, BeaconKind::Eddystone),
            (self.ruuvi, BeaconKind::Ruuvi),
            (self.atcmi, BeaconKind::Atc),
            (self.thermobeacon, BeaconKind::ThermoBeacon),
            (self.tilt, BeaconKind::Tilt),
            (self.bluemaestro, BeaconKind::BlueMaestro),
        ];
        selected
            .into_iter()
            .filter_map(|(on, kind)| on.then_some(kind))
            .collect()
    }
}

/// CLI-friendly form of [`TrailingBytePolicy`].
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum TrailingByteArg {
    #[default]
    Rssi,
    Opaque,
}

impl TrailingByteArg {
    pub const fn into_policy(self) -> TrailingBytePolicy {
        match self {
            Self::Rssi => TrailingBytePolicy::Rssi,
            Self::Opaque => TrailingBytePolicy::Opaque,
        }
    }
}

/// Lowercase, space-separated octets, the format replay files use.
pub fn hex_line(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{b:02x}");
    }
    out
}

fn who(mac: Option<MacAddress>, rssi: Option<i8>) -> String {
    let mut out = mac.map_or_else(|| "??:??:??:??:??:??".to_owned(), |m| m.to_string());
    if let Some(rssi) = rssi {
        let _ = write!(out, " {rssi} dBm");
    }
    out
}

/// One human-readable line describing a recognized beacon.
pub fn summary(record: &BeaconRecord) -> String {
    match record {
        BeaconRecord::Eddystone(r) => {
            let detail = match &r.frame {
                EddystoneFrame::Url { tx_power, url } => format!("url {url} tx {tx_power} dBm"),
                EddystoneFrame::Uid {
                    tx_power,
                    namespace,
                    instance,
                } => format!(
                    "uid {}/{} tx {tx_power} dBm",
                    hex::encode(namespace),
                    hex::encode(instance)
                ),
                EddystoneFrame::Tlm {
                    battery_mv,
                    temperature,
                    pdu_count,
                    uptime_ms,
                    ..
                } => format!(
                    "tlm {battery_mv} mV {temperature:.2} C pdus {pdu_count} up {}s",
                    uptime_ms / 1000
                ),
                EddystoneFrame::Eid {
                    tx_power,
                    ephemeral_id,
                } => format!("eid {} tx {tx_power} dBm", hex::encode(ephemeral_id)),
                EddystoneFrame::Unknown { frame_type, data } => {
                    format!("frame 0x{frame_type:02x} {}", hex::encode(data))
                }
            };
            format!("eddystone {} {detail}", who(r.mac, r.rssi))
        }
        BeaconRecord::Ruuvi(r) => {
            let mut line = format!(
                "ruuvi {} v{} {:.2} C {:.2} % {:.2} hPa",
                who(r.mac, r.rssi),
                r.format,
                r.temperature,
                r.humidity,
                r.pressure_hpa()
            );
            if let Some(mv) = r.battery_mv {
                let _ = write!(line, " {mv} mV");
            }
            line
        }
        BeaconRecord::Atc(r) => format!(
            "atc {} {:.1} C {} % battery {} % {} mV",
            who(Some(r.mac), r.rssi),
            r.temperature,
            r.humidity,
            r.battery_percent,
            r.battery_mv
        ),
        BeaconRecord::ThermoBeacon(r) => {
            let detail = match &r.reading {
                ThermoBeaconReading::Current {
                    battery_mv,
                    temperature,
                    humidity,
                    counter,
                } => format!("{temperature:.2} C {humidity:.2} % {battery_mv} mV up {counter}s"),
                ThermoBeaconReading::Extremes {
                    max_temperature,
                    min_temperature,
                    ..
                } => format!("max {max_temperature:.2} C min {min_temperature:.2} C"),
            };
            format!("thermobeacon {} {detail}", who(Some(r.mac), r.rssi))
        }
        BeaconRecord::Tilt(r) => format!(
            "tilt {} {} {:.1} C sg {:.3}",
            who(r.mac, r.rssi),
            r.colour,
            r.temperature_celsius(),
            r.specific_gravity()
        ),
        BeaconRecord::BlueMaestro(r) => format!(
            "bluemaestro {} {:.1} C {:.1} % dew {:.1} C battery {} %",
            who(r.mac, r.rssi),
            r.temperature,
            r.humidity,
            r.dew_point,
            r.battery_percent
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blescan_core::beacons::atc::AtcRecord;
    use blescan_core::beacons::eddystone::EddystoneRecord;

    #[test]
    fn no_flags_selects_nothing() {
        assert!(FormatArgs::default().kinds().is_empty());
        let args = FormatArgs {
            tilt: true,
            eddy: true,
            ..FormatArgs::default()
        };
        assert_eq!(args.kinds(), vec![BeaconKind::Eddystone, BeaconKind::Tilt]);
    }

    #[test]
    fn hex_line_format() {
        assert_eq!(hex_line(&[0x01, 0x0c, 0x20]), "01 0c 20");
        assert_eq!(hex_line(&[]), "");
    }

    #[test]
    fn summaries() {
        let atc = BeaconRecord::Atc(AtcRecord {
            mac: "a4:c1:38:40:52:38".parse().unwrap(),
            rssi: Some(-37),
            temperature: 24.3,
            humidity: 37,
            battery_percent: 85,
            battery_mv: 2975,
            counter: 222,
        });
        assert_eq!(
            summary(&atc),
            "atc a4:c1:38:40:52:38 -37 dBm 24.3 C 37 % battery 85 % 2975 mV"
        );

        let eddy = BeaconRecord::Eddystone(EddystoneRecord {
            mac: None,
            rssi: None,
            frame: EddystoneFrame::Url {
                tx_power: -10,
                url: "https://makecode.com/#about".to_owned(),
            },
        });
        assert_eq!(
            summary(&eddy),
            "eddystone ??:??:??:??:??:?? url https://makecode.com/#about tx -10 dBm"
        );
    }
}
