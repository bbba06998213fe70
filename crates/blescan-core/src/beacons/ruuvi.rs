use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;

use crate::beacons::eddystone::{Eddystone, EddystoneFrame};
use crate::beacons::{be_i16, be_u16, manufacturer_data, peer, rssi, Recognition, Recognizer};
use crate::packet::Packet;
use crate::types::MacAddress;

/// Ruuvi Innovations company identifier.
pub const RUUVI_COMPANY_ID: u16 = 0x0499;
pub const FORMAT_RAW_V1: u8 = 0x03;
pub const FORMAT_RAW_V2: u8 = 0x05;

const URL_MARKER: &str = "//ruu.vi/";
const PRESSURE_OFFSET_PA: u32 = 50_000;

/// Standard alphabet, padding optional, lenient about the final symbol.
const URL_PAYLOAD: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Acceleration {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

impl Acceleration {
    fn read(data: &[u8], at: usize) -> Self {
        Self {
            x: be_i16(data, at),
            y: be_i16(data, at + 2),
            z: be_i16(data, at + 4),
        }
    }

    pub fn magnitude(&self) -> f64 {
        let (x, y, z) = (self.x as f64, self.y as f64, self.z as f64);
        (x * x + y * y + z * z).sqrt()
    }
}

/// A Ruuvi weather-station reading.
///
/// The URL formats (2, 3 and 4) carry fewer values than the manufacturer
/// data formats; absent values are `None`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RuuviRecord {
    pub mac: Option<MacAddress>,
    pub rssi: Option<i8>,
    pub format: u8,
    pub temperature: f64,
    /// Relative humidity in percent.
    pub humidity: f64,
    pub pressure_pa: u32,
    pub acceleration: Option<Acceleration>,
    pub battery_mv: Option<u16>,
    pub tx_power: Option<i8>,
    pub movement_counter: Option<u8>,
    pub sequence: Option<u16>,
    /// Tag identifier of URL format 4.
    pub id: Option<u8>,
}

impl RuuviRecord {
    pub fn pressure_hpa(&self) -> f64 {
        self.pressure_pa as f64 / 100.0
    }

    fn base(event: &Packet, format: u8) -> Self {
        Self {
            mac: peer(event),
            rssi: rssi(event),
            format,
            temperature: 0.0,
            humidity: 0.0,
            pressure_pa: 0,
            acceleration: None,
            battery_mv: None,
            tx_power: None,
            movement_counter: None,
            sequence: None,
            id: None,
        }
    }
}

/// Sign-magnitude temperature of the RAWv1 and URL v3 formats: bit 7 of
/// `int` is the sign, `frac` counts hundredths.
pub fn get_temp(int: u8, frac: u8) -> f64 {
    let magnitude = (int & 0x7F) as f64 + frac as f64 / 100.0;
    if int & 0x80 != 0 {
        -magnitude
    } else {
        magnitude
    }
}

/// Recognizer for RuuviTag weather stations, through either an Eddystone
/// URL pointing at `ruu.vi` or Ruuvi manufacturer data.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ruuvi;

impl Recognizer for Ruuvi {
    type Record = RuuviRecord;

    fn recognize(&self, event: &Packet) -> Recognition<RuuviRecord> {
        if let Some(record) = Eddystone.decode(event) {
            if let EddystoneFrame::Url { tx_power, url } = &record.frame {
                if url.contains(URL_MARKER) {
                    return decode_url_payload(event, url).map(|mut r| {
                        r.tx_power = Some(*tx_power);
                        r
                    });
                }
            }
        }
        match manufacturer_data(event)
            .into_iter()
            .find(|(id, _)| *id == RUUVI_COMPANY_ID)
        {
            Some((_, payload)) => decode_manufacturer_payload(event, payload),
            None => Recognition::NotThisFormat,
        }
    }
}

fn decode_url_payload(event: &Packet, url: &str) -> Recognition<RuuviRecord> {
    let mut encoded = url.rsplit("//ruu.vi/#").next().unwrap_or_default();
    if encoded.len() > 8 {
        // the ninth character is a tag id that is not part of the base64 body
        let mut chars = encoded.chars();
        chars.next_back();
        encoded = chars.as_str();
    }
    let normalised: String = encoded
        .chars()
        .map(|c| match c {
            '#' | '-' => '+',
            '.' | '_' => '/',
            c => c,
        })
        .collect();
    let Ok(val) = URL_PAYLOAD.decode(normalised) else {
        return Recognition::Malformed("Ruuvi URL payload is not base64");
    };
    if val.len() < 6 {
        return Recognition::Malformed("Ruuvi URL payload too short");
    }
    let format = val[0];
    let mut record = RuuviRecord::base(event, format);
    record.humidity = val[1] as f64 / 2.0;
    record.pressure_pa = be_u16(&val, 4) as u32 + PRESSURE_OFFSET_PA;
    match format {
        2 | 4 => {
            record.temperature = val[2] as i8 as f64;
            if format == 4 {
                record.id = val.get(6).copied();
            }
        }
        3 => {
            if val.len() < 14 {
                return Recognition::Malformed("Ruuvi URL format 3 payload too short");
            }
            record.temperature = val[2] as i8 as f64 + val[3] as f64 / 100.0;
            record.acceleration = Some(Acceleration::read(&val, 6));
            record.battery_mv = Some(be_u16(&val, 12));
        }
        _ => return Recognition::Malformed("unsupported Ruuvi URL format"),
    }
    Recognition::Matched(record)
}

fn decode_manufacturer_payload(event: &Packet, val: &[u8]) -> Recognition<RuuviRecord> {
    let Some(&format) = val.first() else {
        return Recognition::Malformed("empty Ruuvi manufacturer data");
    };
    let mut record = RuuviRecord::base(event, format);
    match format {
        FORMAT_RAW_V1 => {
            if val.len() < 14 {
                return Recognition::Malformed("Ruuvi RAWv1 payload too short");
            }
            record.humidity = val[1] as f64 / 2.0;
            record.temperature = get_temp(val[2], val[3]);
            record.pressure_pa = be_u16(val, 4) as u32 + PRESSURE_OFFSET_PA;
            record.acceleration = Some(Acceleration::read(val, 6));
            record.battery_mv = Some(be_u16(val, 12));
        }
        FORMAT_RAW_V2 => {
            if val.len() < 18 {
                return Recognition::Malformed("Ruuvi RAWv2 payload too short");
            }
            let power = be_u16(val, 13);
            record.temperature = be_i16(val, 1) as f64 * 0.005;
            record.humidity = be_u16(val, 3) as f64 * 0.0025;
            record.pressure_pa = be_u16(val, 5) as u32 + PRESSURE_OFFSET_PA;
            record.acceleration = Some(Acceleration::read(val, 7));
            record.battery_mv = Some((power >> 5) + 1600);
            record.tx_power = Some(((power & 0x1F) as i16 * 2 - 40) as i8);
            record.movement_counter = Some(val[15]);
            record.sequence = Some(be_u16(val, 16));
        }
        _ => return Recognition::NotThisFormat,
    }
    Recognition::Matched(record)
}
