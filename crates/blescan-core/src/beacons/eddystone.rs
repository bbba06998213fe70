use crate::beacons::{node_bytes, peer, rssi, Recognition, Recognizer};
use crate::encoding::reader::Reader;
use crate::field::{fixed88_to_f64, Endian, Field, FieldValue};
use crate::packet::{Node, Packet, PacketKind};
use crate::types::{MacAddress, Uuid};
use crate::EncodeError;

pub const FRAME_UID: u8 = 0x00;
pub const FRAME_URL: u8 = 0x10;
pub const FRAME_TLM: u8 = 0x20;
pub const FRAME_EID: u8 = 0x30;

/// Longest compressed URL (scheme byte included) a frame can carry.
pub const MAX_ENCODED_URL_LEN: usize = 18;

const FRAME_LABELS: &[(u8, &str)] = &[
    (FRAME_UID, "Eddystone-UID"),
    (FRAME_URL, "Eddystone-URL"),
    (FRAME_TLM, "Eddystone-TLM"),
    (FRAME_EID, "Eddystone-EID"),
];

const URL_SCHEMES: [&str; 4] = ["http://www.", "https://www.", "http://", "https://"];
const SCHEME_LABELS: &[(u8, &str)] = &[
    (0, URL_SCHEMES[0]),
    (1, URL_SCHEMES[1]),
    (2, URL_SCHEMES[2]),
    (3, URL_SCHEMES[3]),
];

/// Expansion of URL bytes `0x00..=0x0D`.
const URL_EXPANSIONS: [&str; 14] = [
    ".com/", ".org/", ".edu/", ".net/", ".info/", ".biz/", ".gov/", ".com", ".org", ".edu", ".net",
    ".info", ".biz", ".gov",
];

/// One decoded Eddystone frame.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum EddystoneFrame {
    Uid {
        tx_power: i8,
        namespace: [u8; 10],
        instance: [u8; 6],
    },
    Url {
        tx_power: i8,
        url: String,
    },
    Tlm {
        version: u8,
        battery_mv: u16,
        temperature: f64,
        pdu_count: u32,
        /// Time since power-up in milliseconds (the frame counts 100 ms ticks).
        uptime_ms: u64,
    },
    Eid {
        tx_power: i8,
        ephemeral_id: [u8; 8],
    },
    Unknown {
        frame_type: u8,
        data: Vec<u8>,
    },
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EddystoneRecord {
    pub mac: Option<MacAddress>,
    pub rssi: Option<i8>,
    pub frame: EddystoneFrame,
}

impl EddystoneRecord {
    pub fn tx_power(&self) -> Option<i8> {
        match &self.frame {
            EddystoneFrame::Uid { tx_power, .. }
            | EddystoneFrame::Url { tx_power, .. }
            | EddystoneFrame::Eid { tx_power, .. } => Some(*tx_power),
            _ => None,
        }
    }

    pub fn url(&self) -> Option<&str> {
        match &self.frame {
            EddystoneFrame::Url { url, .. } => Some(url),
            _ => None,
        }
    }
}

/// Recognizer for Google Eddystone beacons (service UUID `fe:aa`).
#[derive(Debug, Clone, Copy, Default)]
pub struct Eddystone;

impl Recognizer for Eddystone {
    type Record = EddystoneRecord;

    fn recognize(&self, event: &Packet) -> Recognition<EddystoneRecord> {
        if !advertises_eddystone(event) {
            return Recognition::NotThisFormat;
        }
        let Some(chunk) = event
            .packets_named("Advertised Data")
            .into_iter()
            .find(|p| is_eddystone_service_data(p))
        else {
            return Recognition::NotThisFormat;
        };
        let Some(payload) = chunk
            .query("Adv Payload")
            .into_iter()
            .next()
            .and_then(node_bytes)
        else {
            return Recognition::Malformed("Eddystone service data without a frame");
        };
        match EddystoneFrame::parse(&payload) {
            Ok(frame) => Recognition::Matched(EddystoneRecord {
                mac: peer(event),
                rssi: rssi(event),
                frame,
            }),
            Err(reason) => Recognition::Malformed(reason),
        }
    }
}

fn advertises_eddystone(event: &Packet) -> bool {
    event.fields("Complete uuids").into_iter().any(|f| {
        f.as_uuid_list()
            .is_some_and(|items| items.iter().any(|u| u.is_u16(Uuid::EDDYSTONE)))
    })
}

fn is_eddystone_service_data(chunk: &Packet) -> bool {
    chunk
        .first_field("Service Data uuid")
        .and_then(|f| f.as_uuid())
        .is_some_and(|u| u.is_u16(Uuid::EDDYSTONE))
}

/// Replaces the opaque `"Adv Payload"` of the Eddystone service data with a
/// typed `"Adv Payload"` packet (frame type, tx power, URL and so on).
///
/// The swap is a single node replacement; re-encoding the tree still yields
/// the original bytes. Calling it on an already expanded tree is a no-op that
/// reports the frame again.
pub fn expand_eddystone(event: &mut Packet) -> Recognition<EddystoneFrame> {
    if !advertises_eddystone(event) {
        return Recognition::NotThisFormat;
    }
    let Some(chunk) = event.find_packet_mut(&|p: &Packet| {
        p.name() == "Advertised Data" && is_eddystone_service_data(p)
    }) else {
        return Recognition::NotThisFormat;
    };
    let Some(index) = chunk.position("Adv Payload") else {
        return Recognition::Malformed("Eddystone service data without a frame");
    };
    let data = match &chunk.children()[index] {
        Node::Field(field) => match field.as_bytes() {
            Some(data) => data.to_vec(),
            None => return Recognition::Malformed("Eddystone frame is not raw bytes"),
        },
        Node::Packet(expanded) => {
            return match expanded.to_vec() {
                Ok(bytes) => match EddystoneFrame::parse(&bytes) {
                    Ok(frame) => Recognition::Matched(frame),
                    Err(reason) => Recognition::Malformed(reason),
                },
                Err(_) => Recognition::Malformed("expanded Eddystone frame does not encode"),
            };
        }
    };
    let frame = match EddystoneFrame::parse(&data) {
        Ok(frame) => frame,
        Err(reason) => return Recognition::Malformed(reason),
    };
    match frame_tree(&data, &frame) {
        Some(tree) => {
            chunk.replace(index, tree);
            Recognition::Matched(frame)
        }
        None => Recognition::Malformed("Eddystone frame does not fit its layout"),
    }
}

/// Lays `data` out as named fields matching `frame`.
fn frame_tree(data: &[u8], frame: &EddystoneFrame) -> Option<Packet> {
    let mut tree = Packet::new("Adv Payload", PacketKind::Eddystone)
        .with_child(Field::enumerated("type", 0, FRAME_LABELS));
    let extra: Option<Field> = match frame {
        EddystoneFrame::Uid { .. } => {
            tree.push(Field::i8("tx_power", 0));
            tree.push(Field::fixed_bytes("namespace", 10));
            tree.push(Field::fixed_bytes("instance", 6));
            None
        }
        EddystoneFrame::Url { url, .. } => {
            tree.push(Field::i8("tx_power", 0));
            tree.push(Field::enumerated("scheme", 0, SCHEME_LABELS));
            tree.push(Field::bytes("encoded url", Vec::new()));
            Some(Field::derived("url", url.clone()))
        }
        EddystoneFrame::Tlm { uptime_ms, .. } => {
            tree.push(Field::u8("version", 0));
            tree.push(Field::u16("battery", 0, Endian::Big));
            tree.push(Field::fixed88("temperature", 0));
            tree.push(Field::u32("pdu count", 0, Endian::Big));
            tree.push(Field::u32("uptime", 0, Endian::Big));
            Some(Field::derived("uptime ms", uptime_ms.to_string()))
        }
        EddystoneFrame::Eid { .. } => {
            tree.push(Field::i8("tx_power", 0));
            tree.push(Field::fixed_bytes("ephemeral id", 8));
            None
        }
        EddystoneFrame::Unknown { .. } => {
            tree.push(Field::bytes("data", Vec::new()));
            None
        }
    };
    let mut r = Reader::new(data);
    tree.decode(&mut r).ok()?;
    if !r.is_empty() {
        tree.push(Field::bytes("trailing", r.read_rest()));
    }
    if let Some(field) = extra {
        tree.push(field);
    }
    Some(tree)
}

impl EddystoneFrame {
    /// Parses a frame from the service-data payload (after the UUID).
    pub fn parse(data: &[u8]) -> Result<Self, &'static str> {
        let (&frame_type, body) = data.split_first().ok_or("empty Eddystone frame")?;
        match frame_type {
            FRAME_UID => {
                if body.len() < 17 {
                    return Err("Eddystone-UID frame too short");
                }
                let mut namespace = [0u8; 10];
                namespace.copy_from_slice(&body[1..11]);
                let mut instance = [0u8; 6];
                instance.copy_from_slice(&body[11..17]);
                Ok(Self::Uid {
                    tx_power: body[0] as i8,
                    namespace,
                    instance,
                })
            }
            FRAME_URL => {
                if body.len() < 2 {
                    return Err("Eddystone-URL frame too short");
                }
                let url = decode_url(&body[1..]).ok_or("unknown Eddystone-URL scheme")?;
                Ok(Self::Url {
                    tx_power: body[0] as i8,
                    url,
                })
            }
            FRAME_TLM => {
                if body.len() < 13 {
                    return Err("Eddystone-TLM frame too short");
                }
                let mut r = Reader::new(body);
                let parsed = (|| {
                    Ok::<_, crate::DecodeError>(Self::Tlm {
                        version: r.read_u8()?,
                        battery_mv: r.read_u16(Endian::Big)?,
                        temperature: fixed88_to_f64(r.read_u16(Endian::Big)? as i16),
                        pdu_count: r.read_u32(Endian::Big)?,
                        uptime_ms: u64::from(r.read_u32(Endian::Big)?) * 100,
                    })
                })();
                parsed.map_err(|_| "Eddystone-TLM frame too short")
            }
            FRAME_EID => {
                if body.len() < 9 {
                    return Err("Eddystone-EID frame too short");
                }
                let mut ephemeral_id = [0u8; 8];
                ephemeral_id.copy_from_slice(&body[1..9]);
                Ok(Self::Eid {
                    tx_power: body[0] as i8,
                    ephemeral_id,
                })
            }
            other => Ok(Self::Unknown {
                frame_type: other,
                data: body.to_vec(),
            }),
        }
    }

    pub fn frame_type(&self) -> u8 {
        match self {
            Self::Uid { .. } => FRAME_UID,
            Self::Url { .. } => FRAME_URL,
            Self::Tlm { .. } => FRAME_TLM,
            Self::Eid { .. } => FRAME_EID,
            Self::Unknown { frame_type, .. } => *frame_type,
        }
    }

    /// Frame bytes as carried after the service-data UUID.
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        let mut out = vec![self.frame_type()];
        match self {
            Self::Uid {
                tx_power,
                namespace,
                instance,
            } => {
                out.push(*tx_power as u8);
                out.extend_from_slice(namespace);
                out.extend_from_slice(instance);
                // reserved for future use
                out.extend_from_slice(&[0, 0]);
            }
            Self::Url { tx_power, url } => {
                out.push(*tx_power as u8);
                out.extend(encode_url(url)?);
            }
            Self::Tlm {
                version,
                battery_mv,
                temperature,
                pdu_count,
                uptime_ms,
            } => {
                let raw = (temperature * 256.0).round();
                if !(i16::MIN as f64..=i16::MAX as f64).contains(&raw) {
                    return Err(EncodeError::ValueOutOfRange);
                }
                let ticks =
                    u32::try_from(uptime_ms / 100).map_err(|_| EncodeError::ValueOutOfRange)?;
                out.push(*version);
                out.extend_from_slice(&battery_mv.to_be_bytes());
                out.extend_from_slice(&(raw as i16).to_be_bytes());
                out.extend_from_slice(&pdu_count.to_be_bytes());
                out.extend_from_slice(&ticks.to_be_bytes());
            }
            Self::Eid {
                tx_power,
                ephemeral_id,
            } => {
                out.push(*tx_power as u8);
                out.extend_from_slice(ephemeral_id);
            }
            Self::Unknown { data, .. } => out.extend_from_slice(data),
        }
        Ok(out)
    }

    /// Complete advertising data announcing this frame: flags, the Eddystone
    /// UUID list and the service data, ready for `LE Set Advertising Data`.
    pub fn to_advertising_data(&self) -> Result<Vec<u8>, EncodeError> {
        let frame = self.encode()?;
        let wire_uuid = Uuid::from_u16(Uuid::EDDYSTONE).to_wire();
        let service_len =
            u8::try_from(1 + wire_uuid.len() + frame.len()).map_err(|_| EncodeError::InvalidLength)?;
        let mut data = vec![0x02, 0x01, 0x1a, 0x03, 0x03];
        data.extend_from_slice(&wire_uuid);
        data.push(service_len);
        data.push(0x16);
        data.extend_from_slice(&wire_uuid);
        data.extend(frame);
        if data.len() > crate::hci::command::MAX_ADVERTISING_DATA_LEN {
            return Err(EncodeError::InvalidLength);
        }
        Ok(data)
    }
}

/// Expands a compressed URL: scheme byte, then text with `0x00..=0x0D`
/// standing for common domain suffixes.
pub fn decode_url(data: &[u8]) -> Option<String> {
    let (&scheme, rest) = data.split_first()?;
    let mut url = String::from(*URL_SCHEMES.get(scheme as usize)?);
    for &b in rest {
        match URL_EXPANSIONS.get(b as usize) {
            Some(expansion) => url.push_str(expansion),
            None => url.push(char::from(b)),
        }
    }
    Some(url)
}

/// Compresses `url` into a scheme byte followed by the encoded remainder.
///
/// Fails when no scheme prefix applies, when the URL holds bytes that
/// cannot be sent literally, or when the result exceeds 18 bytes.
pub fn encode_url(url: &str) -> Result<Vec<u8>, EncodeError> {
    let (scheme, rest) = URL_SCHEMES
        .iter()
        .enumerate()
        .find_map(|(code, prefix)| url.strip_prefix(prefix).map(|rest| (code as u8, rest)))
        .ok_or(EncodeError::InvalidUrl("scheme must be http or https"))?;
    let mut out = vec![scheme];
    let mut rest = rest.as_bytes();
    while let Some((&b, tail)) = rest.split_first() {
        if let Some((code, expansion)) = URL_EXPANSIONS
            .iter()
            .enumerate()
            .find(|(_, e)| rest.starts_with(e.as_bytes()))
        {
            out.push(code as u8);
            rest = &rest[expansion.len()..];
            continue;
        }
        if !(0x21..0x7f).contains(&b) {
            return Err(EncodeError::InvalidUrl("contains bytes that cannot be sent"));
        }
        out.push(b);
        rest = tail;
    }
    if out.len() > MAX_ENCODED_URL_LEN {
        return Err(EncodeError::InvalidUrl("encoded form exceeds 18 bytes"));
    }
    Ok(out)
}

/// Current value of an expanded frame's field, for display callers.
pub fn expanded_url(event: &Packet) -> Option<&str> {
    event
        .fields("url")
        .into_iter()
        .find(|f| matches!(f.value(), FieldValue::Derived(_)))
        .and_then(|f| f.as_str())
}
