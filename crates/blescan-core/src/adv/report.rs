use std::borrow::Cow;

use crate::adv::eir::{EirType, EIR_TYPE_LABELS, FLAG_LABELS};
use crate::encoding::reader::Reader;
use crate::field::{Endian, Field};
use crate::packet::{Node, Packet, PacketKind, Truncation};
use crate::types::MacAddress;
use crate::DecodeError;

pub const EVENT_TYPE_LABELS: &[(u8, &str)] =
    &[(0, "generic adv"), (3, "no connection adv"), (4, "scan rsp")];
pub const ADDRESS_TYPE_LABELS: &[(u8, &str)] = &[(0, "public"), (1, "random")];

/// What to do with a single byte left over after the last EIR chunk.
///
/// Controllers append the RSSI there, but nothing in the report marks it as
/// such, so the interpretation is a choice the caller makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TrailingBytePolicy {
    /// Decode it as a signed `"rssi"` field.
    #[default]
    Rssi,
    /// Keep it as an opaque `"trailing"` field.
    Opaque,
}

/// Decodes one advertising report, consuming all of `r`.
///
/// Fails only when the fixed leading fields are short; a chunk whose length
/// overruns the buffer stops the walk and is recorded as a [`Truncation`].
pub fn decode_advertising_report(
    r: &mut Reader<'_>,
    policy: TrailingBytePolicy,
) -> Result<Packet, DecodeError> {
    let mut fixed = Packet::new("Adv Report", PacketKind::AdvertisingReport)
        .with_child(Field::u8("num reports", 0))
        .with_child(Field::enumerated("ev type", 0, EVENT_TYPE_LABELS))
        .with_child(Field::enumerated("addr type", 0, ADDRESS_TYPE_LABELS))
        .with_child(Field::mac("peer", MacAddress::default()))
        .with_child(Field::u8("length", 0));
    let mut body = *r;
    fixed.decode(&mut body)?;
    let mut report = fixed;
    let start = body.position();

    while body.remaining() > 1 {
        let declared = body.peek_u8()? as usize;
        let available = body.remaining() - 1;
        if declared == 0 || declared > available {
            let truncation = Truncation {
                offset: body.position() - start,
                declared,
                available,
            };
            log::debug!(
                "advertising report truncated at offset {}: chunk declares {} bytes, {} available",
                truncation.offset,
                declared,
                available
            );
            report.set_truncation(truncation);
            report.push(Field::bytes("truncated", body.read_rest()));
            *r = body;
            return Ok(report);
        }
        let mut chunk = body.sub_reader(1 + declared)?;
        report.push(decode_chunk(&mut chunk)?);
    }

    if !body.is_empty() {
        let node = match policy {
            TrailingBytePolicy::Rssi => Field::i8("rssi", body.read_i8()?),
            TrailingBytePolicy::Opaque => Field::bytes("trailing", body.read_rest()),
        };
        report.push(node);
    }
    *r = body;
    Ok(report)
}

fn chunk_name(eir: EirType) -> Cow<'static, str> {
    match eir {
        EirType::ServiceData16 | EirType::ServiceData32 | EirType::ServiceData128 => {
            Cow::Borrowed("Advertised Data")
        }
        EirType::ManufacturerData => Cow::Borrowed("Manufacturer Specific Data"),
        other => match other.label() {
            Some(label) => Cow::Borrowed(label),
            None => Cow::Owned(format!("eir 0x{:02x}", other.to_u8())),
        },
    }
}

fn opaque_name(eir: EirType) -> String {
    match eir.label() {
        Some(label) => format!("Payload for {label}"),
        None => format!("Payload for {}", eir.to_u8()),
    }
}

/// Decodes `sublen`, `type` and the typed body of one chunk.
///
/// The body decoder sees exactly the chunk's payload. If it rejects the
/// payload the chunk keeps it opaque; bytes it leaves unread become a
/// `"trailing"` field so the chunk re-encodes to its input.
fn decode_chunk(r: &mut Reader<'_>) -> Result<Packet, DecodeError> {
    let sublen = r.read_u8()?;
    let tag = r.read_u8()?;
    let eir = EirType::from_u8(tag);
    let payload = r.read_rest();

    let mut chunk = Packet::new(chunk_name(eir), PacketKind::Eir(eir))
        .with_child(Field::u8("sublen", sublen))
        .with_child(Field::enumerated("type", tag, EIR_TYPE_LABELS));

    let mut body = Reader::new(payload);
    match decode_chunk_body(eir, &mut body) {
        Ok(nodes) => {
            for node in nodes {
                chunk.push(node);
            }
            if !body.is_empty() {
                chunk.push(Field::bytes("trailing", body.read_rest()));
            }
        }
        Err(err) => {
            log::debug!(
                "keeping EIR chunk 0x{tag:02x} opaque: {err} ({} payload bytes)",
                payload.len()
            );
            chunk.push(Field::bytes(opaque_name(eir), payload));
        }
    }
    Ok(chunk)
}

fn decode_field(mut template: Field, r: &mut Reader<'_>) -> Result<Node, DecodeError> {
    template.decode(r)?;
    Ok(template.into())
}

fn decode_chunk_body(eir: EirType, r: &mut Reader<'_>) -> Result<Vec<Node>, DecodeError> {
    let width = eir.uuid_width().unwrap_or(2);
    let nodes = match eir {
        EirType::Flags => vec![decode_field(Field::bit_field("flags", 0, FLAG_LABELS), r)?],
        EirType::IncompleteUuids16 | EirType::IncompleteUuids32 | EirType::IncompleteUuids128 => {
            vec![decode_field(Field::uuid_list("Incomplete uuids", width), r)?]
        }
        EirType::CompleteUuids16 | EirType::CompleteUuids32 | EirType::CompleteUuids128 => {
            vec![decode_field(Field::uuid_list("Complete uuids", width), r)?]
        }
        EirType::Solicitation16 | EirType::Solicitation32 | EirType::Solicitation128 => {
            vec![decode_field(Field::uuid_list("Service Solicitation uuid", width), r)?]
        }
        EirType::ServiceData16 | EirType::ServiceData32 | EirType::ServiceData128 => {
            let mut nodes = vec![decode_field(Field::uuid("Service Data uuid", width), r)?];
            if !r.is_empty() {
                nodes.push(Field::bytes("Adv Payload", r.read_rest()).into());
            }
            nodes
        }
        EirType::ShortName => vec![Field::text("Short Name", r.read_rest()).into()],
        EirType::CompleteName => vec![Field::text("Complete Name", r.read_rest()).into()],
        EirType::ManufacturerData => {
            let mut nodes = vec![decode_field(
                Field::u16("Manufacturer ID", 0, Endian::Little),
                r,
            )?];
            if !r.is_empty() {
                nodes.push(Field::bytes("Payload", r.read_rest()).into());
            }
            nodes
        }
        EirType::Other(tag) => {
            log::trace!("no decoder for EIR type 0x{tag:02x}");
            vec![Field::bytes(opaque_name(eir), r.read_rest()).into()]
        }
    };
    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use super::{decode_advertising_report, TrailingBytePolicy};
    use crate::adv::eir::EirType;
    use crate::encoding::reader::Reader;
    use crate::field::FieldKind;
    use crate::packet::{PacketKind, Truncation};
    use proptest::prelude::*;

    const HEAD: [u8; 10] = [0x01, 0x00, 0x00, 0x38, 0x52, 0x40, 0x38, 0xc1, 0xa4, 0x00];

    fn report(chunks: &[u8], tail: &[u8]) -> Vec<u8> {
        let mut out = HEAD.to_vec();
        out[9] = chunks.len() as u8;
        out.extend_from_slice(chunks);
        out.extend_from_slice(tail);
        out
    }

    #[test]
    fn decodes_fixed_fields_chunks_and_rssi() {
        let bytes = report(
            &[
                0x02, 0x01, 0x06, 0x03, 0x03, 0xaa, 0xfe, 0x05, 0x09, b'a', b'b', b'c', b'd',
            ],
            &[0xdb],
        );
        let mut r = Reader::new(&bytes);
        let p = decode_advertising_report(&mut r, TrailingBytePolicy::Rssi).unwrap();
        assert!(r.is_empty());
        assert_eq!(
            p.first_field("peer").unwrap().value_string(),
            "a4:c1:38:40:52:38"
        );
        assert_eq!(p.first_field("rssi").unwrap().as_i32(), Some(-37));
        assert_eq!(p.first_field("Complete Name").unwrap().as_str(), Some("abcd"));
        assert_eq!(
            p.first_field("flags").unwrap().value_string(),
            "BR/EDR Not Supported, LE General Disc."
        );
        let uuids = p.first_field("Complete uuids").unwrap().as_uuid_list().unwrap();
        assert!(uuids[0].is_u16(0xfeaa));
        assert_eq!(p.packets(PacketKind::Eir(EirType::CompleteName)).len(), 1);
        assert_eq!(p.truncation(), None);
        assert_eq!(p.to_vec().unwrap(), bytes);
    }

    #[test]
    fn decodes_wide_uuid_solicitation_and_short_name_chunks() {
        let mut chunks = vec![0x05, 0x1f, 0x78, 0x56, 0x34, 0x12];
        chunks.extend([0x13, 0x21]);
        chunks.extend(1..=16u8);
        chunks.extend([0xaa, 0xbb]);
        chunks.extend([0x03, 0x08, b'h', b'i']);
        chunks.extend([0x05, 0x05, 0x01, 0x02, 0x03, 0x04]);
        chunks.extend([0x05, 0x04, 0x0d, 0x0c, 0x0b, 0x0a]);
        chunks.extend([0x03, 0x14, 0x0f, 0x18]);
        let bytes = report(&chunks, &[0xc0]);
        let p = decode_advertising_report(&mut Reader::new(&bytes), TrailingBytePolicy::Rssi)
            .unwrap();

        assert_eq!(
            p.first_field("Service Solicitation uuid").unwrap().value_string(),
            "12:34:56:78"
        );
        assert_eq!(
            p.last_field("Service Solicitation uuid").unwrap().value_string(),
            "18:0f"
        );
        let uuid = p.first_field("Service Data uuid").unwrap().as_uuid().unwrap();
        assert_eq!(uuid.as_bytes().len(), 16);
        assert_eq!(
            uuid.to_string(),
            "10:0f:0e:0d:0c:0b:0a:09:08:07:06:05:04:03:02:01"
        );
        assert_eq!(
            p.first_field("Adv Payload").unwrap().as_bytes(),
            Some(&[0xaa, 0xbb][..])
        );
        assert_eq!(p.first_field("Short Name").unwrap().as_str(), Some("hi"));
        assert_eq!(
            p.first_field("Complete uuids").unwrap().value_string(),
            "04:03:02:01"
        );
        assert_eq!(
            p.first_field("Incomplete uuids").unwrap().value_string(),
            "0a:0b:0c:0d"
        );
        assert_eq!(p.packets(PacketKind::Eir(EirType::ServiceData128)).len(), 1);
        assert_eq!(p.packets(PacketKind::Eir(EirType::Solicitation32)).len(), 1);
        assert_eq!(p.first_field("rssi").unwrap().as_i32(), Some(-64));
        assert_eq!(p.truncation(), None);
        assert_eq!(p.to_vec().unwrap(), bytes);
    }

    #[test]
    fn opaque_policy_keeps_trailing_byte() {
        let bytes = report(&[0x02, 0x01, 0x06], &[0xdb]);
        let p = decode_advertising_report(&mut Reader::new(&bytes), TrailingBytePolicy::Opaque)
            .unwrap();
        assert!(p.first_field("rssi").is_none());
        assert_eq!(p.first_field("trailing").unwrap().as_bytes(), Some(&[0xdb][..]));
    }

    #[test]
    fn chunk_length_overrun_is_truncation() {
        let bytes = report(&[0x02, 0x01, 0x06, 0x09, 0xff, 0x01, 0x02], &[]);
        let p = decode_advertising_report(&mut Reader::new(&bytes), TrailingBytePolicy::Rssi)
            .unwrap();
        assert_eq!(
            p.truncation(),
            Some(Truncation {
                offset: 3,
                declared: 9,
                available: 3
            })
        );
        assert_eq!(
            p.first_field("truncated").unwrap().as_bytes(),
            Some(&[0x09, 0xff, 0x01, 0x02][..])
        );
        assert!(p.first_field("flags").is_some());
        assert!(p.first_field("rssi").is_none());
        assert_eq!(p.to_vec().unwrap(), bytes);
    }

    #[test]
    fn zero_length_chunk_is_truncation() {
        let bytes = report(&[0x00, 0x01, 0x06], &[]);
        let p = decode_advertising_report(&mut Reader::new(&bytes), TrailingBytePolicy::Rssi)
            .unwrap();
        assert_eq!(p.truncation().map(|t| t.declared), Some(0));
    }

    #[test]
    fn rejected_chunk_body_stays_opaque() {
        // three bytes cannot hold 16-bit UUIDs
        let bytes = report(&[0x04, 0x03, 0xaa, 0xfe, 0x01], &[0xc0]);
        let p = decode_advertising_report(&mut Reader::new(&bytes), TrailingBytePolicy::Rssi)
            .unwrap();
        assert!(p.first_field("Complete uuids").is_none());
        assert_eq!(
            p.first_field("Payload for complete_list_16_bit_svc_uuids")
                .unwrap()
                .as_bytes(),
            Some(&[0xaa, 0xfe, 0x01][..])
        );
        assert_eq!(p.first_field("rssi").unwrap().as_i32(), Some(-64));
    }

    #[test]
    fn unknown_tag_and_manufacturer_data() {
        let bytes = report(
            &[0x02, 0x0a, 0xf4, 0x02, 0x42, 0x07, 0x05, 0xff, 0x33, 0x01, 0xaa, 0xbb],
            &[],
        );
        let p = decode_advertising_report(&mut Reader::new(&bytes), TrailingBytePolicy::Rssi)
            .unwrap();
        assert_eq!(
            p.first_field("Payload for tx_power_level").unwrap().as_bytes(),
            Some(&[0xf4][..])
        );
        assert!(p.first_field("Payload for 66").is_some());
        let mfg = &p.packets_named("Manufacturer Specific Data")[0];
        assert_eq!(mfg.first_field("Manufacturer ID").unwrap().as_u32(), Some(0x0133));
        assert_eq!(mfg.first_field("Payload").unwrap().as_bytes(), Some(&[0xaa, 0xbb][..]));
    }

    #[test]
    fn flags_extra_bytes_are_kept_as_trailing() {
        let bytes = report(&[0x03, 0x01, 0x06, 0x99], &[]);
        let p = decode_advertising_report(&mut Reader::new(&bytes), TrailingBytePolicy::Rssi)
            .unwrap();
        assert_eq!(p.first_field("trailing").unwrap().as_bytes(), Some(&[0x99][..]));
        assert_eq!(p.to_vec().unwrap(), bytes);
    }

    #[test]
    fn short_fixed_fields_fail_without_consuming() {
        let bytes = [0x01, 0x00, 0x00, 0x38];
        let mut r = Reader::new(&bytes);
        assert!(decode_advertising_report(&mut r, TrailingBytePolicy::Rssi).is_err());
        assert_eq!(r.position(), 0);
    }

    fn chunk_strategy() -> impl Strategy<Value = Vec<u8>> {
        (any::<u8>(), proptest::collection::vec(any::<u8>(), 0..12)).prop_map(|(tag, payload)| {
            let mut chunk = vec![payload.len() as u8 + 1, tag];
            chunk.extend(payload);
            chunk
        })
    }

    proptest! {
        #[test]
        fn well_formed_reports_reencode_exactly(
            chunks in proptest::collection::vec(chunk_strategy(), 0..5),
            rssi in proptest::option::of(any::<u8>()),
        ) {
            let flat: Vec<u8> = chunks.concat();
            let tail: Vec<u8> = rssi.into_iter().collect();
            let bytes = report(&flat, &tail);
            let mut r = Reader::new(&bytes);
            let p = decode_advertising_report(&mut r, TrailingBytePolicy::Rssi).unwrap();
            prop_assert!(r.is_empty());
            prop_assert_eq!(p.truncation(), None);
            prop_assert_eq!(p.query(FieldKind::Mac).len(), 1);
            prop_assert_eq!(p.to_vec().unwrap(), bytes);
        }
    }
}
