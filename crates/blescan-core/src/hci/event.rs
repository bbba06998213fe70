use crate::adv::report::{decode_advertising_report, TrailingBytePolicy};
use crate::encoding::reader::Reader;
use crate::field::Field;
use crate::hci::{EVENT_COMMAND_COMPLETE, EVENT_LE_META, HCI_EVENT, LE_SUBEVENT_ADVERTISING_REPORT};
use crate::packet::{Packet, PacketKind};
use crate::types::Opcode;
use crate::DecodeError;

pub const EVENT_CODE_LABELS: &[(u8, &str)] = &[
    (EVENT_COMMAND_COMPLETE, "Command Complete"),
    (EVENT_LE_META, "LE Meta"),
];
pub const LE_SUBEVENT_LABELS: &[(u8, &str)] = &[
    (0x01, "Connection Complete"),
    (LE_SUBEVENT_ADVERTISING_REPORT, "Advertising Report"),
];

/// Stateless decoder for inbound HCI event frames.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventDecoder {
    pub trailing_byte: TrailingBytePolicy,
}

impl EventDecoder {
    pub const fn new(trailing_byte: TrailingBytePolicy) -> Self {
        Self { trailing_byte }
    }

    /// Decodes one event from the head of `r`.
    ///
    /// The length byte bounds the body: a declared length past the end of
    /// the buffer is `InvalidLength`, bytes after the body are left in `r`.
    /// On error `r` is not advanced.
    pub fn decode(&self, r: &mut Reader<'_>) -> Result<Packet, DecodeError> {
        let mut cursor = *r;
        let mut event = Packet::new("HCI Event", PacketKind::Event).with_header(HCI_EVENT);
        event.check_header(&mut cursor)?;
        let code = cursor.read_u8()?;
        let length = cursor.read_u8()?;
        let mut body = cursor
            .sub_reader(length as usize)
            .map_err(|_| DecodeError::InvalidLength)?;

        event.push(Field::enumerated("code", code, EVENT_CODE_LABELS));
        event.push(Field::u8("length", length));
        match code {
            EVENT_COMMAND_COMPLETE => event.push(decode_command_complete(&mut body)?),
            EVENT_LE_META => event.push(self.decode_le_meta(&mut body)?),
            _ => event.push(Field::bytes("Payload", body.read_rest())),
        }
        *r = cursor;
        Ok(event)
    }

    pub fn decode_frame(&self, frame: &[u8]) -> Result<Packet, DecodeError> {
        self.decode(&mut Reader::new(frame))
    }

    fn decode_le_meta(&self, r: &mut Reader<'_>) -> Result<Packet, DecodeError> {
        let code = r.read_u8()?;
        let mut meta = Packet::new("LE Meta", PacketKind::LeMeta)
            .with_child(Field::enumerated("code", code, LE_SUBEVENT_LABELS));
        if code == LE_SUBEVENT_ADVERTISING_REPORT {
            meta.push(decode_advertising_report(r, self.trailing_byte)?);
        } else {
            meta.push(Field::bytes("Payload", r.read_rest()));
        }
        Ok(meta)
    }
}

fn decode_command_complete(r: &mut Reader<'_>) -> Result<Packet, DecodeError> {
    let mut cc = Packet::new("Command Completed", PacketKind::CommandComplete)
        .with_child(Field::u8("allow pkt", 0))
        .with_child(Field::opcode("cmd", Opcode::from_raw(0)))
        .with_child(Field::bytes("resp code", Vec::new()));
    cc.decode(r)?;
    Ok(cc)
}

/// Decodes a complete event frame with the default trailing-byte policy.
pub fn decode_event(frame: &[u8]) -> Result<Packet, DecodeError> {
    EventDecoder::default().decode_frame(frame)
}
