use std::borrow::Cow;
use std::fmt::Write as _;

use crate::encoding::{reader::Reader, writer::Writer};
use crate::types::uuid::write_hex_colon;
use crate::types::{MacAddress, Opcode, Uuid};
use crate::{DecodeError, EncodeError};

/// Indentation applied per nesting level by the `display` renderers.
pub const INDENT: &str = "    ";

/// Wire width of a fixed-size integer field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Width {
    One,
    Two,
    Four,
}

impl Width {
    pub const fn bytes(self) -> usize {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Four => 4,
        }
    }
}

pub use crate::encoding::Endian;

/// Static code-to-label table of an enumerated byte.
pub type CodeLabels = &'static [(u8, &'static str)];

/// Static MSB-first labels of a bit-field byte.
pub type BitLabels = &'static [&'static str; 8];

/// The decoded value of a [`Field`], together with everything needed to put
/// it back on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Unsigned {
        value: u32,
        width: Width,
        endian: Endian,
    },
    Signed {
        value: i32,
        width: Width,
        endian: Endian,
    },
    /// One byte; only `0x01` decodes as `true`.
    Bool(bool),
    Mac(MacAddress),
    Enumerated {
        code: u8,
        labels: CodeLabels,
    },
    BitField {
        bits: u8,
        labels: BitLabels,
    },
    /// Signed 8.8 fixed point, big-endian, kept as the raw wire value.
    Fixed88(i16),
    /// Opaque bytes. `fixed` is the declared length; `None` takes the remainder.
    Bytes {
        data: Vec<u8>,
        fixed: Option<usize>,
    },
    /// Bytes of the remainder shown as lossy UTF-8.
    Text(Vec<u8>),
    /// A single UUID; the template's width fixes how many bytes are read.
    Uuid(Uuid),
    /// Back-to-back UUIDs of `width` bytes filling the remainder.
    UuidList {
        width: usize,
        items: Vec<Uuid>,
    },
    Opcode(Opcode),
    /// Display-only rendering with no wire representation.
    Derived(String),
}

/// Shape of a [`FieldValue`], used to query trees by type rather than name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Unsigned,
    Signed,
    Bool,
    Mac,
    Enumerated,
    BitField,
    Fixed88,
    Bytes,
    Text,
    Uuid,
    UuidList,
    Opcode,
    Derived,
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Unsigned { .. } => FieldKind::Unsigned,
            Self::Signed { .. } => FieldKind::Signed,
            Self::Bool(_) => FieldKind::Bool,
            Self::Mac(_) => FieldKind::Mac,
            Self::Enumerated { .. } => FieldKind::Enumerated,
            Self::BitField { .. } => FieldKind::BitField,
            Self::Fixed88(_) => FieldKind::Fixed88,
            Self::Bytes { .. } => FieldKind::Bytes,
            Self::Text(_) => FieldKind::Text,
            Self::Uuid(_) => FieldKind::Uuid,
            Self::UuidList { .. } => FieldKind::UuidList,
            Self::Opcode(_) => FieldKind::Opcode,
            Self::Derived(_) => FieldKind::Derived,
        }
    }
}

/// A named, typed, self-describing binary primitive.
///
/// Fields are built as templates (name plus shape), filled by [`decode`] and
/// serialized by [`encode`]. Decoding consumes exactly [`byte_len`] bytes
/// after the fact, and re-encoding a decoded field reproduces its input
/// except for [`FieldValue::Bool`], which normalises to `0x00`/`0x01`.
///
/// [`decode`]: Field::decode
/// [`encode`]: Field::encode
/// [`byte_len`]: Field::byte_len
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: Cow<'static, str>,
    value: FieldValue,
}

impl Field {
    pub fn new(name: impl Into<Cow<'static, str>>, value: FieldValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    pub fn u8(name: impl Into<Cow<'static, str>>, value: u8) -> Self {
        Self::new(
            name,
            FieldValue::Unsigned {
                value: value as u32,
                width: Width::One,
                endian: Endian::Big,
            },
        )
    }

    pub fn i8(name: impl Into<Cow<'static, str>>, value: i8) -> Self {
        Self::new(
            name,
            FieldValue::Signed {
                value: value as i32,
                width: Width::One,
                endian: Endian::Big,
            },
        )
    }

    pub fn u16(name: impl Into<Cow<'static, str>>, value: u16, endian: Endian) -> Self {
        Self::new(
            name,
            FieldValue::Unsigned {
                value: value as u32,
                width: Width::Two,
                endian,
            },
        )
    }

    pub fn i16(name: impl Into<Cow<'static, str>>, value: i16, endian: Endian) -> Self {
        Self::new(
            name,
            FieldValue::Signed {
                value: value as i32,
                width: Width::Two,
                endian,
            },
        )
    }

    pub fn u32(name: impl Into<Cow<'static, str>>, value: u32, endian: Endian) -> Self {
        Self::new(
            name,
            FieldValue::Unsigned {
                value,
                width: Width::Four,
                endian,
            },
        )
    }

    pub fn i32(name: impl Into<Cow<'static, str>>, value: i32, endian: Endian) -> Self {
        Self::new(
            name,
            FieldValue::Signed {
                value,
                width: Width::Four,
                endian,
            },
        )
    }

    pub fn bool(name: impl Into<Cow<'static, str>>, value: bool) -> Self {
        Self::new(name, FieldValue::Bool(value))
    }

    pub fn mac(name: impl Into<Cow<'static, str>>, mac: MacAddress) -> Self {
        Self::new(name, FieldValue::Mac(mac))
    }

    pub fn enumerated(name: impl Into<Cow<'static, str>>, code: u8, labels: CodeLabels) -> Self {
        Self::new(name, FieldValue::Enumerated { code, labels })
    }

    pub fn bit_field(name: impl Into<Cow<'static, str>>, bits: u8, labels: BitLabels) -> Self {
        Self::new(name, FieldValue::BitField { bits, labels })
    }

    pub fn fixed88(name: impl Into<Cow<'static, str>>, raw: i16) -> Self {
        Self::new(name, FieldValue::Fixed88(raw))
    }

    /// Opaque bytes that take whatever remains on decode.
    pub fn bytes(name: impl Into<Cow<'static, str>>, data: impl Into<Vec<u8>>) -> Self {
        Self::new(
            name,
            FieldValue::Bytes {
                data: data.into(),
                fixed: None,
            },
        )
    }

    /// Opaque bytes of a declared length, zero-filled until decoded.
    pub fn fixed_bytes(name: impl Into<Cow<'static, str>>, len: usize) -> Self {
        Self::new(
            name,
            FieldValue::Bytes {
                data: vec![0; len],
                fixed: Some(len),
            },
        )
    }

    pub fn text(name: impl Into<Cow<'static, str>>, data: impl Into<Vec<u8>>) -> Self {
        Self::new(name, FieldValue::Text(data.into()))
    }

    pub fn uuid(name: impl Into<Cow<'static, str>>, width: usize) -> Self {
        Self::new(name, FieldValue::Uuid(Uuid::zeroed(width)))
    }

    pub fn uuid_list(name: impl Into<Cow<'static, str>>, width: usize) -> Self {
        Self::new(
            name,
            FieldValue::UuidList {
                width,
                items: Vec::new(),
            },
        )
    }

    pub fn opcode(name: impl Into<Cow<'static, str>>, opcode: Opcode) -> Self {
        Self::new(name, FieldValue::Opcode(opcode))
    }

    pub fn derived(name: impl Into<Cow<'static, str>>, rendering: impl Into<String>) -> Self {
        Self::new(name, FieldValue::Derived(rendering.into()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &FieldValue {
        &self.value
    }

    pub fn kind(&self) -> FieldKind {
        self.value.kind()
    }

    /// Number of bytes this field occupies on the wire.
    pub fn byte_len(&self) -> usize {
        match &self.value {
            FieldValue::Unsigned { width, .. } | FieldValue::Signed { width, .. } => width.bytes(),
            FieldValue::Bool(_) | FieldValue::Enumerated { .. } | FieldValue::BitField { .. } => 1,
            FieldValue::Mac(_) => MacAddress::LEN,
            FieldValue::Fixed88(_) | FieldValue::Opcode(_) => 2,
            FieldValue::Bytes { data, .. } | FieldValue::Text(data) => data.len(),
            FieldValue::Uuid(uuid) => uuid.len(),
            FieldValue::UuidList { width, items } => width * items.len(),
            FieldValue::Derived(_) => 0,
        }
    }

    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        match &self.value {
            FieldValue::Unsigned {
                value,
                width,
                endian,
            } => match width {
                Width::One => {
                    let v = u8::try_from(*value).map_err(|_| EncodeError::ValueOutOfRange)?;
                    w.write_u8(v)
                }
                Width::Two => {
                    let v = u16::try_from(*value).map_err(|_| EncodeError::ValueOutOfRange)?;
                    w.write_u16(v, *endian)
                }
                Width::Four => w.write_u32(*value, *endian),
            },
            FieldValue::Signed {
                value,
                width,
                endian,
            } => match width {
                Width::One => {
                    let v = i8::try_from(*value).map_err(|_| EncodeError::ValueOutOfRange)?;
                    w.write_i8(v)
                }
                Width::Two => {
                    let v = i16::try_from(*value).map_err(|_| EncodeError::ValueOutOfRange)?;
                    w.write_u16(v as u16, *endian)
                }
                Width::Four => w.write_u32(*value as u32, *endian),
            },
            FieldValue::Bool(v) => w.write_u8(u8::from(*v)),
            FieldValue::Mac(mac) => w.write_all(&mac.to_wire()),
            FieldValue::Enumerated { code, .. } => w.write_u8(*code),
            FieldValue::BitField { bits, .. } => w.write_u8(*bits),
            FieldValue::Fixed88(raw) => w.write_u16(*raw as u16, Endian::Big),
            FieldValue::Bytes { data, fixed } => {
                if fixed.is_some_and(|len| len != data.len()) {
                    return Err(EncodeError::InvalidLength);
                }
                w.write_all(data)
            }
            FieldValue::Text(data) => w.write_all(data),
            FieldValue::Uuid(uuid) => w.write_all(&uuid.to_wire()),
            FieldValue::UuidList { width, items } => {
                for item in items {
                    if item.len() != *width {
                        return Err(EncodeError::InvalidLength);
                    }
                    w.write_all(&item.to_wire())?;
                }
                Ok(())
            }
            FieldValue::Opcode(op) => w.write_u16(op.raw(), Endian::Little),
            FieldValue::Derived(_) => Ok(()),
        }
    }

    /// Fills this template from the head of `r`.
    ///
    /// On failure neither the field nor the reader is modified.
    pub fn decode(&mut self, r: &mut Reader<'_>) -> Result<(), DecodeError> {
        let mut cursor = *r;
        let value = match &self.value {
            FieldValue::Unsigned { width, endian, .. } => FieldValue::Unsigned {
                value: read_uint(&mut cursor, *width, *endian)?,
                width: *width,
                endian: *endian,
            },
            FieldValue::Signed { width, endian, .. } => {
                let raw = read_uint(&mut cursor, *width, *endian)?;
                let value = match width {
                    Width::One => raw as u8 as i8 as i32,
                    Width::Two => raw as u16 as i16 as i32,
                    Width::Four => raw as i32,
                };
                FieldValue::Signed {
                    value,
                    width: *width,
                    endian: *endian,
                }
            }
            FieldValue::Bool(_) => FieldValue::Bool(cursor.read_u8()? == 0x01),
            FieldValue::Mac(_) => {
                let mut wire = [0u8; 6];
                wire.copy_from_slice(cursor.read_exact(MacAddress::LEN)?);
                FieldValue::Mac(MacAddress::from_wire(wire))
            }
            FieldValue::Enumerated { labels, .. } => FieldValue::Enumerated {
                code: cursor.read_u8()?,
                labels: *labels,
            },
            FieldValue::BitField { labels, .. } => FieldValue::BitField {
                bits: cursor.read_u8()?,
                labels: *labels,
            },
            FieldValue::Fixed88(_) => FieldValue::Fixed88(cursor.read_u16(Endian::Big)? as i16),
            FieldValue::Bytes { fixed, .. } => {
                let data = match fixed {
                    Some(len) => cursor.read_exact(*len)?,
                    None => cursor.read_rest(),
                };
                FieldValue::Bytes {
                    data: data.to_vec(),
                    fixed: *fixed,
                }
            }
            FieldValue::Text(_) => FieldValue::Text(cursor.read_rest().to_vec()),
            FieldValue::Uuid(template) => {
                FieldValue::Uuid(Uuid::from_wire(cursor.read_exact(template.len())?))
            }
            FieldValue::UuidList { width, .. } => {
                let width = *width;
                if width == 0 || cursor.remaining() % width != 0 {
                    return Err(DecodeError::InvalidLength);
                }
                let mut items = Vec::with_capacity(cursor.remaining() / width);
                while !cursor.is_empty() {
                    items.push(Uuid::from_wire(cursor.read_exact(width)?));
                }
                FieldValue::UuidList { width, items }
            }
            FieldValue::Opcode(_) => FieldValue::Opcode(Opcode::from_raw(cursor.read_u16(Endian::Little)?)),
            FieldValue::Derived(text) => FieldValue::Derived(text.clone()),
        };
        self.value = value;
        *r = cursor;
        Ok(())
    }

    /// Renders `name:` followed by the value one level deeper.
    pub fn display(&self, depth: usize) -> String {
        let mut out = String::new();
        self.write_display(&mut out, depth);
        out
    }

    pub(crate) fn write_display(&self, out: &mut String, depth: usize) {
        let pad = INDENT.repeat(depth);
        let inner = INDENT.repeat(depth + 1);
        let _ = writeln!(out, "{pad}{}:", self.name);
        match &self.value {
            FieldValue::BitField { bits, labels } => {
                for (i, label) in labels.iter().enumerate() {
                    if is_placeholder(label) {
                        continue;
                    }
                    let set = *bits & (0x80u8 >> i) != 0;
                    let _ = writeln!(out, "{inner}{label}: {set}");
                }
            }
            FieldValue::UuidList { items, .. } => {
                for item in items {
                    let _ = writeln!(out, "{inner}{item}");
                }
            }
            _ => {
                let _ = writeln!(out, "{inner}{}", self.value_string());
            }
        }
    }

    /// Single-line rendering of the value.
    pub fn value_string(&self) -> String {
        let mut out = String::new();
        let _ = match &self.value {
            FieldValue::Unsigned { value, .. } => write!(out, "{value}"),
            FieldValue::Signed { value, .. } => write!(out, "{value}"),
            FieldValue::Bool(v) => write!(out, "{v}"),
            FieldValue::Mac(mac) => write!(out, "{mac}"),
            FieldValue::Enumerated { code, labels } => match lookup_label(labels, *code) {
                Some(label) => out.write_str(label),
                None => write!(out, "{code}"),
            },
            FieldValue::BitField { bits, labels } => {
                let set: Vec<&str> = labels
                    .iter()
                    .enumerate()
                    .filter(|(i, l)| !is_placeholder(l) && *bits & (0x80u8 >> *i) != 0)
                    .map(|(_, l)| *l)
                    .collect();
                out.write_str(&set.join(", "))
            }
            FieldValue::Fixed88(raw) => write!(out, "{}", fixed88_to_f64(*raw)),
            FieldValue::Bytes { data, .. } => write_hex_colon(&mut out, data),
            FieldValue::Text(data) => out.write_str(&String::from_utf8_lossy(data)),
            FieldValue::Uuid(uuid) => write!(out, "{uuid}"),
            FieldValue::UuidList { items, .. } => {
                let rendered: Vec<String> = items.iter().map(ToString::to_string).collect();
                out.write_str(&rendered.join(", "))
            }
            FieldValue::Opcode(op) => write!(out, "ogf 0x{:02x} ocf 0x{:04x}", op.ogf(), op.ocf()),
            FieldValue::Derived(text) => out.write_str(text),
        };
        out
    }

    pub fn as_u32(&self) -> Option<u32> {
        match &self.value {
            FieldValue::Unsigned { value, .. } => Some(*value),
            FieldValue::Enumerated { code, .. } => Some(*code as u32),
            FieldValue::BitField { bits, .. } => Some(*bits as u32),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match &self.value {
            FieldValue::Signed { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match &self.value {
            FieldValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_mac(&self) -> Option<MacAddress> {
        match &self.value {
            FieldValue::Mac(mac) => Some(*mac),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match &self.value {
            FieldValue::Fixed88(raw) => Some(fixed88_to_f64(*raw)),
            FieldValue::Unsigned { value, .. } => Some(*value as f64),
            FieldValue::Signed { value, .. } => Some(*value as f64),
            _ => None,
        }
    }

    /// Raw bytes of opaque and text fields.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match &self.value {
            FieldValue::Bytes { data, .. } | FieldValue::Text(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            FieldValue::Derived(text) => Some(text),
            FieldValue::Text(data) => core::str::from_utf8(data).ok(),
            _ => None,
        }
    }

    pub fn as_uuid(&self) -> Option<&Uuid> {
        match &self.value {
            FieldValue::Uuid(uuid) => Some(uuid),
            _ => None,
        }
    }

    pub fn as_uuid_list(&self) -> Option<&[Uuid]> {
        match &self.value {
            FieldValue::UuidList { items, .. } => Some(items),
            _ => None,
        }
    }

    pub fn as_opcode(&self) -> Option<Opcode> {
        match &self.value {
            FieldValue::Opcode(op) => Some(*op),
            _ => None,
        }
    }

    /// Label of an enumerated field's current code, if the table has one.
    pub fn label(&self) -> Option<&'static str> {
        match &self.value {
            FieldValue::Enumerated { code, labels } => lookup_label(labels, *code),
            _ => None,
        }
    }
}

fn read_uint(r: &mut Reader<'_>, width: Width, endian: Endian) -> Result<u32, DecodeError> {
    Ok(match (width, endian) {
        (Width::One, _) => r.read_u8()? as u32,
        (Width::Two, endian) => r.read_u16(endian)? as u32,
        (Width::Four, endian) => r.read_u32(endian)?,
    })
}

pub fn lookup_label(labels: CodeLabels, code: u8) -> Option<&'static str> {
    labels
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, label)| *label)
}

fn is_placeholder(label: &str) -> bool {
    label == "Undef" || label == "Reserved"
}

pub fn fixed88_to_f64(raw: i16) -> f64 {
    raw as f64 / 256.0
}
