use std::borrow::Cow;
use std::fmt::Write as _;

use crate::adv::eir::EirType;
use crate::encoding::{reader::Reader, writer::Writer};
use crate::field::{Field, FieldKind, INDENT};
use crate::{DecodeError, EncodeError};

/// Structural role of a [`Packet`] in a decoded tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketKind {
    /// An HCI event frame (packet-type tag `0x04`).
    Event,
    CommandComplete,
    LeMeta,
    AdvertisingReport,
    /// One length-prefixed EIR chunk of an advertising report.
    Eir(EirType),
    /// An Eddystone frame that replaced an opaque service-data payload.
    Eddystone,
    /// An HCI command frame (packet-type tag `0x01`).
    Command,
}

/// Where the chunk walk of an advertising report stopped early.
///
/// `offset` is the position of the offending sub-length byte inside the
/// report body, `declared` the sub-length it announced and `available` the
/// number of bytes that actually followed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Truncation {
    pub offset: usize,
    pub declared: usize,
    pub available: usize,
}

/// A child of a packet: either a leaf field or a nested packet.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Field(Field),
    Packet(Packet),
}

impl Node {
    pub fn name(&self) -> &str {
        match self {
            Self::Field(f) => f.name(),
            Self::Packet(p) => p.name(),
        }
    }

    /// Children of a container node; `None` for leaves.
    pub fn children(&self) -> Option<&[Node]> {
        match self {
            Self::Field(_) => None,
            Self::Packet(p) => Some(p.children()),
        }
    }

    pub fn as_field(&self) -> Option<&Field> {
        match self {
            Self::Field(f) => Some(f),
            Self::Packet(_) => None,
        }
    }

    pub fn as_packet(&self) -> Option<&Packet> {
        match self {
            Self::Field(_) => None,
            Self::Packet(p) => Some(p),
        }
    }

    pub fn byte_len(&self) -> usize {
        match self {
            Self::Field(f) => f.byte_len(),
            Self::Packet(p) => p.byte_len(),
        }
    }

    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        match self {
            Self::Field(f) => f.encode(w),
            Self::Packet(p) => p.encode(w),
        }
    }

    pub fn decode(&mut self, r: &mut Reader<'_>) -> Result<(), DecodeError> {
        match self {
            Self::Field(f) => f.decode(r),
            Self::Packet(p) => p.decode(r),
        }
    }

    pub fn display(&self, depth: usize) -> String {
        let mut out = String::new();
        self.write_display(&mut out, depth);
        out
    }

    fn write_display(&self, out: &mut String, depth: usize) {
        match self {
            Self::Field(f) => f.write_display(out, depth),
            Self::Packet(p) => p.write_display(out, depth),
        }
    }

    fn matches(&self, selector: &Selector<'_>) -> bool {
        match (selector, self) {
            (Selector::Name(name), node) => node.name() == *name,
            (Selector::FieldKind(kind), Self::Field(f)) => f.kind() == *kind,
            (Selector::PacketKind(kind), Self::Packet(p)) => p.kind() == *kind,
            _ => false,
        }
    }
}

impl From<Field> for Node {
    fn from(value: Field) -> Self {
        Self::Field(value)
    }
}

impl From<Packet> for Node {
    fn from(value: Packet) -> Self {
        Self::Packet(value)
    }
}

/// What a tree query looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector<'a> {
    /// Fields or packets with this exact name.
    Name(&'a str),
    FieldKind(FieldKind),
    PacketKind(PacketKind),
}

impl<'a> From<&'a str> for Selector<'a> {
    fn from(value: &'a str) -> Self {
        Self::Name(value)
    }
}

impl From<FieldKind> for Selector<'_> {
    fn from(value: FieldKind) -> Self {
        Self::FieldKind(value)
    }
}

impl From<PacketKind> for Selector<'_> {
    fn from(value: PacketKind) -> Self {
        Self::PacketKind(value)
    }
}

/// An ordered, named sequence of nodes with an optional one-byte header tag.
///
/// The wire form is the header (if any) followed by every child in order, so
/// [`byte_len`](Self::byte_len) is always the header plus the sum of the
/// children.
#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    name: Cow<'static, str>,
    kind: PacketKind,
    header: Option<u8>,
    children: Vec<Node>,
    truncation: Option<Truncation>,
}

impl Packet {
    pub fn new(name: impl Into<Cow<'static, str>>, kind: PacketKind) -> Self {
        Self {
            name: name.into(),
            kind,
            header: None,
            children: Vec::new(),
            truncation: None,
        }
    }

    pub fn with_header(mut self, header: u8) -> Self {
        self.header = Some(header);
        self
    }

    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> PacketKind {
        self.kind
    }

    pub fn header(&self) -> Option<u8> {
        self.header
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn push(&mut self, child: impl Into<Node>) {
        self.children.push(child.into());
    }

    pub fn truncation(&self) -> Option<Truncation> {
        self.truncation
    }

    pub(crate) fn set_truncation(&mut self, truncation: Truncation) {
        self.truncation = Some(truncation);
    }

    /// First truncation indicator anywhere in this tree, depth-first.
    pub fn find_truncation(&self) -> Option<Truncation> {
        self.truncation.or_else(|| {
            self.children
                .iter()
                .filter_map(Node::as_packet)
                .find_map(Packet::find_truncation)
        })
    }

    pub fn byte_len(&self) -> usize {
        usize::from(self.header.is_some()) + self.children.iter().map(Node::byte_len).sum::<usize>()
    }

    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        if let Some(header) = self.header {
            w.write_u8(header)?;
        }
        for child in &self.children {
            child.encode(w)?;
        }
        Ok(())
    }

    pub fn to_vec(&self) -> Result<Vec<u8>, EncodeError> {
        let mut buf = vec![0u8; self.byte_len()];
        let mut w = Writer::new(&mut buf);
        self.encode(&mut w)?;
        Ok(buf)
    }

    /// Checks the header tag and fills every child template in order.
    ///
    /// The caller's reader only moves when the whole packet decodes.
    pub fn decode(&mut self, r: &mut Reader<'_>) -> Result<(), DecodeError> {
        let mut cursor = *r;
        self.check_header(&mut cursor)?;
        let mut children = self.children.clone();
        for child in &mut children {
            child.decode(&mut cursor)?;
        }
        self.children = children;
        *r = cursor;
        Ok(())
    }

    /// Consumes the header tag, failing with `HeaderMismatch` if it differs.
    pub(crate) fn check_header(&self, r: &mut Reader<'_>) -> Result<(), DecodeError> {
        match self.header {
            Some(expected) => r.expect_tag(expected),
            None => Ok(()),
        }
    }

    /// Every node below this packet matching `selector`, depth-first in
    /// pre-order. The packet itself is not a candidate.
    pub fn query<'s>(&self, selector: impl Into<Selector<'s>>) -> Vec<&Node> {
        let selector = selector.into();
        let mut out = Vec::new();
        collect(&self.children, &selector, &mut out);
        out
    }

    pub fn fields(&self, name: &str) -> Vec<&Field> {
        self.query(name)
            .into_iter()
            .filter_map(Node::as_field)
            .collect()
    }

    pub fn first_field(&self, name: &str) -> Option<&Field> {
        self.fields(name).into_iter().next()
    }

    pub fn last_field(&self, name: &str) -> Option<&Field> {
        self.fields(name).into_iter().last()
    }

    pub fn packets(&self, kind: PacketKind) -> Vec<&Packet> {
        self.query(kind)
            .into_iter()
            .filter_map(Node::as_packet)
            .collect()
    }

    pub fn packets_named(&self, name: &str) -> Vec<&Packet> {
        self.query(name)
            .into_iter()
            .filter_map(Node::as_packet)
            .collect()
    }

    /// Index of the first direct child called `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.children.iter().position(|c| c.name() == name)
    }

    /// Swaps the direct child at `index` for `node`, returning the old one.
    pub fn replace(&mut self, index: usize, node: impl Into<Node>) -> Option<Node> {
        let slot = self.children.get_mut(index)?;
        Some(std::mem::replace(slot, node.into()))
    }

    /// First packet below this one satisfying `pred`, depth-first.
    pub fn find_packet_mut<F>(&mut self, pred: &F) -> Option<&mut Packet>
    where
        F: Fn(&Packet) -> bool,
    {
        for child in &mut self.children {
            if let Node::Packet(p) = child {
                if pred(&*p) {
                    return Some(p);
                }
                if let Some(found) = p.find_packet_mut(pred) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Renders the tree with four spaces of indentation per level.
    pub fn display(&self, depth: usize) -> String {
        let mut out = String::new();
        self.write_display(&mut out, depth);
        out
    }

    fn write_display(&self, out: &mut String, depth: usize) {
        let _ = writeln!(out, "{}{}:", INDENT.repeat(depth), self.name);
        for child in &self.children {
            child.write_display(out, depth + 1);
        }
    }
}

fn collect<'a>(nodes: &'a [Node], selector: &Selector<'_>, out: &mut Vec<&'a Node>) {
    for node in nodes {
        if node.matches(selector) {
            out.push(node);
        }
        if let Some(children) = node.children() {
            collect(children, selector, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Node, Packet, PacketKind, Selector};
    use crate::adv::eir::EirType;
    use crate::encoding::reader::Reader;
    use crate::field::{Endian, Field, FieldKind};
    use crate::DecodeError;

    fn sample() -> Packet {
        let chunk = Packet::new("Advertised Data", PacketKind::Eir(EirType::ServiceData16))
            .with_child(Field::u8("sublen", 4))
            .with_child(Field::u8("type", 0x16))
            .with_child(Field::bytes("Adv Payload", vec![1, 2]));
        Packet::new("Adv Report", PacketKind::AdvertisingReport)
            .with_child(Field::u8("num reports", 1))
            .with_child(chunk)
            .with_child(Field::i8("rssi", -40))
            .with_child(Field::bytes("Adv Payload", vec![3]))
    }

    #[test]
    fn query_is_preorder_depth_first() {
        let p = sample();
        let names: Vec<&str> = p.query(FieldKind::Bytes).into_iter().map(Node::name).collect();
        assert_eq!(names, ["Adv Payload", "Adv Payload"]);
        let payloads = p.fields("Adv Payload");
        assert_eq!(payloads[0].as_bytes(), Some(&[1, 2][..]));
        assert_eq!(p.last_field("Adv Payload").unwrap().as_bytes(), Some(&[3][..]));
        assert_eq!(p.packets(PacketKind::Eir(EirType::ServiceData16)).len(), 1);
        assert_eq!(p.query(Selector::Name("Advertised Data")).len(), 1);
        assert!(p.first_field("missing").is_none());
    }

    #[test]
    fn query_does_not_match_root() {
        let p = sample();
        assert!(p.query("Adv Report").is_empty());
        assert!(p.packets(PacketKind::AdvertisingReport).is_empty());
    }

    #[test]
    fn length_is_header_plus_children() {
        let p = sample().with_header(0x04);
        assert_eq!(p.byte_len(), 1 + 1 + 4 + 1 + 1);
        assert_eq!(p.to_vec().unwrap(), vec![0x04, 1, 4, 0x16, 1, 2, 0xd8, 3]);
    }

    #[test]
    fn header_mismatch_leaves_reader_untouched() {
        let mut p = Packet::new("HCI Event", PacketKind::Event)
            .with_header(0x04)
            .with_child(Field::u16("v", 0, Endian::Little));
        let mut r = Reader::new(&[0x01, 0x02, 0x03]);
        assert_eq!(
            p.decode(&mut r).unwrap_err(),
            DecodeError::HeaderMismatch {
                expected: 0x04,
                found: 0x01
            }
        );
        assert_eq!(r.position(), 0);

        let mut r = Reader::new(&[0x04, 0x02, 0x03, 0x09]);
        p.decode(&mut r).unwrap();
        assert_eq!(r.rest(), &[0x09]);
        assert_eq!(p.first_field("v").unwrap().as_u32(), Some(0x0302));
    }

    #[test]
    fn failed_child_decode_keeps_templates() {
        let mut p = Packet::new("pair", PacketKind::Command)
            .with_child(Field::u8("a", 0))
            .with_child(Field::u16("b", 0, Endian::Big));
        let mut r = Reader::new(&[9, 1]);
        assert!(p.decode(&mut r).is_err());
        assert_eq!(r.position(), 0);
        assert_eq!(p.first_field("a").unwrap().as_u32(), Some(0));
    }

    #[test]
    fn replace_swaps_in_place() {
        let mut p = sample();
        let idx = p.position("rssi").unwrap();
        let old = p.replace(idx, Field::i8("rssi", -1)).unwrap();
        assert_eq!(old.as_field().unwrap().as_i32(), Some(-40));
        assert_eq!(p.first_field("rssi").unwrap().as_i32(), Some(-1));
        assert!(p.replace(99, Field::u8("x", 0)).is_none());

        let chunk = p
            .find_packet_mut(&|p: &Packet| p.name() == "Advertised Data")
            .unwrap();
        chunk.push(Field::derived("note", "x"));
        assert_eq!(p.fields("note").len(), 1);
    }

    #[test]
    fn display_indents_four_spaces() {
        let p = Packet::new("LE Meta", PacketKind::LeMeta).with_child(Field::u8("code", 2));
        assert_eq!(p.display(0), "LE Meta:\n    code:\n        2\n");
        let node = Node::from(p);
        assert_eq!(node.children().map(<[Node]>::len), Some(1));
    }
}
