use core::fmt;
use core::str::FromStr;

/// A 6-byte Bluetooth device address.
///
/// Octets are stored in display order (most significant first). On the wire
/// the controller sends them least-significant first, so [`from_wire`] and
/// [`to_wire`] reverse the byte order.
///
/// [`from_wire`]: MacAddress::from_wire
/// [`to_wire`]: MacAddress::to_wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    pub const LEN: usize = 6;

    /// Creates an address from octets in display order.
    pub const fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    pub const fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// Creates an address from the least-significant-first wire layout.
    pub fn from_wire(wire: [u8; 6]) -> Self {
        let mut octets = wire;
        octets.reverse();
        Self(octets)
    }

    pub fn to_wire(&self) -> [u8; 6] {
        let mut wire = self.0;
        wire.reverse();
        wire
    }

    /// Returns true when `bytes` opens with this address in display order.
    /// Anything after the first six bytes is ignored.
    pub fn matches_display_bytes(&self, bytes: &[u8]) -> bool {
        bytes.get(..Self::LEN) == Some(&self.0[..])
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

/// Error returned when a string is not a MAC address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseMacError(String);

impl fmt::Display for ParseMacError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is not a MAC address", self.0)
    }
}

impl std::error::Error for ParseMacError {}

impl FromStr for MacAddress {
    type Err = ParseMacError;

    /// Accepts six hex octets separated consistently by `:` or `-`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseMacError(s.to_string());
        let sep = if s.contains('-') { '-' } else { ':' };
        let mut octets = [0u8; 6];
        let mut parts = s.split(sep);
        for slot in &mut octets {
            let part = parts.next().ok_or_else(err)?;
            if part.len() != 2 {
                return Err(err());
            }
            *slot = u8::from_str_radix(part, 16).map_err(|_| err())?;
        }
        if parts.next().is_some() {
            return Err(err());
        }
        Ok(Self(octets))
    }
}
