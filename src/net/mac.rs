//! Hardware addresses.
//!
//! Every device in a fabric (link endpoints and switch devices alike) is
//! identified by a 48-bit MAC address. Addresses are handed out sequentially
//! by a [`MacAllocator`] owned by the fabric, starting at `00:00:00:00:00:01`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error returned when a MAC address string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid MAC address: {0}")]
pub struct MacParseError(pub String);

/// A 48-bit Ethernet MAC address.
///
/// ```
/// use openflow_fabric::net::MacAddress;
///
/// let mac: MacAddress = "00:00:00:00:00:03".parse().unwrap();
/// assert_eq!(mac, MacAddress::from_index(3));
/// assert_eq!(mac.to_string(), "00:00:00:00:00:03");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    /// The zero address. Never handed out by the allocator.
    pub const ZERO: MacAddress = MacAddress([0; 6]);

    pub const fn new(bytes: [u8; 6]) -> Self {
        MacAddress(bytes)
    }

    /// Builds the address whose low 48 bits equal `index`.
    pub fn from_index(index: u64) -> Self {
        let b = index.to_be_bytes();
        MacAddress([b[2], b[3], b[4], b[5], b[6], b[7]])
    }

    pub const fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0; 6]
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl FromStr for MacAddress {
    type Err = MacParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let separator = if s.contains(':') { ':' } else { '-' };

        let parts: Vec<&str> = s.split(separator).collect();
        if parts.len() != 6 {
            return Err(MacParseError(s.to_string()));
        }

        let mut bytes = [0u8; 6];
        for (i, part) in parts.iter().enumerate() {
            if part.len() != 2 || !part.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(MacParseError(s.to_string()));
            }
            bytes[i] = u8::from_str_radix(part, 16).map_err(|_| MacParseError(s.to_string()))?;
        }

        Ok(MacAddress(bytes))
    }
}

impl TryFrom<String> for MacAddress {
    type Error = MacParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> String {
        mac.to_string()
    }
}

/// Sequential address allocator, one per fabric.
#[derive(Debug, Default)]
pub struct MacAllocator {
    last: u64,
}

impl MacAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next unused address.
    pub fn allocate(&mut self) -> MacAddress {
        self.last += 1;
        MacAddress::from_index(self.last)
    }

    /// Number of addresses handed out so far.
    pub fn allocated(&self) -> u64 {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let mac: MacAddress = "00:11:22:aa:bb:cc".parse().unwrap();
        assert_eq!(mac.as_bytes(), &[0x00, 0x11, 0x22, 0xaa, 0xbb, 0xcc]);
        assert_eq!(mac.to_string(), "00:11:22:aa:bb:cc");

        let hyphen: MacAddress = "00-11-22-AA-BB-CC".parse().unwrap();
        assert_eq!(mac, hyphen);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!("00:11:22:33:44".parse::<MacAddress>().is_err());
        assert!("00:11:22:33:44:gg".parse::<MacAddress>().is_err());
        assert!("0:1:2:3:4:5".parse::<MacAddress>().is_err());
        assert!("".parse::<MacAddress>().is_err());
        // Signs are not hex digits
        assert!("00:11:22:33:44:+f".parse::<MacAddress>().is_err());
        assert!("+0-11-22-33-44-55".parse::<MacAddress>().is_err());
    }

    #[test]
    fn test_allocator_is_sequential() {
        let mut alloc = MacAllocator::new();
        assert_eq!(alloc.allocate().to_string(), "00:00:00:00:00:01");
        assert_eq!(alloc.allocate().to_string(), "00:00:00:00:00:02");
        assert_eq!(alloc.allocated(), 2);
    }

    #[test]
    fn test_from_index_large_values() {
        assert_eq!(MacAddress::from_index(0x0102).to_string(), "00:00:00:00:01:02");
        assert!(MacAddress::from_index(0).is_zero());
    }

    #[test]
    fn test_serde_as_string() {
        let mac = MacAddress::from_index(7);
        let json = serde_json::to_string(&mac).unwrap();
        assert_eq!(json, "\"00:00:00:00:00:07\"");
        let back: MacAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mac);
    }
}
