use std::fmt;
use std::str::FromStr;

use pnet::util::MacAddr;
use serde::{Serialize, Serializer};
use thiserror::Error;

/// A 6 byte link-layer address.
///
/// Ordering compares the raw octets, so `0a:..` sorts before `10:..` regardless
/// of how the textual form would compare.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HardwareAddress([u8; 6]);

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid hardware address \"{input}\"")]
pub struct AddressParseError {
    pub input: String,
}

impl HardwareAddress {
    pub const fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    pub const fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// The first three octets, identifying the manufacturer.
    pub fn oui(&self) -> [u8; 3] {
        [self.0[0], self.0[1], self.0[2]]
    }
}

impl From<MacAddr> for HardwareAddress {
    fn from(mac: MacAddr) -> Self {
        let MacAddr(a, b, c, d, e, f) = mac;
        Self([a, b, c, d, e, f])
    }
}

impl From<HardwareAddress> for MacAddr {
    fn from(address: HardwareAddress) -> Self {
        let [a, b, c, d, e, f] = address.0;
        MacAddr(a, b, c, d, e, f)
    }
}

impl FromStr for HardwareAddress {
    type Err = AddressParseError;

    /// Accepts `aa:bb:cc:dd:ee:ff` and `aa-bb-cc-dd-ee-ff`, in either case.
    ///
    /// Every octet is exactly two hex digits and one separator is used
    /// throughout.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AddressParseError {
            input: s.to_string(),
        };

        let separator: char = if s.contains(':') { ':' } else { '-' };
        let octets: Vec<&str> = s.split(separator).collect();
        let well_formed: bool = octets.len() == 6
            && octets
                .iter()
                .all(|octet| octet.len() == 2 && octet.bytes().all(|b| b.is_ascii_hexdigit()));
        if !well_formed {
            return Err(invalid());
        }

        octets
            .join(":")
            .parse::<MacAddr>()
            .map(HardwareAddress::from)
            .map_err(|_| invalid())
    }
}

/// Lowercase, colon separated. This is also the form used in store keys.
impl fmt::Display for HardwareAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl Serialize for HardwareAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
