//! # Device Records
//!
//! A device moves through three shapes during one render:
//!
//! 1. [`RawAssociation`]: what the controller reports, address still textual.
//! 2. [`AssociatedDevice`]: address parsed, ready to be resolved.
//! 3. [`ResolvedDevice`]: joined with leases and the identity record.

use std::net::IpAddr;

use serde::Serialize;

use super::mac::{AddressParseError, HardwareAddress};

/// Vendor classes longer than this are shortened for display.
pub const VENDOR_LABEL_MAX: usize = 16;
/// Characters kept from a shortened vendor class, before the ellipsis.
pub const VENDOR_LABEL_KEEP: usize = 13;
pub const ELLIPSIS: &str = "...";

/// One client as listed by the association source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAssociation {
    pub address: String,
    pub attachment_point: String,
}

impl RawAssociation {
    pub fn new(address: impl Into<String>, attachment_point: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            attachment_point: attachment_point.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociatedDevice {
    pub address: HardwareAddress,
    pub attachment_point: String,
}

impl TryFrom<RawAssociation> for AssociatedDevice {
    type Error = AddressParseError;

    fn try_from(raw: RawAssociation) -> Result<Self, Self::Error> {
        Ok(Self {
            address: raw.address.parse()?,
            attachment_point: raw.attachment_point,
        })
    }
}

/// Hostname and vendor class recorded by the DHCP server for one address.
///
/// Stored as a protobuf message; the same record may be replicated under
/// several prefixes.
#[derive(Clone, PartialEq, Eq, Serialize, prost::Message)]
pub struct IdentityRecord {
    #[prost(string, tag = "1")]
    pub hostname: String,
    #[prost(string, tag = "2")]
    pub vendor_class: String,
}

impl IdentityRecord {
    pub fn new(hostname: impl Into<String>, vendor_class: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            vendor_class: vendor_class.into(),
        }
    }

    pub fn decode_record(bytes: &[u8]) -> Result<Self, prost::DecodeError> {
        <Self as prost::Message>::decode(bytes)
    }

    pub fn encode_record(&self) -> Vec<u8> {
        prost::Message::encode_to_vec(self)
    }
}

/// The join of an [`AssociatedDevice`] with its leases and identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedDevice {
    pub address: HardwareAddress,
    pub ips: Vec<IpAddr>,
    pub attachment_point: String,
    pub hostname: String,
    /// The stored vendor class, untouched.
    pub vendor_class: String,
    /// `vendor_class` shortened for display.
    pub vendor_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
}

impl ResolvedDevice {
    pub fn new(device: AssociatedDevice, mut ips: Vec<IpAddr>, identity: IdentityRecord) -> Self {
        ips.sort();
        let vendor_label = vendor_label(&identity.vendor_class);
        Self {
            address: device.address,
            ips,
            attachment_point: device.attachment_point,
            hostname: identity.hostname,
            vendor_class: identity.vendor_class,
            vendor_label,
            manufacturer: None,
        }
    }

    /// A device nothing could be resolved for. It still gets listed.
    pub fn unresolved(device: AssociatedDevice) -> Self {
        Self::new(device, Vec::new(), IdentityRecord::default())
    }

    pub fn with_manufacturer(mut self, manufacturer: Option<String>) -> Self {
        self.manufacturer = manufacturer;
        self
    }

    pub fn ips_joined(&self, sep: &str) -> String {
        self.ips
            .iter()
            .map(IpAddr::to_string)
            .collect::<Vec<String>>()
            .join(sep)
    }
}

/// Shortens a vendor class to at most [`VENDOR_LABEL_MAX`] characters.
pub fn vendor_label(vendor_class: &str) -> String {
    if vendor_class.chars().count() <= VENDOR_LABEL_MAX {
        return vendor_class.to_string();
    }
    let mut label: String = vendor_class.chars().take(VENDOR_LABEL_KEEP).collect();
    label.push_str(ELLIPSIS);
    label
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn device(address: &str, ap: &str) -> AssociatedDevice {
        AssociatedDevice::try_from(RawAssociation::new(address, ap)).unwrap()
    }

    #[test]
    fn vendor_label_keeps_short_strings() {
        assert_eq!(vendor_label(""), "");
        assert_eq!(vendor_label("android-dhcp-13"), "android-dhcp-13");
        assert_eq!(vendor_label("exactly-16-chars"), "exactly-16-chars");
    }

    #[test]
    fn vendor_label_truncates_long_strings() {
        let vendor = "MSFT 5.0 XBOX ONE 20";
        assert_eq!(vendor.chars().count(), 20);
        assert_eq!(vendor_label(vendor), "MSFT 5.0 XBOX...");
        assert_eq!(vendor_label(vendor).chars().count(), VENDOR_LABEL_MAX);
    }

    #[test]
    fn vendor_label_counts_characters_not_bytes() {
        let vendor = "ééééééééééééééééé";
        assert_eq!(vendor_label(vendor), "ééééééééééééé...");
    }

    #[test]
    fn resolved_device_keeps_untruncated_vendor_class() {
        let identity = IdentityRecord::new("laptop", "MSFT 5.0 XBOX ONE 20");
        let resolved = ResolvedDevice::new(device("aa:aa:aa:aa:aa:01", "ap1"), vec![], identity);
        assert_eq!(resolved.vendor_class, "MSFT 5.0 XBOX ONE 20");
        assert_eq!(resolved.vendor_label, "MSFT 5.0 XBOX...");
    }

    #[test]
    fn resolved_device_sorts_ips() {
        let ips = vec![
            IpAddr::V4(Ipv4Addr::new(10, 0, 0, 9)),
            "fd00::1".parse().unwrap(),
            IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5)),
        ];
        let resolved = ResolvedDevice::new(
            device("aa:aa:aa:aa:aa:01", "ap1"),
            ips,
            IdentityRecord::default(),
        );
        assert_eq!(resolved.ips_joined(", "), "10.0.0.5, 10.0.0.9, fd00::1");
    }

    #[test]
    fn unresolved_device_is_empty_but_addressed() {
        let resolved = ResolvedDevice::unresolved(device("bb:bb:bb:bb:bb:02", "ap1"));
        assert_eq!(resolved.address.to_string(), "bb:bb:bb:bb:bb:02");
        assert_eq!(resolved.attachment_point, "ap1");
        assert!(resolved.ips.is_empty());
        assert!(resolved.hostname.is_empty());
        assert!(resolved.vendor_class.is_empty());
    }

    #[test]
    fn identity_record_decodes_wire_form() {
        let record = IdentityRecord::new("printer", "HP LaserJet");
        let decoded = IdentityRecord::decode_record(&record.encode_record()).unwrap();
        assert_eq!(decoded, record);
        assert!(IdentityRecord::decode_record(&[0x0a, 0xff]).is_err());
    }
}
