use crate::terminal::colors;
use apdash_common::network::device::ResolvedDevice;
use colored::*;
use std::net::{IpAddr, Ipv6Addr};

pub type Detail = (String, ColoredString);

const NO_HOSTNAME: &str = "No hostname";

pub fn ipv6_to_type_str(ipv6_addr: &Ipv6Addr) -> &'static str {
    if is_global_unicast(ipv6_addr) {
        return "GUA";
    }
    if ipv6_addr.is_unique_local() {
        return "ULA";
    }
    if ipv6_addr.is_unicast_link_local() {
        return "LLA";
    }
    "IPv6"
}

// 2000::/3
fn is_global_unicast(ipv6_addr: &Ipv6Addr) -> bool {
    let first_byte = ipv6_addr.octets()[0];
    (0x20..=0x3F).contains(&first_byte)
}

pub fn ip_to_detail(ip: &IpAddr) -> Detail {
    match ip {
        IpAddr::V4(ipv4_addr) => {
            let value = ipv4_addr.to_string().color(colors::IPV4_ADDR);
            (String::from("IPv4"), value)
        }
        IpAddr::V6(ipv6_addr) => {
            let ipv6_type = ipv6_to_type_str(ipv6_addr);
            let value = ipv6_addr.to_string().color(colors::IPV6_ADDR);
            (String::from(ipv6_type), value)
        }
    }
}

pub fn display_name(device: &ResolvedDevice) -> &str {
    if device.hostname.is_empty() {
        NO_HOSTNAME
    } else {
        &device.hostname
    }
}

/// Tree rows for one device: hardware address, leases, then whatever identity is known.
pub fn device_details(device: &ResolvedDevice) -> Vec<Detail> {
    let mut details: Vec<Detail> = vec![(
        "MAC".to_string(),
        device.address.to_string().color(colors::MAC_ADDR),
    )];
    details.extend(device.ips.iter().map(ip_to_detail));

    if !device.vendor_label.is_empty() {
        details.push((
            "Vendor".to_string(),
            device.vendor_label.clone().color(colors::VENDOR),
        ));
    }
    if let Some(manufacturer) = &device.manufacturer {
        details.push(("Maker".to_string(), manufacturer.normal()));
    }
    details
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
