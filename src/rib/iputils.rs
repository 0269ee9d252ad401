// Address utilities - literal validation, netmask arithmetic and canonical form

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv6Addr;

/// IP family of a validated address literal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IpVersion {
    V4,
    V6,
}

impl IpVersion {
    pub fn number(self) -> u8 {
        match self {
            IpVersion::V4 => 4,
            IpVersion::V6 => 6,
        }
    }
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IPv{}", self.number())
    }
}

/// Check whether `address` is a numeric IPv4 or IPv6 literal and report its family.
///
/// No name resolution happens here. IPv4 literals must be four dot-separated
/// decimal components; leading zeros are tolerated (`010.000.000.001`).
pub fn validate(address: &str) -> Option<IpVersion> {
    if address.is_empty() {
        return None;
    }
    if parse_ipv4_octets(address).is_some() {
        return Some(IpVersion::V4);
    }
    if address.parse::<Ipv6Addr>().is_ok() {
        return Some(IpVersion::V6);
    }
    None
}

/// Convert a dotted netmask to its CIDR prefix length (e.g. 255.255.255.0 => 24).
///
/// Accumulation stops at the first octet that is not a contiguous run of
/// leading ones, so `255.0.255.0` yields 8 and garbage yields whatever was
/// summed before it. Existing tables depend on this truncation.
pub fn netmask_to_prefix_length(netmask: &str) -> u32 {
    let mut prefix_len = 0;

    for component in netmask.split('.').take(4) {
        let bits = match component.parse::<u32>() {
            Ok(0x80) => 1,
            Ok(0xC0) => 2,
            Ok(0xE0) => 3,
            Ok(0xF0) => 4,
            Ok(0xF8) => 5,
            Ok(0xFC) => 6,
            Ok(0xFE) => 7,
            Ok(0xFF) => 8,
            _ => return prefix_len,
        };
        prefix_len += bits;
    }

    prefix_len
}

/// Octet-wise AND of an IPv4 address and netmask, rendered in dotted form.
///
/// Returns `None` when either argument is not an IPv4 literal.
pub fn network_address(address: &str, netmask: &str) -> Option<String> {
    let addr = parse_ipv4_octets(address)?;
    let mask = parse_ipv4_octets(netmask)?;

    let net = [
        addr[0] & mask[0],
        addr[1] & mask[1],
        addr[2] & mask[2],
        addr[3] & mask[3],
    ];
    Some(format_octets(net))
}

/// Render an address without leading zeros.
///
/// IPv4 components are re-printed as plain decimals, IPv6 literals take the
/// compressed lowercase form. Anything else comes back unchanged.
pub fn canonicalize(address: &str) -> String {
    if let Some(octets) = parse_ipv4_octets(address) {
        return format_octets(octets);
    }
    match address.parse::<Ipv6Addr>() {
        Ok(addr) => addr.to_string(),
        Err(_) => address.to_string(),
    }
}

/// Textual equality after canonicalization. This is the only address
/// comparison used by the store and the matcher.
pub fn equal(a: &str, b: &str) -> bool {
    canonicalize(a) == canonicalize(b)
}

fn parse_ipv4_octets(address: &str) -> Option<[u8; 4]> {
    let mut octets = [0u8; 4];
    let mut parts = address.split('.');

    for octet in octets.iter_mut() {
        let part = parts.next()?;
        if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        *octet = part.parse::<u8>().ok()?;
    }

    if parts.next().is_some() {
        return None;
    }
    Some(octets)
}

fn format_octets(octets: [u8; 4]) -> String {
    format!("{}.{}.{}.{}", octets[0], octets[1], octets[2], octets[3])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_reports_version() {
        assert_eq!(validate("192.168.1.1"), Some(IpVersion::V4));
        assert_eq!(validate("010.008.000.001"), Some(IpVersion::V4));
        assert_eq!(validate("fe80::1"), Some(IpVersion::V6));
        assert_eq!(validate("::"), Some(IpVersion::V6));
    }

    #[test]
    fn test_ip_version_display() {
        assert_eq!(IpVersion::V4.number(), 4);
        assert_eq!(IpVersion::V6.to_string(), "IPv6");
    }

    #[test]
    fn test_validate_rejects_non_literals() {
        assert_eq!(validate(""), None);
        assert_eq!(validate("localhost"), None);
        assert_eq!(validate("256.1.1.1"), None);
        assert_eq!(validate("1.2.3"), None);
        assert_eq!(validate("1.2.3.4.5"), None);
        assert_eq!(validate("1..2.3"), None);
        assert_eq!(validate("1.2.3.0001"), None);
        assert_eq!(validate("+1.2.3.4"), None);
        assert_eq!(validate("fe80:::1"), None);
    }

    #[test]
    fn test_netmask_to_prefix_length() {
        assert_eq!(netmask_to_prefix_length("255.255.255.0"), 24);
        assert_eq!(netmask_to_prefix_length("255.255.0.0"), 16);
        assert_eq!(netmask_to_prefix_length("255.255.255.255"), 32);
        assert_eq!(netmask_to_prefix_length("255.255.240.0"), 20);
        assert_eq!(netmask_to_prefix_length("0.0.0.0"), 0);
    }

    #[test]
    fn test_netmask_to_prefix_length_truncates_discontiguous_mask() {
        // Known sharp edge: counting stops at the first non-contiguous octet.
        assert_eq!(netmask_to_prefix_length("255.0.255.0"), 8);
        assert_eq!(netmask_to_prefix_length("255.255.13.255"), 16);
        assert_eq!(netmask_to_prefix_length("not-a-mask"), 0);
    }

    #[test]
    fn test_network_address() {
        assert_eq!(
            network_address("192.168.1.100", "255.255.255.0").as_deref(),
            Some("192.168.1.0")
        );
        assert_eq!(
            network_address("10.20.30.40", "255.0.0.0").as_deref(),
            Some("10.0.0.0")
        );
        assert_eq!(
            network_address("010.020.030.040", "255.255.0.0").as_deref(),
            Some("10.20.0.0")
        );
        assert_eq!(network_address("8.8.8.8", "0.0.0.0").as_deref(), Some("0.0.0.0"));
        assert_eq!(network_address("fe80::1", "255.255.0.0"), None);
    }

    #[test]
    fn test_canonicalize() {
        assert_eq!(canonicalize("010.008.000.001"), "10.8.0.1");
        assert_eq!(canonicalize("192.168.001.1"), "192.168.1.1");
        assert_eq!(canonicalize("FE80:0000::0001"), "fe80::1");
        assert_eq!(canonicalize("*"), "*");
    }

    #[test]
    fn test_canonicalize_idempotent() {
        for addr in ["010.008.000.001", "0.0.0.0", "255.255.255.255", "2001:DB8:0:0::1", "::ffff:1.2.3.4"] {
            let once = canonicalize(addr);
            assert_eq!(canonicalize(&once), once);
        }
    }

    #[test]
    fn test_equal() {
        assert!(equal("10.0.0.1", "010.000.000.001"));
        assert!(equal("2001:db8::1", "2001:0DB8:0:0:0:0:0:1"));
        assert!(!equal("10.0.0.1", "10.0.0.2"));
        assert!(!equal("0.0.0.0", "::"));
    }
}
