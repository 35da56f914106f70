//! Address whitelist matching.
//!
//! # Responsibilities
//! - Parse whitelist entries (literal address or CIDR block)
//! - Match a client address against an ordered rule set
//!
//! # Design Decisions
//! - Pure: no state, no I/O, same inputs give the same answer
//! - Fail closed: an unparsable client address never matches
//! - IPv4-mapped IPv6 addresses and blocks are compared as IPv4

use std::net::IpAddr;
use std::str::FromStr;

use ipnet::{IpNet, Ipv4Net};

/// One whitelist entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressRule {
    /// A single address, compared for equality.
    Addr(IpAddr),
    /// A CIDR block, compared for containment.
    Net(IpNet),
}

/// Error returned when a rule string is neither an address nor a CIDR block.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid address rule: {0}")]
pub struct InvalidRule(pub String);

impl FromStr for AddressRule {
    type Err = InvalidRule;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.contains('/') {
            let net = s.parse::<IpNet>().map_err(|_| InvalidRule(s.to_string()))?;
            canonical_net(net)
                .map(AddressRule::Net)
                .ok_or_else(|| InvalidRule(s.to_string()))
        } else {
            s.parse::<IpAddr>()
                .map(|ip| AddressRule::Addr(ip.to_canonical()))
                .map_err(|_| InvalidRule(s.to_string()))
        }
    }
}

/// Rewrite an IPv4-mapped block (`::ffff:a.b.c.d/n`, n >= 96) as the IPv4
/// block it covers. A mapped block shorter than /96 spans more than the
/// mapped range and is rejected.
fn canonical_net(net: IpNet) -> Option<IpNet> {
    let IpNet::V6(v6) = net else {
        return Some(net);
    };
    match v6.addr().to_ipv4_mapped() {
        None => Some(net),
        Some(v4) if v6.prefix_len() >= 96 => Ipv4Net::new(v4, v6.prefix_len() - 96)
            .ok()
            .map(|n| IpNet::V4(n.trunc())),
        Some(_) => None,
    }
}

impl AddressRule {
    /// Returns true if `ip` is this address or falls inside this block.
    pub fn contains(&self, ip: &IpAddr) -> bool {
        let ip = ip.to_canonical();
        match self {
            AddressRule::Addr(addr) => *addr == ip,
            AddressRule::Net(net) => net.contains(&ip),
        }
    }
}

/// A parsed, ordered set of whitelist rules.
#[derive(Debug, Clone, Default)]
pub struct Whitelist {
    rules: Vec<AddressRule>,
}

impl Whitelist {
    /// Build from configuration strings. Malformed entries are skipped with a
    /// warning; config validation rejects them before startup anyway.
    pub fn from_rules<S: AsRef<str>>(rules: &[S]) -> Self {
        let rules = rules
            .iter()
            .filter_map(|raw| match raw.as_ref().parse::<AddressRule>() {
                Ok(rule) => Some(rule),
                Err(e) => {
                    tracing::warn!(error = %e, "Ignoring whitelist entry");
                    None
                }
            })
            .collect();
        Self { rules }
    }

    /// Returns true if `ip` matches any rule.
    pub fn contains(&self, ip: &IpAddr) -> bool {
        self.rules.iter().any(|rule| rule.contains(ip))
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Match a raw client address string against raw rule strings.
///
/// Malformed addresses and malformed rules never match.
pub fn matches<S: AsRef<str>>(address: &str, rules: &[S]) -> bool {
    let Ok(ip) = address.trim().parse::<IpAddr>() else {
        return false;
    };
    rules.iter().any(|raw| {
        raw.as_ref()
            .parse::<AddressRule>()
            .map(|rule| rule.contains(&ip))
            .unwrap_or(false)
    })
}
