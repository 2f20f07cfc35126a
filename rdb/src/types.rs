// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::addr;
use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::net::Ipv4Addr;
use std::str::FromStr;

/// Where a route was learned from. The declaration order is the preference
/// order used by bestpath: IGP beats EGP beats unknown.
#[derive(
    Debug,
    Copy,
    Clone,
    Default,
    Serialize,
    Deserialize,
    Eq,
    Hash,
    PartialEq,
    PartialOrd,
    Ord,
)]
pub enum Origin {
    #[serde(rename = "IGP")]
    Igp,
    #[serde(rename = "EGP")]
    Egp,
    #[default]
    #[serde(rename = "UNK")]
    Unknown,
}

impl Display for Origin {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Igp => write!(f, "IGP"),
            Origin::Egp => write!(f, "EGP"),
            Origin::Unknown => write!(f, "UNK"),
        }
    }
}

impl FromStr for Origin {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "IGP" => Ok(Origin::Igp),
            "EGP" => Ok(Origin::Egp),
            "UNK" => Ok(Origin::Unknown),
            _ => Err(Error::Origin(s.to_string())),
        }
    }
}

/// An IPv4 network and prefix length. The network is kept exactly as it was
/// announced; host bits are only masked off when computing ranges.
#[derive(Debug, Copy, Clone, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct Prefix4 {
    pub value: Ipv4Addr,
    pub length: u8,
}

impl Prefix4 {
    pub fn new(value: Ipv4Addr, length: u8) -> Result<Self, Error> {
        if length > addr::ADDRESS_BITS {
            return Err(Error::PrefixLength(length));
        }
        Ok(Self { value, length })
    }

    /// Build a prefix from a network and a dotted quad netmask.
    pub fn with_netmask(value: Ipv4Addr, mask: Ipv4Addr) -> Result<Self, Error> {
        Ok(Self {
            value,
            length: addr::prefix_length_from_mask(mask)?,
        })
    }

    pub fn netmask(&self) -> Ipv4Addr {
        addr::netmask(self.length)
    }

    /// First and last address covered by this prefix.
    pub fn range(&self) -> (Ipv4Addr, Ipv4Addr) {
        addr::address_range(self.value, self.length)
    }

    pub fn contains(&self, a: Ipv4Addr) -> bool {
        addr::covers(self.value, self.length, a)
    }

    /// True when the address ranges of the two prefixes touch end to end or
    /// one of them covers the other.
    pub fn adjacent_or_overlapping(&self, other: &Prefix4) -> bool {
        let (lo, hi) = self.range();
        let (olo, ohi) = other.range();
        let (lo, hi, olo, ohi) =
            (lo.to_bits(), hi.to_bits(), olo.to_bits(), ohi.to_bits());

        let adjacent = hi.checked_add(1) == Some(olo)
            || ohi.checked_add(1) == Some(lo);
        let other_contains_self = olo <= lo && ohi >= hi;
        let self_contains_other = lo <= olo && hi >= ohi;

        adjacent || other_contains_self || self_contains_other
    }

    /// The narrowest prefix covering both networks: their common leading
    /// bits, never longer than either input, with the trailing bits zeroed.
    pub fn covering(&self, other: &Prefix4) -> Prefix4 {
        let length = addr::common_prefix_length(self.value, other.value)
            .min(self.length)
            .min(other.length);
        Prefix4 {
            value: addr::address_range(self.value, length).0,
            length,
        }
    }
}

impl Display for Prefix4 {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.value, self.length)
    }
}

impl FromStr for Prefix4 {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (value, length) = s
            .split_once('/')
            .ok_or_else(|| Error::Prefix(s.to_string()))?;
        let length = length
            .parse::<u8>()
            .map_err(|_| Error::Prefix(s.to_string()))?;
        Prefix4::new(addr::parse_addr(value)?, length)
    }
}

/// A route as held in the routing table.
///
/// Two routes are equal when every field matches. Two routes are
/// attribute-equal when everything except the prefix matches, which is the
/// condition for folding them into one aggregate.
#[derive(Debug, Clone, Eq, Hash, PartialEq)]
pub struct Route {
    pub prefix: Prefix4,

    /// Address of the neighbor the route was learned from.
    pub nexthop: Ipv4Addr,

    pub local_pref: u32,
    pub self_originated: bool,
    pub as_path: Vec<u32>,
    pub origin: Origin,
}

impl Route {
    pub fn attributes_equal(&self, other: &Route) -> bool {
        self.nexthop == other.nexthop
            && self.local_pref == other.local_pref
            && self.self_originated == other.self_originated
            && self.as_path == other.as_path
            && self.origin == other.origin
    }

    /// Whether this route is the one a withdrawal of `prefix` from `nexthop`
    /// refers to.
    pub fn is_withdrawn_by(&self, prefix: &Prefix4, nexthop: Ipv4Addr) -> bool {
        self.prefix == *prefix && self.nexthop == nexthop
    }

    /// Aggregation is allowed between attribute-equal routes whose ranges
    /// are adjacent or overlapping.
    pub fn can_aggregate(&self, other: &Route) -> bool {
        self.attributes_equal(other)
            && self.prefix.adjacent_or_overlapping(&other.prefix)
    }

    pub fn netmask(&self) -> Ipv4Addr {
        self.prefix.netmask()
    }
}

impl Display for Route {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} via {}", self.prefix, self.nexthop)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use pvr_common::ip;

    fn route(prefix: &str, nexthop: &str) -> Route {
        Route {
            prefix: prefix.parse().unwrap(),
            nexthop: ip!(nexthop),
            local_pref: 100,
            self_originated: false,
            as_path: vec![1, 2],
            origin: Origin::Egp,
        }
    }

    #[test]
    fn prefix_parsing() {
        let p: Prefix4 = "192.168.0.0/24".parse().unwrap();
        assert_eq!(p.value, ip!("192.168.0.0"));
        assert_eq!(p.length, 24);
        assert_eq!(p.netmask(), ip!("255.255.255.0"));
        assert_eq!(p.to_string(), "192.168.0.0/24");

        assert!("192.168.0.0/33".parse::<Prefix4>().is_err());
        assert!("192.168.0.0".parse::<Prefix4>().is_err());
        assert!("192.168.0/24".parse::<Prefix4>().is_err());

        assert_eq!(
            Prefix4::with_netmask(ip!("10.0.0.0"), ip!("255.255.0.0")),
            Ok(p16("10.0.0.0"))
        );
        assert!(
            Prefix4::with_netmask(ip!("10.0.0.0"), ip!("255.0.255.0")).is_err()
        );
    }

    fn p16(v: &str) -> Prefix4 {
        Prefix4 {
            value: ip!(v),
            length: 16,
        }
    }

    #[test]
    fn adjacency() {
        let a: Prefix4 = "192.168.0.0/24".parse().unwrap();
        let b: Prefix4 = "192.168.1.0/24".parse().unwrap();
        let c: Prefix4 = "192.168.2.0/24".parse().unwrap();
        let wide: Prefix4 = "192.168.0.0/16".parse().unwrap();

        assert!(a.adjacent_or_overlapping(&b));
        assert!(b.adjacent_or_overlapping(&a));
        assert!(!a.adjacent_or_overlapping(&c));
        assert!(a.adjacent_or_overlapping(&wide));
        assert!(wide.adjacent_or_overlapping(&c));

        let top: Prefix4 = "255.255.255.0/24".parse().unwrap();
        let bottom: Prefix4 = "0.0.0.0/24".parse().unwrap();
        assert!(!top.adjacent_or_overlapping(&bottom));
    }

    #[test]
    fn covering_prefix() {
        let a: Prefix4 = "192.168.0.0/24".parse().unwrap();
        let b: Prefix4 = "192.168.1.0/24".parse().unwrap();
        assert_eq!(a.covering(&b), "192.168.0.0/23".parse::<Prefix4>().unwrap());

        let wide: Prefix4 = "10.0.0.0/8".parse().unwrap();
        let narrow: Prefix4 = "10.0.0.0/16".parse().unwrap();
        assert_eq!(narrow.covering(&wide), wide);
    }

    #[test]
    fn route_equality() {
        let a = route("10.0.0.0/24", "172.16.0.2");
        let mut b = route("10.0.1.0/24", "172.16.0.2");
        assert!(a.attributes_equal(&b));
        assert_ne!(a, b);
        assert!(a.can_aggregate(&b));

        b.as_path.push(3);
        assert!(!a.attributes_equal(&b));
        assert!(!a.can_aggregate(&b));

        let mut c = a.clone();
        c.origin = Origin::Igp;
        assert!(!a.attributes_equal(&c));

        assert!(a.is_withdrawn_by(&a.prefix, ip!("172.16.0.2")));
        assert!(!a.is_withdrawn_by(&a.prefix, ip!("172.16.0.3")));
    }

    #[test]
    fn origin_order() {
        assert!(Origin::Igp < Origin::Egp);
        assert!(Origin::Egp < Origin::Unknown);
        assert_eq!("igp".parse::<Origin>(), Ok(Origin::Igp));
        assert_eq!("UNK".parse::<Origin>(), Ok(Origin::Unknown));
        assert!("BGP".parse::<Origin>().is_err());
    }
}
