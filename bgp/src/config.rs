// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};
use std::net::Ipv4Addr;
use std::str::FromStr;

/// The business relationship we have with a neighbor.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Relationship {
    /// Pays us for transit. Everything is exported to customers.
    Customer,

    /// Exchanges customer routes with us free of charge.
    Peer,

    /// Sells us transit.
    Provider,
}

impl Display for Relationship {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Relationship::Customer => write!(f, "cust"),
            Relationship::Peer => write!(f, "peer"),
            Relationship::Provider => write!(f, "prov"),
        }
    }
}

impl FromStr for Relationship {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cust" | "customer" => Ok(Relationship::Customer),
            "peer" => Ok(Relationship::Peer),
            "prov" | "provider" => Ok(Relationship::Provider),
            _ => Err(Error::InvalidConfig(format!(
                "unknown relationship '{s}'"
            ))),
        }
    }
}

/// A neighbor link given as `<port>-<address>-<relationship>`, e.g.
/// `7833-192.168.0.2-cust`. The port is the local UDP port of the simulated
/// link, the address is the neighbor router's address on that link.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborConfig {
    pub port: u16,
    pub host: Ipv4Addr,
    pub relationship: Relationship,
}

impl NeighborConfig {
    /// Our own address on the link to this neighbor.
    pub fn our_addr(&self) -> Ipv4Addr {
        our_addr(self.host)
    }
}

impl FromStr for NeighborConfig {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, '-');
        let (Some(port), Some(host), Some(relationship)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(Error::InvalidConfig(format!(
                "neighbor '{s}' is not <port>-<address>-<relationship>"
            )));
        };

        let port = port.parse::<u16>().map_err(|_| {
            Error::InvalidConfig(format!("bad port '{port}' in '{s}'"))
        })?;
        let host = rdb::addr::parse_addr(host)?;
        Ok(NeighborConfig {
            port,
            host,
            relationship: relationship.parse()?,
        })
    }
}

impl Display for NeighborConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.port, self.host, self.relationship)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterConfig {
    pub asn: u32,
    pub neighbors: Vec<NeighborConfig>,
}

impl RouterConfig {
    /// Validate a router configuration. Neighbor addresses identify links,
    /// so each may only appear once.
    pub fn new(
        asn: u32,
        neighbors: Vec<NeighborConfig>,
    ) -> Result<Self, Error> {
        let mut seen = BTreeSet::new();
        for n in &neighbors {
            if !seen.insert(n.host) {
                return Err(Error::InvalidConfig(format!(
                    "neighbor {} configured more than once",
                    n.host
                )));
            }
        }
        Ok(Self { asn, neighbors })
    }
}

/// Our address on a link is the neighbor's address with the last octet set
/// to 1.
pub fn our_addr(neighbor: Ipv4Addr) -> Ipv4Addr {
    let [a, b, c, _] = neighbor.octets();
    Ipv4Addr::new(a, b, c, 1)
}
