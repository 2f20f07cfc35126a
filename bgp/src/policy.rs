// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Relationship based routing policy.
//!
//! Two questions are answered here, both purely from the relationships we
//! hold with our neighbors.
//!
//! - Export: which neighbors hear about a route (or a withdrawal) learned
//!   from a given neighbor. Routes from customers are exported to everyone.
//!   Routes from peers and providers are exported to customers only.
//! - Forwarding: whether a data packet may be carried between the neighbor it
//!   arrived from and the neighbor it would leave through. We only carry
//!   traffic when at least one side of the exchange is a customer, so peers
//!   and providers never get free transit through us.

use crate::config::Relationship;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;

/// The neighbors an announcement learned from `source` should be passed on
/// to, in address order. The source itself is never included.
pub fn export_targets(
    source: Ipv4Addr,
    relationship: Relationship,
    neighbors: &BTreeMap<Ipv4Addr, Relationship>,
) -> Vec<Ipv4Addr> {
    neighbors
        .iter()
        .filter(|(addr, _)| **addr != source)
        .filter(|(_, rel)| {
            relationship == Relationship::Customer
                || **rel == Relationship::Customer
        })
        .map(|(addr, _)| *addr)
        .collect()
}

/// One side of a forwarding decision: the next hop of the best route toward
/// an address, and our relationship with it if it is a configured neighbor.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Hop {
    pub nexthop: Ipv4Addr,
    pub relationship: Option<Relationship>,
}

impl Hop {
    fn is_customer(&self) -> bool {
        self.relationship == Some(Relationship::Customer)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Forwarding {
    /// Send the packet unchanged to this neighbor.
    Forward(Ipv4Addr),

    /// Send a no-route notice back through this neighbor.
    NoRoute(Ipv4Addr),

    /// Nothing can be sent.
    Drop,
}

/// Decide what to do with a data packet given the best hop back toward its
/// source and the best hop toward its destination.
pub fn forwarding(source: Option<Hop>, destination: Option<Hop>) -> Forwarding {
    match (source, destination) {
        (None, _) => Forwarding::Drop,
        (Some(src), None) => Forwarding::NoRoute(src.nexthop),
        (Some(src), Some(dst)) => {
            if src.is_customer() || dst.is_customer() {
                Forwarding::Forward(dst.nexthop)
            } else {
                Forwarding::NoRoute(src.nexthop)
            }
        }
    }
}
