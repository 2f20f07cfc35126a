// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::config::{our_addr, Relationship, RouterConfig};
use crate::connection::Transport;
use crate::error::Error;
use crate::log::router_log;
use crate::messages::{
    Body, Message, TableRoute, UpdateMessage, WithdrawNetwork,
};
use crate::policy::{self, Forwarding, Hop};
use rdb::bestpath::bestpath;
use rdb::{Prefix4, RoutingTable};
use slog::Logger;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;

/// The routing engine. A router owns the routing table and the transport to
/// its neighbors and handles one message at a time; all state changes and
/// all resulting transmissions for a message are complete before the next
/// message is looked at.
pub struct Router<T: Transport> {
    /// The static configuration associated with this router.
    pub config: RouterConfig,

    /// Our relationship with each neighbor, indexed by the neighbor's
    /// address.
    neighbors: BTreeMap<Ipv4Addr, Relationship>,

    table: RoutingTable,
    transport: T,

    /// The logger used by this router.
    log: Logger,
}

impl<T: Transport> Router<T> {
    pub fn new(config: RouterConfig, transport: T, log: Logger) -> Self {
        let neighbors = config
            .neighbors
            .iter()
            .map(|n| (n.host, n.relationship))
            .collect();
        Self {
            table: RoutingTable::new(log.clone()),
            config,
            neighbors,
            transport,
            log,
        }
    }

    /// Introduce ourselves to every neighbor.
    pub fn start(&self) {
        for neighbor in self.neighbors.keys() {
            self.send(
                *neighbor,
                Message::new(our_addr(*neighbor), *neighbor, Body::Handshake),
            );
        }
        router_log!(self, info, "router started";
            "neighbors" => self.neighbors.len()
        );
    }

    /// Handle a message that arrived on the link to `neighbor`. Messages that
    /// cannot be handled are logged and dropped without changing any state.
    pub fn deliver(&mut self, neighbor: Ipv4Addr, msg: Message) {
        let title = msg.title();
        if let Err(e) = self.handle(neighbor, msg) {
            router_log!(self, warn, "dropping {title} from {neighbor}: {e}";
                "neighbor" => neighbor.to_string()
            );
        }
    }

    pub fn handle(
        &mut self,
        neighbor: Ipv4Addr,
        msg: Message,
    ) -> Result<(), Error> {
        router_log!(self, trace, "received {}", msg.title();
            "neighbor" => neighbor.to_string(),
            "src" => msg.src.to_string(),
            "dst" => msg.dst.to_string()
        );

        match msg.body {
            Body::Handshake => {
                router_log!(self, debug, "handshake from {}", msg.src);
                Ok(())
            }
            Body::Update(ref update) => {
                self.handle_update(msg.src, msg.dst, update)
            }
            Body::Withdraw(ref networks) => {
                self.handle_withdraw(msg.src, msg.dst, networks)
            }
            Body::Data(_) => {
                self.handle_data(&msg);
                Ok(())
            }
            Body::Dump => self.handle_dump(msg.src),
            Body::Table(_) | Body::NoRoute => Err(Error::ProtocolViolation(
                format!("routers do not accept {}s", msg.title()),
            )),
        }
    }

    /// The routing table as it currently stands.
    pub fn table(&self) -> &RoutingTable {
        &self.table
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn relationship(&self, neighbor: Ipv4Addr) -> Option<Relationship> {
        self.neighbors.get(&neighbor).copied()
    }

    /// Routing announcements must come from a configured neighbor and be
    /// addressed to our end of the link to it.
    fn check_announcement(
        &self,
        src: Ipv4Addr,
        dst: Ipv4Addr,
    ) -> Result<Relationship, Error> {
        let relationship = self
            .relationship(src)
            .ok_or(Error::UnknownNeighbor(src))?;
        let expected = our_addr(src);
        if dst != expected {
            return Err(Error::ProtocolViolation(format!(
                "announcement from {src} addressed to {dst}, expected {expected}"
            )));
        }
        Ok(relationship)
    }

    fn handle_update(
        &mut self,
        src: Ipv4Addr,
        dst: Ipv4Addr,
        update: &UpdateMessage,
    ) -> Result<(), Error> {
        let relationship = self.check_announcement(src, dst)?;
        let route = update.route(src)?;

        router_log!(self, info, "update {}", route;
            "relationship" => relationship.to_string(),
            "as_path" => format!("{:?}", route.as_path)
        );
        self.table.insert(route);

        let exported = Body::Update(update.exported(self.config.asn));
        self.announce(src, relationship, &exported);
        Ok(())
    }

    fn handle_withdraw(
        &mut self,
        src: Ipv4Addr,
        dst: Ipv4Addr,
        networks: &[WithdrawNetwork],
    ) -> Result<(), Error> {
        let relationship = self.check_announcement(src, dst)?;

        // Every listed network has to parse before any of them is removed.
        let prefixes = networks
            .iter()
            .map(WithdrawNetwork::prefix)
            .collect::<Result<Vec<Prefix4>, Error>>()?;

        for prefix in &prefixes {
            let removed = self.table.withdraw(prefix, src);
            router_log!(self, info, "withdraw {} via {}", prefix, src;
                "removed" => removed
            );
        }

        self.announce(src, relationship, &Body::Withdraw(networks.to_vec()));
        Ok(())
    }

    fn handle_data(&self, msg: &Message) {
        let source = self.hop_toward(msg.src);
        let destination = self.hop_toward(msg.dst);

        match policy::forwarding(source, destination) {
            Forwarding::Forward(nexthop) => {
                router_log!(self, debug,
                    "forwarding data {} -> {} via {}", msg.src, msg.dst, nexthop);
                self.send(nexthop, msg.clone());
            }
            Forwarding::NoRoute(back) => {
                router_log!(self, debug,
                    "no route for data {} -> {}", msg.src, msg.dst);
                self.send(
                    back,
                    Message::new(our_addr(back), msg.src, Body::NoRoute),
                );
            }
            Forwarding::Drop => {
                router_log!(self, debug,
                    "dropping data {} -> {}, no route back to source",
                    msg.src, msg.dst);
            }
        }
    }

    fn handle_dump(&self, src: Ipv4Addr) -> Result<(), Error> {
        if !self.neighbors.contains_key(&src) {
            return Err(Error::UnknownNeighbor(src));
        }
        let routes = self.table.routes().map(TableRoute::from).collect();
        self.send(src, Message::new(our_addr(src), src, Body::Table(routes)));
        Ok(())
    }

    fn hop_toward(&self, addr: Ipv4Addr) -> Option<Hop> {
        bestpath(&self.table, addr).map(|route| Hop {
            nexthop: route.nexthop,
            relationship: self.relationship(route.nexthop),
        })
    }

    /// Pass an announcement learned from `source` on to the neighbors export
    /// policy allows.
    fn announce(
        &self,
        source: Ipv4Addr,
        relationship: Relationship,
        body: &Body,
    ) {
        for target in
            policy::export_targets(source, relationship, &self.neighbors)
        {
            self.send(
                target,
                Message::new(our_addr(target), target, body.clone()),
            );
        }
    }

    fn send(&self, neighbor: Ipv4Addr, msg: Message) {
        if let Err(e) = self.transport.transmit(neighbor, &msg) {
            router_log!(self, error, "send {} to {}: {e}", msg.title(), neighbor;
                "neighbor" => neighbor.to_string()
            );
        }
    }
}
