// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/// This file contains code for testing purposes only. Note that it's only
/// included in `lib.rs` with a `#[cfg(test)]` guard. It implements
/// `Transport` over in-process channels so the router can be driven
/// message by message and everything it sends observed per neighbor.
use crate::connection::Transport;
use crate::error::Error;
use crate::messages::Message;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::sync::mpsc::{channel, Receiver, Sender};

pub struct ChannelTransport {
    links: BTreeMap<Ipv4Addr, Sender<Message>>,
}

/// The far ends of a [`ChannelTransport`], one receiver per neighbor.
pub struct Network {
    pub links: BTreeMap<Ipv4Addr, Receiver<Message>>,
}

impl Network {
    /// Everything sent to `neighbor` since the last call.
    pub fn drain(&self, neighbor: Ipv4Addr) -> Vec<Message> {
        match self.links.get(&neighbor) {
            Some(rx) => rx.try_iter().collect(),
            None => Vec::new(),
        }
    }

    /// Drain every link, returning only the links that saw traffic.
    pub fn drain_all(&self) -> BTreeMap<Ipv4Addr, Vec<Message>> {
        self.links
            .iter()
            .map(|(n, rx)| (*n, rx.try_iter().collect::<Vec<_>>()))
            .filter(|(_, msgs)| !msgs.is_empty())
            .collect()
    }

    /// Take a neighbor off the network. Further sends to it fail.
    pub fn disconnect(&mut self, neighbor: Ipv4Addr) {
        self.links.remove(&neighbor);
    }
}

pub fn network(neighbors: &[Ipv4Addr]) -> (ChannelTransport, Network) {
    let mut links = BTreeMap::new();
    let mut ends = BTreeMap::new();
    for n in neighbors {
        let (tx, rx) = channel();
        links.insert(*n, tx);
        ends.insert(*n, rx);
    }
    (ChannelTransport { links }, Network { links: ends })
}

impl Transport for ChannelTransport {
    fn transmit(&self, neighbor: Ipv4Addr, msg: &Message) -> Result<(), Error> {
        // round trip through the codec so tests see exactly what would go out
        // on the wire
        let msg = Message::from_wire(&msg.to_wire()?)?;
        self.links
            .get(&neighbor)
            .ok_or(Error::NoLink(neighbor))?
            .send(msg)
            .map_err(|_| Error::NoLink(neighbor))
    }
}
