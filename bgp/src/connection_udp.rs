// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Neighbor links over UDP.
//!
//! Each neighbor gets its own socket bound to an ephemeral local port. We
//! send to the neighbor's configured port on the remote host and read
//! whatever arrives on our socket. One ingress thread per link decodes
//! datagrams and hands them to the router thread over a channel tagged with
//! the neighbor they came in on.

use crate::config::NeighborConfig;
use crate::connection::Transport;
use crate::error::Error;
use crate::log::connection_log_lite;
use crate::messages::Message;
use crate::{IO_TIMEOUT, MAX_MESSAGE_SIZE};
use slog::Logger;
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::mem::MaybeUninit;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{spawn, JoinHandle};

const UNIT_CONNECTION: &str = "udp";

struct Link {
    sk: Socket,
    remote: SockAddr,
}

pub struct UdpTransport {
    links: BTreeMap<Ipv4Addr, Link>,
    log: Logger,
}

impl UdpTransport {
    /// Open one socket per neighbor on `bind`, each sending to the neighbor's
    /// port on `remote_host`.
    pub fn bind(
        bind: IpAddr,
        remote_host: IpAddr,
        neighbors: &[NeighborConfig],
        log: Logger,
    ) -> Result<Self, Error> {
        let domain = if bind.is_ipv4() {
            Domain::IPV4
        } else {
            Domain::IPV6
        };

        let mut links = BTreeMap::new();
        for n in neighbors {
            let sk = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
            sk.bind(&SocketAddr::new(bind, 0).into())?;
            sk.set_read_timeout(Some(IO_TIMEOUT))?;

            let remote: SockAddr = SocketAddr::new(remote_host, n.port).into();
            let local = sk.local_addr()?.as_socket();
            connection_log_lite!(log, info,
                "link to {} via port {}", n.host, n.port;
                "neighbor" => n.host.to_string(),
                "relationship" => n.relationship.to_string(),
                "local" => format!("{local:?}")
            );
            links.insert(n.host, Link { sk, remote });
        }

        Ok(Self { links, log })
    }

    /// Start an ingress thread for every link. Decoded messages are sent on
    /// `tx` along with the neighbor whose link they arrived on. The threads
    /// exit once `shutdown` is set or the receiving end of `tx` goes away.
    pub fn ingress(
        &self,
        tx: Sender<(Ipv4Addr, Message)>,
        shutdown: Arc<AtomicBool>,
    ) -> Result<Vec<JoinHandle<()>>, Error> {
        let mut handles = Vec::new();
        for (neighbor, link) in &self.links {
            handles.push(ingress(
                *neighbor,
                link.sk.try_clone()?,
                tx.clone(),
                shutdown.clone(),
                self.log.clone(),
            ));
        }
        Ok(handles)
    }
}

impl Transport for UdpTransport {
    fn transmit(&self, neighbor: Ipv4Addr, msg: &Message) -> Result<(), Error> {
        let link = self.links.get(&neighbor).ok_or(Error::NoLink(neighbor))?;
        let buf = msg.to_wire()?;
        link.sk.send_to(&buf, &link.remote)?;
        connection_log_lite!(self.log, trace,
            "sent {} to {}", msg.title(), neighbor;
            "bytes" => buf.len()
        );
        Ok(())
    }
}

fn ingress(
    neighbor: Ipv4Addr,
    sk: Socket,
    tx: Sender<(Ipv4Addr, Message)>,
    shutdown: Arc<AtomicBool>,
    log: Logger,
) -> JoinHandle<()> {
    spawn(move || {
        let mut buf = vec![MaybeUninit::new(0u8); MAX_MESSAGE_SIZE];
        loop {
            if shutdown.load(Ordering::Relaxed) {
                connection_log_lite!(log, debug,
                    "ingress for {} shutting down", neighbor);
                break;
            }

            let n = match sk.recv_from(&mut buf) {
                Ok((n, _)) => n,
                Err(e)
                    if e.kind() == ErrorKind::WouldBlock
                        || e.kind() == ErrorKind::TimedOut =>
                {
                    continue;
                }
                Err(e) => {
                    connection_log_lite!(log, error,
                        "udp recv from {}: {e}", neighbor);
                    continue;
                }
            };

            let ibuf = unsafe { &u8_slice_assume_init_ref(&buf)[..n] };

            let msg = match Message::from_wire(ibuf) {
                Ok(msg) => msg,
                Err(e) => {
                    connection_log_lite!(log, warn,
                        "dropping undecodable datagram from {}: {e}", neighbor;
                        "bytes" => n
                    );
                    continue;
                }
            };

            if let Err(e) = tx.send((neighbor, msg)) {
                connection_log_lite!(log, warn,
                    "ingress channel for {} closed: {e}", neighbor);
                break;
            }
        }
    })
}

//TODO trade for `MaybeUninit::slice_assume_init_ref` when it becomes available
//in stable Rust.
#[inline(always)]
const unsafe fn u8_slice_assume_init_ref(slice: &[MaybeUninit<u8>]) -> &[u8] {
    unsafe { &*(slice as *const [MaybeUninit<u8>] as *const [u8]) }
}
