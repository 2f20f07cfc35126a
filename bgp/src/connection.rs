// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::error::Error;
use crate::messages::Message;
use std::net::Ipv4Addr;

/// The outbound half of the links to our neighbors. The router only ever
/// needs to hand a message to the link of a particular neighbor; how that
/// link is realized is up to the implementation.
pub trait Transport: Send {
    /// Send `msg` over the link to `neighbor`. Failing to reach one neighbor
    /// must not affect the links to any other.
    fn transmit(&self, neighbor: Ipv4Addr, msg: &Message) -> Result<(), Error>;
}
