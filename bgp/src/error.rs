// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::net::Ipv4Addr;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),

    #[error("format error: {0}")]
    Format(#[from] rdb::error::Error),

    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    #[error("message from unknown neighbor {0}")]
    UnknownNeighbor(Ipv4Addr),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("no link to neighbor {0}")]
    NoLink(Ipv4Addr),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
