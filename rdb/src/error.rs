// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/// Format errors raised while interpreting addresses, masks and prefixes.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("malformed address {0:?}")]
    Address(String),

    #[error("malformed bit string {0:?}")]
    BitString(String),

    #[error("non-contiguous netmask {0}")]
    Netmask(std::net::Ipv4Addr),

    #[error("invalid prefix length {0}, max is 32")]
    PrefixLength(u8),

    #[error("unknown origin {0:?}")]
    Origin(String),

    #[error("malformed prefix {0:?}")]
    Prefix(String),
}
