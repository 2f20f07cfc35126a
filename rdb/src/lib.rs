// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

pub mod addr;
pub mod bestpath;
pub mod error;
pub mod log;
pub mod table;
pub mod types;

pub use table::{Entry, Member, RouteId, RoutingTable};
pub use types::*;

#[cfg(test)]
mod proptest;

/// The local preference assumed for routes whose update did not carry one.
pub const DEFAULT_LOCAL_PREF: u32 = 100;

pub const COMPONENT_RDB: &str = "rdb";
pub const MOD_TABLE: &str = "table";
