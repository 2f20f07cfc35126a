// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The routing table.
//!
//! The table holds standalone routes and aggregates. An aggregate is a
//! synthetic route covering two or more attribute-equal member routes whose
//! address ranges touch or overlap. Members of an aggregate are never present
//! in the table themselves; instead a reverse index maps every member to the
//! aggregate that currently covers it, so that withdrawing one member can
//! dissolve exactly that aggregate and give the remaining members back to the
//! table.
//!
//! Entries are keyed by a monotonically increasing [`RouteId`], so iteration
//! order is insertion order and is stable across runs.

use crate::log::rdb_log;
use crate::types::{Prefix4, Route};
use slog::Logger;
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::net::Ipv4Addr;

/// Identity of a route held by the table, either as an entry or as a member
/// of an aggregate.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RouteId(u64);

impl Display for RouteId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub id: RouteId,
    pub route: Route,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Simple(Route),
    Aggregate { route: Route, members: Vec<Member> },
}

impl Entry {
    /// The route this entry presents to lookups and dumps.
    pub fn route(&self) -> &Route {
        match self {
            Entry::Simple(route) => route,
            Entry::Aggregate { route, .. } => route,
        }
    }

    pub fn members(&self) -> &[Member] {
        match self {
            Entry::Simple(_) => &[],
            Entry::Aggregate { members, .. } => members,
        }
    }
}

pub struct RoutingTable {
    entries: BTreeMap<RouteId, Entry>,

    /// Reverse index from aggregate members to the aggregate covering them.
    aggregated: BTreeMap<RouteId, RouteId>,

    next_id: u64,
    log: Logger,
}

impl RoutingTable {
    pub fn new(log: Logger) -> Self {
        Self {
            entries: BTreeMap::new(),
            aggregated: BTreeMap::new(),
            next_id: 0,
            log,
        }
    }

    fn allocate_id(&mut self) -> RouteId {
        let id = RouteId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Add a route. If an existing entry is attribute-equal and its range is
    /// adjacent to or overlaps the new route, the two are folded into one
    /// aggregate that replaces the existing entry. Only the first such entry
    /// in table order is considered. Returns the id of the entry now covering
    /// the route.
    pub fn insert(&mut self, route: Route) -> RouteId {
        let member = Member {
            id: self.allocate_id(),
            route,
        };

        let candidate = self
            .entries
            .iter()
            .find(|(_, entry)| member.route.can_aggregate(entry.route()))
            .map(|(id, _)| *id);

        let existing = match candidate.and_then(|id| {
            self.entries.remove(&id).map(|entry| (id, entry))
        }) {
            Some(existing) => existing,
            None => {
                rdb_log!(self, debug, "add route {}", member.route;
                    "id" => member.id.0
                );
                self.entries.insert(member.id, Entry::Simple(member.route));
                return member.id;
            }
        };

        let (existing_id, existing) = existing;
        let prefix = member.route.prefix.covering(&existing.route().prefix);
        let route = Route {
            prefix,
            ..member.route.clone()
        };

        let mut members = vec![member];
        match existing {
            Entry::Simple(r) => members.push(Member {
                id: existing_id,
                route: r,
            }),
            Entry::Aggregate { members: m, .. } => members.extend(m),
        }

        let id = self.allocate_id();
        for m in &members {
            self.aggregated.insert(m.id, id);
        }

        rdb_log!(self, debug, "aggregate {} members into {}",
            members.len(), route;
            "id" => id.0,
            "replaces" => existing_id.0
        );

        self.entries.insert(id, Entry::Aggregate { route, members });
        id
    }

    /// Withdraw every route for `prefix` learned from `nexthop`. Aggregates
    /// holding such a route are dissolved and their other members inserted
    /// again, so they may aggregate among themselves or stand alone. Returns
    /// the number of routes removed; withdrawing an unknown route is not an
    /// error.
    pub fn withdraw(&mut self, prefix: &Prefix4, nexthop: Ipv4Addr) -> usize {
        let mut removed = 0;

        while let Some(aggregate_id) = self.aggregate_holding(prefix, nexthop) {
            let Some(entry) = self.entries.remove(&aggregate_id) else {
                rdb_log!(self, error,
                    "reverse index refers to missing aggregate {}",
                    aggregate_id
                );
                self.aggregated.retain(|_, a| *a != aggregate_id);
                continue;
            };

            let members = match entry {
                Entry::Aggregate { members, .. } => members,
                Entry::Simple(route) => {
                    rdb_log!(self, error,
                        "reverse index refers to standalone route {}",
                        route
                    );
                    self.entries.insert(aggregate_id, Entry::Simple(route));
                    self.aggregated.retain(|_, a| *a != aggregate_id);
                    continue;
                }
            };

            for m in &members {
                self.aggregated.remove(&m.id);
            }

            let (gone, keep): (Vec<Member>, Vec<Member>) = members
                .into_iter()
                .partition(|m| m.route.is_withdrawn_by(prefix, nexthop));

            rdb_log!(self, debug, "disaggregate {}", aggregate_id;
                "withdrawn" => gone.len(),
                "reinserted" => keep.len()
            );

            removed += gone.len();
            for m in keep {
                self.insert(m.route);
            }
        }

        let before = self.entries.len();
        self.entries.retain(|_, entry| match entry {
            Entry::Simple(route) => !route.is_withdrawn_by(prefix, nexthop),
            Entry::Aggregate { .. } => true,
        });
        removed += before - self.entries.len();

        if removed == 0 {
            rdb_log!(self, debug, "withdraw of unknown route {}", prefix;
                "nexthop" => nexthop.to_string()
            );
        }

        removed
    }

    fn aggregate_holding(
        &self,
        prefix: &Prefix4,
        nexthop: Ipv4Addr,
    ) -> Option<RouteId> {
        self.aggregated.iter().find_map(|(member_id, aggregate_id)| {
            let entry = self.entries.get(aggregate_id)?;
            entry
                .members()
                .iter()
                .any(|m| {
                    m.id == *member_id && m.route.is_withdrawn_by(prefix, nexthop)
                })
                .then_some(*aggregate_id)
        })
    }

    /// The routes visible in the table, in table order.
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.entries.values().map(Entry::route)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&RouteId, &Entry)> {
        self.entries.iter()
    }

    pub fn entry(&self, id: RouteId) -> Option<&Entry> {
        self.entries.get(&id)
    }

    /// A copy of the visible routes, in table order.
    pub fn snapshot(&self) -> Vec<Route> {
        self.routes().cloned().collect()
    }

    /// The member routes of the entry `id`. Empty for standalone entries.
    pub fn members(&self, id: RouteId) -> Vec<&Route> {
        self.entries
            .get(&id)
            .map(|e| e.members().iter().map(|m| &m.route).collect())
            .unwrap_or_default()
    }

    /// The aggregate currently covering `member`, if it is aggregated.
    pub fn aggregate_of(&self, member: &Route) -> Option<&Route> {
        self.aggregated.iter().find_map(|(member_id, aggregate_id)| {
            let entry = self.entries.get(aggregate_id)?;
            entry
                .members()
                .iter()
                .any(|m| m.id == *member_id && m.route == *member)
                .then(|| entry.route())
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
