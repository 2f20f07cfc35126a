// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::addr::decimal_key;
use crate::table::RoutingTable;
use crate::types::Route;
use itertools::Itertools;
use std::net::Ipv4Addr;

/// The bestpath algorithm chooses the single best route toward `dst` from
/// the routing table. A route is a candidate when its prefix covers `dst`.
/// Candidates are filtered in the following ordered sequence, each step only
/// deciding between the routes that tied on every step before it.
///
/// - keep the routes with the longest prefix length
/// - keep the routes with the highest local preference
/// - keep self-originated routes if there are any
/// - keep the routes with the shortest AS path
/// - keep the routes with the best origin (IGP, then EGP, then unknown)
/// - pick the route whose next hop has the lowest decimal key, see
///   [`decimal_key`]
///
/// Routes that still tie after every step are resolved by table order, the
/// earliest entry wins. Returns `None` when no route covers `dst`.
pub fn bestpath(table: &RoutingTable, dst: Ipv4Addr) -> Option<&Route> {
    let candidates: Vec<&Route> =
        table.routes().filter(|r| r.prefix.contains(dst)).collect();

    // Short-circuit: if there's only 1 candidate, then it is the best
    if candidates.len() <= 1 {
        return candidates.into_iter().next();
    }

    // Longest prefix match
    let candidates = candidates
        .into_iter()
        .max_set_by_key(|route| route.prefix.length);

    // Filter down to paths with the highest local preference
    let candidates = candidates
        .into_iter()
        .max_set_by_key(|route| route.local_pref);

    // Prefer routes we originated ourselves
    let candidates = candidates
        .into_iter()
        .max_set_by_key(|route| route.self_originated);

    // Filter down to paths with the shortest AS-Path length
    let candidates = candidates
        .into_iter()
        .min_set_by_key(|route| route.as_path.len());

    let candidates = candidates.into_iter().min_set_by_key(|route| route.origin);

    candidates
        .into_iter()
        .min_by_key(|route| decimal_key(route.nexthop))
}

#[cfg(test)]
mod test {
    use super::bestpath;
    use crate::{Origin, Route, RoutingTable};
    use pretty_assertions::assert_eq;
    use pvr_common::ip;
    use pvr_common::log::init_file_logger;

    fn base(prefix: &str, nexthop: &str) -> Route {
        Route {
            prefix: prefix.parse().unwrap(),
            nexthop: ip!(nexthop),
            local_pref: 100,
            self_originated: false,
            as_path: vec![64500, 64501],
            origin: Origin::Egp,
        }
    }

    /// Build a table from routes that are guaranteed not to aggregate with
    /// one another and return the best route toward `dst`.
    fn best(routes: &[Route], dst: &str, log: &str) -> Option<Route> {
        let mut table = RoutingTable::new(init_file_logger(log));
        for r in routes {
            table.insert(r.clone());
        }
        assert_eq!(table.len(), routes.len(), "test routes aggregated");
        bestpath(&table, ip!(dst)).cloned()
    }

    #[test]
    fn empty_table() {
        let table = RoutingTable::new(init_file_logger("bestpath_empty.log"));
        assert_eq!(bestpath(&table, ip!("10.0.0.1")), None);
    }

    #[test]
    fn no_covering_route() {
        let r = base("10.0.0.0/8", "192.168.0.2");
        assert_eq!(best(&[r], "11.0.0.1", "bestpath_miss.log"), None);
    }

    #[test]
    fn longest_prefix_wins() {
        let wide = Route {
            local_pref: 200,
            self_originated: true,
            as_path: vec![],
            origin: Origin::Igp,
            ..base("10.0.0.0/8", "1.0.0.2")
        };
        let narrow = Route {
            local_pref: 50,
            as_path: vec![1, 2, 3, 4],
            origin: Origin::Unknown,
            ..base("10.0.0.0/16", "9.0.0.2")
        };
        assert_eq!(
            best(
                &[wide.clone(), narrow.clone()],
                "10.0.5.5",
                "bestpath_lpm.log"
            ),
            Some(narrow)
        );
        // outside the /16 only the /8 applies
        assert_eq!(
            best(&[wide.clone(), base("10.0.0.0/16", "9.0.0.2")], "10.7.0.1",
                "bestpath_lpm_outside.log"),
            Some(wide)
        );
    }

    #[test]
    fn local_pref_after_prefix() {
        let low = Route {
            self_originated: true,
            as_path: vec![],
            origin: Origin::Igp,
            ..base("10.0.0.0/24", "1.0.0.2")
        };
        let high = Route {
            local_pref: 150,
            as_path: vec![1, 2, 3, 4],
            origin: Origin::Unknown,
            ..base("10.0.0.0/24", "9.0.0.2")
        };
        assert_eq!(
            best(&[low, high.clone()], "10.0.0.9", "bestpath_localpref.log"),
            Some(high)
        );
    }

    #[test]
    fn self_originated_after_local_pref() {
        let theirs = Route {
            as_path: vec![],
            origin: Origin::Igp,
            ..base("10.0.0.0/24", "1.0.0.2")
        };
        let ours = Route {
            self_originated: true,
            as_path: vec![1, 2, 3, 4],
            origin: Origin::Unknown,
            ..base("10.0.0.0/24", "9.0.0.2")
        };
        assert_eq!(
            best(&[theirs, ours.clone()], "10.0.0.9", "bestpath_self.log"),
            Some(ours)
        );
    }

    #[test]
    fn as_path_after_self_originated() {
        let long = Route {
            as_path: vec![1, 2, 3],
            origin: Origin::Igp,
            ..base("10.0.0.0/24", "1.0.0.2")
        };
        let short = Route {
            as_path: vec![7],
            origin: Origin::Unknown,
            ..base("10.0.0.0/24", "9.0.0.2")
        };
        assert_eq!(
            best(&[long, short.clone()], "10.0.0.9", "bestpath_aspath.log"),
            Some(short)
        );
    }

    #[test]
    fn origin_after_as_path() {
        let unk = Route {
            origin: Origin::Unknown,
            ..base("10.0.0.0/24", "1.0.0.2")
        };
        let egp = Route {
            origin: Origin::Egp,
            ..base("10.0.0.0/24", "5.0.0.2")
        };
        let igp = Route {
            origin: Origin::Igp,
            ..base("10.0.0.0/24", "9.0.0.2")
        };
        assert_eq!(
            best(
                &[unk.clone(), egp.clone(), igp.clone()],
                "10.0.0.9",
                "bestpath_origin.log"
            ),
            Some(igp)
        );
        assert_eq!(
            best(&[unk, egp.clone()], "10.0.0.9", "bestpath_origin_egp.log"),
            Some(egp)
        );
    }

    #[test]
    fn nexthop_breaks_final_tie() {
        let a = base("10.0.0.0/24", "172.16.0.2");
        let b = base("10.0.0.0/24", "172.16.0.1");
        assert_eq!(
            best(&[a, b.clone()], "10.0.0.9", "bestpath_nexthop.log"),
            Some(b)
        );

        // The comparison is on the concatenated decimal octets, not on the
        // numeric address: 9.0.0.1 -> 9001 beats 1.100.0.1 -> 110001.
        let a = base("10.0.0.0/24", "1.100.0.1");
        let b = base("10.0.0.0/24", "9.0.0.1");
        assert_eq!(
            best(&[a, b.clone()], "10.0.0.9", "bestpath_nexthop_decimal.log"),
            Some(b)
        );
    }
}
