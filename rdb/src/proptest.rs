// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Property-based tests for address arithmetic and table aggregation
//! using proptest.

#[cfg(test)]
mod proptest {
    use crate::addr::{
        from_binary, netmask, prefix_length_from_mask, to_binary,
    };
    use crate::bestpath::bestpath;
    use crate::types::{Origin, Prefix4, Route};
    use crate::RoutingTable;
    use proptest::prelude::*;
    use slog::{o, Discard, Logger};
    use std::net::Ipv4Addr;

    fn discard() -> Logger {
        Logger::root(Discard, o!())
    }

    fn route(prefix: Prefix4) -> Route {
        Route {
            prefix,
            nexthop: Ipv4Addr::new(192, 0, 2, 2),
            local_pref: 100,
            self_originated: false,
            as_path: vec![64500],
            origin: Origin::Igp,
        }
    }

    // Strategy for prefixes with host bits cleared and a length of at least 1
    // so that a sibling prefix exists.
    fn sibling_pair_strategy() -> impl Strategy<Value = (Prefix4, Prefix4)> {
        (any::<u32>(), 1u8..=32u8).prop_map(|(bits, length)| {
            let mask = u32::MAX << (32 - u32::from(length));
            let value = bits & mask;
            let sibling = value ^ (1u32 << (32 - u32::from(length)));
            (
                Prefix4 {
                    value: Ipv4Addr::from_bits(value),
                    length,
                },
                Prefix4 {
                    value: Ipv4Addr::from_bits(sibling),
                    length,
                },
            )
        })
    }

    // Strategy for a prefix and a strictly more specific prefix inside it.
    fn nested_pair_strategy() -> impl Strategy<Value = (Prefix4, Prefix4)> {
        (any::<u32>(), 0u8..32u8, 1u8..=32u8).prop_map(
            |(bits, outer, extra)| {
                let inner = (outer + extra).min(32);
                let outer_mask = crate::addr::mask_bits(outer);
                let inner_mask = crate::addr::mask_bits(inner);
                (
                    Prefix4 {
                        value: Ipv4Addr::from_bits(bits & outer_mask),
                        length: outer,
                    },
                    Prefix4 {
                        value: Ipv4Addr::from_bits(bits & inner_mask),
                        length: inner,
                    },
                )
            },
        )
    }

    proptest! {
        /// Property: converting to binary and back yields the original address
        #[test]
        fn prop_binary_roundtrip(bits in any::<u32>()) {
            let addr = Ipv4Addr::from_bits(bits);
            let binary = to_binary(addr);
            prop_assert_eq!(binary.len(), 32);
            prop_assert_eq!(from_binary(&binary), Ok(addr));
        }

        /// Property: every contiguous mask survives a round trip through its
        /// prefix length
        #[test]
        fn prop_netmask_roundtrip(length in 0u8..=32u8) {
            let mask = netmask(length);
            prop_assert_eq!(prefix_length_from_mask(mask), Ok(length));
            prop_assert_eq!(netmask(length), mask);
        }

        /// Property: adjacent siblings aggregate into their parent and
        /// withdrawing one leaves exactly the other
        #[test]
        fn prop_sibling_aggregation_reversible(
            (a, b) in sibling_pair_strategy()
        ) {
            let mut table = RoutingTable::new(discard());
            table.insert(route(a));
            let id = table.insert(route(b));

            prop_assert_eq!(table.len(), 1);
            let aggregate = table.entry(id).unwrap().route().clone();
            prop_assert_eq!(aggregate.prefix.length, a.length - 1);
            prop_assert!(aggregate.prefix.contains(a.value));
            prop_assert!(aggregate.prefix.contains(b.value));

            let mut members = table.members(id);
            members.sort_by_key(|r| r.prefix);
            let mut expected = vec![route(a), route(b)];
            expected.sort_by_key(|r| r.prefix);
            prop_assert_eq!(
                members.into_iter().cloned().collect::<Vec<_>>(),
                expected
            );

            prop_assert_eq!(table.withdraw(&a, route(a).nexthop), 1);
            prop_assert_eq!(table.snapshot(), vec![route(b)]);
        }

        /// Property: a prefix and one nested inside it aggregate into the
        /// outer prefix and withdraw cleanly in either order
        #[test]
        fn prop_nested_aggregation_reversible(
            (outer, inner) in nested_pair_strategy(),
            withdraw_outer in any::<bool>(),
        ) {
            let mut table = RoutingTable::new(discard());
            table.insert(route(inner));
            let id = table.insert(route(outer));

            prop_assert_eq!(table.len(), 1);
            prop_assert_eq!(table.entry(id).unwrap().route().prefix, outer);

            let (gone, kept) = if withdraw_outer {
                (outer, inner)
            } else {
                (inner, outer)
            };
            table.withdraw(&gone, route(gone).nexthop);
            prop_assert_eq!(table.snapshot(), vec![route(kept)]);
        }

        /// Property: routes that differ in attributes never merge
        #[test]
        fn prop_attribute_mismatch_never_merges(
            (a, b) in sibling_pair_strategy(),
            local_pref in 0u32..1000,
        ) {
            let mut table = RoutingTable::new(discard());
            table.insert(route(a));
            table.insert(Route {
                local_pref: local_pref + 1000,
                ..route(b)
            });
            prop_assert_eq!(table.len(), 2);
        }

        /// Property: the best route for an address always covers it
        #[test]
        fn prop_bestpath_covers_destination(
            (a, b) in sibling_pair_strategy(),
            dst in any::<u32>(),
        ) {
            let mut table = RoutingTable::new(discard());
            table.insert(route(a));
            table.insert(Route {
                nexthop: Ipv4Addr::new(192, 0, 2, 3),
                ..route(b)
            });
            let dst = Ipv4Addr::from_bits(dst);
            match bestpath(&table, dst) {
                Some(best) => prop_assert!(best.prefix.contains(dst)),
                None => {
                    prop_assert!(!a.contains(dst) && !b.contains(dst))
                }
            }
        }
    }
}
