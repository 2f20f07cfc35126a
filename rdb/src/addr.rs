// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IPv4 address and CIDR arithmetic.
//!
//! Addresses are carried as [`Ipv4Addr`] everywhere in the routing database.
//! The functions here convert between the dotted quad, 32 character bit
//! string and integer forms, and compute the ranges covered by a
//! network/prefix length pair. All range math is done with plain bit masks on
//! the 32-bit integer value, so prefix lengths that do not fall on an octet
//! boundary behave exactly like the ones that do.

use crate::error::Error;
use std::net::Ipv4Addr;

/// Number of bits in an IPv4 address.
pub const ADDRESS_BITS: u8 = 32;

/// Parse a dotted quad. Exactly four decimal octets in `[0, 255]` are
/// accepted.
pub fn parse_addr(s: &str) -> Result<Ipv4Addr, Error> {
    let octets: Vec<&str> = s.split('.').collect();
    if octets.len() != 4 {
        return Err(Error::Address(s.to_string()));
    }

    let mut out = [0u8; 4];
    for (i, octet) in octets.iter().enumerate() {
        if octet.is_empty() || !octet.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::Address(s.to_string()));
        }
        out[i] = octet
            .parse::<u8>()
            .map_err(|_| Error::Address(s.to_string()))?;
    }

    Ok(Ipv4Addr::from(out))
}

/// Render an address as its 32 character binary form, most significant bit
/// first.
pub fn to_binary(addr: Ipv4Addr) -> String {
    format!("{:032b}", addr.to_bits())
}

/// Inverse of [`to_binary`].
pub fn from_binary(bits: &str) -> Result<Ipv4Addr, Error> {
    if bits.len() != usize::from(ADDRESS_BITS)
        || !bits.bytes().all(|b| b == b'0' || b == b'1')
    {
        return Err(Error::BitString(bits.to_string()));
    }
    let value = u32::from_str_radix(bits, 2)
        .map_err(|_| Error::BitString(bits.to_string()))?;
    Ok(Ipv4Addr::from_bits(value))
}

/// The unsigned integer value of an address.
pub fn to_integer(addr: Ipv4Addr) -> u32 {
    addr.to_bits()
}

/// The mask with the `length` most significant bits set. Lengths beyond 32
/// are treated as 32.
pub fn mask_bits(length: u8) -> u32 {
    let length = length.min(ADDRESS_BITS);
    u32::MAX
        .checked_shl(u32::from(ADDRESS_BITS - length))
        .unwrap_or(0)
}

/// The dotted quad netmask for a prefix length.
pub fn netmask(length: u8) -> Ipv4Addr {
    Ipv4Addr::from_bits(mask_bits(length))
}

/// Count the leading one bits of a netmask. The mask must be a run of ones
/// followed by a run of zeros.
pub fn prefix_length_from_mask(mask: Ipv4Addr) -> Result<u8, Error> {
    let bits = mask.to_bits();
    // at most 32, always fits
    let length = bits.leading_ones() as u8;
    if bits != mask_bits(length) {
        return Err(Error::Netmask(mask));
    }
    Ok(length)
}

/// The inclusive range of addresses covered by `network/length`. Host bits
/// set in `network` are ignored.
pub fn address_range(network: Ipv4Addr, length: u8) -> (Ipv4Addr, Ipv4Addr) {
    let mask = mask_bits(length);
    let first = network.to_bits() & mask;
    let last = first | !mask;
    (Ipv4Addr::from_bits(first), Ipv4Addr::from_bits(last))
}

/// Length of the common leading bit string of two addresses.
pub fn common_prefix_length(a: Ipv4Addr, b: Ipv4Addr) -> u8 {
    // at most 32, always fits
    (a.to_bits() ^ b.to_bits()).leading_zeros() as u8
}

/// Whether the first `length` bits of `network` and `addr` agree.
pub fn covers(network: Ipv4Addr, length: u8, addr: Ipv4Addr) -> bool {
    (network.to_bits() ^ addr.to_bits()) & mask_bits(length) == 0
}

/// The integer formed by writing the octets of `addr` one after another in
/// decimal, e.g. `10.0.0.2` becomes `10002`. This is the ordering used to
/// break final ties between next hops.
pub fn decimal_key(addr: Ipv4Addr) -> u64 {
    addr.octets().iter().fold(0u64, |acc, &octet| {
        let shift = match octet {
            0..=9 => 10,
            10..=99 => 100,
            _ => 1000,
        };
        acc * shift + u64::from(octet)
    })
}
