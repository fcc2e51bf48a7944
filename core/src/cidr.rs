// Copyright 2023-2024 The Milton Hirsch Institute, B.V.
// SPDX-License-Identifier: Apache-2.0

//! IPv4 network arithmetic: parsing, canonicalization, splitting and the
//! sibling-ordinal test the allocator and deallocator walk the rootline
//! with. Kept free of any knowledge of pools, nodes or the store.

use cidr::Ipv4Cidr;
use cidr_utils::separator::Ipv4CidrSeparator;
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CidrParseError(String);

impl fmt::Display for CidrParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid CIDR '{}'", self.0)
    }
}

impl std::error::Error for CidrParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

fn mask(prefix_length: u8) -> u32 {
    if prefix_length == 0 {
        0
    } else {
        u32::MAX << (32 - prefix_length as u32)
    }
}

fn network_address(addr: u32, prefix_length: u8) -> u32 {
    addr & mask(prefix_length)
}

/// Build a `Ipv4Cidr` whose address is the canonical network address for
/// `prefix_length`, zeroing host bits regardless of what `addr` carried.
fn canonicalize(addr: Ipv4Addr, prefix_length: u8) -> Ipv4Cidr {
    let network = network_address(u32::from(addr), prefix_length);
    Ipv4Cidr::new(Ipv4Addr::from(network), prefix_length)
        .expect("masked address and in-range prefix is always a valid network")
}

/// Parse a CIDR in `A.B.C.D/n` form, canonicalizing host bits to zero.
pub fn parse(text: &str) -> Result<Ipv4Cidr, CidrParseError> {
    let raw = Ipv4Cidr::from_str(text).map_err(|_| CidrParseError(text.to_string()))?;
    Ok(canonicalize(raw.first_address(), raw.network_length()))
}

/// Canonical textual form, e.g. `10.0.0.0/16`.
pub fn to_string(net: &Ipv4Cidr) -> String {
    net.to_string()
}

pub fn prefix_length(net: &Ipv4Cidr) -> u8 {
    net.network_length()
}

/// The /n-1 network that contains `net` as one of its two halves.
///
/// Panics if `net` is already a /0; the allocator never calls this on a
/// root, and roots are never narrower than /0 in practice.
pub fn supernet(net: &Ipv4Cidr) -> Ipv4Cidr {
    let new_prefix = net
        .network_length()
        .checked_sub(1)
        .expect("supernet of /0 is undefined");
    canonicalize(net.first_address(), new_prefix)
}

/// The left then right /n+1 halves of `net`, in that order. Delegates
/// the split itself to `cidr_utils`, the way the teacher's
/// `subspace.rs` splits a `Subspace` in two.
pub fn subnets(net: &Ipv4Cidr) -> [Ipv4Cidr; 2] {
    let new_prefix = net.network_length() + 1;
    let halves = Ipv4CidrSeparator::sub_networks(net, new_prefix)
        .expect("splitting a /n (n<32) into two /n+1s always succeeds");
    [*halves.get(0).unwrap(), *halves.get(1).unwrap()]
}

/// True iff `inner` is `outer` or strictly nested inside it.
pub fn subnet_of(inner: &Ipv4Cidr, outer: &Ipv4Cidr) -> bool {
    if inner.network_length() < outer.network_length() {
        return false;
    }
    network_address(u32::from(inner.first_address()), outer.network_length())
        == u32::from(outer.first_address())
}

/// True iff two CIDRs overlap in either direction (neither is required to
/// be narrower than the other).
pub fn overlaps(a: &Ipv4Cidr, b: &Ipv4Cidr) -> bool {
    subnet_of(a, b) || subnet_of(b, a)
}

/// True iff `net` equals the left half of its supernet. Well-defined for
/// any prefix 1-32; callers never invoke it on a /0.
pub fn is_left(net: &Ipv4Cidr) -> bool {
    let [left, _right] = subnets(&supernet(net));
    left == *net
}

/// `net` narrowed (or widened) to the same network address at a
/// different prefix length.
pub fn with_prefix_length(net: &Ipv4Cidr, prefix_length: u8) -> Ipv4Cidr {
    canonicalize(net.first_address(), prefix_length)
}

/// The store's primary key for `net`.
pub fn key_of(net: &Ipv4Cidr) -> (String, u8) {
    (to_string(net), prefix_length(net))
}

/// The chain from `target` up to (and including) its ancestor at
/// `ancestor_prefix_length`, ordered target-first ("the rootline", §9
/// GLOSSARY). Used to walk from a reservation or allocation target up
/// toward a root or other materialized ancestor.
pub fn chain_to(target: &Ipv4Cidr, ancestor_prefix_length: u8) -> Vec<Ipv4Cidr> {
    let mut chain = Vec::new();
    let mut current = *target;
    loop {
        chain.push(current);
        if prefix_length(&current) == ancestor_prefix_length {
            break;
        }
        current = supernet(&current);
    }
    chain
}
