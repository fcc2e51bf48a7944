// Copyright 2023-2024 The Milton Hirsch Institute, B.V.
// SPDX-License-Identifier: Apache-2.0

use super::*;
use crate::memory::MemoryStore;

#[test]
fn create_root_is_queryable_by_pool() {
    let store = MemoryStore::new();
    let root = create_root(&store, "10.0.0.0/24", "prod").unwrap();
    assert_eq!(root.cidr, "10.0.0.0/24");
    assert_eq!(store.query_roots("prod").len(), 1);
}

#[test]
fn create_root_rejects_overlap_with_existing_root() {
    let store = MemoryStore::new();
    create_root(&store, "10.0.0.0/24", "prod").unwrap();
    let err = create_root(&store, "10.0.0.0/25", "prod").unwrap_err();
    assert_eq!(err, IpamError::OverlappingRoot);
}

#[test]
fn create_root_rejects_supernet_overlap() {
    let store = MemoryStore::new();
    create_root(&store, "10.0.0.0/25", "prod").unwrap();
    let err = create_root(&store, "10.0.0.0/24", "prod").unwrap_err();
    assert_eq!(err, IpamError::OverlappingRoot);
}

#[test]
fn allocate_from_fresh_root_takes_the_left_half_first() {
    let store = MemoryStore::new();
    create_root(&store, "10.0.0.0/24", "prod").unwrap();
    let reservation = allocate(&store, "prod", 25, "").unwrap();
    assert_eq!(reservation.cidr, "10.0.0.0/25");

    let root = store.get(&("10.0.0.0/24".to_string(), 24)).unwrap();
    assert_eq!(root.left_free, Some(FreeState::Taken));
    assert_eq!(root.right_free, Some(FreeState::Free));
    assert_eq!(root.capacity_in_pool.as_deref(), Some("prod"));
}

#[test]
fn second_allocation_prefers_the_deepest_partial_node() {
    let store = MemoryStore::new();
    create_root(&store, "10.0.0.0/24", "prod").unwrap();
    // first /26 carves out an intermediate /25 (left) with a /26 reservation.
    let first = allocate(&store, "prod", 26, "").unwrap();
    assert_eq!(first.cidr, "10.0.0.0/26");

    // second /26 must come from the existing /25, not split the root's
    // still-untouched right /25 -- it lands at 10.0.0.64/26.
    let second = allocate(&store, "prod", 26, "").unwrap();
    assert_eq!(second.cidr, "10.0.0.64/26");

    let intermediate = store.get(&("10.0.0.0/25".to_string(), 25));
    assert_eq!(intermediate, None, "fully consumed /25 must be deleted");
    let root = store.get(&("10.0.0.0/24".to_string(), 24)).unwrap();
    assert_eq!(root.right_free, Some(FreeState::Free));
}

#[test]
fn allocate_fails_once_pool_is_exhausted() {
    let store = MemoryStore::new();
    create_root(&store, "10.0.0.0/31", "prod").unwrap();
    allocate(&store, "prod", 32, "").unwrap();
    allocate(&store, "prod", 32, "").unwrap();
    let err = allocate(&store, "prod", 32, "").unwrap_err();
    assert_eq!(err, IpamError::NoCapacity);
}

#[test]
fn allocate_by_cidr_reserves_the_exact_block_and_materializes_ancestors() {
    let store = MemoryStore::new();
    create_root(&store, "10.0.0.0/24", "prod").unwrap();
    let reservation = allocate_by_cidr(&store, "prod", "10.0.0.64/26", "gateway").unwrap();
    assert_eq!(reservation.cidr, "10.0.0.64/26");
    assert_eq!(reservation.comment.as_deref(), Some("gateway"));

    let parent = store.get(&("10.0.0.0/25".to_string(), 25)).unwrap();
    assert_eq!(parent.left_free, Some(FreeState::Free));
    assert_eq!(parent.right_free, Some(FreeState::Taken));
}

#[test]
fn allocate_by_cidr_fails_when_no_root_contains_it() {
    let store = MemoryStore::new();
    create_root(&store, "10.0.0.0/24", "prod").unwrap();
    let err = allocate_by_cidr(&store, "prod", "10.1.0.0/25", "").unwrap_err();
    assert_eq!(err, IpamError::NoRoot);
}

#[test]
fn allocate_by_cidr_fails_when_already_reserved() {
    let store = MemoryStore::new();
    create_root(&store, "10.0.0.0/24", "prod").unwrap();
    allocate_by_cidr(&store, "prod", "10.0.0.0/25", "").unwrap();
    let err = allocate_by_cidr(&store, "prod", "10.0.0.0/25", "").unwrap_err();
    assert_eq!(err, IpamError::NotAvailable);
}

#[test]
fn allocate_by_cidr_reports_conflicting_ancestor() {
    let store = MemoryStore::new();
    create_root(&store, "10.0.0.0/24", "prod").unwrap();
    allocate_by_cidr(&store, "prod", "10.0.0.0/25", "").unwrap();
    let err = allocate_by_cidr(&store, "prod", "10.0.0.32/27", "").unwrap_err();
    assert_eq!(err, IpamError::Conflict("10.0.0.0/25".to_string()));
}

#[test]
fn delete_root_fails_when_not_empty() {
    let store = MemoryStore::new();
    create_root(&store, "10.0.0.0/24", "prod").unwrap();
    allocate(&store, "prod", 25, "").unwrap();
    let err = delete_root(&store, "10.0.0.0/24").unwrap_err();
    assert_eq!(err, IpamError::NotEmpty);
}

#[test]
fn delete_root_succeeds_when_empty() {
    let store = MemoryStore::new();
    create_root(&store, "10.0.0.0/24", "prod").unwrap();
    delete_root(&store, "10.0.0.0/24").unwrap();
    assert_eq!(store.query_roots("prod").len(), 0);
}

#[test]
fn delete_root_fails_on_unknown_cidr() {
    let store = MemoryStore::new();
    let err = delete_root(&store, "10.0.0.0/24").unwrap_err();
    assert_eq!(err, IpamError::NotFound);
}

#[test]
fn delete_root_fails_on_non_root_cidr() {
    let store = MemoryStore::new();
    create_root(&store, "10.0.0.0/24", "prod").unwrap();
    allocate_by_cidr(&store, "prod", "10.0.0.0/25", "").unwrap();
    let err = delete_root(&store, "10.0.0.0/25").unwrap_err();
    assert_eq!(err, IpamError::NotARoot);
}

/// P6: two concurrent `allocate` callers that both observed the same
/// free-capacity snapshot before either one committed must yield exactly
/// one success and one `Conflict` — never a double allocation of the same
/// block. `allocate` itself reads that snapshot and then calls
/// `create_reservation` to commit it (see `allocate` above); racing
/// `create_reservation` directly over one shared `Arc<MemoryStore>` with a
/// `Node` both threads read before the race started reproduces exactly the
/// interleaving two concurrent `allocate(..)` calls can hit, without
/// depending on the OS scheduler to interleave their reads and commits
/// just right.
#[test]
fn concurrent_reservations_against_the_same_snapshot_yield_one_winner_and_one_conflict() {
    use std::sync::{Arc, Barrier};
    use std::thread;

    let store = Arc::new(MemoryStore::new());
    create_root(store.as_ref(), "10.0.0.0/24", "prod").unwrap();
    let top = store.query_free_capacity_top("prod", 25).unwrap();
    let target = arith::parse("10.0.0.0/25").unwrap();

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = (0..2)
        .map(|_| {
            let store = Arc::clone(&store);
            let top = top.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                create_reservation(store.as_ref(), &top, target, "")
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let successes = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(IpamError::Conflict(_))))
        .count();
    assert_eq!(successes, 1, "exactly one racer should win the block");
    assert_eq!(
        conflicts, 1,
        "the loser must see a Conflict, not a silent second allocation"
    );
}
