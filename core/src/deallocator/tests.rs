// Copyright 2023-2024 The Milton Hirsch Institute, B.V.
// SPDX-License-Identifier: Apache-2.0

use super::*;
use crate::allocator::{allocate, allocate_by_cidr, create_root, delete_root};
use crate::memory::MemoryStore;

#[test]
fn deallocate_direct_child_of_root_restores_capacity() {
    let store = MemoryStore::new();
    create_root(&store, "10.0.0.0/24", "prod").unwrap();
    allocate_by_cidr(&store, "prod", "10.0.0.0/25", "").unwrap();

    deallocate(&store, "10.0.0.0/25").unwrap();

    assert_eq!(store.get(&("10.0.0.0/25".to_string(), 25)), None);
    let root = store.get(&("10.0.0.0/24".to_string(), 24)).unwrap();
    assert_eq!(root.left_free, Some(FreeState::Free));
    assert_eq!(root.right_free, Some(FreeState::Free));
    assert_eq!(root.capacity_in_pool.as_deref(), Some("prod"));
}

#[test]
fn deallocate_collapses_fully_freed_branch_back_to_the_root() {
    let store = MemoryStore::new();
    create_root(&store, "10.0.0.0/24", "prod").unwrap();
    let first = allocate(&store, "prod", 26, "").unwrap(); // 10.0.0.0/26, splits a /25
    assert_eq!(first.cidr, "10.0.0.0/26");
    let second = allocate(&store, "prod", 26, "").unwrap(); // 10.0.0.64/26
    assert_eq!(second.cidr, "10.0.0.64/26");

    deallocate(&store, "10.0.0.0/26").unwrap();
    deallocate(&store, "10.0.0.64/26").unwrap();

    // both halves of the /25 are free again, so it should have collapsed
    // entirely and the root should be fully free once more.
    assert_eq!(store.get(&("10.0.0.0/25".to_string(), 25)), None);
    let root = store.get(&("10.0.0.0/24".to_string(), 24)).unwrap();
    assert_eq!(root.left_free, Some(FreeState::Free));
    assert_eq!(root.right_free, Some(FreeState::Free));
    assert_eq!(root.capacity_in_pool.as_deref(), Some("prod"));
}

#[test]
fn deallocate_of_one_sibling_leaves_the_other_branch_materialized() {
    let store = MemoryStore::new();
    create_root(&store, "10.0.0.0/24", "prod").unwrap();
    allocate(&store, "prod", 26, "").unwrap(); // 10.0.0.0/26
    allocate(&store, "prod", 26, "").unwrap(); // 10.0.0.64/26

    deallocate(&store, "10.0.0.0/26").unwrap();

    // 10.0.0.64/26 is still reserved, so the /25 stays materialized with
    // its left half now free and right half still taken.
    let intermediate = store.get(&("10.0.0.0/25".to_string(), 25)).unwrap();
    assert_eq!(intermediate.left_free, Some(FreeState::Free));
    assert_eq!(intermediate.right_free, Some(FreeState::Taken));
    assert_eq!(intermediate.capacity_in_pool.as_deref(), Some("prod"));
}

#[test]
fn deallocate_fails_for_a_cidr_that_is_not_a_reservation() {
    let store = MemoryStore::new();
    create_root(&store, "10.0.0.0/24", "prod").unwrap();
    let err = deallocate(&store, "10.0.0.0/24").unwrap_err();
    assert_eq!(err, IpamError::NotAReservation);
}

#[test]
fn deallocate_fails_for_an_unknown_cidr() {
    let store = MemoryStore::new();
    let err = deallocate(&store, "10.0.0.0/25").unwrap_err();
    assert_eq!(err, IpamError::NotAReservation);
}

#[test]
fn root_is_only_deletable_after_full_deallocation() {
    let store = MemoryStore::new();
    create_root(&store, "10.0.0.0/24", "prod").unwrap();
    allocate_by_cidr(&store, "prod", "10.0.0.0/25", "").unwrap();
    assert_eq!(
        delete_root(&store, "10.0.0.0/24").unwrap_err(),
        IpamError::NotEmpty
    );

    deallocate(&store, "10.0.0.0/25").unwrap();
    delete_root(&store, "10.0.0.0/24").unwrap();
}

/// P5: whatever order four same-size reservations are freed in, the
/// root always ends up back in its pristine, fully-free state.
#[test]
fn deallocating_in_any_order_always_restores_a_pristine_root() {
    use itertools::Itertools;

    let index_list = vec![0, 1, 2, 3];
    for indices in index_list.iter().permutations(index_list.len()) {
        let store = MemoryStore::new();
        create_root(&store, "10.0.0.0/24", "prod").unwrap();
        let mut reservations = vec![];
        for _ in 0..index_list.len() {
            reservations.push(allocate(&store, "prod", 26, "").unwrap().cidr);
        }

        for index in indices {
            deallocate(&store, &reservations[*index]).unwrap();
        }

        let root = store.get(&("10.0.0.0/24".to_string(), 24)).unwrap();
        assert_eq!(root.left_free, Some(FreeState::Free));
        assert_eq!(root.right_free, Some(FreeState::Free));
        assert_eq!(root.capacity_in_pool.as_deref(), Some("prod"));
        assert_eq!(store.query_reservations_by_pool(Some("prod")).len(), 0);
    }
}
