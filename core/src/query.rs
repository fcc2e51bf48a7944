// Copyright 2023-2024 The Milton Hirsch Institute, B.V.
// SPDX-License-Identifier: Apache-2.0

//! Read-only listing operations (§4.5), thin wrappers over the
//! `Store`'s secondary-index queries.


use crate::model::Node;
use crate::store::Store;

/// All roots, optionally narrowed to one pool, ordered by creation time.
pub fn list_roots(store: &dyn Store, pool: Option<&str>) -> Vec<Node> {
    match pool {
        Some(pool) => store.query_roots(pool),
        None => store.scan_roots(),
    }
}

/// All reservations, optionally narrowed to one pool, ordered by
/// creation time.
pub fn list_reservations_by_pool(store: &dyn Store, pool: Option<&str>) -> Vec<Node> {
    store.query_reservations_by_pool(pool)
}

/// All reservations descending from a given root.
pub fn list_reservations_by_root(store: &dyn Store, root_cidr: &str) -> Vec<Node> {
    store.query_reservations_by_root(root_cidr)
}
