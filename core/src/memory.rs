// Copyright 2023-2024 The Milton Hirsch Institute, B.V.
// SPDX-License-Identifier: Apache-2.0

//! A `Store` backed by a single mutex-guarded map. This is the only
//! backend this repository ships: the four secondary indexes of §3.3
//! are answered by scanning the map rather than maintained as separate
//! structures, since there is exactly one process and one lock guarding
//! it. `commit` holds that lock for the whole check-then-apply sequence,
//! which is what gives the transaction the serializable semantics §5
//! asks of any backing store.


use crate::model::Node;
use crate::store::{first_failing_condition, Key, Store, StoreError, Transaction, Write};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
pub struct MemoryStore {
    nodes: Mutex<HashMap<Key, Node>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            nodes: Mutex::new(HashMap::new()),
        }
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &Key) -> Option<Node> {
        self.nodes.lock().unwrap().get(key).cloned()
    }

    fn batch_get(&self, keys: &[Key]) -> Vec<Option<Node>> {
        let guard = self.nodes.lock().unwrap();
        keys.iter().map(|key| guard.get(key).cloned()).collect()
    }

    fn scan_roots(&self) -> Vec<Node> {
        let guard = self.nodes.lock().unwrap();
        let mut roots: Vec<Node> = guard
            .values()
            .filter(|node| node.root_of_pool.is_some())
            .cloned()
            .collect();
        roots.sort_by_key(|node| node.created);
        roots
    }

    fn query_roots(&self, pool: &str) -> Vec<Node> {
        let mut roots: Vec<Node> = self
            .scan_roots()
            .into_iter()
            .filter(|node| node.root_of_pool.as_deref() == Some(pool))
            .collect();
        roots.sort_by_key(|node| node.created);
        roots
    }

    fn query_free_capacity_top(&self, pool: &str, narrower_than: u8) -> Option<Node> {
        let guard = self.nodes.lock().unwrap();
        guard
            .values()
            .filter(|node| {
                node.capacity_in_pool.as_deref() == Some(pool)
                    && node.prefix_length < narrower_than
            })
            // Mirrors `scan_index_forward=False` over the FreeCapacityIndex:
            // descending by prefix_length picks the deepest (narrowest)
            // already-split node before carving a fresh one out of a
            // pristine ancestor. See DESIGN.md for why this is the
            // opposite of "pick the coarsest block".
            .max_by_key(|node| (node.prefix_length, node.cidr.clone()))
            .cloned()
    }

    fn query_reservations_by_pool(&self, pool: Option<&str>) -> Vec<Node> {
        let guard = self.nodes.lock().unwrap();
        let mut reservations: Vec<Node> = guard
            .values()
            .filter(|node| match pool {
                Some(pool) => node.reservation_in_pool.as_deref() == Some(pool),
                None => node.reservation_in_pool.is_some(),
            })
            .cloned()
            .collect();
        reservations.sort_by_key(|node| node.created);
        reservations
    }

    fn query_reservations_by_root(&self, root_cidr: &str) -> Vec<Node> {
        let guard = self.nodes.lock().unwrap();
        let mut reservations: Vec<Node> = guard
            .values()
            .filter(|node| node.reservation_in_pool.is_some() && node.root_cidr == root_cidr)
            .cloned()
            .collect();
        reservations.sort_by_key(|node| node.created);
        reservations
    }

    fn commit(&self, tx: Transaction) -> Result<(), StoreError> {
        let mut guard = self.nodes.lock().unwrap();
        if let Some(key) = first_failing_condition(&tx, |key| guard.get(key).cloned()) {
            return Err(StoreError { key });
        }
        for write in tx {
            match write {
                Write::Put(node, _) => {
                    guard.insert(node.key(), node);
                }
                Write::Update { key, update, .. } => {
                    if let Some(node) = guard.get_mut(&key) {
                        update.apply(node);
                    }
                }
                Write::Delete { key, .. } => {
                    guard.remove(&key);
                }
            }
        }
        Ok(())
    }
}
