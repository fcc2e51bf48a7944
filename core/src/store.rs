// Copyright 2023-2024 The Milton Hirsch Institute, B.V.
// SPDX-License-Identifier: Apache-2.0

//! The keyed-store abstraction the allocator and deallocator are written
//! against (§5, §9 "Why conditional transactions"). This models the
//! handful of DynamoDB primitives the original `pynamodb` implementation
//! relied on: single-key get, batched get, the four secondary-index
//! queries of §3.3, and an all-or-nothing conditional transaction. Any
//! store that can satisfy this trait is a valid backend; `memory`
//! ships the one this repository runs on.

use crate::model::{FreeState, Node};
use std::error::Error;
use std::fmt;
use std::fmt::{Display, Formatter};

pub type Key = (String, u8);

/// The condition a single write in a transaction is predicated on.
/// Mirrors the `pynamodb` condition expressions in `original main.py`:
/// `cidr.does_not_exist()`, `cidr.exists()`, and field-equality pins on
/// `left_free`/`right_free`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Always,
    NotExists,
    Exists,
    LeftFreeEquals(FreeState),
    RightFreeEquals(FreeState),
    And(Box<Condition>, Box<Condition>),
}

impl Condition {
    pub fn and(self, other: Condition) -> Condition {
        Condition::And(Box::new(self), Box::new(other))
    }

    fn evaluate(&self, existing: Option<&Node>) -> bool {
        match self {
            Condition::Always => true,
            Condition::NotExists => existing.is_none(),
            Condition::Exists => existing.is_some(),
            Condition::LeftFreeEquals(expected) => {
                existing.and_then(|n| n.left_free) == Some(*expected)
            }
            Condition::RightFreeEquals(expected) => {
                existing.and_then(|n| n.right_free) == Some(*expected)
            }
            Condition::And(a, b) => a.evaluate(existing) && b.evaluate(existing),
        }
    }
}

/// An in-place mutation of a root or internal node's free-capacity
/// fields. `None` on a field leaves it untouched; `Some` overwrites it.
/// `capacity_in_pool` uses a nested option so "remove the attribute" is
/// distinguishable from "leave it alone".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FreeCapacityUpdate {
    pub set_left_free: Option<FreeState>,
    pub set_right_free: Option<FreeState>,
    pub set_capacity_in_pool: Option<Option<String>>,
}

impl FreeCapacityUpdate {
    pub fn apply(&self, node: &mut Node) {
        if let Some(left) = self.set_left_free {
            node.left_free = Some(left);
        }
        if let Some(right) = self.set_right_free {
            node.right_free = Some(right);
        }
        if let Some(capacity) = &self.set_capacity_in_pool {
            node.capacity_in_pool = capacity.clone();
        }
    }
}

/// One write within a transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    Put(Node, Condition),
    Update {
        key: Key,
        update: FreeCapacityUpdate,
        condition: Condition,
    },
    Delete {
        key: Key,
        condition: Condition,
    },
}

pub type Transaction = Vec<Write>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    pub key: Key,
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Condition failed for {}/{}",
            self.key.0, self.key.1
        )
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        None
    }
}

/// Everything the allocator, deallocator and query API need from a
/// backing store. All reads besides `batch_get` may be answered from
/// stale data (§5); every mutation goes through `commit`.
pub trait Store: Send + Sync {
    fn get(&self, key: &Key) -> Option<Node>;

    fn batch_get(&self, keys: &[Key]) -> Vec<Option<Node>>;

    /// RootIndex, scanning every pool.
    fn scan_roots(&self) -> Vec<Node>;

    /// RootIndex, partitioned by pool, sorted by `created`.
    fn query_roots(&self, pool: &str) -> Vec<Node>;

    /// FreeCapacityIndex: the node with the largest prefix length (the
    /// deepest, most-already-split block) among those with
    /// `prefix_length < narrower_than`, or `None` if the pool has no
    /// such node. See DESIGN.md for why the deepest match wins.
    fn query_free_capacity_top(&self, pool: &str, narrower_than: u8) -> Option<Node>;

    /// ReservationByPoolIndex; `None` scans every pool.
    fn query_reservations_by_pool(&self, pool: Option<&str>) -> Vec<Node>;

    /// ReservationByRootIndex.
    fn query_reservations_by_root(&self, root_cidr: &str) -> Vec<Node>;

    /// Apply every write in `tx` atomically, or none of them, returning
    /// the key of the first write whose condition failed.
    fn commit(&self, tx: Transaction) -> Result<(), StoreError>;
}

impl Write {
    pub fn key(&self) -> Key {
        match self {
            Write::Put(node, _) => node.key(),
            Write::Update { key, .. } => key.clone(),
            Write::Delete { key, .. } => key.clone(),
        }
    }

    fn condition(&self) -> &Condition {
        match self {
            Write::Put(_, condition) => condition,
            Write::Update { condition, .. } => condition,
            Write::Delete { condition, .. } => condition,
        }
    }
}

/// Evaluate every write's condition in `tx` against `current`'s state,
/// returning the key of the first failure. Shared by every `Store`
/// implementation so the condition semantics stay in one place; a store
/// still owns applying the writes once none fail.
pub fn first_failing_condition(
    tx: &Transaction,
    current: impl Fn(&Key) -> Option<Node>,
) -> Option<Key> {
    for write in tx {
        let key = write.key();
        let existing = current(&key);
        if !write.condition().evaluate(existing.as_ref()) {
            return Some(key);
        }
    }
    None
}
