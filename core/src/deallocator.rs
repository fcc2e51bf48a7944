// Copyright 2023-2024 The Milton Hirsch Institute, B.V.
// SPDX-License-Identifier: Apache-2.0

//! Reclaiming a reservation and collapsing the branch back toward the
//! root (§4.4).

#[cfg(test)]
mod tests;

use crate::cidr as arith;
use crate::clock::now_unix;
use crate::errors::IpamError;
use crate::model::{FreeState, Node, Side};
use crate::store::{Condition, FreeCapacityUpdate, Store, Write};
use crate::IpamResult;

/// Release the reservation at `cidr`, collapsing materialized ancestors
/// that become fully free back up to (and including, if the whole
/// branch collapses) the root (§4.4).
pub fn deallocate(store: &dyn Store, cidr_text: &str) -> IpamResult<()> {
    let net = arith::parse(cidr_text).map_err(|e| IpamError::Internal(e.to_string()))?;
    let key = arith::key_of(&net);
    let reservation = store.get(&key).ok_or(IpamError::NotAReservation)?;
    if reservation.reservation_in_pool.is_none() {
        return Err(IpamError::NotAReservation);
    }

    let root_net =
        arith::parse(&reservation.root_cidr).map_err(|e| IpamError::Internal(e.to_string()))?;
    let chain = arith::chain_to(&net, arith::prefix_length(&root_net));
    let keys: Vec<_> = chain.iter().map(arith::key_of).collect();
    let fetched = store.batch_get(&keys);

    let root_index = chain.len() - 1;
    let root = fetched[root_index]
        .clone()
        .ok_or_else(|| IpamError::Internal(format!("root {} not found", reservation.root_cidr)))?;

    let mut tx = vec![Write::Delete {
        key: keys[0].clone(),
        condition: Condition::Exists,
    }];

    let mut side = Side::from_is_left(arith::is_left(&net));
    let mut collapsed_to_root = true;

    for index in 1..root_index {
        match &fetched[index] {
            Some(_intermediate) => {
                log::info!("deleting {}", chain[index]);
                tx.push(Write::Delete {
                    key: keys[index].clone(),
                    condition: Condition::Exists,
                });
                side = Side::from_is_left(arith::is_left(&chain[index]));
            }
            None => {
                let (left, right) = match side {
                    Side::Left => (FreeState::Free, FreeState::Taken),
                    Side::Right => (FreeState::Taken, FreeState::Free),
                };
                let parent = &chain[index];
                let node = Node {
                    cidr: arith::to_string(parent),
                    prefix_length: arith::prefix_length(parent),
                    pool_name: reservation.pool_name.clone(),
                    root_cidr: reservation.root_cidr.clone(),
                    root_of_pool: None,
                    left_free: Some(left),
                    right_free: Some(right),
                    capacity_in_pool: Some(reservation.pool_name.clone()),
                    reservation_in_pool: None,
                    comment: None,
                    created: now_unix(),
                };
                log::info!("materializing {}", node.cidr);
                tx.push(Write::Put(node, Condition::NotExists));
                collapsed_to_root = false;
                break;
            }
        }
    }

    if collapsed_to_root {
        let (set_left, set_right, condition) = match side {
            Side::Left => (
                Some(FreeState::Free),
                None,
                Condition::LeftFreeEquals(FreeState::Taken),
            ),
            Side::Right => (
                None,
                Some(FreeState::Free),
                Condition::RightFreeEquals(FreeState::Taken),
            ),
        };
        let update = FreeCapacityUpdate {
            set_left_free: set_left,
            set_right_free: set_right,
            set_capacity_in_pool: Some(Some(root.pool_name.clone())),
        };
        log::info!("restoring capacity on root {}", root.cidr);
        tx.push(Write::Update {
            key: keys[root_index].clone(),
            update,
            condition,
        });
    }

    store
        .commit(tx)
        .map_err(|err| IpamError::Conflict(err.key.0))
}
