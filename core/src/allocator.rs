// Copyright 2023-2024 The Milton Hirsch Institute, B.V.
// SPDX-License-Identifier: Apache-2.0

//! Root management and allocation (§4.2–§4.3): `create_root`,
//! `delete_root`, `allocate`, `allocate_by_cidr`, and the
//! `create_reservation` transaction builder they share.

#[cfg(test)]
mod tests;

use crate::cidr as arith;
use crate::clock::now_unix;
use crate::errors::IpamError;
use crate::model::{FreeState, Node, NodeKind, Side};
use crate::store::{Condition, FreeCapacityUpdate, Store, Write};
use crate::IpamResult;
use cidr::Ipv4Cidr;

fn conflict(err: crate::store::StoreError) -> IpamError {
    IpamError::Conflict(err.key.0)
}

/// Declare `cidr` a root of `pool`. Unconditional: a root is written
/// with `Condition::Always`, so two concurrent `create_root` calls for
/// overlapping CIDRs can both succeed (§9 open question, preserved).
pub fn create_root(store: &dyn Store, cidr_text: &str, pool: &str) -> IpamResult<Node> {
    let net = arith::parse(cidr_text).map_err(|e| IpamError::Internal(e.to_string()))?;
    for existing in store.scan_roots() {
        let existing_net =
            arith::parse(&existing.cidr).map_err(|e| IpamError::Internal(e.to_string()))?;
        if arith::overlaps(&net, &existing_net) {
            log::warn!(
                "create_root: {} overlaps existing root {}",
                arith::to_string(&net),
                existing.cidr
            );
            return Err(IpamError::OverlappingRoot);
        }
    }

    let node = Node {
        cidr: arith::to_string(&net),
        prefix_length: arith::prefix_length(&net),
        pool_name: pool.to_string(),
        root_cidr: arith::to_string(&net),
        root_of_pool: Some(pool.to_string()),
        left_free: Some(FreeState::Free),
        right_free: Some(FreeState::Free),
        capacity_in_pool: Some(pool.to_string()),
        reservation_in_pool: None,
        comment: None,
        created: now_unix(),
    };

    log::info!("creating root {} in pool {}", node.cidr, pool);
    store
        .commit(vec![Write::Put(node.clone(), Condition::Always)])
        .map_err(conflict)?;
    Ok(node)
}

/// Remove an empty root. Fails if `cidr` is not a root, or still hosts
/// capacity/reservations (§4.2).
pub fn delete_root(store: &dyn Store, cidr_text: &str) -> IpamResult<()> {
    let net = arith::parse(cidr_text).map_err(|e| IpamError::Internal(e.to_string()))?;
    let key = arith::key_of(&net);
    let node = store.get(&key).ok_or(IpamError::NotFound)?;

    if node.kind() != NodeKind::Root {
        return Err(IpamError::NotARoot);
    }
    if node.left_free != Some(FreeState::Free) || node.right_free != Some(FreeState::Free) {
        return Err(IpamError::NotEmpty);
    }

    let condition =
        Condition::LeftFreeEquals(FreeState::Free).and(Condition::RightFreeEquals(FreeState::Free));
    log::info!("deleting root {}", node.cidr);
    store
        .commit(vec![Write::Delete { key, condition }])
        .map_err(conflict)
}

/// Allocate a block of `/size` from the first free capacity found in
/// `pool` (§4.3.1).
pub fn allocate(store: &dyn Store, pool: &str, size: u8, comment: &str) -> IpamResult<Node> {
    let top = store
        .query_free_capacity_top(pool, size)
        .ok_or(IpamError::NoCapacity)?;
    if !top.has_any_free_side() {
        // I6: FreeCapacityIndex only lists nodes with a free side; a hit
        // that fails this is a corrupted index, not a capacity shortage.
        return Err(IpamError::Internal(format!(
            "{} is listed in the free-capacity index but has no free side",
            top.cidr
        )));
    }
    let top_net = arith::parse(&top.cidr).map_err(|e| IpamError::Internal(e.to_string()))?;

    let side = if top.left_free == Some(FreeState::Free) {
        Side::Left
    } else {
        Side::Right
    };
    let [left, right] = arith::subnets(&top_net);
    let half = match side {
        Side::Left => left,
        Side::Right => right,
    };
    let target = arith::with_prefix_length(&half, size);

    create_reservation(store, &top, target, comment)
}

/// Allocate the exact CIDR `cidr_text`, walking up from it until a
/// materialized ancestor (root or internal) is found (§4.3.2).
pub fn allocate_by_cidr(
    store: &dyn Store,
    pool: &str,
    cidr_text: &str,
    comment: &str,
) -> IpamResult<Node> {
    let target = arith::parse(cidr_text).map_err(|e| IpamError::Internal(e.to_string()))?;

    let roots = store.query_roots(pool);
    let root = roots
        .iter()
        .find(|root| {
            arith::parse(&root.cidr)
                .map(|root_net| arith::subnet_of(&target, &root_net))
                .unwrap_or(false)
        })
        .cloned()
        .ok_or(IpamError::NoRoot)?;

    let chain = arith::chain_to(&target, root.prefix_length);
    let keys: Vec<_> = chain.iter().map(arith::key_of).collect();
    let fetched = store.batch_get(&keys);

    for (index, _net) in chain.iter().enumerate() {
        if index == 0 {
            if fetched[0].is_some() {
                return Err(IpamError::NotAvailable);
            }
            continue;
        }

        if let Some(ancestor) = &fetched[index] {
            let side = Side::from_is_left(arith::is_left(&chain[index - 1]));
            return match ancestor.free_side(side) {
                Some(FreeState::Free) => create_reservation(store, ancestor, target, comment),
                _ => Err(IpamError::Conflict(ancestor.cidr.clone())),
            };
        }
    }

    Err(IpamError::Internal(format!(
        "walk from {} reached root {} without a materialized ancestor",
        cidr_text, root.cidr
    )))
}

/// Build and commit the transaction that carves `target` out of the
/// materialized ancestor `top` (§4.3.3): claim/delete `top`, materialize
/// every intermediate level strictly between `top` and `target`, and
/// put the reservation leaf itself.
fn create_reservation(
    store: &dyn Store,
    top: &Node,
    target: Ipv4Cidr,
    comment: &str,
) -> IpamResult<Node> {
    let mut rootline = arith::chain_to(&target, top.prefix_length);
    rootline.reverse(); // top-first, target-last

    let mut tx = Vec::with_capacity(rootline.len());
    let mut leaf: Option<Node> = None;
    let last = rootline.len() - 1;

    for (index, net) in rootline.iter().enumerate() {
        if index == 0 {
            let side = Side::from_is_left(arith::is_left(&rootline[1]));
            tx.push(claim_top_write(top, side)?);
        } else if index < last {
            let side = Side::from_is_left(arith::is_left(&rootline[index + 1]));
            let (left, right) = match side {
                Side::Left => (FreeState::Taken, FreeState::Free),
                Side::Right => (FreeState::Free, FreeState::Taken),
            };
            let node = Node {
                cidr: arith::to_string(net),
                prefix_length: arith::prefix_length(net),
                pool_name: top.pool_name.clone(),
                root_cidr: top.root_cidr.clone(),
                root_of_pool: None,
                left_free: Some(left),
                right_free: Some(right),
                capacity_in_pool: Some(top.pool_name.clone()),
                reservation_in_pool: None,
                comment: None,
                created: now_unix(),
            };
            tx.push(Write::Put(node, Condition::NotExists));
        } else {
            let node = Node {
                cidr: arith::to_string(net),
                prefix_length: arith::prefix_length(net),
                pool_name: top.pool_name.clone(),
                root_cidr: top.root_cidr.clone(),
                root_of_pool: None,
                left_free: Some(FreeState::Taken),
                right_free: Some(FreeState::Taken),
                capacity_in_pool: None,
                reservation_in_pool: Some(top.pool_name.clone()),
                comment: if comment.is_empty() {
                    None
                } else {
                    Some(comment.to_string())
                },
                created: now_unix(),
            };
            leaf = Some(node.clone());
            tx.push(Write::Put(node, Condition::NotExists));
        }
    }

    let leaf = leaf.expect("rootline always has at least the target itself");
    log::info!("reserving {} in pool {}", leaf.cidr, leaf.pool_name);
    store.commit(tx).map_err(conflict)?;
    Ok(leaf)
}

/// The write that claims `side` of `top`: an update pinning the other
/// side's state if `top` is a root, or an outright delete if `top` is
/// an already-split internal node being fully consumed (§4.3.3).
fn claim_top_write(top: &Node, side: Side) -> IpamResult<Write> {
    let claimed = top.free_side(side);
    if claimed != Some(FreeState::Free) {
        return Err(IpamError::Internal(format!(
            "{} has no free capacity on its {:?} side",
            top.cidr, side
        )));
    }
    let other = top.free_side(other_side(side));

    match top.kind() {
        NodeKind::Root => {
            let (set_left, set_right) = match side {
                Side::Left => (Some(FreeState::Taken), None),
                Side::Right => (None, Some(FreeState::Taken)),
            };
            let condition = match side {
                Side::Left => Condition::LeftFreeEquals(FreeState::Free),
                Side::Right => Condition::RightFreeEquals(FreeState::Free),
            }
            .and(match other_side(side) {
                Side::Left => Condition::LeftFreeEquals(other.unwrap_or(FreeState::Free)),
                Side::Right => Condition::RightFreeEquals(other.unwrap_or(FreeState::Free)),
            });
            let update = FreeCapacityUpdate {
                set_left_free: set_left,
                set_right_free: set_right,
                // the root loses pool capacity once both sides are taken
                set_capacity_in_pool: if other == Some(FreeState::Taken) {
                    Some(None)
                } else {
                    None
                },
            };
            Ok(Write::Update {
                key: top.key(),
                update,
                condition,
            })
        }
        NodeKind::Internal => {
            if other != Some(FreeState::Taken) {
                return Err(IpamError::Internal(format!(
                    "{} is internal but not split as expected",
                    top.cidr
                )));
            }
            let condition = match side {
                Side::Left => Condition::LeftFreeEquals(FreeState::Free)
                    .and(Condition::RightFreeEquals(FreeState::Taken)),
                Side::Right => Condition::RightFreeEquals(FreeState::Free)
                    .and(Condition::LeftFreeEquals(FreeState::Taken)),
            };
            Ok(Write::Delete {
                key: top.key(),
                condition,
            })
        }
        NodeKind::Reservation => Err(IpamError::Internal(format!(
            "{} is a reservation, not an allocatable ancestor",
            top.cidr
        ))),
    }
}

fn other_side(side: Side) -> Side {
    match side {
        Side::Left => Side::Right,
        Side::Right => Side::Left,
    }
}
