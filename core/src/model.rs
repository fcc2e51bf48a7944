// Copyright 2023-2024 The Milton Hirsch Institute, B.V.
// SPDX-License-Identifier: Apache-2.0

//! The persisted `Node` record (§3.1) and the node-kind it derives.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Which half of a supernet a CIDR occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn from_is_left(is_left: bool) -> Self {
        if is_left {
            Side::Left
        } else {
            Side::Right
        }
    }
}

/// Tri-state free/taken marker for a node's left or right half. Absent
/// (`Option::None` on `Node::left_free`/`right_free`) means "not
/// applicable to this node kind", matching the sparse DynamoDB attribute
/// the original schema uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreeState {
    Free,
    Taken,
}

impl FreeState {
    pub fn is_free(self) -> bool {
        matches!(self, FreeState::Free)
    }
}

impl fmt::Display for FreeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FreeState::Free => write!(f, "Y"),
            FreeState::Taken => write!(f, "N"),
        }
    }
}

impl Serialize for FreeState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'d> Deserialize<'d> for FreeState {
    fn deserialize<D: Deserializer<'d>>(deserializer: D) -> Result<Self, D::Error> {
        struct FreeStateVisitor;
        impl<'d> Visitor<'d> for FreeStateVisitor {
            type Value = FreeState;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("\"Y\" or \"N\"")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<FreeState, E> {
                match value {
                    "Y" => Ok(FreeState::Free),
                    "N" => Ok(FreeState::Taken),
                    other => Err(de::Error::custom(format!("expected Y or N, got {}", other))),
                }
            }
        }
        deserializer.deserialize_str(FreeStateVisitor)
    }
}

/// A materialized Node: a pool root, a reservation leaf, or an internal
/// ancestor with one side free and one side occupied (§3.1). Fully-free
/// and fully-occupied subtrees are never materialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub cidr: String,
    pub prefix_length: u8,
    pub pool_name: String,
    pub root_cidr: String,
    pub root_of_pool: Option<String>,
    pub left_free: Option<FreeState>,
    pub right_free: Option<FreeState>,
    pub capacity_in_pool: Option<String>,
    pub reservation_in_pool: Option<String>,
    pub comment: Option<String>,
    pub created: u64,
}

/// The derived, mutually-exclusive kind of a materialized node (§3.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Internal,
    Reservation,
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        if self.root_of_pool.is_some() {
            NodeKind::Root
        } else if self.reservation_in_pool.is_some() {
            NodeKind::Reservation
        } else {
            NodeKind::Internal
        }
    }

    pub fn key(&self) -> (String, u8) {
        (self.cidr.clone(), self.prefix_length)
    }

    pub fn free_side(&self, side: Side) -> Option<FreeState> {
        match side {
            Side::Left => self.left_free,
            Side::Right => self.right_free,
        }
    }

    pub fn has_any_free_side(&self) -> bool {
        self.left_free.map(FreeState::is_free).unwrap_or(false)
            || self.right_free.map(FreeState::is_free).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root(pool: &str, cidr: &str, created: u64) -> Node {
        Node {
            cidr: cidr.to_string(),
            prefix_length: cidr.rsplit('/').next().unwrap().parse().unwrap(),
            pool_name: pool.to_string(),
            root_cidr: cidr.to_string(),
            root_of_pool: Some(pool.to_string()),
            left_free: Some(FreeState::Free),
            right_free: Some(FreeState::Free),
            capacity_in_pool: Some(pool.to_string()),
            reservation_in_pool: None,
            comment: None,
            created,
        }
    }

    #[test]
    fn root_kind_is_root_even_with_capacity() {
        let node = root("prod", "10.0.0.0/24", 1);
        assert_eq!(node.kind(), NodeKind::Root);
    }

    #[test]
    fn reservation_kind() {
        let mut node = root("prod", "10.0.0.0/24", 1);
        node.root_of_pool = None;
        node.reservation_in_pool = Some("prod".to_string());
        node.left_free = Some(FreeState::Taken);
        node.right_free = Some(FreeState::Taken);
        assert_eq!(node.kind(), NodeKind::Reservation);
    }

    #[test]
    fn internal_kind_is_neither_root_nor_reservation() {
        let mut node = root("prod", "10.0.0.0/25", 1);
        node.root_of_pool = None;
        assert_eq!(node.kind(), NodeKind::Internal);
    }

    #[test]
    fn free_state_serializes_to_y_and_n() {
        assert_eq!(serde_json::to_string(&FreeState::Free).unwrap(), "\"Y\"");
        assert_eq!(serde_json::to_string(&FreeState::Taken).unwrap(), "\"N\"");
    }

    #[test]
    fn free_state_round_trips_through_json() {
        let node = root("prod", "10.0.0.0/24", 42);
        let serialized = serde_json::to_string(&node).unwrap();
        let restored: Node = serde_json::from_str(&serialized).unwrap();
        assert_eq!(restored, node);
    }

    #[test]
    fn has_any_free_side_false_for_reservation() {
        let mut node = root("prod", "10.0.0.0/24", 1);
        node.root_of_pool = None;
        node.reservation_in_pool = Some("prod".to_string());
        node.left_free = Some(FreeState::Taken);
        node.right_free = Some(FreeState::Taken);
        assert!(!node.has_any_free_side());
    }

    mod serialize {
        use super::*;
        use serde_test::{assert_de_tokens_error, assert_tokens, Token};

        #[test]
        fn free_state_free_round_trips_as_y() {
            assert_tokens(&FreeState::Free, &[Token::Str("Y")]);
        }

        #[test]
        fn free_state_taken_round_trips_as_n() {
            assert_tokens(&FreeState::Taken, &[Token::Str("N")]);
        }

        #[test]
        fn free_state_rejects_anything_else() {
            assert_de_tokens_error::<FreeState>(
                &[Token::Str("maybe")],
                "expected Y or N, got maybe",
            );
        }
    }
}
