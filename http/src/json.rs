// Copyright 2023-2024 The Milton Hirsch Institute, B.V.
// SPDX-License-Identifier: Apache-2.0

//! The JSON shapes §6.1 lists, kept separate from `ipam_core::Node` so
//! the wire format doesn't leak the record's internal free/capacity
//! bookkeeping.

use ipam_core::Node;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct RootView {
    pub cidr: String,
    pub pool_name: String,
}

impl From<&Node> for RootView {
    fn from(node: &Node) -> Self {
        RootView {
            cidr: node.cidr.clone(),
            pool_name: node.pool_name.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReservationView {
    pub cidr: String,
    pub pool_name: String,
    pub created: u64,
    pub comment: Option<String>,
}

impl From<&Node> for ReservationView {
    fn from(node: &Node) -> Self {
        ReservationView {
            cidr: node.cidr.clone(),
            pool_name: node
                .reservation_in_pool
                .clone()
                .unwrap_or_else(|| node.pool_name.clone()),
            created: node.created,
            comment: node.comment.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateRootBody {
    pub cidr: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateReservationBody {
    pub cidr: Option<String>,
    pub prefix_length: Option<u8>,
    #[serde(default)]
    pub comment: String,
}
