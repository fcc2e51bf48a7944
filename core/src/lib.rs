// Copyright 2023-2024 The Milton Hirsch Institute, B.V.
// SPDX-License-Identifier: Apache-2.0

//! The binary-trie IPv4 CIDR allocator: an implicit per-pool tree of
//! CIDRs materialized only where partially occupied, persisted through a
//! conditional-transaction keyed store (§1, §9). `cidr` does network
//! arithmetic; `model` defines the persisted `Node`; `store` is the
//! keyed-store abstraction and `memory` the one backend shipped here;
//! `allocator`, `deallocator` and `query` are the public operations.

pub mod allocator;
pub mod cidr;
pub mod clock;
pub mod deallocator;
pub mod errors;
pub mod memory;
pub mod model;
pub mod query;
pub mod store;

pub use errors::IpamError;
pub use model::{FreeState, Node, NodeKind, Side};
pub use store::{Store, StoreError};

pub type IpamResult<T> = Result<T, IpamError>;
