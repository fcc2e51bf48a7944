// Copyright 2023-2024 The Milton Hirsch Institute, B.V.
// SPDX-License-Identifier: Apache-2.0

//! The HTTP surface: an axum `Router` mapping §6.1 verbatim onto
//! `ipam_core`. Kept as a library so `tests/` can build the router
//! without going through a child process.

pub mod config;
pub mod error;
pub mod handlers;
pub mod json;
pub mod server;
pub mod state;

pub use config::Config;
pub use server::ApiServer;
pub use state::AppState;
