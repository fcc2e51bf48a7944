// Copyright 2023-2024 The Milton Hirsch Institute, B.V.
// SPDX-License-Identifier: Apache-2.0

use ipam_core::memory::MemoryStore;
use ipam_http::{ApiServer, AppState, Config};
use std::sync::Arc;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();

    let config = Config::from_env();
    let state = Arc::new(AppState::new(Arc::new(MemoryStore::new())));
    let server = ApiServer::new(config, state);

    server.run().await
}
