// Copyright 2023-2024 The Milton Hirsch Institute, B.V.
// SPDX-License-Identifier: Apache-2.0

//! Process-environment configuration (§6.3): `IPAM_HOST` / `IPAM_PORT`,
//! read once at startup. No other configuration surface exists.

use std::net::SocketAddr;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> Self {
        let host = std::env::var("IPAM_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        let port = std::env::var("IPAM_PORT")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let listen_addr = format!("{}:{}", host, port)
            .parse()
            .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)));

        Config { listen_addr }
    }
}
