// Copyright 2023-2024 The Milton Hirsch Institute, B.V.
// SPDX-License-Identifier: Apache-2.0

use crate::config::Config;
use crate::handlers::{reservations, roots};
use crate::state::AppState;
use axum::http::header::LOCATION;
use axum::http::{StatusCode, Uri};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

pub struct ApiServer {
    config: Config,
    state: Arc<AppState>,
}

impl ApiServer {
    pub fn new(config: Config, state: Arc<AppState>) -> Self {
        ApiServer { config, state }
    }

    fn build_router(&self) -> Router {
        Router::new()
            .route("/ui/", get(redirect_to_ui_index))
            .nest_service("/ui", ServeDir::new("ui"))
            .route(
                "/roots/",
                get(roots::list_all_roots),
            )
            .route(
                "/roots/{pool}",
                get(roots::list_pool_roots).post(roots::create_root),
            )
            .route("/roots/{pool}/{*cidr}", axum::routing::delete(roots::delete_root))
            .route("/reservations/", get(reservations::list_all_reservations))
            .route(
                "/reservations/{pool}",
                get(reservations::list_pool_reservations).post(reservations::create_reservation),
            )
            .route(
                "/reservations/{pool}/{*cidr}",
                axum::routing::delete(reservations::delete_reservation),
            )
            .fallback(not_found)
            .layer(CorsLayer::permissive())
            .with_state(self.state.clone())
    }

    pub async fn run(self) -> std::io::Result<()> {
        let app = self.build_router();
        log::info!("listening on {}", self.config.listen_addr);
        let listener = TcpListener::bind(self.config.listen_addr).await?;
        axum::serve(listener, app).await
    }
}

/// Flask's `redirect(..., 301)`: a plain 301, not axum's 308-flavored
/// `Redirect::permanent`.
async fn redirect_to_ui_index() -> impl IntoResponse {
    (StatusCode::MOVED_PERMANENTLY, [(LOCATION, "/ui/index.html")])
}

async fn not_found(uri: Uri) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, format!("no route for {}", uri))
}
