// Copyright 2023-2024 The Milton Hirsch Institute, B.V.
// SPDX-License-Identifier: Apache-2.0

use crate::error::{ApiError, ApiResult};
use crate::json::{CreateRootBody, RootView};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use ipam_core::{allocator, query};
use serde_json::json;
use std::sync::Arc;

fn render_roots(state: &AppState, pool: Option<&str>) -> Json<Vec<RootView>> {
    let roots = query::list_roots(state.store.as_ref(), pool);
    Json(roots.iter().map(RootView::from).collect())
}

/// `GET /roots/`.
pub async fn list_all_roots(State(state): State<Arc<AppState>>) -> Json<Vec<RootView>> {
    render_roots(&state, None)
}

/// `GET /roots/{pool}`.
pub async fn list_pool_roots(
    State(state): State<Arc<AppState>>,
    Path(pool): Path<String>,
) -> Json<Vec<RootView>> {
    render_roots(&state, Some(&pool))
}

/// `POST /roots/{pool}`.
pub async fn create_root(
    State(state): State<Arc<AppState>>,
    Path(pool): Path<String>,
    Json(body): Json<CreateRootBody>,
) -> ApiResult<Response> {
    let cidr = body
        .cidr
        .ok_or_else(|| ApiError::BadRequest("Please provide cidr in body".to_string()))?;

    log::info!("POST /roots/{}: {}", pool, cidr);
    allocator::create_root(state.store.as_ref(), &cidr, &pool)?;
    Ok(Json(json!({ "msg": "ok" })).into_response())
}

/// `DELETE /roots/{pool}/{cidr}`. The `pool` segment is ignored (§9).
pub async fn delete_root(
    State(state): State<Arc<AppState>>,
    Path((_pool, cidr)): Path<(String, String)>,
) -> ApiResult<Response> {
    log::info!("DELETE /roots/.../{}", cidr);
    allocator::delete_root(state.store.as_ref(), &cidr)?;
    Ok(Json(json!({ "msg": "ok" })).into_response())
}
