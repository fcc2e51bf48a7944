// Copyright 2023-2024 The Milton Hirsch Institute, B.V.
// SPDX-License-Identifier: Apache-2.0

use crate::error::{ApiError, ApiResult};
use crate::json::{CreateReservationBody, ReservationView};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use ipam_core::{allocator, deallocator, query};
use serde_json::json;
use std::sync::Arc;

fn render_reservations(state: &AppState, pool: Option<&str>) -> Json<Vec<ReservationView>> {
    let reservations = query::list_reservations_by_pool(state.store.as_ref(), pool);
    Json(reservations.iter().map(ReservationView::from).collect())
}

/// `GET /reservations/`.
pub async fn list_all_reservations(
    State(state): State<Arc<AppState>>,
) -> Json<Vec<ReservationView>> {
    render_reservations(&state, None)
}

/// `GET /reservations/{pool}`.
pub async fn list_pool_reservations(
    State(state): State<Arc<AppState>>,
    Path(pool): Path<String>,
) -> Json<Vec<ReservationView>> {
    render_reservations(&state, Some(&pool))
}

/// `POST /reservations/{pool}`: `cidr` takes precedence over
/// `prefix_length` when both are present (§6.1).
pub async fn create_reservation(
    State(state): State<Arc<AppState>>,
    Path(pool): Path<String>,
    Json(body): Json<CreateReservationBody>,
) -> ApiResult<Response> {
    let reservation = if let Some(cidr) = &body.cidr {
        log::info!("POST /reservations/{}: cidr={}", pool, cidr);
        allocator::allocate_by_cidr(state.store.as_ref(), &pool, cidr, &body.comment)?
    } else {
        let prefix_length = body.prefix_length.ok_or_else(|| {
            ApiError::BadRequest(
                "Please provide prefix_length in body or cidr in path.".to_string(),
            )
        })?;
        log::info!("POST /reservations/{}: prefix_length={}", pool, prefix_length);
        allocator::allocate(state.store.as_ref(), &pool, prefix_length, &body.comment)?
    };

    Ok(Json(ReservationView::from(&reservation)).into_response())
}

/// `DELETE /reservations/{pool}/{cidr}`. The `pool` segment is ignored (§9).
pub async fn delete_reservation(
    State(state): State<Arc<AppState>>,
    Path((_pool, cidr)): Path<(String, String)>,
) -> ApiResult<Response> {
    log::info!("DELETE /reservations/.../{}", cidr);
    deallocator::deallocate(state.store.as_ref(), &cidr)?;
    Ok(Json(json!({ "msg": "ok" })).into_response())
}
