// Copyright 2023-2024 The Milton Hirsch Institute, B.V.
// SPDX-License-Identifier: Apache-2.0

//! Every failure this surface reports is HTTP 400 with a `{"msg": ...}`
//! body (§6.1, §7) — the allocator's error variants don't carry enough
//! distinct semantics to warrant a richer status-code mapping, and the
//! original Flask app does the same (a bare `except Exception`).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ipam_core::IpamError;
use serde_json::json;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Core(IpamError),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<IpamError> for ApiError {
    fn from(err: IpamError) -> Self {
        ApiError::Core(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match self {
            ApiError::BadRequest(message) => message,
            ApiError::Core(err) => err.to_string(),
        };
        (StatusCode::BAD_REQUEST, Json(json!({ "msg": message }))).into_response()
    }
}
